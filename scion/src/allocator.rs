//! Binding actual children to the typed child slots of a node type.
//!
//! The walk is greedy and never reorders children. Adjacent slots that declare
//! the same type form a group; each group takes either exactly its required
//! slots or all of its slots from the next compatible children. Anything else
//! is ambiguous and rejected, as is an optional slot further on that could
//! also have taken the last child placed.

use std::sync::Arc;

use facet::Facet;

use crate::trace;
use crate::tree::{NodeData, NodeType, Tree};

/// One expected child slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildDescriptor {
    type_name: String,
    optional: bool,
}

impl ChildDescriptor {
    /// A slot that must be filled.
    pub fn required(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            optional: false,
        }
    }

    /// A slot that may stay empty.
    pub fn optional(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            optional: true,
        }
    }

    /// Start a descriptor list.
    pub fn create() -> DescriptorListBuilder {
        DescriptorListBuilder::default()
    }

    /// Declared type (or group) name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// True if the slot may stay empty.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Builds a list of [`ChildDescriptor`]s in slot order.
#[derive(Debug, Clone, Default)]
pub struct DescriptorListBuilder {
    descriptors: Vec<ChildDescriptor>,
}

impl DescriptorListBuilder {
    /// Append a required slot.
    pub fn required(mut self, type_name: impl Into<String>) -> Self {
        self.descriptors.push(ChildDescriptor::required(type_name));
        self
    }

    /// Append an optional slot.
    pub fn optional(mut self, type_name: impl Into<String>) -> Self {
        self.descriptors.push(ChildDescriptor::optional(type_name));
        self
    }

    /// Finish the list.
    pub fn build(self) -> Vec<ChildDescriptor> {
        self.descriptors
    }
}

/// Anything that has a node type.
pub trait Typed {
    /// The node type.
    fn node_type(&self) -> &NodeType;
}

impl Typed for NodeType {
    fn node_type(&self) -> &NodeType {
        self
    }
}

impl Typed for Arc<NodeType> {
    fn node_type(&self) -> &NodeType {
        self
    }
}

impl Typed for NodeData {
    fn node_type(&self) -> &NodeType {
        &self.ty
    }
}

impl Typed for Tree {
    fn node_type(&self) -> &NodeType {
        &self.get(self.root).ty
    }
}

impl<T: Typed + ?Sized> Typed for &T {
    fn node_type(&self) -> &NodeType {
        (**self).node_type()
    }
}

/// Misuse of [`NodeAllocator::allocate`].
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum AllocationError {
    /// destination has {actual} slots but {expected} descriptors were given
    DestinationSize {
        /// Number of descriptors
        expected: usize,
        /// Length of the destination
        actual: usize,
    },
}

/// Binds children to the slots of a descriptor list.
#[derive(Debug, Clone, Copy)]
pub struct NodeAllocator<'d> {
    descriptors: &'d [ChildDescriptor],
}

impl<'d> NodeAllocator<'d> {
    /// Allocator for the given slots.
    pub fn new(descriptors: &'d [ChildDescriptor]) -> Self {
        Self { descriptors }
    }

    /// Bind `children` to the slots.
    ///
    /// On success `destination[slot]` holds the index of the child placed in
    /// that slot, `None` for an empty optional slot. On failure `destination`
    /// is all `None` and `Ok(false)` is returned. A destination whose length
    /// differs from the number of descriptors is an error.
    pub fn allocate<N: Typed>(
        &self,
        destination: &mut [Option<usize>],
        children: &[N],
    ) -> Result<bool, AllocationError> {
        if destination.len() != self.descriptors.len() {
            return Err(AllocationError::DestinationSize {
                expected: self.descriptors.len(),
                actual: destination.len(),
            });
        }
        destination.fill(None);

        let ok = self.walk(destination, children);
        if !ok {
            destination.fill(None);
        }
        Ok(ok)
    }

    fn walk<N: Typed>(&self, destination: &mut [Option<usize>], children: &[N]) -> bool {
        let mut slot = 0;
        let mut next = 0;

        while slot < self.descriptors.len() {
            let type_name = self.descriptors[slot].type_name();
            let group_end = slot
                + self.descriptors[slot..]
                    .iter()
                    .take_while(|d| d.type_name() == type_name)
                    .count();
            let group = &self.descriptors[slot..group_end];
            let required = group.iter().filter(|d| !d.is_optional()).count();
            let available = children[next..]
                .iter()
                .take(group.len())
                .take_while(|c| c.node_type().belongs_to(type_name))
                .count();

            let filled_optional = if available == group.len() {
                for offset in 0..group.len() {
                    destination[slot + offset] = Some(next + offset);
                }
                next += available;
                available > required
            } else if available == required {
                let mut child = next;
                for (offset, descriptor) in group.iter().enumerate() {
                    if !descriptor.is_optional() {
                        destination[slot + offset] = Some(child);
                        child += 1;
                    }
                }
                next = child;
                false
            } else {
                trace!(
                    type_name,
                    available, required, "slot group cannot be filled"
                );
                return false;
            };

            if filled_optional && self.later_optional_accepts(group_end, &children[next - 1]) {
                trace!(type_name, "ambiguous optional slots");
                return false;
            }
            slot = group_end;
        }

        if next != children.len() {
            trace!(
                consumed = next,
                total = children.len(),
                "children left over"
            );
            return false;
        }
        true
    }

    /// True if an optional slot from `from` on, before the next required one,
    /// would accept `child`.
    fn later_optional_accepts<N: Typed>(&self, from: usize, child: &N) -> bool {
        self.descriptors[from..]
            .iter()
            .take_while(|d| d.is_optional())
            .any(|d| child.node_type().belongs_to(d.type_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn types(names: &[&str]) -> Vec<NodeType> {
        names.iter().map(|&n| NodeType::new(n)).collect()
    }

    fn allocate(descriptors: &[ChildDescriptor], children: &[NodeType]) -> Option<Vec<Option<usize>>> {
        let mut destination = vec![None; descriptors.len()];
        let ok = NodeAllocator::new(descriptors)
            .allocate(&mut destination, children)
            .unwrap();
        ok.then_some(destination)
    }

    #[test]
    fn test_all_required() {
        let descriptors = ChildDescriptor::create().required("A").required("B").build();
        assert_eq!(
            allocate(&descriptors, &types(&["A", "B"])),
            Some(vec![Some(0), Some(1)])
        );
    }

    #[test]
    fn test_required_missing() {
        let descriptors = ChildDescriptor::create().required("A").optional("B").build();
        assert_eq!(allocate(&descriptors, &types(&["B"])), None);
    }

    #[test]
    fn test_leftover_child() {
        let descriptors = ChildDescriptor::create().required("A").build();
        assert_eq!(allocate(&descriptors, &types(&["A", "A"])), None);
    }

    #[test]
    fn test_optional_skipped() {
        let descriptors = ChildDescriptor::create()
            .required("A")
            .optional("B")
            .required("C")
            .build();
        assert_eq!(
            allocate(&descriptors, &types(&["A", "C"])),
            Some(vec![Some(0), None, Some(1)])
        );
        assert_eq!(
            allocate(&descriptors, &types(&["A", "B", "C"])),
            Some(vec![Some(0), Some(1), Some(2)])
        );
    }

    #[test]
    fn test_various_groups() {
        let descriptors = ChildDescriptor::create()
            .required("A")
            .optional("B")
            .required("B")
            .optional("A")
            .build();
        assert_eq!(
            allocate(&descriptors, &types(&["A", "B", "B", "A"])),
            Some(vec![Some(0), Some(1), Some(2), Some(3)])
        );
        assert_eq!(
            allocate(&descriptors, &types(&["A", "B"])),
            Some(vec![Some(0), None, Some(1), None])
        );
    }

    #[test]
    fn test_one_child_not_matched() {
        let descriptors = ChildDescriptor::create()
            .required("A")
            .optional("B")
            .optional("B")
            .optional("A")
            .build();
        assert_eq!(allocate(&descriptors, &types(&["A", "B", "B", "C"])), None);
    }

    #[test]
    fn test_separated_optional_slots_are_ambiguous() {
        let descriptors = ChildDescriptor::create()
            .required("A")
            .optional("B")
            .optional("C")
            .optional("B")
            .optional("D")
            .required("A")
            .build();
        assert_eq!(allocate(&descriptors, &types(&["A", "B", "D", "A"])), None);
    }

    #[test]
    fn test_partially_filled_optional_group_is_ambiguous() {
        let descriptors = ChildDescriptor::create()
            .optional("B")
            .optional("B")
            .build();
        assert_eq!(allocate(&descriptors, &types(&["B"])), None);
        assert_eq!(
            allocate(&descriptors, &types(&["B", "B"])),
            Some(vec![Some(0), Some(1)])
        );
        assert_eq!(allocate(&descriptors, &types(&[])), Some(vec![None, None]));
    }

    #[test]
    fn test_order_is_preserved() {
        let descriptors = ChildDescriptor::create()
            .required("A")
            .required("B")
            .optional("C")
            .optional("D")
            .build();
        assert_eq!(allocate(&descriptors, &types(&["D", "B", "A"])), None);
    }

    #[test]
    fn test_type_hierarchy() {
        let descriptors = ChildDescriptor::create()
            .required("Expression")
            .required("Expression")
            .build();
        let children = vec![
            NodeType::new("Variable").with_groups(["Expression"]),
            NodeType::new("Addition").with_groups(["BinaryExpression", "Expression"]),
        ];
        assert_eq!(
            allocate(&descriptors, &children),
            Some(vec![Some(0), Some(1)])
        );
        let wrong = vec![
            NodeType::new("Variable").with_groups(["Expression"]),
            NodeType::new("Statement"),
        ];
        assert_eq!(allocate(&descriptors, &wrong), None);
    }

    #[test]
    fn test_destination_size_mismatch() {
        let descriptors = ChildDescriptor::create().required("A").build();
        let mut destination = vec![None; 2];
        let result = NodeAllocator::new(&descriptors).allocate(&mut destination, &types(&["A"]));
        assert!(matches!(
            result,
            Err(AllocationError::DestinationSize {
                expected: 1,
                actual: 2
            })
        ));
    }
}
