//! Textual description of draft trees.
//!
//! A node is written as `Name`, optionally followed by `<"data">`, optionally
//! followed by a parenthesized, comma-separated child list:
//!
//! ```text
//! Statement(Addition(Variable<"a">, IntegerLiteral<"1">))
//! ```
//!
//! Inside data, `\"` and `\\` are the only escapes. Whitespace between tokens
//! is ignored. Parsing produces nodes with draft types; printing works for any
//! tree and round-trips through [`Tree::from_description`].

use core::fmt;

use facet::Facet;
use indextree::{Arena, NodeId};

use crate::tree::{NodeData, Tree};

/// Error returned when a tree description cannot be parsed.
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DescriptionError {
    /// expected a type name at offset {offset}
    ExpectedName {
        /// Byte offset into the description
        offset: usize,
    },
    /// expected '{expected}' at offset {offset}
    Expected {
        /// The missing character
        expected: char,
        /// Byte offset into the description
        offset: usize,
    },
    /// unterminated data string starting at offset {offset}
    UnterminatedData {
        /// Byte offset of the opening quote
        offset: usize,
    },
    /// unexpected input after the root node at offset {offset}
    TrailingInput {
        /// Byte offset of the first unexpected character
        offset: usize,
    },
}

impl Tree {
    /// Parse a tree description into a tree of draft nodes.
    pub fn from_description(text: &str) -> Result<Tree, DescriptionError> {
        let mut parser = Parser {
            text,
            offset: 0,
            arena: Arena::new(),
        };
        let root = parser.tree()?;
        parser.skip_whitespace();
        if parser.offset < text.len() {
            return Err(DescriptionError::TrailingInput {
                offset: parser.offset,
            });
        }
        Ok(Tree {
            arena: parser.arena,
            root,
        })
    }

    /// Description of the subtree rooted at `id`.
    pub fn describe(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_description(&mut out, id, |out, id| write_label(out, self.get(id)), |id| {
            self.children(id)
        });
        out
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(self.root))
    }
}

/// Write `Name<"data">` for a single node, without children.
pub fn write_label(out: &mut String, data: &NodeData) {
    out.push_str(data.type_name());
    if !data.data.is_empty() {
        out.push_str("<\"");
        for c in data.data.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push_str("\">");
    }
}

/// Write the subtree at `root` in description form. `label` writes one node
/// without its children and `children` lists them; any tree-shaped structure
/// can be printed this way. Uses an explicit stack, so depth is not bounded
/// by the call stack.
pub fn write_description<C>(
    out: &mut String,
    root: NodeId,
    mut label: impl FnMut(&mut String, NodeId),
    mut children: impl FnMut(NodeId) -> C,
) where
    C: IntoIterator<Item = NodeId>,
{
    enum Piece {
        Node(NodeId),
        Text(&'static str),
    }

    let mut stack = vec![Piece::Node(root)];
    let mut kids = Vec::new();
    while let Some(piece) = stack.pop() {
        let id = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Node(id) => id,
        };
        label(out, id);
        kids.clear();
        kids.extend(children(id));
        if kids.is_empty() {
            continue;
        }
        out.push('(');
        stack.push(Piece::Text(")"));
        for (index, &child) in kids.iter().enumerate().rev() {
            stack.push(Piece::Node(child));
            if index > 0 {
                stack.push(Piece::Text(", "));
            }
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    offset: usize,
    arena: Arena<NodeData>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.offset..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.offset += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.offset += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), DescriptionError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(DescriptionError::Expected {
                expected,
                offset: self.offset,
            })
        }
    }

    fn name(&mut self) -> Result<&str, DescriptionError> {
        self.skip_whitespace();
        let start = self.offset;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '<' | '>' | '(' | ')' | ',' | '"') {
                break;
            }
            self.offset += c.len_utf8();
        }
        if self.offset == start {
            return Err(DescriptionError::ExpectedName { offset: start });
        }
        Ok(&self.text[start..self.offset])
    }

    fn data(&mut self) -> Result<String, DescriptionError> {
        self.expect('"')?;
        let start = self.offset - 1;
        let mut data = String::new();
        let text = self.text;
        let mut chars = text[self.offset..].char_indices();
        while let Some((index, c)) = chars.next() {
            match c {
                '"' => {
                    self.offset += index + 1;
                    self.expect('>')?;
                    return Ok(data);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => data.push(escaped),
                    None => break,
                },
                c => data.push(c),
            }
        }
        Err(DescriptionError::UnterminatedData { offset: start })
    }

    /// A node header: name and optional data, without the child list.
    fn label(&mut self) -> Result<NodeId, DescriptionError> {
        let name = self.name()?.to_owned();
        let data = if self.eat('<') {
            self.data()?
        } else {
            String::new()
        };
        Ok(self.arena.new_node(NodeData::draft(name, data)))
    }

    fn child_of(&mut self, parent: NodeId) -> Result<NodeId, DescriptionError> {
        let child = self.label()?;
        parent.append(child, &mut self.arena);
        Ok(child)
    }

    /// A whole tree. Open child lists are kept on a stack instead of the call
    /// stack.
    fn tree(&mut self) -> Result<NodeId, DescriptionError> {
        let root = self.label()?;
        let mut open: Vec<NodeId> = Vec::new();
        let mut last = root;
        loop {
            if self.eat('(') && !self.eat(')') {
                open.push(last);
                last = self.child_of(last)?;
                continue;
            }
            // `last` is complete: go on with its next sibling or close lists
            loop {
                let Some(&parent) = open.last() else {
                    return Ok(root);
                };
                if self.eat(',') {
                    last = self.child_of(parent)?;
                    break;
                }
                self.expect(')')?;
                open.pop();
            }
        }
    }
}
