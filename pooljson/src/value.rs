// SPDX-License-Identifier: Apache-2.0

//! Read-only views over a deserialized tree.

use core::fmt::{self, Write};

use crate::node::{next_sibling, Integer, List, NodeData};
use crate::pool::{owned_bytes, SlotId, StrRef, SLOT_SIZE};

/// The regions a tree's handles point into: the pool and the caller's input.
#[derive(Clone, Copy)]
pub(crate) struct Tree<'d> {
    pool: &'d [u8],
    input: &'d [u8],
}

impl<'d> Tree<'d> {
    pub(crate) const EMPTY: Tree<'static> = Tree {
        pool: &[],
        input: &[],
    };

    pub(crate) fn new(pool: &'d [u8], input: &'d [u8]) -> Self {
        Self { pool, input }
    }

    fn slot(&self, id: SlotId) -> Option<&'d [u8]> {
        let start = id.index().checked_mul(SLOT_SIZE)?;
        self.pool.get(start..start.checked_add(SLOT_SIZE)?)
    }

    fn value(&self, id: SlotId) -> Value<'d> {
        let data = self.slot(id).map_or(NodeData::Null, NodeData::decode);
        Value { tree: *self, data }
    }

    fn string(&self, string: StrRef) -> &'d [u8] {
        match string {
            StrRef::Owned { tail, len } => owned_bytes(self.pool, tail, len),
            StrRef::Borrowed { start, len } => {
                let start = start as usize;
                self.input
                    .get(start..start.saturating_add(len as usize))
                    .unwrap_or(&[])
            }
        }
    }
}

/// The type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

/// A borrowed view of one node of a document.
///
/// Accessors never fail: asking for the wrong type (including on `null` and on
/// absent members or elements) returns a neutral default.
#[derive(Clone, Copy)]
pub struct Value<'d> {
    tree: Tree<'d>,
    data: NodeData,
}

impl<'d> Value<'d> {
    pub(crate) fn new(tree: Tree<'d>, data: NodeData) -> Self {
        Self { tree, data }
    }

    /// A `null` value that belongs to no document.
    pub fn null() -> Value<'static> {
        Value {
            tree: Tree::EMPTY,
            data: NodeData::Null,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self.data {
            NodeData::Null => ValueKind::Null,
            NodeData::Bool(_) => ValueKind::Bool,
            NodeData::Int(_) => ValueKind::Integer,
            NodeData::Float(_) => ValueKind::Float,
            NodeData::Str(_) => ValueKind::String,
            NodeData::Array(_) => ValueKind::Array,
            NodeData::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }
    pub fn is_bool(&self) -> bool {
        self.kind() == ValueKind::Bool
    }
    pub fn is_integer(&self) -> bool {
        self.kind() == ValueKind::Integer
    }
    pub fn is_float(&self) -> bool {
        self.kind() == ValueKind::Float
    }
    pub fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }
    pub fn is_array(&self) -> bool {
        self.kind() == ValueKind::Array
    }
    pub fn is_object(&self) -> bool {
        self.kind() == ValueKind::Object
    }

    /// True only for the boolean `true`.
    pub fn is_true(&self) -> bool {
        self.data == NodeData::Bool(true)
    }

    pub fn as_bool(&self) -> bool {
        matches!(self.data, NodeData::Bool(true))
    }

    /// Integer value; floats are truncated, everything else reads as 0.
    pub fn as_int(&self) -> Integer {
        match self.data {
            NodeData::Int(i) => i,
            NodeData::Float(f) => f as Integer,
            _ => 0,
        }
    }

    /// Float value; integers are converted, everything else reads as 0.0.
    pub fn as_f64(&self) -> f64 {
        match self.data {
            NodeData::Float(f) => f,
            NodeData::Int(i) => i as f64,
            _ => 0.0,
        }
    }

    /// String content, or `""` for non-strings.
    pub fn as_str(&self) -> &'d str {
        // Materialized strings are validated while parsing
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    pub fn as_bytes(&self) -> &'d [u8] {
        match self.data {
            NodeData::Str(string) => self.tree.string(string),
            _ => &[],
        }
    }

    /// True for strings that reference the caller's input instead of a pool copy.
    pub fn is_borrowed_str(&self) -> bool {
        matches!(self.data, NodeData::Str(StrRef::Borrowed { .. }))
    }

    /// First member named `key`, or `null`.
    pub fn get(&self, key: &str) -> Value<'d> {
        self.get_bytes(key.as_bytes())
    }

    pub(crate) fn get_bytes(&self, key: &[u8]) -> Value<'d> {
        self.members()
            .find(|(k, _)| k.as_bytes() == key)
            .map_or(self.null_in_tree(), |(_, v)| v)
    }

    /// Element at `index`, or `null`.
    pub fn at(&self, index: usize) -> Value<'d> {
        self.elements().nth(index).unwrap_or(self.null_in_tree())
    }

    /// Number of elements or members; 0 for scalars.
    pub fn len(&self) -> usize {
        match self.data {
            NodeData::Array(_) => self.elements().count(),
            NodeData::Object(_) => self.members().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements of an array in order; empty for anything else.
    pub fn elements(&self) -> Elements<'d> {
        let next = match self.data {
            NodeData::Array(List { head, .. }) => head,
            _ => None,
        };
        Elements {
            tree: self.tree,
            next,
        }
    }

    /// Members of an object in insertion order; empty for anything else.
    pub fn members(&self) -> Members<'d> {
        let next = match self.data {
            NodeData::Object(List { head, .. }) => head,
            _ => None,
        };
        Members {
            tree: self.tree,
            next,
        }
    }

    fn null_in_tree(&self) -> Value<'d> {
        Value {
            tree: self.tree,
            data: NodeData::Null,
        }
    }
}

/// Iterator over the elements of an array.
pub struct Elements<'d> {
    tree: Tree<'d>,
    next: Option<SlotId>,
}

impl<'d> Iterator for Elements<'d> {
    type Item = Value<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.slot(id).and_then(next_sibling);
        Some(self.tree.value(id))
    }
}

/// Iterator over the `(key, value)` members of an object.
pub struct Members<'d> {
    tree: Tree<'d>,
    next: Option<SlotId>,
}

impl<'d> Iterator for Members<'d> {
    type Item = (&'d str, Value<'d>);

    fn next(&mut self) -> Option<Self::Item> {
        let key_id = self.next?;
        self.next = self.tree.slot(key_id).and_then(next_sibling);
        let key = self.tree.value(key_id).as_str();
        Some((key, self.tree.value(key_id.successor())))
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.data, other.data) {
            (NodeData::Str(_), NodeData::Str(_)) => self.as_bytes() == other.as_bytes(),
            (NodeData::Array(_), NodeData::Array(_)) => {
                self.len() == other.len()
                    && self
                        .elements()
                        .zip(other.elements())
                        .all(|(a, b)| a == b)
            }
            (NodeData::Object(_), NodeData::Object(_)) => {
                self.len() == other.len()
                    && self
                        .members()
                        .zip(other.members())
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            (a, b) => a == b,
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Forwards to a formatter, noting whether the text already reads as a float.
struct FloatText<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    marked: bool,
}

impl Write for FloatText<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.marked |= s.bytes().any(|b| matches!(b, b'.' | b'e' | b'E' | b'i' | b'N'));
        self.f.write_str(s)
    }
}

// Integral floats get a `.0` so the text parses back as a float.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let mut text = FloatText { f, marked: false };
    write!(text, "{x}")?;
    if !text.marked {
        text.f.write_str(".0")?;
    }
    Ok(())
}

/// Compact JSON rendering, for diagnostics and tests.
impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            NodeData::Null => f.write_str("null"),
            NodeData::Bool(b) => write!(f, "{b}"),
            NodeData::Int(i) => write!(f, "{i}"),
            NodeData::Float(x) => write_float(f, x),
            NodeData::Str(_) => write_escaped(f, self.as_str()),
            NodeData::Array(_) => {
                f.write_char('[')?;
                for (i, element) in self.elements().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_char(']')
            }
            NodeData::Object(_) => {
                f.write_char('{')?;
                for (i, (key, value)) in self.members().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write_escaped(f, key)?;
                    write!(f, ":{value}")?;
                }
                f.write_char('}')
            }
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
