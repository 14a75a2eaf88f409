// SPDX-License-Identifier: Apache-2.0

//! Filter predicates deciding which parts of an input get materialized.
//!
//! A filter document is ordinary JSON: `true` keeps a whole subtree, `false`
//! and `null` drop it, an object keeps an object input and filters its members
//! by key, an array keeps an array input and filters its elements by position.

use crate::value::{Elements, Value};

/// Predicate consulted by the deserializer once per value.
#[derive(Debug, Clone, Copy)]
pub enum Filter<'f> {
    /// Keeps everything without consulting any document.
    AllowAll,
    /// Node of a filter document.
    Concrete(Value<'f>),
}

impl Default for Filter<'_> {
    fn default() -> Self {
        Filter::AllowAll
    }
}

impl<'f> Filter<'f> {
    /// Filter backed by a node of a filter document.
    pub fn new(node: Value<'f>) -> Self {
        Filter::Concrete(node)
    }

    /// Filter rejecting everything.
    pub fn deny() -> Filter<'static> {
        Filter::Concrete(Value::null())
    }

    /// Keeps any value, scalar or container, in full.
    pub fn allow_value(&self) -> bool {
        match self {
            Filter::AllowAll => true,
            Filter::Concrete(node) => node.is_true(),
        }
    }

    /// Keeps an array input, possibly filtering its elements.
    pub fn allow_array(&self) -> bool {
        match self {
            Filter::AllowAll => true,
            Filter::Concrete(node) => node.is_true() || node.is_array(),
        }
    }

    /// Keeps an object input, possibly filtering its members.
    pub fn allow_object(&self) -> bool {
        match self {
            Filter::AllowAll => true,
            Filter::Concrete(node) => node.is_true() || node.is_object(),
        }
    }

    /// Whether a value starting with byte `first` passes this filter.
    pub(crate) fn admits(&self, first: u8) -> bool {
        match first {
            b'[' => self.allow_array(),
            b'{' => self.allow_object(),
            _ => self.allow_value(),
        }
    }

    /// Filter for the member named `key`.
    pub fn descend_key(&self, key: &[u8]) -> Filter<'f> {
        match self {
            Filter::AllowAll => Filter::AllowAll,
            Filter::Concrete(node) if node.is_true() => Filter::AllowAll,
            Filter::Concrete(node) => Filter::Concrete(node.get_bytes(key)),
        }
    }

    /// Filter for the element at `index`. Positions past the end of the filter
    /// array are denied, not inherited from its last entry.
    pub fn descend_index(&self, index: usize) -> Filter<'f> {
        match self {
            Filter::AllowAll => Filter::AllowAll,
            Filter::Concrete(node) if node.is_true() => Filter::AllowAll,
            Filter::Concrete(node) => Filter::Concrete(node.at(index)),
        }
    }

    /// Filters for consecutive elements, starting at index 0. Walks a filter
    /// array once instead of seeking from its head for every element.
    pub(crate) fn element_filters(&self) -> ElementFilters<'f> {
        let elements = match self {
            Filter::Concrete(node) if !node.is_true() => Some(node.elements()),
            _ => None,
        };
        ElementFilters { elements }
    }
}

/// Cursor yielding the same filters as successive `descend_index` calls.
pub(crate) struct ElementFilters<'f> {
    /// `None` keeps every element.
    elements: Option<Elements<'f>>,
}

impl<'f> ElementFilters<'f> {
    pub(crate) fn next_filter(&mut self) -> Filter<'f> {
        match &mut self.elements {
            None => Filter::AllowAll,
            Some(elements) => match elements.next() {
                Some(node) => Filter::Concrete(node),
                None => Filter::deny(),
            },
        }
    }
}
