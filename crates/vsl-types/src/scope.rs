//! Scopes: insertion-ordered name tables with parent and owner links.

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::item::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Maps identifiers to overload sets. Insertion goes through
/// [`ScopeGraph::set`](crate::ScopeGraph::set), which enforces the collision
/// rules.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    items: IndexMap<SmolStr, Vec<ItemId>>,
    /// Lexically enclosing scope.
    pub parent: Option<ScopeId>,
    /// Item whose body this scope is.
    pub owner: Option<ItemId>,
    /// Scope of static members.
    pub is_static_context: bool,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// Overload set declared directly in this scope, in insertion order.
    pub fn get_all(&self, name: &str) -> &[ItemId] {
        self.items.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.items.keys()
    }

    /// Every item in declaration order of first name use.
    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.values().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn insert(&mut self, name: SmolStr, item: ItemId) {
        self.items.entry(name).or_default().push(item);
    }
}
