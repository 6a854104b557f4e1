//! Addressing substrate: item identity, paths, and the path registry.
//!
//! Items have an id, an optional parent, and a derived `/`-separated
//! path. Identity is fixed at construction; items are never
//! re-parented. The registry only tracks identity and paths - what an
//! item *is* belongs to the domain layer.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Unique identifier for a registered item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ItemId(pub(crate) u32);

impl ItemId {
    /// Reserved id of the unknown-owner sentinel.
    pub(crate) const UNKNOWN: Self = Self(0);

    /// Raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Identity record of a trackable item: id, local id, and derived path.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCore {
    id: ItemId,
    local_id: String,
    path: String,
}

impl ItemCore {
    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Local id, unique among this item's siblings.
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Full hierarchical path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Capability trait for anything with item identity.
pub trait Item: fmt::Debug + 'static {
    /// Identity record for this item.
    fn core(&self) -> &ItemCore;

    /// Unique id.
    fn id(&self) -> ItemId {
        self.core().id()
    }

    /// Full hierarchical path.
    fn path(&self) -> &str {
        self.core().path()
    }
}

/// Shared handle to an item, compared, ordered, and hashed by item
/// identity rather than by content.
///
/// This is the element type portfolios and wallets store, so two
/// handles to the same item always collapse to one membership entry.
pub struct ItemRef<T: Item>(Rc<T>);

impl<T: Item> ItemRef<T> {
    /// Create a handle sharing ownership of `item`.
    #[must_use]
    pub fn new(item: &Rc<T>) -> Self {
        Self(Rc::clone(item))
    }

    /// Id of the referenced item.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.0.id()
    }
}

impl<T: Item> Clone for ItemRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Item> Deref for ItemRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Item> PartialEq for ItemRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T: Item> Eq for ItemRef<T> {}

impl<T: Item> PartialOrd for ItemRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Item> Ord for ItemRef<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl<T: Item> Hash for ItemRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: Item> fmt::Debug for ItemRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.path())
    }
}

/// Path registry: add, remove, and locate items by path.
#[derive(Debug)]
pub struct ItemRegistry {
    next: u32,
    by_path: BTreeMap<String, ItemId>,
}

impl ItemRegistry {
    /// Create an empty registry. Id 0 stays reserved for the
    /// unknown-owner sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 1,
            by_path: BTreeMap::new(),
        }
    }

    /// Register an item under `parent` with the given local id.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicatePath`] if the derived path is
    /// already taken.
    pub fn register(
        &mut self,
        parent: Option<&ItemCore>,
        local_id: &str,
    ) -> StateResult<ItemCore> {
        let path = match parent {
            Some(p) => format!("{}/{local_id}", p.path()),
            None => format!("/{local_id}"),
        };
        if self.by_path.contains_key(&path) {
            return Err(StateError::DuplicatePath(path));
        }
        let id = ItemId(self.next);
        self.next += 1;
        self.by_path.insert(path.clone(), id);
        Ok(ItemCore {
            id,
            local_id: local_id.to_owned(),
            path,
        })
    }

    /// Remove the item registered at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownPath`] if nothing is registered
    /// there.
    pub fn remove(&mut self, path: &str) -> StateResult<ItemId> {
        self.by_path
            .remove(path)
            .ok_or_else(|| StateError::UnknownPath(path.to_owned()))
    }

    /// Locate the id registered at `path`.
    #[must_use]
    pub fn locate(&self, path: &str) -> Option<ItemId> {
        self.by_path.get(path).copied()
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}
