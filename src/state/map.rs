//! Key to value map container.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::StateResult;
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct MapCore<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.entries)
    }
}

enum MapOp<K, V> {
    Put { key: K, old: Option<V>, new: V },
    Remove { key: K, old: V },
    Clear { entries: BTreeMap<K, V> },
}

struct MapChange<K, V> {
    target: StateId,
    core: Rc<RefCell<MapCore<K, V>>>,
    op: MapOp<K, V>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            MapOp::Put { key, old, new } => write!(
                f,
                "s{} put {key:?}: {old:?} -> {new:?}",
                self.target.raw()
            ),
            MapOp::Remove { key, old } => {
                write!(f, "s{} remove {key:?} (was {old:?})", self.target.raw())
            }
            MapOp::Clear { entries } => {
                write!(f, "s{} clear {} entries", self.target.raw(), entries.len())
            }
        }
    }
}

impl<K, V> Change for MapChange<K, V>
where
    K: Clone + Ord + fmt::Debug + 'static,
    V: Clone + fmt::Debug + 'static,
{
    fn target(&self) -> StateId {
        self.target
    }

    fn apply(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            MapOp::Put { key, new, .. } => {
                core.entries.insert(key.clone(), new.clone());
            }
            MapOp::Remove { key, .. } => {
                core.entries.remove(key);
            }
            MapOp::Clear { .. } => core.entries.clear(),
        }
    }

    fn revert(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            MapOp::Put { key, old, .. } => match old {
                Some(old) => {
                    core.entries.insert(key.clone(), old.clone());
                }
                None => {
                    core.entries.remove(key);
                }
            },
            MapOp::Remove { key, old } => {
                core.entries.insert(key.clone(), old.clone());
            }
            MapOp::Clear { entries } => {
                core.entries.clone_from(entries);
            }
        }
    }
}

/// Key to value map with deterministic (key-ordered) iteration.
#[derive(Debug, Clone)]
pub struct MapState<K, V> {
    id: StateId,
    core: Rc<RefCell<MapCore<K, V>>>,
}

impl<K, V> MapState<K, V>
where
    K: Clone + Ord + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
{
    /// Create an empty map registered under `name`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str) -> Self {
        let core = Rc::new(RefCell::new(MapCore {
            entries: BTreeMap::new(),
        }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.borrow().entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.borrow().entries.is_empty()
    }

    /// Value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.core.borrow().entries.get(key).cloned()
    }

    /// Whether `key` has an entry.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.core.borrow().entries.contains_key(key)
    }

    /// Decoupled snapshot of the entries, key-ordered.
    #[must_use]
    pub fn view(&self) -> BTreeMap<K, V> {
        self.core.borrow().entries.clone()
    }

    /// Snapshot of the keys, ordered.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.core.borrow().entries.keys().cloned().collect()
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.id
    }

    fn record_op(&self, sm: &mut StateManager, op: MapOp<K, V>) -> StateResult<()> {
        let change = MapChange {
            target: self.id,
            core: Rc::clone(&self.core),
            op,
        };
        change.apply();
        sm.record(Box::new(change))
    }

    /// Store `value` under `key`. Re-putting the present value is a
    /// no-op.
    pub fn put(&self, sm: &mut StateManager, key: K, value: V) -> StateResult<()> {
        let old = self.get(&key);
        if old.as_ref() == Some(&value) {
            return Ok(());
        }
        self.record_op(
            sm,
            MapOp::Put {
                key,
                old,
                new: value,
            },
        )
    }

    /// Remove the entry under `key`. Returns the removed value; an
    /// absent key is a no-op.
    pub fn remove(&self, sm: &mut StateManager, key: &K) -> StateResult<Option<V>> {
        let Some(old) = self.get(key) else {
            return Ok(None);
        };
        self.record_op(
            sm,
            MapOp::Remove {
                key: key.clone(),
                old: old.clone(),
            },
        )?;
        Ok(Some(old))
    }

    /// Remove every entry. No-op when already empty.
    pub fn clear(&self, sm: &mut StateManager) -> StateResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let entries = self.view();
        self.record_op(sm, MapOp::Clear { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove_round_trip() {
        let mut sm = StateManager::new();
        let map = MapState::new(&mut sm, "map");

        map.put(&mut sm, "a", 1).unwrap();
        map.put(&mut sm, "b", 2).unwrap();
        sm.close("seed").unwrap();

        map.put(&mut sm, "a", 10).unwrap();
        assert_eq!(map.remove(&mut sm, &"b").unwrap(), Some(2));
        assert_eq!(map.remove(&mut sm, &"zz").unwrap(), None);
        sm.close("edit").unwrap();
        assert_eq!(map.get(&"a"), Some(10));
        assert!(!map.contains_key(&"b"));

        sm.undo().unwrap();
        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.get(&"b"), Some(2));
        sm.redo().unwrap();
        assert_eq!(map.get(&"a"), Some(10));
        assert!(!map.contains_key(&"b"));
    }

    #[test]
    fn test_noop_put_records_nothing() {
        let mut sm = StateManager::new();
        let map = MapState::new(&mut sm, "map");
        map.put(&mut sm, "a", 1).unwrap();
        sm.close("seed").unwrap();

        map.put(&mut sm, "a", 1).unwrap();
        assert!(sm.stack().is_open_empty());
    }

    #[test]
    fn test_clear_round_trip() {
        let mut sm = StateManager::new();
        let map = MapState::new(&mut sm, "map");
        map.put(&mut sm, 1, "one").unwrap();
        map.put(&mut sm, 2, "two").unwrap();
        sm.close("seed").unwrap();

        map.clear(&mut sm).unwrap();
        map.clear(&mut sm).unwrap();
        sm.close("wipe").unwrap();
        assert!(map.is_empty());

        sm.undo().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys(), vec![1, 2]);
    }
}
