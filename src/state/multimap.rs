//! Key to multiple-values map container.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::StateResult;
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct MultimapCore<K, V> {
    entries: BTreeMap<K, Vec<V>>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MultimapCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.entries)
    }
}

enum MultimapOp<K, V> {
    Add { key: K, value: V },
    Remove { key: K, value: V, pos: usize },
}

struct MultimapChange<K, V> {
    target: StateId,
    core: Rc<RefCell<MultimapCore<K, V>>>,
    op: MultimapOp<K, V>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MultimapChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            MultimapOp::Add { key, value } => {
                write!(f, "s{} add {key:?} -> {value:?}", self.target.raw())
            }
            MultimapOp::Remove { key, value, .. } => {
                write!(f, "s{} drop {key:?} -> {value:?}", self.target.raw())
            }
        }
    }
}

impl<K, V> Change for MultimapChange<K, V>
where
    K: Clone + Ord + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
{
    fn target(&self) -> StateId {
        self.target
    }

    fn apply(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            MultimapOp::Add { key, value } => {
                core.entries.entry(key.clone()).or_default().push(value.clone());
            }
            MultimapOp::Remove { key, pos, .. } => {
                if let Some(values) = core.entries.get_mut(key) {
                    values.remove(*pos);
                    if values.is_empty() {
                        core.entries.remove(key);
                    }
                }
            }
        }
    }

    fn revert(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            MultimapOp::Add { key, value } => {
                if let Some(values) = core.entries.get_mut(key) {
                    if let Some(pos) = values.iter().rposition(|v| v == value) {
                        values.remove(pos);
                    }
                    if values.is_empty() {
                        core.entries.remove(key);
                    }
                }
            }
            MultimapOp::Remove { key, value, pos } => {
                core.entries
                    .entry(key.clone())
                    .or_default()
                    .insert(*pos, value.clone());
            }
        }
    }
}

/// Key to multiple-values map. Duplicate (key, value) pairs collapse;
/// per-key insertion order is preserved.
#[derive(Debug, Clone)]
pub struct MultimapState<K, V> {
    id: StateId,
    core: Rc<RefCell<MultimapCore<K, V>>>,
}

impl<K, V> MultimapState<K, V>
where
    K: Clone + Ord + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
{
    /// Create an empty multimap registered under `name`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str) -> Self {
        let core = Rc::new(RefCell::new(MultimapCore {
            entries: BTreeMap::new(),
        }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    /// Total number of (key, value) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.borrow().entries.values().map(Vec::len).sum()
    }

    /// Whether the multimap holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.borrow().entries.is_empty()
    }

    /// Whether the (key, value) pair is present.
    #[must_use]
    pub fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.core
            .borrow()
            .entries
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    /// Snapshot of the values under `key`, in insertion order. Empty
    /// when the key is absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Vec<V> {
        self.core.borrow().entries.get(key).cloned().unwrap_or_default()
    }

    /// Snapshot of the keys, ordered.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.core.borrow().entries.keys().cloned().collect()
    }

    /// Decoupled snapshot of all entries.
    #[must_use]
    pub fn view(&self) -> BTreeMap<K, Vec<V>> {
        self.core.borrow().entries.clone()
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.id
    }

    fn record_op(&self, sm: &mut StateManager, op: MultimapOp<K, V>) -> StateResult<()> {
        let change = MultimapChange {
            target: self.id,
            core: Rc::clone(&self.core),
            op,
        };
        change.apply();
        sm.record(Box::new(change))
    }

    /// Add the (key, value) pair. Returns whether the multimap grew;
    /// a present pair is a no-op.
    pub fn put(&self, sm: &mut StateManager, key: K, value: V) -> StateResult<bool> {
        if self.contains_entry(&key, &value) {
            return Ok(false);
        }
        self.record_op(sm, MultimapOp::Add { key, value })?;
        Ok(true)
    }

    /// Remove the (key, value) pair. Returns whether it was present;
    /// an absent pair is a no-op.
    pub fn remove(&self, sm: &mut StateManager, key: &K, value: &V) -> StateResult<bool> {
        let pos = {
            let core = self.core.borrow();
            core.entries
                .get(key)
                .and_then(|values| values.iter().position(|v| v == value))
        };
        let Some(pos) = pos else {
            return Ok(false);
        };
        self.record_op(
            sm,
            MultimapOp::Remove {
                key: key.clone(),
                value: value.clone(),
                pos,
            },
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_remove_round_trip() {
        let mut sm = StateManager::new();
        let mm = MultimapState::new(&mut sm, "routes");

        assert!(mm.put(&mut sm, "a", 1).unwrap());
        assert!(mm.put(&mut sm, "a", 2).unwrap());
        assert!(!mm.put(&mut sm, "a", 1).unwrap());
        assert!(mm.put(&mut sm, "b", 9).unwrap());
        sm.close("seed").unwrap();
        assert_eq!(mm.get(&"a"), vec![1, 2]);
        assert_eq!(mm.len(), 3);

        assert!(mm.remove(&mut sm, &"a", &1).unwrap());
        assert!(!mm.remove(&mut sm, &"a", &42).unwrap());
        sm.close("drop").unwrap();
        assert_eq!(mm.get(&"a"), vec![2]);

        sm.undo().unwrap();
        assert_eq!(mm.get(&"a"), vec![1, 2]);
        sm.redo().unwrap();
        assert_eq!(mm.get(&"a"), vec![2]);
    }

    #[test]
    fn test_empty_key_disappears() {
        let mut sm = StateManager::new();
        let mm = MultimapState::new(&mut sm, "routes");
        mm.put(&mut sm, "a", 1).unwrap();
        sm.close("seed").unwrap();

        mm.remove(&mut sm, &"a", &1).unwrap();
        sm.close("drop").unwrap();
        assert!(mm.keys().is_empty());
        assert!(mm.is_empty());

        sm.undo().unwrap();
        assert_eq!(mm.keys(), vec!["a"]);
    }

    #[test]
    fn test_get_absent_key_is_empty() {
        let mut sm = StateManager::new();
        let mm: MultimapState<&str, i32> = MultimapState::new(&mut sm, "routes");
        assert!(mm.get(&"zz").is_empty());
    }
}
