//! Unordered (value-ordered) set container.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::StateResult;
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct SetCore<T> {
    items: BTreeSet<T>,
}

impl<T: fmt::Debug> fmt::Debug for SetCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.items)
    }
}

enum SetOp<T> {
    Insert { item: T },
    Remove { item: T },
    Clear { items: BTreeSet<T> },
}

struct SetChange<T> {
    target: StateId,
    core: Rc<RefCell<SetCore<T>>>,
    op: SetOp<T>,
}

impl<T: fmt::Debug> fmt::Debug for SetChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            SetOp::Insert { item } => write!(f, "s{} add {item:?}", self.target.raw()),
            SetOp::Remove { item } => write!(f, "s{} drop {item:?}", self.target.raw()),
            SetOp::Clear { items } => {
                write!(f, "s{} clear {} items", self.target.raw(), items.len())
            }
        }
    }
}

impl<T: Clone + Ord + fmt::Debug + 'static> Change for SetChange<T> {
    fn target(&self) -> StateId {
        self.target
    }

    fn apply(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            SetOp::Insert { item } => {
                core.items.insert(item.clone());
            }
            SetOp::Remove { item } => {
                core.items.remove(item);
            }
            SetOp::Clear { .. } => core.items.clear(),
        }
    }

    fn revert(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            SetOp::Insert { item } => {
                core.items.remove(item);
            }
            SetOp::Remove { item } => {
                core.items.insert(item.clone());
            }
            SetOp::Clear { items } => {
                core.items.clone_from(items);
            }
        }
    }
}

/// Set of distinct values with deterministic (sorted) iteration.
#[derive(Debug, Clone)]
pub struct SetState<T> {
    id: StateId,
    core: Rc<RefCell<SetCore<T>>>,
}

impl<T: Clone + Ord + fmt::Debug + 'static> SetState<T> {
    /// Create an empty set registered under `name`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str) -> Self {
        let core = Rc::new(RefCell::new(SetCore {
            items: BTreeSet::new(),
        }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.borrow().items.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.borrow().items.is_empty()
    }

    /// Whether `item` is a member.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.core.borrow().items.contains(item)
    }

    /// Decoupled snapshot of the members, sorted.
    #[must_use]
    pub fn view(&self) -> BTreeSet<T> {
        self.core.borrow().items.clone()
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.id
    }

    fn record_op(&self, sm: &mut StateManager, op: SetOp<T>) -> StateResult<()> {
        let change = SetChange {
            target: self.id,
            core: Rc::clone(&self.core),
            op,
        };
        change.apply();
        sm.record(Box::new(change))
    }

    /// Insert `item`. Returns whether the set grew; inserting a
    /// present member is a no-op.
    pub fn insert(&self, sm: &mut StateManager, item: T) -> StateResult<bool> {
        if self.contains(&item) {
            return Ok(false);
        }
        self.record_op(sm, SetOp::Insert { item })?;
        Ok(true)
    }

    /// Remove `item`. Returns whether it was a member; removing an
    /// absent member is a no-op.
    pub fn remove(&self, sm: &mut StateManager, item: &T) -> StateResult<bool> {
        if !self.contains(item) {
            return Ok(false);
        }
        self.record_op(sm, SetOp::Remove { item: item.clone() })?;
        Ok(true)
    }

    /// Remove every member. No-op when already empty.
    pub fn clear(&self, sm: &mut StateManager) -> StateResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let items = self.view();
        self.record_op(sm, SetOp::Clear { items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_round_trip() {
        let mut sm = StateManager::new();
        let set = SetState::new(&mut sm, "set");

        assert!(set.insert(&mut sm, 3).unwrap());
        assert!(set.insert(&mut sm, 1).unwrap());
        assert!(!set.insert(&mut sm, 3).unwrap());
        sm.close("seed").unwrap();
        assert_eq!(set.view().into_iter().collect::<Vec<_>>(), vec![1, 3]);

        assert!(set.remove(&mut sm, &3).unwrap());
        assert!(!set.remove(&mut sm, &42).unwrap());
        sm.close("drop").unwrap();

        sm.undo().unwrap();
        assert!(set.contains(&3));
        sm.undo().unwrap();
        assert!(set.is_empty());
        sm.redo().unwrap();
        sm.redo().unwrap();
        assert!(!set.contains(&3));
        assert!(set.contains(&1));
    }

    #[test]
    fn test_noop_insert_records_nothing() {
        let mut sm = StateManager::new();
        let set = SetState::new(&mut sm, "set");
        set.insert(&mut sm, 1).unwrap();
        sm.close("seed").unwrap();

        set.insert(&mut sm, 1).unwrap();
        set.remove(&mut sm, &99).unwrap();
        set.clear(&mut sm).unwrap();
        assert_eq!(sm.stack().open_len(), 1);
    }

    #[test]
    fn test_clear_round_trip() {
        let mut sm = StateManager::new();
        let set = SetState::new(&mut sm, "set");
        for i in 0..4 {
            set.insert(&mut sm, i).unwrap();
        }
        sm.close("seed").unwrap();

        set.clear(&mut sm).unwrap();
        sm.close("wipe").unwrap();
        assert!(set.is_empty());

        sm.undo().unwrap();
        assert_eq!(set.len(), 4);
    }
}
