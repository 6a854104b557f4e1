//! Scalar containers: boolean, integer, and string.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::StateResult;
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct ScalarCore<T> {
    value: T,
}

impl<T: fmt::Debug> fmt::Debug for ScalarCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

struct ScalarChange<T> {
    target: StateId,
    core: Rc<RefCell<ScalarCore<T>>>,
    from: T,
    to: T,
}

impl<T: fmt::Debug> fmt::Debug for ScalarChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s{} set {:?} -> {:?}",
            self.target.raw(),
            self.from,
            self.to
        )
    }
}

impl<T: Clone + fmt::Debug + 'static> Change for ScalarChange<T> {
    fn target(&self) -> StateId {
        self.target
    }

    fn apply(&self) {
        self.core.borrow_mut().value = self.to.clone();
    }

    fn revert(&self) {
        self.core.borrow_mut().value = self.from.clone();
    }
}

/// Shared implementation of the scalar handles.
#[derive(Debug, Clone)]
struct Scalar<T> {
    id: StateId,
    core: Rc<RefCell<ScalarCore<T>>>,
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> Scalar<T> {
    fn new(sm: &mut StateManager, name: &str, init: T) -> Self {
        let core = Rc::new(RefCell::new(ScalarCore { value: init }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    fn get(&self) -> T {
        self.core.borrow().value.clone()
    }

    fn set(&self, sm: &mut StateManager, value: T) -> StateResult<()> {
        let from = {
            let core = self.core.borrow();
            if core.value == value {
                return Ok(());
            }
            core.value.clone()
        };
        let change = ScalarChange {
            target: self.id,
            core: Rc::clone(&self.core),
            from,
            to: value,
        };
        change.apply();
        sm.record(Box::new(change))
    }
}

/// Boolean state container.
#[derive(Debug, Clone)]
pub struct BoolState(Scalar<bool>);

impl BoolState {
    /// Create a boolean state registered under `name`, starting at
    /// `init`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, init: bool) -> Self {
        Self(Scalar::new(sm, name, init))
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.get()
    }

    /// Set the value. No-op when unchanged.
    pub fn set(&self, sm: &mut StateManager, value: bool) -> StateResult<()> {
        self.0.set(sm, value)
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.0.id
    }
}

/// Integer state container.
#[derive(Debug, Clone)]
pub struct IntState(Scalar<i64>);

impl IntState {
    /// Create an integer state registered under `name`, starting at
    /// `init`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, init: i64) -> Self {
        Self(Scalar::new(sm, name, init))
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.0.get()
    }

    /// Set the value. No-op when unchanged.
    pub fn set(&self, sm: &mut StateManager, value: i64) -> StateResult<()> {
        self.0.set(sm, value)
    }

    /// Add `delta` to the current value, saturating at the numeric
    /// bounds. No-op when `delta` is zero.
    pub fn add(&self, sm: &mut StateManager, delta: i64) -> StateResult<()> {
        let current = self.get();
        self.set(sm, current.saturating_add(delta))
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.0.id
    }
}

/// String state container.
#[derive(Debug, Clone)]
pub struct StringState(Scalar<String>);

impl StringState {
    /// Create a string state registered under `name`, starting at
    /// `init`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, init: &str) -> Self {
        Self(Scalar::new(sm, name, init.to_owned()))
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> String {
        self.0.get()
    }

    /// Set the value. No-op when unchanged.
    pub fn set(&self, sm: &mut StateManager, value: impl Into<String>) -> StateResult<()> {
        self.0.set(sm, value.into())
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.0.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_set_and_undo() {
        let mut sm = StateManager::new();
        let flag = BoolState::new(&mut sm, "flag", false);
        assert!(!flag.get());

        flag.set(&mut sm, true).unwrap();
        assert!(flag.get());
        assert!(sm.close("flip").unwrap());

        sm.undo().unwrap();
        assert!(!flag.get());
        sm.redo().unwrap();
        assert!(flag.get());
    }

    #[test]
    fn test_noop_set_records_nothing() {
        let mut sm = StateManager::new();
        let flag = BoolState::new(&mut sm, "flag", false);
        let count = IntState::new(&mut sm, "count", 3);

        flag.set(&mut sm, false).unwrap();
        count.set(&mut sm, 3).unwrap();
        count.add(&mut sm, 0).unwrap();
        assert!(sm.stack().is_open_empty());
        assert!(!sm.close("noop").unwrap());
    }

    #[test]
    fn test_int_add_saturates() {
        let mut sm = StateManager::new();
        let count = IntState::new(&mut sm, "count", i64::MAX - 1);
        count.add(&mut sm, 5).unwrap();
        assert_eq!(count.get(), i64::MAX);
    }

    #[test]
    fn test_string_text_rendering() {
        let mut sm = StateManager::new();
        let name = StringState::new(&mut sm, "name", "PRR");
        assert_eq!(name.get(), "PRR");
        assert_eq!(sm.text_of(name.state_id()).unwrap(), "\"PRR\"");

        name.set(&mut sm, "B&O").unwrap();
        assert_eq!(name.get(), "B&O");
    }

    #[test]
    fn test_touched_states_deduplicated() {
        let mut sm = StateManager::new();
        let count = IntState::new(&mut sm, "count", 0);
        count.set(&mut sm, 1).unwrap();
        count.set(&mut sm, 2).unwrap();
        sm.close("twice").unwrap();

        let set = sm.stack().committed(1).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.touched(), vec![count.state_id()]);
    }
}
