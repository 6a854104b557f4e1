//! Optional single-reference container.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::StateResult;
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct RefCore<T> {
    value: Option<T>,
}

impl<T: fmt::Debug> fmt::Debug for RefCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{value:?}"),
            None => write!(f, "-"),
        }
    }
}

struct RefChange<T> {
    target: StateId,
    core: Rc<RefCell<RefCore<T>>>,
    from: Option<T>,
    to: Option<T>,
}

impl<T: fmt::Debug> fmt::Debug for RefChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s{} ref {:?} -> {:?}",
            self.target.raw(),
            self.from,
            self.to
        )
    }
}

impl<T: Clone + fmt::Debug + 'static> Change for RefChange<T> {
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

/// A single optional reference to a value, tracked like any other
/// container. Absence is a first-class state.
#[derive(Debug, Clone)]
pub struct GenericState<T> {
    id: StateId,
    core: Rc<RefCell<RefCore<T>>>,
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> GenericState<T> {
    /// Create a reference state registered under `name`, starting at
    /// `init`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, init: Option<T>) -> Self {
        let core = Rc::new(RefCell::new(RefCore { value: init }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    /// Current referenced value, if any.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.core.borrow().value.clone()
    }

    /// Whether a value is currently referenced.
    #[must_use]
    pub fn is_some(&self) -> bool {
        self.core.borrow().value.is_some()
    }

    /// Set or clear the reference. No-op when unchanged.
    pub fn set(&self, sm: &mut StateManager, value: Option<T>) -> StateResult<()> {
        let from = {
            let core = self.core.borrow();
            if core.value == value {
                return Ok(());
            }
            core.value.clone()
        };
        let change = RefChange {
            target: self.id,
            core: Rc::clone(&self.core),
            from,
            to: value,
        };
        change.apply();
        sm.record(Box::new(change))
    }

    /// Clear the reference. No-op when already absent.
    pub fn clear(&self, sm: &mut StateManager) -> StateResult<()> {
        self.set(sm, None)
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.id
    }
}
