//! Typed mutable containers.
//!
//! Every container is a cheap, cloneable handle over a shared core
//! registered with the [`StateManager`](crate::observe::StateManager)
//! at construction. A mutator validates its arguments first, skips all
//! work when the write would leave the value unchanged (an unchanged
//! container never appears in the next closed set's touched states),
//! and otherwise builds a [`Change`](crate::change::Change) record,
//! applies it, and records it into the open transaction buffer.
//!
//! Views are decoupled snapshots: iterating a view never reflects
//! later mutations. Collection containers keep their elements in
//! ordered collections so iteration is deterministic.

mod list;
mod map;
mod multimap;
mod reference;
mod scalar;
mod set;

pub use list::ListState;
pub use map::MapState;
pub use multimap::MultimapState;
pub use reference::GenericState;
pub use scalar::{BoolState, IntState, StringState};
pub use set::SetState;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::observe::{NodeKind, StateId, StateManager, TextSource};

/// Text adapter over a shared container core. The core's `Debug`
/// renders just the contained value.
struct CellText<C>(Rc<RefCell<C>>);

impl<C: fmt::Debug + 'static> TextSource for CellText<C> {
    fn text(&self) -> String {
        format!("{:?}", self.0.borrow())
    }
}

/// Register a container core in the arena under a diagnostic name.
fn register_core<C>(sm: &mut StateManager, name: &str, core: &Rc<RefCell<C>>) -> StateId
where
    C: fmt::Debug + 'static,
{
    sm.register_source(NodeKind::State, name, Box::new(CellText(Rc::clone(core))))
}
