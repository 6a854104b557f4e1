//! The transaction log: reversible change records, closed change sets,
//! and the undo/redo stack.
//!
//! Every mutation of a container produces one [`Change`] record. The
//! open records accumulate in the [`ChangeStack`] buffer until the
//! enclosing transaction is closed into an immutable [`ChangeSet`],
//! after which the whole set can be undone and redone as a unit.

mod record;
mod set;
mod stack;

pub use record::Change;
pub use set::{Cause, ChangeSet, ChangeSetSummary};
pub use stack::{ChangeReporter, ChangeStack};
