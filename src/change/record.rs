//! The reversible mutation record.

use std::fmt;

use crate::observe::StateId;

/// A reversible mutation record bound to exactly one state.
///
/// A change is a pure value: the container mutator constructs it,
/// applies it once, and hands it to the state manager, which appends it
/// to the open transaction buffer. `apply` and `revert` are exact
/// inverses, so a closed set replays forward in order and inverts in
/// strict reverse order.
pub trait Change: fmt::Debug + 'static {
    /// The single state this change mutates.
    fn target(&self) -> StateId;

    /// Apply the mutation. Also used when the enclosing set is redone.
    fn apply(&self);

    /// Invert the mutation.
    fn revert(&self);
}
