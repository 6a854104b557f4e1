//! Closed change batches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::change::Change;
use crate::observe::StateId;

/// Marker for the external cause object tagged onto a closed change
/// set.
///
/// Blanket-implemented for any debuggable static value. The kernel
/// never interprets the cause; it only renders it into summaries and
/// hands it back to reporters.
pub trait Cause: fmt::Debug + 'static {}

impl<T: fmt::Debug + 'static> Cause for T {}

/// An ordered, immutable batch of changes produced by one transaction.
///
/// Contents are frozen at close time; the set only replays or inverts
/// them as a unit.
pub struct ChangeSet {
    index: usize,
    cause: Box<dyn Cause>,
    changes: Vec<Box<dyn Change>>,
}

impl ChangeSet {
    pub(crate) fn new(
        index: usize,
        cause: Box<dyn Cause>,
        changes: Vec<Box<dyn Change>>,
    ) -> Self {
        Self {
            index,
            cause,
            changes,
        }
    }

    /// Position in the committed history. The initial placeholder set
    /// has index 0.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The external cause this set was closed with.
    #[must_use]
    pub fn cause(&self) -> &dyn Cause {
        self.cause.as_ref()
    }

    /// Number of change records in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the set contains no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Distinct states touched by this set, in first-touch order.
    #[must_use]
    pub fn touched(&self) -> Vec<StateId> {
        let mut seen = Vec::new();
        for change in &self.changes {
            let id = change.target();
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Re-apply every change in original forward order.
    pub(crate) fn apply_all(&self) {
        for change in &self.changes {
            change.apply();
        }
    }

    /// Invert every change in strict reverse order.
    pub(crate) fn revert_all(&self) {
        for change in self.changes.iter().rev() {
            change.revert();
        }
    }

    /// Flat, serializable description for external reporters.
    #[must_use]
    pub fn summary(&self) -> ChangeSetSummary {
        ChangeSetSummary {
            index: self.index,
            cause: format!("{:?}", self.cause),
            changes: self.changes.iter().map(|c| format!("{c:?}")).collect(),
            touched: self.touched(),
        }
    }
}

impl fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSet")
            .field("index", &self.index)
            .field("cause", &self.cause)
            .field("changes", &self.changes.len())
            .finish()
    }
}

/// Flat description of a closed change set, as handed to persistence
/// and replay layers. The kernel defines no wire format; this is just
/// the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetSummary {
    /// Position in the committed history.
    pub index: usize,
    /// Rendered cause object.
    pub cause: String,
    /// Rendered change records, in application order.
    pub changes: Vec<String>,
    /// Distinct touched states, in first-touch order.
    pub touched: Vec<StateId>,
}
