//! The undo/redo log.

use std::fmt;

use tracing::debug;

use crate::change::{Cause, Change, ChangeSet};
use crate::error::{StateError, StateResult};
use crate::observe::StateId;

/// External reporter notified of change-stack lifecycle events.
///
/// Used by persistence and replay layers outside this kernel. The
/// kernel attaches no reporter of its own.
pub trait ChangeReporter {
    /// Called once when the reporter is attached to a stack.
    fn attached(&mut self, current_index: usize);

    /// A transaction was closed into `set`.
    fn on_close(&mut self, set: &ChangeSet);

    /// `set` was undone.
    fn on_undo(&mut self, set: &ChangeSet);

    /// `set` was redone.
    fn on_redo(&mut self, set: &ChangeSet);

    /// An undo or redo pass (single or bulk) finished, leaving the
    /// committed history at `current_index`.
    fn after_undo_redo(&mut self, current_index: usize);
}

/// The transaction log: committed (undo) stack, available (redo)
/// stack, and the open accumulation buffer.
///
/// The undo stack is bottomed by a placeholder set of index 0 that is
/// never popped; "nothing to undo" means only the placeholder remains.
pub struct ChangeStack {
    undo: Vec<ChangeSet>,
    redo: Vec<ChangeSet>,
    open: Vec<Box<dyn Change>>,
    reporter: Option<Box<dyn ChangeReporter>>,
}

impl ChangeStack {
    pub(crate) fn new() -> Self {
        Self {
            undo: vec![ChangeSet::new(0, Box::new("initial"), Vec::new())],
            redo: Vec::new(),
            open: Vec::new(),
            reporter: None,
        }
    }

    /// Attach the external reporter, replacing any previous one.
    pub fn set_reporter(&mut self, mut reporter: Box<dyn ChangeReporter>) {
        reporter.attached(self.current_index());
        self.reporter = Some(reporter);
    }

    /// Index of the newest committed change set.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.undo.last().map_or(0, ChangeSet::index)
    }

    /// Highest index reachable by redo.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.current_index() + self.redo.len()
    }

    /// Number of changes accumulated in the open buffer.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Whether the open buffer holds no changes.
    #[must_use]
    pub fn is_open_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Number of committed sets, including the placeholder.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of sets available for redo.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// The committed set at `index`, if still in the history.
    #[must_use]
    pub fn committed(&self, index: usize) -> Option<&ChangeSet> {
        self.undo.get(index).filter(|set| set.index() == index)
    }

    pub(crate) fn push(&mut self, change: Box<dyn Change>) {
        self.open.push(change);
    }

    pub(crate) fn history_indices(&self) -> Vec<usize> {
        self.undo.iter().map(ChangeSet::index).collect()
    }

    pub(crate) fn redo_indices(&self) -> Vec<usize> {
        // Top of the redo stack last.
        self.redo.iter().map(ChangeSet::index).collect()
    }

    /// Freeze the open buffer into a new committed change set and
    /// clear the redo stack. Returns the touched states, or `None`
    /// when the buffer was empty (no-op).
    pub(crate) fn close(&mut self, cause: Box<dyn Cause>) -> Option<Vec<StateId>> {
        if self.open.is_empty() {
            return None;
        }
        let index = self.undo.len();
        let set = ChangeSet::new(index, cause, std::mem::take(&mut self.open));
        debug!(index, changes = set.len(), "closed change set");
        self.redo.clear();
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.on_close(&set);
        }
        let touched = set.touched();
        self.undo.push(set);
        Some(touched)
    }

    /// Invert and discard any uncommitted changes in the open buffer.
    fn rollback_open(&mut self) {
        while let Some(change) = self.open.pop() {
            change.revert();
        }
    }

    /// Undo the newest committed set. Returns its touched states.
    pub(crate) fn undo_step(&mut self) -> StateResult<Vec<StateId>> {
        if self.undo.len() <= 1 {
            return Err(StateError::NothingToUndo);
        }
        self.rollback_open();
        let Some(set) = self.undo.pop() else {
            return Err(StateError::NothingToUndo);
        };
        set.revert_all();
        debug!(index = set.index(), "undid change set");
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.on_undo(&set);
        }
        let touched = set.touched();
        self.redo.push(set);
        Ok(touched)
    }

    /// Redo the newest undone set. Returns its touched states.
    pub(crate) fn redo_step(&mut self) -> StateResult<Vec<StateId>> {
        if self.redo.is_empty() {
            return Err(StateError::NothingToRedo);
        }
        self.rollback_open();
        let Some(set) = self.redo.pop() else {
            return Err(StateError::NothingToRedo);
        };
        set.apply_all();
        debug!(index = set.index(), "redid change set");
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.on_redo(&set);
        }
        let touched = set.touched();
        self.undo.push(set);
        Ok(touched)
    }

    /// Reporter callback after a single or bulk undo/redo pass.
    pub(crate) fn finish_undo_redo(&mut self) {
        let index = self.current_index();
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.after_undo_redo(index);
        }
    }

    pub(crate) fn check_undo_target(&self, target: usize) -> StateResult<()> {
        let current = self.current_index();
        if target >= current {
            return Err(StateError::TargetOutOfRange {
                target,
                min: 0,
                max: current.saturating_sub(1),
            });
        }
        Ok(())
    }

    pub(crate) fn check_redo_target(&self, target: usize) -> StateResult<()> {
        let current = self.current_index();
        let max = self.max_index();
        if target <= current || target > max {
            return Err(StateError::TargetOutOfRange {
                target,
                min: current + 1,
                max,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ChangeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeStack")
            .field("current_index", &self.current_index())
            .field("redo_len", &self.redo.len())
            .field("open_len", &self.open.len())
            .finish()
    }
}
