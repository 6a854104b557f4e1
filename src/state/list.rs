//! Ordered list container.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::change::Change;
use crate::error::{StateError, StateResult};
use crate::observe::{StateId, StateManager};

use super::register_core;

pub(crate) struct ListCore<T> {
    items: Vec<T>,
}

impl<T: fmt::Debug> fmt::Debug for ListCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.items)
    }
}

enum ListOp<T> {
    Insert { index: usize, item: T },
    Remove { index: usize, item: T },
    Clear { items: Vec<T> },
}

struct ListChange<T> {
    target: StateId,
    core: Rc<RefCell<ListCore<T>>>,
    op: ListOp<T>,
}

impl<T: fmt::Debug> fmt::Debug for ListChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            ListOp::Insert { index, item } => {
                write!(f, "s{} insert[{index}] {item:?}", self.target.raw())
            }
            ListOp::Remove { index, item } => {
                write!(f, "s{} remove[{index}] {item:?}", self.target.raw())
            }
            ListOp::Clear { items } => {
                write!(f, "s{} clear {} items", self.target.raw(), items.len())
            }
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> Change for ListChange<T> {
    fn target(&self) -> StateId {
        self.target
    }

    fn apply(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            ListOp::Insert { index, item } => core.items.insert(*index, item.clone()),
            ListOp::Remove { index, .. } => {
                core.items.remove(*index);
            }
            ListOp::Clear { .. } => core.items.clear(),
        }
    }

    fn revert(&self) {
        let mut core = self.core.borrow_mut();
        match &self.op {
            ListOp::Insert { index, .. } => {
                core.items.remove(*index);
            }
            ListOp::Remove { index, item } => core.items.insert(*index, item.clone()),
            ListOp::Clear { items } => {
                core.items.clear();
                core.items.extend(items.iter().cloned());
            }
        }
    }
}

/// Ordered list of values with indexed edits, element moves, and a
/// positional minimal-diff replace.
#[derive(Debug, Clone)]
pub struct ListState<T> {
    id: StateId,
    core: Rc<RefCell<ListCore<T>>>,
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> ListState<T> {
    /// Create an empty list registered under `name`.
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str) -> Self {
        let core = Rc::new(RefCell::new(ListCore { items: Vec::new() }));
        let id = register_core(sm, name, &core);
        Self { id, core }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.borrow().items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.borrow().items.is_empty()
    }

    /// Element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.core.borrow().items.get(index).cloned()
    }

    /// Whether `item` is an element.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.core.borrow().items.contains(item)
    }

    /// Index of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.core.borrow().items.iter().position(|i| i == item)
    }

    /// Decoupled snapshot of the elements.
    #[must_use]
    pub fn view(&self) -> Vec<T> {
        self.core.borrow().items.clone()
    }

    /// Observable identity.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.id
    }

    fn record_op(&self, sm: &mut StateManager, op: ListOp<T>) -> StateResult<()> {
        let change = ListChange {
            target: self.id,
            core: Rc::clone(&self.core),
            op,
        };
        change.apply();
        sm.record(Box::new(change))
    }

    /// Append `item`.
    pub fn push(&self, sm: &mut StateManager, item: T) -> StateResult<()> {
        let index = self.len();
        self.record_op(sm, ListOp::Insert { index, item })
    }

    /// Insert `item` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::IndexOutOfRange`] when `index > len`.
    pub fn insert(&self, sm: &mut StateManager, index: usize, item: T) -> StateResult<()> {
        let len = self.len();
        if index > len {
            return Err(StateError::IndexOutOfRange { index, len });
        }
        self.record_op(sm, ListOp::Insert { index, item })
    }

    /// Remove the first element equal to `item`. Returns whether an
    /// element was removed; an absent item is a no-op.
    pub fn remove(&self, sm: &mut StateManager, item: &T) -> StateResult<bool> {
        match self.index_of(item) {
            None => Ok(false),
            Some(index) => {
                self.record_op(
                    sm,
                    ListOp::Remove {
                        index,
                        item: item.clone(),
                    },
                )?;
                Ok(true)
            }
        }
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::IndexOutOfRange`] when `index >= len`.
    pub fn remove_at(&self, sm: &mut StateManager, index: usize) -> StateResult<T> {
        let Some(item) = self.get(index) else {
            return Err(StateError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        };
        self.record_op(
            sm,
            ListOp::Remove {
                index,
                item: item.clone(),
            },
        )?;
        Ok(item)
    }

    /// Move `item` to `index`.
    ///
    /// The destination is validated against the list length after the
    /// hypothetical removal, inclusive of the removed slot, before
    /// anything is mutated. On success the move is two linked changes
    /// (remove, then insert). Moving an item to its current position
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::ItemNotInList`] when `item` is absent and
    /// [`StateError::IndexOutOfRange`] when the destination is
    /// invalid; in both cases the list is untouched.
    pub fn move_item(&self, sm: &mut StateManager, item: &T, index: usize) -> StateResult<()> {
        let len = self.len();
        let Some(current) = self.index_of(item) else {
            return Err(StateError::ItemNotInList {
                item: format!("{item:?}"),
            });
        };
        if index >= len {
            return Err(StateError::IndexOutOfRange { index, len });
        }
        if index == current {
            return Ok(());
        }
        self.record_op(
            sm,
            ListOp::Remove {
                index: current,
                item: item.clone(),
            },
        )?;
        self.record_op(
            sm,
            ListOp::Insert {
                index,
                item: item.clone(),
            },
        )
    }

    /// Remove every element. No-op when already empty.
    pub fn clear(&self, sm: &mut StateManager) -> StateResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let items = self.view();
        self.record_op(sm, ListOp::Clear { items })
    }

    /// Replace the contents with `target` using a positional diff:
    /// walk both sequences, on a mismatch remove the current element
    /// at that position and insert the target element there, then
    /// remove or insert the remaining tail. Positions where the
    /// sequences already agree generate no changes.
    pub fn set_to(&self, sm: &mut StateManager, target: &[T]) -> StateResult<()> {
        let mut pos = 0;
        while pos < target.len() {
            match self.get(pos) {
                Some(current) if current == target[pos] => {}
                Some(current) => {
                    self.record_op(
                        sm,
                        ListOp::Remove {
                            index: pos,
                            item: current,
                        },
                    )?;
                    self.record_op(
                        sm,
                        ListOp::Insert {
                            index: pos,
                            item: target[pos].clone(),
                        },
                    )?;
                }
                None => {
                    self.record_op(
                        sm,
                        ListOp::Insert {
                            index: pos,
                            item: target[pos].clone(),
                        },
                    )?;
                }
            }
            pos += 1;
        }
        while self.len() > target.len() {
            let Some(item) = self.get(target.len()) else {
                break;
            };
            self.record_op(
                sm,
                ListOp::Remove {
                    index: target.len(),
                    item,
                },
            )?;
        }
        Ok(())
    }
}
