//! Typed single-owner collections of ownable items.

use std::rc::Rc;

use crate::error::StateResult;
use crate::item::ItemRef;
use crate::observe::{StateId, StateManager};
use crate::own::{Ownable, Owner};
use crate::state::SetState;

/// A typed collection of ownable items bound to one owner.
///
/// Membership lives in a tracked set, so adds and removes are ordinary
/// change records and undo restores exact prior membership.
#[derive(Debug)]
pub struct Portfolio<T: Ownable> {
    owner: Owner,
    items: SetState<ItemRef<T>>,
}

// Hand-written so cloning a handle never requires `T: Clone`.
impl<T: Ownable> Clone for Portfolio<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            items: self.items.clone(),
        }
    }
}

impl<T: Ownable> Portfolio<T> {
    /// Create a portfolio for `owner`, registered in the arena under
    /// `name`. Registration with the portfolio manager is separate;
    /// see [`Session::create_portfolio`](crate::Session::create_portfolio).
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, owner: Owner) -> Self {
        Self {
            owner,
            items: SetState::new(sm, name),
        }
    }

    /// The bound owner.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Whether `item` is currently a member.
    #[must_use]
    pub fn contains(&self, item: &Rc<T>) -> bool {
        self.items.contains(&ItemRef::new(item))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the portfolio is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Decoupled snapshot of the members, ordered by item id.
    #[must_use]
    pub fn view(&self) -> Vec<ItemRef<T>> {
        self.items.view().into_iter().collect()
    }

    /// Observable identity of the membership set.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.items.state_id()
    }

    pub(crate) fn insert(&self, sm: &mut StateManager, item: &Rc<T>) -> StateResult<bool> {
        self.items.insert(sm, ItemRef::new(item))
    }

    pub(crate) fn remove(&self, sm: &mut StateManager, item: &Rc<T>) -> StateResult<bool> {
        self.items.remove(sm, &ItemRef::new(item))
    }
}
