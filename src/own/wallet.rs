//! Typed single-owner running totals of countable units.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::StateResult;
use crate::item::ItemRef;
use crate::observe::{StateId, StateManager};
use crate::own::{Countable, Owner};
use crate::state::MapState;

/// A typed running total of countable units bound to one owner.
///
/// One wallet covers every unit of its item type; each unit's total is
/// tracked separately and defaults to 0. Totals may go negative: the
/// kernel conserves sums, it does not enforce solvency.
#[derive(Debug)]
pub struct Wallet<T: Countable> {
    owner: Owner,
    amounts: MapState<ItemRef<T>, i64>,
}

// Hand-written so cloning a handle never requires `T: Clone`.
impl<T: Countable> Clone for Wallet<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            amounts: self.amounts.clone(),
        }
    }
}

impl<T: Countable> Wallet<T> {
    /// Create a wallet for `owner`, registered in the arena under
    /// `name`. Registration with the wallet manager is separate; see
    /// [`Session::create_wallet`](crate::Session::create_wallet).
    #[must_use]
    pub fn new(sm: &mut StateManager, name: &str, owner: Owner) -> Self {
        Self {
            owner,
            amounts: MapState::new(sm, name),
        }
    }

    /// The bound owner.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Current total for `unit`; 0 when never credited.
    #[must_use]
    pub fn value(&self, unit: &Rc<T>) -> i64 {
        self.amounts.get(&ItemRef::new(unit)).unwrap_or(0)
    }

    /// Decoupled snapshot of all per-unit totals.
    #[must_use]
    pub fn view(&self) -> BTreeMap<ItemRef<T>, i64> {
        self.amounts.view()
    }

    /// Observable identity of the totals map.
    #[must_use]
    pub fn state_id(&self) -> StateId {
        self.amounts.state_id()
    }

    /// Shift `unit`'s total by `delta` as one change record.
    pub(crate) fn adjust(
        &self,
        sm: &mut StateManager,
        unit: &Rc<T>,
        delta: i64,
    ) -> StateResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let key = ItemRef::new(unit);
        let next = self.amounts.get(&key).unwrap_or(0).saturating_add(delta);
        self.amounts.put(sm, key, next)
    }

    pub(crate) fn entries(&self) -> Vec<(crate::item::ItemId, i64)> {
        self.amounts
            .view()
            .into_iter()
            .map(|(unit, total)| (unit.id(), total))
            .collect()
    }
}
