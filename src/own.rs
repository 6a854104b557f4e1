//! Ownership subsystem: owners, portfolios, wallets, and their
//! registries.
//!
//! Every [`Ownable`] belongs to exactly one [`Portfolio`] at a time;
//! every [`Countable`] unit has its running totals in [`Wallet`]s.
//! Both collections are bound to one [`Owner`] and registered centrally
//! under the (item type, owner) key. Before its first explicit
//! placement, everything belongs to the unknown-owner sentinel.

mod portfolio;
mod registry;
mod wallet;

pub use portfolio::Portfolio;
pub(crate) use registry::{PortfolioProbe, WalletProbe};
pub use registry::{PortfolioManager, WalletManager};
pub use wallet::Wallet;

use std::fmt;
use std::rc::Rc;

use crate::item::{Item, ItemCore, ItemId};
use crate::observe::StateManager;
use crate::state::GenericState;

/// Identity handle for an owner. Cheap to clone; compared by item id.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Owner {
    id: ItemId,
    name: Rc<str>,
}

impl Owner {
    pub(crate) fn from_core(core: &ItemCore) -> Self {
        Self {
            id: core.id(),
            name: Rc::from(core.local_id()),
        }
    }

    /// The sentinel owner everything belongs to before its first
    /// explicit placement.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            id: ItemId::UNKNOWN,
            name: Rc::from("unknown"),
        }
    }

    /// Whether this is the sentinel.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.id == ItemId::UNKNOWN
    }

    /// Owner id.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Capability: an item that belongs to exactly one owner at a time.
///
/// Implementors embed a `GenericState<Owner>` cell, created with
/// [`new_owner_cell`], so ownership updates flow through the change
/// log like any other mutation.
pub trait Ownable: Item {
    /// The owner reference cell.
    fn owner_cell(&self) -> &GenericState<Owner>;

    /// Current owner; the sentinel when never explicitly placed.
    fn owner(&self) -> Owner {
        self.owner_cell().get().unwrap_or_else(Owner::unknown)
    }
}

/// Capability: a fungible unit whose totals live in wallets.
pub trait Countable: Item {}

/// Create the owner cell an [`Ownable`] embeds, initialized to the
/// unknown-owner sentinel and registered under the item's path.
#[must_use]
pub fn new_owner_cell(sm: &mut StateManager, core: &ItemCore) -> GenericState<Owner> {
    let name = format!("{}/owner", core.path());
    GenericState::new(sm, &name, Some(Owner::unknown()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_owner_sentinel() {
        let unknown = Owner::unknown();
        assert!(unknown.is_unknown());
        assert_eq!(unknown.name(), "unknown");
        assert_eq!(unknown, Owner::unknown());
    }
}
