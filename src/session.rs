//! The per-game context handle.

use std::any::type_name;
use std::rc::Rc;

use crate::change::{Cause, ChangeReporter};
use crate::error::{StateError, StateResult};
use crate::item::{ItemCore, ItemRegistry};
use crate::observe::StateManager;
use crate::own::{
    Countable, Ownable, Owner, Portfolio, PortfolioManager, Wallet, WalletManager,
};

/// Everything one running game needs to track state: the observable
/// arena and change stack, the item path registry, and the ownership
/// registries.
///
/// Construct one per game and thread it by reference into every
/// component that needs lookup; there are no process-wide globals.
/// All operations are synchronous and immediately consistent; a
/// concurrent host must guard the whole session behind one
/// mutual-exclusion boundary.
#[derive(Debug)]
pub struct Session {
    /// Observable arena, dependency graph, and change stack.
    pub state: StateManager,
    /// Item path registry.
    pub items: ItemRegistry,
    /// Portfolio registry.
    pub portfolios: PortfolioManager,
    /// Wallet registry.
    pub wallets: WalletManager,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: StateManager::new(),
            items: ItemRegistry::new(),
            portfolios: PortfolioManager::new(),
            wallets: WalletManager::new(),
        }
    }

    /// Register a new item under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicatePath`] when the derived path is
    /// taken.
    pub fn create_item(
        &mut self,
        parent: Option<&ItemCore>,
        local_id: &str,
    ) -> StateResult<ItemCore> {
        self.items.register(parent, local_id)
    }

    /// Create a new owner identity registered at the root.
    pub fn create_owner(&mut self, local_id: &str) -> StateResult<Owner> {
        let core = self.items.register(None, local_id)?;
        Ok(Owner::from_core(&core))
    }

    /// The shared unknown-owner sentinel.
    #[must_use]
    pub fn unknown_owner(&self) -> Owner {
        Owner::unknown()
    }

    /// Create and register the portfolio for (`T`, `owner`).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicatePortfolio`] when the key is
    /// already taken; nothing is created in that case.
    pub fn create_portfolio<T: Ownable>(
        &mut self,
        name: &str,
        owner: &Owner,
    ) -> StateResult<Portfolio<T>> {
        if self.portfolios.contains::<T>(owner) {
            return Err(StateError::DuplicatePortfolio {
                type_name: type_name::<T>(),
                owner: owner.name().to_owned(),
            });
        }
        let portfolio = Portfolio::new(&mut self.state, name, owner.clone());
        self.portfolios.register(portfolio.clone())?;
        Ok(portfolio)
    }

    /// Create and register the wallet for (`T`, `owner`).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateWallet`] when the key is already
    /// taken; nothing is created in that case.
    pub fn create_wallet<T: Countable>(
        &mut self,
        name: &str,
        owner: &Owner,
    ) -> StateResult<Wallet<T>> {
        if self.wallets.contains::<T>(owner) {
            return Err(StateError::DuplicateWallet {
                type_name: type_name::<T>(),
                owner: owner.name().to_owned(),
            });
        }
        let wallet = Wallet::new(&mut self.state, name, owner.clone());
        self.wallets.register(wallet.clone())?;
        Ok(wallet)
    }

    /// Move `item` into `new_owner`'s portfolio.
    ///
    /// Both portfolios are resolved before anything is mutated. The
    /// move is three linked changes, in exactly this order: insert
    /// into the destination, remove from the source (skipped when the
    /// current owner is the sentinel), update the item's owner cell.
    /// Undoing the enclosing transaction restores exact prior
    /// membership and owner reference.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AlreadyOwned`] when `new_owner` is the
    /// current owner, and [`StateError::PortfolioNotFound`] when a
    /// required portfolio is not registered. The item is untouched on
    /// failure.
    pub fn move_ownable<T: Ownable>(
        &mut self,
        item: &Rc<T>,
        new_owner: &Owner,
    ) -> StateResult<()> {
        let current = item.owner();
        if current == *new_owner {
            return Err(StateError::AlreadyOwned(new_owner.name().to_owned()));
        }
        let dest =
            self.portfolios
                .get::<T>(new_owner)
                .ok_or_else(|| StateError::PortfolioNotFound {
                    type_name: type_name::<T>(),
                    owner: new_owner.name().to_owned(),
                })?;
        let source = if current.is_unknown() {
            None
        } else {
            Some(self.portfolios.get::<T>(&current).ok_or_else(|| {
                StateError::PortfolioNotFound {
                    type_name: type_name::<T>(),
                    owner: current.name().to_owned(),
                }
            })?)
        };

        dest.insert(&mut self.state, item)?;
        if let Some(source) = source {
            source.remove(&mut self.state, item)?;
        }
        item.owner_cell().set(&mut self.state, Some(new_owner.clone()))
    }

    /// Transfer `amount` of `unit` from one owner's wallet to
    /// another's.
    ///
    /// Both wallets are resolved before anything is mutated. The
    /// transfer is two linked, symmetric changes: credit the
    /// destination, then debit the source (skipped when `from` is the
    /// sentinel). The summed total is conserved across the move and
    /// its undo.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SelfTransfer`] when `from == to`,
    /// [`StateError::NegativeAmount`] for a negative amount, and
    /// [`StateError::WalletNotFound`] when a required wallet is not
    /// registered. No wallet is touched on failure.
    pub fn transfer<T: Countable>(
        &mut self,
        unit: &Rc<T>,
        from: &Owner,
        amount: i64,
        to: &Owner,
    ) -> StateResult<()> {
        if from == to {
            return Err(StateError::SelfTransfer(to.name().to_owned()));
        }
        if amount < 0 {
            return Err(StateError::NegativeAmount(amount));
        }
        let dest = self
            .wallets
            .get::<T>(to)
            .ok_or_else(|| StateError::WalletNotFound {
                type_name: type_name::<T>(),
                owner: to.name().to_owned(),
            })?;
        let source = if from.is_unknown() {
            None
        } else {
            Some(
                self.wallets
                    .get::<T>(from)
                    .ok_or_else(|| StateError::WalletNotFound {
                        type_name: type_name::<T>(),
                        owner: from.name().to_owned(),
                    })?,
            )
        };

        dest.adjust(&mut self.state, unit, amount)?;
        if let Some(source) = source {
            source.adjust(&mut self.state, unit, -amount)?;
        }
        Ok(())
    }

    /// Close the open transaction under `cause`. Returns `false` when
    /// the buffer was empty (no-op).
    pub fn close(&mut self, cause: impl Cause) -> StateResult<bool> {
        self.state.close(cause)
    }

    /// Undo the newest committed change set.
    pub fn undo(&mut self) -> StateResult<()> {
        self.state.undo()
    }

    /// Redo the newest undone change set.
    pub fn redo(&mut self) -> StateResult<()> {
        self.state.redo()
    }

    /// Undo until the committed index equals `target`.
    pub fn undo_to(&mut self, target: usize) -> StateResult<()> {
        self.state.undo_to(target)
    }

    /// Redo until the committed index equals `target`.
    pub fn redo_to(&mut self, target: usize) -> StateResult<()> {
        self.state.redo_to(target)
    }

    /// Attach the external change reporter.
    pub fn set_reporter(&mut self, reporter: Box<dyn ChangeReporter>) {
        self.state.set_reporter(reporter);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
