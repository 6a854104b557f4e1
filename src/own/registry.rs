//! Central registries keyed by (item type, owner).

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::item::ItemId;
use crate::own::{Countable, Ownable, Owner, Portfolio, Wallet};

/// Type-erased audit surface over a registered portfolio, used by the
/// invariant checker.
pub(crate) trait PortfolioProbe: Any {
    fn probe_owner(&self) -> &Owner;
    fn member_ids(&self) -> Vec<ItemId>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Ownable> PortfolioProbe for Portfolio<T> {
    fn probe_owner(&self) -> &Owner {
        self.owner()
    }

    fn member_ids(&self) -> Vec<ItemId> {
        self.view().iter().map(crate::item::ItemRef::id).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Registry of portfolios keyed by (item type, owner). At most one
/// portfolio exists per key.
#[derive(Default)]
pub struct PortfolioManager {
    entries: BTreeMap<(TypeId, ItemId), Box<dyn PortfolioProbe>>,
}

impl PortfolioManager {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Whether a portfolio of type `T` is registered for `owner`.
    #[must_use]
    pub fn contains<T: Ownable>(&self, owner: &Owner) -> bool {
        self.entries.contains_key(&(TypeId::of::<T>(), owner.id()))
    }

    /// Register `portfolio` under its (type, owner) key.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicatePortfolio`] when the key is
    /// already taken.
    pub fn register<T: Ownable>(&mut self, portfolio: Portfolio<T>) -> StateResult<()> {
        let key = (TypeId::of::<T>(), portfolio.owner().id());
        if self.entries.contains_key(&key) {
            return Err(StateError::DuplicatePortfolio {
                type_name: type_name::<T>(),
                owner: portfolio.owner().name().to_owned(),
            });
        }
        debug!(
            type_name = type_name::<T>(),
            owner = portfolio.owner().name(),
            "registered portfolio"
        );
        self.entries.insert(key, Box::new(portfolio));
        Ok(())
    }

    /// Look up the portfolio for (`T`, `owner`).
    #[must_use]
    pub fn get<T: Ownable>(&self, owner: &Owner) -> Option<Portfolio<T>> {
        self.entries
            .get(&(TypeId::of::<T>(), owner.id()))
            .and_then(|probe| probe.as_any().downcast_ref::<Portfolio<T>>())
            .cloned()
    }

    /// Remove and return the portfolio for (`T`, `owner`).
    pub fn remove<T: Ownable>(&mut self, owner: &Owner) -> Option<Portfolio<T>> {
        let probe = self.entries.remove(&(TypeId::of::<T>(), owner.id()))?;
        probe.into_any().downcast::<Portfolio<T>>().ok().map(|p| *p)
    }

    /// Owners whose portfolio of type `T` currently contains `item`.
    /// A consistent registry yields at most one.
    #[must_use]
    pub fn holders<T: Ownable>(&self, item: &Rc<T>) -> Vec<Owner> {
        let tid = TypeId::of::<T>();
        self.entries
            .iter()
            .filter(|((t, _), _)| *t == tid)
            .filter_map(|(_, probe)| probe.as_any().downcast_ref::<Portfolio<T>>())
            .filter(|portfolio| portfolio.contains(item))
            .map(|portfolio| portfolio.owner().clone())
            .collect()
    }

    /// Number of registered portfolios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no portfolio is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn probes(
        &self,
    ) -> impl Iterator<Item = (&(TypeId, ItemId), &dyn PortfolioProbe)> {
        self.entries.iter().map(|(key, probe)| (key, probe.as_ref()))
    }
}

impl fmt::Debug for PortfolioManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortfolioManager")
            .field("portfolios", &self.entries.len())
            .finish()
    }
}

/// Type-erased audit surface over a registered wallet.
pub(crate) trait WalletProbe: Any {
    fn probe_owner(&self) -> &Owner;
    fn unit_totals(&self) -> Vec<(ItemId, i64)>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Countable> WalletProbe for Wallet<T> {
    fn probe_owner(&self) -> &Owner {
        self.owner()
    }

    fn unit_totals(&self) -> Vec<(ItemId, i64)> {
        self.entries()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Registry of wallets keyed by (unit type, owner). At most one wallet
/// exists per key.
#[derive(Default)]
pub struct WalletManager {
    entries: BTreeMap<(TypeId, ItemId), Box<dyn WalletProbe>>,
}

impl WalletManager {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Whether a wallet of type `T` is registered for `owner`.
    #[must_use]
    pub fn contains<T: Countable>(&self, owner: &Owner) -> bool {
        self.entries.contains_key(&(TypeId::of::<T>(), owner.id()))
    }

    /// Register `wallet` under its (type, owner) key.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateWallet`] when the key is already
    /// taken.
    pub fn register<T: Countable>(&mut self, wallet: Wallet<T>) -> StateResult<()> {
        let key = (TypeId::of::<T>(), wallet.owner().id());
        if self.entries.contains_key(&key) {
            return Err(StateError::DuplicateWallet {
                type_name: type_name::<T>(),
                owner: wallet.owner().name().to_owned(),
            });
        }
        debug!(
            type_name = type_name::<T>(),
            owner = wallet.owner().name(),
            "registered wallet"
        );
        self.entries.insert(key, Box::new(wallet));
        Ok(())
    }

    /// Look up the wallet for (`T`, `owner`).
    #[must_use]
    pub fn get<T: Countable>(&self, owner: &Owner) -> Option<Wallet<T>> {
        self.entries
            .get(&(TypeId::of::<T>(), owner.id()))
            .and_then(|probe| probe.as_any().downcast_ref::<Wallet<T>>())
            .cloned()
    }

    /// Remove and return the wallet for (`T`, `owner`).
    pub fn remove<T: Countable>(&mut self, owner: &Owner) -> Option<Wallet<T>> {
        let probe = self.entries.remove(&(TypeId::of::<T>(), owner.id()))?;
        probe.into_any().downcast::<Wallet<T>>().ok().map(|w| *w)
    }

    /// Sum of `unit`'s totals across every registered wallet of type
    /// `T`. Conserved by transfers between registered owners.
    #[must_use]
    pub fn total<T: Countable>(&self, unit: &Rc<T>) -> i64 {
        let tid = TypeId::of::<T>();
        self.entries
            .iter()
            .filter(|((t, _), _)| *t == tid)
            .filter_map(|(_, probe)| probe.as_any().downcast_ref::<Wallet<T>>())
            .map(|wallet| wallet.value(unit))
            .sum()
    }

    /// Number of registered wallets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no wallet is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn probes(
        &self,
    ) -> impl Iterator<Item = (&(TypeId, ItemId), &dyn WalletProbe)> {
        self.entries.iter().map(|(key, probe)| (key, probe.as_ref()))
    }
}

impl fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletManager")
            .field("wallets", &self.entries.len())
            .finish()
    }
}
