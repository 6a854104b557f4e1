// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Tabula: a transactional, observable state kernel for turn-based
//! simulations.
//!
//! Domain objects keep their mutable state in typed containers; every
//! mutation is captured as a reversible change record, grouped into
//! atomic change sets. That one discipline buys undo/redo for free and
//! drives dependency-ordered notification of derived values to
//! external observers. An ownership layer on top guarantees that every
//! trackable item belongs to exactly one typed collection at a time
//! and that fungible totals are conserved across transfers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Ownership (Portfolio / Wallet)    │
//! ├─────────────────────────────────────┤
//! │ Observation (Observer/Model/Graph)  │
//! ├─────────────────────────────────────┤
//! │ Containers (scalar/list/set/map)    │
//! ├─────────────────────────────────────┤
//! │ Change log (Change/Set/Stack)       │
//! └─────────────────────────────────────┘
//! ```
//!
//! Everything hangs off one [`Session`] per running game: single
//! logical writer, synchronous, immediately consistent.

pub mod change;
pub mod error;
pub mod invariants;
pub mod item;
pub mod observe;
pub mod own;
pub mod session;
pub mod state;

pub use error::{ErrorKind, StateError, StateResult};
pub use session::Session;

// Re-export key types at crate root for convenience
pub use change::{Cause, Change, ChangeReporter, ChangeSet, ChangeSetSummary, ChangeStack};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use item::{Item, ItemCore, ItemId, ItemRef, ItemRegistry};
pub use observe::{
    Model, Observer, ObserverHandle, StateId, StateManager, Trigger, TriggerHandle, observer_fn,
};
pub use own::{
    Countable, Ownable, Owner, Portfolio, PortfolioManager, Wallet, WalletManager, new_owner_cell,
};
pub use state::{
    BoolState, GenericState, IntState, ListState, MapState, MultimapState, SetState, StringState,
};
