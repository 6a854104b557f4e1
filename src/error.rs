//! Error types for the state kernel.

use thiserror::Error;

/// Classification of kernel failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid argument or registry lookup, detected before any mutation.
    Precondition,
    /// Operation not legal at the current undo/redo position.
    IllegalSequence,
    /// A structural invariant of the dependency graph was violated.
    Structural,
}

/// Errors surfaced by kernel operations.
///
/// Every failure is reported synchronously to the immediate caller.
/// Single-call operations never leave partial state behind on failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// List index outside the valid range.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the list at the time of the call.
        len: usize,
    },
    /// The item is not an element of the list.
    #[error("item not present in list: {item}")]
    ItemNotInList {
        /// Rendered item.
        item: String,
    },
    /// Wallet transfers only accept non-negative amounts.
    #[error("negative transfer amount: {0}")]
    NegativeAmount(i64),
    /// Wallet transfer where source and destination are the same owner.
    #[error("transfer source and destination are both {0}")]
    SelfTransfer(String),
    /// Ownership move where the item already belongs to the destination.
    #[error("item already belongs to {0}")]
    AlreadyOwned(String),
    /// No portfolio registered under the (type, owner) key.
    #[error("no portfolio registered for ({type_name}, {owner})")]
    PortfolioNotFound {
        /// Item type of the missing portfolio.
        type_name: &'static str,
        /// Owner the lookup was keyed by.
        owner: String,
    },
    /// A portfolio is already registered under the (type, owner) key.
    #[error("portfolio already registered for ({type_name}, {owner})")]
    DuplicatePortfolio {
        /// Item type of the clashing portfolio.
        type_name: &'static str,
        /// Owner the registration was keyed by.
        owner: String,
    },
    /// No wallet registered under the (type, owner) key.
    #[error("no wallet registered for ({type_name}, {owner})")]
    WalletNotFound {
        /// Unit type of the missing wallet.
        type_name: &'static str,
        /// Owner the lookup was keyed by.
        owner: String,
    },
    /// A wallet is already registered under the (type, owner) key.
    #[error("wallet already registered for ({type_name}, {owner})")]
    DuplicateWallet {
        /// Unit type of the clashing wallet.
        type_name: &'static str,
        /// Owner the registration was keyed by.
        owner: String,
    },
    /// An item is already registered at this path.
    #[error("duplicate item path: {0}")]
    DuplicatePath(String),
    /// No item registered at this path.
    #[error("no item registered at path: {0}")]
    UnknownPath(String),
    /// The state id does not belong to this session.
    #[error("state id {0} is not registered")]
    UnknownState(u32),
    /// A dependency edge must point at a model.
    #[error("dependency target {0} is not a model")]
    DependentNotAModel(String),
    /// Undo with only the initial placeholder change set remaining.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Redo with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,
    /// Bulk undo/redo target outside the reachable index range.
    #[error("target index {target} outside reachable range {min}..={max}")]
    TargetOutOfRange {
        /// Requested change-set index.
        target: usize,
        /// Lowest reachable index.
        min: usize,
        /// Highest reachable index.
        max: usize,
    },
    /// Cycle found while resolving the dependency graph.
    #[error("dependency cycle detected at {node}")]
    DependencyCycle {
        /// Diagnostic name of the node closing the cycle.
        node: String,
    },
}

impl StateError {
    /// Classify this error into the kernel failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NothingToUndo | Self::NothingToRedo | Self::TargetOutOfRange { .. } => {
                ErrorKind::IllegalSequence
            }
            Self::DependencyCycle { .. } => ErrorKind::Structural,
            _ => ErrorKind::Precondition,
        }
    }
}

/// Result type for kernel operations.
pub type StateResult<T> = Result<T, StateError>;
