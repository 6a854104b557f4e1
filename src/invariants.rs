//! Kernel invariants - sanity checks that detect bugs.
//!
//! These should never trigger against a correctly behaving kernel. If
//! one does, it indicates a bug in the kernel or in a collaborator
//! mutating state behind the change log's back.
//!
//! These are NOT validation of caller input - precondition errors are
//! reported synchronously by each operation. These sweep the whole
//! session for structural damage.

use std::any::TypeId;
use std::collections::BTreeMap;

use crate::item::ItemId;
use crate::own::{PortfolioProbe, WalletProbe};
use crate::session::Session;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all kernel invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
/// These are bug detectors, not gameplay limits.
#[must_use]
pub fn check_invariants(session: &Session) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    // Ownership exclusivity: per item type, every member id appears in
    // exactly one portfolio.
    let mut holders: BTreeMap<(TypeId, ItemId), Vec<String>> = BTreeMap::new();
    for ((type_id, _), probe) in session.portfolios.probes() {
        for member in probe.member_ids() {
            holders
                .entry((*type_id, member))
                .or_default()
                .push(probe.probe_owner().name().to_owned());
        }
    }
    for ((_, member), owners) in &holders {
        if owners.len() > 1 {
            violations.push(InvariantViolation {
                message: format!(
                    "item {} contained by {} portfolios: {owners:?}",
                    member.raw(),
                    owners.len()
                ),
            });
        }
    }

    // Registry key consistency: an entry's key matches its collection.
    for ((_, owner_id), probe) in session.portfolios.probes() {
        if probe.probe_owner().id() != *owner_id {
            violations.push(InvariantViolation {
                message: format!(
                    "portfolio for {} registered under owner id {}",
                    probe.probe_owner().name(),
                    owner_id.raw()
                ),
            });
        }
    }
    for ((_, owner_id), probe) in session.wallets.probes() {
        if probe.probe_owner().id() != *owner_id {
            violations.push(InvariantViolation {
                message: format!(
                    "wallet for {} registered under owner id {}",
                    probe.probe_owner().name(),
                    owner_id.raw()
                ),
            });
        }
    }

    // Dependency graph acyclicity.
    if let Err(err) = session.state.verify_acyclic() {
        violations.push(InvariantViolation {
            message: err.to_string(),
        });
    }

    // Change stack shape: placeholder at the bottom, contiguous
    // indices on both stacks.
    let history = session.state.stack().history_indices();
    if history.first() != Some(&0) {
        violations.push(InvariantViolation {
            message: format!("undo stack not bottomed by the placeholder: {history:?}"),
        });
    }
    for (position, index) in history.iter().enumerate() {
        if *index != position {
            violations.push(InvariantViolation {
                message: format!("undo stack indices not contiguous: {history:?}"),
            });
            break;
        }
    }
    let current = session.state.stack().current_index();
    let redo = session.state.stack().redo_indices();
    for (offset, index) in redo.iter().rev().enumerate() {
        if *index != current + 1 + offset {
            violations.push(InvariantViolation {
                message: format!(
                    "redo stack indices not contiguous above {current}: {redo:?}"
                ),
            });
            break;
        }
    }

    violations
}

/// Assert all kernel invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(session: &Session) {
    let violations = check_invariants(session);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!(
            "Kernel invariant violations:\n  - {}",
            messages.join("\n  - ")
        );
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_session: &Session) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_holds_invariants() {
        let session = Session::new();
        assert!(check_invariants(&session).is_empty());
        assert_invariants(&session);
    }
}
