//! Property-based tests for the state kernel.
//!
//! These verify the kernel's contract properties: no-op writes record
//! nothing, undo/redo round-trips every container, list replacement
//! produces the positional minimal diff, wallet totals are conserved,
//! and dependency resolution is a true topological order.
//!
//! Run with: cargo test --release --test prop_kernel

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use tabula::{
    Countable, IntState, Item, ItemCore, ListState, MapState, Model, Owner, Session, SetState,
    check_invariants,
};

/// A currency unit for the conservation properties.
#[derive(Debug)]
struct Coin {
    core: ItemCore,
}

impl Item for Coin {
    fn core(&self) -> &ItemCore {
        &self.core
    }
}

impl Countable for Coin {}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Scalar writes round-trip: undo to the bottom restores the
    /// initial value, redo to the top restores the final value.
    #[test]
    fn prop_scalar_round_trip(initial in -100i64..100, writes in prop::collection::vec(-100i64..100, 1..20)) {
        let mut session = Session::new();
        let count = IntState::new(&mut session.state, "count", initial);

        let mut committed = vec![initial];
        for value in writes {
            count.set(&mut session.state, value).unwrap();
            if session.close("write").unwrap() {
                committed.push(value);
            }
        }
        let top = committed.len() - 1;
        prop_assert_eq!(session.state.stack().current_index(), top);

        if top > 0 {
            session.undo_to(0).unwrap();
            prop_assert_eq!(count.get(), committed[0]);
            session.redo_to(top).unwrap();
            prop_assert_eq!(count.get(), committed[top]);

            session.undo().unwrap();
            prop_assert_eq!(count.get(), committed[top - 1]);
            session.redo().unwrap();
            prop_assert_eq!(count.get(), committed[top]);
        }
        prop_assert!(check_invariants(&session).is_empty());
    }

    /// List replacement lands on the target, generates exactly the
    /// positional diff, and undoes back to the original.
    #[test]
    fn prop_list_set_to_minimal_diff(
        current in prop::collection::vec(0u8..4, 0..8),
        target in prop::collection::vec(0u8..4, 0..8),
    ) {
        let mut session = Session::new();
        let list = ListState::new(&mut session.state, "list");
        for &item in &current {
            list.push(&mut session.state, item).unwrap();
        }
        session.close("seed").unwrap();

        list.set_to(&mut session.state, &target).unwrap();
        prop_assert_eq!(list.view(), target.clone());

        let shared = current.len().min(target.len());
        let mismatches = (0..shared).filter(|&i| current[i] != target[i]).count();
        let tail = current.len().abs_diff(target.len());
        let expected = 2 * mismatches + tail;
        prop_assert_eq!(session.state.stack().open_len(), expected);

        if session.close("replace").unwrap() {
            session.undo().unwrap();
            prop_assert_eq!(list.view(), current);
            session.redo().unwrap();
            prop_assert_eq!(list.view(), target);
        } else {
            // Identical sequences: a no-op close, nothing recorded.
            prop_assert_eq!(expected, 0);
        }
    }

    /// Set and map edits round-trip through bulk undo/redo.
    #[test]
    fn prop_collections_round_trip(
        ops in prop::collection::vec((0u8..3, 0u8..6, 0u8..6), 1..30),
    ) {
        let mut session = Session::new();
        let set = SetState::new(&mut session.state, "set");
        let map = MapState::new(&mut session.state, "map");

        for (op, key, value) in ops {
            match op {
                0 => {
                    set.insert(&mut session.state, key).unwrap();
                    map.put(&mut session.state, key, value).unwrap();
                }
                1 => {
                    set.remove(&mut session.state, &key).unwrap();
                    map.remove(&mut session.state, &key).unwrap();
                }
                _ => {
                    map.put(&mut session.state, key, value.wrapping_add(1)).unwrap();
                }
            }
            session.close("op").unwrap();
        }

        let final_set = set.view();
        let final_map = map.view();
        let top = session.state.stack().current_index();

        if top > 0 {
            session.undo_to(0).unwrap();
            prop_assert!(set.is_empty());
            prop_assert!(map.is_empty());
            session.redo_to(top).unwrap();
        }
        prop_assert_eq!(set.view(), final_set);
        prop_assert_eq!(map.view(), final_map);
    }

    /// Wallet totals are conserved across any transfer walk and its
    /// full undo.
    #[test]
    fn prop_wallet_conservation(
        mint in 1i64..10_000,
        hops in prop::collection::vec((0usize..3, 0usize..3, 0i64..500), 0..20),
    ) {
        let mut session = Session::new();
        let owners: Vec<Owner> = ["a", "b", "c"]
            .iter()
            .map(|name| session.create_owner(name).unwrap())
            .collect();
        let wallets: Vec<_> = owners
            .iter()
            .map(|owner| {
                session
                    .create_wallet::<Coin>(&format!("{}/coins", owner.name()), owner)
                    .unwrap()
            })
            .collect();
        let core = session.create_item(None, "gold").unwrap();
        let gold = Rc::new(Coin { core });
        let unknown = session.unknown_owner();

        session.transfer(&gold, &unknown, mint, &owners[0]).unwrap();
        session.close("mint").unwrap();

        for (from, to, amount) in hops {
            if from == to {
                continue;
            }
            session
                .transfer(&gold, &owners[from], amount, &owners[to])
                .unwrap();
            session.close("hop").unwrap();
            prop_assert_eq!(session.wallets.total(&gold), mint);
        }

        session.undo_to(0).unwrap();
        for wallet in &wallets {
            prop_assert_eq!(wallet.value(&gold), 0);
        }
        prop_assert_eq!(session.wallets.total(&gold), 0);
        prop_assert!(check_invariants(&session).is_empty());
    }
}

/// Model that renders nothing; only its graph position matters.
struct Silent;

impl Model for Silent {
    fn text(&self) -> String {
        String::new()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// For random acyclic graphs, the update list is a true
    /// topological order: every source precedes every dependent, with
    /// no duplicates.
    #[test]
    fn prop_dependency_resolution_is_topological(
        node_count in 2usize..10,
        raw_edges in prop::collection::vec((0usize..10, 0usize..10), 0..40),
    ) {
        let mut session = Session::new();
        let root = IntState::new(&mut session.state, "root", 0);
        let mut ids = vec![root.state_id()];
        for index in 1..node_count {
            let model = Rc::new(RefCell::new(Silent));
            ids.push(session.state.register_model(&format!("m{index}"), &model));
        }

        // Edges only point from lower to higher index, so the graph
        // is acyclic by construction.
        let mut edges = Vec::new();
        for (a, b) in raw_edges {
            if a < b && b < node_count {
                session.state.add_dependency(ids[a], ids[b]).unwrap();
                edges.push((a, b));
            }
        }

        let order = session.state.models_to_update(&[ids[0]]).unwrap();
        let position = |id| order.iter().position(|&o| o == id);

        let mut deduped = order.clone();
        deduped.sort_unstable();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), order.len());

        prop_assert_eq!(position(ids[0]), Some(0));
        for (a, b) in edges {
            if let (Some(pa), Some(pb)) = (position(ids[a]), position(ids[b])) {
                prop_assert!(pa < pb, "edge {}->{} out of order", a, b);
            }
        }
        prop_assert!(session.state.verify_acyclic().is_ok());
    }
}
