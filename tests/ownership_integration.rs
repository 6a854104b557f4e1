//! Integration tests for the ownership subsystem.
//!
//! Exercises portfolio moves, wallet transfers, the unknown-owner
//! sentinel, and the registry invariants on top of the change log.
//!
//! Run with: cargo test --test ownership_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use tabula::{
    Countable, GenericState, Item, ItemCore, Ownable, Owner, Session, StateError,
    check_invariants, new_owner_cell,
};

/// A train certificate: the classic ownable.
#[derive(Debug)]
struct Train {
    core: ItemCore,
    owner: GenericState<Owner>,
}

impl Item for Train {
    fn core(&self) -> &ItemCore {
        &self.core
    }
}

impl Ownable for Train {
    fn owner_cell(&self) -> &GenericState<Owner> {
        &self.owner
    }
}

fn train(session: &mut Session, id: &str) -> Rc<Train> {
    let core = session.create_item(None, id).unwrap();
    let owner = new_owner_cell(&mut session.state, &core);
    Rc::new(Train { core, owner })
}

/// A currency unit: the classic countable.
#[derive(Debug)]
struct Cash {
    core: ItemCore,
}

impl Item for Cash {
    fn core(&self) -> &ItemCore {
        &self.core
    }
}

impl Countable for Cash {}

fn cash(session: &mut Session, id: &str) -> Rc<Cash> {
    let core = session.create_item(None, id).unwrap();
    Rc::new(Cash { core })
}

#[test]
fn test_scenario_portfolio_move_and_undo() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    let bob = session.create_owner("bob").unwrap();
    let alice_trains = session.create_portfolio::<Train>("alice/trains", &alice).unwrap();
    let bob_trains = session.create_portfolio::<Train>("bob/trains", &bob).unwrap();

    let item = train(&mut session, "2-train");
    assert!(item.owner().is_unknown());

    session.move_ownable(&item, &alice).unwrap();
    session.close("deal to alice").unwrap();
    assert!(alice_trains.contains(&item));
    assert_eq!(item.owner(), alice);

    session.move_ownable(&item, &bob).unwrap();
    session.close("sell to bob").unwrap();
    assert!(bob_trains.contains(&item));
    assert!(!alice_trains.contains(&item));
    assert_eq!(item.owner(), bob);
    assert!(check_invariants(&session).is_empty());

    session.undo().unwrap();
    assert!(alice_trains.contains(&item));
    assert!(!bob_trains.contains(&item));
    assert_eq!(item.owner(), alice);
    assert!(check_invariants(&session).is_empty());

    session.redo().unwrap();
    assert!(bob_trains.contains(&item));
    assert_eq!(item.owner(), bob);
}

#[test]
fn test_move_preconditions() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    session.create_portfolio::<Train>("alice/trains", &alice).unwrap();
    let item = train(&mut session, "2-train");

    session.move_ownable(&item, &alice).unwrap();
    session.close("deal").unwrap();

    // Moving to the current owner is an error, not a no-op close.
    let err = session.move_ownable(&item, &alice).unwrap_err();
    assert_eq!(err, StateError::AlreadyOwned("alice".to_owned()));

    // Destination without a registered portfolio fails before any
    // mutation.
    let carol = session.create_owner("carol").unwrap();
    let err = session.move_ownable(&item, &carol).unwrap_err();
    assert!(matches!(err, StateError::PortfolioNotFound { .. }));
    assert_eq!(item.owner(), alice);
    assert!(session.state.stack().is_open_empty());
}

#[test]
fn test_ownership_exclusivity_across_owners() {
    let mut session = Session::new();
    let owners: Vec<Owner> = ["a", "b", "c"]
        .iter()
        .map(|name| session.create_owner(name).unwrap())
        .collect();
    for owner in &owners {
        session
            .create_portfolio::<Train>(&format!("{}/trains", owner.name()), owner)
            .unwrap();
    }
    let item = train(&mut session, "2-train");

    for owner in &owners {
        session.move_ownable(&item, owner).unwrap();
        session.close(format!("to {}", owner.name())).unwrap();
        assert_eq!(session.portfolios.holders(&item), vec![owner.clone()]);
        assert!(check_invariants(&session).is_empty());
    }

    session.undo_to(1).unwrap();
    assert_eq!(session.portfolios.holders(&item), vec![owners[0].clone()]);
}

#[test]
fn test_duplicate_portfolio_registration_rejected() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    session.create_portfolio::<Train>("alice/trains", &alice).unwrap();

    let err = session
        .create_portfolio::<Train>("alice/trains-again", &alice)
        .unwrap_err();
    assert!(matches!(err, StateError::DuplicatePortfolio { .. }));

    // A different item type under the same owner is a distinct key.
    session.create_portfolio::<OtherCard>("alice/cards", &alice).unwrap();
}

/// Second ownable type, to prove keys are per (type, owner).
#[derive(Debug)]
struct OtherCard {
    core: ItemCore,
    owner: GenericState<Owner>,
}

impl Item for OtherCard {
    fn core(&self) -> &ItemCore {
        &self.core
    }
}

impl Ownable for OtherCard {
    fn owner_cell(&self) -> &GenericState<Owner> {
        &self.owner
    }
}

#[test]
fn test_scenario_wallet_transfer_and_undo() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    let bob = session.create_owner("bob").unwrap();
    let alice_wallet = session.create_wallet::<Cash>("alice/cash", &alice).unwrap();
    let bob_wallet = session.create_wallet::<Cash>("bob/cash", &bob).unwrap();
    let gold = cash(&mut session, "gold");

    assert_eq!(alice_wallet.value(&gold), 0);
    assert_eq!(bob_wallet.value(&gold), 0);

    session.transfer(&gold, &alice, 10, &bob).unwrap();
    session.close("pay bob").unwrap();
    assert_eq!(alice_wallet.value(&gold), -10);
    assert_eq!(bob_wallet.value(&gold), 10);
    assert_eq!(session.wallets.total(&gold), 0);

    session.undo().unwrap();
    assert_eq!(alice_wallet.value(&gold), 0);
    assert_eq!(bob_wallet.value(&gold), 0);
    assert_eq!(session.wallets.total(&gold), 0);
}

#[test]
fn test_transfer_preconditions() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    let bob = session.create_owner("bob").unwrap();
    session.create_wallet::<Cash>("alice/cash", &alice).unwrap();
    let gold = cash(&mut session, "gold");

    let err = session.transfer(&gold, &alice, 5, &alice).unwrap_err();
    assert_eq!(err, StateError::SelfTransfer("alice".to_owned()));

    let err = session.transfer(&gold, &alice, -5, &bob).unwrap_err();
    assert_eq!(err, StateError::NegativeAmount(-5));

    // Destination wallet missing: nothing mutated.
    let err = session.transfer(&gold, &alice, 5, &bob).unwrap_err();
    assert!(matches!(err, StateError::WalletNotFound { .. }));
    assert!(session.state.stack().is_open_empty());
}

#[test]
fn test_transfer_from_unknown_mints() {
    let mut session = Session::new();
    let bank = session.create_owner("bank").unwrap();
    let wallet = session.create_wallet::<Cash>("bank/cash", &bank).unwrap();
    let gold = cash(&mut session, "gold");
    let unknown = session.unknown_owner();

    // No source wallet required when drawing from the sentinel.
    session.transfer(&gold, &unknown, 1000, &bank).unwrap();
    session.close("seed the bank").unwrap();
    assert_eq!(wallet.value(&gold), 1000);

    session.undo().unwrap();
    assert_eq!(wallet.value(&gold), 0);
}

#[test]
fn test_zero_transfer_records_nothing() {
    let mut session = Session::new();
    let alice = session.create_owner("alice").unwrap();
    let bob = session.create_owner("bob").unwrap();
    session.create_wallet::<Cash>("alice/cash", &alice).unwrap();
    session.create_wallet::<Cash>("bob/cash", &bob).unwrap();
    let gold = cash(&mut session, "gold");

    session.transfer(&gold, &alice, 0, &bob).unwrap();
    assert!(session.state.stack().is_open_empty());
    assert!(!session.close("nothing").unwrap());
}

#[test]
fn test_wallet_conservation_over_random_walk() {
    let mut session = Session::new();
    let owners: Vec<Owner> = ["a", "b", "c"]
        .iter()
        .map(|name| session.create_owner(name).unwrap())
        .collect();
    for owner in &owners {
        session
            .create_wallet::<Cash>(&format!("{}/cash", owner.name()), owner)
            .unwrap();
    }
    let gold = cash(&mut session, "gold");
    let unknown = session.unknown_owner();

    session.transfer(&gold, &unknown, 300, &owners[0]).unwrap();
    session.close("mint").unwrap();
    assert_eq!(session.wallets.total(&gold), 300);

    let hops = [(0usize, 1usize, 40), (1, 2, 25), (2, 0, 5), (0, 2, 60)];
    for (index, &(from, to, amount)) in hops.iter().enumerate() {
        session
            .transfer(&gold, &owners[from], amount, &owners[to])
            .unwrap();
        session.close(format!("hop {index}")).unwrap();
        assert_eq!(session.wallets.total(&gold), 300);
    }

    session.undo_to(1).unwrap();
    assert_eq!(session.wallets.total(&gold), 300);
    let wallet = session.wallets.get::<Cash>(&owners[0]).unwrap();
    assert_eq!(wallet.value(&gold), 300);
}
