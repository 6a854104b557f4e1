#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabula::{BoolState, IntState, ListState, Session, check_invariants};

/// One kernel operation against a small fixed state population.
#[derive(Arbitrary, Debug)]
enum Op {
    /// Set the boolean flag.
    SetFlag(bool),
    /// Set the counter.
    SetCount(i64),
    /// Add to the counter.
    AddCount(i64),
    /// Push onto the list (value capped in the driver).
    Push(u8),
    /// Remove a value from the list.
    Remove(u8),
    /// Move a value to an index.
    Move(u8, u8),
    /// Replace the list contents.
    SetTo(Vec<u8>),
    /// Close the open transaction.
    Close,
    /// Undo one set.
    Undo,
    /// Redo one set.
    Redo,
}

fuzz_target!(|ops: Vec<Op>| {
    // Cap the sequence to keep each case fast.
    let ops = &ops[..ops.len().min(64)];

    let mut session = Session::new();
    let flag = BoolState::new(&mut session.state, "flag", false);
    let count = IntState::new(&mut session.state, "count", 0);
    let list = ListState::new(&mut session.state, "list");

    for op in ops {
        // Precondition and sequencing errors are expected outcomes;
        // panics and invariant damage are the bugs.
        let _ = match op {
            Op::SetFlag(value) => flag.set(&mut session.state, *value),
            Op::SetCount(value) => count.set(&mut session.state, *value),
            Op::AddCount(delta) => count.add(&mut session.state, *delta),
            Op::Push(item) => list.push(&mut session.state, *item),
            Op::Remove(item) => list.remove(&mut session.state, item).map(|_| ()),
            Op::Move(item, index) => {
                list.move_item(&mut session.state, item, *index as usize)
            }
            Op::SetTo(target) => {
                let target = &target[..target.len().min(32)];
                list.set_to(&mut session.state, target)
            }
            Op::Close => session.close("fuzz").map(|_| ()),
            Op::Undo => session.undo(),
            Op::Redo => session.redo(),
        };
        assert!(check_invariants(&session).is_empty());
    }

    // Whatever happened, the full history must unwind cleanly.
    let _ = session.close("final");
    while session.undo().is_ok() {}
    assert!(!flag.get());
    assert_eq!(count.get(), 0);
    assert!(list.is_empty());
});
