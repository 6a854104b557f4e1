#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabula::{ListState, Session};

/// Current and target contents for a list replacement.
#[derive(Arbitrary, Debug)]
struct DiffInput {
    /// Starting contents.
    current: Vec<u8>,
    /// Replacement contents.
    target: Vec<u8>,
}

fuzz_target!(|input: DiffInput| {
    let current = &input.current[..input.current.len().min(64)];
    let target = &input.target[..input.target.len().min(64)];

    let mut session = Session::new();
    let list = ListState::new(&mut session.state, "list");
    for &item in current {
        list.push(&mut session.state, item).unwrap();
    }
    session.close("seed").unwrap();

    list.set_to(&mut session.state, target).unwrap();
    assert_eq!(list.view(), target);

    // Shared positions generate no changes; everything else is one
    // remove/insert pair per mismatch plus the tail.
    let shared = current.len().min(target.len());
    let mismatches = (0..shared).filter(|&i| current[i] != target[i]).count();
    let tail = current.len().abs_diff(target.len());
    assert_eq!(session.state.stack().open_len(), 2 * mismatches + tail);

    if session.close("replace").unwrap() {
        session.undo().unwrap();
        assert_eq!(list.view(), current);
        session.redo().unwrap();
        assert_eq!(list.view(), target);
    }
});
