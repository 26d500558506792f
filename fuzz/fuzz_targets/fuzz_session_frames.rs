#![no_main]

use duel_session_client::{NumberGuesser, RockPaperScissors, SessionStore};
use libfuzzer_sys::fuzz_target;

// Each input line is one inbound frame. A rejected frame must never alter
// the snapshot, whatever came before it.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let guesser = SessionStore::<NumberGuesser>::new();
    let rps = SessionStore::<RockPaperScissors>::new();
    guesser.on_open();
    rps.on_open();

    for line in s.lines() {
        let before = guesser.snapshot();
        if guesser.on_frame(line).is_err() {
            assert_eq!(guesser.snapshot(), before);
        }
        let before = rps.snapshot();
        if rps.on_frame(line).is_err() {
            assert_eq!(rps.snapshot(), before);
        }
        assert!(guesser.is_connected() && rps.is_connected());
    }
});
