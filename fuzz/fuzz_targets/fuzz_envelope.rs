#![no_main]

use duel_session_client::protocol::{Envelope, RoundData};
use duel_session_client::Pick;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<Envelope>(data);

    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(envelope) = Envelope::decode(s) else {
        return;
    };
    if let Some(payload) = envelope.data {
        let _ = RoundData::<Vec<i64>>::from_value(payload.clone());
        let _ = RoundData::<Pick>::from_value(payload);
    }
});
