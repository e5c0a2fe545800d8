#![no_main]

//! Fuzz target for webhook signature verification.
//!
//! Splits the input into a signature header and a body. Verification of
//! arbitrary headers must fail cleanly, and a genuine signature appended to
//! arbitrary garbage entries must still verify.

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use usersync_api::crypto::{sign, verify, SignatureHeaders, WebhookSecret};

const NOW: i64 = 1_700_000_000;

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|b| *b == b'\n').unwrap_or(data.len());
    let (header, body) = data.split_at(split);
    let Ok(header) = std::str::from_utf8(header) else {
        return;
    };

    let secret = WebhookSecret::from_bytes(b"fuzz-signing-key".to_vec());
    let tolerance = Duration::from_secs(300);

    let fuzzed = SignatureHeaders { id: "msg_fuzz", timestamp: "1700000000", signature: header };
    let _ = verify(&secret, body, &fuzzed, NOW, tolerance);

    let _ = WebhookSecret::parse(header);

    let genuine = sign(&secret, "msg_fuzz", NOW, body).unwrap();
    let combined = format!("{header} v1,{genuine}");
    let headers = SignatureHeaders { id: "msg_fuzz", timestamp: "1700000000", signature: &combined };
    assert!(verify(&secret, body, &headers, NOW, tolerance).is_ok());
});
