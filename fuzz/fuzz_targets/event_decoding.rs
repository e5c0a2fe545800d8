#![no_main]

//! Fuzz target for lifecycle event decoding.
//!
//! Arbitrary bodies must decode to an event or a decode error, never panic,
//! and every decoded create or update must carry a non-empty id.

use libfuzzer_sys::fuzz_target;
use usersync_core::{ErrorKind, UserEvent};

fuzz_target!(|data: &[u8]| {
    match UserEvent::from_slice(data) {
        Ok(event) => {
            if let Some(id) = event.user_id() {
                assert!(!id.as_str().is_empty());
            }
            let _ = event.event_type();
        },
        Err(e) => assert_eq!(e.kind(), ErrorKind::Decode),
    }
});
