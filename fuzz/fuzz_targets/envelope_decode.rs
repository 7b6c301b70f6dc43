//! Fuzz target for socket envelope decoding
//!
//! Arbitrary text frames fed to both decoders. Decoding should NEVER panic;
//! garbage yields an error and unknown event names decode as `Unknown`.
//!
//! # Invariants
//!
//! - A decoded `receive_message` carries non-empty ids
//! - Anything that decodes re-encodes

#![no_main]

use cuechat_proto::{ClientCommand, ServerEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(event) = ServerEvent::decode(text) {
        if let ServerEvent::ReceiveMessage(message) = &event {
            assert!(!message.id.as_str().is_empty());
            assert!(!message.conversation_id.as_str().is_empty());
            assert!(!message.sender.as_str().is_empty());
        }
        event.encode().expect("decoded event must re-encode");
    }

    if let Ok(command) = ClientCommand::decode(text) {
        command.encode().expect("decoded command must re-encode");
    }
});
