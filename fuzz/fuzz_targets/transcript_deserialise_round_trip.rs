#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_wire::protocol::types::Message;

fuzz_target!(|data: &str| {
    if let Ok(message) = Message::from_transcript(data) {
        let transcript = message.to_transcript();
        let reparsed = Message::from_transcript(&transcript).unwrap();
        assert_eq!(message, reparsed);
    }
});
