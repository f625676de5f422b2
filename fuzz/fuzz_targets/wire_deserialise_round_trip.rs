#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_wire::protocol::types::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = Message::from_octets(data) {
        let message = message.forget_provenance();
        let serialised = message.to_octets().unwrap();
        let deserialised = Message::from_octets(&serialised).unwrap();
        assert_eq!(message, deserialised.forget_provenance());
    }
});
