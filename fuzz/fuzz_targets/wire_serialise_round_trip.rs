#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_wire::protocol::deserialise::ConsumableBuffer;
use dns_wire::protocol::serialise::WritableBuffer;
use dns_wire::protocol::types::ResourceRecord;

fuzz_target!(|rr: ResourceRecord| {
    let mut buffer = WritableBuffer::default();
    rr.serialise(&mut buffer).unwrap();
    let deserialised = ResourceRecord::deserialise(0, &mut ConsumableBuffer::new(&buffer.octets));
    assert_eq!(Ok(rr), deserialised);
});
