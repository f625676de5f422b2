#![no_main]
use libfuzzer_sys::fuzz_target;

use dns_wire::protocol::types::ResourceRecord;

fuzz_target!(|rr: ResourceRecord| {
    let line = rr.to_zone_line();
    let reparsed = ResourceRecord::from_zone_line(&line, None).unwrap();
    assert_eq!(rr, reparsed);
});
