use dns_wire::protocol::types::test_util::*;
use dns_wire::protocol::types::*;
use dns_wire::text::Error;

#[test]
fn roundtrip_record_presentation() {
    for _ in 0..100 {
        let original = arbitrary_resourcerecord();
        let line = original.to_zone_line();
        let reparsed = ResourceRecord::from_zone_line(&line, None)
            .unwrap_or_else(|e| panic!("failed to parse {line:?}: {e}"));

        assert_eq!(original, reparsed, "line: {line}");
    }
}

// presentation, wire, and back: the wire octets of a reparsed record
// equal the original's
#[test]
fn presentation_survives_wire_encoding() {
    for _ in 0..100 {
        let original = arbitrary_resourcerecord();
        let reparsed =
            ResourceRecord::from_zone_line(&original.to_zone_line(), None).unwrap();

        let mut original_octets = dns_wire::protocol::serialise::WritableBuffer::default();
        original.serialise(&mut original_octets).unwrap();
        let mut reparsed_octets = dns_wire::protocol::serialise::WritableBuffer::default();
        reparsed.serialise(&mut reparsed_octets).unwrap();

        assert_eq!(original_octets.octets, reparsed_octets.octets);
    }
}

// resolver scenario: the MX record presentation round-trip yields
// equal wire bytes
#[test]
fn mx_presentation_roundtrip_yields_equal_bytes() {
    let line = "example.com. 3600 IN MX 10 mail.example.com.";
    let rr = ResourceRecord::from_zone_line(line, None).unwrap();
    assert_eq!("example.com.\t3600\tIN\tMX\t10 mail.example.com.", rr.to_zone_line());

    let reparsed = ResourceRecord::from_zone_line(&rr.to_zone_line(), None).unwrap();

    let mut first = dns_wire::protocol::serialise::WritableBuffer::default();
    rr.serialise(&mut first).unwrap();
    let mut second = dns_wire::protocol::serialise::WritableBuffer::default();
    reparsed.serialise(&mut second).unwrap();

    assert_eq!(first.octets, second.octets);
}

#[test]
fn roundtrip_message_transcript() {
    for _ in 0..20 {
        let mut message = Message::make_query(7, question("example.com.", RecordType::A));
        message.header.is_response = true;
        message.header.recursion_desired = true;
        message.header.recursion_available = true;
        for _ in 0..3 {
            message.answers.push(arbitrary_resourcerecord());
        }
        for _ in 0..2 {
            message.authority.push(arbitrary_resourcerecord());
        }

        let transcript = message.to_transcript();
        let reparsed = Message::from_transcript(&transcript)
            .unwrap_or_else(|e| panic!("failed to parse transcript: {e}\n{transcript}"));

        assert_eq!(message, reparsed, "transcript:\n{transcript}");
    }
}

// resolver scenario: the literal root referral for ("com.", NS)
#[test]
fn root_referral_transcript() {
    let mut transcript = String::from(
        ";; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 23123\n\
         ;; flags: qr rd; QUERY: 1, ANSWER: 0, AUTHORITY: 13, ADDITIONAL: 0\n\
         \n\
         ;; QUESTION SECTION:\n\
         ;com.\t\t\tIN\tNS\n\
         \n\
         ;; AUTHORITY SECTION:\n",
    );
    for server in [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    ] {
        transcript.push_str(&format!(
            "com.\t\t172800\tIN\tNS\t{server}.gtld-servers.net.\n"
        ));
    }

    let message = Message::from_transcript(&transcript).unwrap();
    assert_eq!(13, message.authority.len());
    for (i, rr) in message.authority.iter().enumerate() {
        assert_eq!(domain("com."), rr.name);
        assert_eq!(172_800, rr.ttl);
        assert_eq!(RecordClass::IN, rr.rclass);
        let expected = format!("{}.gtld-servers.net.", (b'a' + i as u8) as char);
        assert_eq!(
            ns_record("com.", &expected).data,
            rr.data,
            "server {i}"
        );
    }

    // and it encodes to well-formed wire bytes which parse back
    let octets = message.to_octets().unwrap();
    let decoded = Message::from_octets(&octets).unwrap();
    assert_eq!(message, decoded.forget_provenance());
}

// resolver scenario: the literal negative answer for ("idontexist.", A)
#[test]
fn nxdomain_transcript() {
    let transcript = "\
;; ->>HEADER<<- opcode: QUERY, status: NXDOMAIN, id: 20912\n\
;; flags: qr aa; QUERY: 1, ANSWER: 0, AUTHORITY: 2, ADDITIONAL: 0\n\
\n\
;; QUESTION SECTION:\n\
;idontexist.\t\t\tIN\tA\n\
\n\
;; AUTHORITY SECTION:\n\
.\t86400\tIN\tSOA\ta.root-servers.net. nstld.verisign-grs.com. 2018080200 1800 900 604800 86400\n\
id.\t86400\tIN\tNSEC\tie. NS DS RRSIG NSEC\n";

    let message = Message::from_transcript(transcript).unwrap();
    assert_eq!(Rcode::NameError, message.header.rcode);
    assert!(message.answers.is_empty());
    assert_eq!(2, message.authority.len());

    assert_eq!(
        soa_record(
            ".",
            "a.root-servers.net.",
            "nstld.verisign-grs.com.",
            2_018_080_200,
            1800,
            900,
            604_800,
            86400,
        )
        .data,
        message.authority[0].data
    );

    let nsec_line = message.authority[1].to_zone_line();
    assert_eq!("id.\t86400\tIN\tNSEC\tie. NS DS RRSIG NSEC", nsec_line);
}

#[test]
fn zone_line_rejects_garbage() {
    assert!(matches!(
        ResourceRecord::from_zone_line("example.com. 300 IN", None),
        Err(Error::MissingType)
    ));
    assert!(ResourceRecord::from_zone_line("example.com. 300 IN A not-an-ip", None).is_err());
    assert!(ResourceRecord::from_zone_line("300 IN A 192.0.2.1", None).is_err());
}
