//! Seeding a zone index from a zone file.
//!
//! This implementation supports `$ORIGIN` and `$TTL` entries and the
//! usual record-line forms, with carried-over names and TTLs.
//! `$INCLUDE` entries raise an error.

use crate::protocol::types::DomainName;
use crate::text::deserialise::{parse_domain, parse_rr_tokens};
use crate::text::{tokenise_entry, Error};
use crate::zones::types::ZoneIndex;

impl ZoneIndex {
    /// Parse a string of zone data into an index.
    ///
    /// # Errors
    ///
    /// If the string cannot be parsed.
    pub fn from_zone_file(data: &str) -> Result<Self, Error> {
        let mut index = ZoneIndex::new();
        let mut origin: Option<DomainName> = None;
        let mut default_ttl = None;
        let mut previous_name = None;
        let mut previous_ttl = None;

        let mut stream = data.chars().peekable();
        loop {
            let tokens = tokenise_entry(&mut stream)?;
            if tokens.is_empty() {
                if stream.peek().is_none() {
                    break;
                }
                continue;
            }

            match tokens[0].text.as_str() {
                "$ORIGIN" => {
                    if tokens.len() != 2 {
                        return Err(Error::Unexpected {
                            expected: "$ORIGIN <domain-name>".to_string(),
                            found: tokens.len().to_string(),
                        });
                    }
                    origin = Some(parse_domain(origin.as_ref(), &tokens[1].text)?);
                }
                "$TTL" => {
                    if tokens.len() != 2 {
                        return Err(Error::Unexpected {
                            expected: "$TTL <ttl>".to_string(),
                            found: tokens.len().to_string(),
                        });
                    }
                    default_ttl =
                        Some(tokens[1].text.parse().map_err(|_| Error::ExpectedU32 {
                            digits: tokens[1].text.clone(),
                        })?);
                }
                "$INCLUDE" => return Err(Error::IncludeNotSupported),
                _ => {
                    let rr = parse_rr_tokens(
                        origin.as_ref(),
                        &previous_name,
                        previous_ttl.or(default_ttl),
                        &tokens,
                    )?;
                    previous_name = Some(rr.name.clone());
                    previous_ttl = Some(rr.ttl);
                    index.insert(&rr);
                }
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::rdata::RecordData;
    use crate::protocol::types::test_util::*;
    use crate::protocol::types::RecordType;
    use std::net::Ipv4Addr;

    #[test]
    fn parses_a_small_zone() {
        let index = ZoneIndex::from_zone_file(
            "$ORIGIN example.com.\n\
             $TTL 3600\n\
             @ IN SOA ns1 admin 2024010101 7200 900 1209600 300\n\
             @ IN NS ns1\n\
             ns1 IN A 192.0.2.53\n\
             www 300 IN A 192.0.2.80\n\
             \tIN AAAA 2001:db8::80 ; same owner as the previous line\n",
        )
        .unwrap();

        assert_eq!(5, index.len());

        let soa = index
            .lookup(&domain("example.com."), RecordType::SOA)
            .unwrap();
        assert!(matches!(soa[0].data, RecordData::Soa { serial: 2_024_010_101, .. }));
        assert_eq!(3600, soa[0].ttl);

        let ns = index.lookup(&domain("example.com."), RecordType::NS).unwrap();
        assert_eq!(
            RecordData::Name {
                tag: RecordType::NS,
                name: domain("ns1.example.com."),
            },
            ns[0].data
        );

        let www_a = index.lookup(&domain("www.example.com."), RecordType::A).unwrap();
        assert_eq!(300, www_a[0].ttl);
        assert_eq!(
            RecordData::A {
                address: Ipv4Addr::new(192, 0, 2, 80)
            },
            www_a[0].data
        );

        // the AAAA on the continuation line inherits www's name
        assert!(index
            .lookup(&domain("www.example.com."), RecordType::AAAA)
            .is_some());
    }

    #[test]
    fn include_is_an_error() {
        assert_eq!(
            Err(Error::IncludeNotSupported),
            ZoneIndex::from_zone_file("$INCLUDE other.zone\n")
        );
    }

    #[test]
    fn roundtrips_through_zone_lines() {
        let mut index = ZoneIndex::new();
        index.insert(&a_record("example.com.", Ipv4Addr::new(192, 0, 2, 1)));
        index.insert(&mx_record("example.com.", 10, "mail.example.com."));
        index.insert(&ns_record("example.com.", "ns1.example.com."));

        let mut zone_file = String::new();
        for rr in index.iter() {
            zone_file.push_str(&rr.to_zone_line());
            zone_file.push('\n');
        }

        let reparsed = ZoneIndex::from_zone_file(&zone_file).unwrap();
        assert_eq!(index.len(), reparsed.len());
    }
}
