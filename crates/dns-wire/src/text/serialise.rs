//! Presentation-format output: single records as master-file lines,
//! whole messages as `dig`-style transcripts.

use crate::protocol::rdata::{opaque_format, Gateway, OpaqueFormat, RecordData};
use crate::protocol::types::*;
use crate::text::{sig_time_to_string, to_base32hex, to_base64, to_hex, unix_now};

impl ResourceRecord {
    /// The one-line presentation form:
    /// `<name> <ttl> <class> <type> <rdata>`.
    pub fn to_zone_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.name.to_dotted_string(),
            self.ttl,
            self.rclass,
            self.rtype(),
            self.data.to_presentation_string(),
        )
    }
}

impl RecordData {
    /// The rdata part of the presentation form.  Unknown types use
    /// the RFC 3597 generic `\# <length> <hex>` syntax.
    pub fn to_presentation_string(&self) -> String {
        match self {
            RecordData::A { address } => address.to_string(),
            RecordData::Aaaa { address } => address.to_string(),
            RecordData::Name { name, .. } => name.to_dotted_string(),
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => format!(
                "{} {} {serial} {refresh} {retry} {expire} {minimum}",
                mname.to_dotted_string(),
                rname.to_dotted_string(),
            ),
            RecordData::NamePair { first, second, .. } => {
                format!("{} {}", first.to_dotted_string(), second.to_dotted_string())
            }
            RecordData::Exchange {
                preference,
                exchange,
                ..
            } => format!("{preference} {}", exchange.to_dotted_string()),
            RecordData::Strings { strings, .. } => strings
                .iter()
                .map(|s| quote_character_string(s))
                .collect::<Vec<_>>()
                .join(" "),
            RecordData::Wks {
                address,
                protocol,
                bitmap,
            } => {
                let mut out = format!("{address} {protocol}");
                for (octet, byte) in bitmap.iter().enumerate() {
                    for bit in 0..8 {
                        if byte & (0b1000_0000 >> bit) != 0 {
                            out.push_str(&format!(" {}", octet * 8 + bit));
                        }
                    }
                }
                out
            }
            RecordData::Opaque { tag, octets } => match opaque_format(*tag) {
                OpaqueFormat::Hex => to_hex(octets),
                OpaqueFormat::PrefixedHex => format!("0x{}", to_hex(octets)),
                OpaqueFormat::Base64 => to_base64(octets),
            },
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {}", target.to_dotted_string()),
            RecordData::Naptr {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => format!(
                "{order} {preference} {} {} {} {}",
                quote_character_string(flags),
                quote_character_string(services),
                quote_character_string(regexp),
                replacement.to_dotted_string(),
            ),
            RecordData::Px {
                preference,
                map822,
                mapx400,
            } => format!(
                "{preference} {} {}",
                map822.to_dotted_string(),
                mapx400.to_dotted_string(),
            ),
            RecordData::Loc {
                size,
                horizontal_precision,
                vertical_precision,
                latitude,
                longitude,
                altitude,
                ..
            } => format!(
                "{} {} {} {} {} {}",
                present_loc_angle(*latitude, 'N', 'S'),
                present_loc_angle(*longitude, 'E', 'W'),
                present_loc_altitude(*altitude),
                present_loc_size(*size),
                present_loc_size(*horizontal_precision),
                present_loc_size(*vertical_precision),
            ),
            RecordData::Sig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer,
                signature,
                ..
            } => {
                let now = unix_now();
                format!(
                    "{type_covered} {algorithm} {labels} {original_ttl} {} {} {key_tag} {} {}",
                    sig_time_to_string(*expiration, now),
                    sig_time_to_string(*inception, now),
                    signer.to_dotted_string(),
                    to_base64(signature),
                )
            }
            RecordData::Key {
                flags,
                protocol,
                algorithm,
                public_key,
                ..
            } => format!("{flags} {protocol} {algorithm} {}", to_base64(public_key)),
            RecordData::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
                ..
            } => format!("{key_tag} {algorithm} {digest_type} {}", to_hex(digest)),
            RecordData::Nxt { next, bitmap } => {
                let mut out = next.to_dotted_string();
                for (octet, byte) in bitmap.iter().enumerate() {
                    for bit in 0..8 {
                        if byte & (0b1000_0000 >> bit) != 0 {
                            let rtype = RecordType::from((octet * 8 + bit) as u16);
                            out.push_str(&format!(" {rtype}"));
                        }
                    }
                }
                out
            }
            RecordData::Nsec { next, types } => {
                let mut out = next.to_dotted_string();
                for rtype in types.types() {
                    out.push_str(&format!(" {rtype}"));
                }
                out
            }
            RecordData::Nsec3 {
                hash_algorithm,
                flags,
                iterations,
                salt,
                next_hashed,
                types,
            } => {
                let mut out = format!(
                    "{hash_algorithm} {flags} {iterations} {} {}",
                    present_salt(salt),
                    to_base32hex(next_hashed),
                );
                for rtype in types.types() {
                    out.push_str(&format!(" {rtype}"));
                }
                out
            }
            RecordData::Nsec3Param {
                hash_algorithm,
                flags,
                iterations,
                salt,
            } => format!("{hash_algorithm} {flags} {iterations} {}", present_salt(salt)),
            RecordData::Cert {
                cert_type,
                key_tag,
                algorithm,
                certificate,
            } => format!(
                "{cert_type} {key_tag} {algorithm} {}",
                to_base64(certificate)
            ),
            RecordData::Sshfp {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => format!("{algorithm} {fingerprint_type} {}", to_hex(fingerprint)),
            RecordData::Tlsa {
                usage,
                selector,
                matching_type,
                certificate_data,
                ..
            } => format!(
                "{usage} {selector} {matching_type} {}",
                to_hex(certificate_data)
            ),
            RecordData::Ipseckey {
                precedence,
                algorithm,
                gateway,
                public_key,
            } => {
                let gateway_str = match gateway {
                    Gateway::None => ".".to_string(),
                    Gateway::Ipv4(address) => address.to_string(),
                    Gateway::Ipv6(address) => address.to_string(),
                    Gateway::Name(name) => name.to_dotted_string(),
                };
                format!(
                    "{precedence} {} {algorithm} {gateway_str} {}",
                    gateway.gateway_type(),
                    to_base64(public_key),
                )
            }
            RecordData::Hip {
                algorithm,
                hit,
                public_key,
                servers,
            } => {
                let mut out = format!("{algorithm} {} {}", to_hex(hit), to_base64(public_key));
                for server in servers {
                    out.push_str(&format!(" {}", server.to_dotted_string()));
                }
                out
            }
            RecordData::Csync {
                serial,
                flags,
                types,
            } => {
                let mut out = format!("{serial} {flags}");
                for rtype in types.types() {
                    out.push_str(&format!(" {rtype}"));
                }
                out
            }
            RecordData::Caa {
                flags,
                tag_string,
                value,
            } => {
                let tag: String = tag_string.iter().map(|b| *b as char).collect();
                format!("{flags} {tag} {}", quote_character_string(value))
            }
            RecordData::Uri {
                priority,
                weight,
                target,
            } => format!("{priority} {weight} {}", quote_character_string(target)),
            RecordData::Nid {
                preference,
                node_id,
            } => format!("{preference} {}", present_u64_groups(*node_id)),
            RecordData::L32 {
                preference,
                locator,
            } => format!("{preference} {locator}"),
            RecordData::L64 {
                preference,
                locator,
            } => format!("{preference} {}", present_u64_groups(*locator)),
            RecordData::Lp { preference, fqdn } => {
                format!("{preference} {}", fqdn.to_dotted_string())
            }
            RecordData::Eui48 { address } => address
                .iter()
                .map(|octet| format!("{octet:02x}"))
                .collect::<Vec<_>>()
                .join("-"),
            RecordData::Eui64 { address } => address
                .iter()
                .map(|octet| format!("{octet:02x}"))
                .collect::<Vec<_>>()
                .join("-"),
            RecordData::A6 {
                prefix_length,
                suffix,
                prefix_name,
            } => match prefix_name {
                Some(name) => {
                    format!("{prefix_length} {suffix} {}", name.to_dotted_string())
                }
                None => format!("{prefix_length} {suffix}"),
            },
            RecordData::Apl { items } => items
                .iter()
                .map(|item| {
                    let negation = if item.negate { "!" } else { "" };
                    let mut address = item.address.clone();
                    match item.family {
                        1 => {
                            address.resize(4, 0);
                            let octets: [u8; 4] = address.try_into().unwrap();
                            format!(
                                "{negation}1:{}/{}",
                                std::net::Ipv4Addr::from(octets),
                                item.prefix
                            )
                        }
                        2 => {
                            address.resize(16, 0);
                            let octets: [u8; 16] = address.try_into().unwrap();
                            format!(
                                "{negation}2:{}/{}",
                                std::net::Ipv6Addr::from(octets),
                                item.prefix
                            )
                        }
                        family => format!(
                            "{negation}{family}:0x{}/{}",
                            to_hex(&item.address),
                            item.prefix
                        ),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            RecordData::Tsig {
                algorithm,
                time_signed,
                fudge,
                mac,
                original_id,
                error,
                other,
            } => format!(
                "{} {time_signed} {fudge} {} {original_id} {} {}",
                algorithm.to_dotted_string(),
                optional_base64(mac),
                Rcode::from(*error),
                optional_base64(other),
            ),
            RecordData::Tkey {
                algorithm,
                inception,
                expiration,
                mode,
                error,
                key,
                other,
            } => format!(
                "{} {inception} {expiration} {mode} {} {} {}",
                algorithm.to_dotted_string(),
                Rcode::from(*error),
                optional_base64(key),
                optional_base64(other),
            ),
            RecordData::Doa {
                enterprise,
                doa_type,
                location,
                media_type,
                data,
            } => format!(
                "{enterprise} {doa_type} {location} {} {}",
                quote_character_string(media_type),
                optional_base64(data),
            ),
            RecordData::Opt { .. } | RecordData::Unknown { .. } => {
                // no presentation form is defined, so use the generic
                // syntax, which loses nothing
                let mut octets = Vec::new();
                if let RecordData::Unknown { octets: raw, .. } = self {
                    octets.clone_from(raw);
                } else if let RecordData::Opt { options } = self {
                    for option in options {
                        option.to_octets(&mut octets);
                    }
                }
                if octets.is_empty() {
                    "\\# 0".to_string()
                } else {
                    format!("\\# {} {}", octets.len(), to_hex(&octets))
                }
            }
        }
    }
}

/// Quote a character-string: `"` delimiters, with `"` and `\`
/// backslash-escaped and non-printable octets as `\DDD`.
pub(crate) fn quote_character_string(octets: &[u8]) -> String {
    let mut out = String::with_capacity(octets.len() + 2);
    out.push('"');
    for octet in octets {
        if *octet == b'"' || *octet == b'\\' {
            out.push('\\');
            out.push(*octet as char);
        } else if (0x20..=0x7E).contains(octet) {
            out.push(*octet as char);
        } else {
            out.push('\\');
            out.push(char::from(b'0' + (octet / 100)));
            out.push(char::from(b'0' + ((octet / 10) % 10)));
            out.push(char::from(b'0' + (octet % 10)));
        }
    }
    out.push('"');
    out
}

/// Base64 data which may be empty: `-` stands in for nothing, since
/// an empty token would disappear during tokenisation.
fn optional_base64(octets: &[u8]) -> String {
    if octets.is_empty() {
        "-".to_string()
    } else {
        to_base64(octets)
    }
}

/// An NSEC3 salt: hex, or `-` when empty.
fn present_salt(salt: &[u8]) -> String {
    if salt.is_empty() {
        "-".to_string()
    } else {
        to_hex(salt)
    }
}

/// A LOC latitude or longitude: `<deg> <min> <sec>.<msec> <hemi>`,
/// from thousandths of a second of arc offset from 2^31.
fn present_loc_angle(value: u32, positive: char, negative: char) -> String {
    let (magnitude, hemisphere) = if value >= 1 << 31 {
        (u64::from(value) - (1 << 31), positive)
    } else {
        ((1 << 31) - u64::from(value), negative)
    };

    let thousandths = magnitude % 1000;
    let total_seconds = magnitude / 1000;
    format!(
        "{} {} {}.{:03} {hemisphere}",
        total_seconds / 3600,
        (total_seconds / 60) % 60,
        total_seconds % 60,
        thousandths,
    )
}

/// A LOC altitude: metres above the reference point 100km below the
/// WGS 84 spheroid, printed with centimetre precision.
fn present_loc_altitude(value: u32) -> String {
    let centimetres = i64::from(value) - 10_000_000;
    let sign = if centimetres < 0 { "-" } else { "" };
    let magnitude = centimetres.abs();
    format!("{sign}{}.{:02}m", magnitude / 100, magnitude % 100)
}

/// A LOC size or precision: exponent-mantissa centimetres, printed in
/// metres.
fn present_loc_size(value: u8) -> String {
    let mantissa = u64::from(value >> 4);
    let exponent = u32::from(value & 0x0F);
    let centimetres = mantissa * 10u64.pow(exponent.min(17));
    format!("{}.{:02}m", centimetres / 100, centimetres % 100)
}

/// ILNP 64-bit values: four colon-separated groups of four hex
/// digits, like the interface-identifier half of an IPv6 address.
fn present_u64_groups(value: u64) -> String {
    let octets = value.to_be_bytes();
    format!(
        "{:02x}{:02x}:{:02x}{:02x}:{:02x}{:02x}:{:02x}{:02x}",
        octets[0], octets[1], octets[2], octets[3], octets[4], octets[5], octets[6], octets[7],
    )
}

impl Message {
    /// Render the message as a `dig`-style transcript.
    pub fn to_transcript(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            ";; ->>HEADER<<- opcode: {}, status: {}, id: {}\n",
            self.header.opcode, self.header.rcode, self.header.id,
        ));

        let mut flags = Vec::new();
        for (set, name) in [
            (self.header.is_response, "qr"),
            (self.header.is_authoritative, "aa"),
            (self.header.is_truncated, "tc"),
            (self.header.recursion_desired, "rd"),
            (self.header.recursion_available, "ra"),
            (self.header.z, "z"),
            (self.header.authentic_data, "ad"),
            (self.header.checking_disabled, "cd"),
        ] {
            if set {
                flags.push(name);
            }
        }

        let arcount = self.additional.len()
            + usize::from(self.edns.is_some())
            + usize::from(self.sig0.is_some())
            + usize::from(self.tsig.is_some());
        out.push_str(&format!(
            ";; flags: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}\n",
            flags.join(" "),
            self.questions.len(),
            self.answers.len(),
            self.authority.len(),
            arcount,
        ));

        if let Some(edns) = &self.edns {
            out.push_str("\n;; OPT PSEUDOSECTION:\n");
            out.push_str(&format!(
                "; EDNS: version: {}, flags:{}; udp: {}\n",
                edns.version,
                if edns.dnssec_ok() { " do" } else { "" },
                edns.udp_payload_size,
            ));
            for option in &edns.options {
                let mut octets = Vec::new();
                option.to_octets(&mut octets);
                // skip the code and length prefix: the code is given
                // in a parseable form instead
                out.push_str(&format!(
                    "; OPT={}: {}\n",
                    option.code(),
                    to_hex(&octets[4..]),
                ));
            }
        }

        if !self.questions.is_empty() {
            out.push_str("\n;; QUESTION SECTION:\n");
            for question in &self.questions {
                out.push_str(&format!(
                    ";{}\t\t{}\t{}\n",
                    question.name.to_dotted_string(),
                    question.qclass,
                    question.qtype,
                ));
            }
        }

        for (heading, rrs) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if rrs.is_empty() {
                continue;
            }
            out.push_str(&format!("\n;; {heading} SECTION:\n"));
            for rr in rrs {
                out.push_str(&rr.to_zone_line());
                out.push('\n');
            }
        }

        // the trailing pseudo-records are printed as ordinary
        // additional records; parsing moves them back to their slots
        if self.sig0.is_some() || self.tsig.is_some() {
            if self.additional.is_empty() {
                out.push_str("\n;; ADDITIONAL SECTION:\n");
            }
            for rr in [&self.sig0, &self.tsig].into_iter().flatten() {
                out.push_str(&rr.to_zone_line());
                out.push('\n');
            }
        }

        if self.size > 0 {
            out.push_str(&format!("\n;; MSG SIZE  rcvd: {}\n", self.size));
        }
        if !self.trailing.is_empty() {
            out.push_str(&format!(
                ";; WARNING: {} octets of trailing garbage\n",
                self.trailing.len()
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn mx_record_line() {
        let rr = mx_record("example.com.", 10, "mail.example.com.");
        assert_eq!(
            "example.com.\t300\tIN\tMX\t10 mail.example.com.",
            rr.to_zone_line()
        );
    }

    #[test]
    fn txt_record_quotes_strings() {
        let rr = ResourceRecord {
            name: domain("example.com."),
            data: RecordData::Strings {
                tag: RecordType::TXT,
                strings: vec![b"v=spf1 -all".to_vec(), vec![0x07, b'x']],
            },
            rclass: RecordClass::IN,
            ttl: 60,
        };
        assert_eq!(
            "example.com.\t60\tIN\tTXT\t\"v=spf1 -all\" \"\\007x\"",
            rr.to_zone_line()
        );
    }

    #[test]
    fn unknown_record_uses_generic_syntax() {
        let rr = unknown_record("example.com.", &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            "example.com.\t300\tIN\tTYPE1000\t\\# 4 deadbeef",
            rr.to_zone_line()
        );
    }

    #[test]
    fn loc_presentation() {
        // 0 0 0.000 N 0 0 0.000 E, at the reference altitude, with
        // zero sizes
        let data = RecordData::Loc {
            version: 0,
            size: 0x12, // 1e2 cm = 1m
            horizontal_precision: 0,
            vertical_precision: 0,
            latitude: 1 << 31,
            longitude: 1 << 31,
            altitude: 10_000_000,
        };
        assert_eq!(
            "0 0 0.000 N 0 0 0.000 E 0.00m 1.00m 0.00m 0.00m",
            data.to_presentation_string()
        );
    }

    #[test]
    fn eui48_presentation() {
        let data = RecordData::Eui48 {
            address: [0x00, 0x00, 0x5e, 0x00, 0x53, 0x2a],
        };
        assert_eq!("00-00-5e-00-53-2a", data.to_presentation_string());
    }

    #[test]
    fn nid_presentation() {
        let data = RecordData::Nid {
            preference: 10,
            node_id: 0x0014_4fff_ff20_ee64,
        };
        assert_eq!("10 0014:4fff:ff20:ee64", data.to_presentation_string());
    }

    #[test]
    fn transcript_contains_sections() {
        let mut query = Message::make_query(1234, question("com.", RecordType::NS));
        query.header.recursion_desired = true;
        let mut message = query.make_response();
        message.answers = vec![ns_record("com.", "a.gtld-servers.net.")];

        let transcript = message.to_transcript();
        assert!(transcript.contains(";; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 1234"));
        assert!(transcript.contains(";; flags: qr rd ra; QUERY: 1, ANSWER: 1, AUTHORITY: 0, ADDITIONAL: 0"));
        assert!(transcript.contains(";; QUESTION SECTION:\n;com.\t\tIN\tNS"));
        assert!(transcript.contains("com.\t300\tIN\tNS\ta.gtld-servers.net."));
    }
}
