//! Presentation-format parsing: master-file record lines and
//! `dig`-style transcripts.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::protocol::bitmap::TypeBitmap;
use crate::protocol::deserialise::ConsumableBuffer;
use crate::protocol::options::EdnsOption;
use crate::protocol::rdata::{shape_of, AplItem, Gateway, RecordData, Shape};
use crate::protocol::types::*;
use crate::text::{
    from_base32hex, from_base64, from_hex, sig_time_from_string, tokenise_entry, Error, Token,
};

impl ResourceRecord {
    /// Parse a single record in master-file syntax.  The forms
    ///
    /// ```text
    /// <name> <ttl> <class> <type> <rdata>
    /// <name> <class> <ttl> <type> <rdata>
    /// <name> <ttl> <type> <rdata>
    /// <name> <class> <type> <rdata>
    /// <name> <type> <rdata>
    /// ```
    ///
    /// are accepted, with the class defaulting to `IN` and the TTL to
    /// zero.  Parenthesised multi-line rdata and comments work as in
    /// a zone file.
    pub fn from_zone_line(line: &str, origin: Option<&DomainName>) -> Result<Self, Error> {
        let tokens = tokenise_entry(&mut line.chars().peekable())?;
        let entry = parse_rr_tokens(origin, &None, None, &tokens)?;
        Ok(entry)
    }
}

/// Parse a tokenised record, with optional carried-over name and TTL
/// for zone-file context.
pub(crate) fn parse_rr_tokens(
    origin: Option<&DomainName>,
    previous_name: &Option<DomainName>,
    previous_ttl: Option<u32>,
    tokens: &[Token],
) -> Result<ResourceRecord, Error> {
    if tokens.is_empty() {
        return Err(Error::MissingType);
    }

    // scan for the type token: it is in one of the first four
    // positions, and everything before it is some ordering of name,
    // TTL, and class
    for type_position in 0..tokens.len().min(4) {
        let Ok(rtype) = parse_record_type(&tokens[type_position].text) else {
            continue;
        };

        // "IN" and "A" and so on are also valid relative domain
        // names; only take this parse if the rdata works too
        let Ok(data) = parse_rdata(rtype, origin, &tokens[type_position + 1..]) else {
            continue;
        };

        let mut name = None;
        let mut ttl = None;
        let mut rclass = None;
        for token in &tokens[..type_position] {
            if ttl.is_none() && token.text.bytes().all(|b| b.is_ascii_digit()) {
                ttl = Some(parse_u32(&token.text)?);
            } else if rclass.is_none() && parse_record_class(&token.text).is_ok() {
                rclass = Some(parse_record_class(&token.text).unwrap());
            } else if name.is_none() {
                name = Some(parse_domain(origin, &token.text)?);
            } else {
                return Err(Error::Unexpected {
                    expected: "name, TTL, or class".to_string(),
                    found: token.text.clone(),
                });
            }
        }

        let name = match name {
            Some(name) => name,
            None => previous_name.clone().ok_or(Error::MissingDomainName)?,
        };

        return Ok(ResourceRecord {
            name,
            data,
            rclass: rclass.unwrap_or(RecordClass::IN),
            ttl: ttl.or(previous_ttl).unwrap_or(0),
        });
    }

    Err(Error::MissingType)
}

/// A cursor over rdata tokens.
struct Fields<'a> {
    rtype: RecordType,
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Fields<'a> {
    fn new(rtype: RecordType, tokens: &'a [Token]) -> Self {
        Self {
            rtype,
            tokens,
            position: 0,
        }
    }

    fn next(&mut self) -> Result<&'a Token, Error> {
        let token = self.tokens.get(self.position).ok_or(Error::MissingFields {
            rtype: Some(self.rtype.to_string()),
        })?;
        self.position += 1;
        Ok(token)
    }

    fn rest(&mut self) -> &'a [Token] {
        let rest = &self.tokens[self.position.min(self.tokens.len())..];
        self.position = self.tokens.len();
        rest
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn finish(self) -> Result<(), Error> {
        if self.position == self.tokens.len() {
            Ok(())
        } else {
            Err(Error::TrailingTokens {
                found: self.tokens[self.position].text.clone(),
            })
        }
    }
}

/// Parse the rdata for a record of the given type.
///
/// # Errors
///
/// If the tokens do not parse as this type's fields.
pub(crate) fn parse_rdata(
    rtype: RecordType,
    origin: Option<&DomainName>,
    tokens: &[Token],
) -> Result<RecordData, Error> {
    // the RFC 3597 generic form is accepted for any type, and decodes
    // through the binary codec so known types still come out typed
    if tokens.first().map(|t| t.text.as_str()) == Some("\\#") {
        return parse_generic_rdata(rtype, &tokens[1..]);
    }

    let mut fields = Fields::new(rtype, tokens);

    let data = match shape_of(rtype) {
        Shape::A => RecordData::A {
            address: parse_ipv4(&fields.next()?.text)?,
        },
        Shape::Aaaa => RecordData::Aaaa {
            address: parse_ipv6(&fields.next()?.text)?,
        },
        Shape::Name => RecordData::Name {
            tag: rtype,
            name: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Soa => RecordData::Soa {
            mname: parse_domain(origin, &fields.next()?.text)?,
            rname: parse_domain(origin, &fields.next()?.text)?,
            serial: parse_u32(&fields.next()?.text)?,
            refresh: parse_u32(&fields.next()?.text)?,
            retry: parse_u32(&fields.next()?.text)?,
            expire: parse_u32(&fields.next()?.text)?,
            minimum: parse_u32(&fields.next()?.text)?,
        },
        Shape::NamePair => RecordData::NamePair {
            tag: rtype,
            first: parse_domain(origin, &fields.next()?.text)?,
            second: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Exchange => RecordData::Exchange {
            tag: rtype,
            preference: parse_u16(&fields.next()?.text)?,
            exchange: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Strings => {
            let strings: Vec<Vec<u8>> =
                fields.rest().iter().map(|t| t.octets.clone()).collect();
            if strings.is_empty() {
                return Err(Error::MissingFields {
                    rtype: Some(rtype.to_string()),
                });
            }
            RecordData::Strings {
                tag: rtype,
                strings,
            }
        }
        Shape::Wks => {
            let address = parse_ipv4(&fields.next()?.text)?;
            let protocol = parse_u8(&fields.next()?.text)?;
            let mut bitmap = Vec::new();
            for token in fields.rest() {
                let port = parse_u16(&token.text)?;
                let octet = usize::from(port / 8);
                if bitmap.len() <= octet {
                    bitmap.resize(octet + 1, 0);
                }
                bitmap[octet] |= 0b1000_0000 >> (port % 8);
            }
            RecordData::Wks {
                address,
                protocol,
                bitmap,
            }
        }
        Shape::Opaque => {
            use crate::protocol::rdata::{opaque_format, OpaqueFormat};
            let text = concat_texts(fields.rest());
            let octets = match opaque_format(rtype) {
                OpaqueFormat::Hex => {
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        from_hex(&text).ok_or(Error::ExpectedHex { found: text })?
                    }
                }
                OpaqueFormat::PrefixedHex => {
                    let stripped = text.strip_prefix("0x").unwrap_or(&text);
                    from_hex(stripped).ok_or(Error::ExpectedHex { found: text })?
                }
                OpaqueFormat::Base64 => {
                    from_base64(&text).ok_or(Error::ExpectedBase64 { found: text })?
                }
            };
            RecordData::Opaque {
                tag: rtype,
                octets,
            }
        }
        Shape::Srv => RecordData::Srv {
            priority: parse_u16(&fields.next()?.text)?,
            weight: parse_u16(&fields.next()?.text)?,
            port: parse_u16(&fields.next()?.text)?,
            target: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Naptr => RecordData::Naptr {
            order: parse_u16(&fields.next()?.text)?,
            preference: parse_u16(&fields.next()?.text)?,
            flags: fields.next()?.octets.clone(),
            services: fields.next()?.octets.clone(),
            regexp: fields.next()?.octets.clone(),
            replacement: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Px => RecordData::Px {
            preference: parse_u16(&fields.next()?.text)?,
            map822: parse_domain(origin, &fields.next()?.text)?,
            mapx400: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Loc => parse_loc(&mut fields)?,
        Shape::Sig => RecordData::Sig {
            tag: rtype,
            type_covered: parse_record_type(&fields.next()?.text)?,
            algorithm: parse_u8(&fields.next()?.text)?,
            labels: parse_u8(&fields.next()?.text)?,
            original_ttl: parse_u32(&fields.next()?.text)?,
            expiration: parse_sig_time(&fields.next()?.text)?,
            inception: parse_sig_time(&fields.next()?.text)?,
            key_tag: parse_u16(&fields.next()?.text)?,
            signer: parse_domain(origin, &fields.next()?.text)?,
            signature: parse_base64_rest(fields.rest())?,
        },
        Shape::Key => RecordData::Key {
            tag: rtype,
            flags: parse_u16(&fields.next()?.text)?,
            protocol: parse_u8(&fields.next()?.text)?,
            algorithm: parse_u8(&fields.next()?.text)?,
            public_key: parse_base64_rest(fields.rest())?,
        },
        Shape::Ds => RecordData::Ds {
            tag: rtype,
            key_tag: parse_u16(&fields.next()?.text)?,
            algorithm: parse_u8(&fields.next()?.text)?,
            digest_type: parse_u8(&fields.next()?.text)?,
            digest: parse_hex_rest(fields.rest())?,
        },
        Shape::Nxt => {
            let next = parse_domain(origin, &fields.next()?.text)?;
            let mut bitmap = Vec::new();
            for token in fields.rest() {
                let rtype = parse_record_type(&token.text)?;
                let value = usize::from(u16::from(rtype));
                if value > 127 {
                    return Err(Error::BadRdata {
                        rtype: "NXT".to_string(),
                    });
                }
                if bitmap.len() <= value / 8 {
                    bitmap.resize(value / 8 + 1, 0);
                }
                bitmap[value / 8] |= 0b1000_0000 >> (value % 8);
            }
            RecordData::Nxt { next, bitmap }
        }
        Shape::Nsec => RecordData::Nsec {
            next: parse_domain(origin, &fields.next()?.text)?,
            types: parse_type_list(fields.rest())?,
        },
        Shape::Nsec3 => RecordData::Nsec3 {
            hash_algorithm: parse_u8(&fields.next()?.text)?,
            flags: parse_u8(&fields.next()?.text)?,
            iterations: parse_u16(&fields.next()?.text)?,
            salt: parse_salt(&fields.next()?.text)?,
            next_hashed: {
                let text = &fields.next()?.text;
                from_base32hex(text).ok_or(Error::ExpectedBase32Hex {
                    found: text.clone(),
                })?
            },
            types: parse_type_list(fields.rest())?,
        },
        Shape::Nsec3Param => RecordData::Nsec3Param {
            hash_algorithm: parse_u8(&fields.next()?.text)?,
            flags: parse_u8(&fields.next()?.text)?,
            iterations: parse_u16(&fields.next()?.text)?,
            salt: parse_salt(&fields.next()?.text)?,
        },
        Shape::Cert => RecordData::Cert {
            cert_type: parse_u16(&fields.next()?.text)?,
            key_tag: parse_u16(&fields.next()?.text)?,
            algorithm: parse_u8(&fields.next()?.text)?,
            certificate: parse_base64_rest(fields.rest())?,
        },
        Shape::Sshfp => RecordData::Sshfp {
            algorithm: parse_u8(&fields.next()?.text)?,
            fingerprint_type: parse_u8(&fields.next()?.text)?,
            fingerprint: parse_hex_rest(fields.rest())?,
        },
        Shape::Tlsa => RecordData::Tlsa {
            tag: rtype,
            usage: parse_u8(&fields.next()?.text)?,
            selector: parse_u8(&fields.next()?.text)?,
            matching_type: parse_u8(&fields.next()?.text)?,
            certificate_data: parse_hex_rest(fields.rest())?,
        },
        Shape::Ipseckey => {
            let precedence = parse_u8(&fields.next()?.text)?;
            let gateway_type = parse_u8(&fields.next()?.text)?;
            let algorithm = parse_u8(&fields.next()?.text)?;
            let gateway_token = fields.next()?;
            let gateway = match gateway_type {
                0 => Gateway::None,
                1 => Gateway::Ipv4(parse_ipv4(&gateway_token.text)?),
                2 => Gateway::Ipv6(parse_ipv6(&gateway_token.text)?),
                3 => Gateway::Name(parse_domain(origin, &gateway_token.text)?),
                _ => {
                    return Err(Error::BadRdata {
                        rtype: "IPSECKEY".to_string(),
                    })
                }
            };
            RecordData::Ipseckey {
                precedence,
                algorithm,
                gateway,
                public_key: parse_base64_rest(fields.rest())?,
            }
        }
        Shape::Hip => {
            let algorithm = parse_u8(&fields.next()?.text)?;
            let hit_text = &fields.next()?.text;
            let hit = from_hex(hit_text).ok_or(Error::ExpectedHex {
                found: hit_text.clone(),
            })?;
            let key_text = &fields.next()?.text;
            let public_key = from_base64(key_text).ok_or(Error::ExpectedBase64 {
                found: key_text.clone(),
            })?;
            let mut servers = Vec::new();
            for token in fields.rest() {
                servers.push(parse_domain(origin, &token.text)?);
            }
            RecordData::Hip {
                algorithm,
                hit,
                public_key,
                servers,
            }
        }
        Shape::Csync => RecordData::Csync {
            serial: parse_u32(&fields.next()?.text)?,
            flags: parse_u16(&fields.next()?.text)?,
            types: parse_type_list(fields.rest())?,
        },
        Shape::Caa => RecordData::Caa {
            flags: parse_u8(&fields.next()?.text)?,
            tag_string: fields.next()?.octets.clone(),
            value: fields.next()?.octets.clone(),
        },
        Shape::Uri => RecordData::Uri {
            priority: parse_u16(&fields.next()?.text)?,
            weight: parse_u16(&fields.next()?.text)?,
            target: fields.next()?.octets.clone(),
        },
        Shape::Nid => RecordData::Nid {
            preference: parse_u16(&fields.next()?.text)?,
            node_id: parse_u64_groups(&fields.next()?.text)?,
        },
        Shape::L32 => RecordData::L32 {
            preference: parse_u16(&fields.next()?.text)?,
            locator: parse_ipv4(&fields.next()?.text)?,
        },
        Shape::L64 => RecordData::L64 {
            preference: parse_u16(&fields.next()?.text)?,
            locator: parse_u64_groups(&fields.next()?.text)?,
        },
        Shape::Lp => RecordData::Lp {
            preference: parse_u16(&fields.next()?.text)?,
            fqdn: parse_domain(origin, &fields.next()?.text)?,
        },
        Shape::Eui48 => RecordData::Eui48 {
            address: parse_eui(&fields.next()?.text)?,
        },
        Shape::Eui64 => RecordData::Eui64 {
            address: parse_eui(&fields.next()?.text)?,
        },
        Shape::A6 => {
            let prefix_length = parse_u8(&fields.next()?.text)?;
            if prefix_length > 128 {
                return Err(Error::BadRdata {
                    rtype: "A6".to_string(),
                });
            }
            let suffix = parse_ipv6(&fields.next()?.text)?;
            let prefix_name = if prefix_length == 0 {
                None
            } else {
                Some(parse_domain(origin, &fields.next()?.text)?)
            };
            RecordData::A6 {
                prefix_length,
                suffix,
                prefix_name,
            }
        }
        Shape::Apl => {
            let mut items = Vec::new();
            for token in fields.rest() {
                items.push(parse_apl_item(&token.text)?);
            }
            RecordData::Apl { items }
        }
        Shape::Tsig => RecordData::Tsig {
            algorithm: parse_domain(origin, &fields.next()?.text)?,
            time_signed: parse_u64(&fields.next()?.text)?,
            fudge: parse_u16(&fields.next()?.text)?,
            mac: parse_optional_base64(&fields.next()?.text)?,
            original_id: parse_u16(&fields.next()?.text)?,
            error: parse_rcode_value(&fields.next()?.text)?,
            other: parse_optional_base64(&fields.next()?.text)?,
        },
        Shape::Tkey => RecordData::Tkey {
            algorithm: parse_domain(origin, &fields.next()?.text)?,
            inception: parse_u32(&fields.next()?.text)?,
            expiration: parse_u32(&fields.next()?.text)?,
            mode: parse_u16(&fields.next()?.text)?,
            error: parse_rcode_value(&fields.next()?.text)?,
            key: parse_optional_base64(&fields.next()?.text)?,
            other: parse_optional_base64(&fields.next()?.text)?,
        },
        Shape::Doa => RecordData::Doa {
            enterprise: parse_u32(&fields.next()?.text)?,
            doa_type: parse_u32(&fields.next()?.text)?,
            location: parse_u8(&fields.next()?.text)?,
            media_type: fields.next()?.octets.clone(),
            data: parse_optional_base64(&fields.next()?.text)?,
        },
        Shape::Opt | Shape::Unknown => {
            // only the generic syntax, handled above, can express
            // these
            return Err(Error::BadRdata {
                rtype: rtype.to_string(),
            });
        }
    };

    fields.finish()?;
    Ok(data)
}

/// The RFC 3597 `\# <length> <hex...>` form.  The octets are decoded
/// through the binary rdata codec, so a known type comes out typed.
fn parse_generic_rdata(rtype: RecordType, tokens: &[Token]) -> Result<RecordData, Error> {
    let Some(length_token) = tokens.first() else {
        return Err(Error::MissingFields {
            rtype: Some(rtype.to_string()),
        });
    };
    let length = parse_u16(&length_token.text)?;

    let hex = concat_texts(&tokens[1..]);
    let octets = from_hex(&hex).ok_or(Error::ExpectedHex { found: hex })?;
    if octets.len() != usize::from(length) {
        return Err(Error::BadRdata {
            rtype: rtype.to_string(),
        });
    }

    let mut buffer = ConsumableBuffer::new(&octets);
    match RecordData::deserialise(rtype, 0, &mut buffer) {
        Ok(data) if buffer.remaining() == 0 => Ok(data),
        _ => Err(Error::BadRdata {
            rtype: rtype.to_string(),
        }),
    }
}

fn concat_texts(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .concat()
}

pub(crate) fn parse_domain(
    origin: Option<&DomainName>,
    dotted_string: &str,
) -> Result<DomainName, Error> {
    if dotted_string == "@" {
        return origin.cloned().ok_or(Error::ExpectedOrigin);
    }

    if let Some(name) = DomainName::from_dotted_string(dotted_string) {
        return Ok(name);
    }

    if let Some(origin) = origin {
        if let Some(name) = DomainName::from_relative_dotted_string(origin, dotted_string) {
            return Ok(name);
        }
        return Err(Error::ExpectedDomainName {
            dotted_string: dotted_string.to_string(),
        });
    }

    Err(Error::ExpectedOrigin)
}

fn parse_u8(digits: &str) -> Result<u8, Error> {
    digits.parse().map_err(|_| Error::ExpectedU8 {
        digits: digits.to_string(),
    })
}

fn parse_u16(digits: &str) -> Result<u16, Error> {
    digits.parse().map_err(|_| Error::ExpectedU16 {
        digits: digits.to_string(),
    })
}

fn parse_u32(digits: &str) -> Result<u32, Error> {
    digits.parse().map_err(|_| Error::ExpectedU32 {
        digits: digits.to_string(),
    })
}

fn parse_u64(digits: &str) -> Result<u64, Error> {
    digits.parse().map_err(|_| Error::ExpectedU64 {
        digits: digits.to_string(),
    })
}

fn parse_ipv4(s: &str) -> Result<Ipv4Addr, Error> {
    Ipv4Addr::from_str(s).map_err(|_| Error::ExpectedIpv4 {
        found: s.to_string(),
    })
}

fn parse_ipv6(s: &str) -> Result<Ipv6Addr, Error> {
    Ipv6Addr::from_str(s).map_err(|_| Error::ExpectedIpv6 {
        found: s.to_string(),
    })
}

fn parse_sig_time(s: &str) -> Result<u32, Error> {
    sig_time_from_string(s).ok_or(Error::ExpectedTimestamp {
        found: s.to_string(),
    })
}

fn parse_salt(s: &str) -> Result<Vec<u8>, Error> {
    if s == "-" {
        return Ok(Vec::new());
    }
    from_hex(s).ok_or(Error::ExpectedHex {
        found: s.to_string(),
    })
}

fn parse_base64_rest(tokens: &[Token]) -> Result<Vec<u8>, Error> {
    let text = concat_texts(tokens);
    from_base64(&text).ok_or(Error::ExpectedBase64 { found: text })
}

fn parse_hex_rest(tokens: &[Token]) -> Result<Vec<u8>, Error> {
    let text = concat_texts(tokens);
    from_hex(&text).ok_or(Error::ExpectedHex { found: text })
}

/// Base64 data which may be `-` for "none", as in the TSIG "other"
/// field.
fn parse_optional_base64(s: &str) -> Result<Vec<u8>, Error> {
    if s == "-" {
        return Ok(Vec::new());
    }
    from_base64(s).ok_or(Error::ExpectedBase64 {
        found: s.to_string(),
    })
}

/// A TSIG/TKEY error field: an RCODE mnemonic or a plain number.
fn parse_rcode_value(s: &str) -> Result<u16, Error> {
    if let Ok(rcode) = Rcode::from_str(s) {
        return Ok(u16::from(rcode));
    }
    parse_u16(s)
}

fn parse_type_list(tokens: &[Token]) -> Result<TypeBitmap, Error> {
    let mut types = Vec::with_capacity(tokens.len());
    for token in tokens {
        types.push(parse_record_type(&token.text)?);
    }
    Ok(TypeBitmap::from_types(types))
}

/// Type and class mnemonics are matched case-insensitively, as BIND
/// does.
pub(crate) fn parse_record_type(s: &str) -> Result<RecordType, Error> {
    RecordType::from_str(&s.to_ascii_uppercase()).map_err(|()| Error::ExpectedType {
        found: s.to_string(),
    })
}

pub(crate) fn parse_record_class(s: &str) -> Result<RecordClass, Error> {
    RecordClass::from_str(&s.to_ascii_uppercase()).map_err(|()| Error::ExpectedClass {
        found: s.to_string(),
    })
}

fn parse_u64_groups(s: &str) -> Result<u64, Error> {
    let groups: Vec<&str> = s.split(':').collect();
    if groups.len() != 4 || groups.iter().any(|g| g.len() != 4) {
        return Err(Error::ExpectedHex {
            found: s.to_string(),
        });
    }
    let mut value = 0u64;
    for group in groups {
        let part = u64::from_str_radix(group, 16).map_err(|_| Error::ExpectedHex {
            found: s.to_string(),
        })?;
        value = (value << 16) | part;
    }
    Ok(value)
}

fn parse_eui<const N: usize>(s: &str) -> Result<[u8; N], Error> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != N {
        return Err(Error::ExpectedHex {
            found: s.to_string(),
        });
    }
    let mut address = [0; N];
    for (octet, part) in address.iter_mut().zip(parts) {
        *octet = u8::from_str_radix(part, 16).map_err(|_| Error::ExpectedHex {
            found: s.to_string(),
        })?;
    }
    Ok(address)
}

/// An APL item: `[!]<family>:<address>/<prefix>`.
fn parse_apl_item(s: &str) -> Result<AplItem, Error> {
    let bad = || Error::BadRdata {
        rtype: "APL".to_string(),
    };

    let (negate, s) = match s.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (family_str, rest) = s.split_once(':').ok_or_else(bad)?;
    let (address_str, prefix_str) = rest.rsplit_once('/').ok_or_else(bad)?;

    let family = parse_u16(family_str)?;
    let prefix = parse_u8(prefix_str)?;

    let mut address = match family {
        1 => parse_ipv4(address_str)?.octets().to_vec(),
        2 => parse_ipv6(address_str)?.octets().to_vec(),
        _ => {
            let stripped = address_str.strip_prefix("0x").ok_or_else(bad)?;
            from_hex(stripped).ok_or_else(bad)?
        }
    };

    // the wire form trims trailing zero octets
    while address.last() == Some(&0) {
        address.pop();
    }

    Ok(AplItem {
        family,
        prefix,
        negate,
        address,
    })
}

/// LOC rdata: `<lat> <lon> <alt>[m] [<size>[m] [<hp>[m] [<vp>[m]]]]`,
/// where each angle is `<deg> [<min> [<sec>]] <hemisphere>`.  The
/// defaults are those of RFC 1876 section 3.
fn parse_loc(fields: &mut Fields) -> Result<RecordData, Error> {
    let latitude = parse_loc_angle(fields, 'N', 'S')?;
    let longitude = parse_loc_angle(fields, 'E', 'W')?;
    let altitude = parse_loc_altitude(&fields.next()?.text)?;

    let mut sizes = [0x12, 0x16, 0x13]; // 1m, 10000m, 10m
    for size in &mut sizes {
        match fields.peek() {
            Some(token) => {
                *size = parse_loc_size(&token.text)?;
                fields.position += 1;
            }
            None => break,
        }
    }

    Ok(RecordData::Loc {
        version: 0,
        size: sizes[0],
        horizontal_precision: sizes[1],
        vertical_precision: sizes[2],
        latitude,
        longitude,
        altitude,
    })
}

fn parse_loc_angle(fields: &mut Fields, positive: char, negative: char) -> Result<u32, Error> {
    let bad = || Error::BadRdata {
        rtype: "LOC".to_string(),
    };

    let mut parts = Vec::new();
    let hemisphere = loop {
        let token = fields.next()?;
        if token.text.len() == 1 {
            let c = token.text.chars().next().unwrap();
            if c == positive || c == negative {
                break c;
            }
        }
        if parts.len() == 3 {
            return Err(bad());
        }
        parts.push(token.text.clone());
    };

    let degrees: u64 = parts.first().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let minutes: u64 = match parts.get(1) {
        Some(p) => p.parse().map_err(|_| bad())?,
        None => 0,
    };
    let thousandths = match parts.get(2) {
        Some(p) => parse_decimal_thousandths(p).ok_or_else(bad)?,
        None => 0,
    };

    let magnitude = degrees * 3_600_000 + minutes * 60_000 + thousandths;
    let value = if hemisphere == positive {
        (1u64 << 31) + magnitude
    } else {
        (1u64 << 31) - magnitude
    };
    u32::try_from(value).map_err(|_| bad())
}

/// `<sec>.<msec>` into thousandths, without floating point.
fn parse_decimal_thousandths(s: &str) -> Option<u64> {
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = whole.parse().ok()?;
    let mut milli = 0;
    for (i, b) in fraction.bytes().enumerate() {
        milli += u64::from(b - b'0') * 10u64.pow(2 - i as u32);
    }
    Some(whole * 1000 + milli)
}

fn parse_loc_altitude(s: &str) -> Result<u32, Error> {
    let bad = || Error::BadRdata {
        rtype: "LOC".to_string(),
    };

    let s = s.strip_suffix('m').unwrap_or(s);
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let whole: i64 = whole.parse().map_err(|_| bad())?;
    let mut centi = 0i64;
    for (i, b) in fraction.bytes().enumerate() {
        centi += i64::from(b - b'0') * 10i64.pow(1 - i as u32);
    }

    let magnitude = whole * 100 + centi;
    let offset = if negative { -magnitude } else { magnitude };
    u32::try_from(10_000_000 + offset).map_err(|_| bad())
}

fn parse_loc_size(s: &str) -> Result<u8, Error> {
    let bad = || Error::BadRdata {
        rtype: "LOC".to_string(),
    };

    let s = s.strip_suffix('m').unwrap_or(s);
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let whole: u64 = whole.parse().map_err(|_| bad())?;
    let mut centi = 0u64;
    for (i, b) in fraction.bytes().enumerate() {
        centi += u64::from(b - b'0') * 10u64.pow(1 - i as u32);
    }

    let mut mantissa = whole * 100 + centi;
    let mut exponent = 0u8;
    while mantissa > 9 {
        mantissa /= 10;
        exponent += 1;
    }
    if exponent > 15 {
        return Err(bad());
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(((mantissa as u8) << 4) | exponent)
}

impl Message {
    /// Parse a `dig`-style transcript, as emitted by `to_transcript`.
    /// Informative trailing comments (query time, server, message
    /// size) are accepted and ignored.
    pub fn from_transcript(text: &str) -> Result<Self, Error> {
        #[derive(Copy, Clone, Eq, PartialEq)]
        enum Section {
            None,
            Question,
            Answer,
            Authority,
            Additional,
        }

        let mut header: Option<Header> = None;
        let mut edns = None;
        let mut questions = Vec::new();
        let mut answers = Vec::new();
        let mut authority = Vec::new();
        let mut additional = Vec::new();
        let mut section = Section::None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix(";; ->>HEADER<<-") {
                header = Some(parse_transcript_header(rest.trim())?);
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix(";; flags:") {
                let header = header.as_mut().ok_or(Error::BadTranscriptLine {
                    line: line.to_string(),
                })?;
                parse_transcript_flags(rest, header);
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("; EDNS:") {
                edns = Some(parse_transcript_edns(rest.trim())?);
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("; OPT=") {
                let edns: &mut Edns = edns.as_mut().ok_or(Error::BadTranscriptLine {
                    line: line.to_string(),
                })?;
                let (code_str, data_str) =
                    rest.split_once(':').ok_or(Error::BadTranscriptLine {
                        line: line.to_string(),
                    })?;
                let code = parse_u16(code_str.trim())?;
                let data = from_hex(data_str.trim()).ok_or(Error::ExpectedHex {
                    found: data_str.trim().to_string(),
                })?;
                edns.options.push(EdnsOption::parse_one(code, &data));
                continue;
            }

            if trimmed.ends_with("SECTION:") {
                section = if trimmed.contains("QUESTION") {
                    Section::Question
                } else if trimmed.contains("ANSWER") {
                    Section::Answer
                } else if trimmed.contains("AUTHORITY") {
                    Section::Authority
                } else if trimmed.contains("ADDITIONAL") {
                    Section::Additional
                } else {
                    Section::None
                };
                continue;
            }

            if section == Section::Question {
                if let Some(rest) = trimmed.strip_prefix(';') {
                    let tokens = tokenise_entry(&mut rest.chars().peekable())?;
                    if tokens.len() != 3 {
                        return Err(Error::BadTranscriptLine {
                            line: line.to_string(),
                        });
                    }
                    questions.push(Question {
                        name: parse_domain(None, &tokens[0].text)?,
                        qclass: parse_record_class(&tokens[1].text)?,
                        qtype: parse_record_type(&tokens[2].text)?,
                    });
                    continue;
                }
            }

            // any other comment is informative (query time, server,
            // when, message size, trailing-garbage warnings)
            if trimmed.starts_with(';') {
                continue;
            }

            let tokens = tokenise_entry(&mut line.chars().peekable())?;
            let rr = parse_rr_tokens(None, &None, None, &tokens)?;
            match section {
                Section::Answer => answers.push(rr),
                Section::Authority => authority.push(rr),
                Section::Additional => additional.push(rr),
                _ => {
                    return Err(Error::BadTranscriptLine {
                        line: line.to_string(),
                    })
                }
            }
        }

        let header = header.ok_or(Error::BadTranscriptLine {
            line: "missing ;; ->>HEADER<<- line".to_string(),
        })?;

        let mut message = Message {
            header,
            questions,
            answers,
            authority,
            additional,
            edns,
            tsig: None,
            sig0: None,
            size: 0,
            trailing: Vec::new(),
        };

        // recover the pseudo-record slots, as the wire decoder would
        if message.additional.last().map(ResourceRecord::rtype) == Some(RecordType::TSIG) {
            message.tsig = message.additional.pop();
        }
        if let Some(rr) = message.additional.last() {
            if let RecordData::Sig {
                tag: RecordType::SIG,
                type_covered,
                ..
            } = &rr.data
            {
                if rr.name.is_root() && u16::from(*type_covered) == 0 {
                    message.sig0 = message.additional.pop();
                }
            }
        }

        Ok(message)
    }
}

/// `opcode: QUERY, status: NOERROR, id: 1234`
fn parse_transcript_header(rest: &str) -> Result<Header, Error> {
    let mut opcode = None;
    let mut rcode = None;
    let mut id = None;

    for part in rest.split(',') {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "opcode" => {
                opcode = Some(Opcode::from_str(value).map_err(|()| Error::BadTranscriptLine {
                    line: rest.to_string(),
                })?);
            }
            "status" => {
                rcode = Some(Rcode::from_str(value).map_err(|()| Error::BadTranscriptLine {
                    line: rest.to_string(),
                })?);
            }
            "id" => id = Some(parse_u16(value)?),
            _ => (),
        }
    }

    match (opcode, rcode, id) {
        (Some(opcode), Some(rcode), Some(id)) => Ok(Header {
            id,
            is_response: false,
            opcode,
            is_authoritative: false,
            is_truncated: false,
            recursion_desired: false,
            recursion_available: false,
            z: false,
            authentic_data: false,
            checking_disabled: false,
            rcode,
        }),
        _ => Err(Error::BadTranscriptLine {
            line: rest.to_string(),
        }),
    }
}

/// ` qr rd ra; QUERY: 1, ANSWER: 13, ...` - the counts are
/// informative, since the sections carry their own lengths.
fn parse_transcript_flags(rest: &str, header: &mut Header) {
    let flags_part = rest.split(';').next().unwrap_or("");
    for flag in flags_part.split_whitespace() {
        match flag {
            "qr" => header.is_response = true,
            "aa" => header.is_authoritative = true,
            "tc" => header.is_truncated = true,
            "rd" => header.recursion_desired = true,
            "ra" => header.recursion_available = true,
            "z" => header.z = true,
            "ad" => header.authentic_data = true,
            "cd" => header.checking_disabled = true,
            _ => (),
        }
    }
}

/// `version: 0, flags: do; udp: 4096`.  Unknown keys (dig's `MBZ:`
/// and friends) are skipped.
fn parse_transcript_edns(rest: &str) -> Result<Edns, Error> {
    let mut edns = Edns {
        udp_payload_size: MAX_UDP_SIZE as u16,
        version: 0,
        flags: 0,
        options: Vec::new(),
    };

    for part in rest.split(&[',', ';']) {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "version" => edns.version = parse_u8(value)?,
            "flags" => {
                if value.split_whitespace().any(|f| f == "do") {
                    edns.flags |= EDNS_FLAG_DO;
                }
            }
            "udp" => edns.udp_payload_size = parse_u16(value)?,
            _ => (),
        }
    }

    Ok(edns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn parse_mx_line() {
        let rr =
            ResourceRecord::from_zone_line("example.com. 3600 IN MX 10 mail.example.com.", None)
                .unwrap();
        assert_eq!(mx_record("example.com.", 10, "mail.example.com."), {
            let mut rr = rr;
            rr.ttl = 300;
            rr
        });
    }

    #[test]
    fn parse_accepts_field_orders() {
        let a = ResourceRecord::from_zone_line("example.com. 300 IN A 192.0.2.1", None).unwrap();
        let b = ResourceRecord::from_zone_line("example.com. IN 300 A 192.0.2.1", None).unwrap();
        let c = ResourceRecord::from_zone_line("example.com. 300 A 192.0.2.1", None).unwrap();
        let d = ResourceRecord::from_zone_line("example.com. IN A 192.0.2.1", None).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.data, d.data);
        assert_eq!(0, d.ttl);
    }

    #[test]
    fn parse_relative_names_against_origin() {
        let origin = domain("example.com.");
        let rr =
            ResourceRecord::from_zone_line("www 300 IN CNAME @", Some(&origin)).unwrap();
        assert_eq!(domain("www.example.com."), rr.name);
        assert_eq!(
            RecordData::Name {
                tag: RecordType::CNAME,
                name: domain("example.com."),
            },
            rr.data
        );
    }

    #[test]
    fn parse_soa_with_parentheses() {
        let rr = ResourceRecord::from_zone_line(
            ". 86400 IN SOA a.root-servers.net. nstld.verisign-grs.com. (\n\
             \t2018080200 ; serial\n\
             \t1800 900 604800 86400 )",
            None,
        )
        .unwrap();

        assert_eq!(
            RecordData::Soa {
                mname: domain("a.root-servers.net."),
                rname: domain("nstld.verisign-grs.com."),
                serial: 2_018_080_200,
                refresh: 1800,
                retry: 900,
                expire: 604_800,
                minimum: 86400,
            },
            rr.data
        );
    }

    #[test]
    fn parse_generic_rdata_becomes_typed() {
        let rr = ResourceRecord::from_zone_line(
            "example.com. 300 IN A \\# 4 c0000201",
            None,
        )
        .unwrap();
        assert_eq!(
            RecordData::A {
                address: "192.0.2.1".parse().unwrap()
            },
            rr.data
        );
    }

    #[test]
    fn parse_generic_rdata_length_mismatch() {
        assert!(ResourceRecord::from_zone_line(
            "example.com. 300 IN TYPE1000 \\# 3 c0000201",
            None
        )
        .is_err());
    }

    #[test]
    fn parse_nsec_type_list() {
        let rr = ResourceRecord::from_zone_line(
            "id. 86400 IN NSEC ie. NS DS RRSIG NSEC",
            None,
        )
        .unwrap();
        if let RecordData::Nsec { next, types } = &rr.data {
            assert_eq!(&domain("ie."), next);
            assert_eq!(
                vec![
                    RecordType::NS,
                    RecordType::DS,
                    RecordType::RRSIG,
                    RecordType::NSEC
                ],
                types.types()
            );
        } else {
            panic!("expected NSEC, got {:?}", rr.data);
        }
    }

    #[test]
    fn rdata_roundtrip_via_presentation() {
        let lines = [
            "example.com. 300 IN A 192.0.2.1",
            "example.com. 300 IN AAAA 2001:db8::1",
            "example.com. 300 IN NS ns1.example.com.",
            "example.com. 300 IN SOA ns1.example.com. admin.example.com. 1 2 3 4 5",
            "example.com. 300 IN MX 10 mail.example.com.",
            "example.com. 300 IN TXT \"hello world\" \"second\"",
            "example.com. 300 IN SRV 1 2 53 target.example.com.",
            "example.com. 300 IN NAPTR 100 50 \"s\" \"http\" \"\" _http._tcp.example.com.",
            "example.com. 300 IN DS 20326 8 2 e06d44b80b8f1d39a95c0b0d7c65d08458e880409bbc683457104237c7f8ec8d",
            "example.com. 300 IN DNSKEY 257 3 8 AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/ET0sQWHpKEKZRRS9mDwZYIvNeaILEHhXovx6Ws9tVPs2z+T2vcoxIZLhjRkMirAB0UXw",
            "example.com. 300 IN SSHFP 1 1 aa30cdcf15b38c3b4ea342405ad9a2ba0d345b97",
            "example.com. 300 IN TLSA 3 1 1 0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
            "example.com. 300 IN CAA 0 issue \"letsencrypt.org\"",
            "example.com. 300 IN URI 10 1 \"https://example.com/\"",
            "example.com. 300 IN NID 10 0014:4fff:ff20:ee64",
            "example.com. 300 IN L32 10 10.1.2.0",
            "example.com. 300 IN L64 10 2001:0db8:1140:1000",
            "example.com. 300 IN LP 10 l64-subnet.example.com.",
            "example.com. 300 IN EUI48 00-00-5e-00-53-2a",
            "example.com. 300 IN EUI64 00-00-5e-ef-10-00-00-2a",
            "example.com. 300 IN HINFO \"PDP-11\" \"UNIX\"",
            "example.com. 300 IN RP admin.example.com. txt.example.com.",
            "example.com. 300 IN KX 10 kx.example.com.",
            "example.com. 300 IN CERT 1 12345 8 AQPSKmynfzW4kyBv015MUG2DeIQ3Cbl+BBZH4b/0PY1kxkmvHjcZc8nokfzj31GajIQKY+5CptLr3buXA10hWqTkF7H6RfoRqXQeogmMHfpftf6zMv1LyBUgia7za6ZEzOJBOztyvhjL742iU/TpPSEDhm2SNKLijfUppn1UaNvv4w==",
            "example.com. 300 IN NSEC3 1 0 12 aabbccdd 2vptu5timamqttgl4luu9kg21e0aor3s A RRSIG",
            "example.com. 300 IN NSEC3PARAM 1 0 12 aabbccdd",
            "example.com. 300 IN CSYNC 66 3 A NS AAAA",
            "example.com. 300 IN DHCID AAIBY2/AuCccgoJbsaxcQc9TUapptP69lOjxfNuVAA2kjEA=",
            "example.com. 300 IN IPSECKEY 10 1 2 192.0.2.38 AQNRU3mG7TVTO2BkR47usntb102uFJtugbo6BSGvgqt4AQ==",
            "example.com. 300 IN APL 1:192.168.32.0/21 !1:192.168.38.0/28",
            "example.com. 300 IN DNAME target.example.net.",
            "example.com. 300 IN PX 10 map822.example.com. mapx400.example.com.",
            "example.com. 300 IN AFSDB 1 afsdb.example.com.",
            "example.com. 300 IN WKS 192.0.2.1 6 21 23 25",
            "example.com. 300 IN NSAP 0x47000580ffff000000321099991111222233334444",
        ];

        for line in lines {
            let rr = ResourceRecord::from_zone_line(line, None)
                .unwrap_or_else(|e| panic!("failed to parse {line:?}: {e}"));
            let reparsed = ResourceRecord::from_zone_line(&rr.to_zone_line(), None)
                .unwrap_or_else(|e| panic!("failed to reparse {:?}: {e}", rr.to_zone_line()));
            assert_eq!(rr, reparsed, "line: {line}");
        }
    }

    #[test]
    fn transcript_roundtrip() {
        let mut query = Message::make_query(0x1234, question("com.", RecordType::NS));
        query.header.recursion_desired = true;
        let mut message = query.make_response();
        message.answers = vec![
            ns_record("com.", "a.gtld-servers.net."),
            ns_record("com.", "b.gtld-servers.net."),
        ];
        message.additional = vec![a_record("a.gtld-servers.net.", "192.5.6.30".parse().unwrap())];
        message.edns = Some(Edns {
            udp_payload_size: 4096,
            version: 0,
            flags: EDNS_FLAG_DO,
            options: vec![EdnsOption::Nsid {
                data: b"ns1".to_vec(),
            }],
        });

        let transcript = message.to_transcript();
        let parsed = Message::from_transcript(&transcript).unwrap();
        assert_eq!(message, parsed);
    }

    #[test]
    fn transcript_parses_the_dig_example() {
        let transcript = "\
; <<>> DiG 9.10.6 <<>> com. NS\n\
;; global options: +cmd\n\
;; Got answer:\n\
;; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 35713\n\
;; flags: qr rd ra; QUERY: 1, ANSWER: 2, AUTHORITY: 0, ADDITIONAL: 1\n\
\n\
;; OPT PSEUDOSECTION:\n\
; EDNS: version: 0, flags:; udp: 4096\n\
;; QUESTION SECTION:\n\
;com.\t\t\tIN\tNS\n\
\n\
;; ANSWER SECTION:\n\
com.\t\t172800\tIN\tNS\ta.gtld-servers.net.\n\
com.\t\t172800\tIN\tNS\tb.gtld-servers.net.\n\
\n\
;; Query time: 24 msec\n\
;; SERVER: 198.41.0.4#53(198.41.0.4)\n\
;; WHEN: Thu Aug 02 17:23:07 UTC 2018\n\
;; MSG SIZE  rcvd: 492\n";

        let message = Message::from_transcript(transcript).unwrap();
        assert_eq!(35713, message.header.id);
        assert!(message.header.is_response);
        assert!(message.header.recursion_desired);
        assert_eq!(Rcode::NoError, message.header.rcode);
        assert_eq!(1, message.questions.len());
        assert_eq!(2, message.answers.len());
        assert_eq!(
            ns_record("com.", "a.gtld-servers.net."),
            ResourceRecord {
                ttl: 300,
                ..message.answers[0].clone()
            }
        );
        assert_eq!(172_800, message.answers[0].ttl);
        assert_eq!(4096, message.edns.unwrap().udp_payload_size);
    }
}
