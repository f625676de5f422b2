//! Deserialisation of DNS messages from the network.  See the `types`
//! module for details of the format.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::bitmap::TypeBitmap;
use crate::protocol::options::EdnsOption;
use crate::protocol::rdata::{shape_of, AplItem, Gateway, RecordData, Shape};
use crate::protocol::types::*;

/// The most compression pointers a single name may chase.
pub const MAX_POINTERS: usize = 10;

impl Message {
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_octets(octets: &[u8]) -> Result<Self, Error> {
        let mut buffer = ConsumableBuffer::new(octets);
        let wire_header = WireHeader::deserialise(&mut buffer)?;
        let id = wire_header.header.id;

        let mut questions = Vec::with_capacity(wire_header.qdcount.into());
        let mut answers = Vec::with_capacity(wire_header.ancount.into());
        let mut authority = Vec::with_capacity(wire_header.nscount.into());
        let mut raw_additional = Vec::with_capacity(wire_header.arcount.into());

        for _ in 0..wire_header.qdcount {
            questions.push(Question::deserialise(id, &mut buffer)?);
        }

        // if the message is truncated, running out of bytes mid-record
        // is expected rather than fatal: keep what parsed and let the
        // caller retry over TCP.
        let mut exhausted_early = false;
        'sections: for (count, section) in [
            (wire_header.ancount, &mut answers),
            (wire_header.nscount, &mut authority),
            (wire_header.arcount, &mut raw_additional),
        ] {
            for _ in 0..count {
                match ResourceRecord::deserialise(id, &mut buffer) {
                    Ok(rr) => section.push(rr),
                    Err(error) => {
                        if wire_header.header.is_truncated && error.is_exhaustion() {
                            exhausted_early = true;
                            break 'sections;
                        }
                        return Err(error);
                    }
                }
            }
        }

        let mut header = wire_header.header;
        let mut edns = None;
        let mut tsig = None;
        let mut sig0 = None;
        let mut additional = Vec::with_capacity(raw_additional.len());

        // the first OPT promotes to the EDNS slot, wherever it sits;
        // RFC 6891 says there must be at most one, and a second stays
        // in the section where a consumer can notice it.
        for rr in raw_additional {
            if rr.rtype() == RecordType::OPT && edns.is_none() {
                let (promoted, extended_rcode) = Edns::from_opt_record(&rr);
                header.rcode = Rcode::from_parts(header.rcode.header_bits(), extended_rcode);
                edns = Some(promoted);
            } else {
                additional.push(rr);
            }
        }

        // TSIG must be the very last record; SIG(0) must be last
        // apart from that (RFC 8945 section 5.1, RFC 2931).
        if additional.last().map(ResourceRecord::rtype) == Some(RecordType::TSIG) {
            tsig = additional.pop();
        }
        if additional.last().is_some_and(is_sig0) {
            sig0 = additional.pop();
        }

        let trailing = if exhausted_early {
            Vec::new()
        } else {
            buffer.take_remaining().to_vec()
        };

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
            edns,
            tsig,
            sig0,
            size: octets.len(),
            trailing,
        })
    }
}

/// A SIG(0) is a SIG record over the whole message rather than an
/// RRset: owner name "." and type-covered 0.
fn is_sig0(rr: &ResourceRecord) -> bool {
    if let RecordData::Sig {
        tag: RecordType::SIG,
        type_covered,
        ..
    } = &rr.data
    {
        rr.name.is_root() && u16::from(*type_covered) == 0
    } else {
        false
    }
}

impl Edns {
    /// Decompose an OPT record (RFC 6891 section 6.1.2): the class
    /// field is the payload size, the TTL packs the extended-RCODE
    /// octet, the version, and the flags word.  Returns the struct
    /// and the extended-RCODE bits for splicing into the header.
    pub fn from_opt_record(rr: &ResourceRecord) -> (Self, u8) {
        let options = if let RecordData::Opt { options } = &rr.data {
            options.clone()
        } else {
            Vec::new()
        };

        let extended_rcode = (rr.ttl >> 24) as u8;
        let edns = Self {
            udp_payload_size: u16::from(rr.rclass),
            version: ((rr.ttl >> 16) & 0xFF) as u8,
            flags: (rr.ttl & 0xFFFF) as u16,
            options,
        };
        (edns, extended_rcode)
    }
}

impl WireHeader {
    /// # Errors
    ///
    /// If the header is too short.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let id = buffer.next_u16().ok_or(Error::CompletelyBusted)?;
        let flags = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let qdcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let ancount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let nscount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let arcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;

        Ok(Self {
            header: Header::from_flags_word(id, flags),
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}

impl Question {
    /// # Errors
    ///
    /// If the question cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let qtype = buffer.next_u16().ok_or(Error::QuestionTooShort(id))?;
        let qclass = buffer.next_u16().ok_or(Error::QuestionTooShort(id))?;

        Ok(Self {
            name,
            qtype: RecordType::from(qtype),
            qclass: RecordClass::from(qclass),
        })
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let rtype = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        let rclass = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        let ttl = buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?;
        let rdlength = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;

        let rdata_end = buffer.position + rdlength as usize;
        if rdata_end > buffer.limit {
            return Err(Error::ResourceRecordTooShort(id));
        }

        // rdata parses against a sub-reader bounded at rdlength, and
        // the parent is advanced to the boundary no matter what the
        // sub-reader consumed, so a record with short or overlong
        // rdata cannot desynchronise the rest of the message.
        let mut sub = buffer.sub_buffer(rdata_end);
        buffer.position = rdata_end;

        let data = RecordData::deserialise(RecordType::from(rtype), id, &mut sub)?;
        if sub.position != rdata_end {
            return Err(Error::ResourceRecordInvalid(id));
        }

        Ok(Self {
            name,
            data,
            rclass: RecordClass::from(rclass),
            ttl,
        })
    }
}

impl RecordData {
    /// Parse the rdata of a record of the given type.  The buffer
    /// must be bounded at the end of the rdata: several field kinds
    /// consume "the rest of the rdata".
    ///
    /// # Errors
    ///
    /// If the rdata cannot be parsed.
    pub fn deserialise(
        rtype: RecordType,
        id: u16,
        buffer: &mut ConsumableBuffer,
    ) -> Result<Self, Error> {
        let short = Error::ResourceRecordTooShort(id);
        let invalid = Error::ResourceRecordInvalid(id);

        let data = match shape_of(rtype) {
            Shape::A => RecordData::A {
                address: Ipv4Addr::from(buffer.next_u32().ok_or(short)?),
            },
            Shape::Aaaa => {
                let octets: [u8; 16] = buffer.take(16).ok_or(short)?.try_into().unwrap();
                RecordData::Aaaa {
                    address: Ipv6Addr::from(octets),
                }
            }
            Shape::Name => RecordData::Name {
                tag: rtype,
                name: DomainName::deserialise(id, buffer)?,
            },
            Shape::Soa => RecordData::Soa {
                mname: DomainName::deserialise(id, buffer)?,
                rname: DomainName::deserialise(id, buffer)?,
                serial: buffer.next_u32().ok_or(short)?,
                refresh: buffer.next_u32().ok_or(short)?,
                retry: buffer.next_u32().ok_or(short)?,
                expire: buffer.next_u32().ok_or(short)?,
                minimum: buffer.next_u32().ok_or(short)?,
            },
            Shape::NamePair => RecordData::NamePair {
                tag: rtype,
                first: DomainName::deserialise(id, buffer)?,
                second: DomainName::deserialise(id, buffer)?,
            },
            Shape::Exchange => RecordData::Exchange {
                tag: rtype,
                preference: buffer.next_u16().ok_or(short)?,
                exchange: DomainName::deserialise(id, buffer)?,
            },
            Shape::Strings => {
                let mut strings = Vec::new();
                while buffer.remaining() > 0 {
                    strings.push(buffer.take_character_string().ok_or(short)?.to_vec());
                }
                if strings.is_empty() {
                    return Err(invalid);
                }
                RecordData::Strings {
                    tag: rtype,
                    strings,
                }
            }
            Shape::Wks => RecordData::Wks {
                address: Ipv4Addr::from(buffer.next_u32().ok_or(short)?),
                protocol: buffer.next_u8().ok_or(short)?,
                bitmap: buffer.take_remaining().to_vec(),
            },
            Shape::Opaque => RecordData::Opaque {
                tag: rtype,
                octets: buffer.take_remaining().to_vec(),
            },
            Shape::Srv => RecordData::Srv {
                priority: buffer.next_u16().ok_or(short)?,
                weight: buffer.next_u16().ok_or(short)?,
                port: buffer.next_u16().ok_or(short)?,
                target: DomainName::deserialise(id, buffer)?,
            },
            Shape::Naptr => RecordData::Naptr {
                order: buffer.next_u16().ok_or(short)?,
                preference: buffer.next_u16().ok_or(short)?,
                flags: buffer.take_character_string().ok_or(short)?.to_vec(),
                services: buffer.take_character_string().ok_or(short)?.to_vec(),
                regexp: buffer.take_character_string().ok_or(short)?.to_vec(),
                replacement: DomainName::deserialise(id, buffer)?,
            },
            Shape::Px => RecordData::Px {
                preference: buffer.next_u16().ok_or(short)?,
                map822: DomainName::deserialise(id, buffer)?,
                mapx400: DomainName::deserialise(id, buffer)?,
            },
            Shape::Loc => RecordData::Loc {
                version: buffer.next_u8().ok_or(short)?,
                size: buffer.next_u8().ok_or(short)?,
                horizontal_precision: buffer.next_u8().ok_or(short)?,
                vertical_precision: buffer.next_u8().ok_or(short)?,
                latitude: buffer.next_u32().ok_or(short)?,
                longitude: buffer.next_u32().ok_or(short)?,
                altitude: buffer.next_u32().ok_or(short)?,
            },
            Shape::Sig => RecordData::Sig {
                tag: rtype,
                type_covered: RecordType::from(buffer.next_u16().ok_or(short)?),
                algorithm: buffer.next_u8().ok_or(short)?,
                labels: buffer.next_u8().ok_or(short)?,
                original_ttl: buffer.next_u32().ok_or(short)?,
                expiration: buffer.next_u32().ok_or(short)?,
                inception: buffer.next_u32().ok_or(short)?,
                key_tag: buffer.next_u16().ok_or(short)?,
                signer: DomainName::deserialise(id, buffer)?,
                signature: buffer.take_remaining().to_vec(),
            },
            Shape::Key => RecordData::Key {
                tag: rtype,
                flags: buffer.next_u16().ok_or(short)?,
                protocol: buffer.next_u8().ok_or(short)?,
                algorithm: buffer.next_u8().ok_or(short)?,
                public_key: buffer.take_remaining().to_vec(),
            },
            Shape::Ds => RecordData::Ds {
                tag: rtype,
                key_tag: buffer.next_u16().ok_or(short)?,
                algorithm: buffer.next_u8().ok_or(short)?,
                digest_type: buffer.next_u8().ok_or(short)?,
                digest: buffer.take_remaining().to_vec(),
            },
            Shape::Nxt => RecordData::Nxt {
                next: DomainName::deserialise(id, buffer)?,
                bitmap: buffer.take_remaining().to_vec(),
            },
            Shape::Nsec => RecordData::Nsec {
                next: DomainName::deserialise(id, buffer)?,
                types: TypeBitmap::from_octets(buffer.take_remaining()).ok_or(invalid)?,
            },
            Shape::Nsec3 => {
                let hash_algorithm = buffer.next_u8().ok_or(short)?;
                let flags = buffer.next_u8().ok_or(short)?;
                let iterations = buffer.next_u16().ok_or(short)?;
                let salt_length = buffer.next_u8().ok_or(short)?;
                let salt = buffer.take(salt_length as usize).ok_or(short)?.to_vec();
                let hash_length = buffer.next_u8().ok_or(short)?;
                let next_hashed = buffer.take(hash_length as usize).ok_or(short)?.to_vec();
                RecordData::Nsec3 {
                    hash_algorithm,
                    flags,
                    iterations,
                    salt,
                    next_hashed,
                    types: TypeBitmap::from_octets(buffer.take_remaining()).ok_or(invalid)?,
                }
            }
            Shape::Nsec3Param => {
                let hash_algorithm = buffer.next_u8().ok_or(short)?;
                let flags = buffer.next_u8().ok_or(short)?;
                let iterations = buffer.next_u16().ok_or(short)?;
                let salt_length = buffer.next_u8().ok_or(short)?;
                RecordData::Nsec3Param {
                    hash_algorithm,
                    flags,
                    iterations,
                    salt: buffer.take(salt_length as usize).ok_or(short)?.to_vec(),
                }
            }
            Shape::Cert => RecordData::Cert {
                cert_type: buffer.next_u16().ok_or(short)?,
                key_tag: buffer.next_u16().ok_or(short)?,
                algorithm: buffer.next_u8().ok_or(short)?,
                certificate: buffer.take_remaining().to_vec(),
            },
            Shape::Sshfp => RecordData::Sshfp {
                algorithm: buffer.next_u8().ok_or(short)?,
                fingerprint_type: buffer.next_u8().ok_or(short)?,
                fingerprint: buffer.take_remaining().to_vec(),
            },
            Shape::Tlsa => RecordData::Tlsa {
                tag: rtype,
                usage: buffer.next_u8().ok_or(short)?,
                selector: buffer.next_u8().ok_or(short)?,
                matching_type: buffer.next_u8().ok_or(short)?,
                certificate_data: buffer.take_remaining().to_vec(),
            },
            Shape::Ipseckey => {
                let precedence = buffer.next_u8().ok_or(short)?;
                let gateway_type = buffer.next_u8().ok_or(short)?;
                let algorithm = buffer.next_u8().ok_or(short)?;
                let gateway = match gateway_type {
                    0 => Gateway::None,
                    1 => Gateway::Ipv4(Ipv4Addr::from(buffer.next_u32().ok_or(short)?)),
                    2 => {
                        let octets: [u8; 16] =
                            buffer.take(16).ok_or(short)?.try_into().unwrap();
                        Gateway::Ipv6(Ipv6Addr::from(octets))
                    }
                    3 => Gateway::Name(DomainName::deserialise(id, buffer)?),
                    _ => return Err(invalid),
                };
                RecordData::Ipseckey {
                    precedence,
                    algorithm,
                    gateway,
                    public_key: buffer.take_remaining().to_vec(),
                }
            }
            Shape::Hip => {
                let hit_length = buffer.next_u8().ok_or(short)?;
                let algorithm = buffer.next_u8().ok_or(short)?;
                let pk_length = buffer.next_u16().ok_or(short)?;
                let hit = buffer.take(hit_length as usize).ok_or(short)?.to_vec();
                let public_key = buffer.take(pk_length as usize).ok_or(short)?.to_vec();
                let mut servers = Vec::new();
                while buffer.remaining() > 0 {
                    servers.push(DomainName::deserialise(id, buffer)?);
                }
                RecordData::Hip {
                    algorithm,
                    hit,
                    public_key,
                    servers,
                }
            }
            Shape::Csync => RecordData::Csync {
                serial: buffer.next_u32().ok_or(short)?,
                flags: buffer.next_u16().ok_or(short)?,
                types: TypeBitmap::from_octets(buffer.take_remaining()).ok_or(invalid)?,
            },
            Shape::Caa => {
                let flags = buffer.next_u8().ok_or(short)?;
                let tag_string = buffer.take_character_string().ok_or(short)?.to_vec();
                if tag_string.is_empty() {
                    return Err(invalid);
                }
                RecordData::Caa {
                    flags,
                    tag_string,
                    value: buffer.take_remaining().to_vec(),
                }
            }
            Shape::Uri => RecordData::Uri {
                priority: buffer.next_u16().ok_or(short)?,
                weight: buffer.next_u16().ok_or(short)?,
                target: buffer.take_remaining().to_vec(),
            },
            Shape::Nid => RecordData::Nid {
                preference: buffer.next_u16().ok_or(short)?,
                node_id: buffer.next_u64().ok_or(short)?,
            },
            Shape::L32 => RecordData::L32 {
                preference: buffer.next_u16().ok_or(short)?,
                locator: Ipv4Addr::from(buffer.next_u32().ok_or(short)?),
            },
            Shape::L64 => RecordData::L64 {
                preference: buffer.next_u16().ok_or(short)?,
                locator: buffer.next_u64().ok_or(short)?,
            },
            Shape::Lp => RecordData::Lp {
                preference: buffer.next_u16().ok_or(short)?,
                fqdn: DomainName::deserialise(id, buffer)?,
            },
            Shape::Eui48 => RecordData::Eui48 {
                address: buffer.take(6).ok_or(short)?.try_into().unwrap(),
            },
            Shape::Eui64 => RecordData::Eui64 {
                address: buffer.take(8).ok_or(short)?.try_into().unwrap(),
            },
            Shape::A6 => {
                let prefix_length = buffer.next_u8().ok_or(short)?;
                if prefix_length > 128 {
                    return Err(invalid);
                }
                let suffix_len = (128 - usize::from(prefix_length)).div_ceil(8);
                let mut octets = [0; 16];
                octets[16 - suffix_len..].copy_from_slice(buffer.take(suffix_len).ok_or(short)?);
                let prefix_name = if prefix_length == 0 {
                    None
                } else {
                    Some(DomainName::deserialise(id, buffer)?)
                };
                RecordData::A6 {
                    prefix_length,
                    suffix: Ipv6Addr::from(octets),
                    prefix_name,
                }
            }
            Shape::Apl => {
                let mut items = Vec::new();
                while buffer.remaining() > 0 {
                    let family = buffer.next_u16().ok_or(short)?;
                    let prefix = buffer.next_u8().ok_or(short)?;
                    let n_and_length = buffer.next_u8().ok_or(short)?;
                    let negate = n_and_length & 0b1000_0000 != 0;
                    let length = (n_and_length & 0b0111_1111) as usize;
                    items.push(AplItem {
                        family,
                        prefix,
                        negate,
                        address: buffer.take(length).ok_or(short)?.to_vec(),
                    });
                }
                RecordData::Apl { items }
            }
            Shape::Opt => RecordData::Opt {
                options: EdnsOption::parse_all(buffer.take_remaining()).ok_or(invalid)?,
            },
            Shape::Tsig => {
                let algorithm = DomainName::deserialise(id, buffer)?;
                let time_signed = buffer.next_u48().ok_or(short)?;
                let fudge = buffer.next_u16().ok_or(short)?;
                let mac_size = buffer.next_u16().ok_or(short)?;
                let mac = buffer.take(mac_size as usize).ok_or(short)?.to_vec();
                let original_id = buffer.next_u16().ok_or(short)?;
                let error = buffer.next_u16().ok_or(short)?;
                let other_len = buffer.next_u16().ok_or(short)?;
                RecordData::Tsig {
                    algorithm,
                    time_signed,
                    fudge,
                    mac,
                    original_id,
                    error,
                    other: buffer.take(other_len as usize).ok_or(short)?.to_vec(),
                }
            }
            Shape::Tkey => {
                let algorithm = DomainName::deserialise(id, buffer)?;
                let inception = buffer.next_u32().ok_or(short)?;
                let expiration = buffer.next_u32().ok_or(short)?;
                let mode = buffer.next_u16().ok_or(short)?;
                let error = buffer.next_u16().ok_or(short)?;
                let key_size = buffer.next_u16().ok_or(short)?;
                let key = buffer.take(key_size as usize).ok_or(short)?.to_vec();
                let other_size = buffer.next_u16().ok_or(short)?;
                RecordData::Tkey {
                    algorithm,
                    inception,
                    expiration,
                    mode,
                    error,
                    key,
                    other: buffer.take(other_size as usize).ok_or(short)?.to_vec(),
                }
            }
            Shape::Doa => RecordData::Doa {
                enterprise: buffer.next_u32().ok_or(short)?,
                doa_type: buffer.next_u32().ok_or(short)?,
                location: buffer.next_u8().ok_or(short)?,
                media_type: buffer.take_character_string().ok_or(short)?.to_vec(),
                data: buffer.take_remaining().to_vec(),
            },
            Shape::Unknown => RecordData::Unknown {
                tag: rtype,
                octets: buffer.take_remaining().to_vec(),
            },
        };

        Ok(data)
    }
}

impl DomainName {
    /// # Errors
    ///
    /// If the domain cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let full = buffer.octets;
        let mut position = buffer.position;
        // direct reads respect the rdata boundary; after a jump the
        // target is earlier message data, bounded only by the message
        let mut bound = buffer.limit;
        let mut return_position = None;
        let mut jumps = 0;
        let mut wire_len = 0;
        let mut labels = Vec::with_capacity(5);

        loop {
            if position >= bound {
                return Err(Error::DomainTooShort(id));
            }
            let size = full[position];

            match size & 0b1100_0000 {
                0b0000_0000 => {
                    position += 1;
                    wire_len += 1 + usize::from(size);
                    if wire_len > DOMAINNAME_MAX_LEN {
                        return Err(Error::DomainTooLong(id));
                    }

                    if size == 0 {
                        labels.push(Vec::new());
                        break;
                    }

                    if position + usize::from(size) > bound {
                        return Err(Error::DomainTooShort(id));
                    }
                    labels.push(full[position..position + usize::from(size)].to_vec());
                    position += usize::from(size);
                }
                0b1100_0000 => {
                    if position + 1 >= bound {
                        return Err(Error::DomainTooShort(id));
                    }
                    let target = usize::from(u16::from_be_bytes([
                        size & 0b0011_1111,
                        full[position + 1],
                    ]));

                    // a pointer must reference strictly earlier data
                    // (RFC 1035 section 4.1.4), and a bounded number
                    // of them stops any remaining shenanigans
                    if target >= position {
                        return Err(Error::DomainPointerInvalid(id));
                    }
                    jumps += 1;
                    if jumps > MAX_POINTERS {
                        return Err(Error::DomainPointerInvalid(id));
                    }

                    if return_position.is_none() {
                        return_position = Some(position + 2);
                    }
                    position = target;
                    bound = full.len();
                }
                _ => return Err(Error::DomainLabelInvalid(id)),
            }
        }

        buffer.position = return_position.unwrap_or(position);

        match DomainName::from_labels_with_root(labels) {
            Some(name) => Ok(name),
            None => Err(Error::DomainLabelInvalid(id)),
        }
    }
}

/// Errors encountered when parsing a datagram.  In all the errors
/// which have a `u16` parameter, that is the ID from the header - so
/// that an error response can be sent.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The datagram is not even 2 octets long, so it doesn't even
    /// contain a valid ID.  An error cannot even be sent back to the
    /// client in this case as, without an ID, it cannot be linked
    /// with the correct query.
    CompletelyBusted,

    /// The header is missing one or more required fields.
    HeaderTooShort(u16),

    /// A question ends with an incomplete field.
    QuestionTooShort(u16),

    /// A resource record ends with an incomplete field.
    ResourceRecordTooShort(u16),

    /// A resource record is the wrong format.
    ResourceRecordInvalid(u16),

    /// A domain is incomplete.
    DomainTooShort(u16),

    /// A domain is over 255 octets in size.
    DomainTooLong(u16),

    /// A domain pointer points forwards, at itself, or through too
    /// many other pointers.
    DomainPointerInvalid(u16),

    /// A domain label has the reserved `10` or `01` high bits.
    DomainLabelInvalid(u16),
}

impl Error {
    pub fn id(self) -> Option<u16> {
        match self {
            Error::CompletelyBusted => None,
            Error::HeaderTooShort(id)
            | Error::QuestionTooShort(id)
            | Error::ResourceRecordTooShort(id)
            | Error::ResourceRecordInvalid(id)
            | Error::DomainTooShort(id)
            | Error::DomainTooLong(id)
            | Error::DomainPointerInvalid(id)
            | Error::DomainLabelInvalid(id) => Some(id),
        }
    }

    /// Whether this error means the data simply stopped early, which
    /// a truncated message is allowed to do.
    pub fn is_exhaustion(self) -> bool {
        matches!(
            self,
            Error::ResourceRecordTooShort(_) | Error::DomainTooShort(_)
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CompletelyBusted => write!(f, "datagram too short to contain an ID"),
            Error::HeaderTooShort(id) => write!(f, "[{id}] header too short"),
            Error::QuestionTooShort(id) => write!(f, "[{id}] question too short"),
            Error::ResourceRecordTooShort(id) => write!(f, "[{id}] resource record too short"),
            Error::ResourceRecordInvalid(id) => write!(f, "[{id}] resource record invalid"),
            Error::DomainTooShort(id) => write!(f, "[{id}] domain name too short"),
            Error::DomainTooLong(id) => write!(f, "[{id}] domain name too long"),
            Error::DomainPointerInvalid(id) => write!(f, "[{id}] domain pointer invalid"),
            Error::DomainLabelInvalid(id) => write!(f, "[{id}] domain label invalid"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which will be consumed by the parsing process.
///
/// `limit` bounds direct reads: a sub-buffer over a record's rdata
/// has its limit at the end of the rdata, while still sharing the
/// whole message for compression-pointer chasing.
pub struct ConsumableBuffer<'a> {
    octets: &'a [u8],
    pub position: usize,
    limit: usize,
}

impl<'a> ConsumableBuffer<'a> {
    pub fn new(octets: &'a [u8]) -> Self {
        Self {
            octets,
            position: 0,
            limit: octets.len(),
        }
    }

    /// A reader over the same octets, bounded at `end`, starting
    /// where this one is.
    pub fn sub_buffer(&self, end: usize) -> ConsumableBuffer<'a> {
        Self {
            octets: self.octets,
            position: self.position,
            limit: end.min(self.octets.len()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.position)
    }

    pub fn next_u8(&mut self) -> Option<u8> {
        if self.remaining() >= 1 {
            let a = self.octets[self.position];
            self.position += 1;
            Some(a)
        } else {
            None
        }
    }

    pub fn next_u16(&mut self) -> Option<u16> {
        let octets = self.take(2)?;
        Some(u16::from_be_bytes(octets.try_into().unwrap()))
    }

    pub fn next_u32(&mut self) -> Option<u32> {
        let octets = self.take(4)?;
        Some(u32::from_be_bytes(octets.try_into().unwrap()))
    }

    pub fn next_u48(&mut self) -> Option<u64> {
        let octets = self.take(6)?;
        let mut padded = [0; 8];
        padded[2..].copy_from_slice(octets);
        Some(u64::from_be_bytes(padded))
    }

    pub fn next_u64(&mut self) -> Option<u64> {
        let octets = self.take(8)?;
        Some(u64::from_be_bytes(octets.try_into().unwrap()))
    }

    pub fn take(&mut self, size: usize) -> Option<&'a [u8]> {
        if self.remaining() >= size {
            let slice = &self.octets[self.position..self.position + size];
            self.position += size;
            Some(slice)
        } else {
            None
        }
    }

    /// A length-prefixed character-string (RFC 1035 section 3.3).
    pub fn take_character_string(&mut self) -> Option<&'a [u8]> {
        let length = self.next_u8()?;
        self.take(length as usize)
    }

    pub fn take_remaining(&mut self) -> &'a [u8] {
        let slice = &self.octets[self.position..self.limit];
        self.position = self.limit;
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    #[test]
    fn deserialise_name_with_pointer() {
        #[rustfmt::skip]
        let octets = [
            3, b'w', b'w', b'w',
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e',
            3, b'c', b'o', b'm',
            0,
            // "mail" + pointer to "example.com."
            4, b'm', b'a', b'i', b'l',
            0b1100_0000, 4,
        ];

        let mut buffer = ConsumableBuffer::new(&octets);
        assert_eq!(
            Ok(domain("www.example.com.")),
            DomainName::deserialise(0, &mut buffer)
        );
        assert_eq!(
            Ok(domain("mail.example.com.")),
            DomainName::deserialise(0, &mut buffer)
        );
        assert_eq!(octets.len(), buffer.position);
    }

    #[test]
    fn deserialise_name_rejects_forward_pointer() {
        let octets = [0b1100_0000, 4, 0];
        let mut buffer = ConsumableBuffer::new(&octets);
        assert_eq!(
            Err(Error::DomainPointerInvalid(0)),
            DomainName::deserialise(0, &mut buffer)
        );
    }

    #[test]
    fn deserialise_name_rejects_self_pointer() {
        let octets = [0, 0b1100_0000, 1];
        let mut buffer = ConsumableBuffer::new(&octets);
        buffer.position = 1;
        assert_eq!(
            Err(Error::DomainPointerInvalid(0)),
            DomainName::deserialise(0, &mut buffer)
        );
    }

    #[test]
    fn deserialise_name_rejects_pointer_chain() {
        // each pointer points at the one before it: backwards, so the
        // per-pointer check passes, but there are more than ten
        let mut octets = vec![0];
        for i in 0..12u8 {
            octets.push(0b1100_0000);
            octets.push(if i == 0 { 0 } else { 2 * i - 1 });
        }
        let start = octets.len() - 2;

        let mut buffer = ConsumableBuffer::new(&octets);
        buffer.position = start;
        assert_eq!(
            Err(Error::DomainPointerInvalid(0)),
            DomainName::deserialise(0, &mut buffer)
        );
    }

    #[test]
    fn deserialise_name_rejects_reserved_label_bits() {
        for high in [0b1000_0000u8, 0b0100_0000] {
            let octets = [high | 1, b'x', 0];
            let mut buffer = ConsumableBuffer::new(&octets);
            assert_eq!(
                Err(Error::DomainLabelInvalid(0)),
                DomainName::deserialise(0, &mut buffer)
            );
        }
    }

    #[test]
    fn deserialise_name_rejects_overlong() {
        // four 63-octet labels: 4 * 64 + 1 = 257 octets
        let mut octets = Vec::new();
        for _ in 0..4 {
            octets.push(63);
            octets.extend_from_slice(&[b'x'; 63]);
        }
        octets.push(0);

        let mut buffer = ConsumableBuffer::new(&octets);
        assert_eq!(
            Err(Error::DomainTooLong(0)),
            DomainName::deserialise(0, &mut buffer)
        );
    }

    #[test]
    fn deserialise_rdata_is_bounded() {
        // an MX whose rdlength cuts the exchange name short
        #[rustfmt::skip]
        let octets = [
            0,                      // name "."
            0, 15,                  // MX
            0, 1,                   // IN
            0, 0, 0, 0,             // TTL
            0, 4,                   // RDLENGTH: too short
            0, 10,                  // preference
            3, b'w', b'w', b'w', 0, // exchange, extending past rdlength
        ];
        let mut buffer = ConsumableBuffer::new(&octets);
        assert!(ResourceRecord::deserialise(0, &mut buffer).is_err());
    }

    #[test]
    fn deserialise_rdata_overlong_is_detected() {
        // a correct A record, but with rdlength 6 instead of 4
        #[rustfmt::skip]
        let octets = [
            0,
            0, 1,                   // A
            0, 1,                   // IN
            0, 0, 0, 0,             // TTL
            0, 6,                   // RDLENGTH
            192, 0, 2, 1, 0, 0,
        ];
        let mut buffer = ConsumableBuffer::new(&octets);
        assert_eq!(
            Err(Error::ResourceRecordInvalid(0)),
            ResourceRecord::deserialise(0, &mut buffer)
        );
    }
}
