//! EDNS option framing (RFC 6891 section 6.1.2).
//!
//! The RDATA of an OPT record is a sequence of options:
//!
//! ```text
//!     +0 (MSB)                            +1 (LSB)
//!     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!     |                          OPTION-CODE                          |
//!     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!     |                         OPTION-LENGTH                         |
//!     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!     |                                                               |
//!     /                          OPTION-DATA                          /
//!     /                                                               /
//!     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! Known codes decode to typed variants; codes in the local-use range
//! 65001 to 65534 become `Local`; anything else becomes `Unknown`.
//! An option whose data does not parse as its code demands is also
//! kept as `Unknown` rather than rejected, so that a message with a
//! malformed option still round-trips.

use crate::protocol::types::DomainName;

pub const OPTION_CODE_LLQ: u16 = 1;
pub const OPTION_CODE_UL: u16 = 2;
pub const OPTION_CODE_NSID: u16 = 3;
pub const OPTION_CODE_DAU: u16 = 5;
pub const OPTION_CODE_DHU: u16 = 6;
pub const OPTION_CODE_N3U: u16 = 7;
pub const OPTION_CODE_SUBNET: u16 = 8;
pub const OPTION_CODE_EXPIRE: u16 = 9;
pub const OPTION_CODE_COOKIE: u16 = 10;
pub const OPTION_CODE_TCP_KEEPALIVE: u16 = 11;
pub const OPTION_CODE_PADDING: u16 = 12;
pub const OPTION_CODE_CHAIN: u16 = 13;
pub const OPTION_CODE_KEY_TAG: u16 = 14;

pub const OPTION_CODE_LOCAL_MIN: u16 = 65001;
pub const OPTION_CODE_LOCAL_MAX: u16 = 65534;

/// A single EDNS option.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EdnsOption {
    /// Long-lived queries (RFC 8764).
    Llq {
        version: u16,
        llq_opcode: u16,
        error: u16,
        id: u64,
        lease: u32,
    },

    /// Dynamic DNS update lease (draft-sekar-dns-ul).
    Ul { lease: u32 },

    /// Name server identifier (RFC 5001).
    Nsid { data: Vec<u8> },

    /// DNSSEC algorithm understood (RFC 6975).
    Dau { algorithms: Vec<u8> },

    /// DS hash understood (RFC 6975).
    Dhu { algorithms: Vec<u8> },

    /// NSEC3 hash understood (RFC 6975).
    N3u { algorithms: Vec<u8> },

    /// Client subnet (RFC 7871).  `address` holds only the
    /// `source_prefix_length`-covering octets, as on the wire.
    Subnet {
        family: u16,
        source_prefix_length: u8,
        scope_prefix_length: u8,
        address: Vec<u8>,
    },

    /// Zone expiry (RFC 7314).  Empty in queries.
    Expire { expire: Option<u32> },

    /// DNS cookies (RFC 7873).
    Cookie {
        client: [u8; 8],
        server: Option<Vec<u8>>,
    },

    /// Idle timeout for TCP connections, in 100ms units (RFC 7828).
    /// Empty in queries.
    TcpKeepalive { timeout: Option<u16> },

    /// Message padding (RFC 7830).  The content is required to be
    /// zeros but is preserved as received.
    Padding { octets: Vec<u8> },

    /// DNSSEC trust chain query (RFC 7901).  The name is never
    /// compressed.
    Chain { closest_trust_point: DomainName },

    /// DNSKEY tags the client already trusts (RFC 8145).
    KeyTag { tags: Vec<u16> },

    /// An option in the local-use code range.
    Local { code: u16, data: Vec<u8> },

    /// Any other option.
    Unknown { code: u16, data: Vec<u8> },
}

impl EdnsOption {
    pub fn code(&self) -> u16 {
        match self {
            EdnsOption::Llq { .. } => OPTION_CODE_LLQ,
            EdnsOption::Ul { .. } => OPTION_CODE_UL,
            EdnsOption::Nsid { .. } => OPTION_CODE_NSID,
            EdnsOption::Dau { .. } => OPTION_CODE_DAU,
            EdnsOption::Dhu { .. } => OPTION_CODE_DHU,
            EdnsOption::N3u { .. } => OPTION_CODE_N3U,
            EdnsOption::Subnet { .. } => OPTION_CODE_SUBNET,
            EdnsOption::Expire { .. } => OPTION_CODE_EXPIRE,
            EdnsOption::Cookie { .. } => OPTION_CODE_COOKIE,
            EdnsOption::TcpKeepalive { .. } => OPTION_CODE_TCP_KEEPALIVE,
            EdnsOption::Padding { .. } => OPTION_CODE_PADDING,
            EdnsOption::Chain { .. } => OPTION_CODE_CHAIN,
            EdnsOption::KeyTag { .. } => OPTION_CODE_KEY_TAG,
            EdnsOption::Local { code, .. } | EdnsOption::Unknown { code, .. } => *code,
        }
    }

    /// The length of the option data, not counting the 4-octet
    /// code-and-length prefix.
    pub fn data_len(&self) -> usize {
        match self {
            EdnsOption::Llq { .. } => 18,
            EdnsOption::Ul { .. } => 4,
            EdnsOption::Nsid { data } => data.len(),
            EdnsOption::Dau { algorithms }
            | EdnsOption::Dhu { algorithms }
            | EdnsOption::N3u { algorithms } => algorithms.len(),
            EdnsOption::Subnet { address, .. } => 4 + address.len(),
            EdnsOption::Expire { expire } => {
                if expire.is_some() {
                    4
                } else {
                    0
                }
            }
            EdnsOption::Cookie { server, .. } => {
                8 + server.as_ref().map_or(0, Vec::len)
            }
            EdnsOption::TcpKeepalive { timeout } => {
                if timeout.is_some() {
                    2
                } else {
                    0
                }
            }
            EdnsOption::Padding { octets } => octets.len(),
            EdnsOption::Chain {
                closest_trust_point,
            } => closest_trust_point.wire_len(),
            EdnsOption::KeyTag { tags } => tags.len() * 2,
            EdnsOption::Local { data, .. } | EdnsOption::Unknown { data, .. } => data.len(),
        }
    }

    /// The full wire length, including the prefix.
    pub fn wire_len(&self) -> usize {
        4 + self.data_len()
    }

    /// Append the wire encoding, prefix included.
    pub fn to_octets(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.code().to_be_bytes());
        out.extend_from_slice(&(self.data_len() as u16).to_be_bytes());

        match self {
            EdnsOption::Llq {
                version,
                llq_opcode,
                error,
                id,
                lease,
            } => {
                out.extend_from_slice(&version.to_be_bytes());
                out.extend_from_slice(&llq_opcode.to_be_bytes());
                out.extend_from_slice(&error.to_be_bytes());
                out.extend_from_slice(&id.to_be_bytes());
                out.extend_from_slice(&lease.to_be_bytes());
            }
            EdnsOption::Ul { lease } => out.extend_from_slice(&lease.to_be_bytes()),
            EdnsOption::Nsid { data } => out.extend_from_slice(data),
            EdnsOption::Dau { algorithms }
            | EdnsOption::Dhu { algorithms }
            | EdnsOption::N3u { algorithms } => out.extend_from_slice(algorithms),
            EdnsOption::Subnet {
                family,
                source_prefix_length,
                scope_prefix_length,
                address,
            } => {
                out.extend_from_slice(&family.to_be_bytes());
                out.push(*source_prefix_length);
                out.push(*scope_prefix_length);
                out.extend_from_slice(address);
            }
            EdnsOption::Expire { expire } => {
                if let Some(expire) = expire {
                    out.extend_from_slice(&expire.to_be_bytes());
                }
            }
            EdnsOption::Cookie { client, server } => {
                out.extend_from_slice(client);
                if let Some(server) = server {
                    out.extend_from_slice(server);
                }
            }
            EdnsOption::TcpKeepalive { timeout } => {
                if let Some(timeout) = timeout {
                    out.extend_from_slice(&timeout.to_be_bytes());
                }
            }
            EdnsOption::Padding { octets } => out.extend_from_slice(octets),
            EdnsOption::Chain {
                closest_trust_point,
            } => {
                for label in &closest_trust_point.labels {
                    out.push(label.len() as u8);
                    out.extend_from_slice(label);
                }
            }
            EdnsOption::KeyTag { tags } => {
                for tag in tags {
                    out.extend_from_slice(&tag.to_be_bytes());
                }
            }
            EdnsOption::Local { data, .. } | EdnsOption::Unknown { data, .. } => {
                out.extend_from_slice(data);
            }
        }
    }

    /// Parse a whole option sequence, as found in OPT RDATA.  `None`
    /// if the tag-length-value framing itself is broken.
    pub fn parse_all(octets: &[u8]) -> Option<Vec<EdnsOption>> {
        let mut options = Vec::new();
        let mut position = 0;

        while position < octets.len() {
            if position + 4 > octets.len() {
                return None;
            }
            let code = u16::from_be_bytes([octets[position], octets[position + 1]]);
            let length = u16::from_be_bytes([octets[position + 2], octets[position + 3]]) as usize;
            position += 4;

            if position + length > octets.len() {
                return None;
            }
            let data = &octets[position..position + length];
            position += length;

            options.push(Self::parse_one(code, data));
        }

        Some(options)
    }

    /// Dispatch a single option on its code.  Data which does not
    /// parse for a known code falls back to `Unknown`.
    pub(crate) fn parse_one(code: u16, data: &[u8]) -> EdnsOption {
        let unknown = || EdnsOption::Unknown {
            code,
            data: data.to_vec(),
        };

        match code {
            OPTION_CODE_LLQ => {
                if data.len() == 18 {
                    EdnsOption::Llq {
                        version: u16::from_be_bytes([data[0], data[1]]),
                        llq_opcode: u16::from_be_bytes([data[2], data[3]]),
                        error: u16::from_be_bytes([data[4], data[5]]),
                        id: u64::from_be_bytes(data[6..14].try_into().unwrap()),
                        lease: u32::from_be_bytes(data[14..18].try_into().unwrap()),
                    }
                } else {
                    unknown()
                }
            }
            OPTION_CODE_UL => {
                if data.len() == 4 {
                    EdnsOption::Ul {
                        lease: u32::from_be_bytes(data.try_into().unwrap()),
                    }
                } else {
                    unknown()
                }
            }
            OPTION_CODE_NSID => EdnsOption::Nsid {
                data: data.to_vec(),
            },
            OPTION_CODE_DAU => EdnsOption::Dau {
                algorithms: data.to_vec(),
            },
            OPTION_CODE_DHU => EdnsOption::Dhu {
                algorithms: data.to_vec(),
            },
            OPTION_CODE_N3U => EdnsOption::N3u {
                algorithms: data.to_vec(),
            },
            OPTION_CODE_SUBNET => {
                if data.len() >= 4 {
                    EdnsOption::Subnet {
                        family: u16::from_be_bytes([data[0], data[1]]),
                        source_prefix_length: data[2],
                        scope_prefix_length: data[3],
                        address: data[4..].to_vec(),
                    }
                } else {
                    unknown()
                }
            }
            OPTION_CODE_EXPIRE => match data.len() {
                0 => EdnsOption::Expire { expire: None },
                4 => EdnsOption::Expire {
                    expire: Some(u32::from_be_bytes(data.try_into().unwrap())),
                },
                _ => unknown(),
            },
            OPTION_CODE_COOKIE => {
                if data.len() == 8 {
                    EdnsOption::Cookie {
                        client: data.try_into().unwrap(),
                        server: None,
                    }
                } else if (16..=40).contains(&data.len()) {
                    EdnsOption::Cookie {
                        client: data[..8].try_into().unwrap(),
                        server: Some(data[8..].to_vec()),
                    }
                } else {
                    unknown()
                }
            }
            OPTION_CODE_TCP_KEEPALIVE => match data.len() {
                0 => EdnsOption::TcpKeepalive { timeout: None },
                2 => EdnsOption::TcpKeepalive {
                    timeout: Some(u16::from_be_bytes([data[0], data[1]])),
                },
                _ => unknown(),
            },
            OPTION_CODE_PADDING => EdnsOption::Padding {
                octets: data.to_vec(),
            },
            OPTION_CODE_CHAIN => match parse_uncompressed_name(data) {
                Some(name) => EdnsOption::Chain {
                    closest_trust_point: name,
                },
                None => unknown(),
            },
            OPTION_CODE_KEY_TAG => {
                if data.len() % 2 == 0 {
                    EdnsOption::KeyTag {
                        tags: data
                            .chunks_exact(2)
                            .map(|c| u16::from_be_bytes([c[0], c[1]]))
                            .collect(),
                    }
                } else {
                    unknown()
                }
            }
            OPTION_CODE_LOCAL_MIN..=OPTION_CODE_LOCAL_MAX => EdnsOption::Local {
                code,
                data: data.to_vec(),
            },
            _ => unknown(),
        }
    }
}

/// Parse a name which must be uncompressed and must consume the whole
/// slice.  Options cannot contain compression pointers: there is no
/// enclosing message to point into.
fn parse_uncompressed_name(data: &[u8]) -> Option<DomainName> {
    let mut labels = Vec::new();
    let mut position = 0;

    loop {
        let size = *data.get(position)?;
        position += 1;
        if size == 0 {
            labels.push(Vec::new());
            break;
        }
        if size as usize > crate::protocol::types::LABEL_MAX_LEN {
            return None;
        }
        let label = data.get(position..position + size as usize)?;
        position += size as usize;
        labels.push(label.to_vec());
    }

    if position == data.len() {
        DomainName::from_labels_with_root(labels)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(option: EdnsOption) {
        let mut octets = Vec::new();
        option.to_octets(&mut octets);
        assert_eq!(octets.len(), option.wire_len());
        assert_eq!(Some(vec![option]), EdnsOption::parse_all(&octets));
    }

    #[test]
    fn option_roundtrips() {
        roundtrip(EdnsOption::Llq {
            version: 1,
            llq_opcode: 2,
            error: 0,
            id: 0x0102_0304_0506_0708,
            lease: 3600,
        });
        roundtrip(EdnsOption::Ul { lease: 7200 });
        roundtrip(EdnsOption::Nsid {
            data: b"ns1.example".to_vec(),
        });
        roundtrip(EdnsOption::Dau {
            algorithms: vec![8, 13, 15],
        });
        roundtrip(EdnsOption::Subnet {
            family: 1,
            source_prefix_length: 24,
            scope_prefix_length: 0,
            address: vec![192, 0, 2],
        });
        roundtrip(EdnsOption::Expire { expire: None });
        roundtrip(EdnsOption::Expire {
            expire: Some(604_800),
        });
        roundtrip(EdnsOption::Cookie {
            client: [1, 2, 3, 4, 5, 6, 7, 8],
            server: Some(vec![9; 16]),
        });
        roundtrip(EdnsOption::TcpKeepalive { timeout: Some(100) });
        roundtrip(EdnsOption::Padding {
            octets: vec![0; 32],
        });
        roundtrip(EdnsOption::Chain {
            closest_trust_point: DomainName::from_dotted_string("example.com.").unwrap(),
        });
        roundtrip(EdnsOption::KeyTag {
            tags: vec![20326, 38696],
        });
        roundtrip(EdnsOption::Local {
            code: 65001,
            data: vec![0xde, 0xad],
        });
        roundtrip(EdnsOption::Unknown {
            code: 40000,
            data: vec![1, 2, 3],
        });
    }

    #[test]
    fn local_range_dispatch() {
        for code in [OPTION_CODE_LOCAL_MIN, 65300, OPTION_CODE_LOCAL_MAX] {
            let parsed = EdnsOption::parse_one(code, &[1, 2]);
            assert_eq!(
                EdnsOption::Local {
                    code,
                    data: vec![1, 2]
                },
                parsed
            );
        }

        // 65535 is reserved, not local
        assert_eq!(
            EdnsOption::Unknown {
                code: 65535,
                data: vec![]
            },
            EdnsOption::parse_one(65535, &[])
        );
    }

    #[test]
    fn malformed_known_option_degrades_to_unknown() {
        let parsed = EdnsOption::parse_one(OPTION_CODE_UL, &[1, 2, 3]);
        assert_eq!(
            EdnsOption::Unknown {
                code: OPTION_CODE_UL,
                data: vec![1, 2, 3]
            },
            parsed
        );
    }

    #[test]
    fn broken_framing_is_an_error() {
        assert_eq!(None, EdnsOption::parse_all(&[0, 3]));
        assert_eq!(None, EdnsOption::parse_all(&[0, 3, 0, 5, 1, 2]));
    }

    #[test]
    fn multiple_options_parse_in_order() {
        let mut octets = Vec::new();
        EdnsOption::Nsid { data: vec![] }.to_octets(&mut octets);
        EdnsOption::Padding { octets: vec![0; 4] }.to_octets(&mut octets);

        let parsed = EdnsOption::parse_all(&octets).unwrap();
        assert_eq!(2, parsed.len());
        assert_eq!(OPTION_CODE_NSID, parsed[0].code());
        assert_eq!(OPTION_CODE_PADDING, parsed[1].code());
    }
}
