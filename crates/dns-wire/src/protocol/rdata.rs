//! Typed RDATA for every supported record type.
//!
//! Rather than one variant per record type, there is one variant per
//! *wire shape*, with a `tag` field naming the concrete type where a
//! shape is shared.  The RFCs define many records by reference to an
//! older one (RRSIG is SIG, CDNSKEY is DNSKEY, SPF is TXT, SMIMEA is
//! TLSA, ...), and collapsing them means each shape's codec is
//! written once.
//!
//! The `shape_of` registry says which shape decodes each type, and
//! the companion tables say whether a type's rdata names may be
//! compressed (only the original RFC 1035 types) and how an opaque
//! type is presented.  Binary, presentation, and JSON codecs all
//! dispatch through this registry.
//!
//! INVARIANT: a `tag` field always holds one of the types listed for
//! its variant; the deserialisers guarantee this, and hand-constructed
//! values must too.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::bitmap::TypeBitmap;
use crate::protocol::options::EdnsOption;
use crate::protocol::types::{DomainName, RecordType};

/// A record's type together with its deserialised data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RecordData {
    /// A: a 32 bit internet address.
    A { address: Ipv4Addr },

    /// AAAA: a 128 bit internet address.
    Aaaa { address: Ipv6Addr },

    /// A single domain name: NS, MD, MF, CNAME, MB, MG, MR, PTR,
    /// NSAP-PTR, DNAME.
    Name { tag: RecordType, name: DomainName },

    /// SOA: the start of a zone of authority.
    Soa {
        mname: DomainName,
        rname: DomainName,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },

    /// A pair of domain names: MINFO (rmailbx, emailbx), RP (mbox,
    /// txt), TALINK (previous, next).
    NamePair {
        tag: RecordType,
        first: DomainName,
        second: DomainName,
    },

    /// A 16-bit preference and a domain name: MX, AFSDB (the
    /// preference is the subtype), RT, KX.
    Exchange {
        tag: RecordType,
        preference: u16,
        exchange: DomainName,
    },

    /// One or more character-strings: TXT, SPF, AVC, NINFO, HINFO
    /// (cpu, os), X25, ISDN (address, optional subaddress), GPOS
    /// (longitude, latitude, altitude).
    Strings {
        tag: RecordType,
        strings: Vec<Vec<u8>>,
    },

    /// WKS: an address, an IP protocol number, and a port bitmap.
    Wks {
        address: Ipv4Addr,
        protocol: u8,
        bitmap: Vec<u8>,
    },

    /// Types whose rdata is a single opaque blob: NULL, EID, NIMLOC,
    /// NSAP, ATMA, UINFO, UID, GID, UNSPEC, DHCID, OPENPGPKEY.  The
    /// presentation format varies by type (see `opaque_format`); the
    /// wire format is just the octets.
    Opaque { tag: RecordType, octets: Vec<u8> },

    /// SRV: service location.
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },

    /// NAPTR: naming authority pointer.
    Naptr {
        order: u16,
        preference: u16,
        flags: Vec<u8>,
        services: Vec<u8>,
        regexp: Vec<u8>,
        replacement: DomainName,
    },

    /// PX: X.400 mapping information.
    Px {
        preference: u16,
        map822: DomainName,
        mapx400: DomainName,
    },

    /// LOC: location information (RFC 1876).  Sizes are in the
    /// RFC's exponent-mantissa centimetre encoding; latitude and
    /// longitude count 1/1000ths of a second of arc from 2^31 at the
    /// equator / prime meridian; altitude counts centimetres from
    /// 100km below the WGS 84 reference spheroid.
    Loc {
        version: u8,
        size: u8,
        horizontal_precision: u8,
        vertical_precision: u8,
        latitude: u32,
        longitude: u32,
        altitude: u32,
    },

    /// SIG and RRSIG.  The expiration and inception are RFC 2065
    /// serial-arithmetic timestamps.
    Sig {
        tag: RecordType,
        type_covered: RecordType,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: DomainName,
        signature: Vec<u8>,
    },

    /// KEY, DNSKEY, CDNSKEY, RKEY.
    Key {
        tag: RecordType,
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Vec<u8>,
    },

    /// DS, CDS, TA, DLV.
    Ds {
        tag: RecordType,
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    },

    /// NXT: the obsolete precursor of NSEC, with a plain one-octet-
    /// per-8-types bitmap instead of the windowed one.
    Nxt { next: DomainName, bitmap: Vec<u8> },

    /// NSEC: authenticated denial of existence.
    Nsec { next: DomainName, types: TypeBitmap },

    /// NSEC3: hashed authenticated denial of existence.
    Nsec3 {
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Vec<u8>,
        next_hashed: Vec<u8>,
        types: TypeBitmap,
    },

    /// NSEC3PARAM: the NSEC3 parameters alone.
    Nsec3Param {
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Vec<u8>,
    },

    /// CERT: a certificate.
    Cert {
        cert_type: u16,
        key_tag: u16,
        algorithm: u8,
        certificate: Vec<u8>,
    },

    /// SSHFP: an SSH public key fingerprint.
    Sshfp {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: Vec<u8>,
    },

    /// TLSA and SMIMEA.
    Tlsa {
        tag: RecordType,
        usage: u8,
        selector: u8,
        matching_type: u8,
        certificate_data: Vec<u8>,
    },

    /// IPSECKEY.
    Ipseckey {
        precedence: u8,
        algorithm: u8,
        gateway: Gateway,
        public_key: Vec<u8>,
    },

    /// HIP: a host identity.
    Hip {
        algorithm: u8,
        hit: Vec<u8>,
        public_key: Vec<u8>,
        servers: Vec<DomainName>,
    },

    /// CSYNC: child-to-parent synchronisation.
    Csync {
        serial: u32,
        flags: u16,
        types: TypeBitmap,
    },

    /// CAA: certification authority authorization.
    Caa {
        flags: u8,
        tag_string: Vec<u8>,
        value: Vec<u8>,
    },

    /// URI.
    Uri {
        priority: u16,
        weight: u16,
        target: Vec<u8>,
    },

    /// NID: an ILNP node identifier.
    Nid { preference: u16, node_id: u64 },

    /// L32: an ILNP 32-bit locator, presented like an IPv4 address.
    L32 { preference: u16, locator: Ipv4Addr },

    /// L64: an ILNP 64-bit locator.
    L64 { preference: u16, locator: u64 },

    /// LP: an ILNP locator pointer.
    Lp { preference: u16, fqdn: DomainName },

    /// EUI48: a 48-bit extended unique identifier.
    Eui48 { address: [u8; 6] },

    /// EUI64: a 64-bit extended unique identifier.
    Eui64 { address: [u8; 8] },

    /// A6: the obsolete IPv6 address-with-prefix record.  The suffix
    /// holds the low `128 - prefix_length` bits; a prefix name is
    /// present unless the prefix length is zero.
    A6 {
        prefix_length: u8,
        suffix: Ipv6Addr,
        prefix_name: Option<DomainName>,
    },

    /// APL: address prefix lists.
    Apl { items: Vec<AplItem> },

    /// OPT rdata: a sequence of EDNS options.  Usually promoted out
    /// of the record sections into `Message::edns`, but representable
    /// so a stray OPT can still be round-tripped.
    Opt { options: Vec<EdnsOption> },

    /// TSIG: a transaction signature.  `time_signed` is 48 bits.
    Tsig {
        algorithm: DomainName,
        time_signed: u64,
        fudge: u16,
        mac: Vec<u8>,
        original_id: u16,
        error: u16,
        other: Vec<u8>,
    },

    /// TKEY: transaction key establishment.
    Tkey {
        algorithm: DomainName,
        inception: u32,
        expiration: u32,
        mode: u16,
        error: u16,
        key: Vec<u8>,
        other: Vec<u8>,
    },

    /// DOA: digital object architecture.
    Doa {
        enterprise: u32,
        doa_type: u32,
        location: u8,
        media_type: Vec<u8>,
        data: Vec<u8>,
    },

    /// Any type the registry has no shape for, with its rdata
    /// preserved.  Presented in the RFC 3597 `\# <len> <hex>` form.
    Unknown { tag: RecordType, octets: Vec<u8> },
}

/// The gateway field of an IPSECKEY record.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Gateway {
    None,
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Name(DomainName),
}

impl Gateway {
    pub fn gateway_type(&self) -> u8 {
        match self {
            Gateway::None => 0,
            Gateway::Ipv4(_) => 1,
            Gateway::Ipv6(_) => 2,
            Gateway::Name(_) => 3,
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            Gateway::None => 0,
            Gateway::Ipv4(_) => 4,
            Gateway::Ipv6(_) => 16,
            Gateway::Name(name) => name.wire_len(),
        }
    }
}

/// One item of an APL list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AplItem {
    pub family: u16,
    pub prefix: u8,
    pub negate: bool,
    /// The address, trimmed of trailing zero octets as on the wire.
    pub address: Vec<u8>,
}

/// The wire shape a record type decodes as.  This is the registry
/// which all three codecs (binary, presentation, JSON) dispatch on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Shape {
    A,
    Aaaa,
    Name,
    Soa,
    NamePair,
    Exchange,
    Strings,
    Wks,
    Opaque,
    Srv,
    Naptr,
    Px,
    Loc,
    Sig,
    Key,
    Ds,
    Nxt,
    Nsec,
    Nsec3,
    Nsec3Param,
    Cert,
    Sshfp,
    Tlsa,
    Ipseckey,
    Hip,
    Csync,
    Caa,
    Uri,
    Nid,
    L32,
    L64,
    Lp,
    Eui48,
    Eui64,
    A6,
    Apl,
    Opt,
    Tsig,
    Tkey,
    Doa,
    Unknown,
}

pub(crate) fn shape_of(rtype: RecordType) -> Shape {
    match rtype {
        RecordType::A => Shape::A,
        RecordType::AAAA => Shape::Aaaa,
        RecordType::NS
        | RecordType::MD
        | RecordType::MF
        | RecordType::CNAME
        | RecordType::MB
        | RecordType::MG
        | RecordType::MR
        | RecordType::PTR
        | RecordType::NSAPPTR
        | RecordType::DNAME => Shape::Name,
        RecordType::SOA => Shape::Soa,
        RecordType::MINFO | RecordType::RP | RecordType::TALINK => Shape::NamePair,
        RecordType::MX | RecordType::AFSDB | RecordType::RT | RecordType::KX => Shape::Exchange,
        RecordType::TXT
        | RecordType::SPF
        | RecordType::AVC
        | RecordType::NINFO
        | RecordType::HINFO
        | RecordType::X25
        | RecordType::ISDN
        | RecordType::GPOS => Shape::Strings,
        RecordType::WKS => Shape::Wks,
        RecordType::NULL
        | RecordType::EID
        | RecordType::NIMLOC
        | RecordType::NSAP
        | RecordType::ATMA
        | RecordType::UINFO
        | RecordType::UID
        | RecordType::GID
        | RecordType::UNSPEC
        | RecordType::DHCID
        | RecordType::OPENPGPKEY => Shape::Opaque,
        RecordType::SRV => Shape::Srv,
        RecordType::NAPTR => Shape::Naptr,
        RecordType::PX => Shape::Px,
        RecordType::LOC => Shape::Loc,
        RecordType::SIG | RecordType::RRSIG => Shape::Sig,
        RecordType::KEY | RecordType::DNSKEY | RecordType::CDNSKEY | RecordType::RKEY => Shape::Key,
        RecordType::DS | RecordType::CDS | RecordType::TA | RecordType::DLV => Shape::Ds,
        RecordType::NXT => Shape::Nxt,
        RecordType::NSEC => Shape::Nsec,
        RecordType::NSEC3 => Shape::Nsec3,
        RecordType::NSEC3PARAM => Shape::Nsec3Param,
        RecordType::CERT => Shape::Cert,
        RecordType::SSHFP => Shape::Sshfp,
        RecordType::TLSA | RecordType::SMIMEA => Shape::Tlsa,
        RecordType::IPSECKEY => Shape::Ipseckey,
        RecordType::HIP => Shape::Hip,
        RecordType::CSYNC => Shape::Csync,
        RecordType::CAA => Shape::Caa,
        RecordType::URI => Shape::Uri,
        RecordType::NID => Shape::Nid,
        RecordType::L32 => Shape::L32,
        RecordType::L64 => Shape::L64,
        RecordType::LP => Shape::Lp,
        RecordType::EUI48 => Shape::Eui48,
        RecordType::EUI64 => Shape::Eui64,
        RecordType::A6 => Shape::A6,
        RecordType::APL => Shape::Apl,
        RecordType::OPT => Shape::Opt,
        RecordType::TSIG => Shape::Tsig,
        RecordType::TKEY => Shape::Tkey,
        RecordType::DOA => Shape::Doa,
        _ => Shape::Unknown,
    }
}

/// How an `Opaque` record is presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum OpaqueFormat {
    /// A plain hex string.
    Hex,
    /// `0x` followed by hex, the NSAP convention.
    PrefixedHex,
    /// Unpadded base64.
    Base64,
}

pub(crate) fn opaque_format(rtype: RecordType) -> OpaqueFormat {
    match rtype {
        RecordType::NSAP => OpaqueFormat::PrefixedHex,
        RecordType::DHCID | RecordType::OPENPGPKEY => OpaqueFormat::Base64,
        _ => OpaqueFormat::Hex,
    }
}

/// Whether domain names inside this type's rdata may be compressed.
/// Only the original RFC 1035 types compress; everything since is
/// written uncompressed so that implementations which do not know the
/// type can still treat the rdata as opaque (RFC 3597 section 4).
pub(crate) fn compresses_rdata_names(rtype: RecordType) -> bool {
    matches!(
        rtype,
        RecordType::NS
            | RecordType::MD
            | RecordType::MF
            | RecordType::CNAME
            | RecordType::SOA
            | RecordType::MB
            | RecordType::MG
            | RecordType::MR
            | RecordType::PTR
            | RecordType::MINFO
            | RecordType::MX
    )
}

impl RecordData {
    pub fn rtype(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::Aaaa { .. } => RecordType::AAAA,
            RecordData::Name { tag, .. }
            | RecordData::NamePair { tag, .. }
            | RecordData::Exchange { tag, .. }
            | RecordData::Strings { tag, .. }
            | RecordData::Opaque { tag, .. }
            | RecordData::Sig { tag, .. }
            | RecordData::Key { tag, .. }
            | RecordData::Ds { tag, .. }
            | RecordData::Tlsa { tag, .. }
            | RecordData::Unknown { tag, .. } => *tag,
            RecordData::Soa { .. } => RecordType::SOA,
            RecordData::Wks { .. } => RecordType::WKS,
            RecordData::Srv { .. } => RecordType::SRV,
            RecordData::Naptr { .. } => RecordType::NAPTR,
            RecordData::Px { .. } => RecordType::PX,
            RecordData::Loc { .. } => RecordType::LOC,
            RecordData::Nxt { .. } => RecordType::NXT,
            RecordData::Nsec { .. } => RecordType::NSEC,
            RecordData::Nsec3 { .. } => RecordType::NSEC3,
            RecordData::Nsec3Param { .. } => RecordType::NSEC3PARAM,
            RecordData::Cert { .. } => RecordType::CERT,
            RecordData::Sshfp { .. } => RecordType::SSHFP,
            RecordData::Ipseckey { .. } => RecordType::IPSECKEY,
            RecordData::Hip { .. } => RecordType::HIP,
            RecordData::Csync { .. } => RecordType::CSYNC,
            RecordData::Caa { .. } => RecordType::CAA,
            RecordData::Uri { .. } => RecordType::URI,
            RecordData::Nid { .. } => RecordType::NID,
            RecordData::L32 { .. } => RecordType::L32,
            RecordData::L64 { .. } => RecordType::L64,
            RecordData::Lp { .. } => RecordType::LP,
            RecordData::Eui48 { .. } => RecordType::EUI48,
            RecordData::Eui64 { .. } => RecordType::EUI64,
            RecordData::A6 { .. } => RecordType::A6,
            RecordData::Apl { .. } => RecordType::APL,
            RecordData::Opt { .. } => RecordType::OPT,
            RecordData::Tsig { .. } => RecordType::TSIG,
            RecordData::Tkey { .. } => RecordType::TKEY,
            RecordData::Doa { .. } => RecordType::DOA,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordData::Unknown { .. })
    }

    /// The exact length of the uncompressed wire encoding of this
    /// rdata.  The message serialiser may produce less when rdata
    /// names compress, which (as RFC 3597 notes) makes the on-wire
    /// RDLENGTH depend on message position.
    pub fn rdata_len(&self) -> usize {
        match self {
            RecordData::A { .. } => 4,
            RecordData::Aaaa { .. } => 16,
            RecordData::Name { name, .. } => name.wire_len(),
            RecordData::Soa { mname, rname, .. } => mname.wire_len() + rname.wire_len() + 20,
            RecordData::NamePair { first, second, .. } => first.wire_len() + second.wire_len(),
            RecordData::Exchange { exchange, .. } => 2 + exchange.wire_len(),
            RecordData::Strings { strings, .. } => {
                strings.iter().map(|s| 1 + s.len()).sum()
            }
            RecordData::Wks { bitmap, .. } => 5 + bitmap.len(),
            RecordData::Opaque { octets, .. } | RecordData::Unknown { octets, .. } => octets.len(),
            RecordData::Srv { target, .. } => 6 + target.wire_len(),
            RecordData::Naptr {
                flags,
                services,
                regexp,
                replacement,
                ..
            } => 4 + 3 + flags.len() + services.len() + regexp.len() + replacement.wire_len(),
            RecordData::Px {
                map822, mapx400, ..
            } => 2 + map822.wire_len() + mapx400.wire_len(),
            RecordData::Loc { .. } => 16,
            RecordData::Sig {
                signer, signature, ..
            } => 18 + signer.wire_len() + signature.len(),
            RecordData::Key { public_key, .. } => 4 + public_key.len(),
            RecordData::Ds { digest, .. } => 4 + digest.len(),
            RecordData::Nxt { next, bitmap } => next.wire_len() + bitmap.len(),
            RecordData::Nsec { next, types } => next.wire_len() + types.wire_len(),
            RecordData::Nsec3 {
                salt,
                next_hashed,
                types,
                ..
            } => 6 + salt.len() + next_hashed.len() + types.wire_len(),
            RecordData::Nsec3Param { salt, .. } => 5 + salt.len(),
            RecordData::Cert { certificate, .. } => 5 + certificate.len(),
            RecordData::Sshfp { fingerprint, .. } => 2 + fingerprint.len(),
            RecordData::Tlsa {
                certificate_data, ..
            } => 3 + certificate_data.len(),
            RecordData::Ipseckey {
                gateway,
                public_key,
                ..
            } => 3 + gateway.wire_len() + public_key.len(),
            RecordData::Hip {
                hit,
                public_key,
                servers,
                ..
            } => 4 + hit.len() + public_key.len() + servers.iter().map(DomainName::wire_len).sum::<usize>(),
            RecordData::Csync { types, .. } => 6 + types.wire_len(),
            RecordData::Caa {
                tag_string, value, ..
            } => 2 + tag_string.len() + value.len(),
            RecordData::Uri { target, .. } => 4 + target.len(),
            RecordData::Nid { .. } => 10,
            RecordData::L32 { .. } => 6,
            RecordData::L64 { .. } => 10,
            RecordData::Lp { fqdn, .. } => 2 + fqdn.wire_len(),
            RecordData::Eui48 { .. } => 6,
            RecordData::Eui64 { .. } => 8,
            RecordData::A6 {
                prefix_length,
                prefix_name,
                ..
            } => {
                let suffix_len = (128 - usize::from(*prefix_length)).div_ceil(8);
                1 + suffix_len + prefix_name.as_ref().map_or(0, DomainName::wire_len)
            }
            RecordData::Apl { items } => items
                .iter()
                .map(|item| 4 + item.address.len())
                .sum(),
            RecordData::Opt { options } => options.iter().map(EdnsOption::wire_len).sum(),
            RecordData::Tsig {
                algorithm,
                mac,
                other,
                ..
            } => algorithm.wire_len() + 6 + 2 + 2 + mac.len() + 2 + 2 + 2 + other.len(),
            RecordData::Tkey {
                algorithm,
                key,
                other,
                ..
            } => algorithm.wire_len() + 4 + 4 + 2 + 2 + 2 + key.len() + 2 + other.len(),
            RecordData::Doa {
                media_type, data, ..
            } => 9 + 1 + media_type.len() + data.len(),
        }
    }

    /// The to-be-signed rendering of a SIG or RRSIG: the rdata with
    /// the signer name lowercased and uncompressed and the signature
    /// absent (RFC 4034 section 3.1.8.1).  `None` for other shapes.
    pub fn tbs_octets(&self) -> Option<Vec<u8>> {
        if let RecordData::Sig {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            ..
        } = self
        {
            let mut out = Vec::with_capacity(18 + signer.wire_len());
            out.extend_from_slice(&u16::from(*type_covered).to_be_bytes());
            out.push(*algorithm);
            out.push(*labels);
            out.extend_from_slice(&original_ttl.to_be_bytes());
            out.extend_from_slice(&expiration.to_be_bytes());
            out.extend_from_slice(&inception.to_be_bytes());
            out.extend_from_slice(&key_tag.to_be_bytes());
            for label in &signer.to_lowercase().labels {
                out.push(label.len() as u8);
                out.extend_from_slice(label);
            }
            Some(out)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_type_has_a_shape() {
        // every mnemonic type except the ANY pseudo-type has a
        // non-Unknown shape
        for value in 0..=u16::MAX {
            let rtype = RecordType::from(value);
            if rtype.is_unknown() || rtype == RecordType::ANY {
                assert_eq!(Shape::Unknown, shape_of(rtype), "{rtype}");
            } else {
                assert_ne!(Shape::Unknown, shape_of(rtype), "{rtype}");
            }
        }
    }

    #[test]
    fn compression_is_limited_to_rfc1035_types() {
        assert!(compresses_rdata_names(RecordType::MX));
        assert!(compresses_rdata_names(RecordType::SOA));
        assert!(!compresses_rdata_names(RecordType::SRV));
        assert!(!compresses_rdata_names(RecordType::DNAME));
        assert!(!compresses_rdata_names(RecordType::RRSIG));
    }

    #[test]
    fn tbs_octets_lowercases_and_drops_signature() {
        let data = RecordData::Sig {
            tag: RecordType::RRSIG,
            type_covered: RecordType::A,
            algorithm: 8,
            labels: 2,
            original_ttl: 3600,
            expiration: 100,
            inception: 50,
            key_tag: 0x1234,
            signer: DomainName::from_dotted_string("Example.COM.").unwrap(),
            signature: vec![0xFF; 64],
        };

        let tbs = data.tbs_octets().unwrap();
        assert_eq!(18 + 13, tbs.len());
        assert_eq!(&[0, 1, 8, 2], &tbs[..4]);
        assert_eq!(
            &[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0],
            &tbs[18..]
        );
    }

    #[test]
    fn rdata_len_matches_simple_cases() {
        let a = RecordData::A {
            address: Ipv4Addr::new(192, 0, 2, 1),
        };
        assert_eq!(4, a.rdata_len());

        let mx = RecordData::Exchange {
            tag: RecordType::MX,
            preference: 10,
            exchange: DomainName::from_dotted_string("mail.example.com.").unwrap(),
        };
        assert_eq!(2 + 18, mx.rdata_len());

        let txt = RecordData::Strings {
            tag: RecordType::TXT,
            strings: vec![b"hello".to_vec(), b"world".to_vec()],
        };
        assert_eq!(12, txt.rdata_len());
    }
}
