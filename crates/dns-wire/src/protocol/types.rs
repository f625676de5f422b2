use std::fmt;
use std::str::FromStr;

use crate::protocol::options::EdnsOption;
use crate::protocol::rdata::RecordData;

pub const DNS_PORT: u16 = 53;

/// The biggest message which can be sent over UDP without EDNS.
pub const MAX_UDP_SIZE: usize = 512;

/// The UDP payload size advertised in outgoing EDNS OPT records.
pub const MAX_EDNS_SIZE: usize = 4096;

/// The wire length of a domain name, including the root label,
/// must not exceed this.
pub const DOMAINNAME_MAX_LEN: usize = 255;

/// A single label must not exceed this.
pub const LABEL_MAX_LEN: usize = 63;

/// Flag bits of the header flags word.
pub const FLAG_QR: u16 = 0x8000;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_TC: u16 = 0x0200;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
pub const FLAG_Z: u16 = 0x0040;
pub const FLAG_AD: u16 = 0x0020;
pub const FLAG_CD: u16 = 0x0010;

pub const MASK_OPCODE: u16 = 0x7800;
pub const OFFSET_OPCODE: u16 = 11;
pub const MASK_RCODE: u16 = 0x000F;

/// The DO ("DNSSEC OK") bit of the EDNS flags word.
pub const EDNS_FLAG_DO: u16 = 0x8000;

/// Basic DNS message format, used for both queries and responses.
///
/// ```text
///     +---------------------+
///     |        Header       |
///     +---------------------+
///     |       Question      | the question for the name server
///     +---------------------+
///     |        Answer       | RRs answering the question
///     +---------------------+
///     |      Authority      | RRs pointing toward an authority
///     +---------------------+
///     |      Additional     | RRs holding additional information
///     +---------------------+
/// ```
///
/// See section 4.1 of RFC 1035.
///
/// Three pseudo-sections are carved out of the additional section on
/// deserialisation: the EDNS OPT record (RFC 6891), a trailing TSIG
/// record (RFC 8945), and a trailing SIG(0) record (RFC 2931).  They
/// are re-inserted on serialisation, so `arcount` on the wire counts
/// them too.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,

    /// The EDNS OPT record, decomposed.  The high 8 bits of the
    /// extended RCODE it carries on the wire are spliced into
    /// `header.rcode` rather than kept here.
    pub edns: Option<Edns>,

    /// A TSIG record, which must have been the final record of the
    /// additional section.
    pub tsig: Option<ResourceRecord>,

    /// A SIG(0) record (a SIG with name "." and type-covered 0),
    /// which must have been the final record of the additional
    /// section (before TSIG, if both are present).
    pub sig0: Option<ResourceRecord>,

    /// The octet length observed when this message was deserialised.
    /// Zero for messages constructed in memory.
    pub size: usize,

    /// Octets beyond the structured content.  Some servers emit
    /// garbage after the last record; it is preserved here and is not
    /// an error.
    pub trailing: Vec<u8>,
}

impl Message {
    pub fn make_query(id: u16, question: Question) -> Self {
        Self {
            header: Header {
                id,
                is_response: false,
                opcode: Opcode::Query,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: false,
                recursion_available: false,
                z: false,
                authentic_data: false,
                checking_disabled: false,
                rcode: Rcode::NoError,
            },
            questions: vec![question],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
            tsig: None,
            sig0: None,
            size: 0,
            trailing: Vec::new(),
        }
    }

    pub fn make_response(&self) -> Self {
        Self {
            header: Header {
                id: self.header.id,
                is_response: true,
                opcode: self.header.opcode,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: self.header.recursion_desired,
                recursion_available: true,
                z: false,
                authentic_data: false,
                checking_disabled: self.header.checking_disabled,
                rcode: Rcode::NoError,
            },
            questions: self.questions.clone(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
            tsig: None,
            sig0: None,
            size: 0,
            trailing: Vec::new(),
        }
    }

    /// Attach an OPT record advertising the default payload size.
    pub fn with_edns(mut self) -> Self {
        self.edns = Some(Edns::default());
        self
    }

    /// Forget the `size` and `trailing` bookkeeping fields, for
    /// comparing a deserialised message against a constructed one.
    pub fn forget_provenance(mut self) -> Self {
        self.size = 0;
        self.trailing = Vec::new();
        self
    }
}

/// Common header type for all messages.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      ID                       |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    QDCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ANCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    NSCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ARCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.1 of RFC 1035, with the AD and CD bits of RFC
/// 4035 taking over two of the original Z bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any
    /// kind of query.  This identifier is copied into the
    /// corresponding reply and can be used by the requester to match
    /// up replies to outstanding queries.
    pub id: u16,

    /// Whether this message is a query (false) or a response (true).
    pub is_response: bool,

    /// The kind of query in this message, set by the originator and
    /// copied into the response.
    pub opcode: Opcode,

    /// Authoritative Answer - valid in responses, specifies that the
    /// responding name server is an authority for the domain name in
    /// the question section.
    pub is_authoritative: bool,

    /// TrunCation - this message was truncated due to length greater
    /// than that permitted on the transmission channel.
    pub is_truncated: bool,

    /// Recursion Desired - may be set in a query and is copied into
    /// the response; directs the name server to pursue the query
    /// recursively.
    pub recursion_desired: bool,

    /// Recursion Available - set or cleared in a response; denotes
    /// whether recursive query support is available.
    pub recursion_available: bool,

    /// The remaining reserved bit.  Must be zero, but is carried
    /// through faithfully if set.
    pub z: bool,

    /// Authentic Data (RFC 4035) - in a response, all data in the
    /// answer and authority sections has been validated.
    pub authentic_data: bool,

    /// Checking Disabled (RFC 4035) - in a query, the client accepts
    /// unvalidated data.
    pub checking_disabled: bool,

    /// Response code.  This is the full 12-bit code: the low 4 bits
    /// live in the header on the wire, the high 8 bits in the TTL
    /// field of the EDNS OPT record (RFC 6891 section 6.1.3).
    pub rcode: Rcode,
}

impl Header {
    /// Pack the non-id, non-rcode-extension portion into the wire
    /// flags word.
    pub fn flags_word(&self) -> u16 {
        let mut flags = (u16::from(u8::from(self.opcode)) << OFFSET_OPCODE) & MASK_OPCODE;
        flags |= u16::from(self.rcode.header_bits()) & MASK_RCODE;
        for (set, bit) in [
            (self.is_response, FLAG_QR),
            (self.is_authoritative, FLAG_AA),
            (self.is_truncated, FLAG_TC),
            (self.recursion_desired, FLAG_RD),
            (self.recursion_available, FLAG_RA),
            (self.z, FLAG_Z),
            (self.authentic_data, FLAG_AD),
            (self.checking_disabled, FLAG_CD),
        ] {
            if set {
                flags |= bit;
            }
        }
        flags
    }

    /// Inverse of `flags_word`.  The rcode is the low 4 bits only;
    /// the extension bits are spliced in later if an OPT record turns
    /// up.
    pub fn from_flags_word(id: u16, flags: u16) -> Self {
        Self {
            id,
            is_response: flags & FLAG_QR != 0,
            opcode: Opcode::from(((flags & MASK_OPCODE) >> OFFSET_OPCODE) as u8),
            is_authoritative: flags & FLAG_AA != 0,
            is_truncated: flags & FLAG_TC != 0,
            recursion_desired: flags & FLAG_RD != 0,
            recursion_available: flags & FLAG_RA != 0,
            z: flags & FLAG_Z != 0,
            authentic_data: flags & FLAG_AD != 0,
            checking_disabled: flags & FLAG_CD != 0,
            rcode: Rcode::from((flags & MASK_RCODE) as u16),
        }
    }
}

/// A `Header` as it appears on the network.  This type is used for
/// serialisation and deserialisation only: including the count fields
/// in the normal `Header` type would require ensuring those values
/// are correct.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WireHeader {
    pub header: Header,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

/// The question section has a list of questions (usually 1 but
/// possibly more) being asked.  This is the structure for a single
/// question.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                     QNAME                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QTYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QCLASS                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.2 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Question {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

/// The answer, authority, and additional sections are all the same
/// format: a variable number of resource records.  This is the
/// structure for a single resource record.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                                               /
///     /                      NAME                     /
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     CLASS                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TTL                      |
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                   RDLENGTH                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
///     /                     RDATA                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.3 of RFC 1035.  The TYPE and RDATA fields are
/// combined into the `RecordData`, which cannot represent a
/// mismatched pair.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub data: RecordData,
    pub rclass: RecordClass,
    pub ttl: u32,
}

impl ResourceRecord {
    pub fn rtype(&self) -> RecordType {
        self.data.rtype()
    }

    pub fn is_unknown(&self) -> bool {
        self.data.is_unknown() || self.rclass.is_unknown()
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.rtype().matches(question.qtype)
            && self.rclass.matches(question.qclass)
            && self.name == question.name
    }
}

/// The decomposed EDNS OPT pseudo-record (RFC 6891).
///
/// On the wire this is a resource record with owner name ".", type
/// OPT, the advertised UDP payload size in the CLASS field, the
/// extended-RCODE bits / version / flags in the TTL field, and a
/// sequence of options as RDATA.  Keeping it in that shape would make
/// every consumer re-derive the interesting fields, so it is promoted
/// to this struct during deserialisation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edns {
    /// The requestor's advertised UDP payload size.
    pub udp_payload_size: u16,

    /// EDNS version.  Only version 0 is specified; higher versions
    /// get a BADVERS response.
    pub version: u8,

    /// The EDNS flags word.  Only the DO bit is currently assigned.
    pub flags: u16,

    pub options: Vec<EdnsOption>,
}

impl Edns {
    pub fn dnssec_ok(&self) -> bool {
        self.flags & EDNS_FLAG_DO != 0
    }
}

impl Default for Edns {
    fn default() -> Self {
        Self {
            udp_payload_size: MAX_EDNS_SIZE as u16,
            version: 0,
            flags: 0,
            options: Vec::new(),
        }
    }
}

/// What sort of query this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Opcode {
    Query,
    InverseQuery,
    Status,
    Notify,
    Update,
    Reserved(OpcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Opcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OpcodeReserved(u8);

impl From<u8> for Opcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Opcode::Query,
            1 => Opcode::InverseQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Reserved(OpcodeReserved(other)),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Query => 0,
            Opcode::InverseQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Reserved(OpcodeReserved(octet)) => octet,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Query => write!(f, "QUERY"),
            Opcode::InverseQuery => write!(f, "IQUERY"),
            Opcode::Status => write!(f, "STATUS"),
            Opcode::Notify => write!(f, "NOTIFY"),
            Opcode::Update => write!(f, "UPDATE"),
            Opcode::Reserved(OpcodeReserved(n)) => write!(f, "OPCODE{n}"),
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUERY" => Ok(Opcode::Query),
            "IQUERY" => Ok(Opcode::InverseQuery),
            "STATUS" => Ok(Opcode::Status),
            "NOTIFY" => Ok(Opcode::Notify),
            "UPDATE" => Ok(Opcode::Update),
            _ => match s.strip_prefix("OPCODE").map(str::parse::<u8>) {
                Some(Ok(n)) => Ok(Opcode::from(n)),
                _ => Err(()),
            },
        }
    }
}

/// What sort of response this is.  This is the logical 12-bit
/// response code: values above 15 can only be carried by messages
/// with an EDNS OPT record.
///
/// 16 is both BADVERS (RFC 6891) and BADSIG (RFC 8945); the variant
/// is named for the former.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YxDomain,
    YxRrSet,
    NxRrSet,
    NotAuth,
    NotZone,
    BadVers,
    BadKey,
    BadTime,
    BadMode,
    BadName,
    BadAlg,
    BadTrunc,
    BadCookie,
    Reserved(RcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Rcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RcodeReserved(u16);

impl Rcode {
    /// The low 4 bits, which go in the header flags word.
    pub fn header_bits(self) -> u8 {
        (u16::from(self) & 0b0000_1111) as u8
    }

    /// The high 8 bits, which go in the EDNS OPT TTL field.
    pub fn extended_bits(self) -> u8 {
        (u16::from(self) >> 4) as u8
    }

    /// Combine the header nibble with the EDNS extension octet.
    pub fn from_parts(header_bits: u8, extended_bits: u8) -> Self {
        Self::from((u16::from(extended_bits) << 4) | u16::from(header_bits & 0b0000_1111))
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, Rcode::Reserved(_))
    }
}

impl From<u16> for Rcode {
    fn from(value: u16) -> Self {
        match value & 0b0000_1111_1111_1111 {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            6 => Rcode::YxDomain,
            7 => Rcode::YxRrSet,
            8 => Rcode::NxRrSet,
            9 => Rcode::NotAuth,
            10 => Rcode::NotZone,
            16 => Rcode::BadVers,
            17 => Rcode::BadKey,
            18 => Rcode::BadTime,
            19 => Rcode::BadMode,
            20 => Rcode::BadName,
            21 => Rcode::BadAlg,
            22 => Rcode::BadTrunc,
            23 => Rcode::BadCookie,
            other => Rcode::Reserved(RcodeReserved(other)),
        }
    }
}

impl From<Rcode> for u16 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::YxDomain => 6,
            Rcode::YxRrSet => 7,
            Rcode::NxRrSet => 8,
            Rcode::NotAuth => 9,
            Rcode::NotZone => 10,
            Rcode::BadVers => 16,
            Rcode::BadKey => 17,
            Rcode::BadTime => 18,
            Rcode::BadMode => 19,
            Rcode::BadName => 20,
            Rcode::BadAlg => 21,
            Rcode::BadTrunc => 22,
            Rcode::BadCookie => 23,
            Rcode::Reserved(RcodeReserved(octet)) => octet,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => write!(f, "NOERROR"),
            Rcode::FormatError => write!(f, "FORMERR"),
            Rcode::ServerFailure => write!(f, "SERVFAIL"),
            Rcode::NameError => write!(f, "NXDOMAIN"),
            Rcode::NotImplemented => write!(f, "NOTIMP"),
            Rcode::Refused => write!(f, "REFUSED"),
            Rcode::YxDomain => write!(f, "YXDOMAIN"),
            Rcode::YxRrSet => write!(f, "YXRRSET"),
            Rcode::NxRrSet => write!(f, "NXRRSET"),
            Rcode::NotAuth => write!(f, "NOTAUTH"),
            Rcode::NotZone => write!(f, "NOTZONE"),
            Rcode::BadVers => write!(f, "BADVERS"),
            Rcode::BadKey => write!(f, "BADKEY"),
            Rcode::BadTime => write!(f, "BADTIME"),
            Rcode::BadMode => write!(f, "BADMODE"),
            Rcode::BadName => write!(f, "BADNAME"),
            Rcode::BadAlg => write!(f, "BADALG"),
            Rcode::BadTrunc => write!(f, "BADTRUNC"),
            Rcode::BadCookie => write!(f, "BADCOOKIE"),
            Rcode::Reserved(RcodeReserved(n)) => write!(f, "RCODE{n}"),
        }
    }
}

impl FromStr for Rcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOERROR" => Ok(Rcode::NoError),
            "FORMERR" => Ok(Rcode::FormatError),
            "SERVFAIL" => Ok(Rcode::ServerFailure),
            "NXDOMAIN" => Ok(Rcode::NameError),
            "NOTIMP" => Ok(Rcode::NotImplemented),
            "REFUSED" => Ok(Rcode::Refused),
            "YXDOMAIN" => Ok(Rcode::YxDomain),
            "YXRRSET" => Ok(Rcode::YxRrSet),
            "NXRRSET" => Ok(Rcode::NxRrSet),
            "NOTAUTH" => Ok(Rcode::NotAuth),
            "NOTZONE" => Ok(Rcode::NotZone),
            "BADVERS" | "BADSIG" => Ok(Rcode::BadVers),
            "BADKEY" => Ok(Rcode::BadKey),
            "BADTIME" => Ok(Rcode::BadTime),
            "BADMODE" => Ok(Rcode::BadMode),
            "BADNAME" => Ok(Rcode::BadName),
            "BADALG" => Ok(Rcode::BadAlg),
            "BADTRUNC" => Ok(Rcode::BadTrunc),
            "BADCOOKIE" => Ok(Rcode::BadCookie),
            _ => match s.strip_prefix("RCODE").map(str::parse::<u16>) {
                Some(Ok(n)) => Ok(Rcode::from(n)),
                _ => Err(()),
            },
        }
    }
}

/// A domain name is a sequence of labels, where each label is 1 to 63
/// octets of arbitrary bytes, ending with the zero-length root label.
///
/// Case is preserved as given, but names compare (and hash) equal
/// under ASCII case folding, which is what makes the compression map,
/// the cache, and the zone index all case-insensitive for free.
#[derive(Clone)]
pub struct DomainName {
    /// The labels, including the trailing empty root label.
    pub labels: Vec<Vec<u8>>,
}

impl DomainName {
    pub fn root_domain() -> Self {
        DomainName {
            labels: vec![Vec::new()],
        }
    }

    pub fn is_root(&self) -> bool {
        self.labels.len() == 1
    }

    /// The length of the wire encoding, with no compression: one
    /// length octet per label plus the label octets.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum()
    }

    pub fn is_subdomain_of(&self, other: &DomainName) -> bool {
        if other.labels.len() > self.labels.len() {
            return false;
        }
        let offset = self.labels.len() - other.labels.len();
        self.labels[offset..]
            .iter()
            .zip(&other.labels)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Construct a name from labels, not including the trailing root
    /// label.  Checks the label and name length invariants.
    pub fn from_labels(labels: Vec<Vec<u8>>) -> Option<Self> {
        let mut all = Vec::with_capacity(labels.len() + 1);
        let mut wire_len = 1;
        for label in labels {
            if label.is_empty() || label.len() > LABEL_MAX_LEN {
                return None;
            }
            wire_len += label.len() + 1;
            all.push(label);
        }
        all.push(Vec::new());

        if wire_len <= DOMAINNAME_MAX_LEN {
            Some(Self { labels: all })
        } else {
            None
        }
    }

    /// Like `from_labels`, but the trailing root label is included in
    /// the argument.  Used by the deserialiser, which reads it from
    /// the wire.
    pub(crate) fn from_labels_with_root(labels: Vec<Vec<u8>>) -> Option<Self> {
        let mut labels = labels;
        if labels.pop() != Some(Vec::new()) {
            return None;
        }
        Self::from_labels(labels)
    }

    /// Parse the presentation format: labels separated by `.`, with a
    /// trailing `.` making the name fully qualified.  `\X` escapes a
    /// single character, `\DDD` (exactly three decimal digits) gives
    /// an arbitrary octet.
    ///
    /// Relative names are refused; use `from_relative_dotted_string`
    /// if there is an origin to complete them with.
    pub fn from_dotted_string(s: &str) -> Option<Self> {
        if s == "." {
            return Some(Self::root_domain());
        }

        let (labels, absolute) = parse_dotted(s)?;
        if absolute {
            Self::from_labels(labels)
        } else {
            None
        }
    }

    /// Parse a presentation-format name, completing a relative name
    /// with the origin.  `@` denotes the origin itself.
    pub fn from_relative_dotted_string(origin: &Self, s: &str) -> Option<Self> {
        if s.is_empty() || s == "@" {
            return Some(origin.clone());
        }
        if s == "." {
            return Some(Self::root_domain());
        }

        let (mut labels, absolute) = parse_dotted(s)?;
        if absolute {
            Self::from_labels(labels)
        } else {
            let mut origin_labels = origin.labels.clone();
            origin_labels.pop();
            labels.append(&mut origin_labels);
            Self::from_labels(labels)
        }
    }

    /// The presentation format of this name.  Octets outside the
    /// printable ASCII range come out as `\DDD`; `.`, `(`, `)`, `;`,
    /// space, `@`, `"`, and `\` come out as `\X`.
    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(self.wire_len() + 1);
        for label in &self.labels {
            if label.is_empty() {
                continue;
            }
            for octet in label {
                escape_name_octet(*octet, &mut out);
            }
            out.push('.');
        }
        out
    }

    /// The name with every octet lowercased, preserving structure.
    /// Useful for canonical forms (e.g. the to-be-signed rendering of
    /// a signer name); not needed for comparisons, which fold anyway.
    pub fn to_lowercase(&self) -> Self {
        Self {
            labels: self
                .labels
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        }
    }
}

/// The reserved set which gets `\X`-escaped in presentation format.
pub(crate) fn is_reserved_name_char(octet: u8) -> bool {
    matches!(
        octet,
        b'.' | b'(' | b')' | b';' | b' ' | b'@' | b'"' | b'\\'
    )
}

pub(crate) fn escape_name_octet(octet: u8, out: &mut String) {
    if is_reserved_name_char(octet) {
        out.push('\\');
        out.push(octet as char);
    } else if !(0x20..=0x7E).contains(&octet) {
        out.push('\\');
        out.push(char::from(b'0' + (octet / 100)));
        out.push(char::from(b'0' + ((octet / 10) % 10)));
        out.push(char::from(b'0' + (octet % 10)));
    } else {
        out.push(octet as char);
    }
}

/// Split a dotted string into labels, decoding escapes.  Returns the
/// labels (without a root label) and whether the name was absolute.
fn parse_dotted(s: &str) -> Option<(Vec<Vec<u8>>, bool)> {
    let mut labels = Vec::new();
    let mut current = Vec::new();
    let mut absolute = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() {
                    return None;
                }
                labels.push(std::mem::take(&mut current));
                if chars.peek().is_none() {
                    absolute = true;
                }
            }
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    let d2 = chars.next().filter(char::is_ascii_digit)?;
                    let d3 = chars.next().filter(char::is_ascii_digit)?;
                    let value = (d as u32 - '0' as u32) * 100
                        + (d2 as u32 - '0' as u32) * 10
                        + (d3 as u32 - '0' as u32);
                    current.push(u8::try_from(value).ok()?);
                }
                Some(other) if other.is_ascii() => current.push(other as u8),
                _ => return None,
            },
            other if other.is_ascii() => current.push(other as u8),
            _ => return None,
        }
    }

    if !current.is_empty() {
        labels.push(current);
    }

    if labels.is_empty() {
        None
    } else {
        Some((labels, absolute))
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for DomainName {}

impl PartialOrd for DomainName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomainName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let fold = |labels: &[Vec<u8>]| {
            labels
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect::<Vec<_>>()
        };
        fold(&self.labels).cmp(&fold(&other.labels))
    }
}

impl std::hash::Hash for DomainName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for label in &self.labels {
            state.write_usize(label.len());
            for octet in label {
                state.write_u8(octet.to_ascii_lowercase());
            }
        }
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dotted_string())
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainName")
            .field("to_dotted_string()", &self.to_dotted_string())
            .finish()
    }
}

impl FromStr for DomainName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dotted_string(s).ok_or(())
    }
}

/// Record types.  The `ANY` pseudo-type (called `*` in RFC 1035) can
/// only appear in questions; everything else can appear in records
/// too.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    A,
    NS,
    MD,
    MF,
    CNAME,
    SOA,
    MB,
    MG,
    MR,
    NULL,
    WKS,
    PTR,
    HINFO,
    MINFO,
    MX,
    TXT,
    RP,
    AFSDB,
    X25,
    ISDN,
    RT,
    NSAP,
    NSAPPTR,
    SIG,
    KEY,
    PX,
    GPOS,
    AAAA,
    LOC,
    NXT,
    EID,
    NIMLOC,
    SRV,
    ATMA,
    NAPTR,
    KX,
    CERT,
    A6,
    DNAME,
    OPT,
    APL,
    DS,
    SSHFP,
    IPSECKEY,
    RRSIG,
    NSEC,
    DNSKEY,
    DHCID,
    NSEC3,
    NSEC3PARAM,
    TLSA,
    SMIMEA,
    HIP,
    NINFO,
    RKEY,
    TALINK,
    CDS,
    CDNSKEY,
    OPENPGPKEY,
    CSYNC,
    SPF,
    UINFO,
    UID,
    GID,
    UNSPEC,
    NID,
    L32,
    L64,
    LP,
    EUI48,
    EUI64,
    TKEY,
    TSIG,
    ANY,
    URI,
    CAA,
    AVC,
    DOA,
    TA,
    DLV,
    Unknown(RecordTypeUnknown),
}

/// A struct with a private constructor, to ensure invalid
/// `RecordType`s cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RecordTypeUnknown(u16);

impl RecordType {
    pub fn is_unknown(self) -> bool {
        matches!(self, RecordType::Unknown(_))
    }

    /// Whether a record of this type answers a question with the
    /// given QTYPE.
    pub fn matches(self, qtype: RecordType) -> bool {
        qtype == RecordType::ANY || qtype == self
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            3 => RecordType::MD,
            4 => RecordType::MF,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            7 => RecordType::MB,
            8 => RecordType::MG,
            9 => RecordType::MR,
            10 => RecordType::NULL,
            11 => RecordType::WKS,
            12 => RecordType::PTR,
            13 => RecordType::HINFO,
            14 => RecordType::MINFO,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            17 => RecordType::RP,
            18 => RecordType::AFSDB,
            19 => RecordType::X25,
            20 => RecordType::ISDN,
            21 => RecordType::RT,
            22 => RecordType::NSAP,
            23 => RecordType::NSAPPTR,
            24 => RecordType::SIG,
            25 => RecordType::KEY,
            26 => RecordType::PX,
            27 => RecordType::GPOS,
            28 => RecordType::AAAA,
            29 => RecordType::LOC,
            30 => RecordType::NXT,
            31 => RecordType::EID,
            32 => RecordType::NIMLOC,
            33 => RecordType::SRV,
            34 => RecordType::ATMA,
            35 => RecordType::NAPTR,
            36 => RecordType::KX,
            37 => RecordType::CERT,
            38 => RecordType::A6,
            39 => RecordType::DNAME,
            41 => RecordType::OPT,
            42 => RecordType::APL,
            43 => RecordType::DS,
            44 => RecordType::SSHFP,
            45 => RecordType::IPSECKEY,
            46 => RecordType::RRSIG,
            47 => RecordType::NSEC,
            48 => RecordType::DNSKEY,
            49 => RecordType::DHCID,
            50 => RecordType::NSEC3,
            51 => RecordType::NSEC3PARAM,
            52 => RecordType::TLSA,
            53 => RecordType::SMIMEA,
            55 => RecordType::HIP,
            56 => RecordType::NINFO,
            57 => RecordType::RKEY,
            58 => RecordType::TALINK,
            59 => RecordType::CDS,
            60 => RecordType::CDNSKEY,
            61 => RecordType::OPENPGPKEY,
            62 => RecordType::CSYNC,
            99 => RecordType::SPF,
            100 => RecordType::UINFO,
            101 => RecordType::UID,
            102 => RecordType::GID,
            103 => RecordType::UNSPEC,
            104 => RecordType::NID,
            105 => RecordType::L32,
            106 => RecordType::L64,
            107 => RecordType::LP,
            108 => RecordType::EUI48,
            109 => RecordType::EUI64,
            249 => RecordType::TKEY,
            250 => RecordType::TSIG,
            255 => RecordType::ANY,
            256 => RecordType::URI,
            257 => RecordType::CAA,
            258 => RecordType::AVC,
            259 => RecordType::DOA,
            32768 => RecordType::TA,
            32769 => RecordType::DLV,
            _ => RecordType::Unknown(RecordTypeUnknown(value)),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::MD => 3,
            RecordType::MF => 4,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::MB => 7,
            RecordType::MG => 8,
            RecordType::MR => 9,
            RecordType::NULL => 10,
            RecordType::WKS => 11,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MINFO => 14,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::RP => 17,
            RecordType::AFSDB => 18,
            RecordType::X25 => 19,
            RecordType::ISDN => 20,
            RecordType::RT => 21,
            RecordType::NSAP => 22,
            RecordType::NSAPPTR => 23,
            RecordType::SIG => 24,
            RecordType::KEY => 25,
            RecordType::PX => 26,
            RecordType::GPOS => 27,
            RecordType::AAAA => 28,
            RecordType::LOC => 29,
            RecordType::NXT => 30,
            RecordType::EID => 31,
            RecordType::NIMLOC => 32,
            RecordType::SRV => 33,
            RecordType::ATMA => 34,
            RecordType::NAPTR => 35,
            RecordType::KX => 36,
            RecordType::CERT => 37,
            RecordType::A6 => 38,
            RecordType::DNAME => 39,
            RecordType::OPT => 41,
            RecordType::APL => 42,
            RecordType::DS => 43,
            RecordType::SSHFP => 44,
            RecordType::IPSECKEY => 45,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::DNSKEY => 48,
            RecordType::DHCID => 49,
            RecordType::NSEC3 => 50,
            RecordType::NSEC3PARAM => 51,
            RecordType::TLSA => 52,
            RecordType::SMIMEA => 53,
            RecordType::HIP => 55,
            RecordType::NINFO => 56,
            RecordType::RKEY => 57,
            RecordType::TALINK => 58,
            RecordType::CDS => 59,
            RecordType::CDNSKEY => 60,
            RecordType::OPENPGPKEY => 61,
            RecordType::CSYNC => 62,
            RecordType::SPF => 99,
            RecordType::UINFO => 100,
            RecordType::UID => 101,
            RecordType::GID => 102,
            RecordType::UNSPEC => 103,
            RecordType::NID => 104,
            RecordType::L32 => 105,
            RecordType::L64 => 106,
            RecordType::LP => 107,
            RecordType::EUI48 => 108,
            RecordType::EUI64 => 109,
            RecordType::TKEY => 249,
            RecordType::TSIG => 250,
            RecordType::ANY => 255,
            RecordType::URI => 256,
            RecordType::CAA => 257,
            RecordType::AVC => 258,
            RecordType::DOA => 259,
            RecordType::TA => 32768,
            RecordType::DLV => 32769,
            RecordType::Unknown(RecordTypeUnknown(value)) => value,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::NSAPPTR => write!(f, "NSAP-PTR"),
            RecordType::ANY => write!(f, "ANY"),
            RecordType::Unknown(RecordTypeUnknown(n)) => write!(f, "TYPE{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl FromStr for RecordType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // the RFC 3597 generic form works for known types too
        if let Some(n) = s.strip_prefix("TYPE") {
            return match n.parse::<u16>() {
                Ok(value) => Ok(RecordType::from(value)),
                Err(_) => Err(()),
            };
        }

        match s {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "MD" => Ok(RecordType::MD),
            "MF" => Ok(RecordType::MF),
            "CNAME" => Ok(RecordType::CNAME),
            "SOA" => Ok(RecordType::SOA),
            "MB" => Ok(RecordType::MB),
            "MG" => Ok(RecordType::MG),
            "MR" => Ok(RecordType::MR),
            "NULL" => Ok(RecordType::NULL),
            "WKS" => Ok(RecordType::WKS),
            "PTR" => Ok(RecordType::PTR),
            "HINFO" => Ok(RecordType::HINFO),
            "MINFO" => Ok(RecordType::MINFO),
            "MX" => Ok(RecordType::MX),
            "TXT" => Ok(RecordType::TXT),
            "RP" => Ok(RecordType::RP),
            "AFSDB" => Ok(RecordType::AFSDB),
            "X25" => Ok(RecordType::X25),
            "ISDN" => Ok(RecordType::ISDN),
            "RT" => Ok(RecordType::RT),
            "NSAP" => Ok(RecordType::NSAP),
            "NSAP-PTR" | "NSAPPTR" => Ok(RecordType::NSAPPTR),
            "SIG" => Ok(RecordType::SIG),
            "KEY" => Ok(RecordType::KEY),
            "PX" => Ok(RecordType::PX),
            "GPOS" => Ok(RecordType::GPOS),
            "AAAA" => Ok(RecordType::AAAA),
            "LOC" => Ok(RecordType::LOC),
            "NXT" => Ok(RecordType::NXT),
            "EID" => Ok(RecordType::EID),
            "NIMLOC" => Ok(RecordType::NIMLOC),
            "SRV" => Ok(RecordType::SRV),
            "ATMA" => Ok(RecordType::ATMA),
            "NAPTR" => Ok(RecordType::NAPTR),
            "KX" => Ok(RecordType::KX),
            "CERT" => Ok(RecordType::CERT),
            "A6" => Ok(RecordType::A6),
            "DNAME" => Ok(RecordType::DNAME),
            "OPT" => Ok(RecordType::OPT),
            "APL" => Ok(RecordType::APL),
            "DS" => Ok(RecordType::DS),
            "SSHFP" => Ok(RecordType::SSHFP),
            "IPSECKEY" => Ok(RecordType::IPSECKEY),
            "RRSIG" => Ok(RecordType::RRSIG),
            "NSEC" => Ok(RecordType::NSEC),
            "DNSKEY" => Ok(RecordType::DNSKEY),
            "DHCID" => Ok(RecordType::DHCID),
            "NSEC3" => Ok(RecordType::NSEC3),
            "NSEC3PARAM" => Ok(RecordType::NSEC3PARAM),
            "TLSA" => Ok(RecordType::TLSA),
            "SMIMEA" => Ok(RecordType::SMIMEA),
            "HIP" => Ok(RecordType::HIP),
            "NINFO" => Ok(RecordType::NINFO),
            "RKEY" => Ok(RecordType::RKEY),
            "TALINK" => Ok(RecordType::TALINK),
            "CDS" => Ok(RecordType::CDS),
            "CDNSKEY" => Ok(RecordType::CDNSKEY),
            "OPENPGPKEY" => Ok(RecordType::OPENPGPKEY),
            "CSYNC" => Ok(RecordType::CSYNC),
            "SPF" => Ok(RecordType::SPF),
            "UINFO" => Ok(RecordType::UINFO),
            "UID" => Ok(RecordType::UID),
            "GID" => Ok(RecordType::GID),
            "UNSPEC" => Ok(RecordType::UNSPEC),
            "NID" => Ok(RecordType::NID),
            "L32" => Ok(RecordType::L32),
            "L64" => Ok(RecordType::L64),
            "LP" => Ok(RecordType::LP),
            "EUI48" => Ok(RecordType::EUI48),
            "EUI64" => Ok(RecordType::EUI64),
            "TKEY" => Ok(RecordType::TKEY),
            "TSIG" => Ok(RecordType::TSIG),
            "ANY" | "*" => Ok(RecordType::ANY),
            "URI" => Ok(RecordType::URI),
            "CAA" => Ok(RecordType::CAA),
            "AVC" => Ok(RecordType::AVC),
            "DOA" => Ok(RecordType::DOA),
            "TA" => Ok(RecordType::TA),
            "DLV" => Ok(RecordType::DLV),
            _ => Err(()),
        }
    }
}

/// Record classes.  The `ANY` and `NONE` pseudo-classes can only
/// appear in questions (and UPDATE prerequisites, which are not
/// interpreted here).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordClass {
    IN,
    CH,
    HS,
    NONE,
    ANY,
    Unknown(RecordClassUnknown),
}

/// A struct with a private constructor, to ensure invalid
/// `RecordClass`es cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RecordClassUnknown(u16);

impl RecordClass {
    pub fn is_unknown(self) -> bool {
        matches!(self, RecordClass::Unknown(_))
    }

    pub fn matches(self, qclass: RecordClass) -> bool {
        qclass == RecordClass::ANY || qclass == self
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            254 => RecordClass::NONE,
            255 => RecordClass::ANY,
            _ => RecordClass::Unknown(RecordClassUnknown(value)),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::NONE => 254,
            RecordClass::ANY => 255,
            RecordClass::Unknown(RecordClassUnknown(value)) => value,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::IN => write!(f, "IN"),
            RecordClass::CH => write!(f, "CH"),
            RecordClass::HS => write!(f, "HS"),
            RecordClass::NONE => write!(f, "NONE"),
            RecordClass::ANY => write!(f, "ANY"),
            RecordClass::Unknown(RecordClassUnknown(n)) => write!(f, "CLASS{n}"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(RecordClass::IN),
            "CH" => Ok(RecordClass::CH),
            "HS" => Ok(RecordClass::HS),
            "NONE" => Ok(RecordClass::NONE),
            "ANY" | "*" => Ok(RecordClass::ANY),
            _ => match s.strip_prefix("CLASS").map(str::parse::<u16>) {
                Some(Ok(n)) => Ok(RecordClass::from(n)),
                _ => Err(()),
            },
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Opcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u8>()?))
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Rcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.int_in_range(0..=23)?))
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordType {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordClass {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for DomainName {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_labels = u.int_in_range::<usize>(0..=10)?;
        let mut labels = Vec::new();
        for _ in 0..num_labels {
            let label_len = u.int_in_range::<u8>(1..=20)?;
            let mut label = Vec::new();
            let bs = u.bytes(label_len.into())?;
            for b in bs {
                let ascii_byte = if b.is_ascii() { *b } else { *b % 128 };
                label.push(if ascii_byte == 0 { b'x' } else { ascii_byte });
            }
            labels.push(label);
        }
        labels.push(Vec::new());
        Ok(Self { labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_opcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Opcode::from(i)), i);
        }
    }

    #[test]
    fn u16_rcode_roundtrip() {
        for i in 0..30 {
            assert_eq!(u16::from(Rcode::from(i)), i);
        }
    }

    #[test]
    fn rcode_split_and_splice() {
        let rcode = Rcode::BadVers;
        assert_eq!(0, rcode.header_bits());
        assert_eq!(1, rcode.extended_bits());
        assert_eq!(
            rcode,
            Rcode::from_parts(rcode.header_bits(), rcode.extended_bits())
        );

        let rcode = Rcode::NameError;
        assert_eq!(3, rcode.header_bits());
        assert_eq!(0, rcode.extended_bits());
    }

    #[test]
    fn u16_recordtype_roundtrip() {
        for i in 0..300 {
            assert_eq!(u16::from(RecordType::from(i)), i);
        }
        assert_eq!(u16::from(RecordType::from(32768)), 32768);
        assert_eq!(u16::from(RecordType::from(32769)), 32769);
    }

    #[test]
    fn recordtype_mnemonic_roundtrip() {
        for i in 0..300 {
            let rtype = RecordType::from(i);
            assert_eq!(Ok(rtype), rtype.to_string().parse());
        }
    }

    #[test]
    fn u16_recordclass_roundtrip() {
        for i in 0..300 {
            assert_eq!(u16::from(RecordClass::from(i)), i);
        }
    }

    #[test]
    fn flags_word_roundtrip() {
        for flags in [
            0x0000,
            FLAG_QR | FLAG_AA | FLAG_RD,
            FLAG_QR | FLAG_TC | FLAG_RA | FLAG_AD | FLAG_CD,
            FLAG_Z | 0x0003,
            MASK_OPCODE | MASK_RCODE,
        ] {
            let header = Header::from_flags_word(0, flags);
            assert_eq!(flags, header.flags_word());
        }
    }

    #[test]
    fn domainname_root_conversions() {
        assert_eq!(
            Some(DomainName::root_domain()),
            DomainName::from_dotted_string(".")
        );

        assert_eq!(
            Some(DomainName::root_domain()),
            DomainName::from_labels(Vec::new())
        );

        assert_eq!(".", DomainName::root_domain().to_dotted_string());
    }

    #[test]
    fn domainname_case_preserved_but_ignored() {
        let upper = DomainName::from_dotted_string("WWW.Example.COM.").unwrap();
        let lower = DomainName::from_dotted_string("www.example.com.").unwrap();

        assert_eq!(upper, lower);
        assert_eq!("WWW.Example.COM.", upper.to_dotted_string());

        let mut hs = std::collections::HashSet::new();
        hs.insert(upper);
        assert!(hs.contains(&lower));
    }

    #[test]
    fn domainname_escape_roundtrip_all_octets() {
        for octet in 0..=255u8 {
            let name = DomainName::from_labels(vec![vec![octet]]).unwrap();
            let presentation = name.to_dotted_string();
            assert_eq!(
                Some(name),
                DomainName::from_dotted_string(&presentation),
                "octet {octet} failed via {presentation:?}"
            );
        }
    }

    #[test]
    fn domainname_escaped_dot_is_not_a_separator() {
        let name = DomainName::from_dotted_string("a\\.b.example.").unwrap();
        assert_eq!(3, name.labels.len());
        assert_eq!(b"a.b".to_vec(), name.labels[0]);
    }

    #[test]
    fn domainname_refuses_relative() {
        assert_eq!(None, DomainName::from_dotted_string("www.example.com"));

        let origin = DomainName::from_dotted_string("example.com.").unwrap();
        assert_eq!(
            DomainName::from_dotted_string("www.example.com."),
            DomainName::from_relative_dotted_string(&origin, "www")
        );
    }

    #[test]
    fn domainname_length_limits() {
        // 63-octet label is fine, 64 is not
        assert!(DomainName::from_labels(vec![vec![b'x'; 63]]).is_some());
        assert!(DomainName::from_labels(vec![vec![b'x'; 64]]).is_none());

        // three 63-octet labels and a 61-octet one, plus their length
        // octets and the root label, is exactly 255
        let labels = vec![vec![b'x'; 63], vec![b'x'; 63], vec![b'x'; 63], vec![b'x'; 61]];
        let name = DomainName::from_labels(labels).unwrap();
        assert_eq!(DOMAINNAME_MAX_LEN, name.wire_len());

        // one more octet pushes it over
        let labels = vec![vec![b'x'; 63], vec![b'x'; 63], vec![b'x'; 63], vec![b'x'; 62]];
        assert!(DomainName::from_labels(labels).is_none());
    }

    #[test]
    fn is_subdomain_of_folds_case() {
        let sub = DomainName::from_dotted_string("WWW.EXAMPLE.COM.").unwrap();
        let parent = DomainName::from_dotted_string("example.com.").unwrap();
        assert!(sub.is_subdomain_of(&parent));
        assert!(!parent.is_subdomain_of(&sub));
        assert!(sub.is_subdomain_of(&DomainName::root_domain()));
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordData {
    // this is pretty verbose but each shape has its own invariants
    // (length-prefixed fields, suffix-only A6 bits, non-empty CAA
    // tags) which a derived impl would not respect
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        use crate::protocol::bitmap::TypeBitmap;
        use crate::protocol::rdata::{AplItem, Gateway};

        fn blob(u: &mut arbitrary::Unstructured, max: usize) -> arbitrary::Result<Vec<u8>> {
            let len = u.int_in_range(0..=max)?;
            Ok(u.bytes(len)?.to_vec())
        }

        fn bitmap(u: &mut arbitrary::Unstructured) -> arbitrary::Result<TypeBitmap> {
            let len = u.int_in_range(0..=6)?;
            let mut types = Vec::with_capacity(len);
            for _ in 0..len {
                types.push(RecordType::from(u.int_in_range(1..=300)?));
            }
            Ok(TypeBitmap::from_types(types))
        }

        let data = match u.int_in_range(0..=31)? {
            0 => RecordData::A {
                address: u.arbitrary()?,
            },
            1 => RecordData::Aaaa {
                address: u.arbitrary()?,
            },
            2 => {
                let tags = [
                    RecordType::NS,
                    RecordType::MD,
                    RecordType::MF,
                    RecordType::CNAME,
                    RecordType::MB,
                    RecordType::MG,
                    RecordType::MR,
                    RecordType::PTR,
                    RecordType::NSAPPTR,
                    RecordType::DNAME,
                ];
                RecordData::Name {
                    tag: *u.choose(&tags)?,
                    name: u.arbitrary()?,
                }
            }
            3 => RecordData::Soa {
                mname: u.arbitrary()?,
                rname: u.arbitrary()?,
                serial: u.arbitrary()?,
                refresh: u.arbitrary()?,
                retry: u.arbitrary()?,
                expire: u.arbitrary()?,
                minimum: u.arbitrary()?,
            },
            4 => {
                let tags = [RecordType::MINFO, RecordType::RP, RecordType::TALINK];
                RecordData::NamePair {
                    tag: *u.choose(&tags)?,
                    first: u.arbitrary()?,
                    second: u.arbitrary()?,
                }
            }
            5 => {
                let tags = [
                    RecordType::MX,
                    RecordType::AFSDB,
                    RecordType::RT,
                    RecordType::KX,
                ];
                RecordData::Exchange {
                    tag: *u.choose(&tags)?,
                    preference: u.arbitrary()?,
                    exchange: u.arbitrary()?,
                }
            }
            6 => {
                let tags = [
                    RecordType::TXT,
                    RecordType::SPF,
                    RecordType::AVC,
                    RecordType::NINFO,
                    RecordType::HINFO,
                    RecordType::X25,
                    RecordType::ISDN,
                    RecordType::GPOS,
                ];
                let count = u.int_in_range(1..=3)?;
                let mut strings = Vec::with_capacity(count);
                for _ in 0..count {
                    strings.push(blob(u, 20)?);
                }
                RecordData::Strings {
                    tag: *u.choose(&tags)?,
                    strings,
                }
            }
            7 => {
                // the presentation form is a port list, so trailing
                // zero octets would not survive a round-trip
                let mut bitmap = blob(u, 16)?;
                while bitmap.last() == Some(&0) {
                    bitmap.pop();
                }
                RecordData::Wks {
                    address: u.arbitrary()?,
                    protocol: u.arbitrary()?,
                    bitmap,
                }
            }
            8 => {
                let tags = [
                    RecordType::NULL,
                    RecordType::EID,
                    RecordType::NIMLOC,
                    RecordType::NSAP,
                    RecordType::ATMA,
                    RecordType::UINFO,
                    RecordType::UID,
                    RecordType::GID,
                    RecordType::UNSPEC,
                    RecordType::DHCID,
                    RecordType::OPENPGPKEY,
                ];
                RecordData::Opaque {
                    tag: *u.choose(&tags)?,
                    octets: blob(u, 32)?,
                }
            }
            9 => RecordData::Srv {
                priority: u.arbitrary()?,
                weight: u.arbitrary()?,
                port: u.arbitrary()?,
                target: u.arbitrary()?,
            },
            10 => RecordData::Naptr {
                order: u.arbitrary()?,
                preference: u.arbitrary()?,
                flags: blob(u, 4)?,
                services: blob(u, 16)?,
                regexp: blob(u, 16)?,
                replacement: u.arbitrary()?,
            },
            11 => RecordData::Px {
                preference: u.arbitrary()?,
                map822: u.arbitrary()?,
                mapx400: u.arbitrary()?,
            },
            12 => {
                // sizes restricted to normalised exponent-mantissa
                // values, which are the only ones the presentation
                // form can express
                let mut size = || -> arbitrary::Result<u8> {
                    Ok((u.int_in_range(0..=9u8)? << 4) | u.int_in_range(0..=9u8)?)
                };
                RecordData::Loc {
                    version: 0,
                    size: size()?,
                    horizontal_precision: size()?,
                    vertical_precision: size()?,
                    latitude: u.arbitrary()?,
                    longitude: u.arbitrary()?,
                    altitude: u.arbitrary()?,
                }
            }
            13 => RecordData::Sig {
                tag: *u.choose(&[RecordType::SIG, RecordType::RRSIG])?,
                type_covered: RecordType::from(u.int_in_range(1..=260)?),
                algorithm: u.arbitrary()?,
                labels: u.arbitrary()?,
                original_ttl: u.arbitrary()?,
                expiration: u.arbitrary()?,
                inception: u.arbitrary()?,
                key_tag: u.arbitrary()?,
                signer: u.arbitrary()?,
                signature: blob(u, 64)?,
            },
            31 => {
                // NXT types only reach 127, and the trailing-zero
                // rule is the same as for WKS
                let mut bitmap = blob(u, 16)?;
                while bitmap.last() == Some(&0) {
                    bitmap.pop();
                }
                RecordData::Nxt {
                    next: u.arbitrary()?,
                    bitmap,
                }
            }
            14 => RecordData::Key {
                tag: *u.choose(&[
                    RecordType::KEY,
                    RecordType::DNSKEY,
                    RecordType::CDNSKEY,
                    RecordType::RKEY,
                ])?,
                flags: u.arbitrary()?,
                protocol: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                public_key: blob(u, 64)?,
            },
            15 => RecordData::Ds {
                tag: *u.choose(&[
                    RecordType::DS,
                    RecordType::CDS,
                    RecordType::TA,
                    RecordType::DLV,
                ])?,
                key_tag: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                digest_type: u.arbitrary()?,
                digest: blob(u, 32)?,
            },
            16 => RecordData::Nsec {
                next: u.arbitrary()?,
                types: bitmap(u)?,
            },
            17 => {
                let hash_len = u.int_in_range(1..=20)?;
                RecordData::Nsec3 {
                    hash_algorithm: u.arbitrary()?,
                    flags: u.arbitrary()?,
                    iterations: u.arbitrary()?,
                    salt: blob(u, 16)?,
                    next_hashed: u.bytes(hash_len)?.to_vec(),
                    types: bitmap(u)?,
                }
            }
            18 => RecordData::Nsec3Param {
                hash_algorithm: u.arbitrary()?,
                flags: u.arbitrary()?,
                iterations: u.arbitrary()?,
                salt: blob(u, 16)?,
            },
            19 => RecordData::Cert {
                cert_type: u.arbitrary()?,
                key_tag: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                certificate: blob(u, 64)?,
            },
            20 => RecordData::Sshfp {
                algorithm: u.arbitrary()?,
                fingerprint_type: u.arbitrary()?,
                fingerprint: blob(u, 32)?,
            },
            21 => RecordData::Tlsa {
                tag: *u.choose(&[RecordType::TLSA, RecordType::SMIMEA])?,
                usage: u.arbitrary()?,
                selector: u.arbitrary()?,
                matching_type: u.arbitrary()?,
                certificate_data: blob(u, 32)?,
            },
            22 => {
                let gateway = match u.int_in_range(0..=3)? {
                    0 => Gateway::None,
                    1 => Gateway::Ipv4(u.arbitrary()?),
                    2 => Gateway::Ipv6(u.arbitrary()?),
                    _ => Gateway::Name(u.arbitrary()?),
                };
                RecordData::Ipseckey {
                    precedence: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    gateway,
                    public_key: blob(u, 32)?,
                }
            }
            23 => RecordData::Csync {
                serial: u.arbitrary()?,
                flags: u.arbitrary()?,
                types: bitmap(u)?,
            },
            24 => {
                // tags are alphanumeric (RFC 8659 section 4.1), and
                // the presentation form prints them unescaped
                let tag_len = u.int_in_range(1..=15)?;
                let mut tag_string = Vec::with_capacity(tag_len);
                for _ in 0..tag_len {
                    let alphanumeric = b"abcdefghijklmnopqrstuvwxyz0123456789";
                    tag_string.push(*u.choose(alphanumeric)?);
                }
                RecordData::Caa {
                    flags: u.arbitrary()?,
                    tag_string,
                    value: blob(u, 32)?,
                }
            }
            25 => RecordData::Uri {
                priority: u.arbitrary()?,
                weight: u.arbitrary()?,
                target: blob(u, 32)?,
            },
            26 => match u.int_in_range(0..=3)? {
                0 => RecordData::Nid {
                    preference: u.arbitrary()?,
                    node_id: u.arbitrary()?,
                },
                1 => RecordData::L32 {
                    preference: u.arbitrary()?,
                    locator: u.arbitrary()?,
                },
                2 => RecordData::L64 {
                    preference: u.arbitrary()?,
                    locator: u.arbitrary()?,
                },
                _ => RecordData::Lp {
                    preference: u.arbitrary()?,
                    fqdn: u.arbitrary()?,
                },
            },
            27 => {
                if u.arbitrary()? {
                    RecordData::Eui48 {
                        address: u.arbitrary()?,
                    }
                } else {
                    RecordData::Eui64 {
                        address: u.arbitrary()?,
                    }
                }
            }
            28 => {
                let prefix_length = u.int_in_range(0..=128)?;
                let suffix_len = (128 - usize::from(prefix_length)).div_ceil(8);
                let mut octets = [0u8; 16];
                for octet in &mut octets[16 - suffix_len..] {
                    *octet = u.arbitrary()?;
                }
                RecordData::A6 {
                    prefix_length,
                    suffix: std::net::Ipv6Addr::from(octets),
                    prefix_name: if prefix_length == 0 {
                        None
                    } else {
                        Some(u.arbitrary()?)
                    },
                }
            }
            29 => {
                let count = u.int_in_range(0..=3)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    // only address families 1 and 2 have presentation
                    // forms; the wire form trims trailing zero octets
                    let family = u.int_in_range(1..=2u16)?;
                    let mut address = blob(u, if family == 1 { 4 } else { 16 })?;
                    while address.last() == Some(&0) {
                        address.pop();
                    }
                    items.push(AplItem {
                        family,
                        prefix: u.arbitrary()?,
                        negate: u.arbitrary()?,
                        address,
                    });
                }
                RecordData::Apl { items }
            }
            _ => {
                if u.arbitrary()? {
                    // TSIG and TKEY rather than OPT: OPT is handled by
                    // the pseudo-section machinery, not the sections
                    RecordData::Tsig {
                        algorithm: u.arbitrary()?,
                        time_signed: u64::from(u.arbitrary::<u32>()?),
                        fudge: u.arbitrary()?,
                        mac: blob(u, 32)?,
                        original_id: u.arbitrary()?,
                        error: u.arbitrary()?,
                        other: blob(u, 8)?,
                    }
                } else {
                    RecordData::Unknown {
                        tag: RecordType::from(u.int_in_range(300..=32000)?),
                        octets: blob(u, 32)?,
                    }
                }
            }
        };

        Ok(data)
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for ResourceRecord {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self {
            name: u.arbitrary()?,
            data: u.arbitrary()?,
            rclass: RecordClass::from(u.int_in_range(1..=4)?),
            ttl: u.arbitrary()?,
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Question {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self {
            name: u.arbitrary()?,
            qtype: u.arbitrary()?,
            qclass: u.arbitrary()?,
        })
    }
}

#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use super::*;

    use arbitrary::{Arbitrary, Unstructured};
    use rand::RngCore;
    use std::net::{Ipv4Addr, Ipv6Addr};

    pub fn arbitrary_resourcerecord() -> ResourceRecord {
        for size in [128, 256, 512, 1024, 2048, 4096] {
            let mut buf = vec![0; size];
            rand::thread_rng().fill_bytes(&mut buf);

            if let Ok(rr) = ResourceRecord::arbitrary(&mut Unstructured::new(&buf)) {
                return rr;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    pub fn question(name: &str, qtype: RecordType) -> Question {
        Question {
            name: domain(name),
            qtype,
            qclass: RecordClass::IN,
        }
    }

    pub fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::A { address },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn aaaa_record(name: &str, address: Ipv6Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::Aaaa { address },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn cname_record(name: &str, target_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::Name {
                tag: RecordType::CNAME,
                name: domain(target_name),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn ns_record(superdomain_name: &str, nameserver_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(superdomain_name),
            data: RecordData::Name {
                tag: RecordType::NS,
                name: domain(nameserver_name),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn mx_record(name: &str, preference: u16, exchange: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::Exchange {
                tag: RecordType::MX,
                preference,
                exchange: domain(exchange),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn soa_record(
        name: &str,
        mname: &str,
        rname: &str,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::Soa {
                mname: domain(mname),
                rname: domain(rname),
                serial,
                refresh,
                retry,
                expire,
                minimum,
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn unknown_record(name: &str, octets: &[u8]) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            data: RecordData::Unknown {
                tag: RecordType::from(1000),
                octets: octets.into(),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }
}
