use bytes::Bytes;
#[cfg(any(feature = "test-util", test))]
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::mnemonic::{self, UnknownMnemonic};

/// Maximum encoded length of a domain name.  The number of labels
/// plus sum of the lengths of the labels.
pub const DOMAINNAME_MAX_LEN: usize = 255;

/// Maximum length of a single label in a domain name.
pub const LABEL_MAX_LEN: usize = 63;

/// Length of the fixed header at the start of every message.
pub const HEADER_LEN: usize = 12;

/// Octet mask for the QR flag being set (response).
pub const HEADER_MASK_QR: u8 = 0b1000_0000;

/// Octet mask for the opcode field.
pub const HEADER_MASK_OPCODE: u8 = 0b0111_1000;

/// Offset for the opcode field.
pub const HEADER_OFFSET_OPCODE: usize = 3;

/// Octet mask for the AA flag being set (authoritative).
pub const HEADER_MASK_AA: u8 = 0b0000_0100;

/// Octet mask for the TC flag being set (truncated).
pub const HEADER_MASK_TC: u8 = 0b0000_0010;

/// Octet mask for the RD flag being set (recursion desired).
pub const HEADER_MASK_RD: u8 = 0b0000_0001;

/// Octet mask for the RA flag being set (recursion available).
pub const HEADER_MASK_RA: u8 = 0b1000_0000;

/// Octet mask for the rcode field.
pub const HEADER_MASK_RCODE: u8 = 0b0000_1111;

/// Offset for the rcode field.
pub const HEADER_OFFSET_RCODE: usize = 0;

/// Flag in the first word of WINS / WINS-R RDATA meaning the record
/// is local to this server and must not be replicated.
pub const WINS_FLAG_LOCAL: u32 = 0x0001_0000;

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
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// A standard query for a single question.
    pub fn make_query(
        id: u16,
        name: DomainName,
        qtype: RecordType,
        qclass: RecordClass,
        recursion_desired: bool,
    ) -> Self {
        Self {
            header: Header {
                id,
                is_response: false,
                opcode: Opcode::Query,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired,
                recursion_available: false,
                rcode: Rcode::NoError,
                qdcount: 1,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            },
            questions: vec![Question {
                name,
                qtype,
                qclass,
            }],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// The records of one of the three resource record sections.  The
    /// question section holds no records, so is always empty here.
    pub fn records(&self, section: Section) -> &[ResourceRecord] {
        match section {
            Section::Question => &[],
            Section::Answer => &self.answers,
            Section::Authority => &self.authority,
            Section::Additional => &self.additional,
        }
    }

    /// A negative answer: the name does not exist, or it exists but
    /// has no data of the requested type.  This is not a parse error.
    pub fn is_negative(&self) -> bool {
        match self.header.rcode {
            Rcode::NameError => true,
            Rcode::NoError => self.header.is_response && self.answers.is_empty(),
            _ => false,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Message {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut header: Header = u.arbitrary()?;

        let mut questions = Vec::new();
        for _ in 0..u.int_in_range::<u8>(0..=3)? {
            questions.push(u.arbitrary()?);
        }
        let mut sections: [Vec<ResourceRecord>; 3] = Default::default();
        for section in &mut sections {
            for _ in 0..u.int_in_range::<u8>(0..=4)? {
                section.push(u.arbitrary()?);
            }
        }
        let [answers, authority, additional] = sections;

        // the lengths are all tiny, so these casts cannot truncate
        header.qdcount = questions.len() as u16;
        header.ancount = answers.len() as u16;
        header.nscount = authority.len() as u16;
        header.arcount = additional.len() as u16;

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
        })
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
///     |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
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
/// See section 4.1.1 of RFC 1035.
///
/// The counts are the values as they appeared on the wire.  When
/// serialising, the lengths of the `Message` sections are written
/// instead.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any
    /// kind of query.  This identifier is copied the corresponding
    /// reply and can be used by the requester to match up replies to
    /// outstanding queries.
    pub id: u16,

    /// A one bit field that specifies whether this message is a query
    /// (0), or a response (1).
    pub is_response: bool,

    /// A four bit field that specifies kind of query in this message.
    pub opcode: Opcode,

    /// Authoritative Answer - this bit is valid in responses, and
    /// specifies that the responding name server is an authority for
    /// the domain name in question section.
    pub is_authoritative: bool,

    /// Truncation - specifies that this message was truncated due to
    /// length greater than that permitted on the transmission
    /// channel.
    pub is_truncated: bool,

    /// Recursion Desired - this bit may be set in a query and is
    /// copied into the response.
    pub recursion_desired: bool,

    /// Recursion Available - this be is set or cleared in a response,
    /// and denotes whether recursive query support is available in
    /// the name server.
    pub recursion_available: bool,

    /// Response code - this 4 bit field is set as part of responses.
    pub rcode: Rcode,

    /// Number of entries in the question section.
    pub qdcount: u16,

    /// Number of resource records in the answer section.
    pub ancount: u16,

    /// Number of name server resource records in the authority
    /// section.
    pub nscount: u16,

    /// Number of resource records in the additional section.
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
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Question {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
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
/// See section 4.1.3 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResourceRecord {
    /// a domain name to which this resource record pertains.
    pub name: DomainName,

    pub rtype: RecordType,

    pub rclass: RecordClass,

    /// a 32 bit unsigned integer that specifies the time interval (in
    /// seconds) that the resource record may be cached before it
    /// should be discarded.
    pub ttl: u32,

    /// The RDLENGTH as it appeared on the wire.  Names in RDATA may be
    /// compressed, so this can be smaller than the decoded data.
    pub rdlength: u16,

    pub rdata: RData,
}

impl ResourceRecord {
    /// Build a record, computing `rdlength` from the uncompressed
    /// encoding of `rdata`.
    pub fn new(
        name: DomainName,
        rtype: RecordType,
        rclass: RecordClass,
        ttl: u32,
        rdata: RData,
    ) -> Self {
        let rdlength = u16::try_from(rdata.wire_len()).unwrap_or(u16::MAX);
        Self {
            name,
            rtype,
            rclass,
            ttl,
            rdlength,
            rdata,
        }
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for ResourceRecord {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        // every decodable type, two opaque ones, and NULL
        const TYPES: [u16; 34] = [
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 23, 24,
            25, 28, 30, 33, 34, 36, 39, 249, 0xFF01, 0xFF02, 0x1234,
        ];

        let rtype = RecordType(*u.choose(&TYPES)?);
        let rdata = RData::arbitrary_for(rtype, u)?;
        Ok(Self::new(
            u.arbitrary()?,
            rtype,
            u.arbitrary()?,
            u.arbitrary()?,
            rdata,
        ))
    }
}

/// The decoded RDATA of a record.  Several record types share a
/// shape: which variant a type decodes to is decided by
/// `rdata::Shape::of`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RData {
    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    ADDRESS                    |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// `A`: a 32 bit Internet address.
    Address(Ipv4Addr),

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                    DNAME                      /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// `NS`, `MD`, `MF`, `CNAME`, `MB`, `MG`, `MR`, `PTR`, `NSAPPTR`
    /// and `DNAME`: a single domain name.
    DomainRef(DomainName),

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                    FIRST                      /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                    SECOND                     /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// `MINFO` (`RMAILBX`, `EMAILBX`) and `RP` (`MBOX`, `TXTDNAME`).
    NamePair {
        first: DomainName,
        second: DomainName,
    },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                  PREFERENCE                   |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     NAME                      /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// `MX`, `AFSDB` (where the integer is a subtype), `RT` and `KX`.
    PreferenceAndName { preference: u16, name: DomainName },

    /// One or more `<character-string>`s, each a length octet followed
    /// by that many octets.
    ///
    /// `HINFO`, `TXT`, `X25` and `ISDN`.
    StringList(Vec<Bytes>),

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     MNAME                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     RNAME                     /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    SERIAL                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    REFRESH                    |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                     RETRY                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    EXPIRE                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    MINIMUM                    |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// See section 3.3.13 of RFC 1035.
    Soa {
        mname: DomainName,
        rname: DomainName,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },

    /// Uninterpreted octets: the RDATA of `NULL`, and of every type
    /// without a decoder.
    Octets(Bytes),

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    ADDRESS                    |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |       PROTOCOL        |                       |
    ///     +--+--+--+--+--+--+--+--+                       |
    ///     |                                               |
    ///     /                   <BIT MAP>                   /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// See section 3.4.2 of RFC 1035.
    Wks {
        address: Ipv4Addr,
        protocol: u8,
        bitmap: Bytes,
    },

    /// `AAAA`: a 128 bit IPv6 address.
    Aaaa(Ipv6Addr),

    /// See section 4.1 of RFC 2535.
    Sig {
        type_covered: RecordType,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: DomainName,
        signature: Bytes,
    },

    /// See section 3.1 of RFC 2535.
    Key {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Bytes,
    },

    /// An ATM address: format 0 is a 20 octet AESA, format 1 is E.164
    /// digits.  Other formats are not understood and have an empty
    /// address.
    Atma { format: u8, address: Bytes },

    /// See section 5.2 of RFC 2535.
    Nxt { next: DomainName, bitmap: Bytes },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                   PRIORITY                    |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    WEIGHT                     |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                     PORT                      |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                    TARGET                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// See RFC 2782.
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                 FLAGS (32 bit)                |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |            LOOKUP TIMEOUT (32 bit)            |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |             CACHE TIMEOUT (32 bit)            |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |           NUMBER OF SERVERS (32 bit)          |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /              SERVER ADDRESSES                 /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Microsoft `WINS` forward lookup.
    WinsForward {
        replicate: bool,
        lookup_timeout: u32,
        cache_timeout: u32,
        servers: Vec<Ipv4Addr>,
    },

    /// Microsoft `WINSR` reverse lookup: the same leading words as
    /// `WINS`, then the domain to append to a NetBIOS name.
    WinsReverse {
        replicate: bool,
        lookup_timeout: u32,
        cache_timeout: u32,
        name: DomainName,
    },
}

impl RData {
    /// The length of the uncompressed wire encoding.
    pub fn wire_len(&self) -> usize {
        match self {
            RData::Address(_) => 4,
            RData::DomainRef(name) => name.len,
            RData::NamePair { first, second } => first.len + second.len,
            RData::PreferenceAndName { name, .. } => 2 + name.len,
            RData::StringList(strings) => strings.iter().map(|s| 1 + s.len()).sum(),
            RData::Soa { mname, rname, .. } => mname.len + rname.len + 20,
            RData::Octets(octets) => octets.len(),
            RData::Wks { bitmap, .. } => 5 + bitmap.len(),
            RData::Aaaa(_) => 16,
            RData::Sig {
                signer, signature, ..
            } => 18 + signer.len + signature.len(),
            RData::Key { public_key, .. } => 4 + public_key.len(),
            RData::Atma { address, .. } => 1 + address.len(),
            RData::Nxt { next, bitmap } => next.len + bitmap.len(),
            RData::Srv { target, .. } => 6 + target.len,
            RData::WinsForward { servers, .. } => 16 + 4 * servers.len(),
            RData::WinsReverse { name, .. } => 12 + name.len,
        }
    }

    /// Generate RDATA which survives a serialise / deserialise round
    /// trip as a record of the given type.
    #[cfg(any(feature = "test-util", test))]
    pub fn arbitrary_for(
        rtype: RecordType,
        u: &mut arbitrary::Unstructured<'_>,
    ) -> arbitrary::Result<Self> {
        use crate::protocol::rdata::Shape;

        fn octets(u: &mut arbitrary::Unstructured<'_>, max: usize) -> arbitrary::Result<Bytes> {
            let len = u.int_in_range::<usize>(0..=max)?;
            Ok(Bytes::copy_from_slice(u.bytes(len)?))
        }

        let rdata = match Shape::of(rtype) {
            Shape::Address => RData::Address(Ipv4Addr::from(u.arbitrary::<u32>()?)),
            Shape::DomainRef => RData::DomainRef(u.arbitrary()?),
            Shape::NamePair => RData::NamePair {
                first: u.arbitrary()?,
                second: u.arbitrary()?,
            },
            Shape::PreferenceAndName => RData::PreferenceAndName {
                preference: u.arbitrary()?,
                name: u.arbitrary()?,
            },
            Shape::StringList => {
                let mut strings = Vec::new();
                for _ in 0..u.int_in_range::<u8>(0..=4)? {
                    strings.push(octets(u, 64)?);
                }
                RData::StringList(strings)
            }
            Shape::Soa => RData::Soa {
                mname: u.arbitrary()?,
                rname: u.arbitrary()?,
                serial: u.arbitrary()?,
                refresh: u.arbitrary()?,
                retry: u.arbitrary()?,
                expire: u.arbitrary()?,
                minimum: u.arbitrary()?,
            },
            Shape::Null | Shape::Opaque => RData::Octets(octets(u, 128)?),
            Shape::Wks => RData::Wks {
                address: Ipv4Addr::from(u.arbitrary::<u32>()?),
                protocol: u.arbitrary()?,
                bitmap: octets(u, 32)?,
            },
            Shape::Aaaa => RData::Aaaa(Ipv6Addr::from(u.arbitrary::<u128>()?)),
            Shape::Sig => RData::Sig {
                type_covered: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                labels: u.arbitrary()?,
                original_ttl: u.arbitrary()?,
                expiration: u.arbitrary()?,
                inception: u.arbitrary()?,
                key_tag: u.arbitrary()?,
                signer: u.arbitrary()?,
                signature: octets(u, 64)?,
            },
            Shape::Key => RData::Key {
                flags: u.arbitrary()?,
                protocol: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                public_key: octets(u, 64)?,
            },
            Shape::Atma => match u.int_in_range::<u8>(0..=2)? {
                0 => RData::Atma {
                    format: 0,
                    address: Bytes::copy_from_slice(u.bytes(20)?),
                },
                1 => {
                    let digits = u.int_in_range::<usize>(1..=15)?;
                    let mut address = BytesMut::with_capacity(digits);
                    for b in u.bytes(digits)? {
                        address.put_u8(b'0' + b % 10);
                    }
                    RData::Atma {
                        format: 1,
                        address: address.freeze(),
                    }
                }
                _ => RData::Atma {
                    format: u.int_in_range::<u8>(2..=255)?,
                    address: Bytes::new(),
                },
            },
            Shape::Nxt => RData::Nxt {
                next: u.arbitrary()?,
                bitmap: octets(u, 16)?,
            },
            Shape::Srv => RData::Srv {
                priority: u.arbitrary()?,
                weight: u.arbitrary()?,
                port: u.arbitrary()?,
                target: u.arbitrary()?,
            },
            Shape::WinsForward => {
                let mut servers = Vec::new();
                for _ in 0..u.int_in_range::<u8>(0..=4)? {
                    servers.push(Ipv4Addr::from(u.arbitrary::<u32>()?));
                }
                RData::WinsForward {
                    replicate: u.arbitrary()?,
                    lookup_timeout: u.arbitrary()?,
                    cache_timeout: u.arbitrary()?,
                    servers,
                }
            }
            Shape::WinsReverse => RData::WinsReverse {
                replicate: u.arbitrary()?,
                lookup_timeout: u.arbitrary()?,
                cache_timeout: u.arbitrary()?,
                name: u.arbitrary()?,
            },
        };
        Ok(rdata)
    }
}

/// Presentation format, roughly as in a zone file.  Opaque data uses
/// the generic `\# <len> <hex>` syntax of RFC 3597.
impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RData::Address(address) => write!(f, "{address}"),
            RData::DomainRef(name) => write!(f, "{name}"),
            RData::NamePair { first, second } => write!(f, "{first} {second}"),
            RData::PreferenceAndName { preference, name } => write!(f, "{preference} {name}"),
            RData::StringList(strings) => {
                let mut first = true;
                for string in strings {
                    if first {
                        first = false;
                    } else {
                        write!(f, " ")?;
                    }
                    write_quoted(f, string)?;
                }
                Ok(())
            }
            RData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"
            ),
            RData::Octets(octets) => {
                write!(f, "\\# {}", octets.len())?;
                if !octets.is_empty() {
                    write!(f, " ")?;
                    write_hex(f, octets)?;
                }
                Ok(())
            }
            RData::Wks {
                address,
                protocol,
                bitmap,
            } => {
                write!(f, "{address} {protocol} ")?;
                write_hex(f, bitmap)
            }
            RData::Aaaa(address) => write!(f, "{address}"),
            RData::Sig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer,
                signature,
            } => {
                write!(f, "{type_covered} {algorithm} {labels} {original_ttl} {expiration} {inception} {key_tag} {signer} ")?;
                write_hex(f, signature)
            }
            RData::Key {
                flags,
                protocol,
                algorithm,
                public_key,
            } => {
                write!(f, "{flags} {protocol} {algorithm} ")?;
                write_hex(f, public_key)
            }
            RData::Atma { format, address } => match format {
                0 => write_hex(f, address),
                1 => write!(f, "+{}", String::from_utf8_lossy(address)),
                _ => write!(f, "format-{format}"),
            },
            RData::Nxt { next, bitmap } => {
                write!(f, "{next} ")?;
                write_hex(f, bitmap)
            }
            RData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            RData::WinsForward {
                replicate,
                lookup_timeout,
                cache_timeout,
                servers,
            } => {
                if !replicate {
                    write!(f, "LOCAL ")?;
                }
                write!(f, "L{lookup_timeout} C{cache_timeout}")?;
                for server in servers {
                    write!(f, " {server}")?;
                }
                Ok(())
            }
            RData::WinsReverse {
                replicate,
                lookup_timeout,
                cache_timeout,
                name,
            } => {
                if !replicate {
                    write!(f, "LOCAL ")?;
                }
                write!(f, "L{lookup_timeout} C{cache_timeout} {name}")
            }
        }
    }
}

fn write_hex(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    for octet in octets {
        write!(f, "{octet:02x}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for octet in octets {
        match octet {
            b'"' | b'\\' => write!(f, "\\{}", *octet as char)?,
            0x20..=0x7e => write!(f, "{}", *octet as char)?,
            _ => write!(f, "\\{octet:03}")?,
        }
    }
    write!(f, "\"")
}

/// What sort of query this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Reserved(OpcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Opcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OpcodeReserved(u8);

impl Opcode {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Opcode::Reserved(_))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Opcode::Query => write!(f, "QUERY"),
            Opcode::IQuery => write!(f, "IQUERY"),
            Opcode::Status => write!(f, "STATUS"),
            Opcode::Notify => write!(f, "NOTIFY"),
            Opcode::Update => write!(f, "UPDATE"),
            Opcode::Reserved(OpcodeReserved(octet)) => write!(f, "OPCODE{octet}"),
        }
    }
}

impl From<u8> for Opcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
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
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Reserved(OpcodeReserved(octet)) => octet,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Opcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u8>()?))
    }
}

/// What sort of response this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(RcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Rcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RcodeReserved(u8);

impl Rcode {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Rcode::Reserved(_))
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rcode::NoError => write!(f, "NOERROR"),
            Rcode::FormatError => write!(f, "FORMERR"),
            Rcode::ServerFailure => write!(f, "SERVFAIL"),
            Rcode::NameError => write!(f, "NXDOMAIN"),
            Rcode::NotImplemented => write!(f, "NOTIMP"),
            Rcode::Refused => write!(f, "REFUSED"),
            Rcode::Reserved(RcodeReserved(octet)) => write!(f, "RCODE{octet}"),
        }
    }
}

impl From<u8> for Rcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            other => Rcode::Reserved(RcodeReserved(other)),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::Reserved(RcodeReserved(octet)) => octet,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Rcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u8>()?))
    }
}

/// The four sections of a message, in wire order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Question,
        Section::Answer,
        Section::Authority,
        Section::Additional,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Question => "question",
            Section::Answer => "answer",
            Section::Authority => "authority",
            Section::Additional => "additional",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A domain name is a sequence of labels, where each label is a
/// length octet followed by that number of octets.
///
/// A label must be 63 octets or shorter.  A name must be 255 octets
/// or shorter in total, including both length and label octets.
///
/// Labels keep the case they had on the wire, so equality is exact.
/// Use `eq_ignore_ascii_case` for DNS name comparison.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DomainName {
    pub labels: Vec<Label>,
    // INVARIANT: len == len(labels) + sum(map(len, labels))
    pub len: usize,
}

impl DomainName {
    pub fn root_domain() -> Self {
        DomainName {
            labels: vec![Label::new()],
            len: 1,
        }
    }

    pub fn is_root(&self) -> bool {
        self.len == 1 && self.labels[0].is_empty()
    }

    pub fn eq_ignore_ascii_case(&self, other: &DomainName) -> bool {
        self.len == other.len
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.octets().eq_ignore_ascii_case(b.octets()))
    }

    /// Dotted presentation form, without a trailing dot.  The root is
    /// `"."`.  Dots and backslashes inside a label are escaped with a
    /// backslash, and octets outside printable ASCII are written as
    /// `\DDD`.
    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(self.len);
        let mut first = true;
        for label in &self.labels {
            if label.is_empty() {
                break;
            }
            if first {
                first = false;
            } else {
                out.push('.');
            }
            for octet in &label.octets {
                match octet {
                    b'.' | b'\\' => {
                        out.push('\\');
                        out.push(*octet as char);
                    }
                    0x21..=0x7e => out.push(*octet as char),
                    _ => out.push_str(&format!("\\{octet:03}")),
                }
            }
        }

        out
    }

    /// Parse a dotted name, with or without the trailing dot.  The
    /// escapes written by `to_dotted_string` are understood.
    pub fn from_dotted_string(s: &str) -> Option<Self> {
        if s == "." {
            return Some(Self::root_domain());
        }

        let mut labels = Vec::new();
        let mut current = Vec::with_capacity(LABEL_MAX_LEN);
        let mut octets = s.bytes();

        while let Some(octet) = octets.next() {
            match octet {
                b'.' => {
                    if current.is_empty() {
                        return None;
                    }
                    labels.push(Label::try_from(&current[..]).ok()?);
                    current.clear();
                }
                b'\\' => {
                    let escaped = octets.next()?;
                    if escaped.is_ascii_digit() {
                        let mut value = u16::from(escaped - b'0');
                        for _ in 0..2 {
                            let digit = octets.next().filter(u8::is_ascii_digit)?;
                            value = value * 10 + u16::from(digit - b'0');
                        }
                        current.push(u8::try_from(value).ok()?);
                    } else {
                        current.push(escaped);
                    }
                }
                _ => current.push(octet),
            }
        }

        if !current.is_empty() {
            labels.push(Label::try_from(&current[..]).ok()?);
        }
        labels.push(Label::new());

        Self::from_labels(labels)
    }

    pub fn from_labels(labels: Vec<Label>) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }

        let mut len = labels.len();
        let mut blank_label = false;

        for label in &labels {
            if blank_label {
                return None;
            }

            blank_label |= label.is_empty();
            len += label.len() as usize;
        }

        if blank_label && len <= DOMAINNAME_MAX_LEN {
            Some(Self { labels, len })
        } else {
            None
        }
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainName")
            .field("to_dotted_string()", &self.to_dotted_string())
            .finish()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.to_dotted_string())
    }
}

impl FromStr for DomainName {
    type Err = DomainNameFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(domain) = DomainName::from_dotted_string(s) {
            Ok(domain)
        } else {
            Err(DomainNameFromStr::NoParse)
        }
    }
}

/// Errors that can arise when converting a `&str` into a `DomainName`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DomainNameFromStr {
    NoParse,
}

impl fmt::Display for DomainNameFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not parse string to domain name")
    }
}

impl std::error::Error for DomainNameFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for DomainName {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_labels = u.int_in_range::<usize>(0..=10)?;
        let mut labels = Vec::new();
        for _ in 0..num_labels {
            labels.push(u.arbitrary()?);
        }
        labels.push(Label::new());
        // at most 10 labels of at most 20 octets: always within the limit
        DomainName::from_labels(labels).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

/// A label is just a sequence of octets.  A label can be no longer
/// than 63 octets.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Label {
    /// Private to this module so constructing an invalid `Label` is
    /// impossible.
    octets: Bytes,
}

impl Label {
    /// Create a new, empty, label.
    pub fn new() -> Self {
        Self {
            octets: Bytes::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u8 {
        // safe as the `TryFrom` ensures a label is <= 63 bytes
        self.octets.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    pub fn octets(&self) -> &Bytes {
        &self.octets
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = LabelTryFromOctetsError;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        if octets.len() > LABEL_MAX_LEN {
            return Err(LabelTryFromOctetsError::TooLong);
        }

        Ok(Self {
            octets: Bytes::copy_from_slice(octets),
        })
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Label {
    // only generates non-empty labels
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Label> {
        let label_len = u.int_in_range::<u8>(1..=20)?;
        let mut octets = BytesMut::with_capacity(label_len.into());
        let bs = u.bytes(label_len.into())?;
        for b in bs {
            let ascii_byte = if b.is_ascii() { *b } else { *b % 128 };
            octets.put_u8(if ascii_byte.is_ascii_graphic() {
                ascii_byte
            } else {
                b'x'
            });
        }
        Ok(Self {
            octets: octets.freeze(),
        })
    }
}

/// Errors that can arise when converting a `[u8]` into a `Label`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LabelTryFromOctetsError {
    TooLong,
}

/// A record type code.  Any 16 bit value is representable: the
/// constants name the codes with an entry in the mnemonic registry,
/// and the query-only codes (`IXFR` to `ANY`) are included.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct RecordType(pub u16);

#[allow(clippy::upper_case_acronyms)]
impl RecordType {
    pub const A: Self = Self(1);
    pub const NS: Self = Self(2);
    pub const MD: Self = Self(3);
    pub const MF: Self = Self(4);
    pub const CNAME: Self = Self(5);
    pub const SOA: Self = Self(6);
    pub const MB: Self = Self(7);
    pub const MG: Self = Self(8);
    pub const MR: Self = Self(9);
    pub const NULL: Self = Self(10);
    pub const WKS: Self = Self(11);
    pub const PTR: Self = Self(12);
    pub const HINFO: Self = Self(13);
    pub const MINFO: Self = Self(14);
    pub const MX: Self = Self(15);
    pub const TXT: Self = Self(16);
    pub const RP: Self = Self(17);
    pub const AFSDB: Self = Self(18);
    pub const X25: Self = Self(19);
    pub const ISDN: Self = Self(20);
    pub const RT: Self = Self(21);
    pub const NSAP: Self = Self(22);
    pub const NSAPPTR: Self = Self(23);
    pub const SIG: Self = Self(24);
    pub const KEY: Self = Self(25);
    pub const PX: Self = Self(26);
    pub const GPOS: Self = Self(27);
    pub const AAAA: Self = Self(28);
    pub const LOC: Self = Self(29);
    pub const NXT: Self = Self(30);
    pub const EID: Self = Self(31);
    pub const NIMLOC: Self = Self(32);
    pub const SRV: Self = Self(33);
    pub const ATMA: Self = Self(34);
    pub const NAPTR: Self = Self(35);
    pub const KX: Self = Self(36);
    pub const CERT: Self = Self(37);
    pub const A6: Self = Self(38);
    pub const DNAME: Self = Self(39);
    pub const SINK: Self = Self(40);
    pub const OPT: Self = Self(41);
    pub const UINFO: Self = Self(100);
    pub const UID: Self = Self(101);
    pub const GID: Self = Self(102);
    pub const UNSPEC: Self = Self(103);
    pub const ADDRS: Self = Self(248);
    pub const TKEY: Self = Self(249);
    pub const TSIG: Self = Self(250);
    pub const IXFR: Self = Self(251);
    pub const AXFR: Self = Self(252);
    pub const MAILB: Self = Self(253);
    pub const MAILA: Self = Self(254);
    pub const ANY: Self = Self(255);
    pub const WINS: Self = Self(0xFF01);
    pub const WINSR: Self = Self(0xFF02);

    pub fn mnemonic(self) -> Option<&'static str> {
        mnemonic::type_mnemonic(self.0)
    }

    /// Types which only make sense in a question.
    pub fn is_query_only(self) -> bool {
        (Self::IXFR.0..=Self::ANY.0).contains(&self.0)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => write!(f, "{mnemonic}"),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

/// Registry mnemonics (any case), or the `TYPE<num>` syntax of RFC
/// 3597.
impl FromStr for RecordType {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match mnemonic::type_mnemonic_to_code(s) {
            Ok(code) => Ok(Self(code)),
            Err(err) => s
                .get(..4)
                .filter(|prefix| prefix.eq_ignore_ascii_case("TYPE"))
                .and_then(|_| s[4..].parse().ok())
                .map(Self)
                .ok_or(err),
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        value.0
    }
}

/// A record class code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct RecordClass(pub u16);

impl RecordClass {
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(2);
    pub const CS: Self = Self(3);
    pub const HS: Self = Self(4);
    pub const ANY: Self = Self(255);

    pub fn mnemonic(self) -> Option<&'static str> {
        mnemonic::class_mnemonic(self.0)
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => write!(f, "{mnemonic}"),
            None => write!(f, "CLASS{}", self.0),
        }
    }
}

/// Registry mnemonics (any case), or the `CLASS<num>` syntax of RFC
/// 3597.
impl FromStr for RecordClass {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match mnemonic::class_mnemonic_to_code(s) {
            Ok(code) => Ok(Self(code)),
            Err(err) => s
                .get(..5)
                .filter(|prefix| prefix.eq_ignore_ascii_case("CLASS"))
                .and_then(|_| s[5..].parse().ok())
                .map(Self)
                .ok_or(err),
        }
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::test_util::*;
    use super::*;

    #[test]
    fn u8_opcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Opcode::from(i)), i);
        }
    }

    #[test]
    fn u8_rcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Rcode::from(i)), i);
        }
    }

    #[test]
    fn recordtype_display_fromstr_roundtrip() {
        for i in 0..300 {
            let rtype = RecordType(i);
            assert_eq!(Ok(rtype), rtype.to_string().parse());
        }
    }

    #[test]
    fn recordtype_fromstr_is_case_insensitive() {
        assert_eq!(Ok(RecordType::MX), "mx".parse());
        assert_eq!(Ok(RecordType::TXT), "Text".parse());
        assert_eq!(Ok(RecordType(65)), "type65".parse());
        assert!("bogus".parse::<RecordType>().is_err());
        assert!("TYPE".parse::<RecordType>().is_err());
        assert!("TYPE70000".parse::<RecordType>().is_err());
    }

    #[test]
    fn recordclass_display_fromstr_roundtrip() {
        for i in 0..300 {
            let rclass = RecordClass(i);
            assert_eq!(Ok(rclass), rclass.to_string().parse());
        }
    }

    #[test]
    fn query_only_types() {
        assert!(RecordType::AXFR.is_query_only());
        assert!(RecordType::ANY.is_query_only());
        assert!(!RecordType::TSIG.is_query_only());
        assert!(!RecordType::A.is_query_only());
    }

    #[test]
    fn domainname_root_conversions() {
        assert_eq!(
            Some(DomainName::root_domain()),
            DomainName::from_dotted_string(".")
        );

        assert_eq!(
            Some(DomainName::root_domain()),
            DomainName::from_labels(vec![Label::new()])
        );

        assert_eq!(".", DomainName::root_domain().to_dotted_string());
    }

    #[test]
    fn domainname_trailing_dot_is_optional() {
        assert_eq!(
            DomainName::from_dotted_string("www.example.com"),
            DomainName::from_dotted_string("www.example.com.")
        );
        assert_eq!("www.example.com", domain("www.example.com.").to_string());
    }

    #[test]
    fn domainname_preserves_case() {
        let name = domain("WWW.Example.COM");
        assert_eq!("WWW.Example.COM", name.to_dotted_string());
        assert_ne!(domain("www.example.com"), name);
        assert!(domain("www.example.com").eq_ignore_ascii_case(&name));
    }

    #[test]
    fn domainname_escapes() {
        let name = DomainName::from_labels(vec![
            Label::try_from(&b"a.b\\c d\x07"[..]).unwrap(),
            Label::try_from(&b"org"[..]).unwrap(),
            Label::new(),
        ])
        .unwrap();

        assert_eq!("a\\.b\\\\c\\032d\\007.org", name.to_dotted_string());
        assert_eq!(Some(name.clone()), DomainName::from_dotted_string(&name.to_dotted_string()));
    }

    #[test]
    fn domainname_rejects_bad_strings() {
        assert_eq!(None, DomainName::from_dotted_string("a..b"));
        assert_eq!(None, DomainName::from_dotted_string(".a"));
        assert_eq!(None, DomainName::from_dotted_string("a\\"));
        assert_eq!(None, DomainName::from_dotted_string("a\\25"));
        assert_eq!(None, DomainName::from_dotted_string("a\\256"));
        assert_eq!(
            None,
            DomainName::from_dotted_string(&"x".repeat(LABEL_MAX_LEN + 1))
        );
        assert_eq!(
            None,
            DomainName::from_dotted_string(&["abcdefghi"; 26].join("."))
        );
    }

    #[test]
    fn domainname_conversions() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let labels_len = rng.random_range(0..5);

            let mut dotted_string_input = String::new();
            let mut labels_input = Vec::with_capacity(labels_len);

            for i in 0..labels_len {
                let label_len = rng.random_range(1..10);

                if i > 0 {
                    dotted_string_input.push('.');
                }

                let mut octets = BytesMut::with_capacity(label_len);
                for _ in 0..label_len {
                    let mut chr = rng.random_range(33..126);

                    if chr == b'.' || chr == b'\\' {
                        chr = b'X';
                    }

                    octets.put_u8(chr);
                    dotted_string_input.push(chr as char);
                }
                labels_input.push(Label::try_from(&octets.freeze()[..]).unwrap());
            }

            labels_input.push(Label::new());

            let expected = if labels_len == 0 {
                ".".to_string()
            } else {
                dotted_string_input.clone()
            };

            assert_eq!(
                Some(expected.clone()),
                DomainName::from_dotted_string(&dotted_string_input).map(|d| d.to_dotted_string())
            );

            assert_eq!(
                Some(expected),
                DomainName::from_labels(labels_input).map(|d| d.to_dotted_string())
            );
        }
    }

    #[test]
    fn rdata_wire_len_matches_fixture() {
        let rr = mx_record("example.com.", 10, "mail.example.com.");
        assert_eq!(2 + 18, rr.rdlength);
    }

    #[test]
    fn negative_answers() {
        let mut message = Message::make_query(
            1,
            domain("example.com."),
            RecordType::A,
            RecordClass::IN,
            true,
        );
        assert!(!message.is_negative());

        message.header.is_response = true;
        assert!(message.is_negative());

        message.answers.push(a_record("example.com.", Ipv4Addr::LOCALHOST));
        assert!(!message.is_negative());

        message.header.rcode = Rcode::NameError;
        assert!(message.is_negative());
    }
}

#[cfg(any(feature = "test-util", test))]
#[allow(clippy::missing_panics_doc)]
pub mod test_util {
    use super::*;

    use arbitrary::{Arbitrary, Unstructured};
    use rand::Rng;

    pub fn arbitrary_message() -> Message {
        let mut rng = rand::rng();
        for size in [512, 1024, 2048, 4096, 8192, 16384] {
            let mut buf = BytesMut::with_capacity(size);
            for _ in 0..size {
                buf.put_u8(rng.random());
            }

            if let Ok(message) = Message::arbitrary(&mut Unstructured::new(&buf.freeze())) {
                return message;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn arbitrary_resourcerecord() -> ResourceRecord {
        let mut rng = rand::rng();
        for size in [128, 256, 512, 1024, 2048, 4096] {
            let mut buf = BytesMut::with_capacity(size);
            for _ in 0..size {
                buf.put_u8(rng.random());
            }

            if let Ok(rr) = ResourceRecord::arbitrary(&mut Unstructured::new(&buf.freeze())) {
                return rr;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    pub fn response(questions: Vec<Question>, answers: Vec<ResourceRecord>) -> Message {
        Message {
            header: Header {
                id: 0x1234,
                is_response: true,
                opcode: Opcode::Query,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: true,
                recursion_available: true,
                rcode: Rcode::NoError,
                qdcount: questions.len().try_into().unwrap(),
                ancount: answers.len().try_into().unwrap(),
                nscount: 0,
                arcount: 0,
            },
            questions,
            answers,
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn question(name: &str, qtype: RecordType) -> Question {
        Question {
            name: domain(name),
            qtype,
            qclass: RecordClass::IN,
        }
    }

    pub fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType::A,
            RecordClass::IN,
            300,
            RData::Address(address),
        )
    }

    pub fn aaaa_record(name: &str, address: Ipv6Addr) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType::AAAA,
            RecordClass::IN,
            300,
            RData::Aaaa(address),
        )
    }

    pub fn cname_record(name: &str, target_name: &str) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType::CNAME,
            RecordClass::IN,
            300,
            RData::DomainRef(domain(target_name)),
        )
    }

    pub fn mx_record(name: &str, preference: u16, exchange: &str) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType::MX,
            RecordClass::IN,
            300,
            RData::PreferenceAndName {
                preference,
                name: domain(exchange),
            },
        )
    }

    pub fn txt_record(name: &str, strings: &[&str]) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType::TXT,
            RecordClass::IN,
            300,
            RData::StringList(
                strings
                    .iter()
                    .map(|s| Bytes::copy_from_slice(s.as_bytes()))
                    .collect(),
            ),
        )
    }

    pub fn unknown_record(name: &str, octets: &[u8]) -> ResourceRecord {
        ResourceRecord::new(
            domain(name),
            RecordType(100),
            RecordClass::IN,
            300,
            RData::Octets(Bytes::copy_from_slice(octets)),
        )
    }
}
