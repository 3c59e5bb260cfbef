//! Turn a parsed message into a tree of plain values, shaped by a set
//! of flags: which sections to include, whether records carry their
//! header fields, whether fields and sections are named, and whether
//! single records are still wrapped in lists.

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::{BitOr, BitOrAssign};

use crate::mnemonic;
use crate::protocol::rdata::Shape;
use crate::protocol::types::*;

/// Options for `render`.  Combine with `|`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderFlags(u8);

impl RenderFlags {
    pub const QUESTION: Self = Self(1 << 0);
    pub const ANSWER: Self = Self(1 << 1);
    pub const AUTHORITY: Self = Self(1 << 2);
    pub const ADDITIONAL: Self = Self(1 << 3);
    /// Render records with name, type, class, TTL and RDLENGTH, not
    /// just their data.
    pub const DETAIL: Self = Self(1 << 4);
    /// Key the top level by section name.
    pub const SECTION_NAMES: Self = Self(1 << 5);
    /// Render compound values as name / value records rather than
    /// positional lists.
    pub const FIELD_NAMES: Self = Self(1 << 6);
    /// Always render a section as a list, even with one record.
    pub const MULTIPLE: Self = Self(1 << 7);

    pub const ALL_SECTIONS: Self =
        Self(Self::QUESTION.0 | Self::ANSWER.0 | Self::AUTHORITY.0 | Self::ADDITIONAL.0);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn includes(self, section: Section) -> bool {
        self.contains(match section {
            Section::Question => Self::QUESTION,
            Section::Answer => Self::ANSWER,
            Section::Authority => Self::AUTHORITY,
            Section::Additional => Self::ADDITIONAL,
        })
    }
}

/// Just the answer section.
impl Default for RenderFlags {
    fn default() -> Self {
        Self::ANSWER
    }
}

impl BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RenderFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A rendered value.  `Record` keeps its fields in order.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Value {
    Boolean(bool),
    Integer(u64),
    Text(String),
    Octets(Bytes),
    /// The data of a record type with no decoder.
    Unsupported(Bytes),
    List(Vec<Value>),
    Record(Vec<(&'static str, Value)>),
}

impl Value {
    /// Look up a field of a `Record`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Integer(n.into())
    }
}

impl From<&DomainName> for Value {
    fn from(name: &DomainName) -> Self {
        Value::Text(name.to_dotted_string())
    }
}

/// `Record`s become maps, `List`s sequences, and octets lowercase hex
/// strings.  Unsupported data becomes `{"unsupported": "<hex>"}`.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_u64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Octets(octets) => serializer.serialize_str(&hex(octets)),
            Value::Unsupported(octets) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unsupported", &hex(octets))?;
                map.end()
            }
            Value::List(values) => serializer.collect_seq(values),
            Value::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

fn hex(octets: &[u8]) -> String {
    octets.iter().map(|octet| format!("{octet:02x}")).collect()
}

/// Render the sections of `message` selected by `flags`.
///
/// With `SECTION_NAMES` the result is a `Record` keyed by section name,
/// with a key for every included section, otherwise a `List`.  With
/// `MULTIPLE` every included section is a list of its entries.
/// Without it, a section with one entry is that entry, an empty named
/// section is an empty list, and if sections are not named the entries
/// of all included sections are flattened into one list (or one bare
/// entry, if there is exactly one).
pub fn render(message: &Message, flags: RenderFlags) -> Value {
    let sections = Section::ALL
        .into_iter()
        .filter(|section| flags.includes(*section))
        .map(|section| (section, render_section(message, section, flags)));

    if flags.contains(RenderFlags::SECTION_NAMES) {
        Value::Record(
            sections
                .map(|(section, entries)| {
                    let value = collapse(entries, flags).unwrap_or(Value::List(Vec::new()));
                    (section.name(), value)
                })
                .collect(),
        )
    } else if flags.contains(RenderFlags::MULTIPLE) {
        Value::List(
            sections
                .map(|(_, entries)| Value::List(entries))
                .collect(),
        )
    } else {
        let entries = sections.flat_map(|(_, entries)| entries).collect();
        collapse(entries, flags).unwrap_or(Value::List(Vec::new()))
    }
}

fn collapse(mut entries: Vec<Value>, flags: RenderFlags) -> Option<Value> {
    if flags.contains(RenderFlags::MULTIPLE) {
        return Some(Value::List(entries));
    }
    match entries.len() {
        0 => None,
        1 => entries.pop(),
        _ => Some(Value::List(entries)),
    }
}

fn render_section(message: &Message, section: Section, flags: RenderFlags) -> Vec<Value> {
    match section {
        Section::Question => message
            .questions
            .iter()
            .map(|question| render_question(question, flags))
            .collect(),
        _ => message
            .records(section)
            .iter()
            .map(|rr| render_record(rr, flags))
            .collect(),
    }
}

/// Questions always include all of their fields.
pub fn render_question(question: &Question, flags: RenderFlags) -> Value {
    fields(
        flags,
        vec![
            ("name", Value::from(&question.name)),
            ("qtype", type_value(question.qtype)),
            ("qclass", class_value(question.qclass)),
        ],
    )
}

pub fn render_record(rr: &ResourceRecord, flags: RenderFlags) -> Value {
    let rdata = render_rdata(rr.rtype, &rr.rdata, flags);
    if !flags.contains(RenderFlags::DETAIL) {
        return rdata;
    }

    fields(
        flags,
        vec![
            ("name", Value::from(&rr.name)),
            ("type", type_value(rr.rtype)),
            ("class", class_value(rr.rclass)),
            ("ttl", Value::from(rr.ttl)),
            ("rdlength", Value::from(rr.rdlength)),
            ("rdata", rdata),
        ],
    )
}

/// Render the data of a record of type `rtype`.  Single values (an
/// address, a name) are bare; everything else is a compound value,
/// whose field names depend on the type.
pub fn render_rdata(rtype: RecordType, rdata: &RData, flags: RenderFlags) -> Value {
    match rdata {
        RData::Address(address) => Value::Text(address.to_string()),
        RData::DomainRef(name) => Value::from(name),
        RData::NamePair { first, second } => {
            let (first_name, second_name) = match rtype {
                RecordType::MINFO => ("rmailbx", "emailbx"),
                RecordType::RP => ("mbox", "txtdname"),
                _ => ("first", "second"),
            };
            fields(
                flags,
                vec![
                    (first_name, Value::from(first)),
                    (second_name, Value::from(second)),
                ],
            )
        }
        RData::PreferenceAndName { preference, name } => {
            let (preference_name, name_name) = match rtype {
                RecordType::AFSDB => ("subtype", "hostname"),
                RecordType::RT => ("preference", "intermediate"),
                RecordType::KX => ("preference", "exchanger"),
                _ => ("preference", "exchange"),
            };
            fields(
                flags,
                vec![
                    (preference_name, Value::from(*preference)),
                    (name_name, Value::from(name)),
                ],
            )
        }
        RData::StringList(strings) => Value::List(
            strings
                .iter()
                .map(|s| Value::Text(String::from_utf8_lossy(s).into_owned()))
                .collect(),
        ),
        RData::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => fields(
            flags,
            vec![
                ("mname", Value::from(mname)),
                ("rname", Value::from(rname)),
                ("serial", Value::from(*serial)),
                ("refresh", Value::from(*refresh)),
                ("retry", Value::from(*retry)),
                ("expire", Value::from(*expire)),
                ("minimum", Value::from(*minimum)),
            ],
        ),
        RData::Octets(octets) => {
            if Shape::of(rtype) == Shape::Null {
                Value::Octets(octets.clone())
            } else {
                Value::Unsupported(octets.clone())
            }
        }
        RData::Wks {
            address,
            protocol,
            bitmap,
        } => fields(
            flags,
            vec![
                ("address", Value::Text(address.to_string())),
                ("protocol", Value::from(*protocol)),
                ("bitmap", Value::Octets(bitmap.clone())),
            ],
        ),
        RData::Aaaa(address) => Value::Text(address.to_string()),
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
        } => fields(
            flags,
            vec![
                ("type_covered", type_value(*type_covered)),
                ("algorithm", Value::from(*algorithm)),
                ("labels", Value::from(*labels)),
                ("original_ttl", Value::from(*original_ttl)),
                ("expiration", Value::from(*expiration)),
                ("inception", Value::from(*inception)),
                ("key_tag", Value::from(*key_tag)),
                ("signer", Value::from(signer)),
                ("signature", Value::Octets(signature.clone())),
            ],
        ),
        RData::Key {
            flags: key_flags,
            protocol,
            algorithm,
            public_key,
        } => fields(
            flags,
            vec![
                ("flags", Value::from(*key_flags)),
                ("protocol", Value::from(*protocol)),
                ("algorithm", Value::from(*algorithm)),
                ("public_key", Value::Octets(public_key.clone())),
            ],
        ),
        RData::Atma { format, address } => {
            let address = if *format == 1 {
                Value::Text(String::from_utf8_lossy(address).into_owned())
            } else {
                Value::Octets(address.clone())
            };
            fields(
                flags,
                vec![("format", Value::from(*format)), ("address", address)],
            )
        }
        RData::Nxt { next, bitmap } => fields(
            flags,
            vec![
                ("next", Value::from(next)),
                ("bitmap", Value::Octets(bitmap.clone())),
            ],
        ),
        RData::Srv {
            priority,
            weight,
            port,
            target,
        } => fields(
            flags,
            vec![
                ("priority", Value::from(*priority)),
                ("weight", Value::from(*weight)),
                ("port", Value::from(*port)),
                ("target", Value::from(target)),
            ],
        ),
        RData::WinsForward {
            replicate,
            lookup_timeout,
            cache_timeout,
            servers,
        } => fields(
            flags,
            vec![
                ("replicate", Value::Boolean(*replicate)),
                ("lookup_timeout", Value::from(*lookup_timeout)),
                ("cache_timeout", Value::from(*cache_timeout)),
                (
                    "servers",
                    Value::List(
                        servers
                            .iter()
                            .map(|server| Value::Text(server.to_string()))
                            .collect(),
                    ),
                ),
            ],
        ),
        RData::WinsReverse {
            replicate,
            lookup_timeout,
            cache_timeout,
            name,
        } => fields(
            flags,
            vec![
                ("replicate", Value::Boolean(*replicate)),
                ("lookup_timeout", Value::from(*lookup_timeout)),
                ("cache_timeout", Value::from(*cache_timeout)),
                ("name", Value::from(name)),
            ],
        ),
    }
}

fn fields(flags: RenderFlags, fields: Vec<(&'static str, Value)>) -> Value {
    if flags.contains(RenderFlags::FIELD_NAMES) {
        Value::Record(fields)
    } else {
        Value::List(fields.into_iter().map(|(_, value)| value).collect())
    }
}

/// The mnemonic, or the number if there isn't one.
fn type_value(rtype: RecordType) -> Value {
    match mnemonic::type_mnemonic(rtype.0) {
        Some(mnemonic) => Value::Text(mnemonic.to_string()),
        None => Value::Integer(rtype.0.into()),
    }
}

fn class_value(rclass: RecordClass) -> Value {
    match mnemonic::class_mnemonic(rclass.0) {
        Some(mnemonic) => Value::Text(mnemonic.to_string()),
        None => Value::Integer(rclass.0.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::protocol::types::test_util::*;

    fn two_answers() -> Message {
        response(
            vec![question("example.com.", RecordType::A)],
            vec![
                a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1)),
                a_record("example.com.", Ipv4Addr::new(2, 2, 2, 2)),
            ],
        )
    }

    #[test]
    fn flags_combine() {
        let flags = RenderFlags::ANSWER | RenderFlags::DETAIL;
        assert!(flags.contains(RenderFlags::ANSWER));
        assert!(flags.contains(RenderFlags::DETAIL));
        assert!(!flags.contains(RenderFlags::QUESTION));
        assert!(flags.includes(Section::Answer));
        assert!(!flags.includes(Section::Additional));
        assert!(RenderFlags::ALL_SECTIONS.includes(Section::Authority));
        assert_eq!(RenderFlags::ANSWER, RenderFlags::default());
    }

    #[test]
    fn single_answer_is_bare() {
        let message = response(
            vec![question("example.com.", RecordType::A)],
            vec![a_record("example.com.", Ipv4Addr::new(93, 184, 216, 34))],
        );

        assert_eq!(
            Value::from("93.184.216.34"),
            render(&message, RenderFlags::ANSWER)
        );
    }

    #[test]
    fn two_answers_are_a_list() {
        assert_eq!(
            Value::List(vec![Value::from("1.1.1.1"), Value::from("2.2.2.2")]),
            render(&two_answers(), RenderFlags::ANSWER)
        );
    }

    #[test]
    fn no_answers_is_an_empty_list() {
        let message = response(vec![question("example.com.", RecordType::A)], Vec::new());
        assert_eq!(Value::List(Vec::new()), render(&message, RenderFlags::ANSWER));
    }

    #[test]
    fn multiple_wraps_single_answer() {
        let message = response(
            vec![question("example.com.", RecordType::A)],
            vec![a_record("example.com.", Ipv4Addr::new(93, 184, 216, 34))],
        );

        assert_eq!(
            Value::List(vec![Value::List(vec![Value::from("93.184.216.34")])]),
            render(&message, RenderFlags::ANSWER | RenderFlags::MULTIPLE)
        );
    }

    #[test]
    fn sections_flattened_without_names() {
        assert_eq!(
            Value::List(vec![
                Value::List(vec![
                    Value::from("example.com"),
                    Value::from("A"),
                    Value::from("IN"),
                ]),
                Value::from("1.1.1.1"),
                Value::from("2.2.2.2"),
            ]),
            render(&two_answers(), RenderFlags::QUESTION | RenderFlags::ANSWER)
        );
    }

    #[test]
    fn section_names() {
        let flags = RenderFlags::ALL_SECTIONS | RenderFlags::SECTION_NAMES;
        assert_eq!(
            Value::Record(vec![
                (
                    "question",
                    Value::List(vec![
                        Value::from("example.com"),
                        Value::from("A"),
                        Value::from("IN"),
                    ])
                ),
                (
                    "answer",
                    Value::List(vec![Value::from("1.1.1.1"), Value::from("2.2.2.2")])
                ),
                ("authority", Value::List(Vec::new())),
                ("additional", Value::List(Vec::new())),
            ]),
            render(&two_answers(), flags)
        );
    }

    #[test]
    fn section_names_keeps_empty_sections() {
        let message = response(vec![question("example.com.", RecordType::A)], Vec::new());

        assert_eq!(
            Value::Record(vec![("answer", Value::List(Vec::new()))]),
            render(&message, RenderFlags::ANSWER | RenderFlags::SECTION_NAMES)
        );

        let value = render(&two_answers(), RenderFlags::ALL_SECTIONS | RenderFlags::SECTION_NAMES);
        assert_eq!(Some(&Value::List(Vec::new())), value.field("authority"));
        assert_eq!(Some(&Value::List(Vec::new())), value.field("additional"));
    }

    #[test]
    fn question_fields_follow_field_names_not_detail() {
        let message = response(vec![question("example.com.", RecordType::A)], Vec::new());

        assert_eq!(
            Value::List(vec![
                Value::from("example.com"),
                Value::from("A"),
                Value::from("IN"),
            ]),
            render(&message, RenderFlags::QUESTION | RenderFlags::DETAIL)
        );
        assert_eq!(
            Value::Record(vec![
                ("name", Value::from("example.com")),
                ("qtype", Value::from("A")),
                ("qclass", Value::from("IN")),
            ]),
            render(&message, RenderFlags::QUESTION | RenderFlags::FIELD_NAMES)
        );
    }

    #[test]
    fn section_names_multiple_keeps_empty_sections() {
        let flags = RenderFlags::ANSWER
            | RenderFlags::AUTHORITY
            | RenderFlags::SECTION_NAMES
            | RenderFlags::MULTIPLE;
        let value = render(&two_answers(), flags);

        assert_eq!(Some(&Value::List(Vec::new())), value.field("authority"));
        assert_eq!(Some(2), value.field("answer").and_then(Value::as_list).map(<[Value]>::len));
    }

    #[test]
    fn detail_with_field_names() {
        let message = response(
            vec![question("example.com.", RecordType::MX)],
            vec![mx_record("example.com.", 10, "mail.example.com.")],
        );
        let flags = RenderFlags::ANSWER | RenderFlags::DETAIL | RenderFlags::FIELD_NAMES;

        assert_eq!(
            Value::Record(vec![
                ("name", Value::from("example.com")),
                ("type", Value::from("MX")),
                ("class", Value::from("IN")),
                ("ttl", Value::Integer(300)),
                ("rdlength", Value::Integer(20)),
                (
                    "rdata",
                    Value::Record(vec![
                        ("preference", Value::Integer(10)),
                        ("exchange", Value::from("mail.example.com")),
                    ])
                ),
            ]),
            render(&message, flags)
        );
    }

    #[test]
    fn detail_positional() {
        let message = response(
            vec![question("example.com.", RecordType::MX)],
            vec![mx_record("example.com.", 10, "mail.example.com.")],
        );

        assert_eq!(
            Value::List(vec![
                Value::from("example.com"),
                Value::from("MX"),
                Value::from("IN"),
                Value::Integer(300),
                Value::Integer(20),
                Value::List(vec![Value::Integer(10), Value::from("mail.example.com")]),
            ]),
            render(&message, RenderFlags::ANSWER | RenderFlags::DETAIL)
        );
    }

    #[test]
    fn unknown_type_and_class_are_numbers() {
        let mut rr = unknown_record("example.com.", &[1, 2]);
        rr.rtype = RecordType(0x1234);
        rr.rclass = RecordClass(7);

        assert_eq!(
            Value::List(vec![
                Value::from("example.com"),
                Value::Integer(0x1234),
                Value::Integer(7),
                Value::Integer(300),
                Value::Integer(2),
                Value::Unsupported(Bytes::from_static(&[1, 2])),
            ]),
            render_record(&rr, RenderFlags::DETAIL)
        );
    }

    #[test]
    fn null_is_octets_not_unsupported() {
        assert_eq!(
            Value::Octets(Bytes::from_static(&[1])),
            render_rdata(
                RecordType::NULL,
                &RData::Octets(Bytes::from_static(&[1])),
                RenderFlags::empty()
            )
        );
        assert_eq!(
            Value::Unsupported(Bytes::from_static(&[1])),
            render_rdata(
                RecordType::TSIG,
                &RData::Octets(Bytes::from_static(&[1])),
                RenderFlags::empty()
            )
        );
    }

    #[test]
    fn txt_is_list_of_strings() {
        let message = response(
            vec![question("example.com.", RecordType::TXT)],
            vec![txt_record("example.com.", &["hello", "world"])],
        );

        assert_eq!(
            Value::List(vec![Value::from("hello"), Value::from("world")]),
            render(&message, RenderFlags::ANSWER)
        );
    }

    #[test]
    fn render_is_deterministic() {
        for _ in 0..20 {
            let message = arbitrary_message();
            for bits in 0..=u8::MAX {
                let flags = RenderFlags::from_bits(bits);
                assert_eq!(render(&message, flags), render(&message, flags));
            }
        }
    }

    #[test]
    fn serialise_json() {
        let value = Value::Record(vec![
            ("name", Value::from("example.com")),
            ("ttl", Value::Integer(300)),
            ("ok", Value::Boolean(true)),
            ("data", Value::Octets(Bytes::from_static(&[0xde, 0xad]))),
            (
                "other",
                Value::List(vec![Value::Unsupported(Bytes::from_static(&[0x0f]))]),
            ),
        ]);

        assert_eq!(
            r#"{"name":"example.com","ttl":300,"ok":true,"data":"dead","other":[{"unsupported":"0f"}]}"#,
            serde_json::to_string(&value).unwrap()
        );
    }
}
