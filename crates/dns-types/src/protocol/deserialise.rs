//! Deserialisation of DNS messages from the network.  See the `types`
//! module for details of the format.

use std::fmt;

use crate::protocol::types::*;

/// Upper bound on compression pointers followed while expanding one
/// name.
pub const POINTER_HOPS_MAX: usize = 128;

impl Message {
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_octets(octets: &[u8]) -> Result<Self, Error> {
        let message = Self::deserialise(&mut ConsumableBuffer::new(octets));
        if let Err(error) = &message {
            tracing::debug!(%error, "could not parse message");
        }
        message
    }

    /// Parse the header, then each section in wire order, stopping at
    /// the first error.  Octets after the last counted record are
    /// ignored.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let id = buffer.peek_u16();
        let header = Header::deserialise(buffer).map_err(|kind| Error {
            id,
            location: Location::Header,
            kind,
        })?;
        let id = Some(header.id);

        let mut questions = Vec::with_capacity(capacity(header.qdcount, buffer));
        for index in 0..header.qdcount {
            let question = Question::deserialise(buffer).map_err(|kind| Error {
                id,
                location: Location::Record {
                    section: Section::Question,
                    index,
                },
                kind,
            })?;
            questions.push(question);
        }

        let answers = deserialise_records(buffer, id, Section::Answer, header.ancount)?;
        let authority = deserialise_records(buffer, id, Section::Authority, header.nscount)?;
        let additional = deserialise_records(buffer, id, Section::Additional, header.arcount)?;

        if buffer.remaining() > 0 {
            tracing::trace!(
                trailing = buffer.remaining(),
                "ignoring octets after the last record"
            );
        }

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }
}

fn deserialise_records(
    buffer: &mut ConsumableBuffer,
    id: Option<u16>,
    section: Section,
    count: u16,
) -> Result<Vec<ResourceRecord>, Error> {
    let mut records = Vec::with_capacity(capacity(count, buffer));
    for index in 0..count {
        let rr = ResourceRecord::deserialise(buffer).map_err(|kind| Error {
            id,
            location: Location::Record { section, index },
            kind,
        })?;
        records.push(rr);
    }
    Ok(records)
}

/// Don't trust the counts in the header for preallocation: every entry
/// takes at least five octets.
fn capacity(count: u16, buffer: &ConsumableBuffer) -> usize {
    usize::from(count).min(buffer.remaining() / 5)
}

impl Header {
    /// # Errors
    ///
    /// If the header is too short.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, ErrorKind> {
        let id = buffer.next_u16()?;
        let flags1 = buffer.next_u8()?;
        let flags2 = buffer.next_u8()?;
        let qdcount = buffer.next_u16()?;
        let ancount = buffer.next_u16()?;
        let nscount = buffer.next_u16()?;
        let arcount = buffer.next_u16()?;

        Ok(Self {
            id,
            is_response: flags1 & HEADER_MASK_QR != 0,
            opcode: Opcode::from((flags1 & HEADER_MASK_OPCODE) >> HEADER_OFFSET_OPCODE),
            is_authoritative: flags1 & HEADER_MASK_AA != 0,
            is_truncated: flags1 & HEADER_MASK_TC != 0,
            recursion_desired: flags1 & HEADER_MASK_RD != 0,
            recursion_available: flags2 & HEADER_MASK_RA != 0,
            rcode: Rcode::from((flags2 & HEADER_MASK_RCODE) >> HEADER_OFFSET_RCODE),
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
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, ErrorKind> {
        let name = DomainName::deserialise(buffer)?;
        let qtype = RecordType::from(buffer.next_u16()?);
        let qclass = RecordClass::from(buffer.next_u16()?);

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}

impl ResourceRecord {
    /// Parse one record.  The RDATA is decoded from a view bounded by
    /// RDLENGTH, and afterwards the buffer is positioned exactly
    /// RDLENGTH octets past the start of the RDATA, however much of it
    /// the decoder consumed.
    ///
    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, ErrorKind> {
        let name = DomainName::deserialise(buffer)?;
        let rtype = RecordType::from(buffer.next_u16()?);
        let rclass = RecordClass::from(buffer.next_u16()?);
        let ttl = buffer.next_u32()?;
        let rdlength = buffer.next_u16()?;

        let mut rdata_buffer = buffer.sub_buffer(rdlength.into())?;
        let rdata = RData::deserialise(rtype, &mut rdata_buffer)?;
        buffer.advance(rdlength.into())?;

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            rdlength,
            rdata,
        })
    }
}

impl DomainName {
    /// # Errors
    ///
    /// If the domain cannot be parsed.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, ErrorKind> {
        let (name, consumed) = expand_name(buffer.octets, buffer.position)?;
        buffer.advance(consumed)?;
        Ok(name)
    }
}

/// Expand the possibly-compressed name starting at `start`, returning
/// it with the number of octets it occupies at `start` (up to and
/// including the first pointer, if there is one).
///
/// A pointer must refer to an offset strictly before itself, at most
/// `POINTER_HOPS_MAX` pointers are followed, and the expanded name
/// must fit in `DOMAINNAME_MAX_LEN` octets.  Together these make every
/// expansion terminate.
///
/// # Errors
///
/// `Truncated` if the name runs off the end of the message, `Corrupt`
/// if it breaks one of the rules above or uses a reserved label type.
pub fn expand_name(octets: &[u8], start: usize) -> Result<(DomainName, usize), ErrorKind> {
    let mut labels = Vec::with_capacity(5);
    let mut len = 0;
    let mut position = start;
    let mut consumed = None;
    let mut hops = 0;

    loop {
        let size = *octets
            .get(position)
            .ok_or(ErrorKind::Truncated { offset: position })?;

        match size & 0b1100_0000 {
            0b0000_0000 => {
                let size = usize::from(size);
                len += size + 1;
                if len > DOMAINNAME_MAX_LEN {
                    return Err(ErrorKind::Corrupt {
                        offset: start,
                        reason: Corruption::NameTooLong,
                    });
                }

                if size == 0 {
                    labels.push(Label::new());
                    position += 1;
                    break;
                }

                let label_octets = octets
                    .get(position + 1..position + 1 + size)
                    .ok_or(ErrorKind::Truncated {
                        offset: octets.len(),
                    })?;
                let label = Label::try_from(label_octets).map_err(|_| ErrorKind::Corrupt {
                    offset: position,
                    reason: Corruption::ReservedLabelType,
                })?;
                labels.push(label);
                position += size + 1;
            }
            0b1100_0000 => {
                let lo = *octets
                    .get(position + 1)
                    .ok_or(ErrorKind::Truncated { offset: position + 1 })?;
                let target = usize::from(u16::from_be_bytes([size & 0b0011_1111, lo]));

                if target >= position {
                    return Err(ErrorKind::Corrupt {
                        offset: position,
                        reason: Corruption::PointerNotBackward,
                    });
                }

                hops += 1;
                if hops > POINTER_HOPS_MAX {
                    return Err(ErrorKind::Corrupt {
                        offset: position,
                        reason: Corruption::TooManyPointers,
                    });
                }

                if consumed.is_none() {
                    consumed = Some(position + 2 - start);
                }
                position = target;
            }
            _ => {
                return Err(ErrorKind::Corrupt {
                    offset: position,
                    reason: Corruption::ReservedLabelType,
                })
            }
        }
    }

    let consumed = consumed.unwrap_or_else(|| position - start);
    Ok((DomainName { labels, len }, consumed))
}

/// Errors encountered when parsing a message, with where in the
/// message the problem was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error {
    /// The message ID, if at least two octets were available.
    pub id: Option<u16>,
    pub location: Location,
    pub kind: ErrorKind,
}

impl Error {
    pub fn id(self) -> Option<u16> {
        self.id
    }

    /// The octet offset the problem was found at.
    pub fn offset(self) -> usize {
        match self.kind {
            ErrorKind::Truncated { offset }
            | ErrorKind::Corrupt { offset, .. }
            | ErrorKind::Malformed { offset, .. } => offset,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Which part of the message was being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Header,
    /// `index` counts from zero within the section.
    Record { section: Section, index: u16 },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Header => write!(f, "header"),
            Location::Record { section, index } => write!(f, "{section} {index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A read ran past the end of the message.
    Truncated { offset: usize },

    /// The message is structurally broken.
    Corrupt { offset: usize, reason: Corruption },

    /// The RDATA of a record of type `rtype` does not fit the layout
    /// of that type.
    Malformed {
        offset: usize,
        rtype: RecordType,
        reason: Malformation,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Truncated { offset } => write!(f, "message truncated at octet {offset}"),
            ErrorKind::Corrupt { offset, reason } => {
                write!(f, "corrupt message at octet {offset}: {reason}")
            }
            ErrorKind::Malformed {
                offset,
                rtype,
                reason,
            } => write!(f, "malformed {rtype} data at octet {offset}: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corruption {
    /// A compression pointer refers to itself or something after it.
    PointerNotBackward,
    TooManyPointers,
    NameTooLong,
    /// A label length octet with the top bits `01` or `10`.
    ReservedLabelType,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Corruption::PointerNotBackward => write!(f, "compression pointer does not point backward"),
            Corruption::TooManyPointers => write!(f, "too many compression pointers"),
            Corruption::NameTooLong => write!(f, "domain name too long"),
            Corruption::ReservedLabelType => write!(f, "reserved label type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Malformation {
    /// A field runs past RDLENGTH.
    Overrun,
    /// A fixed-size layout got the wrong number of octets.
    WrongLength { expected: usize, actual: usize },
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Malformation::Overrun => write!(f, "field runs past the end of the data"),
            Malformation::WrongLength { expected, actual } => {
                write!(f, "expected {expected} octets, got {actual}")
            }
        }
    }
}

/// A buffer which will be consumed by the parsing process.
///
/// The buffer may be a view bounded at `limit`: reads stop there, but
/// names can still follow compression pointers anywhere in `octets`.
pub struct ConsumableBuffer<'a> {
    octets: &'a [u8],
    position: usize,
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

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// The whole message, ignoring the bound.
    pub fn octets(&self) -> &'a [u8] {
        self.octets
    }

    pub fn peek_u16(&self) -> Option<u16> {
        if self.remaining() < 2 {
            return None;
        }
        Some(u16::from_be_bytes([
            self.octets[self.position],
            self.octets[self.position + 1],
        ]))
    }

    /// # Errors
    ///
    /// If fewer than `size` octets remain.
    pub fn advance(&mut self, size: usize) -> Result<(), ErrorKind> {
        if self.remaining() < size {
            return Err(ErrorKind::Truncated {
                offset: self.limit,
            });
        }
        self.position += size;
        Ok(())
    }

    /// # Errors
    ///
    /// If the buffer is exhausted.
    pub fn next_u8(&mut self) -> Result<u8, ErrorKind> {
        let [octet] = self.take_array()?;
        Ok(octet)
    }

    /// # Errors
    ///
    /// If fewer than two octets remain.
    pub fn next_u16(&mut self) -> Result<u16, ErrorKind> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    /// # Errors
    ///
    /// If fewer than four octets remain.
    pub fn next_u32(&mut self) -> Result<u32, ErrorKind> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// # Errors
    ///
    /// If fewer than `size` octets remain.
    pub fn take(&mut self, size: usize) -> Result<&'a [u8], ErrorKind> {
        let start = self.position;
        self.advance(size)?;
        Ok(&self.octets[start..self.position])
    }

    /// Everything up to the bound.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let start = self.position;
        self.position = self.limit;
        &self.octets[start..self.limit]
    }

    /// A view of the next `size` octets.  This buffer is not advanced.
    ///
    /// # Errors
    ///
    /// If fewer than `size` octets remain.
    pub fn sub_buffer(&self, size: usize) -> Result<ConsumableBuffer<'a>, ErrorKind> {
        if self.remaining() < size {
            return Err(ErrorKind::Truncated {
                offset: self.limit,
            });
        }
        Ok(Self {
            octets: self.octets,
            position: self.position,
            limit: self.position + size,
        })
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ErrorKind> {
        let slice = self.take(N)?;
        let mut array = [0; N];
        array.copy_from_slice(slice);
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn buffer_reads_are_bounded() {
        let octets = [1, 2, 3, 4, 5, 6];
        let mut buffer = ConsumableBuffer::new(&octets);
        let mut view = buffer.sub_buffer(3).unwrap();

        assert_eq!(Ok(0x0102), view.next_u16());
        assert_eq!(
            Err(ErrorKind::Truncated { offset: 3 }),
            view.next_u16()
        );
        assert_eq!(Ok(3), view.next_u8());
        assert_eq!(0, view.remaining());

        assert_eq!(0, buffer.position());
        assert_eq!(Ok(0x0102_0304), buffer.next_u32());
        assert_eq!(&[5, 6], buffer.take_rest());
        assert_eq!(
            Err(ErrorKind::Truncated { offset: 6 }),
            buffer.sub_buffer(1).map(|_| ())
        );
    }

    #[test]
    fn expand_uncompressed() {
        let octets = b"\x03www\x07example\x03com\x00";
        assert_eq!(
            Ok((domain("www.example.com."), octets.len())),
            expand_name(octets, 0)
        );
    }

    #[test]
    fn expand_root() {
        assert_eq!(Ok((DomainName::root_domain(), 1)), expand_name(&[0], 0));
    }

    #[test]
    fn expand_follows_pointer() {
        let mut octets = b"\x07example\x03com\x00".to_vec();
        octets.extend_from_slice(b"\x03www\xc0\x00");

        assert_eq!(
            Ok((domain("www.example.com."), 6)),
            expand_name(&octets, 13)
        );
    }

    #[test]
    fn expand_pointer_only() {
        let mut octets = b"\x03com\x00".to_vec();
        octets.extend_from_slice(&[0xc0, 0x00]);

        assert_eq!(Ok((domain("com."), 2)), expand_name(&octets, 5));
    }

    #[test]
    fn expand_pointer_to_name_ending_before_start() {
        // the target name ends at 13, the pointer is at 20
        let mut octets = b"\x07example\x03com\x00".to_vec();
        octets.extend_from_slice(&[0x00, 0x01, 0x00, 0x01, 0xff, 0xff, 0xff]);
        octets.extend_from_slice(&[0xc0, 0x00]);

        assert_eq!(Ok((domain("example.com."), 2)), expand_name(&octets, 20));
    }

    #[test]
    fn answer_count_past_end_of_message_is_truncated() {
        let query = Message::make_query(
            0x1234,
            domain("example.com."),
            RecordType::A,
            RecordClass::IN,
            true,
        );
        let mut octets = query.to_octets().unwrap().to_vec();
        octets[2] |= 0x80;
        octets[7] = 2;
        octets.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
        octets.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10, 0x00, 0x04, 192, 0, 2, 1]);

        let error = Message::from_octets(&octets).unwrap_err();
        assert_eq!(
            Location::Record {
                section: Section::Answer,
                index: 1
            },
            error.location
        );
        assert!(matches!(error.kind, ErrorKind::Truncated { .. }));
    }

    #[test]
    fn expand_rejects_self_pointer() {
        let octets = [0, 0, 0xc0, 0x02];
        assert_eq!(
            Err(ErrorKind::Corrupt {
                offset: 2,
                reason: Corruption::PointerNotBackward
            }),
            expand_name(&octets, 2)
        );
    }

    #[test]
    fn expand_rejects_forward_pointer() {
        let octets = [0xc0, 0x02, 0x00];
        assert_eq!(
            Err(ErrorKind::Corrupt {
                offset: 0,
                reason: Corruption::PointerNotBackward
            }),
            expand_name(&octets, 0)
        );
    }

    #[test]
    fn expand_rejects_label_loop() {
        // "a" then a pointer back to the "a": a.a.a.a...
        let octets = [0x01, b'a', 0xc0, 0x00];
        assert_eq!(
            Err(ErrorKind::Corrupt {
                offset: 0,
                reason: Corruption::NameTooLong
            }),
            expand_name(&octets, 0)
        );
    }

    #[test]
    fn expand_rejects_pointer_chain() {
        // a chain of pointers each to the one before, ending in the root
        let mut octets = vec![0x00];
        let mut previous = 0_u16;
        for _ in 0..=POINTER_HOPS_MAX {
            let here = u16::try_from(octets.len()).unwrap();
            octets.extend_from_slice(&(0xc000 | previous).to_be_bytes());
            previous = here;
        }

        assert!(matches!(
            expand_name(&octets, usize::from(previous)),
            Err(ErrorKind::Corrupt {
                reason: Corruption::TooManyPointers,
                ..
            })
        ));

        // one hop fewer is fine
        let start = usize::from(previous) - 2;
        assert_eq!(
            Ok((DomainName::root_domain(), 2)),
            expand_name(&octets, start)
        );
    }

    #[test]
    fn expand_rejects_long_name() {
        let mut octets = Vec::new();
        for _ in 0..5 {
            octets.push(63);
            octets.extend_from_slice(&[b'x'; 63]);
        }
        octets.push(0);

        assert_eq!(
            Err(ErrorKind::Corrupt {
                offset: 0,
                reason: Corruption::NameTooLong
            }),
            expand_name(&octets, 0)
        );
    }

    #[test]
    fn expand_accepts_max_length_name() {
        // 3 * 64 + 62 + 1 = 255
        let mut octets = Vec::new();
        for _ in 0..3 {
            octets.push(63);
            octets.extend_from_slice(&[b'x'; 63]);
        }
        octets.push(61);
        octets.extend_from_slice(&[b'y'; 61]);
        octets.push(0);

        let (name, consumed) = expand_name(&octets, 0).unwrap();
        assert_eq!(DOMAINNAME_MAX_LEN, name.len);
        assert_eq!(DOMAINNAME_MAX_LEN, consumed);
    }

    #[test]
    fn expand_rejects_reserved_label_types() {
        for octet in [0x40, 0x80, 0xbf] {
            assert_eq!(
                Err(ErrorKind::Corrupt {
                    offset: 0,
                    reason: Corruption::ReservedLabelType
                }),
                expand_name(&[octet, 0, 0], 0)
            );
        }
    }

    #[test]
    fn expand_truncated() {
        assert_eq!(
            Err(ErrorKind::Truncated { offset: 4 }),
            expand_name(b"\x05abc", 0)
        );
        assert_eq!(
            Err(ErrorKind::Truncated { offset: 4 }),
            expand_name(b"\x03abc", 0)
        );
        assert_eq!(
            Err(ErrorKind::Truncated { offset: 1 }),
            expand_name(&[0xc0], 0)
        );
    }

    #[test]
    fn name_in_bounded_view_may_point_outside_it() {
        let mut octets = b"\x03com\x00".to_vec();
        octets.extend_from_slice(b"\x07example\xc0\x00");
        let mut buffer = ConsumableBuffer::new(&octets);
        buffer.advance(5).unwrap();
        let mut view = buffer.sub_buffer(10).unwrap();

        assert_eq!(
            Ok(domain("example.com.")),
            DomainName::deserialise(&mut view)
        );
        assert_eq!(0, view.remaining());
    }

    #[test]
    fn name_may_not_run_past_bounded_view() {
        let octets = b"\x07example\x03com\x00";
        let mut view = ConsumableBuffer::new(octets).sub_buffer(5).unwrap();

        assert_eq!(
            Err(ErrorKind::Truncated { offset: 5 }),
            DomainName::deserialise(&mut view)
        );
    }

    #[test]
    fn header_too_short() {
        let error = Message::from_octets(&[0x12, 0x34, 0x81]).unwrap_err();
        assert_eq!(Some(0x1234), error.id());
        assert_eq!(Location::Header, error.location);
        assert!(matches!(error.kind, ErrorKind::Truncated { .. }));

        let error = Message::from_octets(&[0x12]).unwrap_err();
        assert_eq!(None, error.id());
    }

    #[test]
    fn header_flags() {
        #[rustfmt::skip]
        let octets = [
            0xbe, 0xef,
            0b1010_1101, 0b1000_0011,
            0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let header = Header::deserialise(&mut ConsumableBuffer::new(&octets)).unwrap();

        assert_eq!(0xbeef, header.id);
        assert!(header.is_response);
        assert_eq!(Opcode::Update, header.opcode);
        assert!(header.is_authoritative);
        assert!(!header.is_truncated);
        assert!(header.recursion_desired);
        assert!(header.recursion_available);
        assert_eq!(Rcode::NameError, header.rcode);
    }
}
