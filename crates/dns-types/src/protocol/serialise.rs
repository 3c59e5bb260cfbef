//! Serialisation of DNS messages to the wire format.  See the `types`
//! module for details of the format.
//!
//! Owner and question names are compressed against earlier names in
//! the message.  Names inside RDATA are always written in full, so the
//! length of serialised RDATA does not depend on where it is written.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use crate::protocol::types::*;

/// Compression pointers have 14 bits of offset.
const POINTER_OFFSET_MAX: usize = 0x3FFF;

impl Message {
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn to_octets(&self) -> Result<BytesMut, Error> {
        let mut buffer = WritableBuffer::default();
        self.serialise(&mut buffer)?;
        Ok(buffer.octets)
    }

    /// The header counts are taken from the section lengths, not from
    /// `self.header`.
    ///
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        Header {
            qdcount: usize_to_u16(self.questions.len())?,
            ancount: usize_to_u16(self.answers.len())?,
            nscount: usize_to_u16(self.authority.len())?,
            arcount: usize_to_u16(self.additional.len())?,
            ..self.header
        }
        .serialise(buffer);

        for question in &self.questions {
            question.serialise(buffer);
        }
        for rr in &self.answers {
            rr.serialise(buffer)?;
        }
        for rr in &self.authority {
            rr.serialise(buffer)?;
        }
        for rr in &self.additional {
            rr.serialise(buffer)?;
        }

        Ok(())
    }
}

impl Header {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        // octet 1
        let flag_qr = if self.is_response { HEADER_MASK_QR } else { 0 };
        let field_opcode = HEADER_MASK_OPCODE & (u8::from(self.opcode) << HEADER_OFFSET_OPCODE);
        let flag_aa = if self.is_authoritative {
            HEADER_MASK_AA
        } else {
            0
        };
        let flag_tc = if self.is_truncated { HEADER_MASK_TC } else { 0 };
        let flag_rd = if self.recursion_desired {
            HEADER_MASK_RD
        } else {
            0
        };
        // octet 2
        let flag_ra = if self.recursion_available {
            HEADER_MASK_RA
        } else {
            0
        };
        let field_rcode = HEADER_MASK_RCODE & (u8::from(self.rcode) << HEADER_OFFSET_RCODE);

        buffer.write_u16(self.id);
        buffer.write_u8(flag_qr | field_opcode | flag_aa | flag_tc | flag_rd);
        buffer.write_u8(flag_ra | field_rcode);
        buffer.write_u16(self.qdcount);
        buffer.write_u16(self.ancount);
        buffer.write_u16(self.nscount);
        buffer.write_u16(self.arcount);
    }
}

impl Question {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer, true);
        buffer.write_u16(self.qtype.into());
        buffer.write_u16(self.qclass.into());
    }
}

impl ResourceRecord {
    /// The RDLENGTH written is that of the data actually written;
    /// `self.rdlength` is ignored.
    ///
    /// # Errors
    ///
    /// If the RDATA is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        self.name.serialise(buffer, true);
        buffer.write_u16(self.rtype.into());
        buffer.write_u16(self.rclass.into());
        buffer.write_u32(self.ttl);

        // filled in below
        let rdlength_index = buffer.index();
        buffer.write_u16(0);

        self.rdata.serialise(buffer)?;

        // -2 so we don't also include the 2 octets for the rdlength
        let len = buffer.index() - rdlength_index - 2;
        let rdlength = u16::try_from(len).map_err(|_| Error::RDataTooLong { len })?;
        let [hi, lo] = rdlength.to_be_bytes();
        buffer.octets[rdlength_index] = hi;
        buffer.octets[rdlength_index + 1] = lo;

        Ok(())
    }
}

impl RData {
    /// # Errors
    ///
    /// If a count inside the data does not fit its field.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        match self {
            RData::Address(address) => buffer.write_octets(&address.octets()),
            RData::DomainRef(name) => name.serialise(buffer, false),
            RData::NamePair { first, second } => {
                first.serialise(buffer, false);
                second.serialise(buffer, false);
            }
            RData::PreferenceAndName { preference, name } => {
                buffer.write_u16(*preference);
                name.serialise(buffer, false);
            }
            RData::StringList(strings) => {
                for string in strings {
                    let len = u8::try_from(string.len()).map_err(|_| Error::CounterTooLarge {
                        counter: string.len(),
                        bits: u8::BITS,
                    })?;
                    buffer.write_u8(len);
                    buffer.write_octets(string);
                }
            }
            RData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                mname.serialise(buffer, false);
                rname.serialise(buffer, false);
                buffer.write_u32(*serial);
                buffer.write_u32(*refresh);
                buffer.write_u32(*retry);
                buffer.write_u32(*expire);
                buffer.write_u32(*minimum);
            }
            RData::Octets(octets) => buffer.write_octets(octets),
            RData::Wks {
                address,
                protocol,
                bitmap,
            } => {
                buffer.write_octets(&address.octets());
                buffer.write_u8(*protocol);
                buffer.write_octets(bitmap);
            }
            RData::Aaaa(address) => buffer.write_octets(&address.octets()),
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
                buffer.write_u16((*type_covered).into());
                buffer.write_u8(*algorithm);
                buffer.write_u8(*labels);
                buffer.write_u32(*original_ttl);
                buffer.write_u32(*expiration);
                buffer.write_u32(*inception);
                buffer.write_u16(*key_tag);
                signer.serialise(buffer, false);
                buffer.write_octets(signature);
            }
            RData::Key {
                flags,
                protocol,
                algorithm,
                public_key,
            } => {
                buffer.write_u16(*flags);
                buffer.write_u8(*protocol);
                buffer.write_u8(*algorithm);
                buffer.write_octets(public_key);
            }
            RData::Atma { format, address } => {
                buffer.write_u8(*format);
                buffer.write_octets(address);
            }
            RData::Nxt { next, bitmap } => {
                next.serialise(buffer, false);
                buffer.write_octets(bitmap);
            }
            RData::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                buffer.write_u16(*priority);
                buffer.write_u16(*weight);
                buffer.write_u16(*port);
                target.serialise(buffer, false);
            }
            RData::WinsForward {
                replicate,
                lookup_timeout,
                cache_timeout,
                servers,
            } => {
                let count = u32::try_from(servers.len()).map_err(|_| Error::CounterTooLarge {
                    counter: servers.len(),
                    bits: u32::BITS,
                })?;
                buffer.write_u32(wins_flags(*replicate));
                buffer.write_u32(*lookup_timeout);
                buffer.write_u32(*cache_timeout);
                buffer.write_u32(count);
                for server in servers {
                    buffer.write_octets(&server.octets());
                }
            }
            RData::WinsReverse {
                replicate,
                lookup_timeout,
                cache_timeout,
                name,
            } => {
                buffer.write_u32(wins_flags(*replicate));
                buffer.write_u32(*lookup_timeout);
                buffer.write_u32(*cache_timeout);
                name.serialise(buffer, false);
            }
        }

        Ok(())
    }
}

fn wins_flags(replicate: bool) -> u32 {
    if replicate {
        0
    } else {
        WINS_FLAG_LOCAL
    }
}

impl DomainName {
    pub fn serialise(&self, buffer: &mut WritableBuffer, compress: bool) {
        if compress {
            if let Some(ptr) = buffer.name_pointer(self) {
                buffer.write_u16(ptr);
                return;
            }
        }

        buffer.memoise_name(self);
        for label in &self.labels {
            buffer.write_u8(label.len());
            buffer.write_octets(label.octets());
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    CounterTooLarge { counter: usize, bits: u32 },
    RDataTooLong { len: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
            Error::RDataTooLong { len } => {
                write!(f, "RDATA of {len} octets does not fit in RDLENGTH")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which can be written to, for serialisation purposes.
pub struct WritableBuffer {
    pub octets: BytesMut,
    name_pointers: HashMap<DomainName, u16>,
}

impl Default for WritableBuffer {
    fn default() -> Self {
        Self {
            octets: BytesMut::with_capacity(512),
            name_pointers: HashMap::new(),
        }
    }
}

impl WritableBuffer {
    pub fn index(&self) -> usize {
        self.octets.len()
    }

    /// Remember where `name` starts, if a pointer can reach it.
    pub fn memoise_name(&mut self, name: &DomainName) {
        let index = self.index();
        if !name.is_root() && index <= POINTER_OFFSET_MAX && !self.name_pointers.contains_key(name)
        {
            if let Ok(index) = u16::try_from(index) {
                let [hi, lo] = index.to_be_bytes();
                self.name_pointers
                    .insert(name.clone(), u16::from_be_bytes([hi | 0b1100_0000, lo]));
            }
        }
    }

    pub fn name_pointer(&self, name: &DomainName) -> Option<u16> {
        self.name_pointers.get(name).copied()
    }

    pub fn write_u8(&mut self, octet: u8) {
        self.octets.put_u8(octet);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_octets(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_octets(&value.to_be_bytes());
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        self.octets.put_slice(octets);
    }
}

fn usize_to_u16(counter: usize) -> Result<u16, Error> {
    if let Ok(t) = u16::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u16::BITS,
        })
    }
}
