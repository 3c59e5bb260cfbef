//! Decoding of RDATA.  Record types are grouped by the layout of their
//! data, and each layout has one decoder.

use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::deserialise::{ConsumableBuffer, ErrorKind, Malformation};
use crate::protocol::types::*;

/// Length of an ATM End System Address, the only ATMA format with a
/// fixed size.
pub const ATMA_AESA_LEN: usize = 20;

/// The layout of a record type's RDATA.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Shape {
    Address,
    DomainRef,
    NamePair,
    PreferenceAndName,
    StringList,
    Soa,
    Null,
    Wks,
    Aaaa,
    Sig,
    Key,
    Atma,
    Nxt,
    Srv,
    WinsForward,
    WinsReverse,
    /// No decoder: the data is kept as uninterpreted octets.
    Opaque,
}

impl Shape {
    pub fn of(rtype: RecordType) -> Self {
        match rtype {
            RecordType::A => Shape::Address,
            RecordType::NS
            | RecordType::MD
            | RecordType::MF
            | RecordType::CNAME
            | RecordType::MB
            | RecordType::MG
            | RecordType::MR
            | RecordType::PTR
            | RecordType::NSAPPTR
            | RecordType::DNAME => Shape::DomainRef,
            RecordType::MINFO | RecordType::RP => Shape::NamePair,
            RecordType::MX | RecordType::AFSDB | RecordType::RT | RecordType::KX => {
                Shape::PreferenceAndName
            }
            RecordType::HINFO | RecordType::TXT | RecordType::X25 | RecordType::ISDN => {
                Shape::StringList
            }
            RecordType::SOA => Shape::Soa,
            RecordType::NULL => Shape::Null,
            RecordType::WKS => Shape::Wks,
            RecordType::AAAA => Shape::Aaaa,
            RecordType::SIG => Shape::Sig,
            RecordType::KEY => Shape::Key,
            RecordType::ATMA => Shape::Atma,
            RecordType::NXT => Shape::Nxt,
            RecordType::SRV => Shape::Srv,
            RecordType::WINS => Shape::WinsForward,
            RecordType::WINSR => Shape::WinsReverse,
            _ => Shape::Opaque,
        }
    }
}

impl RData {
    /// Decode the RDATA of a record of type `rtype`.  `buffer` must be
    /// bounded at the end of the RDATA: running past it is a
    /// `Malformed` error.
    ///
    /// # Errors
    ///
    /// If the data does not fit the layout of the type.
    pub fn deserialise(rtype: RecordType, buffer: &mut ConsumableBuffer) -> Result<Self, ErrorKind> {
        let shape = Shape::of(rtype);
        if shape == Shape::Opaque {
            tracing::trace!(%rtype, "no decoder, keeping opaque octets");
        }

        decode(shape, buffer).map_err(|error| match error {
            ErrorKind::Truncated { offset } => ErrorKind::Malformed {
                offset,
                rtype,
                reason: Malformation::Overrun,
            },
            ErrorKind::Malformed { offset, reason, .. } => ErrorKind::Malformed {
                offset,
                rtype,
                reason,
            },
            corrupt @ ErrorKind::Corrupt { .. } => corrupt,
        })
    }
}

fn decode(shape: Shape, buffer: &mut ConsumableBuffer) -> Result<RData, ErrorKind> {
    let rdata = match shape {
        Shape::Address => RData::Address(Ipv4Addr::from(exact::<4>(buffer)?)),
        Shape::DomainRef => RData::DomainRef(DomainName::deserialise(buffer)?),
        Shape::NamePair => RData::NamePair {
            first: DomainName::deserialise(buffer)?,
            second: DomainName::deserialise(buffer)?,
        },
        Shape::PreferenceAndName => RData::PreferenceAndName {
            preference: buffer.next_u16()?,
            name: DomainName::deserialise(buffer)?,
        },
        Shape::StringList => {
            let mut strings = Vec::new();
            while buffer.remaining() > 0 {
                let size = buffer.next_u8()?;
                strings.push(Bytes::copy_from_slice(buffer.take(size.into())?));
            }
            RData::StringList(strings)
        }
        Shape::Soa => RData::Soa {
            mname: DomainName::deserialise(buffer)?,
            rname: DomainName::deserialise(buffer)?,
            serial: buffer.next_u32()?,
            refresh: buffer.next_u32()?,
            retry: buffer.next_u32()?,
            expire: buffer.next_u32()?,
            minimum: buffer.next_u32()?,
        },
        Shape::Null | Shape::Opaque => RData::Octets(rest(buffer)),
        Shape::Wks => RData::Wks {
            address: Ipv4Addr::from(buffer.next_u32()?),
            protocol: buffer.next_u8()?,
            bitmap: rest(buffer),
        },
        Shape::Aaaa => RData::Aaaa(Ipv6Addr::from(exact::<16>(buffer)?)),
        Shape::Sig => RData::Sig {
            type_covered: RecordType::from(buffer.next_u16()?),
            algorithm: buffer.next_u8()?,
            labels: buffer.next_u8()?,
            original_ttl: buffer.next_u32()?,
            expiration: buffer.next_u32()?,
            inception: buffer.next_u32()?,
            key_tag: buffer.next_u16()?,
            signer: DomainName::deserialise(buffer)?,
            signature: rest(buffer),
        },
        Shape::Key => RData::Key {
            flags: buffer.next_u16()?,
            protocol: buffer.next_u8()?,
            algorithm: buffer.next_u8()?,
            public_key: rest(buffer),
        },
        Shape::Atma => {
            let format = buffer.next_u8()?;
            let address = match format {
                0 => Bytes::copy_from_slice(&exact::<ATMA_AESA_LEN>(buffer)?),
                1 => rest(buffer),
                _ => Bytes::new(),
            };
            RData::Atma { format, address }
        }
        Shape::Nxt => RData::Nxt {
            next: DomainName::deserialise(buffer)?,
            bitmap: rest(buffer),
        },
        Shape::Srv => RData::Srv {
            priority: buffer.next_u16()?,
            weight: buffer.next_u16()?,
            port: buffer.next_u16()?,
            target: DomainName::deserialise(buffer)?,
        },
        Shape::WinsForward => {
            let replicate = buffer.next_u32()? & WINS_FLAG_LOCAL == 0;
            let lookup_timeout = buffer.next_u32()?;
            let cache_timeout = buffer.next_u32()?;
            let count = buffer.next_u32()?;
            let count = usize::try_from(count).unwrap_or(usize::MAX);
            if buffer.remaining() / 4 < count {
                return Err(ErrorKind::Truncated {
                    offset: buffer.position() + buffer.remaining(),
                });
            }
            let mut servers = Vec::with_capacity(count);
            for _ in 0..count {
                servers.push(Ipv4Addr::from(buffer.next_u32()?));
            }
            RData::WinsForward {
                replicate,
                lookup_timeout,
                cache_timeout,
                servers,
            }
        }
        Shape::WinsReverse => RData::WinsReverse {
            replicate: buffer.next_u32()? & WINS_FLAG_LOCAL == 0,
            lookup_timeout: buffer.next_u32()?,
            cache_timeout: buffer.next_u32()?,
            name: DomainName::deserialise(buffer)?,
        },
    };

    Ok(rdata)
}

/// Consume the rest of the RDATA, which must be exactly `N` octets.
fn exact<const N: usize>(buffer: &mut ConsumableBuffer) -> Result<[u8; N], ErrorKind> {
    if buffer.remaining() != N {
        return Err(ErrorKind::Malformed {
            offset: buffer.position(),
            rtype: RecordType(0),
            reason: Malformation::WrongLength {
                expected: N,
                actual: buffer.remaining(),
            },
        });
    }
    let mut array = [0; N];
    array.copy_from_slice(buffer.take_rest());
    Ok(array)
}

fn rest(buffer: &mut ConsumableBuffer) -> Bytes {
    Bytes::copy_from_slice(buffer.take_rest())
}
