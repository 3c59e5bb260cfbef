#![warn(clippy::pedantic)]
// TODO: fix
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Don't care enough to fix
#![allow(clippy::match_same_arms)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::wildcard_imports)]

//! Getting raw DNS responses from somewhere.  The parsing and
//! rendering of responses lives in `dns_types`: this crate only
//! obtains the octets.

pub mod conf;
pub mod net;
pub mod stub;

use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;

use dns_types::protocol::types::{DomainName, Message, RecordClass, RecordType};
use dns_types::protocol::{deserialise, serialise};

/// A source of answers to queries.
pub trait Backend {
    /// Ask a single question, returning the response exactly as it was
    /// received.  The response has been checked to be an answer to
    /// this question, but has not otherwise been parsed.
    fn raw_query(
        &self,
        name: &DomainName,
        qtype: RecordType,
        qclass: RecordClass,
    ) -> impl Future<Output = Result<RawAnswer, QueryError>> + Send;
}

/// An unparsed response, and who sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnswer {
    pub nameserver: SocketAddr,
    pub octets: Bytes,
}

impl RawAnswer {
    /// # Errors
    ///
    /// If the response cannot be parsed.
    pub fn parse(&self) -> Result<Message, deserialise::Error> {
        Message::from_octets(&self.octets)
    }
}

/// An error that can occur when querying a nameserver.
#[derive(Debug)]
pub enum QueryError {
    /// There is nobody to ask.
    NoNameservers,

    Io {
        nameserver: SocketAddr,
        error: io::Error,
    },

    Timeout {
        nameserver: SocketAddr,
    },

    /// The response is not an answer to the question asked: the ID,
    /// opcode, or question differs, or the QR bit is clear.
    Mismatch {
        nameserver: SocketAddr,
    },

    /// A TCP response ended before its length prefix said it would.
    ShortResponse {
        nameserver: SocketAddr,
        expected: usize,
        actual: usize,
    },

    /// The query is too big for the chosen transport.
    QueryTooLong {
        len: usize,
    },

    Parse(deserialise::Error),

    Serialise(serialise::Error),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryError::NoNameservers => write!(f, "no nameservers configured"),
            QueryError::Io { nameserver, error } => write!(f, "{nameserver}: {error}"),
            QueryError::Timeout { nameserver } => write!(f, "{nameserver}: timed out"),
            QueryError::Mismatch { nameserver } => {
                write!(f, "{nameserver}: response does not match query")
            }
            QueryError::ShortResponse {
                nameserver,
                expected,
                actual,
            } => write!(
                f,
                "{nameserver}: expected {expected} octets of response, got {actual}"
            ),
            QueryError::QueryTooLong { len } => write!(f, "query of {len} octets is too long"),
            QueryError::Parse(error) => write!(f, "could not parse response: {error}"),
            QueryError::Serialise(error) => write!(f, "could not serialise query: {error}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Io { error, .. } => Some(error),
            QueryError::Parse(error) => Some(error),
            QueryError::Serialise(error) => Some(error),
            _ => None,
        }
    }
}

impl From<deserialise::Error> for QueryError {
    fn from(error: deserialise::Error) -> Self {
        QueryError::Parse(error)
    }
}

impl From<serialise::Error> for QueryError {
    fn from(error: serialise::Error) -> Self {
        QueryError::Serialise(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_types::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    #[test]
    fn raw_answer_parses() {
        let message = response(
            vec![question("www.example.com.", RecordType::A)],
            vec![a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
        );
        let raw = RawAnswer {
            nameserver: (Ipv4Addr::LOCALHOST, 53).into(),
            octets: message.to_octets().unwrap().freeze(),
        };

        assert_eq!(Ok(message), raw.parse());
    }

    #[test]
    fn raw_answer_parse_error() {
        let raw = RawAnswer {
            nameserver: (Ipv4Addr::LOCALHOST, 53).into(),
            octets: Bytes::from_static(&[0x12, 0x34, 0x81]),
        };

        assert_eq!(Some(0x1234), raw.parse().unwrap_err().id);
    }

    #[test]
    fn errors_display_nameserver() {
        let nameserver = (Ipv4Addr::new(192, 0, 2, 1), 53).into();
        assert_eq!(
            "192.0.2.1:53: timed out",
            QueryError::Timeout { nameserver }.to_string()
        );
        assert_eq!(
            "192.0.2.1:53: response does not match query",
            QueryError::Mismatch { nameserver }.to_string()
        );
    }
}
