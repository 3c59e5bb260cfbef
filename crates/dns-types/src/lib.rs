#![warn(clippy::pedantic)]
// Don't care enough to fix
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::too_many_lines)]
// False positives
#![allow(clippy::match_same_arms)]

//! Parsing and rendering of DNS messages.
//!
//! `protocol` holds the wire format: the message types, a parser which
//! is safe against hostile input, the RDATA decoders, and a serialiser
//! for building queries.  `mnemonic` maps type and class codes to and
//! from their names.  `render` turns a parsed message into a tree of
//! plain values.
//!
//! Nothing here does any I/O.

pub mod mnemonic;
pub mod protocol;
pub mod render;
