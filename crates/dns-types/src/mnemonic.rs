//! The mnemonic registry: record type and class codes to and from
//! their textual names.
//!
//! Type mnemonics live in one contiguous table split into blocks of
//! consecutive codes, so code-to-name is a block lookup and an index.
//! Name-to-code goes through a case-insensitive hash map built on
//! first use, which also holds the aliases.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Canonical type mnemonics, block by block.
static TYPE_MNEMONICS: [&str; 55] = [
    // 1 ..= 41
    "A", "NS", "MD", "MF", "CNAME", "SOA", "MB", "MG", "MR", "NULL", "WKS", "PTR", "HINFO",
    "MINFO", "MX", "TXT", "RP", "AFSDB", "X25", "ISDN", "RT", "NSAP", "NSAPPTR", "SIG", "KEY",
    "PX", "GPOS", "AAAA", "LOC", "NXT", "EID", "NIMLOC", "SRV", "ATMA", "NAPTR", "KX", "CERT",
    "A6", "DNAME", "SINK", "OPT",
    // 100 ..= 103
    "UINFO", "UID", "GID", "UNSPEC",
    // 248 ..= 255
    "ADDRS", "TKEY", "TSIG", "IXFR", "AXFR", "MAILB", "MAILA", "ANY",
    // 0xFF01 ..= 0xFF02
    "WINS", "WINSR",
];

/// A run of consecutive type codes, and where its mnemonics start in
/// `TYPE_MNEMONICS`.
struct Block {
    first_code: u16,
    last_code: u16,
    first_index: usize,
}

static TYPE_BLOCKS: [Block; 4] = [
    Block {
        first_code: 1,
        last_code: 41,
        first_index: 0,
    },
    Block {
        first_code: 100,
        last_code: 103,
        first_index: 41,
    },
    Block {
        first_code: 248,
        last_code: 255,
        first_index: 45,
    },
    Block {
        first_code: 0xFF01,
        last_code: 0xFF02,
        first_index: 53,
    },
];

/// Alternative spellings accepted on input; never produced on output.
static TYPE_ALIASES: [(&str, u16); 5] = [
    ("TEXT", 16),
    ("NSAP-PTR", 23),
    ("ALL", 255),
    ("*", 255),
    ("NBSTAT", 0xFF02),
];

/// Classes 2 and 3 follow the assignments this registry has always
/// used, not those of RFC 1035 (which has CS at 2 and CH at 3).
static CLASS_MNEMONICS: [(&str, u16); 5] = [
    ("IN", 1),
    ("CH", 2),
    ("CS", 3),
    ("HS", 4),
    ("ANY", 255),
];

static CLASS_ALIASES: [(&str, u16); 2] = [("CN", 2), ("*", 255)];

static TYPE_CODES: LazyLock<HashMap<&'static str, u16>> = LazyLock::new(|| {
    let mut codes = HashMap::with_capacity(TYPE_MNEMONICS.len() + TYPE_ALIASES.len());
    for block in &TYPE_BLOCKS {
        for code in block.first_code..=block.last_code {
            let index = block.first_index + usize::from(code - block.first_code);
            codes.insert(TYPE_MNEMONICS[index], code);
        }
    }
    codes.extend(TYPE_ALIASES.iter().copied());
    codes
});

static CLASS_CODES: LazyLock<HashMap<&'static str, u16>> = LazyLock::new(|| {
    CLASS_MNEMONICS
        .iter()
        .chain(CLASS_ALIASES.iter())
        .copied()
        .collect()
});

/// Look up a record type mnemonic, ignoring case.
pub fn type_mnemonic_to_code(mnemonic: &str) -> Result<u16, UnknownMnemonic> {
    TYPE_CODES
        .get(mnemonic.to_ascii_uppercase().as_str())
        .copied()
        .ok_or_else(|| UnknownMnemonic {
            table: Table::RecordType,
            mnemonic: mnemonic.to_string(),
        })
}

/// The canonical mnemonic of a record type code, if it has one.
pub fn type_mnemonic(code: u16) -> Option<&'static str> {
    TYPE_BLOCKS
        .iter()
        .find(|block| (block.first_code..=block.last_code).contains(&code))
        .map(|block| TYPE_MNEMONICS[block.first_index + usize::from(code - block.first_code)])
}

/// The canonical mnemonic of a record type code, or its decimal value.
pub fn code_to_type_mnemonic(code: u16) -> String {
    match type_mnemonic(code) {
        Some(mnemonic) => mnemonic.to_string(),
        None => code.to_string(),
    }
}

/// Look up a class mnemonic, ignoring case.
pub fn class_mnemonic_to_code(mnemonic: &str) -> Result<u16, UnknownMnemonic> {
    CLASS_CODES
        .get(mnemonic.to_ascii_uppercase().as_str())
        .copied()
        .ok_or_else(|| UnknownMnemonic {
            table: Table::RecordClass,
            mnemonic: mnemonic.to_string(),
        })
}

/// The canonical mnemonic of a class code, if it has one.
pub fn class_mnemonic(code: u16) -> Option<&'static str> {
    CLASS_MNEMONICS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(mnemonic, _)| *mnemonic)
}

/// The canonical mnemonic of a class code, or its decimal value.
pub fn code_to_class_mnemonic(code: u16) -> String {
    match class_mnemonic(code) {
        Some(mnemonic) => mnemonic.to_string(),
        None => code.to_string(),
    }
}

/// Which table a failed lookup was made against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Table {
    RecordType,
    RecordClass,
}

/// A mnemonic with no entry in the registry.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UnknownMnemonic {
    pub table: Table,
    pub mnemonic: String,
}

impl fmt::Display for UnknownMnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.table {
            Table::RecordType => write!(f, "unknown DNS RR type \"{}\"", self.mnemonic),
            Table::RecordClass => write!(f, "unknown domain system class \"{}\"", self.mnemonic),
        }
    }
}

impl std::error::Error for UnknownMnemonic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
