use config::{Config, ConfigError, File};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use dns_types::render::RenderFlags;

/// Defaults read from a settings file.  Command-line arguments take
/// precedence.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Default)]
pub struct Settings {
    /// Used instead of the nameservers in `resolv.conf`.
    #[serde(default)]
    pub nameservers: Vec<Nameserver>,

    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub render: RenderSettings,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Default)]
pub struct RenderSettings {
    #[serde(default)]
    pub sections: Vec<SectionName>,
    #[serde(default)]
    pub detail: bool,
    #[serde(default)]
    pub section_names: bool,
    #[serde(default)]
    pub field_names: bool,
    #[serde(default)]
    pub multiple: bool,
}

impl RenderSettings {
    /// The flags this asks for.  No sections at all means just the
    /// answer section.
    pub fn flags(&self) -> RenderFlags {
        let mut flags = RenderFlags::empty();
        for section in &self.sections {
            flags |= section.flags();
        }
        if flags == RenderFlags::empty() {
            flags = RenderFlags::ANSWER;
        }
        if self.detail {
            flags |= RenderFlags::DETAIL;
        }
        if self.section_names {
            flags |= RenderFlags::SECTION_NAMES;
        }
        if self.field_names {
            flags |= RenderFlags::FIELD_NAMES;
        }
        if self.multiple {
            flags |= RenderFlags::MULTIPLE;
        }
        flags
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum SectionName {
    Question,
    Answer,
    Authority,
    Additional,
    All,
}

impl TryFrom<String> for SectionName {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "question" => Ok(SectionName::Question),
            "answer" => Ok(SectionName::Answer),
            "authority" => Ok(SectionName::Authority),
            "additional" => Ok(SectionName::Additional),
            "all" => Ok(SectionName::All),
            _ => Err(format!("unknown section '{s}'")),
        }
    }
}

impl SectionName {
    pub fn flags(self) -> RenderFlags {
        match self {
            SectionName::Question => RenderFlags::QUESTION,
            SectionName::Answer => RenderFlags::ANSWER,
            SectionName::Authority => RenderFlags::AUTHORITY,
            SectionName::Additional => RenderFlags::ADDITIONAL,
            SectionName::All => RenderFlags::ALL_SECTIONS,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Nameserver {
    pub address: SocketAddr,
}

/// An address with an optional port, 53 if not given.
///
/// # Errors
///
/// If the string is not an address.
pub fn parse_nameserver(s: &str) -> Result<SocketAddr, String> {
    if let Ok(address) = s.parse::<SocketAddr>() {
        return Ok(address);
    }
    match s.parse::<IpAddr>() {
        Ok(ip) => Ok(SocketAddr::new(ip, 53)),
        Err(_) => Err(format!("'{s}' is not an IP address")),
    }
}

impl<'de> Deserialize<'de> for Nameserver {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NameserverVisitor;

        impl Visitor<'_> for NameserverVisitor {
            type Value = Nameserver;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an IP address, optionally with a port")
            }

            fn visit_str<E>(self, v: &str) -> Result<Nameserver, E>
            where
                E: de::Error,
            {
                match parse_nameserver(v) {
                    Ok(address) => Ok(Nameserver { address }),
                    Err(_) => Err(de::Error::invalid_value(
                        Unexpected::Str(v),
                        &"an IP address",
                    )),
                }
            }
        }

        deserializer.deserialize_str(NameserverVisitor)
    }
}

impl Settings {
    pub fn new(path: &Path) -> Result<Self, ConfigError> {
        Self::load(File::from(path))
    }

    fn load<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder().add_source(source).build()?.try_deserialize()
    }
}
