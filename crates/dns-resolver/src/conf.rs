//! Reading nameserver configuration from `resolv.conf`.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `options timeout:N` is capped at this.
pub const TIMEOUT_MAX: Duration = Duration::from_secs(30);

pub const DEFAULT_ATTEMPTS: usize = 2;

/// `options attempts:N` is capped at this.
pub const ATTEMPTS_MAX: usize = 5;

/// The parts of `resolv.conf` which matter to a stub resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvConf {
    pub nameservers: Vec<SocketAddr>,

    /// How long to wait for each nameserver.
    pub timeout: Duration,

    /// How many times to go through the list of nameservers.
    pub attempts: usize,
}

/// A local nameserver.
impl Default for ResolvConf {
    fn default() -> Self {
        Self {
            nameservers: vec![SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 53)],
            timeout: DEFAULT_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl ResolvConf {
    /// Parse the contents of a `resolv.conf` file.  Lines which can't
    /// be understood are skipped, and if no nameservers are given the
    /// local one is used.
    pub fn parse(contents: &str) -> Self {
        let mut conf = Self {
            nameservers: Vec::new(),
            ..Self::default()
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let mut words = line.split_whitespace();
            match words.next() {
                Some("nameserver") => match words.next().and_then(parse_nameserver) {
                    Some(address) => conf.nameservers.push(address),
                    None => tracing::debug!(%line, "ignoring bad nameserver line"),
                },
                Some("options") => {
                    for option in words {
                        conf.parse_option(option);
                    }
                }
                _ => (),
            }
        }

        if conf.nameservers.is_empty() {
            conf.nameservers = Self::default().nameservers;
        }

        conf
    }

    /// # Errors
    ///
    /// If the file cannot be read.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&contents))
    }

    /// Read `/etc/resolv.conf`, or use the defaults if it can't be
    /// read.
    pub async fn system() -> Self {
        match Self::from_file(RESOLV_CONF_PATH).await {
            Ok(conf) => conf,
            Err(error) => {
                tracing::debug!(path = RESOLV_CONF_PATH, %error, "using default nameserver");
                Self::default()
            }
        }
    }

    fn parse_option(&mut self, option: &str) {
        let Some((name, value)) = option.split_once(':') else {
            return;
        };
        let Ok(value) = value.parse::<u64>() else {
            return;
        };

        match name {
            "timeout" => self.timeout = Duration::from_secs(value).min(TIMEOUT_MAX),
            "attempts" => {
                self.attempts = usize::try_from(value).unwrap_or(usize::MAX).min(ATTEMPTS_MAX);
            }
            _ => (),
        }
    }
}

/// An address, dropping any `%interface` scope suffix.
fn parse_nameserver(word: &str) -> Option<SocketAddr> {
    let address = word.split('%').next()?;
    let ip = address.parse::<IpAddr>().ok()?;
    Some(SocketAddr::new(ip, 53))
}
