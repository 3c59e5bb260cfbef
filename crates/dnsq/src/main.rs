#![warn(clippy::pedantic)]
#![allow(clippy::struct_excessive_bools)]

mod settings;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use dns_resolver::conf::ResolvConf;
use dns_resolver::stub::StubResolver;
use dns_resolver::Backend;
use dns_types::protocol::types::{DomainName, Message, RecordClass, RecordType, ResourceRecord};
use dns_types::render::{render, RenderFlags};

use self::settings::{parse_nameserver, Settings};

// the doc comments for this struct turn into the CLI help text
#[derive(Debug, Parser)]
/// DNS lookup utility
///
/// Sends a query to a recursive nameserver (from --server, the
/// settings file, or /etc/resolv.conf) and prints the response.
struct Args {
    /// Domain name to look up
    #[clap(required_unless_present = "nameservers")]
    domain: Option<DomainName>,

    /// Record type, as a mnemonic (A, MX, TXT, ...) or TYPEn
    #[clap(short = 't', long = "type", default_value_t = RecordType::A)]
    qtype: RecordType,

    /// Record class, as a mnemonic (IN, CH, HS, ...) or CLASSn
    #[clap(short = 'c', long = "class", default_value_t = RecordClass::IN)]
    qclass: RecordClass,

    /// Nameserver to ask, with an optional port, can be specified more
    /// than once
    #[clap(short, long = "server", value_parser = parse_nameserver)]
    servers: Vec<SocketAddr>,

    /// Seconds to wait for each nameserver
    #[clap(long)]
    timeout: Option<u64>,

    /// Print the nameservers which would be asked, and exit
    #[clap(long)]
    nameservers: bool,

    /// Path to a YAML settings file
    #[clap(long, env = "DNSQ_CONFIG")]
    config: Option<PathBuf>,

    /// Print the rendered response as JSON, rather than as text
    #[clap(long)]
    json: bool,

    /// Log as JSON, rather than as text
    #[clap(long)]
    log_json: bool,

    /// Include the question section
    #[clap(long)]
    question: bool,

    /// Include the answer section (the default if no section is given)
    #[clap(long)]
    answer: bool,

    /// Include the authority section
    #[clap(long)]
    authority: bool,

    /// Include the additional section
    #[clap(long)]
    additional: bool,

    /// Include every section
    #[clap(long)]
    all: bool,

    /// Include the name, type, class, TTL, and length of each record
    #[clap(long)]
    detail: bool,

    /// Key the output by section name
    #[clap(long)]
    section_names: bool,

    /// Name the fields of each record
    #[clap(long)]
    field_names: bool,

    /// Render every section as a list, even if it has one entry
    #[clap(long)]
    multiple: bool,
}

impl Args {
    /// Section switches replace the settings file's sections; other
    /// switches are added to the settings file's.
    fn render_flags(&self, settings: &Settings) -> RenderFlags {
        let mut sections = RenderFlags::empty();
        for (given, flag) in [
            (self.question, RenderFlags::QUESTION),
            (self.answer, RenderFlags::ANSWER),
            (self.authority, RenderFlags::AUTHORITY),
            (self.additional, RenderFlags::ADDITIONAL),
            (self.all, RenderFlags::ALL_SECTIONS),
        ] {
            if given {
                sections |= flag;
            }
        }

        let defaults = settings.render.flags();
        let mut flags = if sections == RenderFlags::empty() {
            defaults
        } else {
            let shape = defaults.bits() & !RenderFlags::ALL_SECTIONS.bits();
            sections | RenderFlags::from_bits(shape)
        };

        for (given, flag) in [
            (self.detail, RenderFlags::DETAIL),
            (self.section_names, RenderFlags::SECTION_NAMES),
            (self.field_names, RenderFlags::FIELD_NAMES),
            (self.multiple, RenderFlags::MULTIPLE),
        ] {
            if given {
                flags |= flag;
            }
        }

        flags
    }
}

fn begin_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Nameservers from the command line, then the settings file, then
/// `resolv.conf`.
async fn resolver(args: &Args, settings: &Settings) -> StubResolver {
    let conf = ResolvConf::system().await;

    let nameservers = if !args.servers.is_empty() {
        args.servers.clone()
    } else if !settings.nameservers.is_empty() {
        settings.nameservers.iter().map(|ns| ns.address).collect()
    } else {
        conf.nameservers
    };

    let timeout = args
        .timeout
        .or(settings.timeout_secs)
        .map_or(conf.timeout, Duration::from_secs);

    StubResolver::new(nameservers, timeout, conf.attempts)
}

fn print_section(heading: &str, rrs: &[ResourceRecord]) {
    if rrs.is_empty() {
        return;
    }

    println!("\n;; {heading}");
    for rr in rrs {
        println!("{rr}");
    }
}

fn print_message(nameserver: SocketAddr, message: &Message) {
    println!(";; SERVER: {nameserver}");
    println!(
        ";; opcode: {}, status: {}, id: {}",
        message.header.opcode, message.header.rcode, message.header.id
    );

    println!("\n;; QUESTION");
    for question in &message.questions {
        println!("{}\t{}\t{}", question.name, question.qclass, question.qtype);
    }

    if message.is_negative() {
        println!("\n;; ANSWER");
        println!("; {}", message.header.rcode);
    } else {
        print_section("ANSWER", &message.answers);
    }
    print_section("AUTHORITY", &message.authority);
    print_section("ADDITIONAL", &message.additional);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    begin_logging(args.log_json);

    let settings = if let Some(path) = &args.config {
        match Settings::new(path) {
            Ok(settings) => settings,
            Err(error) => {
                eprintln!("could not load settings: {error}");
                process::exit(1);
            }
        }
    } else {
        Settings::default()
    };

    let resolver = resolver(&args, &settings).await;

    if args.nameservers {
        for nameserver in resolver.nameservers() {
            println!("{nameserver}");
        }
        return;
    }

    let Some(domain) = &args.domain else {
        eprintln!("no domain name given");
        process::exit(1);
    };

    tracing::debug!(%domain, qtype = %args.qtype, qclass = %args.qclass, "querying");

    let raw = match resolver.raw_query(domain, args.qtype, args.qclass).await {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    };

    let message = match raw.parse() {
        Ok(message) => message,
        Err(error) => {
            eprintln!("{}: could not parse response: {error}", raw.nameserver);
            process::exit(1);
        }
    };

    if args.json {
        let value = render(&message, args.render_flags(&settings));
        match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("could not serialise output: {error}");
                process::exit(1);
            }
        }
    } else {
        print_message(raw.nameserver, &message);
    }
}
