use crate::api::{dns, registrar};
use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Pure clap command definitions with zero business logic
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("access-key-id")
                .env("DOMAINPULSE_ACCESS_KEY_ID")
                .help("cloud API access key ID")
                .long("access-key-id")
                .short('k')
                .value_name("ID")
                .required(true),
        )
        .arg(
            Arg::new("access-key-secret")
                .env("DOMAINPULSE_ACCESS_KEY_SECRET")
                .help("cloud API access key secret")
                .long("access-key-secret")
                .short('s')
                .value_name("SECRET")
                .required(true),
        )
        .arg(
            Arg::new("interval")
                .default_value("21600")
                .env("DOMAINPULSE_INTERVAL")
                .help("number of seconds between scan cycles")
                .long("interval")
                .short('i')
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("listen")
                .env("DOMAINPULSE_LISTEN")
                .help("IP address to bind to (default: [::]:port, accepts both IPv6 and IPv4)")
                .long("listen")
                .long_help(
                    "IP address to bind to:\n\
                    Not specified (default) binds to [::]:port which accepts both IPv6 and IPv4 connections.\n\
                    Falls back to 0.0.0.0:port if IPv6 is unavailable.\n\n\
                    Specific IPv4 examples: '0.0.0.0', '127.0.0.1'\n\
                    Specific IPv6: '::', '::1'\n\n\
                    Usage examples:\n\
                    - `--listen 0.0.0.0` binds IPv4 only\n\
                    - `--listen ::` binds IPv6 (typically accepts IPv4 too)\n\n\
                    Note: binding to [::] usually accepts both IPv6 and IPv4 through \
                    IPv4-mapped addresses on dual-stack systems."
                )
                .short('l')
                .value_name("IP"),
        )
        .arg(
            Arg::new("port")
                .default_value("9100")
                .env("DOMAINPULSE_PORT")
                .help("listening port for /metrics")
                .long("port")
                .short('p')
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("concurrency")
                .default_value("64")
                .env("DOMAINPULSE_CONCURRENCY")
                .help("maximum number of in-flight certificate probes")
                .long("concurrency")
                .short('c')
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("deadline")
                .default_value("300")
                .env("DOMAINPULSE_DEADLINE")
                .help("per-cycle certificate probe deadline in seconds")
                .long_help(
                    "Wall-clock budget for one cycle's certificate probes.\n\
                    Probes still in flight when the deadline fires are cancelled and \
                    reported as unknown; the cycle publishes without them."
                )
                .long("deadline")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("registrar-endpoint")
                .default_value(registrar::DEFAULT_ENDPOINT)
                .env("DOMAINPULSE_REGISTRAR_ENDPOINT")
                .help("domain registration API endpoint")
                .long("registrar-endpoint")
                .value_name("URL"),
        )
        .arg(
            Arg::new("dns-endpoint")
                .default_value(dns::DEFAULT_ENDPOINT)
                .env("DOMAINPULSE_DNS_ENDPOINT")
                .help("DNS API endpoint")
                .long("dns-endpoint")
                .value_name("URL"),
        )
}
