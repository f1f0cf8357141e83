use crate::{
    api::{dns, registrar},
    cli::actions::Action,
    exporter::{DEFAULT_INTERVAL_SECS, DEFAULT_PORT, Settings},
    tls::prober::{DEFAULT_CONCURRENCY, DEFAULT_DEADLINE},
};
use anyhow::{Context, Result, ensure};
use clap::ArgMatches;
use std::net::IpAddr;

/// Convert `ArgMatches` into typed Action enum with validation
///
/// # Errors
///
/// Returns a structured error when a credential is empty or the listen
/// address is not a valid IP; missing required arguments are already
/// rejected by the parser.
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let access_key_id = matches
        .get_one::<String>("access-key-id")
        .context("access key ID is required")?
        .clone();
    ensure!(
        !access_key_id.trim().is_empty(),
        "access key ID must not be empty"
    );

    let access_key_secret = matches
        .get_one::<String>("access-key-secret")
        .context("access key secret is required")?
        .clone();
    ensure!(
        !access_key_secret.trim().is_empty(),
        "access key secret must not be empty"
    );

    // Extract and validate listen address
    let listen = matches
        .get_one::<String>("listen")
        .map(|addr| {
            addr.parse::<IpAddr>()
                .with_context(|| format!("Invalid IP address: {addr}"))
        })
        .transpose()?;

    let interval = matches
        .get_one::<u32>("interval")
        .copied()
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    let port = matches
        .get_one::<u16>("port")
        .copied()
        .unwrap_or(DEFAULT_PORT);

    let concurrency = matches
        .get_one::<usize>("concurrency")
        .copied()
        .unwrap_or(DEFAULT_CONCURRENCY);
    ensure!(concurrency > 0, "concurrency must be at least 1");

    let deadline = matches.get_one::<u32>("deadline").copied().unwrap_or_else(|| {
        u32::try_from(DEFAULT_DEADLINE.as_secs()).unwrap_or(300)
    });

    let registrar_endpoint = matches
        .get_one::<String>("registrar-endpoint")
        .map_or_else(|| registrar::DEFAULT_ENDPOINT.to_string(), Clone::clone);

    let dns_endpoint = matches
        .get_one::<String>("dns-endpoint")
        .map_or_else(|| dns::DEFAULT_ENDPOINT.to_string(), Clone::clone);

    Ok(Action::Serve {
        settings: Settings {
            access_key_id,
            access_key_secret,
            interval,
            listen,
            port,
            concurrency,
            deadline,
            registrar_endpoint,
            dns_endpoint,
        },
    })
}
