use crate::{
    api::{Client, dns as dns_api, registrar as registrar_api},
    metrics::{CYCLE_RUNTIME, MetricStore, PANICS_RECOVERED, encode_metrics},
    scan,
    tls::prober::ProbeOptions,
};
use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{Duration, SecondsFormat, Utc};
use futures::FutureExt;
use std::{net::IpAddr, sync::Arc, time::Duration as StdDuration};
use tokio::{net::TcpListener, task, time};

/// Cycles default to every 6 hours; the first fires immediately at startup.
pub const DEFAULT_INTERVAL_SECS: u32 = 21_600;

/// Default port of the scrape endpoint.
pub const DEFAULT_PORT: u16 = 9100;

/// Runtime configuration assembled by the CLI dispatcher.
#[derive(Debug, Clone)]
pub struct Settings {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Seconds between scan cycles.
    pub interval: u32,
    pub listen: Option<IpAddr>,
    pub port: u16,
    /// Upper bound on in-flight certificate probes.
    pub concurrency: usize,
    /// Per-cycle probe deadline in seconds.
    pub deadline: u32,
    pub registrar_endpoint: String,
    pub dns_endpoint: String,
}

const INDEX_HTML: &str = "<!DOCTYPE html>\n\
<html>\n\
  <head><title>Domain Expiry Exporter</title></head>\n\
  <body>\n\
    <h1>Domain Expiry Exporter</h1>\n\
    <p><a href=\"/metrics\">metrics</a></p>\n\
  </body>\n\
</html>\n";

/// Start the exporter: bind the scrape endpoint and drive the periodic scan
/// loop until the process terminates.
///
/// # Errors
///
/// Returns an error if an API client cannot be built, the service fails to
/// bind to the port, or the monitoring task dies.
#[allow(clippy::too_many_lines)]
pub async fn start(settings: Settings) -> anyhow::Result<()> {
    let Settings {
        access_key_id,
        access_key_secret,
        interval,
        listen,
        port,
        concurrency,
        deadline,
        registrar_endpoint,
        dns_endpoint,
    } = settings;

    let registrar = Client::new(
        &registrar_endpoint,
        registrar_api::API_VERSION,
        &access_key_id,
        &access_key_secret,
    )
    .context("failed to build registrar API client")?;
    let dns = Client::new(
        &dns_endpoint,
        dns_api::API_VERSION,
        &access_key_id,
        &access_key_secret,
    )
    .context("failed to build DNS API client")?;

    let store = Arc::new(MetricStore::new());

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::clone(&store));

    // Bind to socket with smart fallback
    let (listener, bind_addr) = match listen {
        Some(addr) => {
            // Explicit address specified - bind to it
            let socket_addr = format!("{addr}:{port}");
            let listener = TcpListener::bind(&socket_addr).await?;
            (listener, socket_addr)
        }
        None => {
            // Auto mode: try IPv6 first, fallback to IPv4
            if let Ok(l) = TcpListener::bind(format!("::0:{port}")).await {
                (l, format!("[::]:{port}"))
            } else {
                // Fallback to IPv4 if IPv6 fails
                let socket_addr = format!("0.0.0.0:{port}");
                (TcpListener::bind(&socket_addr).await?, socket_addr)
            }
        }
    };

    println!(
        "{} - Listening on {bind_addr}, interval: {interval}s",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    );

    let probe = ProbeOptions {
        concurrency: concurrency.max(1),
        deadline: StdDuration::from_secs(u64::from(deadline)),
    };

    // scan loop - keep JoinHandle to detect task failures
    let monitor_store = Arc::clone(&store);
    let monitor_handle =
        task::spawn(async move { run_loop(&registrar, &dns, &monitor_store, interval, probe).await });

    let server = axum::serve(listener, app.into_make_service());

    // Race between normal operation and monitoring task failure
    tokio::select! {
        result = server => {
            result?;
        }
        result = monitor_handle => {
            match result {
                Ok(()) => {
                    eprintln!("Monitoring loop exited unexpectedly");
                    anyhow::bail!("Monitoring loop stopped");
                }
                Err(e) => {
                    eprintln!("Monitoring loop panicked: {e}");
                    anyhow::bail!("Monitoring loop panicked: {e}");
                }
            }
        }
    }

    Ok(())
}

async fn metrics_handler(State(store): State<Arc<MetricStore>>) -> impl IntoResponse {
    match encode_metrics(&store) {
        Ok(buffer) => (StatusCode::OK, buffer),
        Err(e) => {
            eprintln!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
        }
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[inline]
fn remaining_sleep_duration(wait_time: Duration, runtime: Duration) -> Option<time::Duration> {
    wait_time
        .checked_sub(&runtime)
        .and_then(|remaining| remaining.to_std().ok())
        .filter(|duration| !duration.is_zero())
}

async fn run_loop(
    registrar: &Client,
    dns: &Client,
    store: &MetricStore,
    every: u32,
    probe: ProbeOptions,
) {
    loop {
        // Catch panics in individual iterations to keep loop alive
        let iteration_result = std::panic::AssertUnwindSafe(async {
            let now = Utc::now();
            let wait_time = Duration::seconds(i64::from(every));

            let timer = CYCLE_RUNTIME.start_timer();
            let mut summary = scan::run_cycle(registrar, dns, store, probe).await;
            timer.observe_duration();

            let end = Utc::now();
            let runtime = end.signed_duration_since(now);
            summary.time = now.to_rfc3339();
            summary.runtime_ms = runtime.num_milliseconds();

            if let Ok(serialized) = serde_json::to_string(&summary) {
                println!("{serialized}");
            }

            // Sleep for remaining interval time to maintain fixed interval
            if let Some(remaining) = remaining_sleep_duration(wait_time, runtime) {
                time::sleep(remaining).await;
            }
        })
        .catch_unwind()
        .await;

        // Handle panics in iteration gracefully
        if let Err(panic_info) = iteration_result {
            eprintln!("Panic in scan loop iteration: {panic_info:?}");
            PANICS_RECOVERED.inc(); // Track panic recovery
            // Sleep for the interval before retrying
            time::sleep(time::Duration::from_secs(every.into())).await;
        }
    }
}
