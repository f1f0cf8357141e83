use crate::scan::model::DomainStatus;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, opts, proto::MetricFamily, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_vec_with_registry, register_int_gauge_with_registry,
};
use std::sync::{LazyLock, RwLock};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

trait ResultExt<T> {
    fn or_exit(self, context: &str) -> T;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_exit(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                eprintln!("failed to initialize metric ({context}): {err}");
                std::process::exit(1);
            }
        }
    }
}

pub static CYCLE_RUNTIME: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram_with_registry!(
        HistogramOpts::new("domainpulse_cycle_runtime", "scan cycle duration in seconds"),
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static SCAN_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec_with_registry!(
        opts!(
            "domainpulse_scan_errors_total",
            "Total aborted source scans by source"
        ),
        &["source"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static PROBE_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec_with_registry!(
        opts!(
            "domainpulse_probe_errors_total",
            "Total certificate probe failures by type"
        ),
        &["error_type"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static DOMAINS_SCANNED: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    register_int_gauge_vec_with_registry!(
        opts!(
            "domainpulse_domains_scanned",
            "Domains published in the most recent cycle by source"
        ),
        &["source"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static LAST_SUCCESS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge_with_registry!(
        opts!(
            "domainpulse_last_cycle_timestamp_seconds",
            "Unix timestamp of the last published cycle"
        ),
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static PANICS_RECOVERED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter_with_registry!(
        opts!(
            "domainpulse_panics_recovered_total",
            "Total panics recovered from"
        ),
        &REGISTRY
    )
    .or_exit("metric can be created")
});

const REGISTRATION_METRIC: &str = "domain_registration_days_left";
const CERTIFICATE_METRIC: &str = "domain_tls_cert_days_left";
const GAUGE_LABELS: [&str; 2] = ["domain", "type"];
const REGISTRATION_TYPE: &str = "registration";
const CERTIFICATE_TYPE: &str = "tls_cert";

/// One complete, internally consistent snapshot of the per-domain gauges,
/// produced by a single scan cycle.
struct Generation {
    registry: Registry,
}

impl Generation {
    #[allow(clippy::cast_precision_loss)]
    fn build(statuses: &[DomainStatus]) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let registration_days = GaugeVec::new(
            Opts::new(
                REGISTRATION_METRIC,
                "days until the domain registration expires",
            ),
            &GAUGE_LABELS,
        )?;
        registry.register(Box::new(registration_days.clone()))?;

        let certificate_days = GaugeVec::new(
            Opts::new(
                CERTIFICATE_METRIC,
                "days until the TLS certificate expires (-1 when unknown)",
            ),
            &GAUGE_LABELS,
        )?;
        registry.register(Box::new(certificate_days.clone()))?;

        for status in statuses {
            if let Some(days) = status.registration_days_left {
                registration_days
                    .with_label_values(&[&status.domain_name, REGISTRATION_TYPE])
                    .set(days as f64);
            }
            certificate_days
                .with_label_values(&[&status.domain_name, CERTIFICATE_TYPE])
                .set(status.certificate_days_left as f64);
        }

        Ok(Self { registry })
    }
}

/// The published, scrape-readable gauge set.
///
/// Each cycle builds a fresh [`Generation`] off to the side and swaps it in
/// as one indivisible step, so a concurrent scrape observes either the
/// previous cycle or the new one, never a transiently empty or half-filled
/// store.
pub struct MetricStore {
    current: RwLock<Generation>,
}

impl MetricStore {
    #[must_use]
    pub fn new() -> Self {
        let empty = Generation::build(&[]).or_exit("gauge generation can be created");
        Self {
            current: RwLock::new(empty),
        }
    }

    /// Replace the whole gauge set with this cycle's results. Domains absent
    /// from `statuses` disappear from the store entirely.
    pub fn publish(&self, statuses: &[DomainStatus]) {
        match Generation::build(statuses) {
            Ok(next) => {
                let mut current = match self.current.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *current = next;
            }
            Err(err) => {
                // keep serving the previous generation
                eprintln!("failed to build metric generation: {err}");
            }
        }
    }

    /// Gather the current generation's metric families.
    #[must_use]
    pub fn gather(&self) -> Vec<MetricFamily> {
        let current = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        current.registry.gather()
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode the exporter self-metrics plus the current domain-gauge generation
/// for HTTP export
///
/// # Errors
///
/// Returns an error if metrics encoding fails
pub fn encode_metrics(store: &MetricStore) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let encoder = prometheus::TextEncoder::new();

    let mut families = REGISTRY.gather();
    families.extend(store.gather());

    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| format!("could not encode custom metrics: {e}"))?;

    Ok(buffer)
}
