//! Scan cycle orchestration: discovery, probing, classification and
//! publication.

pub mod dns;
pub mod model;
pub mod registrar;

pub use dns::DnsScanner;
pub use model::{DomainRecord, DomainStatus, ExpiryStatus, classify};
pub use registrar::RegistrarScanner;

use crate::{
    api::{dns::DnsApi, registrar::RegistrarApi},
    metrics::{DOMAINS_SCANNED, LAST_SUCCESS, MetricStore, SCAN_ERRORS},
    tls::prober::{ProbeOptions, probe_all},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one complete pass, logged as a JSON line after publish.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CycleSummary {
    pub time: String,
    pub runtime_ms: i64,
    pub domains: usize,
    pub subdomains: usize,
    pub registrar_failed: bool,
    pub dns_failed: bool,
}

/// Run one scan cycle: enumerate both sources, probe every candidate's
/// certificate through the bounded prober, classify, and republish the store
/// in one atomic swap.
///
/// A failed scanner is logged and contributes an empty set for this cycle;
/// the other source's results still publish.
pub async fn run_cycle<R, D>(
    registrar: &R,
    dns: &D,
    store: &MetricStore,
    probe: ProbeOptions,
) -> CycleSummary
where
    R: RegistrarApi + Sync,
    D: DnsApi + Sync,
{
    let now = Utc::now();
    let mut summary = CycleSummary::default();

    let records = match RegistrarScanner::new(registrar)
        .list_registered_domains()
        .await
    {
        Ok(records) => records,
        Err(err) => {
            eprintln!(
                "{} - {err}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            SCAN_ERRORS.with_label_values(&["registrar"]).inc();
            summary.registrar_failed = true;
            Vec::new()
        }
    };

    let names: Vec<String> = records.iter().map(|record| record.name.clone()).collect();
    let mut statuses: Vec<DomainStatus> = probe_all(&names, probe, now)
        .await
        .into_iter()
        .zip(records)
        .map(|(status, record)| status.with_registration(record.registration_expiry, now))
        .collect();
    summary.domains = statuses.len();

    let subdomains = match DnsScanner::new(dns).list_subdomains().await {
        Ok(subdomains) => subdomains,
        Err(err) => {
            eprintln!(
                "{} - {err}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            SCAN_ERRORS.with_label_values(&["dns"]).inc();
            summary.dns_failed = true;
            Vec::new()
        }
    };
    summary.subdomains = subdomains.len();
    statuses.extend(probe_all(&subdomains, probe, now).await);

    store.publish(&statuses);

    DOMAINS_SCANNED
        .with_label_values(&["registrar"])
        .set(i64::try_from(summary.domains).unwrap_or(i64::MAX));
    DOMAINS_SCANNED
        .with_label_values(&["dns"])
        .set(i64::try_from(summary.subdomains).unwrap_or(i64::MAX));
    if !(summary.registrar_failed && summary.dns_failed) {
        LAST_SUCCESS.set(now.timestamp());
    }

    summary
}
