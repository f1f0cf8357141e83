//! domainpulse - scan registered domains and DNS-hosted subdomains on a
//! fixed schedule, probe every candidate's TLS certificate, and publish the
//! remaining days until registration and certificate expiry as Prometheus
//! gauges.

pub mod api;
pub mod cli;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod scan;
pub mod tls;
