use thiserror::Error;

/// Errors returned by the cloud API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request signing failed: {0}")]
    Signature(String),
}

/// Scan-level failures.
///
/// `SourceUnavailable` aborts the affected source for the current cycle and
/// discards anything gathered from earlier pages; the other source still
/// publishes. `ZoneRecordFetchFailed` is isolated to one zone: the scanner
/// logs it and continues with the remaining zones.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{source_name} source unavailable (page {page}): {cause}")]
    SourceUnavailable {
        source_name: &'static str,
        page: u32,
        cause: ApiError,
    },

    #[error("failed to list records for zone {zone}: {cause}")]
    ZoneRecordFetchFailed { zone: String, cause: ApiError },
}

/// Failures of a single certificate probe. Never propagated: the prober
/// records the message on the affected `DomainStatus` and moves on.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect to {host}:443 failed: {reason}")]
    Connect { host: String, reason: String },

    #[error("connect to {host}:443 timed out after {seconds}s")]
    Timeout { host: String, seconds: u64 },

    #[error("invalid server name: {host}")]
    InvalidHostname { host: String },

    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("no certificate presented by {host}")]
    NoCertificate { host: String },

    #[error("failed to parse certificate from {host}: {reason}")]
    BadCertificate { host: String, reason: String },

    #[error("cycle deadline exceeded before probe of {host} completed")]
    DeadlineExceeded { host: String },
}

impl ProbeError {
    /// Label used by the probe error counter metric.
    #[must_use]
    pub const fn metric_label(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::InvalidHostname { .. } => "hostname",
            Self::Handshake { .. } => "handshake",
            Self::NoCertificate { .. } => "no_certificate",
            Self::BadCertificate { .. } => "bad_certificate",
            Self::DeadlineExceeded { .. } => "deadline",
        }
    }
}
