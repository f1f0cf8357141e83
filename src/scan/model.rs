use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day count below which an unexpired domain or certificate is flagged.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Gauge value published when the certificate could not be inspected.
pub const CERT_DAYS_UNKNOWN: i64 = -1;

/// Expiry classification for a registration or certificate day count.
///
/// `Unknown` is never produced by [`classify`]; callers assign it when no day
/// count exists (the probe failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Normal,
    ExpiringSoon,
    Expired,
    Unknown,
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "normal",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Classify a signed day count. Pure and total.
#[must_use]
pub const fn classify(days_left: i64) -> ExpiryStatus {
    if days_left < 0 {
        ExpiryStatus::Expired
    } else if days_left < EXPIRING_SOON_DAYS {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Normal
    }
}

/// Whole days from `now` until `expiry`, rounded toward negative infinity so
/// a deadline 2.5 days in the past counts as -3.
#[must_use]
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    expiry
        .signed_duration_since(now)
        .num_seconds()
        .div_euclid(86_400)
}

/// Candidate produced by the scanners before probing. Subdomains carry no
/// registration expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub name: String,
    pub registration_expiry: Option<DateTime<Utc>>,
}

/// Final per-domain result for one cycle. Created fresh each cycle, folded
/// into the metric store, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatus {
    pub domain_name: String,
    pub registration_expiry: Option<DateTime<Utc>>,
    pub registration_days_left: Option<i64>,
    pub registration_status: Option<ExpiryStatus>,
    pub certificate_expiry: Option<DateTime<Utc>>,
    pub certificate_days_left: i64,
    pub certificate_status: ExpiryStatus,
    pub certificate_error: Option<String>,
}

impl DomainStatus {
    /// Build a status from a certificate probe outcome, with no registration
    /// data attached.
    ///
    /// Upholds the invariant that `certificate_error` is present iff
    /// `certificate_expiry` is absent.
    #[must_use]
    pub fn from_certificate(
        domain_name: String,
        outcome: Result<DateTime<Utc>, String>,
        now: DateTime<Utc>,
    ) -> Self {
        match outcome {
            Ok(expiry) => {
                let days_left = days_until(expiry, now);
                Self {
                    domain_name,
                    registration_expiry: None,
                    registration_days_left: None,
                    registration_status: None,
                    certificate_expiry: Some(expiry),
                    certificate_days_left: days_left,
                    certificate_status: classify(days_left),
                    certificate_error: None,
                }
            }
            Err(error) => Self {
                domain_name,
                registration_expiry: None,
                registration_days_left: None,
                registration_status: None,
                certificate_expiry: None,
                certificate_days_left: CERT_DAYS_UNKNOWN,
                certificate_status: ExpiryStatus::Unknown,
                certificate_error: Some(error),
            },
        }
    }

    /// Attach registration data from a scanner record. A record without a
    /// parseable expiry leaves all registration fields absent.
    #[must_use]
    pub fn with_registration(mut self, expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if let Some(expiry) = expiry {
            let days_left = days_until(expiry, now);
            self.registration_expiry = Some(expiry);
            self.registration_days_left = Some(days_left);
            self.registration_status = Some(classify(days_left));
        }
        self
    }
}
