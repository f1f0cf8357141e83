use super::probe::probe_certificate;
use crate::{error::ProbeError, metrics::PROBE_ERRORS, scan::model::DomainStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{StreamExt, stream};
use std::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tokio::time;

/// Default upper bound on in-flight probes.
pub const DEFAULT_CONCURRENCY: usize = 64;

/// Default wall-clock budget for one whole fan-out pass.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Limits applied to one fan-out pass.
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub concurrency: usize,
    pub deadline: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Probe every domain's certificate through a bounded worker pool.
///
/// `result[i]` always describes `domains[i]`, regardless of completion
/// order. One probe's failure never affects another's slot. When the
/// deadline fires, in-flight probes are cancelled and their slots report
/// `Unknown` with a deadline diagnostic.
pub async fn probe_all(
    domains: &[String],
    options: ProbeOptions,
    now: DateTime<Utc>,
) -> Vec<DomainStatus> {
    probe_all_with(domains, options, now, |host| async move {
        probe_certificate(&host).await
    })
    .await
}

/// Fan-out core, generic over the probe so tests can simulate arbitrary
/// completion orders.
pub(crate) async fn probe_all_with<F, Fut>(
    domains: &[String],
    options: ProbeOptions,
    now: DateTime<Utc>,
    probe: F,
) -> Vec<DomainStatus>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<DateTime<Utc>, ProbeError>>,
{
    // Slots are pre-filled with the deadline placeholder so a cancelled slot
    // still upholds the error-iff-no-expiry invariant.
    let mut results: Vec<DomainStatus> = domains
        .iter()
        .map(|domain| {
            let placeholder = ProbeError::DeadlineExceeded {
                host: domain.clone(),
            };
            DomainStatus::from_certificate(domain.clone(), Err(placeholder.to_string()), now)
        })
        .collect();

    let concurrency = options.concurrency.max(1);
    let completed = AtomicUsize::new(0_usize);

    let drain = async {
        let mut outcomes = stream::iter(domains.iter().cloned().enumerate())
            .map(|(index, host)| {
                let outcome = probe(host);
                async move { (index, outcome.await) }
            })
            .buffer_unordered(concurrency);

        while let Some((index, outcome)) = outcomes.next().await {
            completed.fetch_add(1, Ordering::Relaxed);
            if let Err(ref err) = outcome {
                PROBE_ERRORS.with_label_values(&[err.metric_label()]).inc();
            }
            if let Some(slot) = results.get_mut(index) {
                *slot = DomainStatus::from_certificate(
                    slot.domain_name.clone(),
                    outcome.map_err(|e| e.to_string()),
                    now,
                );
            }
        }
    };

    if time::timeout(options.deadline, drain).await.is_err() {
        let unfinished = domains.len().saturating_sub(completed.load(Ordering::Relaxed));
        eprintln!(
            "{} - probe deadline of {}s exceeded, {unfinished} unfinished probes reported as unknown",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            options.deadline.as_secs(),
        );
        if let Ok(count) = u64::try_from(unfinished) {
            PROBE_ERRORS.with_label_values(&["deadline"]).inc_by(count);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::scan::model::{CERT_DAYS_UNKNOWN, ExpiryStatus};
    use chrono::TimeDelta;

    fn domains(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("host{i:02}.example.com")).collect()
    }

    fn index_of(domain: &str) -> i64 {
        domain
            .trim_start_matches("host")
            .trim_end_matches(".example.com")
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn test_results_positionally_aligned_under_reversed_completion() {
        let now = Utc::now();
        let input = domains(20);
        let total = input.len();

        // earlier inputs finish last
        let results = probe_all_with(&input, ProbeOptions::default(), now, |host| async move {
            let index = index_of(&host);
            let delay = u64::try_from(total).unwrap() - u64::try_from(index).unwrap();
            time::sleep(Duration::from_millis(delay * 5)).await;
            Ok(now + TimeDelta::days(index + 1))
        })
        .await;

        assert_eq!(results.len(), total);
        for (i, (domain, status)) in input.iter().zip(&results).enumerate() {
            assert_eq!(&status.domain_name, domain);
            assert_eq!(
                status.certificate_days_left,
                i64::try_from(i).unwrap() + 1,
                "slot {i} does not carry its own probe result"
            );
            assert!(status.certificate_error.is_none());
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_other_slots() {
        let now = Utc::now();
        let input = domains(3);

        let results = probe_all_with(&input, ProbeOptions::default(), now, |host| async move {
            if index_of(&host) == 1 {
                Err(ProbeError::Connect {
                    host,
                    reason: "connection refused".to_string(),
                })
            } else {
                Ok(now + TimeDelta::days(90))
            }
        })
        .await;

        let ok_first = results.first().unwrap();
        assert_eq!(ok_first.certificate_days_left, 90);
        assert_eq!(ok_first.certificate_status, ExpiryStatus::Normal);

        let failed = results.get(1).unwrap();
        assert_eq!(failed.certificate_days_left, CERT_DAYS_UNKNOWN);
        assert_eq!(failed.certificate_status, ExpiryStatus::Unknown);
        assert!(
            failed
                .certificate_error
                .as_deref()
                .unwrap()
                .contains("connection refused")
        );

        let ok_last = results.last().unwrap();
        assert!(ok_last.certificate_error.is_none());
    }

    #[tokio::test]
    async fn test_deadline_marks_unfinished_probes_unknown() {
        let now = Utc::now();
        let input = domains(4);
        let options = ProbeOptions {
            concurrency: 4,
            deadline: Duration::from_millis(200),
        };

        let results = probe_all_with(&input, options, now, |host| async move {
            if index_of(&host) % 2 == 0 {
                Ok(now + TimeDelta::days(60))
            } else {
                // far past the deadline; gets cancelled
                time::sleep(Duration::from_secs(30)).await;
                Ok(now + TimeDelta::days(60))
            }
        })
        .await;

        for (i, status) in results.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(status.certificate_days_left, 60);
            } else {
                assert_eq!(status.certificate_status, ExpiryStatus::Unknown);
                assert!(
                    status
                        .certificate_error
                        .as_deref()
                        .unwrap()
                        .contains("deadline")
                );
            }
            // the invariant holds for completed and cancelled slots alike
            assert_eq!(
                status.certificate_error.is_some(),
                status.certificate_expiry.is_none()
            );
        }
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let now = Utc::now();
        let results =
            probe_all_with(&[], ProbeOptions::default(), now, |_host| async move {
                Ok(now)
            })
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_covers_every_domain() {
        let now = Utc::now();
        let input = domains(5);
        let options = ProbeOptions {
            concurrency: 1,
            deadline: Duration::from_secs(5),
        };

        let results = probe_all_with(&input, options, now, |host| async move {
            Ok(now + TimeDelta::days(index_of(&host)))
        })
        .await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|s| s.certificate_error.is_none()));
    }
}
