#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::*;
use domainpulse::{
    error::ScanError,
    metrics::MetricStore,
    scan::{self, DnsScanner, RegistrarScanner},
    tls::prober::ProbeOptions,
};
use serde_json::Value;
use std::time::Duration;
use wiremock::MockServer;

fn full_registrar_page(prefix: &str) -> Vec<Value> {
    (0..100)
        .map(|i| domain_entry(&format!("{prefix}{i:03}.com"), "2027-03-01 12:00:00"))
        .collect()
}

#[tokio::test]
async fn test_registrar_scanner_issues_two_requests_for_103_domains() {
    let server = MockServer::start().await;
    mount_registrar_page(&server, 1, &full_registrar_page("domain")).await;
    mount_registrar_page(
        &server,
        2,
        &[
            domain_entry("tail-a.com", "2027-03-01 12:00:00"),
            domain_entry("tail-b.com", "2026-11-15"),
            domain_entry("tail-c.com", ""),
        ],
    )
    .await;

    let client = registrar_client(&server);
    let records = RegistrarScanner::new(&client)
        .list_registered_domains()
        .await
        .unwrap();

    // the .expect(1) on each page mock verifies exactly 2 page requests
    assert_eq!(records.len(), 103);
    assert!(
        records
            .iter()
            .any(|r| r.name == "tail-b.com" && r.registration_expiry.is_some())
    );
    assert!(
        records
            .iter()
            .any(|r| r.name == "tail-c.com" && r.registration_expiry.is_none())
    );
}

#[tokio::test]
async fn test_registrar_page_failure_discards_earlier_pages() {
    let server = MockServer::start().await;
    mount_registrar_page(&server, 1, &full_registrar_page("domain")).await;
    mount_registrar_page_failure(&server, 2, 503).await;

    let client = registrar_client(&server);
    let result = RegistrarScanner::new(&client).list_registered_domains().await;

    assert!(matches!(
        result,
        Err(ScanError::SourceUnavailable {
            source_name: "registrar",
            page: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn test_dns_scanner_filters_apex_and_non_address_records() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, &["example.com"]).await;
    mount_zone_records(
        &server,
        "example.com",
        &[("@", "A"), ("www", "A"), ("api", "CNAME"), ("mail", "MX")],
    )
    .await;

    let client = dns_client(&server);
    let subdomains = DnsScanner::new(&client).list_subdomains().await.unwrap();

    assert_eq!(
        subdomains,
        vec!["www.example.com".to_string(), "api.example.com".to_string()]
    );
}

#[tokio::test]
async fn test_dns_scanner_skips_zone_whose_records_fail() {
    let server = MockServer::start().await;
    mount_zone_page(&server, 1, &["broken.com", "healthy.com"]).await;
    mount_zone_records_failure(&server, "broken.com", 500).await;
    mount_zone_records(&server, "healthy.com", &[("www", "A"), ("v6", "AAAA")]).await;

    let client = dns_client(&server);
    let subdomains = DnsScanner::new(&client).list_subdomains().await.unwrap();

    assert_eq!(
        subdomains,
        vec!["www.healthy.com".to_string(), "v6.healthy.com".to_string()]
    );
}

#[tokio::test]
async fn test_dns_zone_page_failure_aborts_scan() {
    let server = MockServer::start().await;
    // no DescribeDomains mock mounted: wiremock answers 404
    let client = dns_client(&server);

    let result = DnsScanner::new(&client).list_subdomains().await;
    assert!(matches!(
        result,
        Err(ScanError::SourceUnavailable { source_name: "dns", .. })
    ));
}

// End-to-end cycle against mock APIs. Candidate names use the reserved
// .invalid TLD so every probe fails fast; certificate gauges carry the -1
// sentinel while registration gauges carry real day counts.
#[tokio::test]
async fn test_run_cycle_publishes_gauges_for_both_sources() {
    let server = MockServer::start().await;
    mount_registrar_page(
        &server,
        1,
        &[domain_entry("apex-fixture.invalid", "2027-03-01 12:00:00")],
    )
    .await;
    mount_zone_page(&server, 1, &["zone-fixture.invalid"]).await;
    mount_zone_records(
        &server,
        "zone-fixture.invalid",
        &[("www", "A"), ("@", "A"), ("txt", "TXT")],
    )
    .await;

    let registrar = registrar_client(&server);
    let dns = dns_client(&server);
    let store = MetricStore::new();
    let probe = ProbeOptions {
        concurrency: 8,
        deadline: Duration::from_secs(5),
    };

    let summary = scan::run_cycle(&registrar, &dns, &store, probe).await;

    assert_eq!(summary.domains, 1);
    assert_eq!(summary.subdomains, 1);
    assert!(!summary.registrar_failed);
    assert!(!summary.dns_failed);

    let families = store.gather();

    let registration = families
        .iter()
        .find(|f| f.name() == "domain_registration_days_left")
        .unwrap();
    assert_eq!(registration.get_metric().len(), 1);
    let metric = registration.get_metric().first().unwrap();
    assert!(
        metric
            .get_label()
            .iter()
            .any(|lp| lp.name() == "domain" && lp.value() == "apex-fixture.invalid")
    );
    assert!(
        metric
            .get_label()
            .iter()
            .any(|lp| lp.name() == "type" && lp.value() == "registration")
    );
    // expiry is fixed in 2027; whenever this runs, a real positive day count
    assert!(metric.get_gauge().value() > 0.0);

    let certificate = families
        .iter()
        .find(|f| f.name() == "domain_tls_cert_days_left")
        .unwrap();
    assert_eq!(certificate.get_metric().len(), 2);
    for metric in certificate.get_metric() {
        assert!(
            metric
                .get_label()
                .iter()
                .any(|lp| lp.name() == "type" && lp.value() == "tls_cert")
        );
        assert!((metric.get_gauge().value() - (-1.0)).abs() < f64::EPSILON);
    }
}

#[tokio::test]
async fn test_run_cycle_with_failed_registrar_still_publishes_subdomains() {
    let server = MockServer::start().await;
    mount_registrar_page_failure(&server, 1, 503).await;
    mount_zone_page(&server, 1, &["zone-fixture.invalid"]).await;
    mount_zone_records(&server, "zone-fixture.invalid", &[("www", "A")]).await;

    let registrar = registrar_client(&server);
    let dns = dns_client(&server);
    let store = MetricStore::new();
    let probe = ProbeOptions {
        concurrency: 4,
        deadline: Duration::from_secs(5),
    };

    let summary = scan::run_cycle(&registrar, &dns, &store, probe).await;

    assert!(summary.registrar_failed);
    assert!(!summary.dns_failed);
    assert_eq!(summary.domains, 0);
    assert_eq!(summary.subdomains, 1);

    let families = store.gather();
    let certificate = families
        .iter()
        .find(|f| f.name() == "domain_tls_cert_days_left")
        .unwrap();
    assert_eq!(certificate.get_metric().len(), 1);
    let registration_series = families
        .iter()
        .find(|f| f.name() == "domain_registration_days_left")
        .map_or(0, |f| f.get_metric().len());
    assert_eq!(registration_series, 0);
}
