#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use domainpulse::api::{Client, dns, registrar};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, query_param},
};

pub const TEST_KEY_ID: &str = "testid";
pub const TEST_KEY_SECRET: &str = "testsecret";

pub fn registrar_client(server: &MockServer) -> Client {
    Client::new(
        &server.uri(),
        registrar::API_VERSION,
        TEST_KEY_ID,
        TEST_KEY_SECRET,
    )
    .unwrap()
}

pub fn dns_client(server: &MockServer) -> Client {
    Client::new(&server.uri(), dns::API_VERSION, TEST_KEY_ID, TEST_KEY_SECRET).unwrap()
}

pub fn domain_entry(name: &str, expiry: &str) -> Value {
    json!({"DomainName": name, "ExpirationDate": expiry})
}

/// Mount one page of the registrar listing, checked to be requested exactly
/// once.
pub async fn mount_registrar_page(server: &MockServer, page: u32, domains: &[Value]) {
    Mock::given(method("GET"))
        .and(query_param("Action", "QueryDomainList"))
        .and(query_param("PageNum", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Data": {"Domain": domains}})),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_registrar_page_failure(server: &MockServer, page: u32, status: u16) {
    Mock::given(method("GET"))
        .and(query_param("Action", "QueryDomainList"))
        .and(query_param("PageNum", page.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount one page of the DNS zone listing.
pub async fn mount_zone_page(server: &MockServer, page: u32, zones: &[&str]) {
    let entries: Vec<Value> = zones.iter().map(|z| json!({"DomainName": z})).collect();
    Mock::given(method("GET"))
        .and(query_param("Action", "DescribeDomains"))
        .and(query_param("PageNumber", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Domains": {"Domain": entries}})),
        )
        .mount(server)
        .await;
}

/// Mount the single record listing of one zone. `records` pairs are
/// `(rr, type)`.
pub async fn mount_zone_records(server: &MockServer, zone: &str, records: &[(&str, &str)]) {
    let entries: Vec<Value> = records
        .iter()
        .map(|(rr, record_type)| json!({"RR": rr, "Type": record_type}))
        .collect();
    Mock::given(method("GET"))
        .and(query_param("Action", "DescribeDomainRecords"))
        .and(query_param("DomainName", zone))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"DomainRecords": {"Record": entries}})),
        )
        .mount(server)
        .await;
}

pub async fn mount_zone_records_failure(server: &MockServer, zone: &str, status: u16) {
    Mock::given(method("GET"))
        .and(query_param("Action", "DescribeDomainRecords"))
        .and(query_param("DomainName", zone))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
