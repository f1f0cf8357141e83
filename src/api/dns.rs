use super::Client;
use crate::error::ApiError;
use serde::Deserialize;
use std::future::Future;

/// Public endpoint of the DNS service.
pub const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com";

/// API version spoken by the DNS service.
pub const API_VERSION: &str = "2015-01-09";

/// DNS zones are listed 50 at a time.
pub const ZONE_PAGE_SIZE: u32 = 50;

/// Records are fetched in one call per zone, capped at 500. Zones with more
/// records lose the tail; the scanner logs when the cap is hit.
pub const RECORD_FETCH_LIMIT: u32 = 500;

/// One hosted zone as returned by `DescribeDomains`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsZone {
    pub domain_name: String,
}

/// One resource record as returned by `DescribeDomainRecords`. `rr` is the
/// host label relative to the zone (`@` for the apex).
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDomainsResponse {
    #[serde(default)]
    domains: ZoneList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneList {
    #[serde(default)]
    domain: Vec<DnsZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDomainRecordsResponse {
    #[serde(default)]
    domain_records: RecordList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordList {
    #[serde(default)]
    record: Vec<ZoneRecord>,
}

/// Listing capability of the DNS service.
pub trait DnsApi {
    /// Fetch one page (1-based) of hosted zones.
    fn list_zones_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<DnsZone>, ApiError>> + Send;

    /// Fetch up to `max_count` records of one zone in a single call.
    fn list_records(
        &self,
        zone_name: &str,
        max_count: u32,
    ) -> impl Future<Output = Result<Vec<ZoneRecord>, ApiError>> + Send;
}

impl DnsApi for Client {
    async fn list_zones_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<DnsZone>, ApiError> {
        let response: DescribeDomainsResponse = self
            .rpc(
                "DescribeDomains",
                &[
                    ("PageNumber", page_number.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .await?;

        Ok(response.domains.domain)
    }

    async fn list_records(&self, zone_name: &str, max_count: u32) -> Result<Vec<ZoneRecord>, ApiError> {
        let response: DescribeDomainRecordsResponse = self
            .rpc(
                "DescribeDomainRecords",
                &[
                    ("DomainName", zone_name.to_string()),
                    ("PageSize", max_count.to_string()),
                ],
            )
            .await?;

        Ok(response.domain_records.record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn test_parse_describe_domains_response() {
        let body = r#"{
            "TotalCount": 2,
            "Domains": {
                "Domain": [
                    {"DomainName": "example.com"},
                    {"DomainName": "example.org"}
                ]
            }
        }"#;

        let response: DescribeDomainsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.domains.domain.len(), 2);
        assert_eq!(
            response.domains.domain.first().unwrap().domain_name,
            "example.com"
        );
    }

    #[test]
    fn test_parse_describe_domain_records_response() {
        let body = r#"{
            "DomainRecords": {
                "Record": [
                    {"RR": "@", "Type": "A", "Value": "203.0.113.7"},
                    {"RR": "www", "Type": "CNAME", "Value": "example.com"}
                ]
            }
        }"#;

        let response: DescribeDomainRecordsResponse = serde_json::from_str(body).unwrap();
        let records = &response.domain_records.record;
        assert_eq!(records.len(), 2);
        assert_eq!(records.first().unwrap().rr, "@");
        assert_eq!(records.last().unwrap().record_type, "CNAME");
    }

    #[test]
    fn test_parse_empty_responses() {
        let zones: DescribeDomainsResponse = serde_json::from_str("{}").unwrap();
        assert!(zones.domains.domain.is_empty());

        let records: DescribeDomainRecordsResponse = serde_json::from_str("{}").unwrap();
        assert!(records.domain_records.record.is_empty());
    }
}
