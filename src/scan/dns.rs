use crate::{
    api::{Page, PageSource, collect_pages, dns::{DnsApi, DnsZone, RECORD_FETCH_LIMIT, ZONE_PAGE_SIZE, ZoneRecord}},
    error::ScanError,
};
use chrono::{SecondsFormat, Utc};

/// Record name used by the zone apex; never emitted as a subdomain.
pub const APEX_SENTINEL: &str = "@";

/// Record types that name a reachable host.
const ADDRESS_RECORD_TYPES: [&str; 3] = ["A", "AAAA", "CNAME"];

/// Paginated enumeration of DNS-hosted zones, expanded into fully-qualified
/// subdomain names through each zone's address-type records.
pub struct DnsScanner<'a, C> {
    client: &'a C,
}

impl<'a, C: DnsApi + Sync> DnsScanner<'a, C> {
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Enumerate every subdomain backed by an A, AAAA or CNAME record.
    ///
    /// A record-fetch failure for one zone is logged and the zone skipped;
    /// the scan continues with the remaining zones.
    ///
    /// # Errors
    ///
    /// A zone-page fetch failure aborts the whole scan.
    pub async fn list_subdomains(&self) -> Result<Vec<String>, ScanError> {
        let zones = collect_pages(self).await?;

        let mut subdomains = Vec::new();
        for zone in zones {
            match self
                .client
                .list_records(&zone.domain_name, RECORD_FETCH_LIMIT)
                .await
            {
                Ok(records) => {
                    if u32::try_from(records.len()).is_ok_and(|len| len >= RECORD_FETCH_LIMIT) {
                        println!(
                            "{} - zone {} returned {} records, tail past the fetch limit is not scanned",
                            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                            zone.domain_name,
                            records.len(),
                        );
                    }
                    subdomains.extend(subdomains_from_records(&zone.domain_name, &records));
                }
                Err(cause) => {
                    let err = ScanError::ZoneRecordFetchFailed {
                        zone: zone.domain_name,
                        cause,
                    };
                    eprintln!(
                        "{} - {err}",
                        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
                    );
                }
            }
        }

        Ok(subdomains)
    }
}

impl<C: DnsApi + Sync> PageSource for DnsScanner<'_, C> {
    type Item = DnsZone;

    async fn fetch_page(&self, page_number: u32) -> Result<Page<DnsZone>, ScanError> {
        let zones = self
            .client
            .list_zones_page(page_number, ZONE_PAGE_SIZE)
            .await
            .map_err(|cause| ScanError::SourceUnavailable {
                source_name: "dns",
                page: page_number,
                cause,
            })?;

        Ok(Page::new(zones, ZONE_PAGE_SIZE))
    }
}

/// Join each address-type, non-apex record with its zone name.
fn subdomains_from_records(zone_name: &str, records: &[ZoneRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|record| ADDRESS_RECORD_TYPES.contains(&record.record_type.as_str()))
        .filter(|record| record.rr != APEX_SENTINEL)
        .map(|record| format!("{}.{zone_name}", record.rr))
        .collect()
}
