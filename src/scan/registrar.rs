use crate::{
    api::{Page, PageSource, collect_pages, registrar::{PAGE_SIZE, RegistrarApi}},
    error::ScanError,
    scan::model::DomainRecord,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Registry timestamps come back in Beijing time (UTC+8).
const REGISTRY_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Paginated enumeration of registered apex domains and their registration
/// expiry dates.
pub struct RegistrarScanner<'a, C> {
    client: &'a C,
}

impl<'a, C: RegistrarApi + Sync> RegistrarScanner<'a, C> {
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Enumerate every registered apex domain. Records whose expiry string
    /// matches neither accepted format keep an absent expiry.
    ///
    /// # Errors
    ///
    /// Any page-fetch failure aborts the whole scan; results gathered from
    /// earlier pages are discarded.
    pub async fn list_registered_domains(&self) -> Result<Vec<DomainRecord>, ScanError> {
        collect_pages(self).await
    }
}

impl<C: RegistrarApi + Sync> PageSource for RegistrarScanner<'_, C> {
    type Item = DomainRecord;

    async fn fetch_page(&self, page_number: u32) -> Result<Page<DomainRecord>, ScanError> {
        let raw = self
            .client
            .list_domains_page(page_number, PAGE_SIZE)
            .await
            .map_err(|cause| ScanError::SourceUnavailable {
                source_name: "registrar",
                page: page_number,
                cause,
            })?;

        let records = raw
            .into_iter()
            .map(|domain| DomainRecord {
                registration_expiry: parse_expiration_date(&domain.expiration_date),
                name: domain.domain_name,
            })
            .collect();

        Ok(Page::new(records, PAGE_SIZE))
    }
}

/// Parse the registry's expiry string: date-time first, bare date as the
/// fallback. Both are interpreted in the registry's UTC+8 offset.
fn parse_expiration_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let offset = FixedOffset::east_opt(REGISTRY_UTC_OFFSET_SECS)?;
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    naive
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
