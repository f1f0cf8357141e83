use super::Client;
use crate::error::ApiError;
use serde::Deserialize;
use std::future::Future;

/// Public endpoint of the domain registration service.
pub const DEFAULT_ENDPOINT: &str = "https://domain.aliyuncs.com";

/// API version spoken by the domain registration service.
pub const API_VERSION: &str = "2018-01-29";

/// Registered apex domains are listed 100 at a time.
pub const PAGE_SIZE: u32 = 100;

/// One registered apex domain as returned by `QueryDomainList`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisteredDomain {
    pub domain_name: String,
    /// Raw expiry string; either `YYYY-MM-DD HH:MM:SS` or a bare date.
    #[serde(default)]
    pub expiration_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryDomainListResponse {
    #[serde(default)]
    data: DomainList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainList {
    #[serde(default)]
    domain: Vec<RegisteredDomain>,
}

/// Listing capability of the registrar service.
pub trait RegistrarApi {
    /// Fetch one page (1-based) of registered apex domains.
    fn list_domains_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<RegisteredDomain>, ApiError>> + Send;
}

impl RegistrarApi for Client {
    async fn list_domains_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<RegisteredDomain>, ApiError> {
        let response: QueryDomainListResponse = self
            .rpc(
                "QueryDomainList",
                &[
                    ("PageNum", page_number.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .await?;

        Ok(response.data.domain)
    }
}
