//! HTTP client for the policy administration server.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::export::ExportApi;
use crate::model::{Catalog, ServiceDefEnvelope, ServiceEnvelope};

pub const EXPORT_PATH: &str = "/service/plugins/policies/exportJson";
const DEFINITIONS_PATH: &str = "/service/plugins/definitions";
const SERVICES_PATH: &str = "/service/plugins/services";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Strip a trailing path separator so endpoint concatenation never produces
/// a doubled one.
pub fn normalize_base_url(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Build the export endpoint URL for the given comma-delimited service
/// names. `check_only` selects the existence pre-check over the actual
/// download.
pub fn policy_export_url(base_url: &str, service_names: &str, check_only: bool) -> String {
    format!("{base_url}{EXPORT_PATH}?serviceName={service_names}&checkPoliciesExists={check_only}")
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: &str, username: Option<String>, password: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url),
            username,
            password,
        }
    }

    pub fn credentials(&self) -> Option<(String, Option<String>)> {
        self.username
            .clone()
            .map(|user| (user, self.password.clone()))
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }
        request
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = self.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }

    /// Fetch the service definition and service instance catalogs.
    pub async fn fetch_catalog(&self) -> Result<Catalog, ApiError> {
        let defs_url = format!("{}{DEFINITIONS_PATH}", self.base_url);
        let defs: ServiceDefEnvelope = self.get_checked(&defs_url).await?.json().await?;

        let services_url = format!("{}{SERVICES_PATH}", self.base_url);
        let services: ServiceEnvelope = self.get_checked(&services_url).await?.json().await?;

        tracing::debug!(
            definitions = defs.service_defs.len(),
            services = services.services.len(),
            "Fetched catalogs"
        );

        Ok(Catalog {
            definitions: defs.service_defs,
            services: services.services,
        })
    }
}

#[async_trait]
impl ExportApi for AdminClient {
    async fn check_policies_exist(&self, service_names: &str) -> Result<bool, ApiError> {
        let url = policy_export_url(&self.base_url, service_names, true);
        tracing::debug!(%url, "Checking for exportable policies");
        let response = self.get(&url).send().await?;
        let status = response.status();

        // 200 means policies exist; any other success (e.g. 204) means the
        // export would be empty.
        if status.as_u16() == 200 {
            return Ok(true);
        }
        if status.is_success() {
            return Ok(false);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    fn export_url(&self, service_names: &str) -> String {
        policy_export_url(&self.base_url, service_names, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_separator_is_stripped() {
        assert_eq!(normalize_base_url("http://host/app/"), "http://host/app");
        assert_eq!(normalize_base_url("http://host/app"), "http://host/app");
    }

    #[test]
    fn check_url_matches_endpoint_contract() {
        let base = normalize_base_url("http://host/app/");
        assert_eq!(
            policy_export_url(&base, "svcA", true),
            "http://host/app/service/plugins/policies/exportJson?serviceName=svcA&checkPoliciesExists=true"
        );
    }

    #[test]
    fn download_url_differs_only_in_check_flag() {
        let check = policy_export_url("http://h", "a,b", true);
        let download = policy_export_url("http://h", "a,b", false);
        assert_eq!(
            check.replace("checkPoliciesExists=true", "checkPoliciesExists=false"),
            download
        );
    }
}
