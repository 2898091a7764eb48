use std::time::Duration;

use tracing::debug;

pub mod api;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod table;

const PRODUCTION_BASE_URL: &str = "https://openapi.litgrid.eu/v1/kategorijos";

/// Per-attempt response timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, PartialEq, Eq)]
pub enum ApiException {
    /// The dataset id or category does not exist
    NotFound,
    /// Too many requests
    TooManyRequests,
    /// The API is down or overloaded
    Unavailable,
    UnknownError,
}

impl ApiException {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ApiException::NotFound,
            429 => ApiException::TooManyRequests,
            500..=599 => ApiException::Unavailable,
            _ => ApiException::UnknownError,
        }
    }
}

pub trait ApiClient {
    fn http_get(
        &self,
        path: &str,
        query_string: &[(String, String)],
    ) -> Result<String, anyhow::Error>;
}

#[derive(Debug, Clone)]
pub struct LitgridApi {
    base_url: String,
    timeout: Duration,
    insecure_tls: bool,
}

impl Default for LitgridApi {
    fn default() -> Self {
        Self::new()
    }
}

impl LitgridApi {
    pub fn new() -> Self {
        LitgridApi {
            base_url: PRODUCTION_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            insecure_tls: false,
        }
    }

    /// Reads `LITGRID_BASE_URL` and `LITGRID_INSECURE_TLS`, both optional.
    pub fn from_env_values() -> Self {
        let mut api = LitgridApi::new();
        if let Ok(base_url) = std::env::var("LITGRID_BASE_URL") {
            api = api.with_base_url(base_url);
        }
        if let Ok(flag) = std::env::var("LITGRID_INSECURE_TLS") {
            api = api.with_insecure_tls(matches!(
                flag.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }
        api
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skips certificate validation. Only meant for endpoints with a broken chain.
    pub fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, anyhow::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.insecure_tls)
            .build()?;
        Ok(client)
    }
}

impl ApiClient for LitgridApi {
    fn http_get(
        &self,
        path: &str,
        query_string: &[(String, String)],
    ) -> Result<String, anyhow::Error> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let http_client = self.http_client()?;

        debug!(url = %url, query = ?query_string, "GET");
        let response = http_client.get(&url).query(&query_string).send()?;

        let status_code = response.status();

        let body = response.text()?;
        if !status_code.is_success() {
            let status = ApiException::from_status(status_code.as_u16());
            return Err(anyhow::Error::msg(format!(
                "HTTP {} ({:?}): {}",
                status_code.as_str(),
                status,
                body
            )));
        }

        Ok(body)
    }
}
