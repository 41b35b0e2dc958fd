//! ERP REST client: SuiteQL queries and record fetches, all OAuth-signed

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use spendledger_domain::config::ErpConfig;
use spendledger_domain::Result;
use tracing::{debug, warn};

use super::oauth::OAuthSigner;
use crate::http::HttpClient;

const SERVICE: &str = "erp";
const SUITEQL_PATH: &str = "/services/rest/query/v1/suiteql";
const RECORD_PATH: &str = "/services/rest/record/v1";

/// Client for the ERP's REST web services.
pub struct ErpClient {
    http: HttpClient,
    base_url: String,
    signer: OAuthSigner,
    page_size: u32,
    max_pages: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: Option<bool>,
}

impl ErpClient {
    pub fn new(config: &ErpConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .service(SERVICE)
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(2)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer: OAuthSigner::from_config(config),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        })
    }

    /// Run a SuiteQL query and collect every row.
    ///
    /// Stops at the page ceiling, at a short page, or when the response says
    /// there are no more rows.
    pub async fn suiteql<T>(&self, query: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, SUITEQL_PATH);
        let limit = self.page_size.to_string();
        let body = json!({ "q": query });
        let mut rows = Vec::new();

        for page in 0..self.max_pages {
            let offset = (u64::from(page) * u64::from(self.page_size)).to_string();
            let params = [("limit", limit.as_str()), ("offset", offset.as_str())];

            let authorization = self.signer.authorization_header("POST", &url, &params)?;
            let request = self
                .http
                .request(Method::POST, &url)
                .query(&params)
                .header(AUTHORIZATION, authorization)
                .header(CONTENT_TYPE, "application/json")
                .header("Prefer", "transient")
                .json(&body);

            let result: QueryPage<T> = self.http.send_json(request).await?;
            let received = result.items.len();
            debug!(page = page + 1, rows = received, "suiteql page received");
            rows.extend(result.items);

            if received < self.page_size as usize || result.has_more == Some(false) {
                return Ok(rows);
            }
        }

        warn!(max_pages = self.max_pages, "suiteql page ceiling reached; results truncated");
        Ok(rows)
    }

    /// GET a record resource, e.g. `vendorBill/42` or `vendor/7`.
    pub async fn record<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}/{}", self.base_url, RECORD_PATH, path.trim_start_matches('/'));
        let authorization = self.signer.authorization_header("GET", &url, &[])?;
        let request = self.http.request(Method::GET, &url).header(AUTHORIZATION, authorization);
        self.http.send_json(request).await
    }
}
