//! OAuth 1.0a request signing (token-based authentication, HMAC-SHA256)
//!
//! Signature base string: `METHOD&enc(base_url)&enc(sorted_params)` where the
//! parameters are the query parameters plus every `oauth_*` parameter except
//! the signature itself. The key is `enc(consumer_secret)&enc(token_secret)`.
//! Percent-encoding is RFC 3986 (only unreserved characters pass through).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use spendledger_domain::config::ErpConfig;
use spendledger_domain::{LedgerError, Result};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_METHOD: &str = "HMAC-SHA256";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Signs ERP requests with the account's consumer and token credentials.
#[derive(Clone)]
pub struct OAuthSigner {
    realm: String,
    consumer_key: String,
    consumer_secret: String,
    token_id: String,
    token_secret: String,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("realm", &self.realm)
            .field("consumer_key", &self.consumer_key)
            .field("token_id", &self.token_id)
            .finish_non_exhaustive()
    }
}

impl OAuthSigner {
    pub fn new(
        realm: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token_id: token_id.into(),
            token_secret: token_secret.into(),
        }
    }

    pub fn from_config(config: &ErpConfig) -> Self {
        Self::new(
            config.account_id.clone(),
            config.consumer_key.clone(),
            config.consumer_secret.clone(),
            config.token_id.clone(),
            config.token_secret.clone(),
        )
    }

    /// `Authorization` header value with a fresh nonce and the current time.
    pub fn authorization_header(&self, method: &str, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let nonce: String =
            rand::thread_rng().sample_iter(&Alphanumeric).take(NONCE_LEN).map(char::from).collect();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_header_with(method, url, query, &nonce, timestamp)
    }

    /// Deterministic variant of [`Self::authorization_header`].
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.token_id.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];

        let signature = self.signature(method, url, query, &oauth_params)?;

        let mut header = format!("OAuth realm=\"{}\"", self.realm);
        for (key, value) in oauth_params {
            header.push_str(&format!(", {}=\"{}\"", key, encode(value)));
        }
        header.push_str(&format!(", oauth_signature=\"{}\"", encode(&signature)));
        Ok(header)
    }

    /// Base64 HMAC-SHA256 signature over the signature base string.
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String> {
        let base = signature_base_string(method, url, query, oauth_params)?;
        let key = format!("{}&{}", encode(&self.consumer_secret), encode(&self.token_secret));

        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| LedgerError::Internal(format!("invalid HMAC key: {e}")))?;
        mac.update(base.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&enc(normalized_url)&enc(param_string)`.
pub fn signature_base_string(
    method: &str,
    url: &str,
    query: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> Result<String> {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .chain(oauth_params.iter())
        .map(|(key, value)| (encode(key), encode(value)))
        .collect();
    pairs.sort();

    let params = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&normalize_url(url)?),
        encode(&params)
    ))
}

/// Scheme and host lowercased, default ports and any query string removed.
fn normalize_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| LedgerError::InvalidInput(format!("invalid ERP URL '{raw}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| LedgerError::InvalidInput(format!("ERP URL has no host: {raw}")))?
        .to_ascii_lowercase();

    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };
    Ok(format!("{}://{}{}", url.scheme(), authority, url.path()))
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
