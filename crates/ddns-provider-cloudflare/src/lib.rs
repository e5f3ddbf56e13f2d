// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider implementation for the
// DDNS reconciler.
//
// ## Behaviour
//
// - ✅ One HTTP request per operation (zone lookup, record lookup, update)
// - ✅ Transport and decode errors propagate to the caller
// - ✅ Typed, defensive decoding: missing fields mean "not found"
// - ✅ Auth headers built once and applied to every request
// - ❌ NO retry logic
// - ❌ NO backoff logic
// - ❌ NO rate limiting
// - ❌ NO caching of zones or records
// - ❌ NO record creation
//
// HTTP status codes are not interpreted. Cloudflare answers errors with a
// JSON envelope (`success: false`, `result: null`), which decodes to "not
// found" for lookups and `false` for updates. Only bodies that are not JSON
// at all are errors.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token or email is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...&status=active`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, RecordType};
use ddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate};
use ddns_core::{Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = ddns_core::config::DEFAULT_API_BASE;

/// Header carrying the account email
const AUTH_EMAIL_HEADER: &str = "X-Auth-Email";

/// Credentials sent with every request
///
/// Built once per run and shared by all three operations.
#[derive(Clone)]
pub struct AuthContext {
    email: String,
    /// ⚠️ NEVER log this value
    api_token: String,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("email", &self.email)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

impl AuthContext {
    /// Create an auth context
    ///
    /// # Errors
    ///
    /// `Error::Config` if either value is empty.
    pub fn new(email: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let api_token = api_token.into();

        if email.trim().is_empty() {
            return Err(Error::config("Cloudflare account email cannot be empty"));
        }
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        Ok(Self { email, api_token })
    }

    /// Attach content-type, email and bearer token headers
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_EMAIL_HEADER, &self.email)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
    }
}

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

/// Entry of the envelope's `errors` array
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl std::fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cloudflare error {}: {}",
            self.code.map_or_else(|| "?".to_string(), |c| c.to_string()),
            self.message.as_deref().unwrap_or("<no message>")
        )
    }
}

/// Zone listing entry
#[derive(Debug, Deserialize)]
struct ZoneEntry {
    #[serde(default)]
    id: Option<String>,
}

/// DNS record listing entry
#[derive(Debug, Deserialize)]
struct RecordEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    record_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<RecordEntry> for DnsRecord {
    fn from(entry: RecordEntry) -> Self {
        DnsRecord {
            id: entry.id,
            record_type: entry.record_type,
            name: entry.name,
            content: entry.content,
        }
    }
}

/// Full-replace PUT payload
#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl<'a> From<&'a RecordUpdate> for UpdatePayload<'a> {
    fn from(update: &'a RecordUpdate) -> Self {
        Self {
            record_type: update.record_type.as_str(),
            name: &update.name,
            content: &update.content,
            ttl: update.ttl,
            proxied: update.proxied,
        }
    }
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. Deciding whether
/// an update is needed is owned by `Reconciler`.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
#[derive(Debug)]
pub struct CloudflareProvider {
    /// Credentials for every request
    auth: AuthContext,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `auth`: Account email and API token
    /// - `api_base`: API base URL (normally [`CLOUDFLARE_API_BASE`])
    ///
    /// The HTTP client keeps the library defaults; no timeout is imposed.
    pub fn new(auth: AuthContext, api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let api_base = api_base.into().trim_end_matches('/').to_string();

        Ok(Self {
            auth,
            api_base,
            client,
        })
    }

    /// Create a provider from the loaded configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        let auth = AuthContext::new(config.email.clone(), config.api_token.clone())?;
        Self::new(auth, config.api_base())
    }

    /// Send a request and decode the Cloudflare envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(
                "cloudflare",
                format!("Failed to parse {} response (status {}): {}", what, status, e),
            )
        })?;

        if !envelope.success {
            for message in &envelope.errors {
                tracing::warn!("{} returned {}", what, message);
            }
        }

        Ok(envelope)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Start an authenticated request
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.auth.apply(self.client.request(method, self.url(path)))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Resolve an active zone by name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com&status=active
    /// ```
    async fn resolve_zone(&self, zone_name: &str) -> Result<Option<String>> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let request = self
            .request(reqwest::Method::GET, "/zones")
            .query(&[("name", zone_name), ("status", "active")]);

        let envelope: Envelope<Vec<ZoneEntry>> = self.send(request, "Zone lookup").await?;

        // First match wins; an entry without an ID counts as no match
        let zone_id = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|zone| zone.id);

        match &zone_id {
            Some(id) => tracing::debug!("Found zone ID: {}", id),
            None => tracing::debug!("No active zone named {}", zone_name),
        }
        Ok(zone_id)
    }

    /// Resolve a record of one type and name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn resolve_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<DnsRecord>> {
        tracing::debug!(
            "Looking up record: {} (type: {})",
            record_name,
            record_type
        );

        let request = self
            .request(reqwest::Method::GET, &format!("/zones/{}/dns_records", zone_id))
            .query(&[("type", record_type.as_str()), ("name", record_name)]);

        let envelope: Envelope<Vec<RecordEntry>> = self.send(request, "Record lookup").await?;

        let record = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(DnsRecord::from);

        if let Some(record) = &record {
            tracing::debug!("Found record ID: {:?}", record.id);
        }
        Ok(record)
    }

    /// Replace a record's content
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "203.0.113.5",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    async fn apply_update(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<bool> {
        tracing::debug!(
            "Updating record {}: {} {} -> {}",
            record_id,
            update.record_type,
            update.name,
            update.content
        );

        let request = self
            .request(
                reqwest::Method::PUT,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            )
            .json(&UpdatePayload::from(update));

        let envelope: Envelope<serde_json::Value> = self.send(request, "Record update").await?;
        Ok(envelope.success)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthContext {
        AuthContext::new("admin@example.com", "secret_token_12345").unwrap()
    }

    #[test]
    fn test_auth_requires_token() {
        let err = AuthContext::new("admin@example.com", "").unwrap_err();
        assert!(err.to_string().contains("API token cannot be empty"));
    }

    #[test]
    fn test_auth_requires_email() {
        assert!(AuthContext::new(" ", "token").is_err());
    }

    #[test]
    fn test_provider_name() {
        let provider = CloudflareProvider::new(auth(), CLOUDFLARE_API_BASE).unwrap();
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let provider = CloudflareProvider::new(auth(), "http://127.0.0.1:8080/").unwrap();
        assert_eq!(provider.url("/zones"), "http://127.0.0.1:8080/zones");
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new(auth(), CLOUDFLARE_API_BASE).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
    }

    #[test]
    fn test_update_payload_shape() {
        let update = RecordUpdate::new(RecordType::Aaaa, "example.com", "2001:db8::5");
        let json = serde_json::to_value(UpdatePayload::from(&update)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "AAAA",
                "name": "example.com",
                "content": "2001:db8::5",
                "ttl": 1,
                "proxied": false,
            })
        );
    }

    #[test]
    fn test_envelope_null_result_decodes_as_empty() {
        let envelope: Envelope<Vec<ZoneEntry>> = serde_json::from_str(
            r#"{"result": null, "success": false, "errors": [{"code": 9109, "message": "Invalid access token"}]}"#,
        )
        .unwrap();

        assert!(envelope.result.unwrap_or_default().is_empty());
        assert!(!envelope.success);
        assert_eq!(
            envelope.errors[0].to_string(),
            "Cloudflare error 9109: Invalid access token"
        );
    }

    #[test]
    fn test_envelope_missing_success_is_false() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(!envelope.success);
        assert!(envelope.result.is_none());
    }
}
