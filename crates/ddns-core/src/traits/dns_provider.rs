// # DNS Provider Trait
//
// Defines the interface for reading and writing DNS records via a provider
// API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::traits::RecordUpdate;
// use ddns_core::config::RecordType;
//
// let zone_id = provider.resolve_zone("example.com").await?.unwrap();
// let record = provider
//     .resolve_record(&zone_id, RecordType::A, "home.example.com")
//     .await?;
//
// if let Some(id) = record.and_then(|r| r.id) {
//     let update = RecordUpdate::new(RecordType::A, "home.example.com", "203.0.113.5");
//     let success = provider.apply_update(&zone_id, &id, &update).await?;
// }
// ```

use async_trait::async_trait;

use crate::config::RecordType;

/// TTL value meaning "automatic" in provider convention
pub const AUTO_TTL: u32 = 1;

/// A DNS record as observed at the provider
///
/// Every field is optional: the provider response is decoded defensively
/// and absent fields are reported as absent instead of failing the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record ID
    pub id: Option<String>,
    /// Record type as reported by the provider
    pub record_type: Option<String>,
    /// Fully-qualified record name
    pub name: Option<String>,
    /// Record content (the IP text for A/AAAA)
    pub content: Option<String>,
}

/// Full-replace write of an A/AAAA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// New content
    pub content: String,
    /// TTL, always [`AUTO_TTL`]
    pub ttl: u32,
    /// Proxying, always disabled
    pub proxied: bool,
}

impl RecordUpdate {
    /// Build an update with the fixed TTL and proxy settings
    pub fn new(
        record_type: RecordType,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            ttl: AUTO_TTL,
            proxied: false,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each operation is exactly one HTTP round trip.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Create records that do not exist
/// - ❌ Cache zones or records between calls
///
/// # Errors
///
/// Only transport failures and undecodable responses are errors. A
/// provider-side "not found" is `Ok(None)`, a rejected write is
/// `Ok(false)`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve an active zone by name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(id))`: ID of the first matching zone
    /// - `Ok(None)`: No active zone with that name
    async fn resolve_zone(&self, zone_name: &str) -> Result<Option<String>, crate::Error>;

    /// Resolve a record of the given type and fully-qualified name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: The first matching record
    /// - `Ok(None)`: No such record
    async fn resolve_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Replace a record's content
    ///
    /// # Returns
    ///
    /// The provider's reported success flag
    async fn apply_update(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<bool, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
