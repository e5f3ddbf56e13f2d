// # IP Source Trait
//
// Defines the interface for detecting the current public IP address.
//
// ## Implementations
//
// - Shell command: `ddns-ip-command` crate
// - HTTP echo endpoint: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() {
//     let source = /* IpSource implementation */;
//
//     match source.current().await {
//         Some(ip) => println!("Found {}: {}", source.family(), ip),
//         None => println!("{} not available", source.family()),
//     }
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::config::RecordType;

/// Address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// DNS record type holding addresses of this family
    pub fn record_type(&self) -> RecordType {
        match self {
            IpFamily::V4 => RecordType::A,
            IpFamily::V6 => RecordType::Aaaa,
        }
    }

    /// Prefix of the configuration keys for this family
    pub fn config_prefix(&self) -> &'static str {
        match self {
            IpFamily::V4 => "ipv4",
            IpFamily::V6 => "ipv6",
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPV4"),
            IpFamily::V6 => f.write_str("IPV6"),
        }
    }
}

/// Trait for IP source implementations
///
/// A source answers one question: what is the current public address of
/// its family? It is queried once per run.
///
/// # Failure Contract
///
/// Detection failures never cross this boundary as errors. Implementations
/// log the cause and return `None`, which the reconciler treats as "family
/// unreachable, skip it for this run".
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Spawn one external process or perform one HTTP request per call
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Retry on failure
/// - ❌ Validate the address beyond what the mechanism requires
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Detect the current IP address
    ///
    /// # Returns
    ///
    /// - `Some(String)`: The trimmed address text
    /// - `None`: The family is unavailable for this run
    async fn current(&self) -> Option<String>;

    /// Address family this source reports
    fn family(&self) -> IpFamily;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing IP sources from configuration
pub trait IpSourceFactory: Send + Sync {
    /// Create an IpSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this IP source type
    ///
    /// # Returns
    ///
    /// A boxed IpSource trait object
    fn create(
        &self,
        config: &crate::config::IpSourceConfig,
    ) -> Result<Box<dyn IpSource>, crate::Error>;
}
