// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS reconciler.
//
// ## Purpose
//
// Detects the public address by asking an echo endpoint that answers with
// the caller's address as plain text (e.g. `https://api.ipify.org`).
//
// ## Architecture
//
// One GET per detection. The trimmed body must parse as an address of the
// configured family; anything else counts as "unavailable" and skips that
// family's pass.

use ddns_core::SourceRegistry;
use ddns_core::config::IpSourceConfig;
use ddns_core::traits::{IpFamily, IpSource, IpSourceFactory};
use ddns_core::{Error, Result};

use std::net::IpAddr;

/// HTTP-based IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// Address family this source detects
    family: IpFamily,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "https://api.ipify.org")
    /// - `family`: Address family the answer must belong to
    pub fn new(url: impl Into<String>, family: IpFamily) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            family,
            client,
        })
    }

    /// Fetch and validate the address
    async fn fetch_ip(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered with HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let ip_text = body.trim();
        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| Error::ip_source(format!("Invalid IP address: {:?}", ip_text)))?;

        let matches_family = match self.family {
            IpFamily::V4 => ip.is_ipv4(),
            IpFamily::V6 => ip.is_ipv6(),
        };
        if !matches_family {
            return Err(Error::ip_source(format!(
                "Expected {}, got: {}",
                self.family, ip
            )));
        }

        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Option<String> {
        match self.fetch_ip().await {
            Ok(ip) => Some(ip.to_string()),
            Err(e) => {
                tracing::warn!("{} detection via {} failed: {}", self.family, self.url, e);
                None
            }
        }
    }

    fn family(&self) -> IpFamily {
        self.family
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP IP sources
pub struct HttpFactory;

impl IpSourceFactory for HttpFactory {
    fn create(&self, config: &IpSourceConfig) -> Result<Box<dyn IpSource>> {
        match config {
            IpSourceConfig::Http { family, url } => {
                Ok(Box::new(HttpIpSource::new(url.clone(), *family)?))
            }
            _ => Err(Error::config("Invalid config for HTTP IP source")),
        }
    }
}

/// Register the HTTP IP source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_ip_source("http", Box::new(HttpFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = HttpFactory;

        let config = IpSourceConfig::Http {
            family: IpFamily::V4,
            url: "https://api.ipify.org".to_string(),
        };

        let source = factory.create(&config).unwrap();
        assert_eq!(source.family(), IpFamily::V4);
        assert_eq!(source.source_name(), "http");
    }

    #[test]
    fn test_factory_rejects_command_config() {
        let config = IpSourceConfig::Command {
            family: IpFamily::V4,
            command: "echo 203.0.113.5".to_string(),
        };

        assert!(HttpFactory.create(&config).is_err());
    }

    #[test]
    fn test_register() {
        let registry = SourceRegistry::new();
        register(&registry);
        assert!(registry.has_ip_source("http"));
    }
}
