//! Configuration types for the DDNS reconciler
//!
//! The configuration is a single JSON document read once at startup:
//!
//! ```json
//! {
//!   "email": "admin@example.com",
//!   "api_token": "...",
//!   "logfile": "/var/log/ddns.log",
//!   "domains": { "example.com": ["@", "home"] },
//!   "ipv4_command": "curl -s https://ipv4.icanhazip.com",
//!   "ipv6_command": "curl -s https://ipv6.icanhazip.com"
//! }
//! ```
//!
//! Any loading or validation failure is fatal and happens before the first
//! network request.

use crate::error::{Error, Result};
use crate::traits::IpFamily;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Label that denotes the zone apex
pub const APEX_LABEL: &str = "@";

/// Zone name → subdomain labels, in file order
pub type Domains = Vec<(String, Vec<String>)>;

/// Main DDNS configuration
#[derive(Clone, Deserialize)]
pub struct DdnsConfig {
    /// Account email, sent as `X-Auth-Email`
    pub email: String,

    /// API token, sent as a bearer token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Append-only audit log
    pub logfile: PathBuf,

    /// Zone name → subdomain labels (`@` for the apex), in file order
    #[serde(deserialize_with = "ordered_domains")]
    pub domains: Domains,

    /// Shell command printing the public IPv4 address
    #[serde(default)]
    pub ipv4_command: Option<String>,

    /// Shell command printing the public IPv6 address
    #[serde(default)]
    pub ipv6_command: Option<String>,

    /// HTTP echo endpoint for IPv4, used when no command is set
    #[serde(default)]
    pub ipv4_url: Option<String>,

    /// HTTP echo endpoint for IPv6, used when no command is set
    #[serde(default)]
    pub ipv6_url: Option<String>,

    /// Cloudflare API base URL override
    #[serde(default)]
    pub api_base: Option<String>,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("email", &self.email)
            .field("api_token", &"<REDACTED>")
            .field("logfile", &self.logfile)
            .field("domains", &self.domains)
            .field("ipv4_command", &self.ipv4_command)
            .field("ipv6_command", &self.ipv6_command)
            .field("ipv4_url", &self.ipv4_url)
            .field("ipv6_url", &self.ipv6_url)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DdnsConfig {
    /// Load and validate the configuration file
    ///
    /// # Returns
    ///
    /// - `Ok(DdnsConfig)`: A validated configuration
    /// - `Err(Error::Config)`: Missing file, malformed JSON or invalid values
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_json(&content).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        tracing::debug!(
            "Loaded config from {}: {} zone(s)",
            path.display(),
            config.domains.len()
        );
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(Error::config("email cannot be empty"));
        }

        if self.api_token.trim().is_empty() {
            return Err(Error::config("api_token cannot be empty"));
        }

        if self.logfile.as_os_str().is_empty() {
            return Err(Error::config("logfile cannot be empty"));
        }

        if self.domains.is_empty() {
            return Err(Error::config("No zones configured in domains"));
        }

        for (zone, labels) in &self.domains {
            validate_domain_name(zone)?;

            for label in labels {
                if label.is_empty() {
                    return Err(Error::config(format!(
                        "Zone {} has an empty subdomain label",
                        zone
                    )));
                }
                validate_domain_name(&record_name(zone, label))?;
            }
        }

        if let Some(base) = &self.api_base
            && !base.starts_with("https://")
            && !base.starts_with("http://")
        {
            return Err(Error::config(format!(
                "api_base must use HTTP or HTTPS scheme. Got: {}",
                base
            )));
        }

        if self.ip_source(IpFamily::V4).is_none() && self.ip_source(IpFamily::V6).is_none() {
            return Err(Error::config(
                "No IP source configured. Set ipv4_command and/or ipv6_command",
            ));
        }

        for family in [IpFamily::V4, IpFamily::V6] {
            if let Some(source) = self.ip_source(family) {
                source.validate()?;
            }
        }

        Ok(())
    }

    /// IP source for an address family
    ///
    /// A configured command wins over an echo URL. `None` means the family
    /// is not managed.
    pub fn ip_source(&self, family: IpFamily) -> Option<IpSourceConfig> {
        let (command, url) = match family {
            IpFamily::V4 => (&self.ipv4_command, &self.ipv4_url),
            IpFamily::V6 => (&self.ipv6_command, &self.ipv6_url),
        };

        if let Some(command) = command {
            return Some(IpSourceConfig::Command {
                family,
                command: command.clone(),
            });
        }

        url.as_ref().map(|url| IpSourceConfig::Http {
            family,
            url: url.clone(),
        })
    }

    /// Labels configured for a zone
    pub fn labels(&self, zone: &str) -> Option<&[String]> {
        self.domains
            .iter()
            .find(|(name, _)| name == zone)
            .map(|(_, labels)| labels.as_slice())
    }

    /// Effective Cloudflare API base URL
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

/// Fully-qualified record name for a subdomain label
///
/// `@` maps to the zone itself, anything else to `label.zone`.
pub fn record_name(zone: &str, label: &str) -> String {
    if label == APEX_LABEL {
        zone.to_string()
    } else {
        format!("{}.{}", label, zone)
    }
}

/// Validate the structure of a domain name
///
/// Only RFC 1035 length limits and empty labels are checked. Character
/// sets are left to the provider: `_` and `*` are valid in record names.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }
    }

    Ok(())
}

/// Deserialize the `domains` object keeping its key order
///
/// A repeated zone keeps its first position and its last label list.
fn ordered_domains<'de, D>(deserializer: D) -> std::result::Result<Domains, D::Error>
where
    D: Deserializer<'de>,
{
    struct DomainsVisitor;

    impl<'de> Visitor<'de> for DomainsVisitor {
        type Value = Domains;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of zone names to subdomain labels")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Domains, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut domains = Domains::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((zone, labels)) = map.next_entry::<String, Vec<String>>()? {
                match domains.iter_mut().find(|(name, _)| *name == zone) {
                    Some(entry) => entry.1 = labels,
                    None => domains.push((zone, labels)),
                }
            }
            Ok(domains)
        }
    }

    deserializer.deserialize_map(DomainsVisitor)
}

/// IP source configuration for one address family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSourceConfig {
    /// Run a shell command and read the address from stdout
    Command {
        /// Address family this source reports
        family: IpFamily,
        /// Command line handed to the platform shell
        command: String,
    },

    /// Fetch the address from a plain-text echo endpoint
    Http {
        /// Address family this source reports
        family: IpFamily,
        /// Echo endpoint URL
        url: String,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            IpSourceConfig::Command { family, command } => {
                if command.trim().is_empty() {
                    return Err(Error::config(format!(
                        "{} command cannot be empty",
                        family.config_prefix()
                    )));
                }
                Ok(())
            }
            IpSourceConfig::Http { family, url } => {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(Error::config(format!(
                        "{} url must use HTTP or HTTPS scheme. Got: {}",
                        family.config_prefix(),
                        url
                    )));
                }
                Ok(())
            }
        }
    }

    /// Registry key of the factory that builds this source
    pub fn type_name(&self) -> &'static str {
        match self {
            IpSourceConfig::Command { .. } => "command",
            IpSourceConfig::Http { .. } => "http",
        }
    }

    /// Address family of the configured source
    pub fn family(&self) -> IpFamily {
        match self {
            IpSourceConfig::Command { family, .. } | IpSourceConfig::Http { family, .. } => {
                *family
            }
        }
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name used by the provider API
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
