//! Plugin-based IP source registry
//!
//! The registry lets the binary register the IP source implementations it
//! was compiled with, so the reconciler never hardcodes a detection
//! mechanism.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddns_core::registry::SourceRegistry;
//!
//! let registry = SourceRegistry::new();
//! ddns_ip_command::register(&registry);
//!
//! let config = ddns_config.ip_source(IpFamily::V4).unwrap();
//! let source = registry.create_ip_source(&config)?;
//! ```

use crate::config::IpSourceConfig;
use crate::error::{Error, Result};
use crate::traits::{IpSource, IpSourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of IP source factories keyed by source type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SourceRegistry {
    /// Registered IP source factories
    ip_sources: RwLock<HashMap<String, Box<dyn IpSourceFactory>>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an IP source factory
    ///
    /// # Parameters
    ///
    /// - `name`: IP source type name (e.g., "command", "http")
    /// - `factory`: Factory object for creating IP source instances
    pub fn register_ip_source(&self, name: impl Into<String>, factory: Box<dyn IpSourceFactory>) {
        let name = name.into();
        let mut sources = self
            .ip_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sources.insert(name, factory);
    }

    /// Create an IP source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn IpSource>)`: Created IP source instance
    /// - `Err(Error)`: If source type is not registered or creation fails
    pub fn create_ip_source(&self, config: &IpSourceConfig) -> Result<Box<dyn IpSource>> {
        let source_type = config.type_name();
        let sources = self
            .ip_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = sources.get(source_type).ok_or_else(|| {
            Error::config(format!(
                "Unknown IP source type: {} (registered: {})",
                source_type,
                Self::join_names(&sources)
            ))
        })?;

        factory.create(config)
    }

    /// List all registered IP source types
    pub fn list_ip_sources(&self) -> Vec<String> {
        let sources = self
            .ip_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an IP source type is registered
    pub fn has_ip_source(&self, name: &str) -> bool {
        let sources = self
            .ip_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }

    fn join_names(sources: &HashMap<String, Box<dyn IpSourceFactory>>) -> String {
        if sources.is_empty() {
            return "none".to_string();
        }
        let mut names: Vec<&str> = sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}
