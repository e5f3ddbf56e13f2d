//! Core traits for the DDNS reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Detect the current public address of one family
//! - [`DnsProvider`]: Read and update DNS records via provider APIs

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, IpFamily, IpSourceFactory};
pub use dns_provider::{DnsProvider, DnsRecord, RecordUpdate, AUTO_TTL};
