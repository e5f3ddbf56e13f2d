// # ddns-core
//
// Core library for the run-once DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for detecting the current public address of one family
// - **DnsProvider**: Trait for looking up and updating DNS records via provider APIs
// - **Reconciler**: Compares detected addresses with provider records and converges them
// - **AuditLog**: Append-only record of every update attempt
// - **SourceRegistry**: Plugin-based registry for IP source implementations
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Run-Once**: One pass per address family, then exit; no background tasks
// 3. **Plugin-Based**: IP sources are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A record is only written when its content differs

pub mod traits;
pub mod reconciler;
pub mod registry;
pub mod config;
pub mod error;
pub mod audit;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, IpFamily};
pub use reconciler::{Reconciler, RecordOutcome, RunReport};
pub use registry::SourceRegistry;
pub use config::{DdnsConfig, IpSourceConfig, RecordType};
pub use error::{Error, Result};
pub use audit::{AuditLog, UpdateOutcome};
