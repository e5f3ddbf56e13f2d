//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides minimal test doubles that record every provider
//! call so tests can assert on exactly which requests a run issued.

#![allow(dead_code)]

use ddns_core::audit::AuditLog;
use ddns_core::config::{Domains, RecordType};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpFamily, IpSource, RecordUpdate};
use ddns_core::Reconciler;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A provider call as observed by [`ScriptedDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ResolveZone(String),
    ResolveRecord {
        zone_id: String,
        record_type: RecordType,
        name: String,
    },
    ApplyUpdate {
        zone_id: String,
        record_id: String,
        update: RecordUpdate,
    },
}

#[derive(Default)]
struct ProviderState {
    zones: HashMap<String, String>,
    records: HashMap<(String, RecordType, String), DnsRecord>,
    reject_updates: bool,
    fail_on_record: Option<String>,
    calls: Vec<ProviderCall>,
}

/// A scripted DnsProvider backed by in-memory zones and records
///
/// Clones share the same state, so a test can keep one handle and give a
/// boxed clone to the reconciler. Accepted updates are written back to the
/// stored record, which makes consecutive runs observe the new content.
#[derive(Clone, Default)]
pub struct ScriptedDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl ScriptedDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active zone
    pub fn with_zone(self, name: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .insert(name.to_string(), id.to_string());
        self
    }

    /// Add a record to a zone
    pub fn with_record(
        self,
        zone_id: &str,
        record_type: RecordType,
        name: &str,
        id: &str,
        content: &str,
    ) -> Self {
        self.state.lock().unwrap().records.insert(
            (zone_id.to_string(), record_type, name.to_string()),
            DnsRecord {
                id: Some(id.to_string()),
                record_type: Some(record_type.to_string()),
                name: Some(name.to_string()),
                content: Some(content.to_string()),
            },
        );
        self
    }

    /// Make every update report `success: false`
    pub fn rejecting_updates(self) -> Self {
        self.state.lock().unwrap().reject_updates = true;
        self
    }

    /// Fail with a transport error when this record name is looked up
    pub fn failing_on_record(self, name: &str) -> Self {
        self.state.lock().unwrap().fail_on_record = Some(name.to_string());
        self
    }

    /// All calls issued so far
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Update calls issued so far
    pub fn updates(&self) -> Vec<(String, RecordUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::ApplyUpdate {
                    record_id, update, ..
                } => Some((record_id, update)),
                _ => None,
            })
            .collect()
    }

    /// Calls that concern records of the given type
    pub fn calls_for_type(&self, record_type: RecordType) -> usize {
        self.calls()
            .iter()
            .filter(|call| match call {
                ProviderCall::ResolveRecord {
                    record_type: t, ..
                } => *t == record_type,
                ProviderCall::ApplyUpdate { update, .. } => update.record_type == record_type,
                ProviderCall::ResolveZone(_) => false,
            })
            .count()
    }

    /// Current content of a stored record
    pub fn content_of(&self, zone_id: &str, record_type: RecordType, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&(zone_id.to_string(), record_type, name.to_string()))
            .and_then(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedDnsProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(ProviderCall::ResolveZone(zone_name.to_string()));
        Ok(state.zones.get(zone_name).cloned())
    }

    async fn resolve_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::ResolveRecord {
            zone_id: zone_id.to_string(),
            record_type,
            name: record_name.to_string(),
        });

        if state.fail_on_record.as_deref() == Some(record_name) {
            return Err(Error::provider("scripted", "HTTP request failed: connection reset"));
        }

        Ok(state
            .records
            .get(&(zone_id.to_string(), record_type, record_name.to_string()))
            .cloned())
    }

    async fn apply_update(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::ApplyUpdate {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            update: update.clone(),
        });

        if state.reject_updates {
            return Ok(false);
        }

        let key = (zone_id.to_string(), update.record_type, update.name.clone());
        if let Some(record) = state.records.get_mut(&key) {
            record.content = Some(update.content.clone());
        }
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// An IP source with a fixed answer
pub struct StaticIpSource {
    family: IpFamily,
    ip: Option<String>,
}

impl StaticIpSource {
    /// A source that detects `ip`
    pub fn found(family: IpFamily, ip: &str) -> Box<dyn IpSource> {
        Box::new(Self {
            family,
            ip: Some(ip.to_string()),
        })
    }

    /// A source whose detection fails
    pub fn unavailable(family: IpFamily) -> Box<dyn IpSource> {
        Box::new(Self { family, ip: None })
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Option<String> {
        self.ip.clone()
    }

    fn family(&self) -> IpFamily {
        self.family
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// One zone entry of the domains mapping
pub fn zone(name: &str, labels: &[&str]) -> (String, Vec<String>) {
    (
        name.to_string(),
        labels.iter().map(|l| l.to_string()).collect(),
    )
}

/// Zone → labels mapping, in the given order
pub fn domains(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Domains {
    entries.into_iter().collect()
}

/// Reconciler over a clone of `provider`, logging to `log_path`
pub fn reconciler(
    provider: &ScriptedDnsProvider,
    log_path: &Path,
    domains: Domains,
) -> Reconciler {
    Reconciler::new(Box::new(provider.clone()), AuditLog::new(log_path), domains)
}

/// Lines of the audit log (empty if the file was never created)
pub fn log_lines(log_path: &Path) -> Vec<String> {
    std::fs::read_to_string(log_path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// The canonical scenario: `example.com` with `@` stale and `home` current
pub fn example_provider() -> ScriptedDnsProvider {
    ScriptedDnsProvider::new()
        .with_zone("example.com", "zone1")
        .with_record("zone1", RecordType::A, "example.com", "rec1", "203.0.113.1")
        .with_record("zone1", RecordType::A, "home.example.com", "rec2", "203.0.113.5")
}
