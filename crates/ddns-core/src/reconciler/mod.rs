//! Run-once DNS reconciler
//!
//! The Reconciler is responsible for:
//! - Detecting the current address of each configured family via IpSource
//! - Comparing it against the provider's record content
//! - Updating records whose content differs
//! - Appending every update attempt to the audit log
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── detected IP (per family) ───┐
//! └─────────────┘                                │
//!                                                ▼
//!                                       ┌──────────────┐
//!                                       │  Reconciler  │
//!                                       └──────────────┘
//!                                                │
//!                      ┌─────────────────────────┼──────────────────┐
//!                      │                         │                  │
//!                      ▼                         ▼                  ▼
//!              ┌──────────────┐         ┌──────────────┐    ┌─────────────┐
//!              │ DnsProvider  │         │ DnsProvider  │    │  AuditLog   │
//!              │ (lookup)     │         │ (update)     │    │  (append)   │
//!              └──────────────┘         └──────────────┘    └─────────────┘
//! ```
//!
//! ## Per-record Flow
//!
//! 1. Resolve the zone ID (skip the whole zone if it is not found or has
//!    no subdomains configured)
//! 2. Build the record name (`@` → zone apex)
//! 3. Resolve the record of the family's type
//! 4. Content equals detected IP → up to date, nothing written
//! 5. Record exists → update it and append the outcome to the audit log
//! 6. Record missing → report it, nothing is created
//!
//! Each family is an independent pass that re-resolves zones and records.
//! Transport failures propagate and abort the run.

use crate::audit::{AuditLog, UpdateOutcome};
use crate::config::{record_name, Domains, RecordType};
use crate::error::Result;
use crate::traits::{DnsProvider, IpFamily, IpSource, RecordUpdate};
use tracing::{debug, info, warn};

/// What happened to one (zone, subdomain) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Provider accepted the update
    Updated,
    /// Provider rejected the update (success flag false)
    UpdateFailed,
    /// Record content already matched the detected IP
    UpToDate,
    /// No record of this type exists for the name
    NoRecord,
    /// Update needed but suppressed by dry-run mode
    DryRun,
}

/// Outcome for a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    /// Fully-qualified record name
    pub record_name: String,
    /// Record type
    pub record_type: RecordType,
    /// What happened
    pub outcome: RecordOutcome,
}

/// Result of one reconciliation pass (one record type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Record type reconciled in this pass
    pub record_type: RecordType,
    /// The detected IP the records were compared against
    pub ip: String,
    /// Zones that could not be resolved
    pub zones_not_found: Vec<String>,
    /// Per-record outcomes, in processing order
    pub records: Vec<RecordReport>,
}

impl PassReport {
    fn new(record_type: RecordType, ip: &str) -> Self {
        Self {
            record_type,
            ip: ip.to_string(),
            zones_not_found: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Number of records with the given outcome
    pub fn count(&self, outcome: RecordOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Result of a full run over all configured families
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Completed passes, in family order
    pub passes: Vec<PassReport>,
    /// Families whose detection failed
    pub skipped_families: Vec<IpFamily>,
}

impl RunReport {
    /// Total records with the given outcome across all passes
    pub fn count(&self, outcome: RecordOutcome) -> usize {
        self.passes.iter().map(|p| p.count(outcome)).sum()
    }

    /// Whether any update was rejected by the provider
    pub fn has_failed_updates(&self) -> bool {
        self.count(RecordOutcome::UpdateFailed) > 0
    }
}

/// Run-once reconciler
///
/// Holds the provider, the audit log and the zone → subdomain mapping for
/// the lifetime of one invocation. Everything runs sequentially: each
/// provider call completes before the next starts.
pub struct Reconciler {
    /// DNS provider for lookups and updates
    provider: Box<dyn DnsProvider>,

    /// Audit log for update attempts
    audit: AuditLog,

    /// Zone name → subdomain labels, in config order
    domains: Domains,

    /// If true, perform lookups but skip writes
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `audit`: Audit log receiving one line per update attempt
    /// - `domains`: Zone name → subdomain labels (`@` for the apex)
    pub fn new(
        provider: Box<dyn DnsProvider>,
        audit: AuditLog,
        domains: Domains,
    ) -> Self {
        Self {
            provider,
            audit,
            domains,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    ///
    /// In dry-run mode every lookup still happens, but no update request is
    /// sent and nothing is appended to the audit log.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass per IP source
    ///
    /// A source that cannot detect its address skips its family only; the
    /// remaining sources still run.
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: All passes completed
    /// - `Err(Error)`: A provider call or audit write failed; the run stops
    pub async fn run(&self, sources: &[Box<dyn IpSource>]) -> Result<RunReport> {
        let mut report = RunReport::default();

        for source in sources {
            let family = source.family();
            debug!("Detecting {} via {} source", family, source.source_name());

            match source.current().await {
                Some(ip) => {
                    info!("Found {}: {}", family, ip);
                    let pass = self.reconcile(&ip, family.record_type()).await?;
                    report.passes.push(pass);
                }
                None => {
                    warn!(
                        "{} not available, skipping {} records",
                        family,
                        family.record_type()
                    );
                    report.skipped_families.push(family);
                }
            }
        }

        Ok(report)
    }

    /// Reconcile every configured record of one type against `ip`
    pub async fn reconcile(&self, ip: &str, record_type: RecordType) -> Result<PassReport> {
        let mut pass = PassReport::new(record_type, ip);

        for (zone_name, labels) in &self.domains {
            if labels.is_empty() {
                debug!("Zone {} has no subdomains configured, skipping", zone_name);
                continue;
            }

            info!("Domain {}", zone_name);

            let Some(zone_id) = self.provider.resolve_zone(zone_name).await? else {
                warn!("Could not get zone ID for {}", zone_name);
                pass.zones_not_found.push(zone_name.clone());
                continue;
            };
            debug!("Zone {} has ID {}", zone_name, zone_id);

            for label in labels {
                let name = record_name(zone_name, label);
                let outcome = self.reconcile_record(&zone_id, &name, ip, record_type).await?;
                pass.records.push(RecordReport {
                    record_name: name,
                    record_type,
                    outcome,
                });
            }
        }

        info!(
            "{} pass complete: {} updated, {} failed, {} up to date, {} missing",
            record_type,
            pass.count(RecordOutcome::Updated),
            pass.count(RecordOutcome::UpdateFailed),
            pass.count(RecordOutcome::UpToDate),
            pass.count(RecordOutcome::NoRecord)
        );

        Ok(pass)
    }

    async fn reconcile_record(
        &self,
        zone_id: &str,
        name: &str,
        ip: &str,
        record_type: RecordType,
    ) -> Result<RecordOutcome> {
        let record = self
            .provider
            .resolve_record(zone_id, record_type, name)
            .await?
            .unwrap_or_default();

        info!(
            "{} {} content: {}",
            name,
            record_type,
            record.content.as_deref().unwrap_or("<none>")
        );

        if record.content.as_deref() == Some(ip) {
            info!("{} already up to date", name);
            return Ok(RecordOutcome::UpToDate);
        }

        let Some(record_id) = record.id else {
            warn!("No existing record found for {}", name);
            return Ok(RecordOutcome::NoRecord);
        };

        let update = RecordUpdate::new(record_type, name, ip);

        if self.dry_run {
            info!(
                "[DRY-RUN] Would update {} {} (record {}) to {}",
                record_type, name, record_id, ip
            );
            return Ok(RecordOutcome::DryRun);
        }

        let success = self.provider.apply_update(zone_id, &record_id, &update).await?;

        if success {
            info!("{} updated to: {}", name, ip);
        } else {
            warn!("{}: {} update failed", record_type, name);
        }

        self.audit
            .record(&UpdateOutcome {
                success,
                record_type,
                record_name: name.to_string(),
                new_ip: ip.to_string(),
            })
            .await?;

        Ok(if success {
            RecordOutcome::Updated
        } else {
            RecordOutcome::UpdateFailed
        })
    }
}
