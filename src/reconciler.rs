// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The reconciliation loop.
//!
//! Each cycle:
//!
//! 1. **Collect** - rebuild the desired state from annotated services and ingresses
//! 2. **Resolve zone** - find the most specific hosted zone for each domain
//! 3. **Resolve endpoint** - find the load balancer zone id (alias records only)
//! 4. **Build** - construct the record set
//! 5. **Check** - optionally skip the write when the existing record already matches
//! 6. **Upsert** - write the record set, or log it in dry-run mode
//!
//! Domains are processed one after another. A failure in any stage is logged
//! and skips only that domain; the next cycle retries it from scratch.
//!
//! # Example
//!
//! ```rust,no_run
//! use kube_route53_dns::aws::{load_sdk_config, ElbProvider, Route53Provider};
//! use kube_route53_dns::cluster::KubeCluster;
//! use kube_route53_dns::config::SyncConfig;
//! use kube_route53_dns::reconciler::Reconciler;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let sdk_config = load_sdk_config(None).await?;
//! let mut reconciler = Reconciler::new(
//!     KubeCluster::new(client),
//!     Route53Provider::new(&sdk_config),
//!     ElbProvider::new(&sdk_config),
//!     SyncConfig::default(),
//! );
//! let report = reconciler.run_cycle().await;
//! println!("{} domains upserted", report.count(kube_route53_dns::reconciler::DomainOutcome::Upserted));
//! # Ok(())
//! # }
//! ```

use crate::cluster::ClusterSource;
use crate::config::SyncConfig;
use crate::constants::{CHANGE_BATCH_COMMENT, EXISTENCE_CHECK_MAX_ITEMS};
use crate::desired::{collect_desired_state, DesiredBinding, RecordType, SkippedResource};
use crate::dns_errors::SyncError;
use crate::endpoint::resolve_endpoint;
use crate::metrics;
use crate::provider::{DnsProvider, LoadBalancerProvider};
use crate::records::{build_record_set, PlannedChange};
use crate::zone::resolve_zone;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Result of reconciling one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainOutcome {
    /// The record set was written
    Upserted,
    /// The existing record already matched; no write was issued
    Unchanged,
    /// The write was suppressed by dry-run mode
    DryRun,
}

impl DomainOutcome {
    /// Label used in metrics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Upserted => "upserted",
            Self::Unchanged => "unchanged",
            Self::DryRun => "dry_run",
        }
    }
}

/// Summary of one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of domains in the collected desired state
    pub desired: usize,
    /// Outcome per successfully reconciled domain
    pub outcomes: BTreeMap<String, DomainOutcome>,
    /// Failure per domain that was skipped this cycle
    pub failures: BTreeMap<String, SyncError>,
    /// Resources that contributed no bindings
    pub skipped: Vec<SkippedResource>,
    /// Set when desired state could not be collected at all
    pub aborted: Option<String>,
}

impl CycleReport {
    /// Number of domains that ended with `outcome`.
    #[must_use]
    pub fn count(&self, outcome: DomainOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }
}

/// Drives reconciliation cycles against the cluster and the providers.
pub struct Reconciler<C, D, L> {
    cluster: C,
    dns: D,
    elb: L,
    config: SyncConfig,
    refresh_pending: bool,
}

impl<C, D, L> Reconciler<C, D, L>
where
    C: ClusterSource,
    D: DnsProvider,
    L: LoadBalancerProvider,
{
    /// Create a reconciler. Dry-run mode and record defaults come from `config`.
    pub fn new(cluster: C, dns: D, elb: L, config: SyncConfig) -> Self {
        Self {
            cluster,
            dns,
            elb,
            config,
            refresh_pending: false,
        }
    }

    /// Configuration the reconciler was created with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Cluster accessor.
    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// DNS provider accessor.
    pub fn dns(&self) -> &D {
        &self.dns
    }

    /// Load balancer provider accessor.
    pub fn elb(&self) -> &L {
        &self.elb
    }

    /// True when a credential refresh will run before the next cycle.
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// A cycle in progress is never interrupted; shutdown is observed while
    /// sleeping between cycles.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            dry_run = self.config.dry_run,
            "Starting Service; polling interval={}s",
            self.config.interval.as_secs()
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping reconciliation loop");
                    return;
                }
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// Run a single reconciliation cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        if self.refresh_pending {
            self.refresh_credentials().await;
        }

        let started = Instant::now();

        let state = match collect_desired_state(&self.cluster, &self.config).await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to collect desired state, skipping cycle: {:#}", e);
                metrics::record_cycle_aborted();
                return CycleReport {
                    aborted: Some(format!("{e:#}")),
                    ..CycleReport::default()
                };
            }
        };

        for skipped in &state.skipped {
            metrics::record_skipped_resource(skipped.resource.kind, skipped.reason.label());
        }

        let mut report = CycleReport {
            desired: state.bindings.len(),
            skipped: state.skipped.clone(),
            ..CycleReport::default()
        };

        for (domain, binding) in &state.bindings {
            let record_type = binding.record_type.as_str();
            match self.reconcile_domain(domain, binding).await {
                Ok(outcome) => {
                    metrics::record_domain_outcome(record_type, outcome.label());
                    report.outcomes.insert(domain.clone(), outcome);
                }
                Err(e) => {
                    warn!(
                        domain = %domain,
                        stage = e.stage(),
                        source = %binding.source,
                        error = %e,
                        "Failed to reconcile domain"
                    );
                    metrics::record_error(e.stage());
                    metrics::record_domain_outcome(record_type, "error");

                    if e.requires_credential_refresh() {
                        warn!("Authentication failure during write, credentials will be refreshed before the next cycle");
                        self.refresh_pending = true;
                    }
                    report.failures.insert(domain.clone(), e);
                }
            }
        }

        let elapsed = started.elapsed();
        metrics::record_cycle(report.desired, elapsed);
        info!(
            desired = report.desired,
            upserted = report.count(DomainOutcome::Upserted),
            unchanged = report.count(DomainOutcome::Unchanged),
            dry_run = report.count(DomainOutcome::DryRun),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            elapsed_ms = elapsed.as_millis(),
            "Reconciliation cycle complete"
        );

        report
    }

    /// Reconcile one domain through every pipeline stage.
    async fn reconcile_domain(
        &self,
        domain: &str,
        binding: &DesiredBinding,
    ) -> Result<DomainOutcome, SyncError> {
        info!(
            "Creating DNS record for {}: {} -> {}",
            binding.source, domain, binding.target_hostname
        );

        let zone = resolve_zone(&self.dns, domain).await?;

        let endpoint = match binding.record_type {
            RecordType::AliasA => Some(resolve_endpoint(&self.elb, &binding.target_hostname).await?),
            RecordType::Cname => None,
        };

        let change = build_record_set(&zone.id, domain, binding, endpoint.as_ref())?;

        if self.config.existence_check && self.is_unchanged(&change).await {
            debug!(
                domain = %domain,
                zone_id = %change.zone_id,
                "Existing record already matches, skipping write"
            );
            return Ok(DomainOutcome::Unchanged);
        }

        if self.config.dry_run {
            info!(
                change = %serde_json::to_string(&change).unwrap_or_default(),
                "DRY RUN: We normally would have updated {} to point {} to {}",
                change.zone_id,
                domain,
                binding.target_hostname
            );
            return Ok(DomainOutcome::DryRun);
        }

        self.dns
            .upsert_record_set(&change.zone_id, &change.record, CHANGE_BATCH_COMMENT)
            .await
            .map_err(|source| SyncError::WriteFailed {
                domain: domain.to_string(),
                zone_id: change.zone_id.clone(),
                source,
            })?;

        info!(
            "Created DNS record set: domain={}, zoneID={}",
            domain, change.zone_id
        );
        Ok(DomainOutcome::Upserted)
    }

    /// Best-effort check whether the first record at the name already matches.
    async fn is_unchanged(&self, change: &PlannedChange) -> bool {
        match self
            .dns
            .list_resource_record_sets(
                &change.zone_id,
                &change.record.name,
                EXISTENCE_CHECK_MAX_ITEMS,
            )
            .await
        {
            Ok(existing) => existing
                .first()
                .is_some_and(|record| change.record.matches(record)),
            Err(e) => {
                warn!(
                    name = %change.record.name,
                    zone_id = %change.zone_id,
                    "Existence check failed, writing anyway: {}",
                    e
                );
                false
            }
        }
    }

    async fn refresh_credentials(&mut self) {
        info!("Refreshing provider credentials");
        let dns = self.dns.refresh_credentials().await;
        let elb = self.elb.refresh_credentials().await;

        match dns.and(elb) {
            Ok(()) => {
                self.refresh_pending = false;
                metrics::record_credential_refresh(true);
            }
            Err(e) => {
                error!("Credential refresh failed, will retry before the next cycle: {}", e);
                metrics::record_credential_refresh(false);
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
