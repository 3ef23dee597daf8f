// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Collaborator interfaces for the DNS and load balancer providers.
//!
//! The reconciler only talks to the outside world through these traits. The
//! production implementations live in [`crate::aws`]; tests substitute
//! in-memory implementations.
//!
//! # Architecture
//!
//! - [`DnsProvider`] - hosted zone listing, record set reads, and upserts
//! - [`LoadBalancerProvider`] - load balancer lookup by name
//!
//! Both expose `refresh_credentials`, which the reconciler only calls between
//! cycles, never while a write is in flight.

use crate::dns_errors::ProviderError;
use crate::records::RecordSet;
use async_trait::async_trait;

/// A hosted zone visible to the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Provider identifier, possibly carrying a `/hostedzone/` prefix
    pub id: String,
    /// Dot-terminated zone name (e.g., `example.com.`)
    pub name: String,
}

impl HostedZone {
    /// Create a hosted zone view.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A load balancer as described by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancerDescription {
    /// Load balancer name
    pub name: Option<String>,
    /// Public DNS name assigned by the provider
    pub dns_name: Option<String>,
    /// Hosted zone id used as the alias target zone
    pub canonical_hosted_zone_id: Option<String>,
}

/// Accessor for the DNS provider.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List hosted zones in name order, starting at `dns_name`.
    ///
    /// Implementations return every zone whose name ends with `dns_name`; they
    /// may return additional zones past that point.
    async fn list_hosted_zones_by_name(
        &self,
        dns_name: &str,
    ) -> Result<Vec<HostedZone>, ProviderError>;

    /// List up to `max_items` record sets starting at `start_record_name`.
    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start_record_name: &str,
        max_items: i32,
    ) -> Result<Vec<RecordSet>, ProviderError>;

    /// Create or replace a record set in a single-change batch.
    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record: &RecordSet,
        comment: &str,
    ) -> Result<(), ProviderError>;

    /// Reload credentials before the next cycle.
    async fn refresh_credentials(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Accessor for the load balancer provider.
#[async_trait]
pub trait LoadBalancerProvider: Send + Sync {
    /// Describe load balancers by name.
    ///
    /// A name that does not exist yields an empty list rather than an error.
    async fn describe_load_balancers(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>, ProviderError>;

    /// Reload credentials before the next cycle.
    async fn refresh_credentials(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }
}
