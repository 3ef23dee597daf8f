// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record set construction.
//!
//! Builders are pure: they turn a resolved zone, a domain, its desired binding,
//! and (for alias records) the resolved load balancer into the record set that
//! is handed to the provider. Each [`RecordType`] variant has its own builder.

use crate::desired::{DesiredBinding, RecordType};
use crate::dns_errors::SyncError;
use crate::domain::{record_name, same_host};
use crate::endpoint::LoadBalancerEndpoint;
use serde::Serialize;

/// Alias target of an alias record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    /// Hosted zone id of the aliased resource
    pub hosted_zone_id: String,
    /// DNS name of the aliased resource
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    /// Whether the provider evaluates target health
    pub evaluate_target_health: bool,
}

/// Provider-shaped description of a record set.
///
/// Also used for record sets read back from the provider, so `record_type` is
/// the provider's type token rather than [`RecordType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordSet {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_records: Vec<String>,
}

impl RecordSet {
    /// Returns true when `existing` already points where this record points.
    ///
    /// Names and targets are compared case-insensitively, ignoring a trailing
    /// dot, since the provider returns them in canonical form.
    #[must_use]
    pub fn matches(&self, existing: &RecordSet) -> bool {
        if !same_host(&self.name, &existing.name) || self.record_type != existing.record_type {
            return false;
        }

        match (&self.alias_target, &existing.alias_target) {
            (Some(want), Some(have)) => {
                want.hosted_zone_id == have.hosted_zone_id
                    && same_host(&want.dns_name, &have.dns_name)
            }
            (None, None) => {
                self.ttl == existing.ttl
                    && self.resource_records.len() == existing.resource_records.len()
                    && self
                        .resource_records
                        .iter()
                        .zip(&existing.resource_records)
                        .all(|(want, have)| same_host(want, have))
            }
            _ => false,
        }
    }
}

/// A record set bound to the zone it is written into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    /// Normalized hosted zone id
    pub zone_id: String,
    /// Record set to upsert
    pub record: RecordSet,
}

/// Build an alias `A` record pointing `domain` at a load balancer.
///
/// Target health evaluation is always disabled.
#[must_use]
pub fn build_alias_a_record(domain: &str, endpoint: &LoadBalancerEndpoint) -> RecordSet {
    RecordSet {
        name: record_name(domain).to_string(),
        record_type: RecordType::AliasA.as_str().to_string(),
        ttl: None,
        alias_target: Some(AliasTarget {
            hosted_zone_id: endpoint.zone_id.clone(),
            dns_name: endpoint.dns_name.clone(),
            evaluate_target_health: false,
        }),
        resource_records: Vec::new(),
    }
}

/// Build a `CNAME` record pointing `domain` at `target`.
#[must_use]
pub fn build_cname_record(domain: &str, target: &str, ttl: u32) -> RecordSet {
    RecordSet {
        name: record_name(domain).to_string(),
        record_type: RecordType::Cname.as_str().to_string(),
        ttl: Some(i64::from(ttl)),
        alias_target: None,
        resource_records: vec![target.to_string()],
    }
}

/// Build the change for `domain` in zone `zone_id`.
///
/// # Errors
///
/// Returns [`SyncError::MissingAliasTarget`] when the binding asks for an alias
/// record and no load balancer endpoint was resolved.
pub fn build_record_set(
    zone_id: &str,
    domain: &str,
    binding: &DesiredBinding,
    endpoint: Option<&LoadBalancerEndpoint>,
) -> Result<PlannedChange, SyncError> {
    let record = match binding.record_type {
        RecordType::AliasA => {
            let endpoint = endpoint.ok_or_else(|| SyncError::MissingAliasTarget {
                domain: domain.to_string(),
            })?;
            build_alias_a_record(domain, endpoint)
        }
        RecordType::Cname => build_cname_record(domain, &binding.target_hostname, binding.ttl),
    };

    Ok(PlannedChange {
        zone_id: zone_id.to_string(),
        record,
    })
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
