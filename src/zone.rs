// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosted zone resolution.
//!
//! A domain can sit under both an apex zone (`example.com.`) and a delegated
//! sub-zone (`team.example.com.`). Records always land in the most specific
//! zone the account manages, i.e. the longest zone name that is a suffix of the
//! canonical domain.

use crate::constants::HOSTED_ZONE_ID_PREFIX;
use crate::dns_errors::SyncError;
use crate::domain::{canonicalize, get_tld};
use crate::provider::{DnsProvider, HostedZone};
use tracing::debug;

/// Pick the zone that most specifically owns `domain`.
///
/// # Errors
///
/// Returns [`SyncError::NoMatchingZone`] when `zones` is empty or no zone name
/// is a suffix of the canonical domain.
///
/// # Example
///
/// ```rust
/// use kube_route53_dns::provider::HostedZone;
/// use kube_route53_dns::zone::find_most_specific_zone;
///
/// let zones = vec![
///     HostedZone::new("Z1", "demo.com."),
///     HostedZone::new("Z2", "sub.demo.com."),
/// ];
/// let zone = find_most_specific_zone("test.sub.demo.com", &zones).unwrap();
/// assert_eq!(zone.name, "sub.demo.com.");
/// ```
pub fn find_most_specific_zone<'a>(
    domain: &str,
    zones: &'a [HostedZone],
) -> Result<&'a HostedZone, SyncError> {
    let domain = canonicalize(domain);

    zones
        .iter()
        .filter(|zone| domain.ends_with(zone.name.as_str()))
        .max_by_key(|zone| zone.name.len())
        .ok_or(SyncError::NoMatchingZone { domain })
}

/// Strip the `/hostedzone/` path prefix from a zone identifier.
#[must_use]
pub fn normalize_zone_id(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_ID_PREFIX).unwrap_or(id)
}

/// Look up the most specific hosted zone for `domain` through the provider.
///
/// Zones are listed starting at the domain's two right-most labels.
///
/// # Errors
///
/// Returns [`SyncError::InvalidDomain`] for domains with fewer than three
/// labels, [`SyncError::ZoneLookupFailed`] when listing fails, and
/// [`SyncError::NoMatchingZone`] when no listed zone owns the domain.
pub async fn resolve_zone<D>(dns: &D, domain: &str) -> Result<HostedZone, SyncError>
where
    D: DnsProvider + ?Sized,
{
    let tld = get_tld(domain)?;

    let zones = dns
        .list_hosted_zones_by_name(&tld)
        .await
        .map_err(|source| SyncError::ZoneLookupFailed {
            domain: domain.to_string(),
            source,
        })?;

    debug!(
        domain = %domain,
        tld = %tld,
        candidates = zones.len(),
        "Listed hosted zones"
    );

    let zone = find_most_specific_zone(domain, &zones)?;
    Ok(HostedZone {
        id: normalize_zone_id(&zone.id).to_string(),
        name: zone.name.clone(),
    })
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
