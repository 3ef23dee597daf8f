// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load balancer endpoint resolution.
//!
//! Alias records need the canonical hosted zone id of the load balancer they
//! point at. The load balancer is found by the name encoded in the hostname the
//! cluster assigned to the service, e.g.
//! `testpublic-1111111111.us-east-1.elb.amazonaws.com` for `testpublic` and
//! `internal-testinternal-2222222222.us-east-1.elb.amazonaws.com` for the
//! internally-scoped `testinternal`.

use crate::constants::{INTERNAL_LOAD_BALANCER_MARKER, LOAD_BALANCER_HOSTNAME_SEPARATOR};
use crate::dns_errors::SyncError;
use crate::provider::LoadBalancerProvider;
use tracing::debug;

/// The load balancer an alias record points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerEndpoint {
    /// Canonical hosted zone id of the load balancer
    pub zone_id: String,
    /// DNS name of the load balancer
    pub dns_name: String,
}

/// Extract the load balancer name from its assigned hostname.
///
/// # Errors
///
/// Returns [`SyncError::MalformedEndpointHostname`] when the hostname has fewer
/// than two `-`-separated segments.
///
/// # Example
///
/// ```rust
/// use kube_route53_dns::endpoint::extract_load_balancer_name;
///
/// let name = extract_load_balancer_name(
///     "internal-testinternal-2222222222.us-east-1.elb.amazonaws.com",
/// )
/// .unwrap();
/// assert_eq!(name, "testinternal");
/// ```
pub fn extract_load_balancer_name(hostname: &str) -> Result<&str, SyncError> {
    let segments: Vec<&str> = hostname.split(LOAD_BALANCER_HOSTNAME_SEPARATOR).collect();
    if segments.len() < 2 {
        return Err(SyncError::MalformedEndpointHostname {
            hostname: hostname.to_string(),
        });
    }

    if segments[0] == INTERNAL_LOAD_BALANCER_MARKER {
        Ok(segments[1])
    } else {
        Ok(segments[0])
    }
}

/// Resolve the load balancer behind `hostname` to its alias target.
///
/// # Errors
///
/// Returns [`SyncError::MalformedEndpointHostname`] for unparsable hostnames,
/// [`SyncError::EndpointLookupFailed`] when the provider call fails,
/// [`SyncError::EndpointNotFound`] when no load balancer (or no canonical zone
/// id) is returned, and [`SyncError::AmbiguousEndpoint`] when several are.
pub async fn resolve_endpoint<L>(
    elb: &L,
    hostname: &str,
) -> Result<LoadBalancerEndpoint, SyncError>
where
    L: LoadBalancerProvider + ?Sized,
{
    let name = extract_load_balancer_name(hostname)?;

    let mut descriptions = elb.describe_load_balancers(name).await.map_err(|source| {
        SyncError::EndpointLookupFailed {
            name: name.to_string(),
            source,
        }
    })?;

    let description = match descriptions.len() {
        0 => {
            return Err(SyncError::EndpointNotFound {
                name: name.to_string(),
            })
        }
        1 => descriptions.remove(0),
        count => {
            return Err(SyncError::AmbiguousEndpoint {
                name: name.to_string(),
                count,
            })
        }
    };

    let zone_id = description
        .canonical_hosted_zone_id
        .ok_or_else(|| SyncError::EndpointNotFound {
            name: name.to_string(),
        })?;

    debug!(
        hostname = %hostname,
        load_balancer = %name,
        zone_id = %zone_id,
        "Resolved load balancer endpoint"
    );

    Ok(LoadBalancerEndpoint {
        zone_id,
        dns_name: description
            .dns_name
            .unwrap_or_else(|| hostname.to_string()),
    })
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod endpoint_tests;
