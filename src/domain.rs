// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain name helpers shared by zone resolution and record building.

use crate::constants::{MIN_DOMAIN_LABELS, ZONE_LOOKUP_LABELS};
use crate::dns_errors::SyncError;

/// Normalize a domain to its trailing-dot canonical form.
///
/// Idempotent: a domain that already ends with a dot is returned unchanged.
///
/// # Example
///
/// ```rust
/// use kube_route53_dns::domain::canonicalize;
///
/// assert_eq!(canonicalize("www.example.com"), "www.example.com.");
/// assert_eq!(canonicalize("www.example.com."), "www.example.com.");
/// ```
#[must_use]
pub fn canonicalize(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}

/// Return the two right-most labels of a domain.
///
/// The result is where hosted-zone listing starts for the domain.
///
/// # Errors
///
/// Returns [`SyncError::InvalidDomain`] when the domain has fewer than three
/// dot-separated labels.
///
/// # Example
///
/// ```rust
/// use kube_route53_dns::domain::get_tld;
///
/// assert_eq!(get_tld("a.b.c").unwrap(), "b.c");
/// assert!(get_tld("x.y").is_err());
/// ```
pub fn get_tld(domain: &str) -> Result<String, SyncError> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < MIN_DOMAIN_LABELS {
        return Err(SyncError::InvalidDomain {
            domain: domain.to_string(),
        });
    }
    Ok(labels[labels.len() - ZONE_LOOKUP_LABELS..].join("."))
}

/// Name written into the record set: the domain without leading dots.
#[must_use]
pub fn record_name(domain: &str) -> &str {
    domain.trim_start_matches('.')
}

/// Compare two host names ignoring ASCII case and a trailing dot.
#[must_use]
pub fn same_host(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod domain_tests;
