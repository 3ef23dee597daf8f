// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Route53 sync controller.
//!
//! This module provides specialized error types for:
//! - Per-domain reconciliation failures (recoverable, retried next cycle)
//! - Route53 and ELB API failures
//! - Startup failures that abort the process before the loop starts
//! - Reasons a cluster resource was skipped during collection

use thiserror::Error;

/// Provider error codes that indicate stale or invalid credentials.
///
/// Only these codes schedule a credential refresh. Everything else is retried
/// with the current credentials on the next cycle.
pub const AUTH_ERROR_CODES: &[&str] = &[
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "InvalidSignatureException",
    "AuthFailure",
];

/// A failed call to the DNS or load balancer provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed{}: {message}", .code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct ProviderError {
    /// Provider operation that failed (e.g., `ChangeResourceRecordSets`)
    pub operation: &'static str,
    /// Provider error code, when the provider returned one
    pub code: Option<String>,
    /// Human-readable failure description
    pub message: String,
}

impl ProviderError {
    /// Create a provider error with an optional error code.
    pub fn new(operation: &'static str, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Returns true when the provider rejected the call because of credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| AUTH_ERROR_CODES.contains(&code))
    }
}

/// Errors that can occur while reconciling a single domain.
///
/// Every variant is recoverable: the domain is skipped for the current cycle
/// and retried on the next one, since desired state is rebuilt from scratch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Domain has fewer than three labels
    #[error(
        "Domain {domain} is invalid - it should be a fully qualified domain name and subdomain (i.e. test.example.com)"
    )]
    InvalidDomain {
        /// The rejected domain
        domain: String,
    },

    /// Listing hosted zones failed
    #[error("Hosted zone lookup for {domain} failed: {source}")]
    ZoneLookupFailed {
        /// Domain being resolved
        domain: String,
        /// Underlying provider failure
        source: ProviderError,
    },

    /// No visible hosted zone is a suffix of the domain
    #[error("No hosted zone matches domain {domain}")]
    NoMatchingZone {
        /// Canonical domain that had no matching zone
        domain: String,
    },

    /// Load balancer hostname does not contain a name segment
    #[error("{hostname} is not a valid ELB hostname")]
    MalformedEndpointHostname {
        /// The hostname that could not be parsed
        hostname: String,
    },

    /// Describing the load balancer failed
    #[error("Could not describe load balancer {name}: {source}")]
    EndpointLookupFailed {
        /// Load balancer name extracted from the hostname
        name: String,
        /// Underlying provider failure
        source: ProviderError,
    },

    /// The provider returned no load balancer for the name
    #[error("No load balancer found with name {name}")]
    EndpointNotFound {
        /// Load balancer name extracted from the hostname
        name: String,
    },

    /// The provider returned more than one load balancer for the name
    #[error("Multiple load balancers ({count}) found with name {name}")]
    AmbiguousEndpoint {
        /// Load balancer name extracted from the hostname
        name: String,
        /// Number of descriptions returned
        count: usize,
    },

    /// An alias record was requested without a resolved load balancer
    #[error("Alias record for {domain} requires a resolved load balancer endpoint")]
    MissingAliasTarget {
        /// Domain whose record could not be built
        domain: String,
    },

    /// The provider rejected or failed the upsert
    #[error("Failed to update record set {domain} in zone {zone_id}: {source}")]
    WriteFailed {
        /// Domain being written
        domain: String,
        /// Hosted zone the write targeted
        zone_id: String,
        /// Underlying provider failure
        source: ProviderError,
    },
}

impl SyncError {
    /// Pipeline stage the error was raised in, used for logs and metrics.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidDomain { .. } => "validate",
            Self::ZoneLookupFailed { .. } | Self::NoMatchingZone { .. } => "resolve_zone",
            Self::MalformedEndpointHostname { .. }
            | Self::EndpointLookupFailed { .. }
            | Self::EndpointNotFound { .. }
            | Self::AmbiguousEndpoint { .. } => "resolve_endpoint",
            Self::MissingAliasTarget { .. } => "build",
            Self::WriteFailed { .. } => "upsert",
        }
    }

    /// Returns true when the failure should trigger a credential refresh.
    ///
    /// Only a write rejected with an authentication error code qualifies.
    #[must_use]
    pub fn requires_credential_refresh(&self) -> bool {
        matches!(self, Self::WriteFailed { source, .. } if source.is_auth_failure())
    }
}

/// Why a cluster resource contributed no desired bindings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The resource has no `domainName` annotation
    #[error("Domain name not set")]
    MissingDomainName,

    /// The backing service has no assigned load balancer endpoint
    #[error("No ingress defined for ELB")]
    NoEndpoint,

    /// The backing service has more than one assigned endpoint
    #[error("Multiple ingress points ({0}) found for ELB, not supported")]
    MultipleEndpoints(usize),

    /// The assigned endpoint carries an IP address but no hostname
    #[error("Load balancer endpoint has no hostname")]
    EndpointWithoutHostname,
}

impl SkipReason {
    /// Short label used for metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingDomainName => "missing_domain_name",
            Self::NoEndpoint => "no_endpoint",
            Self::MultipleEndpoints(_) => "multiple_endpoints",
            Self::EndpointWithoutHostname => "endpoint_without_hostname",
        }
    }
}

/// Fatal initialization errors.
///
/// These abort the process before the reconciliation loop starts.
#[derive(Error, Debug)]
pub enum StartupError {
    /// A label selector could not be parsed
    #[error("Failed to parse selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector as given
        selector: String,
        /// What is wrong with it
        reason: String,
    },

    /// The Kubernetes client could not be constructed
    #[error("Failed to create Kubernetes client: {0}")]
    KubeClient(#[from] kube::Error),

    /// No AWS region could be determined
    #[error("Unable to determine the AWS region; set AWS_REGION or --region")]
    MissingRegion,

    /// The metrics listener could not be bound
    #[error("Failed to bind metrics listener on {addr}: {source}")]
    MetricsBind {
        /// Requested listen address
        addr: std::net::SocketAddr,
        /// Underlying IO failure
        source: std::io::Error,
    },
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
