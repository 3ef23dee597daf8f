// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Route53 sync controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Record Constants
// ============================================================================

/// Default TTL for DNS records (5 minutes)
pub const DEFAULT_DNS_RECORD_TTL_SECS: u32 = 300;

/// Minimum number of dot-separated labels a managed domain must have
/// (subdomain + second-level + top-level)
pub const MIN_DOMAIN_LABELS: usize = 3;

/// Number of right-most labels used as the hosted-zone listing start point
pub const ZONE_LOOKUP_LABELS: usize = 2;

// ============================================================================
// Route53 Constants
// ============================================================================

/// Comment attached to every change batch
pub const CHANGE_BATCH_COMMENT: &str = "Kubernetes Update to Service";

/// Path prefix Route53 puts in front of hosted zone identifiers
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// Page size used when listing hosted zones by name
pub const HOSTED_ZONE_PAGE_SIZE: i32 = 100;

/// Number of record sets read by the existence check
pub const EXISTENCE_CHECK_MAX_ITEMS: i32 = 1;

// ============================================================================
// Load Balancer Constants
// ============================================================================

/// Leading hostname segment that marks an internally-scoped load balancer
pub const INTERNAL_LOAD_BALANCER_MARKER: &str = "internal";

/// Separator between the load balancer name and the rest of its hostname
pub const LOAD_BALANCER_HOSTNAME_SEPARATOR: char = '-';

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Fixed sleep between reconciliation cycles (30 seconds)
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

// ============================================================================
// Kubernetes API Constants
// ============================================================================

/// Page size for Kubernetes API list operations
///
/// Limits memory usage when listing large numbers of services or ingresses.
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Thread name used by the Tokio runtime
pub const RUNTIME_THREAD_NAME: &str = "route53-sync";

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint
pub const HEALTH_SERVER_PATH: &str = "/healthz";

/// Content type of the Prometheus text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
