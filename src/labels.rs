// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation keys and label selectors read from cluster resources.
//!
//! Operators declare the desired public hostname of a service or ingress through
//! annotations. The keys below are the complete set this controller understands.

// ============================================================================
// Annotations
// ============================================================================

/// Comma-separated list of fully qualified domain names (required)
pub const ANNOTATION_DOMAIN_NAME: &str = "domainName";

/// Record type token for the declared domains (optional, `A` or `CNAME`)
pub const ANNOTATION_DNS_RECORD_TYPE: &str = "dnsRecordType";

/// Record TTL in seconds for the declared domains (optional, positive integer)
pub const ANNOTATION_DNS_RECORD_TTL: &str = "dnsRecordTTL";

// ============================================================================
// Label Selectors
// ============================================================================

/// Selector for services and ingresses eligible for DNS management
pub const DEFAULT_SERVICE_SELECTOR: &str = "dns=route53";

/// Selector for the service backing the ingress controller
pub const DEFAULT_INGRESS_SERVICE_SELECTOR: &str = "ingress=endpoint";

// ============================================================================
// Resource Kinds
// ============================================================================

/// Kind reported for service-declared domains
pub const KIND_SERVICE: &str = "Service";

/// Kind reported for ingress-declared domains
pub const KIND_INGRESS: &str = "Ingress";
