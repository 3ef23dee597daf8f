// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired state collection from annotated cluster resources.
//!
//! Every cycle rebuilds a mapping from domain to [`DesiredBinding`] out of:
//!
//! 1. Services matching the DNS selector, targeting their own load balancer
//! 2. Ingresses matching the DNS selector, targeting the load balancer of the
//!    shared ingress controller service
//!
//! When a domain is declared more than once, the binding collected last wins,
//! so ingress declarations override service declarations.

use crate::cluster::ClusterSource;
use crate::config::SyncConfig;
use crate::constants::DEFAULT_DNS_RECORD_TTL_SECS;
use crate::dns_errors::SkipReason;
use crate::labels::{
    ANNOTATION_DNS_RECORD_TTL, ANNOTATION_DNS_RECORD_TYPE, ANNOTATION_DOMAIN_NAME, KIND_INGRESS,
    KIND_SERVICE,
};
use anyhow::Result;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Record type requested for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Alias `A` record pointing at a load balancer
    AliasA,
    /// Canonical name record pointing at the target hostname
    Cname,
}

impl RecordType {
    /// Provider type token for this record type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AliasA => "A",
            Self::Cname => "CNAME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type token outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported DNS record type {0:?} (expected A or CNAME)")]
pub struct UnknownRecordType(pub String);

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    /// Only the exact tokens `A` and `CNAME` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::AliasA),
            "CNAME" => Ok(Self::Cname),
            _ => Err(UnknownRecordType(s.to_string())),
        }
    }
}

/// Record type and TTL applied when a resource does not declare valid ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDefaults {
    pub record_type: RecordType,
    pub ttl: u32,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            record_type: RecordType::AliasA,
            ttl: DEFAULT_DNS_RECORD_TTL_SECS,
        }
    }
}

/// Cluster resource a binding or skip was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    /// Reference a resource by kind and metadata.
    pub fn from_resource<K: ResourceExt>(kind: &'static str, resource: &K) -> Self {
        Self {
            kind,
            namespace: resource.namespace().unwrap_or_default(),
            name: resource.name_any(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Desired DNS state for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredBinding {
    /// Domain as declared in the annotation
    pub domain: String,
    /// Hostname assigned to the backing load balancer
    pub target_hostname: String,
    pub record_type: RecordType,
    /// TTL in seconds (only written for `CNAME` records)
    pub ttl: u32,
    /// Resource that declared the domain
    pub source: ResourceRef,
}

/// A resource that contributed no bindings this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedResource {
    pub resource: ResourceRef,
    pub reason: SkipReason,
}

/// Desired state collected in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    /// Bindings keyed by declared domain
    pub bindings: BTreeMap<String, DesiredBinding>,
    /// Resources that were skipped, in collection order
    pub skipped: Vec<SkippedResource>,
}

impl DesiredState {
    /// Merge one annotated resource into the state.
    ///
    /// `target` is the hostname of the load balancer backing the resource, or
    /// the reason it could not be determined.
    pub fn add_resource(
        &mut self,
        resource: ResourceRef,
        annotations: &BTreeMap<String, String>,
        target: Result<&str, &SkipReason>,
        defaults: &RecordDefaults,
    ) {
        let domains = annotations
            .get(ANNOTATION_DOMAIN_NAME)
            .map(|value| parse_domains(value))
            .unwrap_or_default();

        if domains.is_empty() {
            self.skip(resource, SkipReason::MissingDomainName);
            return;
        }

        let target = match target {
            Ok(hostname) => hostname,
            Err(reason) => {
                self.skip(resource, reason.clone());
                return;
            }
        };

        let record_type = record_type_from_annotations(annotations, defaults.record_type);
        let ttl = ttl_from_annotations(annotations, defaults.ttl);

        for domain in domains {
            debug!(
                domain = %domain,
                resource = %resource,
                target = %target,
                record_type = %record_type,
                ttl = ttl,
                "Collected desired binding"
            );
            let binding = DesiredBinding {
                domain: domain.clone(),
                target_hostname: target.to_string(),
                record_type,
                ttl,
                source: resource.clone(),
            };
            if let Some(previous) = self.bindings.insert(domain.clone(), binding) {
                debug!(
                    domain = %domain,
                    previous = %previous.source,
                    current = %resource,
                    "Domain declared more than once, keeping the latest declaration"
                );
            }
        }
    }

    fn skip(&mut self, resource: ResourceRef, reason: SkipReason) {
        warn!("Skipping {}: {}", resource, reason);
        self.skipped.push(SkippedResource { resource, reason });
    }
}

/// Split a `domainName` annotation into its domains.
///
/// Entries are trimmed and empty entries dropped.
#[must_use]
pub fn parse_domains(annotation: &str) -> Vec<String> {
    annotation
        .split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a TTL value, accepting only positive integers without surrounding
/// whitespace.
#[must_use]
pub fn parse_ttl(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|ttl| *ttl > 0)
}

fn record_type_from_annotations(
    annotations: &BTreeMap<String, String>,
    default: RecordType,
) -> RecordType {
    annotations
        .get(ANNOTATION_DNS_RECORD_TYPE)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn ttl_from_annotations(annotations: &BTreeMap<String, String>, default: u32) -> u32 {
    annotations
        .get(ANNOTATION_DNS_RECORD_TTL)
        .and_then(|value| parse_ttl(value))
        .unwrap_or(default)
}

/// Hostname of the single load balancer endpoint assigned to a service.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the service has no endpoint, several
/// endpoints, or an endpoint without a hostname.
pub fn endpoint_hostname(service: &Service) -> Result<String, SkipReason> {
    let ingress = service
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_deref())
        .unwrap_or_default();

    match ingress {
        [] => Err(SkipReason::NoEndpoint),
        [only] => only
            .hostname
            .clone()
            .filter(|hostname| !hostname.is_empty())
            .ok_or(SkipReason::EndpointWithoutHostname),
        many => Err(SkipReason::MultipleEndpoints(many.len())),
    }
}

/// Collect the desired state for one cycle.
///
/// # Errors
///
/// Returns an error when services cannot be listed. Failures while collecting
/// ingress declarations are logged and leave the service bindings in place.
pub async fn collect_desired_state<C>(cluster: &C, config: &SyncConfig) -> Result<DesiredState>
where
    C: ClusterSource + ?Sized,
{
    let mut state = DesiredState::default();

    let services = cluster.list_services(&config.service_selector).await?;
    info!(
        "Found {} DNS services in all namespaces with selector {}",
        services.len(),
        config.service_selector
    );

    for service in &services {
        let target = endpoint_hostname(service);
        state.add_resource(
            ResourceRef::from_resource(KIND_SERVICE, service),
            service.annotations(),
            target.as_deref(),
            &config.record_defaults,
        );
    }

    collect_ingress_bindings(cluster, config, &mut state).await;

    Ok(state)
}

async fn collect_ingress_bindings<C>(cluster: &C, config: &SyncConfig, state: &mut DesiredState)
where
    C: ClusterSource + ?Sized,
{
    let Some(ingress_service) = find_ingress_service(cluster, config).await else {
        return;
    };

    let ingresses = match cluster.list_ingresses(&config.service_selector).await {
        Ok(ingresses) => ingresses,
        Err(e) => {
            warn!("Failed to list ingress: {:#}", e);
            return;
        }
    };
    info!("Found {} DNS ingress in all namespaces", ingresses.len());

    let target = endpoint_hostname(&ingress_service);
    for ingress in &ingresses {
        state.add_resource(
            ResourceRef::from_resource(KIND_INGRESS, ingress),
            ingress.annotations(),
            target.as_deref(),
            &config.record_defaults,
        );
    }
}

/// First service matching the ingress service selector.
async fn find_ingress_service<C>(cluster: &C, config: &SyncConfig) -> Option<Service>
where
    C: ClusterSource + ?Sized,
{
    let selector = &config.ingress_service_selector;
    debug!("Using selector {} to find service for ingress", selector);

    let mut services = match cluster.list_services(selector).await {
        Ok(services) => services,
        Err(e) => {
            warn!("Failed to list ingress services with selector {}: {:#}", selector, e);
            return None;
        }
    };

    if services.is_empty() {
        info!(
            "Ingress controller not installed or ingress service selector {} is not valid. SKIP",
            selector
        );
        return None;
    }

    if services.len() > 1 {
        warn!(
            "{} services match ingress service selector {}, using the first",
            services.len(),
            selector
        );
    }

    let service = services.swap_remove(0);
    info!(
        "For ingress use service: {}",
        ResourceRef::from_resource(KIND_SERVICE, &service)
    );
    Some(service)
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
