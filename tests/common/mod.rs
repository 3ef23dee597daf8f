// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory cluster and provider fakes shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_route53_dns::cluster::ClusterSource;
use kube_route53_dns::dns_errors::ProviderError;
use kube_route53_dns::provider::{
    DnsProvider, HostedZone, LoadBalancerDescription, LoadBalancerProvider,
};
use kube_route53_dns::records::RecordSet;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const WEB_ELB: &str = "web-1111111111.us-east-1.elb.amazonaws.com";
pub const API_ELB: &str = "api-3333333333.us-east-1.elb.amazonaws.com";
pub const INGRESS_ELB: &str = "internal-nginx-2222222222.us-east-1.elb.amazonaws.com";
pub const ELB_ZONE_ID: &str = "Z35SXDOTRQ7X7K";

// ============================================================================
// Resource builders
// ============================================================================

fn metadata(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        annotations: Some(
            annotations
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

/// A `LoadBalancer` service with a single hostname endpoint.
pub fn lb_service(name: &str, annotations: &[(&str, &str)], hostname: &str) -> Service {
    Service {
        metadata: metadata("default", name, annotations),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    hostname: Some(hostname.to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn annotated_ingress(name: &str, annotations: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: metadata("default", name, annotations),
        ..Default::default()
    }
}

/// Classic ELB description as returned by `DescribeLoadBalancers`.
pub fn elb(name: &str, dns_name: &str) -> LoadBalancerDescription {
    LoadBalancerDescription {
        name: Some(name.to_string()),
        dns_name: Some(dns_name.to_string()),
        canonical_hosted_zone_id: Some(ELB_ZONE_ID.to_string()),
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// Cluster returning canned services per label selector.
#[derive(Default)]
pub struct FakeCluster {
    services: BTreeMap<String, Vec<Service>>,
    ingresses: Vec<Ingress>,
    fail_services: bool,
}

impl FakeCluster {
    pub fn with_services(mut self, selector: &str, services: Vec<Service>) -> Self {
        self.services.insert(selector.to_string(), services);
        self
    }

    pub fn with_ingresses(mut self, ingresses: Vec<Ingress>) -> Self {
        self.ingresses = ingresses;
        self
    }

    /// Cluster whose service listing always fails.
    pub fn failing() -> Self {
        Self {
            fail_services: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ClusterSource for FakeCluster {
    async fn list_services(&self, selector: &str) -> Result<Vec<Service>> {
        if self.fail_services {
            return Err(anyhow!("the server is currently unable to handle the request"));
        }
        Ok(self.services.get(selector).cloned().unwrap_or_default())
    }

    async fn list_ingresses(&self, _selector: &str) -> Result<Vec<Ingress>> {
        Ok(self.ingresses.clone())
    }
}

// ============================================================================
// Route53
// ============================================================================

/// One recorded `UPSERT` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub zone_id: String,
    pub record: RecordSet,
    pub comment: String,
}

/// Route53 stand-in holding record sets in memory.
///
/// Record sets are kept sorted by name per zone, and listing returns the
/// record sets at or after the start name, like `ListResourceRecordSets`.
#[derive(Default)]
pub struct FakeRoute53 {
    zones: Vec<HostedZone>,
    records: Mutex<BTreeMap<(String, String), RecordSet>>,
    upserts: Mutex<Vec<Upsert>>,
    write_failure: Mutex<Option<ProviderError>>,
    refreshes: Mutex<usize>,
}

impl FakeRoute53 {
    pub fn with_zones(zones: &[(&str, &str)]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|(id, name)| HostedZone::new(*id, *name))
                .collect(),
            ..Self::default()
        }
    }

    /// Seed an existing record set.
    pub fn with_record(self, zone_id: &str, record: RecordSet) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert((zone_id.to_string(), record.name.clone()), record);
        self
    }

    /// Fail every write with `code` until credentials are refreshed.
    pub fn fail_writes_until_refresh(&self, code: &str) {
        *self.write_failure.lock().unwrap() = Some(ProviderError::new(
            "ChangeResourceRecordSets",
            Some(code.to_string()),
            "The security token included in the request is expired",
        ));
    }

    pub fn upserts(&self) -> Vec<Upsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn upserted_names(&self) -> Vec<String> {
        self.upserts()
            .into_iter()
            .map(|upsert| upsert.record.name)
            .collect()
    }

    pub fn record(&self, zone_id: &str, name: &str) -> Option<RecordSet> {
        self.records
            .lock()
            .unwrap()
            .get(&(zone_id.to_string(), name.to_string()))
            .cloned()
    }

    pub fn refreshes(&self) -> usize {
        *self.refreshes.lock().unwrap()
    }
}

#[async_trait]
impl DnsProvider for FakeRoute53 {
    async fn list_hosted_zones_by_name(
        &self,
        _dns_name: &str,
    ) -> Result<Vec<HostedZone>, ProviderError> {
        Ok(self.zones.clone())
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start_record_name: &str,
        max_items: i32,
    ) -> Result<Vec<RecordSet>, ProviderError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|((zone, name), _)| zone == zone_id && name.as_str() >= start_record_name)
            .take(usize::try_from(max_items).unwrap_or(0))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record: &RecordSet,
        comment: &str,
    ) -> Result<(), ProviderError> {
        if let Some(err) = self.write_failure.lock().unwrap().clone() {
            return Err(err);
        }

        self.records.lock().unwrap().insert(
            (zone_id.to_string(), record.name.clone()),
            record.clone(),
        );
        self.upserts.lock().unwrap().push(Upsert {
            zone_id: zone_id.to_string(),
            record: record.clone(),
            comment: comment.to_string(),
        });
        Ok(())
    }

    async fn refresh_credentials(&mut self) -> Result<(), ProviderError> {
        *self.refreshes.lock().unwrap() += 1;
        *self.write_failure.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// ELB
// ============================================================================

/// Classic ELB stand-in keyed by load balancer name.
#[derive(Default)]
pub struct FakeElb {
    load_balancers: BTreeMap<String, Vec<LoadBalancerDescription>>,
    lookups: Mutex<Vec<String>>,
}

impl FakeElb {
    pub fn with(mut self, name: &str, descriptions: Vec<LoadBalancerDescription>) -> Self {
        self.load_balancers.insert(name.to_string(), descriptions);
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoadBalancerProvider for FakeElb {
    async fn describe_load_balancers(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>, ProviderError> {
        self.lookups.lock().unwrap().push(name.to_string());
        Ok(self.load_balancers.get(name).cloned().unwrap_or_default())
    }
}
