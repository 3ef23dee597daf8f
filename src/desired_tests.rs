// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `desired.rs`

use crate::cluster::ClusterSource;
use crate::config::SyncConfig;
use crate::desired::{
    collect_desired_state, endpoint_hostname, parse_domains, parse_ttl, DesiredState,
    RecordDefaults, RecordType, ResourceRef,
};
use crate::dns_errors::SkipReason;
use crate::labels::{KIND_INGRESS, KIND_SERVICE};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

const WEB_ELB: &str = "web-1111111111.us-east-1.elb.amazonaws.com";
const INGRESS_ELB: &str = "internal-nginx-2222222222.us-east-1.elb.amazonaws.com";

fn metadata(name: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some("default".to_string()),
        annotations: Some(
            annotations
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

fn lb_ingress(hostname: Option<&str>, ip: Option<&str>) -> LoadBalancerIngress {
    LoadBalancerIngress {
        hostname: hostname.map(str::to_string),
        ip: ip.map(str::to_string),
        ..Default::default()
    }
}

fn service(name: &str, annotations: &[(&str, &str)], endpoints: Vec<LoadBalancerIngress>) -> Service {
    Service {
        metadata: metadata(name, annotations),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(endpoints),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn ingress(name: &str, annotations: &[(&str, &str)]) -> Ingress {
    Ingress {
        metadata: metadata(name, annotations),
        ..Default::default()
    }
}

fn service_ref(name: &str) -> ResourceRef {
    ResourceRef {
        kind: KIND_SERVICE,
        namespace: "default".to_string(),
        name: name.to_string(),
    }
}

fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Cluster returning canned services per selector.
#[derive(Default)]
struct FakeCluster {
    services: BTreeMap<String, Vec<Service>>,
    ingresses: Vec<Ingress>,
    fail_services: bool,
    fail_ingresses: bool,
}

impl FakeCluster {
    fn with_services(mut self, selector: &str, services: Vec<Service>) -> Self {
        self.services.insert(selector.to_string(), services);
        self
    }

    fn with_ingresses(mut self, ingresses: Vec<Ingress>) -> Self {
        self.ingresses = ingresses;
        self
    }
}

#[async_trait]
impl ClusterSource for FakeCluster {
    async fn list_services(&self, selector: &str) -> Result<Vec<Service>> {
        if self.fail_services {
            return Err(anyhow!("services are forbidden"));
        }
        Ok(self.services.get(selector).cloned().unwrap_or_default())
    }

    async fn list_ingresses(&self, _selector: &str) -> Result<Vec<Ingress>> {
        if self.fail_ingresses {
            return Err(anyhow!("ingresses are forbidden"));
        }
        Ok(self.ingresses.clone())
    }
}

#[test]
fn test_parse_domains() {
    assert_eq!(
        parse_domains("a.demo.com, b.demo.com ,,c.demo.com"),
        vec!["a.demo.com", "b.demo.com", "c.demo.com"]
    );
    assert!(parse_domains("").is_empty());
    assert!(parse_domains(" , ").is_empty());
}

#[test]
fn test_parse_ttl() {
    assert_eq!(parse_ttl("60"), Some(60));
    assert_eq!(parse_ttl(" 120 "), None);
    assert_eq!(parse_ttl("0"), None);
    assert_eq!(parse_ttl("-1"), None);
    assert_eq!(parse_ttl("1m"), None);
}

#[test]
fn test_endpoint_hostname() {
    let single = service("web", &[], vec![lb_ingress(Some(WEB_ELB), None)]);
    assert_eq!(endpoint_hostname(&single).unwrap(), WEB_ELB);

    let none = service("web", &[], vec![]);
    assert_eq!(endpoint_hostname(&none), Err(SkipReason::NoEndpoint));

    let no_status = Service::default();
    assert_eq!(endpoint_hostname(&no_status), Err(SkipReason::NoEndpoint));

    let many = service(
        "web",
        &[],
        vec![lb_ingress(Some(WEB_ELB), None), lb_ingress(Some(INGRESS_ELB), None)],
    );
    assert_eq!(endpoint_hostname(&many), Err(SkipReason::MultipleEndpoints(2)));

    let ip_only = service("web", &[], vec![lb_ingress(None, Some("10.0.0.1"))]);
    assert_eq!(
        endpoint_hostname(&ip_only),
        Err(SkipReason::EndpointWithoutHostname)
    );
}

#[test]
fn test_add_resource_uses_annotations() {
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("web"),
        &annotations(&[
            ("domainName", "www.demo.com,api.demo.com"),
            ("dnsRecordType", "CNAME"),
            ("dnsRecordTTL", "60"),
        ]),
        Ok(WEB_ELB),
        &RecordDefaults::default(),
    );

    assert_eq!(state.bindings.len(), 2);
    let binding = &state.bindings["api.demo.com"];
    assert_eq!(binding.record_type, RecordType::Cname);
    assert_eq!(binding.ttl, 60);
    assert_eq!(binding.target_hostname, WEB_ELB);
    assert_eq!(binding.source, service_ref("web"));
    assert!(state.skipped.is_empty());
}

#[test]
fn test_record_type_tokens_are_exact() {
    assert_eq!("A".parse::<RecordType>(), Ok(RecordType::AliasA));
    assert_eq!("CNAME".parse::<RecordType>(), Ok(RecordType::Cname));
    for token in ["a", "cname", "Cname", " CNAME", "CNAME ", "AAAA", ""] {
        assert!(
            token.parse::<RecordType>().is_err(),
            "{token:?} should not be accepted"
        );
    }
}

#[test]
fn test_add_resource_lowercase_type_uses_default() {
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("web"),
        &annotations(&[
            ("domainName", "www.demo.com"),
            ("dnsRecordType", "cname"),
            ("dnsRecordTTL", " 60 "),
        ]),
        Ok(WEB_ELB),
        &RecordDefaults::default(),
    );

    let binding = &state.bindings["www.demo.com"];
    assert_eq!(binding.record_type, RecordType::AliasA);
    assert_eq!(binding.ttl, 300);
}

#[test]
fn test_add_resource_falls_back_to_defaults() {
    let defaults = RecordDefaults {
        record_type: RecordType::Cname,
        ttl: 90,
    };
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("web"),
        &annotations(&[
            ("domainName", "www.demo.com"),
            ("dnsRecordType", "MX"),
            ("dnsRecordTTL", "forever"),
        ]),
        Ok(WEB_ELB),
        &defaults,
    );

    let binding = &state.bindings["www.demo.com"];
    assert_eq!(binding.record_type, RecordType::Cname);
    assert_eq!(binding.ttl, 90);
}

#[test]
fn test_add_resource_skips_without_domain() {
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("web"),
        &annotations(&[("domainName", " , ")]),
        Ok(WEB_ELB),
        &RecordDefaults::default(),
    );
    state.add_resource(
        service_ref("api"),
        &BTreeMap::new(),
        Ok(WEB_ELB),
        &RecordDefaults::default(),
    );

    assert!(state.bindings.is_empty());
    assert_eq!(state.skipped.len(), 2);
    assert!(state
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::MissingDomainName));
}

#[test]
fn test_add_resource_skips_without_endpoint() {
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("web"),
        &annotations(&[("domainName", "www.demo.com")]),
        Err(&SkipReason::MultipleEndpoints(3)),
        &RecordDefaults::default(),
    );

    assert!(state.bindings.is_empty());
    assert_eq!(state.skipped[0].reason, SkipReason::MultipleEndpoints(3));
    assert_eq!(state.skipped[0].resource, service_ref("web"));
}

#[test]
fn test_add_resource_last_declaration_wins() {
    let mut state = DesiredState::default();
    state.add_resource(
        service_ref("first"),
        &annotations(&[("domainName", "www.demo.com")]),
        Ok(WEB_ELB),
        &RecordDefaults::default(),
    );
    state.add_resource(
        service_ref("second"),
        &annotations(&[("domainName", "www.demo.com")]),
        Ok(INGRESS_ELB),
        &RecordDefaults::default(),
    );

    assert_eq!(state.bindings.len(), 1);
    assert_eq!(state.bindings["www.demo.com"].source.name, "second");
    assert_eq!(state.bindings["www.demo.com"].target_hostname, INGRESS_ELB);
}

#[tokio::test]
async fn test_collect_services_and_ingresses() {
    let config = SyncConfig::default();
    let cluster = FakeCluster::default()
        .with_services(
            &config.service_selector,
            vec![
                service(
                    "web",
                    &[("domainName", "www.demo.com,shared.demo.com")],
                    vec![lb_ingress(Some(WEB_ELB), None)],
                ),
                service("unannotated", &[], vec![lb_ingress(Some(WEB_ELB), None)]),
            ],
        )
        .with_services(
            &config.ingress_service_selector,
            vec![service("nginx", &[], vec![lb_ingress(Some(INGRESS_ELB), None)])],
        )
        .with_ingresses(vec![ingress(
            "app",
            &[("domainName", "app.demo.com,shared.demo.com")],
        )]);

    let state = collect_desired_state(&cluster, &config).await.unwrap();

    assert_eq!(
        state.bindings.keys().collect::<Vec<_>>(),
        vec!["app.demo.com", "shared.demo.com", "www.demo.com"]
    );
    assert_eq!(state.bindings["www.demo.com"].target_hostname, WEB_ELB);
    assert_eq!(state.bindings["app.demo.com"].target_hostname, INGRESS_ELB);

    let shared = &state.bindings["shared.demo.com"];
    assert_eq!(shared.source.kind, KIND_INGRESS);
    assert_eq!(shared.target_hostname, INGRESS_ELB);

    assert_eq!(state.skipped.len(), 1);
    assert_eq!(state.skipped[0].resource.name, "unannotated");
}

#[tokio::test]
async fn test_collect_without_ingress_service() {
    let config = SyncConfig::default();
    let cluster = FakeCluster::default()
        .with_services(
            &config.service_selector,
            vec![service(
                "web",
                &[("domainName", "www.demo.com")],
                vec![lb_ingress(Some(WEB_ELB), None)],
            )],
        )
        .with_ingresses(vec![ingress("app", &[("domainName", "app.demo.com")])]);

    let state = collect_desired_state(&cluster, &config).await.unwrap();

    assert_eq!(state.bindings.len(), 1);
    assert!(state.bindings.contains_key("www.demo.com"));
}

#[tokio::test]
async fn test_collect_ingress_service_without_endpoint_skips_ingresses() {
    let config = SyncConfig::default();
    let cluster = FakeCluster::default()
        .with_services(
            &config.ingress_service_selector,
            vec![service("nginx", &[], vec![])],
        )
        .with_ingresses(vec![ingress("app", &[("domainName", "app.demo.com")])]);

    let state = collect_desired_state(&cluster, &config).await.unwrap();

    assert!(state.bindings.is_empty());
    assert_eq!(state.skipped.len(), 1);
    assert_eq!(state.skipped[0].resource.kind, KIND_INGRESS);
    assert_eq!(state.skipped[0].reason, SkipReason::NoEndpoint);
}

#[tokio::test]
async fn test_collect_ingress_failure_keeps_services() {
    let config = SyncConfig::default();
    let mut cluster = FakeCluster::default()
        .with_services(
            &config.service_selector,
            vec![service(
                "web",
                &[("domainName", "www.demo.com")],
                vec![lb_ingress(Some(WEB_ELB), None)],
            )],
        )
        .with_services(
            &config.ingress_service_selector,
            vec![service("nginx", &[], vec![lb_ingress(Some(INGRESS_ELB), None)])],
        );
    cluster.fail_ingresses = true;

    let state = collect_desired_state(&cluster, &config).await.unwrap();

    assert_eq!(state.bindings.len(), 1);
}

#[tokio::test]
async fn test_collect_service_failure_is_an_error() {
    let cluster = FakeCluster {
        fail_services: true,
        ..FakeCluster::default()
    };

    assert!(collect_desired_state(&cluster, &SyncConfig::default())
        .await
        .is_err());
}
