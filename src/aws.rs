// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AWS implementations of the provider interfaces.
//!
//! - [`Route53Provider`] implements [`DnsProvider`] on `aws-sdk-route53`
//! - [`ElbProvider`] implements [`LoadBalancerProvider`] on the classic
//!   `aws-sdk-elasticloadbalancing` API
//!
//! Credentials come from the SDK default chain (environment, shared profile,
//! instance metadata). Refreshing credentials reloads that chain and rebuilds
//! the client.

use crate::constants::HOSTED_ZONE_PAGE_SIZE;
use crate::dns_errors::{ProviderError, StartupError};
use crate::domain::canonicalize;
use crate::provider::{DnsProvider, HostedZone, LoadBalancerDescription, LoadBalancerProvider};
use crate::records::{AliasTarget, RecordSet};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_elasticloadbalancing::operation::describe_load_balancers::DescribeLoadBalancersError;
use aws_sdk_route53::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_route53::types::{
    AliasTarget as SdkAliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecord,
    ResourceRecordSet, RrType,
};
use tracing::{debug, info};

/// Load the shared SDK configuration.
///
/// # Errors
///
/// Returns [`StartupError::MissingRegion`] when neither `region` nor the SDK
/// region chain yields a region.
pub async fn load_sdk_config(region: Option<&str>) -> Result<SdkConfig, StartupError> {
    let config = load(region.map(|r| Region::new(r.to_string()))).await;
    if config.region().is_none() {
        return Err(StartupError::MissingRegion);
    }
    Ok(config)
}

async fn load(region: Option<Region>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(region);
    }
    loader.load().await
}

/// Convert an SDK failure into a [`ProviderError`], keeping the error code.
fn provider_error<E, R>(operation: &'static str, err: &SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    ProviderError::new(
        operation,
        err.code().map(str::to_string),
        DisplayErrorContext(err).to_string(),
    )
}

fn build_error(operation: &'static str, err: &BuildError) -> ProviderError {
    ProviderError::new(operation, None, err.to_string())
}

/// Convert a record set returned by Route53.
#[must_use]
pub fn record_set_from_sdk(record: &ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: record.name().to_string(),
        record_type: record.r#type().as_str().to_string(),
        ttl: record.ttl(),
        alias_target: record.alias_target().map(|alias| AliasTarget {
            hosted_zone_id: alias.hosted_zone_id().to_string(),
            dns_name: alias.dns_name().to_string(),
            evaluate_target_health: alias.evaluate_target_health(),
        }),
        resource_records: record
            .resource_records()
            .iter()
            .map(|rr| rr.value().to_string())
            .collect(),
    }
}

/// Convert a record set into the Route53 request shape.
///
/// # Errors
///
/// Returns the SDK [`BuildError`] when a required field is missing.
pub fn record_set_to_sdk(record: &RecordSet) -> Result<ResourceRecordSet, BuildError> {
    let mut builder = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(RrType::from(record.record_type.as_str()))
        .set_ttl(record.ttl);

    if let Some(alias) = &record.alias_target {
        builder = builder.alias_target(
            SdkAliasTarget::builder()
                .hosted_zone_id(&alias.hosted_zone_id)
                .dns_name(&alias.dns_name)
                .evaluate_target_health(alias.evaluate_target_health)
                .build()?,
        );
    }

    for value in &record.resource_records {
        builder = builder.resource_records(ResourceRecord::builder().value(value).build()?);
    }

    builder.build()
}

/// Build a single-change `UPSERT` batch.
///
/// # Errors
///
/// Returns the SDK [`BuildError`] when a required field is missing.
pub fn upsert_batch(record: &RecordSet, comment: &str) -> Result<ChangeBatch, BuildError> {
    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set_to_sdk(record)?)
        .build()?;

    ChangeBatch::builder()
        .changes(change)
        .comment(comment)
        .build()
}

/// Route53-backed [`DnsProvider`].
#[derive(Clone)]
pub struct Route53Provider {
    client: aws_sdk_route53::Client,
    region: Option<Region>,
}

impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("region", &self.region)
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider from the shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_route53::Client::new(sdk_config),
            region: sdk_config.region().cloned(),
        }
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_hosted_zones_by_name(
        &self,
        dns_name: &str,
    ) -> Result<Vec<HostedZone>, ProviderError> {
        let suffix = canonicalize(dns_name);
        let mut zones = Vec::new();
        let mut next_dns_name = Some(dns_name.to_string());
        let mut next_zone_id: Option<String> = None;

        loop {
            let output = self
                .client
                .list_hosted_zones_by_name()
                .set_dns_name(next_dns_name.take())
                .set_hosted_zone_id(next_zone_id.take())
                .max_items(HOSTED_ZONE_PAGE_SIZE)
                .send()
                .await
                .map_err(|e| provider_error("ListHostedZonesByName", &e))?;

            let page: Vec<HostedZone> = output
                .hosted_zones()
                .iter()
                .map(|zone| HostedZone::new(zone.id(), zone.name()))
                .collect();

            // Zones come back in reversed-label order, so everything under
            // `suffix` is contiguous from the first page on.
            let still_under_suffix = page
                .last()
                .is_some_and(|zone| zone.name.ends_with(suffix.as_str()));

            debug!(
                dns_name = %dns_name,
                zones_in_page = page.len(),
                truncated = output.is_truncated(),
                "Fetched hosted zone page"
            );
            zones.extend(page);

            if !output.is_truncated() || !still_under_suffix {
                break;
            }
            next_dns_name = output.next_dns_name().map(str::to_string);
            next_zone_id = output.next_hosted_zone_id().map(str::to_string);
            if next_dns_name.is_none() {
                break;
            }
        }

        Ok(zones)
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start_record_name: &str,
        max_items: i32,
    ) -> Result<Vec<RecordSet>, ProviderError> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(start_record_name)
            .max_items(max_items)
            .send()
            .await
            .map_err(|e| provider_error("ListResourceRecordSets", &e))?;

        Ok(output
            .resource_record_sets()
            .iter()
            .map(record_set_from_sdk)
            .collect())
    }

    async fn upsert_record_set(
        &self,
        zone_id: &str,
        record: &RecordSet,
        comment: &str,
    ) -> Result<(), ProviderError> {
        let batch = upsert_batch(record, comment)
            .map_err(|e| build_error("ChangeResourceRecordSets", &e))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| provider_error("ChangeResourceRecordSets", &e))?;

        debug!(
            zone_id = %zone_id,
            name = %record.name,
            "Submitted change batch"
        );
        Ok(())
    }

    async fn refresh_credentials(&mut self) -> Result<(), ProviderError> {
        let config = load(self.region.clone()).await;
        self.client = aws_sdk_route53::Client::new(&config);
        info!("Reloaded Route53 credentials");
        Ok(())
    }
}

/// Classic ELB-backed [`LoadBalancerProvider`].
#[derive(Clone)]
pub struct ElbProvider {
    client: aws_sdk_elasticloadbalancing::Client,
    region: Option<Region>,
}

impl std::fmt::Debug for ElbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElbProvider")
            .field("region", &self.region)
            .finish()
    }
}

impl ElbProvider {
    /// Create a provider from the shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_elasticloadbalancing::Client::new(sdk_config),
            region: sdk_config.region().cloned(),
        }
    }
}

/// Returns true when the ELB API reports that the named load balancer does not exist.
fn is_load_balancer_not_found<R>(err: &SdkError<DescribeLoadBalancersError, R>) -> bool {
    err.as_service_error()
        .is_some_and(DescribeLoadBalancersError::is_access_point_not_found_exception)
}

#[async_trait]
impl LoadBalancerProvider for ElbProvider {
    async fn describe_load_balancers(
        &self,
        name: &str,
    ) -> Result<Vec<LoadBalancerDescription>, ProviderError> {
        let result = self
            .client
            .describe_load_balancers()
            .load_balancer_names(name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .load_balancer_descriptions()
                .iter()
                .map(|lb| LoadBalancerDescription {
                    name: lb.load_balancer_name().map(str::to_string),
                    dns_name: lb.dns_name().map(str::to_string),
                    canonical_hosted_zone_id: lb
                        .canonical_hosted_zone_name_id()
                        .map(str::to_string),
                })
                .collect()),
            Err(err) if is_load_balancer_not_found(&err) => Ok(Vec::new()),
            Err(err) => Err(provider_error("DescribeLoadBalancers", &err)),
        }
    }

    async fn refresh_credentials(&mut self) -> Result<(), ProviderError> {
        let config = load(self.region.clone()).await;
        self.client = aws_sdk_elasticloadbalancing::Client::new(&config);
        info!("Reloaded ELB credentials");
        Ok(())
    }
}

#[cfg(test)]
#[path = "aws_tests.rs"]
mod aws_tests;
