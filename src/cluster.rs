// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes access for desired state collection.
//!
//! The collector only needs two read operations, both cluster-wide and
//! filtered by a label selector. [`KubeCluster`] implements them on a
//! [`kube::Client`], fetching results in pages to bound memory usage and API
//! server load.

use crate::constants::KUBE_LIST_PAGE_SIZE;
use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{api::ListParams, Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Read access to the cluster resources that declare domains.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// List services matching `selector` in all namespaces.
    async fn list_services(&self, selector: &str) -> Result<Vec<Service>>;

    /// List ingresses matching `selector` in all namespaces.
    async fn list_ingresses(&self, selector: &str) -> Result<Vec<Ingress>>;
}

/// [`ClusterSource`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Wrap an initialized Kubernetes client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterSource for KubeCluster {
    async fn list_services(&self, selector: &str) -> Result<Vec<Service>> {
        let api: Api<Service> = Api::all(self.client.clone());
        list_all_paginated(&api, ListParams::default().labels(selector)).await
    }

    async fn list_ingresses(&self, selector: &str) -> Result<Vec<Ingress>> {
        let api: Api<Ingress> = Api::all(self.client.clone());
        list_all_paginated(&api, ListParams::default().labels(selector)).await
    }
}

/// List all resources with automatic pagination.
///
/// # Arguments
///
/// * `api` - Kubernetes API client for the resource type
/// * `list_params` - Base list parameters (labels, fields, etc.)
///
/// # Errors
///
/// Returns an error if Kubernetes API operations fail.
pub async fn list_all_paginated<K>(api: &Api<K>, list_params: ListParams) -> Result<Vec<K>>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let mut list_params = with_page_size(list_params);
    let mut all_items = Vec::new();
    let mut page_count = 0;

    loop {
        page_count += 1;
        let result = api.list(&list_params).await?;

        let item_count = result.items.len();
        all_items.extend(result.items);

        debug!(
            page = page_count,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from Kubernetes API"
        );

        match result.metadata.continue_ {
            Some(continue_token) if !continue_token.is_empty() => {
                list_params.continue_token = Some(continue_token);
            }
            _ => break,
        }
    }

    debug!(
        total_pages = page_count,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}

/// Apply the standard page size to list parameters.
#[must_use]
pub fn with_page_size(mut list_params: ListParams) -> ListParams {
    list_params.limit = Some(KUBE_LIST_PAGE_SIZE);
    list_params
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod cluster_tests;
