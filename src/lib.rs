// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kube-route53-dns - Route53 records for Kubernetes load balancers
//!
//! A small controller that keeps Route53 record sets in sync with the
//! `domainName` annotations on Kubernetes services and ingresses.
//!
//! ## Overview
//!
//! Every cycle the controller:
//!
//! - Lists services (and ingresses) matching a label selector in all namespaces
//! - Collects the domains they declare and the load balancer hostname behind them
//! - Finds the most specific hosted zone for each domain
//! - Upserts an alias `A` record (or a `CNAME`) pointing at the load balancer
//!
//! Nothing is cached between cycles; the desired state is rebuilt from the
//! cluster each time, so every cycle retries whatever failed before.
//!
//! ## Modules
//!
//! - [`desired`] - Desired state collection from annotated resources
//! - [`zone`] - Hosted zone selection
//! - [`endpoint`] - Load balancer resolution
//! - [`records`] - Record set construction
//! - [`reconciler`] - The reconciliation loop
//! - [`provider`] - DNS and load balancer provider interfaces
//! - [`aws`] - Route53 and ELB implementations of the providers
//! - [`cluster`] - Kubernetes access
//! - [`config`] - Command line and environment configuration
//! - [`metrics`] / [`server`] - Prometheus metrics and their HTTP listener
//!
//! ## Example
//!
//! ```rust
//! use kube_route53_dns::provider::HostedZone;
//! use kube_route53_dns::zone::find_most_specific_zone;
//!
//! let zones = vec![
//!     HostedZone::new("ZDEMO", "demo.com."),
//!     HostedZone::new("ZSUB", "sub.demo.com."),
//! ];
//!
//! let zone = find_most_specific_zone("test.sub.demo.com", &zones).unwrap();
//! assert_eq!(zone.id, "ZSUB");
//! ```

pub mod aws;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod desired;
pub mod dns_errors;
pub mod domain;
pub mod endpoint;
pub mod labels;
pub mod metrics;
pub mod provider;
pub mod reconciler;
pub mod records;
pub mod server;
pub mod zone;
