// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every flag can also be set through an environment variable. Record defaults
//! are forgiving: an unrecognized default record type or TTL falls back to the
//! built-in default with a warning. Selectors are strict: an unparsable selector
//! is a startup error.

use crate::constants::{DEFAULT_DNS_RECORD_TTL_SECS, DEFAULT_SYNC_INTERVAL_SECS};
use crate::desired::{parse_ttl, RecordDefaults, RecordType};
use crate::dns_errors::StartupError;
use crate::labels::{DEFAULT_INGRESS_SERVICE_SELECTOR, DEFAULT_SERVICE_SELECTOR};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

/// Command line interface.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kube-route53-dns",
    version,
    about = "Keep Route53 records in sync with domainName annotations on Kubernetes services and ingresses"
)]
pub struct Cli {
    #[arg(
        long,
        env = "DNS_RECORD_TYPE",
        help = "Default record type for resources without a valid dnsRecordType annotation (A or CNAME)"
    )]
    pub dns_record_type: Option<String>,

    #[arg(
        long,
        env = "DNS_RECORD_TTL",
        help = "Default TTL in seconds for resources without a valid dnsRecordTTL annotation"
    )]
    pub dns_record_ttl: Option<String>,

    #[arg(
        long,
        env = "DRY_RUN",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Log intended record changes without writing them"
    )]
    pub dry_run: Option<String>,

    #[arg(
        long,
        env = "DNS_SERVICE_SELECTOR",
        default_value = DEFAULT_SERVICE_SELECTOR,
        help = "Label selector for services and ingresses managed by this controller"
    )]
    pub service_selector: String,

    #[arg(
        long,
        env = "INGRESS_SERVICE_SELECTOR",
        default_value = DEFAULT_INGRESS_SERVICE_SELECTOR,
        help = "Label selector for the ingress controller service"
    )]
    pub ingress_service_selector: String,

    #[arg(
        long,
        env = "SYNC_INTERVAL_SECS",
        default_value_t = DEFAULT_SYNC_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to sleep between reconciliation cycles"
    )]
    pub interval_secs: u64,

    #[arg(
        long,
        env = "SKIP_EXISTENCE_CHECK",
        help = "Always issue the upsert instead of comparing with the existing record first"
    )]
    pub skip_existence_check: bool,

    #[arg(long, env = "AWS_REGION", help = "AWS region (defaults to the SDK region chain)")]
    pub region: Option<String>,

    #[arg(long, env = "METRICS_ADDR", help = "Serve /metrics and /healthz on this address")]
    pub metrics_addr: Option<SocketAddr>,
}

/// Process-wide settings consumed by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Record type and TTL used when annotations are missing or invalid
    pub record_defaults: RecordDefaults,
    /// Suppress every provider write
    pub dry_run: bool,
    /// Selector for services and ingresses declaring domains
    pub service_selector: String,
    /// Selector for the shared ingress controller service
    pub ingress_service_selector: String,
    /// Sleep between cycles
    pub interval: Duration,
    /// Read the existing record before writing and skip identical writes
    pub existence_check: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            record_defaults: RecordDefaults::default(),
            dry_run: false,
            service_selector: DEFAULT_SERVICE_SELECTOR.to_string(),
            ingress_service_selector: DEFAULT_INGRESS_SERVICE_SELECTOR.to_string(),
            interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            existence_check: true,
        }
    }
}

impl SyncConfig {
    /// Resolve the command line into a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidSelector`] when either selector cannot be
    /// parsed.
    pub fn from_cli(cli: &Cli) -> Result<Self, StartupError> {
        validate_selector(&cli.service_selector)?;
        validate_selector(&cli.ingress_service_selector)?;

        Ok(Self {
            record_defaults: RecordDefaults {
                record_type: default_record_type(cli.dns_record_type.as_deref()),
                ttl: default_record_ttl(cli.dns_record_ttl.as_deref()),
            },
            dry_run: is_enabled(cli.dry_run.as_deref()),
            service_selector: cli.service_selector.clone(),
            ingress_service_selector: cli.ingress_service_selector.clone(),
            interval: Duration::from_secs(cli.interval_secs),
            existence_check: !cli.skip_existence_check,
        })
    }
}

/// Default record type, falling back to alias `A` for missing or unknown values.
#[must_use]
pub fn default_record_type(value: Option<&str>) -> RecordType {
    match value.filter(|v| !v.is_empty()) {
        None => RecordType::AliasA,
        Some(value) => value.parse().unwrap_or_else(|e| {
            warn!("{}, falling back to {}", e, RecordType::AliasA);
            RecordType::AliasA
        }),
    }
}

/// Default TTL, falling back to 300 seconds for missing or invalid values.
#[must_use]
pub fn default_record_ttl(value: Option<&str>) -> u32 {
    match value.filter(|v| !v.is_empty()) {
        None => DEFAULT_DNS_RECORD_TTL_SECS,
        Some(value) => parse_ttl(value).unwrap_or_else(|| {
            warn!(
                "Invalid default DNS record TTL {:?}, falling back to {}",
                value, DEFAULT_DNS_RECORD_TTL_SECS
            );
            DEFAULT_DNS_RECORD_TTL_SECS
        }),
    }
}

/// Interpret a toggle value. Any non-empty value other than an explicit
/// negative (`false`, `0`, `no`, `off`) enables the toggle.
#[must_use]
pub fn is_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !["false", "0", "no", "off"]
            .iter()
            .any(|negative| v.eq_ignore_ascii_case(negative)),
    }
}

/// Validate Kubernetes label selector syntax.
///
/// Supports equality (`k=v`, `k==v`), inequality (`k!=v`), existence (`k`,
/// `!k`), and set-based (`k in (a,b)`, `k notin (a,b)`) requirements.
///
/// # Errors
///
/// Returns [`StartupError::InvalidSelector`] describing the first invalid term.
pub fn validate_selector(selector: &str) -> Result<(), StartupError> {
    let invalid = |reason: String| StartupError::InvalidSelector {
        selector: selector.to_string(),
        reason,
    };

    for term in split_requirements(selector).map_err(invalid)? {
        validate_requirement(term.trim()).map_err(invalid)?;
    }
    Ok(())
}

/// Split a selector on commas that are not inside parentheses.
fn split_requirements(selector: &str) -> Result<Vec<&str>, String> {
    if selector.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            ',' if depth == 0 => {
                terms.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    terms.push(&selector[start..]);
    Ok(terms)
}

fn validate_requirement(term: &str) -> Result<(), String> {
    if term.is_empty() {
        return Err("empty requirement".to_string());
    }

    if let Some(key) = term.strip_prefix('!') {
        return validate_key(key.trim());
    }

    for operator in [" notin ", " in "] {
        if let Some((key, values)) = term.split_once(operator) {
            validate_key(key.trim())?;
            let values = values
                .trim()
                .strip_prefix('(')
                .and_then(|v| v.strip_suffix(')'))
                .ok_or_else(|| format!("expected parenthesized values in {term:?}"))?;
            for value in values.split(',') {
                validate_value(value.trim())?;
            }
            return Ok(());
        }
    }

    for operator in ["!=", "==", "="] {
        if let Some((key, value)) = term.split_once(operator) {
            validate_key(key.trim())?;
            return validate_value(value.trim());
        }
    }

    validate_key(term)
}

fn validate_key(key: &str) -> Result<(), String> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty()
                || !prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            {
                return Err(format!("invalid key prefix in {key:?}"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() {
        return Err("empty label key".to_string());
    }
    validate_value(name).map_err(|_| format!("invalid label key {key:?}"))
}

fn validate_value(value: &str) -> Result<(), String> {
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    let valid_edges = value.is_empty()
        || (value.starts_with(|c: char| c.is_ascii_alphanumeric())
            && value.ends_with(|c: char| c.is_ascii_alphanumeric()));

    if valid_chars && valid_edges && value.len() <= 63 {
        Ok(())
    } else {
        Err(format!("invalid label value {value:?}"))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
