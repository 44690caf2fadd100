//! Compile-time registry of provider service configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The
//! registry embeds these at compile time and exposes them via
//! [`all_services`] and [`service`].

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// A provider service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderService {
    /// Unique identifier (e.g., `"uk_police"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for transient failures at the HTTP boundary.
    #[serde(default)]
    pub max_retries: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// UK Police street-level crime API.
    UkPolice {
        /// API base URL (e.g., `"https://data.police.uk/api"`).
        base_url: String,
    },
    /// `OpenRouteService` directions API.
    OpenRouteService {
        /// API base URL (e.g., `"https://api.openrouteservice.org"`).
        base_url: String,
        /// Maximum number of alternative routes to request.
        #[serde(default = "default_max_alternatives")]
        max_alternatives: usize,
    },
    /// Open-Meteo forecast API.
    OpenMeteo {
        /// Forecast endpoint URL.
        base_url: String,
    },
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_alternatives() -> usize {
    3
}

impl ProviderService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::UkPolice { base_url }
            | ProviderConfig::OpenRouteService { base_url, .. }
            | ProviderConfig::OpenMeteo { base_url } => base_url,
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for requests to this service.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

/// Service id of the UK Police crime API.
pub const UK_POLICE: &str = "uk_police";
/// Service id of the `OpenRouteService` directions API.
pub const OPEN_ROUTE_SERVICE: &str = "openrouteservice";
/// Service id of the Open-Meteo forecast API.
pub const OPEN_METEO: &str = "open_meteo";

const SERVICE_TOMLS: &[(&str, &str)] = &[
    (UK_POLICE, include_str!("../services/uk_police.toml")),
    (
        OPEN_ROUTE_SERVICE,
        include_str!("../services/openrouteservice.toml"),
    ),
    (OPEN_METEO, include_str!("../services/open_meteo.toml")),
];

/// Returns all provider service configurations.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded at
/// compile time and covered by tests).
#[must_use]
pub fn all_services() -> Vec<ProviderService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse provider service '{name}': {e}"))
        })
        .collect()
}

/// Returns the service with the given id.
#[must_use]
pub fn service(id: &str) -> Option<ProviderService> {
    all_services().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), SERVICE_TOMLS.len());
    }

    #[test]
    fn service_ids_are_unique_and_match_keys() {
        let mut seen = BTreeSet::new();
        for (key, _) in SERVICE_TOMLS {
            let svc = service(key).unwrap_or_else(|| panic!("service {key} missing"));
            assert_eq!(svc.id, *key);
            assert!(
                seen.insert(svc.id.clone()),
                "Duplicate service ID: {}",
                svc.id
            );
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                svc.base_url().starts_with("https://"),
                "Service {} has non-https base_url",
                svc.id
            );
            assert!(svc.timeout_secs > 0, "Service {} has zero timeout", svc.id);
        }
    }

    #[test]
    fn routing_requests_three_alternatives() {
        let svc = service(OPEN_ROUTE_SERVICE).unwrap();
        assert!(matches!(
            svc.provider,
            ProviderConfig::OpenRouteService {
                max_alternatives: 3,
                ..
            }
        ));
    }
}
