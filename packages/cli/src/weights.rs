//! Category weight configuration.
//!
//! A weights file is a TOML table:
//!
//! ```toml
//! defaultWeight = 2
//!
//! [weights]
//! violent-crime = 9
//! burglary = 6
//! ```

use std::path::Path;

use saferoute_incident_models::{CategoryWeights, WeightScheme};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("Failed to read weights file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid weights file {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Parses a weights table from TOML text.
///
/// # Errors
///
/// * If `text` is not a valid weights table
pub fn parse_weights(text: &str) -> Result<CategoryWeights, toml::de::Error> {
    toml::from_str(text)
}

/// Weights from `file` if given, otherwise the `scheme` preset.
///
/// # Errors
///
/// * If `file` cannot be read or parsed
pub fn load_weights(
    scheme: WeightScheme,
    file: Option<&Path>,
) -> Result<CategoryWeights, WeightsError> {
    let Some(path) = file else {
        log::debug!("Using {scheme} category weights");
        return Ok(scheme.weights());
    };

    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| WeightsError::Io {
        path: display.clone(),
        source,
    })?;
    let weights = parse_weights(&text).map_err(|source| WeightsError::Toml {
        path: display.clone(),
        source,
    })?;
    log::info!(
        "Loaded {} category weights from {display}",
        weights.weights.len()
    );
    Ok(weights)
}
