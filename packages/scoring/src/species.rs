//! Street tree species catalog.
//!
//! The default catalog is a TOML file embedded at compile time. Callers
//! may load their own catalog with [`parse_catalog`].

use urban_greening_scoring_models::SpeciesCatalog;

use crate::ScoringError;

/// Embedded default catalog.
const DEFAULT_CATALOG_TOML: &str = include_str!("../catalog/species.toml");

/// Parses a species catalog from TOML.
///
/// # Errors
///
/// Returns [`ScoringError::Catalog`] if the text is not a valid catalog.
pub fn parse_catalog(text: &str) -> Result<SpeciesCatalog, ScoringError> {
    Ok(toml::de::from_str(text)?)
}

/// Returns the embedded default catalog.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. It is a compile-time
/// constant, so a failure is a development error caught by the tests.
#[must_use]
pub fn default_catalog() -> SpeciesCatalog {
    parse_catalog(DEFAULT_CATALOG_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded species catalog: {e}"))
}
