//! Loading option structs from environment variables
//!
//! Option structs implement `serde::Deserialize` with `#[serde(default)]`, so
//! only the variables that are set override the defaults. Field names map to
//! upper-case variable names after the prefix:
//!
//! ```text
//! STRATA_LOG_LEVEL=debug
//! STRATA_LOG_ONLY_ERRORS=true
//! STRATA_REQUEST_TIMEOUT_MS=5000
//! ```

use serde::de::DeserializeOwned;

/// Error type for configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("configuration error: {0}")]
    Envy(#[from] envy::Error),
}

/// Deserialize `T` from the process environment, keeping variables that
/// start with `prefix`
pub(crate) fn from_env<T>(prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    Ok(envy::prefixed(prefix).from_env::<T>()?)
}

/// Deserialize `T` from an explicit set of variables
pub(crate) fn from_vars<T, I>(prefix: &str, vars: I) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    Ok(envy::prefixed(prefix).from_iter::<_, T>(vars)?)
}
