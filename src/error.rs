//! Data-quality conditions raised while assembling forecasts.
//!
//! None of these are fatal: callers log them and keep going.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("unrecognized timestamp format: {0}")]
    TimestampFormatUnrecognized(String),

    #[error("no data from {provider} for {location}: {reason}")]
    ProviderDataMissing {
        provider: String,
        location: String,
        reason: String,
    },

    #[error("no providers available for {0}")]
    NoProvidersAvailable(String),
}

impl ForecastError {
    pub(crate) fn missing(provider: &str, location: &str, reason: impl Into<String>) -> Self {
        Self::ProviderDataMissing {
            provider: provider.to_string(),
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}
