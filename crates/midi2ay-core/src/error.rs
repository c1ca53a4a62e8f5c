//! Error types for the conversion pipeline.

use thiserror::Error;

/// Errors that can occur while configuring or running a conversion.
///
/// All per-row decisions inside the pipeline are total functions; errors
/// surface only from configuration and from mapping validation, before any
/// transformation begins.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid channel mapping '{spec}': {reason}")]
    Config { spec: String, reason: String },
    #[error("channel mapping references source track {channel} which does not exist")]
    DegenerateInput { channel: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ConvertError {
    pub(crate) fn config(spec: &str, reason: impl Into<String>) -> Self {
        ConvertError::Config {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}
