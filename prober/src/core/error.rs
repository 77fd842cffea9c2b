//! Typed errors surfaced by marketplace sessions.

use thiserror::Error;

use crate::core::types::ProviderIdentity;

/// Error returned across the marketplace seam.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Failure reported by the marketplace layer. `provider` is set when the
    /// marketplace can attribute the failure to a specific provider.
    #[error("market error: {message}")]
    Market {
        message: String,
        provider: Option<ProviderIdentity>,
    },
    /// Anything else: transport, serialization, local I/O.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    pub fn market(message: impl Into<String>, provider: Option<ProviderIdentity>) -> Self {
        ProbeError::Market {
            message: message.into(),
            provider,
        }
    }
}
