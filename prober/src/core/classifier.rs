//! Deterministic classification of task and round errors.

use crate::core::error::ProbeError;

/// What the error handler should do with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Marketplace error caused by `provider_name`: blacklist it.
    ProviderFault { provider_name: String },
    /// Marketplace error that names no provider.
    Unattributed,
    /// Not a marketplace error.
    Generic,
}

/// Classify `err`.
///
/// A marketplace error counts as a provider fault only when it carries a
/// provider with a non-empty name.
pub fn classify_error(err: &ProbeError) -> ErrorClass {
    match err {
        ProbeError::Market {
            provider: Some(provider),
            ..
        } if !provider.name.trim().is_empty() => ErrorClass::ProviderFault {
            provider_name: provider.name.clone(),
        },
        ProbeError::Market { .. } => ErrorClass::Unattributed,
        ProbeError::Other(_) => ErrorClass::Generic,
    }
}
