//! Error type for permission queries

use thiserror::Error;

/// Errors raised by permission queries.
///
/// "Not trusted" and "sandboxed" are ordinary answers, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The accessibility API does not exist on this target
    #[error("accessibility permission API is unavailable on {platform}")]
    UnsupportedPlatform { platform: &'static str },

    /// Failure raised by custom `AccessibilityBackend` implementations
    #[error("accessibility backend error: {0}")]
    Backend(String),
}

impl ProbeError {
    /// Unsupported-platform error for the target this crate was built for
    pub fn unsupported() -> Self {
        Self::UnsupportedPlatform {
            platform: std::env::consts::OS,
        }
    }

    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform { .. })
    }
}

pub type Result<T, E = ProbeError> = std::result::Result<T, E>;
