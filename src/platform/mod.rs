//! Platform-specific accessibility permission backends

use crate::error::{ProbeError, Result};
use crate::sandbox::SandboxSignals;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacOSBackend;

/// Narrow read/trigger interface over the OS permission state
pub trait AccessibilityBackend: Send + Sync {
    /// Whether the process is trusted, without prompting
    fn is_process_trusted(&self) -> Result<bool>;

    /// Whether the process is trusted, asking the OS to show its
    /// authorization dialog when it is not
    fn request_trust(&self) -> Result<bool>;

    /// Process facts used to classify the sandbox environment
    fn sandbox_signals(&self) -> Result<SandboxSignals>;
}

/// Backend for targets without the accessibility API. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBackend;

impl AccessibilityBackend for UnsupportedBackend {
    fn is_process_trusted(&self) -> Result<bool> {
        Err(ProbeError::unsupported())
    }

    fn request_trust(&self) -> Result<bool> {
        Err(ProbeError::unsupported())
    }

    fn sandbox_signals(&self) -> Result<SandboxSignals> {
        Err(ProbeError::unsupported())
    }
}

/// Create the appropriate backend for the current platform
pub fn create_backend() -> Box<dyn AccessibilityBackend> {
    #[cfg(target_os = "macos")]
    {
        Box::new(MacOSBackend::new())
    }

    #[cfg(not(target_os = "macos"))]
    {
        tracing::warn!(
            "Accessibility permission API unavailable on {}",
            std::env::consts::OS
        );
        Box::new(UnsupportedBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_backend_fails_every_call() {
        let backend = UnsupportedBackend;
        assert!(backend.is_process_trusted().unwrap_err().is_unsupported_platform());
        assert!(backend.request_trust().unwrap_err().is_unsupported_platform());
        assert!(backend.sandbox_signals().unwrap_err().is_unsupported_platform());
    }

    #[test]
    #[cfg(not(target_os = "macos"))]
    fn non_macos_gets_unsupported_backend() {
        let backend = create_backend();
        assert!(backend.is_process_trusted().is_err());
    }

    #[test]
    #[cfg(target_os = "macos")]
    fn macos_backend_answers() {
        let backend = create_backend();
        assert!(backend.is_process_trusted().is_ok());
        assert!(backend.sandbox_signals().is_ok());
    }
}
