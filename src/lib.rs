//! macOS accessibility permission checks
//!
//! This crate answers whether the current process is trusted by the macOS
//! accessibility subsystem, can ask the OS to show its authorization dialog,
//! and knows when it is running under the Mac App Store sandbox, where that
//! dialog is unavailable.
//!
//! # Example
//!
//! ```no_run
//! fn main() -> anyhow::Result<()> {
//!     let status = mac_accessibility_check::get_permission_status()?;
//!     if !status.trusted && status.can_prompt {
//!         mac_accessibility_check::is_trusted_prompt()?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! On targets other than macOS every query fails with
//! [`ProbeError::UnsupportedPlatform`].

pub mod config;
mod error;
pub mod platform;
mod probe;
pub mod protocol;
pub mod sandbox;
pub mod server;

pub use config::{init_logging, Config, LogLevel};
pub use error::{ProbeError, Result};
pub use platform::{create_backend, AccessibilityBackend, UnsupportedBackend};
pub use probe::{
    PermissionProbe, PermissionReport, ACCESSIBILITY_SETTINGS_URL, MANUAL_GUIDANCE,
    PROMPT_GUIDANCE,
};
pub use sandbox::SandboxSignals;

/// Whether this process is trusted for accessibility. Never prompts.
pub fn is_trusted() -> Result<bool> {
    PermissionProbe::system().is_trusted()
}

/// Whether this process is trusted, showing the system dialog when it is
/// not and the environment allows it.
pub fn is_trusted_prompt() -> Result<bool> {
    PermissionProbe::system().is_trusted_prompt()
}

/// Whether this process runs under the Mac App Store sandbox
pub fn is_mas_environment() -> Result<bool> {
    PermissionProbe::system().is_mas_environment()
}

/// Trust, sandbox and prompt availability in one fresh report
pub fn get_permission_status() -> Result<PermissionReport> {
    PermissionProbe::system().get_permission_status()
}
