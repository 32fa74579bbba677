//! Mac App Store sandbox detection

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable macOS sets for processes inside an App Sandbox container
pub const CONTAINER_ID_VAR: &str = "APP_SANDBOX_CONTAINER_ID";

const RECEIPT_PATH: &str = "Contents/_MASReceipt/receipt";

/// Raw process facts that decide whether we are running under the MAS sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSignals {
    /// Value of `APP_SANDBOX_CONTAINER_ID`, if set
    pub container_id: Option<String>,
    /// The enclosing `.app` bundle carries an App Store receipt
    pub has_mas_receipt: bool,
}

impl SandboxSignals {
    /// Read the signals for the current process.
    pub fn from_process() -> Self {
        let container_id = std::env::var(CONTAINER_ID_VAR).ok();
        let has_mas_receipt = match std::env::current_exe() {
            Ok(exe) => find_mas_receipt(&exe).is_some(),
            Err(e) => {
                tracing::debug!("Cannot resolve current executable: {}", e);
                false
            }
        };

        Self {
            container_id,
            has_mas_receipt,
        }
    }
}

/// Classify the environment. A non-empty container id or a store receipt means sandboxed.
pub fn is_sandboxed(signals: &SandboxSignals) -> bool {
    let in_container = signals
        .container_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());

    in_container || signals.has_mas_receipt
}

/// Locate the App Store receipt of the `.app` bundle enclosing `exe`.
pub fn find_mas_receipt(exe: &Path) -> Option<PathBuf> {
    exe.ancestors()
        .filter(|dir| dir.extension().is_some_and(|ext| ext == "app"))
        .map(|bundle| bundle.join(RECEIPT_PATH))
        .find(|receipt| receipt.is_file())
}
