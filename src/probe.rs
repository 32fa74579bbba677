//! Permission probe: the four permission queries over a backend

use crate::error::Result;
use crate::platform::{create_backend, AccessibilityBackend};
use crate::sandbox;
use serde::{Deserialize, Serialize};

/// Guidance shown when the app must be enabled by hand
pub const MANUAL_GUIDANCE: &str = "Accessibility permission is required. Open System Preferences > \
     Security & Privacy > Accessibility and enable this app manually.";

/// Guidance shown when the OS dialog is still available
pub const PROMPT_GUIDANCE: &str = "Accessibility permission is required. Call isTrustedPrompt() to \
     show the system authorization dialog, or open System Preferences > Security & Privacy > \
     Accessibility and enable this app manually.";

/// Deep link to the Accessibility pane of System Settings
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

/// Snapshot of the permission state, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReport {
    #[serde(alias = "isTrusted")]
    pub trusted: bool,
    #[serde(alias = "isMAS")]
    pub sandboxed: bool,
    pub can_prompt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PermissionReport {
    /// Assemble a report from the two measured facts.
    pub fn new(trusted: bool, sandboxed: bool) -> Self {
        let can_prompt = !sandboxed;
        let message = match (trusted, can_prompt) {
            (true, _) => None,
            (false, false) => Some(MANUAL_GUIDANCE.to_string()),
            (false, true) => Some(PROMPT_GUIDANCE.to_string()),
        };

        Self {
            trusted,
            sandboxed,
            can_prompt,
            message,
        }
    }
}

/// Stateless facade over the OS accessibility trust API.
///
/// Nothing is cached: every call asks the backend again. The probe is
/// `Send + Sync` and may be shared between threads.
pub struct PermissionProbe {
    backend: Box<dyn AccessibilityBackend>,
}

impl std::fmt::Debug for PermissionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionProbe").finish_non_exhaustive()
    }
}

impl Default for PermissionProbe {
    fn default() -> Self {
        Self::system()
    }
}

impl PermissionProbe {
    /// Probe backed by the current platform's API
    pub fn system() -> Self {
        Self {
            backend: create_backend(),
        }
    }

    pub fn with_backend(backend: impl AccessibilityBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Current trust state. Never prompts.
    pub fn is_trusted(&self) -> Result<bool> {
        self.backend.is_process_trusted()
    }

    /// Current trust state, asking the OS to show its authorization dialog
    /// when untrusted and outside the sandbox.
    ///
    /// Returns immediately with the status known at call time; the user's
    /// answer to the dialog is not awaited. Concurrent calls are not
    /// deduplicated.
    pub fn is_trusted_prompt(&self) -> Result<bool> {
        if self.backend.is_process_trusted()? {
            return Ok(true);
        }

        if self.is_mas_environment()? {
            tracing::info!("Sandboxed environment, accessibility prompt suppressed");
            return Ok(false);
        }

        tracing::info!("Requesting accessibility authorization dialog");
        self.backend.request_trust()
    }

    /// Whether the process runs under the Mac App Store sandbox
    pub fn is_mas_environment(&self) -> Result<bool> {
        let signals = self.backend.sandbox_signals()?;
        Ok(sandbox::is_sandboxed(&signals))
    }

    pub fn get_permission_status(&self) -> Result<PermissionReport> {
        let trusted = self.is_trusted()?;
        let sandboxed = self.is_mas_environment()?;
        Ok(PermissionReport::new(trusted, sandboxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::sandbox::SandboxSignals;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        prompts: AtomicUsize,
    }

    struct FakeBackend {
        trusted: AtomicBool,
        grant_on_prompt: bool,
        signals: SandboxSignals,
        recorder: Arc<Recorder>,
    }

    impl FakeBackend {
        fn new(trusted: bool, sandboxed: bool) -> (Self, Arc<Recorder>) {
            let recorder = Arc::new(Recorder::default());
            let signals = SandboxSignals {
                container_id: sandboxed.then(|| "com.example.app".to_string()),
                has_mas_receipt: false,
            };
            let backend = Self {
                trusted: AtomicBool::new(trusted),
                grant_on_prompt: false,
                signals,
                recorder: recorder.clone(),
            };
            (backend, recorder)
        }
    }

    impl AccessibilityBackend for FakeBackend {
        fn is_process_trusted(&self) -> Result<bool> {
            Ok(self.trusted.load(Ordering::SeqCst))
        }

        fn request_trust(&self) -> Result<bool> {
            self.recorder.prompts.fetch_add(1, Ordering::SeqCst);
            if self.grant_on_prompt {
                self.trusted.store(true, Ordering::SeqCst);
            }
            Ok(self.trusted.load(Ordering::SeqCst))
        }

        fn sandbox_signals(&self) -> Result<SandboxSignals> {
            Ok(self.signals.clone())
        }
    }

    struct FailingBackend;

    impl AccessibilityBackend for FailingBackend {
        fn is_process_trusted(&self) -> Result<bool> {
            Err(ProbeError::Backend("trust query failed".into()))
        }

        fn request_trust(&self) -> Result<bool> {
            Err(ProbeError::Backend("prompt failed".into()))
        }

        fn sandbox_signals(&self) -> Result<SandboxSignals> {
            Ok(SandboxSignals::default())
        }
    }

    #[test]
    fn sandboxed_untrusted_report() {
        let (backend, _) = FakeBackend::new(false, true);
        let probe = PermissionProbe::with_backend(backend);

        let report = probe.get_permission_status().unwrap();
        assert!(!report.trusted);
        assert!(report.sandboxed);
        assert!(!report.can_prompt);
        assert_eq!(report.message.as_deref(), Some(MANUAL_GUIDANCE));
    }

    #[test]
    fn unsandboxed_trusted_report() {
        let (backend, _) = FakeBackend::new(true, false);
        let probe = PermissionProbe::with_backend(backend);

        let report = probe.get_permission_status().unwrap();
        assert_eq!(
            report,
            PermissionReport {
                trusted: true,
                sandboxed: false,
                can_prompt: true,
                message: None,
            }
        );
    }

    #[test]
    fn unsandboxed_untrusted_report_has_message() {
        let (backend, _) = FakeBackend::new(false, false);
        let probe = PermissionProbe::with_backend(backend);

        let report = probe.get_permission_status().unwrap();
        assert!(report.can_prompt);
        let message = report.message.expect("untrusted report should carry guidance");
        assert!(!message.is_empty());
    }

    #[test]
    fn sandboxed_trusted_report_has_no_message() {
        let (backend, _) = FakeBackend::new(true, true);
        let probe = PermissionProbe::with_backend(backend);

        let report = probe.get_permission_status().unwrap();
        assert!(!report.can_prompt);
        assert!(report.message.is_none());
    }

    #[test]
    fn sandboxed_prompt_never_calls_prompting_api() {
        let (backend, recorder) = FakeBackend::new(false, true);
        let probe = PermissionProbe::with_backend(backend);

        assert!(!probe.is_trusted_prompt().unwrap());
        assert!(!probe.is_trusted_prompt().unwrap());
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 0);
        assert_eq!(probe.is_trusted_prompt().unwrap(), probe.is_trusted().unwrap());
    }

    #[test]
    fn unsandboxed_untrusted_prompt_calls_prompting_api() {
        let (backend, recorder) = FakeBackend::new(false, false);
        let probe = PermissionProbe::with_backend(backend);

        assert!(!probe.is_trusted_prompt().unwrap());
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prompt_reports_status_returned_by_os() {
        let (mut backend, recorder) = FakeBackend::new(false, false);
        backend.grant_on_prompt = true;
        let probe = PermissionProbe::with_backend(backend);

        assert!(probe.is_trusted_prompt().unwrap());
        assert!(probe.is_trusted().unwrap());
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn trusted_process_is_not_prompted() {
        let (backend, recorder) = FakeBackend::new(true, false);
        let probe = PermissionProbe::with_backend(backend);

        assert!(probe.is_trusted_prompt().unwrap());
        assert_eq!(recorder.prompts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn report_agrees_with_is_trusted() {
        for trusted in [true, false] {
            for sandboxed in [true, false] {
                let (backend, _) = FakeBackend::new(trusted, sandboxed);
                let probe = PermissionProbe::with_backend(backend);
                let report = probe.get_permission_status().unwrap();
                assert_eq!(report.trusted, probe.is_trusted().unwrap());
                assert_eq!(report.sandboxed, probe.is_mas_environment().unwrap());
                assert_eq!(report.can_prompt, !report.sandboxed);
            }
        }
    }

    #[test]
    fn backend_errors_propagate() {
        let probe = PermissionProbe::with_backend(FailingBackend);
        assert!(probe.is_trusted().is_err());
        assert!(probe.is_trusted_prompt().is_err());
        assert!(probe.get_permission_status().is_err());
        assert!(!probe.is_mas_environment().unwrap());
    }

    #[test]
    fn unsupported_platform_raises_everywhere() {
        let probe = PermissionProbe::with_backend(crate::platform::UnsupportedBackend);
        assert!(probe.is_trusted().unwrap_err().is_unsupported_platform());
        assert!(probe.is_trusted_prompt().unwrap_err().is_unsupported_platform());
        assert!(probe.is_mas_environment().unwrap_err().is_unsupported_platform());
        assert!(probe
            .get_permission_status()
            .unwrap_err()
            .is_unsupported_platform());
    }

    #[test]
    fn report_reads_legacy_field_names() {
        let legacy = r#"{"isTrusted": true, "isMAS": false, "canPrompt": true}"#;
        let report: PermissionReport = serde_json::from_str(legacy).unwrap();
        assert_eq!(report, PermissionReport::new(true, false));
    }

    #[test]
    fn report_serializes_camel_case() {
        let json = serde_json::to_value(PermissionReport::new(true, false)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"trusted": true, "sandboxed": false, "canPrompt": true})
        );

        let json = serde_json::to_value(PermissionReport::new(false, true)).unwrap();
        assert_eq!(json["canPrompt"], false);
        assert_eq!(json["message"], MANUAL_GUIDANCE);
    }
}
