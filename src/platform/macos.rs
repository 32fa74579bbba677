//! macOS backend using the ApplicationServices trust API

use super::AccessibilityBackend;
use crate::error::Result;
use crate::sandbox::SandboxSignals;
use core_foundation::base::TCFType;
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;

    static kAXTrustedCheckOptionPrompt: CFStringRef;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MacOSBackend;

impl MacOSBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AccessibilityBackend for MacOSBackend {
    fn is_process_trusted(&self) -> Result<bool> {
        let trusted = unsafe { AXIsProcessTrusted() };
        tracing::debug!("AXIsProcessTrusted -> {}", trusted);
        Ok(trusted)
    }

    fn request_trust(&self) -> Result<bool> {
        // The key is a framework-owned constant, so wrap it under the get rule.
        let prompt_key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let prompt_value = CFBoolean::true_value();

        let options =
            CFDictionary::from_CFType_pairs(&[(prompt_key.as_CFType(), prompt_value.as_CFType())]);

        let trusted = unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) };
        tracing::debug!("AXIsProcessTrustedWithOptions(prompt) -> {}", trusted);
        Ok(trusted)
    }

    fn sandbox_signals(&self) -> Result<SandboxSignals> {
        Ok(SandboxSignals::from_process())
    }
}
