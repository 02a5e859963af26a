//! Hook installation strategies and the symbols they touch.
//!
//! - [`HookStrategy::DynamicSymbol`]: the sanitizer runtime is always a
//!   separate shared object (Darwin). Hooks are plain definitions of the
//!   runtime's symbol names; the real implementation is found with
//!   `dlsym(RTLD_NEXT, ...)`.
//! - [`HookStrategy::LinkWrap`]: the runtime may be linked statically (Linux).
//!   The fuzz target is linked with `--wrap` for the callback registration
//!   symbol, and the error summary symbol is reimplemented directly.

use std::ffi::CStr;

/// Extension point receiving the engine's death callback.
pub const SET_DEATH_CALLBACK: &CStr = c"__sanitizer_set_death_callback";
/// Extension point called by every sanitizer on every finding.
pub const REPORT_ERROR_SUMMARY: &CStr = c"__sanitizer_report_error_summary";

/// How the hooks are attached to the sanitizer runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStrategy {
    DynamicSymbol,
    LinkWrap,
}

impl HookStrategy {
    /// Default strategy for a `target_os` value as seen by cargo.
    #[must_use]
    pub fn for_target_os(os: &str) -> Self {
        match os {
            "macos" | "ios" => Self::DynamicSymbol,
            _ => Self::LinkWrap,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DynamicSymbol => "dynamic",
            Self::LinkWrap => "wrap",
        }
    }

    /// Linker flags the fuzz target must be linked with.
    #[must_use]
    pub fn linker_flags(self) -> Vec<String> {
        match self {
            Self::DynamicSymbol => Vec::new(),
            Self::LinkWrap => vec![format!(
                "-Wl,--wrap={}",
                SET_DEATH_CALLBACK.to_string_lossy()
            )],
        }
    }
}
