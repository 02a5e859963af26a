//! Halt-on-error policy resolution.
//!
//! Each sanitizer family reads its own option string (`ASAN_OPTIONS`,
//! `UBSAN_OPTIONS`). The two families have opposite defaults: ASan halts
//! unless told otherwise, UBSan continues unless told otherwise.

use std::borrow::Cow;

use crate::summary::{SanitizerKind, contains};

/// Option spellings that turn halting off for AddressSanitizer.
pub const ASAN_NO_HALT_FLAGS: [&[u8]; 3] =
    [b"halt_on_error=0", b"halt_on_error=no", b"halt_on_error=false"];
/// Option spellings that turn halting on for UndefinedBehaviorSanitizer.
pub const UBSAN_HALT_FLAGS: [&[u8]; 3] =
    [b"halt_on_error=1", b"halt_on_error=yes", b"halt_on_error=true"];

/// What the owning sanitizer does after reporting a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltPolicy {
    /// The sanitizer terminates the process; the engine dumps the input itself.
    Halt,
    /// Execution continues; nobody dumps the input unless we do.
    Continue,
}

/// Environment variable holding the option string of a sanitizer family.
#[must_use]
pub const fn options_var(kind: SanitizerKind) -> Option<&'static str> {
    match kind {
        SanitizerKind::AddressSafety => Some("ASAN_OPTIONS"),
        SanitizerKind::UndefinedBehavior => Some("UBSAN_OPTIONS"),
        SanitizerKind::Other => None,
    }
}

/// Live snapshot of sanitizer option strings.
///
/// Queried once per report, never cached.
pub trait OptionSource {
    /// Option string for `kind`, or `None` when unset.
    fn sanitizer_options(&self, kind: SanitizerKind) -> Option<Cow<'_, [u8]>>;
}

impl<T: OptionSource + ?Sized> OptionSource for &T {
    fn sanitizer_options(&self, kind: SanitizerKind) -> Option<Cow<'_, [u8]>> {
        (**self).sanitizer_options(kind)
    }
}

/// Fixed option strings, independent of the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticOptions {
    asan: Option<Vec<u8>>,
    ubsan: Option<Vec<u8>>,
}

impl StaticOptions {
    /// Both option strings unset.
    #[must_use]
    pub fn unset() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_asan(mut self, options: impl Into<Vec<u8>>) -> Self {
        self.asan = Some(options.into());
        self
    }

    #[must_use]
    pub fn with_ubsan(mut self, options: impl Into<Vec<u8>>) -> Self {
        self.ubsan = Some(options.into());
        self
    }
}

impl OptionSource for StaticOptions {
    fn sanitizer_options(&self, kind: SanitizerKind) -> Option<Cow<'_, [u8]>> {
        match kind {
            SanitizerKind::AddressSafety => self.asan.as_deref().map(Cow::Borrowed),
            SanitizerKind::UndefinedBehavior => self.ubsan.as_deref().map(Cow::Borrowed),
            SanitizerKind::Other => None,
        }
    }
}

/// Resolve the halt policy of `kind` from its option string.
///
/// Returns `None` for [`SanitizerKind::Other`]. An unset option string
/// resolves to the family default.
#[must_use]
pub fn resolve_halt_policy(kind: SanitizerKind, options: Option<&[u8]>) -> Option<HaltPolicy> {
    let options = options.unwrap_or_default();
    match kind {
        SanitizerKind::AddressSafety => {
            if ASAN_NO_HALT_FLAGS.iter().any(|flag| contains(options, flag)) {
                Some(HaltPolicy::Continue)
            } else {
                Some(HaltPolicy::Halt)
            }
        }
        SanitizerKind::UndefinedBehavior => {
            if UBSAN_HALT_FLAGS.iter().any(|flag| contains(options, flag)) {
                Some(HaltPolicy::Halt)
            } else {
                Some(HaltPolicy::Continue)
            }
        }
        SanitizerKind::Other => None,
    }
}
