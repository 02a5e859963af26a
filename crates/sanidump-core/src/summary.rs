//! Error summary classification.
//!
//! Every sanitizer finding ends with a single `SUMMARY: <Sanitizer>: ...`
//! line passed to `__sanitizer_report_error_summary`. The leading text tells
//! which sanitizer family authored it.

use serde::Serialize;

/// Prefix of summaries emitted by AddressSanitizer (including LeakSanitizer
/// reports produced by the ASan runtime).
pub const ASAN_SUMMARY_PREFIX: &[u8] = b"SUMMARY: AddressSanitizer:";
/// Prefix of summaries emitted by UndefinedBehaviorSanitizer.
pub const UBSAN_SUMMARY_PREFIX: &[u8] = b"SUMMARY: UndefinedBehaviorSanitizer:";
/// Marker of a leak report within an AddressSanitizer summary.
pub const LEAK_MARKER: &[u8] = b"byte(s) leaked";

/// Sanitizer family that authored an error summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizerKind {
    /// AddressSanitizer.
    AddressSafety,
    /// UndefinedBehaviorSanitizer.
    UndefinedBehavior,
    /// Anything else; never acted upon.
    Other,
}

impl SanitizerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddressSafety => "address_safety",
            Self::UndefinedBehavior => "undefined_behavior",
            Self::Other => "other",
        }
    }
}

/// Result of classifying one error summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: SanitizerKind,
    /// Only ever true for [`SanitizerKind::AddressSafety`].
    pub leak: bool,
}

/// Classify an error summary by its leading text.
///
/// Works on raw bytes since the summary arrives as a C string with no
/// encoding guarantee.
#[must_use]
pub fn classify(report: &[u8]) -> Classification {
    if report.starts_with(ASAN_SUMMARY_PREFIX) {
        Classification {
            kind: SanitizerKind::AddressSafety,
            leak: contains(report, LEAK_MARKER),
        }
    } else if report.starts_with(UBSAN_SUMMARY_PREFIX) {
        Classification {
            kind: SanitizerKind::UndefinedBehavior,
            leak: false,
        }
    } else {
        Classification {
            kind: SanitizerKind::Other,
            leak: false,
        }
    }
}

/// Byte-substring search (`strstr` without the NUL terminator).
#[must_use]
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
