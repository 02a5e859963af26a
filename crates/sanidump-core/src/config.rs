//! Runtime configuration.
//!
//! The dump mode is set via the `SANIDUMP_MODE` environment variable:
//! - `enabled` (default): non-fatal findings trigger the registered death
//!   callback according to the halt policy of the reporting sanitizer.
//! - `disabled`: reports are still forwarded to the sanitizer runtime, but the
//!   callback is never triggered by this layer.
//!
//! `SANIDUMP_LOG` optionally names a JSONL file receiving one record per
//! dispatched report. Sanitizer option strings are deliberately not handled
//! here: they are read fresh for every report.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

pub const MODE_VAR: &str = "SANIDUMP_MODE";
pub const LOG_VAR: &str = "SANIDUMP_LOG";

/// Whether this layer triggers dumps at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpMode {
    #[default]
    Enabled,
    Disabled,
}

impl DumpMode {
    /// Parse from string (case-insensitive). Unknown values are `Enabled`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "0" | "none" => Self::Disabled,
            _ => Self::Enabled,
        }
    }

    #[must_use]
    pub const fn dumps_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

// 0=unresolved, 1=Enabled, 2=Disabled, 255=resolving.
static CACHED_MODE: AtomicU8 = AtomicU8::new(0);

const MODE_UNRESOLVED: u8 = 0;
const MODE_ENABLED: u8 = 1;
const MODE_DISABLED: u8 = 2;
const MODE_RESOLVING: u8 = 255;

fn mode_to_u8(mode: DumpMode) -> u8 {
    match mode {
        DumpMode::Enabled => MODE_ENABLED,
        DumpMode::Disabled => MODE_DISABLED,
    }
}

fn u8_to_mode(v: u8) -> DumpMode {
    match v {
        MODE_DISABLED => DumpMode::Disabled,
        _ => DumpMode::Enabled,
    }
}

/// Get the configured dump mode (reads env var on first call, caches thereafter).
///
/// A call that races with the first resolution sees `Enabled` instead of
/// waiting, so a report raised on another thread never blocks here.
#[must_use]
pub fn dump_mode() -> DumpMode {
    let cached = CACHED_MODE.load(Ordering::Acquire);

    if cached != MODE_UNRESOLVED && cached != MODE_RESOLVING {
        return u8_to_mode(cached);
    }

    if cached == MODE_RESOLVING {
        return DumpMode::default();
    }

    if CACHED_MODE
        .compare_exchange(
            MODE_UNRESOLVED,
            MODE_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        let v = CACHED_MODE.load(Ordering::Acquire);
        return if v != MODE_UNRESOLVED && v != MODE_RESOLVING {
            u8_to_mode(v)
        } else {
            DumpMode::default()
        };
    }

    let mode = std::env::var(MODE_VAR)
        .map(|v| DumpMode::from_str_loose(&v))
        .unwrap_or_default();
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
    mode
}

/// The cached dump mode, without ever reading the environment.
///
/// `None` until [`dump_mode`] has resolved it.
#[must_use]
pub fn cached_dump_mode() -> Option<DumpMode> {
    match CACHED_MODE.load(Ordering::Acquire) {
        MODE_UNRESOLVED | MODE_RESOLVING => None,
        v => Some(u8_to_mode(v)),
    }
}

/// Path of the JSONL event log, if one is configured.
#[must_use]
pub fn event_log_path() -> Option<PathBuf> {
    std::env::var_os(LOG_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
