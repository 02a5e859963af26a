//! Process-wide hook context.
//!
//! Owns the death callback slot and the event log, and connects the exported
//! hook symbols to the platform-independent dispatcher. The hooks use the
//! single [`CONTEXT`] instance; tests build their own.

use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::{CStr, c_char};
use std::io::Write;
use std::sync::OnceLock;

use sanidump_core::config::{self, DumpMode};
use sanidump_core::event_log::{DispatchRecord, EventLog};
use sanidump_core::{Dispatch, Dispatcher, OptionSource, SanitizerKind};

use crate::registry::{CallbackRegistry, DeathCallback};

pub static CONTEXT: HookContext = HookContext::new();

std::thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as dispatching; `None` if it already is.
struct ReentrancyGuard;

impl ReentrancyGuard {
    fn enter() -> Option<Self> {
        DISPATCHING.with(|flag| {
            if flag.replace(true) {
                None
            } else {
                Some(Self)
            }
        })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

/// Sanitizer option strings read straight from the C environment.
///
/// `getenv` avoids the lock `std::env` takes, which the reporting thread may
/// already hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions;

impl ProcessOptions {
    fn var(kind: SanitizerKind) -> Option<&'static CStr> {
        match kind {
            SanitizerKind::AddressSafety => Some(c"ASAN_OPTIONS"),
            SanitizerKind::UndefinedBehavior => Some(c"UBSAN_OPTIONS"),
            SanitizerKind::Other => None,
        }
    }
}

impl OptionSource for ProcessOptions {
    fn sanitizer_options(&self, kind: SanitizerKind) -> Option<Cow<'_, [u8]>> {
        let var = Self::var(kind)?;
        // SAFETY: `var` is NUL-terminated.
        let value = unsafe { libc::getenv(var.as_ptr()) };
        if value.is_null() {
            return None;
        }
        // SAFETY: getenv returns a NUL-terminated string; copied before any
        // later setenv can invalidate it.
        Some(Cow::Owned(unsafe { CStr::from_ptr(value) }.to_bytes().to_vec()))
    }
}

#[derive(Debug)]
pub struct HookContext {
    registry: CallbackRegistry,
    event_log: OnceLock<EventLog>,
    mode: Option<DumpMode>,
}

impl Default for HookContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HookContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registry: CallbackRegistry::new(),
            event_log: OnceLock::new(),
            mode: None,
        }
    }

    /// Fix the dump mode instead of reading `SANIDUMP_MODE`.
    #[must_use]
    pub fn with_mode(mut self, mode: DumpMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Use `log` instead of the one named by `SANIDUMP_LOG`.
    #[must_use]
    pub fn with_event_log(self, log: EventLog) -> Self {
        let _ = self.event_log.set(log);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// The dump mode, resolving `SANIDUMP_MODE` if that has not happened yet.
    #[must_use]
    pub fn mode(&self) -> DumpMode {
        self.mode.unwrap_or_else(config::dump_mode)
    }

    /// Mode as seen from the report path: never touches the environment.
    /// Before registration resolves it, the default applies.
    fn report_mode(&self) -> DumpMode {
        self.mode
            .or_else(config::cached_dump_mode)
            .unwrap_or_default()
    }

    /// Record the engine's death callback. Called during engine startup,
    /// which is also when the mode is resolved and the event log is opened.
    pub fn on_death_callback_registered(
        &self,
        callback: Option<DeathCallback>,
    ) -> Option<DeathCallback> {
        let _ = self.mode();
        self.event_log.get_or_init(open_configured_log);
        self.registry.register(callback)
    }

    /// Dispatch a C error summary. `None` when the pointer is null or the
    /// report was raised from inside a dispatch on the same thread.
    ///
    /// # Safety
    ///
    /// `report` must be null or point to a NUL-terminated string.
    pub unsafe fn on_error_summary(&self, report: *const c_char) -> Option<Dispatch> {
        if report.is_null() {
            return None;
        }
        // SAFETY: caller guarantees a NUL-terminated string.
        let report = unsafe { CStr::from_ptr(report) }.to_bytes();
        self.dispatch(report, ProcessOptions)
    }

    /// Dispatch `report` against an explicit option snapshot.
    pub fn dispatch(&self, report: &[u8], options: impl OptionSource) -> Option<Dispatch> {
        let _guard = ReentrancyGuard::enter()?;
        let dispatch = Dispatcher::new(options, &self.registry)
            .with_mode(self.report_mode())
            .on_error_summary(report);
        if let Some(log) = self.event_log.get() {
            log.emit(&DispatchRecord::new(report, dispatch));
        }
        Some(dispatch)
    }
}

fn open_configured_log() -> EventLog {
    let Some(path) = config::event_log_path() else {
        return EventLog::disabled();
    };
    EventLog::open(&path).unwrap_or_else(|err| {
        let _ = writeln!(
            std::io::stderr(),
            "sanidump: cannot open {}: {err}",
            path.display()
        );
        EventLog::disabled()
    })
}
