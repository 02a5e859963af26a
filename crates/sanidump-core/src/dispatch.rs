//! Non-fatal finding dispatch.
//!
//! Runs synchronously inside `__sanitizer_report_error_summary`, after the
//! report was forwarded to the sanitizer runtime. Decides whether the
//! registered death callback has to be triggered manually:
//!
//! | report                  | policy   | action            |
//! |-------------------------|----------|-------------------|
//! | not ASan/UBSan          | -        | none              |
//! | ASan leak               | -        | none (engine)     |
//! | ASan / UBSan            | Halt     | none (death path) |
//! | ASan / UBSan            | Continue | trigger dump      |

use crate::config::DumpMode;
use crate::halt::{HaltPolicy, OptionSource, resolve_halt_policy};
use crate::summary::{SanitizerKind, classify};

/// Something that can dump the current fuzz input.
pub trait DumpTrigger {
    /// Trigger the dump. Returns `false` if nothing was registered to run.
    fn trigger_dump(&self) -> bool;
}

impl<T: DumpTrigger + ?Sized> DumpTrigger for &T {
    fn trigger_dump(&self) -> bool {
        (**self).trigger_dump()
    }
}

/// What the dispatcher did with one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not authored by a sanitizer family we act on.
    Unrecognized,
    /// ASan leak report; libFuzzer persists leak reproducers itself.
    LeakReport,
    /// The sanitizer halts, so the regular death path dumps the input.
    Halting(SanitizerKind),
    /// The death callback was triggered.
    Dumped(SanitizerKind),
    /// A dump was due but no callback has been registered.
    NoCallback(SanitizerKind),
    /// Dumping is switched off via `SANIDUMP_MODE`.
    Disabled,
}

impl Dispatch {
    #[must_use]
    pub const fn dumped(self) -> bool {
        matches!(self, Self::Dumped(_))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unrecognized => "unrecognized",
            Self::LeakReport => "leak_report",
            Self::Halting(_) => "halting",
            Self::Dumped(_) => "dumped",
            Self::NoCallback(_) => "no_callback",
            Self::Disabled => "disabled",
        }
    }
}

/// Error summary dispatcher over an option snapshot and a dump trigger.
#[derive(Debug)]
pub struct Dispatcher<O, T> {
    options: O,
    trigger: T,
    mode: DumpMode,
}

impl<O: OptionSource, T: DumpTrigger> Dispatcher<O, T> {
    pub fn new(options: O, trigger: T) -> Self {
        Self {
            options,
            trigger,
            mode: DumpMode::Enabled,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DumpMode) -> Self {
        self.mode = mode;
        self
    }

    /// Handle one error summary. Triggers the dump at most once.
    pub fn on_error_summary(&self, report: &[u8]) -> Dispatch {
        let class = classify(report);
        match class.kind {
            SanitizerKind::Other => return Dispatch::Unrecognized,
            SanitizerKind::AddressSafety if class.leak => return Dispatch::LeakReport,
            _ => {}
        }

        if !self.mode.dumps_enabled() {
            return Dispatch::Disabled;
        }

        let options = self.options.sanitizer_options(class.kind);
        match resolve_halt_policy(class.kind, options.as_deref()) {
            Some(HaltPolicy::Continue) => {
                if self.trigger.trigger_dump() {
                    Dispatch::Dumped(class.kind)
                } else {
                    Dispatch::NoCallback(class.kind)
                }
            }
            Some(HaltPolicy::Halt) => Dispatch::Halting(class.kind),
            None => Dispatch::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::halt::StaticOptions;

    #[derive(Default)]
    struct CountingTrigger {
        calls: Cell<u32>,
        registered: bool,
    }

    impl CountingTrigger {
        fn registered() -> Self {
            Self {
                calls: Cell::new(0),
                registered: true,
            }
        }
    }

    impl DumpTrigger for CountingTrigger {
        fn trigger_dump(&self) -> bool {
            if self.registered {
                self.calls.set(self.calls.get() + 1);
            }
            self.registered
        }
    }

    const ASAN_OVERFLOW: &[u8] =
        b"SUMMARY: AddressSanitizer: heap-buffer-overflow fuzz.c:10:3 in LLVMFuzzerTestOneInput";
    const ASAN_LEAK: &[u8] =
        b"SUMMARY: AddressSanitizer: 7 byte(s) leaked in 1 allocation(s).";
    const UBSAN_OVERFLOW: &[u8] =
        b"SUMMARY: UndefinedBehaviorSanitizer: undefined-behavior fuzz.c:4:12 in ";

    #[test]
    fn asan_non_halting_dumps_once() {
        let trigger = CountingTrigger::registered();
        let options = StaticOptions::unset().with_asan("halt_on_error=0");
        let d = Dispatcher::new(&options, &trigger);
        assert_eq!(
            d.on_error_summary(ASAN_OVERFLOW),
            Dispatch::Dumped(SanitizerKind::AddressSafety)
        );
        assert_eq!(trigger.calls.get(), 1);
    }

    #[test]
    fn asan_leak_never_dumps() {
        let trigger = CountingTrigger::registered();
        let options = StaticOptions::unset().with_asan("halt_on_error=0");
        let d = Dispatcher::new(&options, &trigger);
        assert_eq!(d.on_error_summary(ASAN_LEAK), Dispatch::LeakReport);
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn asan_unset_options_halts() {
        let trigger = CountingTrigger::registered();
        let d = Dispatcher::new(StaticOptions::unset(), &trigger);
        assert_eq!(
            d.on_error_summary(ASAN_OVERFLOW),
            Dispatch::Halting(SanitizerKind::AddressSafety)
        );
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn ubsan_unset_options_dumps_once() {
        let trigger = CountingTrigger::registered();
        let d = Dispatcher::new(StaticOptions::unset(), &trigger);
        assert_eq!(
            d.on_error_summary(UBSAN_OVERFLOW),
            Dispatch::Dumped(SanitizerKind::UndefinedBehavior)
        );
        assert_eq!(trigger.calls.get(), 1);
    }

    #[test]
    fn ubsan_halting_never_dumps() {
        let trigger = CountingTrigger::registered();
        let options = StaticOptions::unset().with_ubsan("halt_on_error=1");
        let d = Dispatcher::new(&options, &trigger);
        assert_eq!(
            d.on_error_summary(UBSAN_OVERFLOW),
            Dispatch::Halting(SanitizerKind::UndefinedBehavior)
        );
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn unrecognized_reports_are_ignored() {
        let trigger = CountingTrigger::registered();
        let options = StaticOptions::unset()
            .with_asan("halt_on_error=0")
            .with_ubsan("");
        let d = Dispatcher::new(&options, &trigger);
        assert_eq!(
            d.on_error_summary(b"SUMMARY: ThreadSanitizer: data race"),
            Dispatch::Unrecognized
        );
        assert_eq!(d.on_error_summary(b""), Dispatch::Unrecognized);
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn missing_callback_is_reported_not_fatal() {
        let trigger = CountingTrigger::default();
        let d = Dispatcher::new(StaticOptions::unset(), &trigger);
        assert_eq!(
            d.on_error_summary(UBSAN_OVERFLOW),
            Dispatch::NoCallback(SanitizerKind::UndefinedBehavior)
        );
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn disabled_mode_never_dumps() {
        let trigger = CountingTrigger::registered();
        let options = StaticOptions::unset().with_asan("halt_on_error=0");
        let d = Dispatcher::new(&options, &trigger).with_mode(DumpMode::Disabled);
        assert_eq!(d.on_error_summary(ASAN_OVERFLOW), Dispatch::Disabled);
        assert_eq!(d.on_error_summary(UBSAN_OVERFLOW), Dispatch::Disabled);
        // Classification outcomes still win over the mode.
        assert_eq!(d.on_error_summary(ASAN_LEAK), Dispatch::LeakReport);
        assert_eq!(trigger.calls.get(), 0);
    }

    #[test]
    fn each_report_dumps_independently() {
        let trigger = CountingTrigger::registered();
        let d = Dispatcher::new(StaticOptions::unset(), &trigger);
        for _ in 0..3 {
            assert!(d.on_error_summary(UBSAN_OVERFLOW).dumped());
        }
        assert_eq!(trigger.calls.get(), 3);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Dispatch::Unrecognized.label(), "unrecognized");
        assert_eq!(
            Dispatch::Dumped(SanitizerKind::AddressSafety).label(),
            "dumped"
        );
        assert!(!Dispatch::Halting(SanitizerKind::AddressSafety).dumped());
    }
}
