//! Dispatch matrix: every combination of report family, leak marker and
//! option string against the expected number of dumps.

use std::cell::Cell;

use sanidump_core::config::DumpMode;
use sanidump_core::{Dispatch, Dispatcher, DumpTrigger, SanitizerKind, StaticOptions};

struct Trigger {
    calls: Cell<u32>,
}

impl DumpTrigger for Trigger {
    fn trigger_dump(&self) -> bool {
        self.calls.set(self.calls.get() + 1);
        true
    }
}

#[derive(Clone, Copy)]
struct Case {
    report: &'static str,
    asan_options: Option<&'static str>,
    ubsan_options: Option<&'static str>,
    expected_dumps: u32,
}

const ASAN_OVERFLOW: &str = "SUMMARY: AddressSanitizer: heap-buffer-overflow trigger_bugs.cpp:26 in ";
const ASAN_UAF: &str = "SUMMARY: AddressSanitizer: heap-use-after-free trigger_bugs.cpp:31 in ";
const ASAN_LEAK: &str = "SUMMARY: AddressSanitizer: 7 byte(s) leaked in 1 allocation(s).";
const UBSAN_SIGNED: &str =
    "SUMMARY: UndefinedBehaviorSanitizer: undefined-behavior trigger_bugs.cpp:40:7 in ";
const TSAN_RACE: &str = "SUMMARY: ThreadSanitizer: data race trigger_bugs.cpp:50 in worker";

fn matrix_cases() -> Vec<Case> {
    let no_halt = [
        "halt_on_error=0",
        "halt_on_error=no",
        "halt_on_error=false",
        "detect_leaks=1:halt_on_error=0",
    ];
    let halt = [
        "halt_on_error=1",
        "halt_on_error=yes",
        "halt_on_error=true",
        "print_stacktrace=1:halt_on_error=1",
    ];
    let neutral: [Option<&'static str>; 3] = [None, Some(""), Some("detect_leaks=0")];

    let mut cases = Vec::new();

    for report in [ASAN_OVERFLOW, ASAN_UAF] {
        for opts in no_halt {
            cases.push(Case {
                report,
                asan_options: Some(opts),
                ubsan_options: None,
                expected_dumps: 1,
            });
        }
        for opts in neutral.into_iter().chain(halt.map(Some)) {
            cases.push(Case {
                report,
                asan_options: opts,
                ubsan_options: None,
                expected_dumps: 0,
            });
        }
    }

    for opts in neutral.into_iter().chain(no_halt.map(Some)).chain(halt.map(Some)) {
        cases.push(Case {
            report: ASAN_LEAK,
            asan_options: opts,
            ubsan_options: None,
            expected_dumps: 0,
        });
    }

    for opts in neutral.into_iter().chain(no_halt.map(Some)) {
        cases.push(Case {
            report: UBSAN_SIGNED,
            asan_options: None,
            ubsan_options: opts,
            expected_dumps: 1,
        });
    }
    for opts in halt {
        cases.push(Case {
            report: UBSAN_SIGNED,
            asan_options: None,
            ubsan_options: Some(opts),
            expected_dumps: 0,
        });
    }

    for asan in [None, Some("halt_on_error=0")] {
        for ubsan in [None, Some("halt_on_error=1")] {
            cases.push(Case {
                report: TSAN_RACE,
                asan_options: asan,
                ubsan_options: ubsan,
                expected_dumps: 0,
            });
        }
    }

    cases
}

fn options_for(case: &Case) -> StaticOptions {
    let mut options = StaticOptions::unset();
    if let Some(asan) = case.asan_options {
        options = options.with_asan(asan);
    }
    if let Some(ubsan) = case.ubsan_options {
        options = options.with_ubsan(ubsan);
    }
    options
}

#[test]
fn dispatch_matrix_matches_expected_dump_counts() {
    let cases = matrix_cases();
    assert!(cases.len() > 30);
    for case in &cases {
        let trigger = Trigger {
            calls: Cell::new(0),
        };
        let dispatcher = Dispatcher::new(options_for(case), &trigger);
        let outcome = dispatcher.on_error_summary(case.report.as_bytes());
        assert_eq!(
            trigger.calls.get(),
            case.expected_dumps,
            "report={:?} asan={:?} ubsan={:?} outcome={:?}",
            case.report,
            case.asan_options,
            case.ubsan_options,
            outcome
        );
        assert_eq!(outcome.dumped(), case.expected_dumps == 1);
    }
}

#[test]
fn scenario_asan_overflow_without_halt() {
    let trigger = Trigger {
        calls: Cell::new(0),
    };
    let options = StaticOptions::unset().with_asan("halt_on_error=0");
    let outcome = Dispatcher::new(options, &trigger)
        .on_error_summary(b"SUMMARY: AddressSanitizer: heap-buffer-overflow ...");
    assert_eq!(outcome, Dispatch::Dumped(SanitizerKind::AddressSafety));
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn scenario_asan_leak_without_halt() {
    let trigger = Trigger {
        calls: Cell::new(0),
    };
    let options = StaticOptions::unset().with_asan("halt_on_error=0");
    let outcome = Dispatcher::new(options, &trigger)
        .on_error_summary(b"SUMMARY: AddressSanitizer: 7 byte(s) leaked in ...");
    assert_eq!(outcome, Dispatch::LeakReport);
    assert_eq!(trigger.calls.get(), 0);
}

#[test]
fn scenario_ubsan_unset_options() {
    let trigger = Trigger {
        calls: Cell::new(0),
    };
    let outcome = Dispatcher::new(StaticOptions::unset(), &trigger)
        .on_error_summary(b"SUMMARY: UndefinedBehaviorSanitizer: ...");
    assert_eq!(outcome, Dispatch::Dumped(SanitizerKind::UndefinedBehavior));
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn scenario_ubsan_halting() {
    let trigger = Trigger {
        calls: Cell::new(0),
    };
    let options = StaticOptions::unset().with_ubsan("halt_on_error=1");
    let outcome = Dispatcher::new(options, &trigger)
        .on_error_summary(b"SUMMARY: UndefinedBehaviorSanitizer: ...");
    assert_eq!(outcome, Dispatch::Halting(SanitizerKind::UndefinedBehavior));
    assert_eq!(trigger.calls.get(), 0);
}

#[test]
fn combined_sanitizers_dump_once_per_report() {
    // ASan (non-halting) and UBSan both report for the same input: each
    // report dumps on its own, yielding one extra artifact.
    let trigger = Trigger {
        calls: Cell::new(0),
    };
    let options = StaticOptions::unset().with_asan("halt_on_error=0");
    let dispatcher = Dispatcher::new(options, &trigger);
    assert!(dispatcher.on_error_summary(ASAN_OVERFLOW.as_bytes()).dumped());
    assert!(dispatcher.on_error_summary(UBSAN_SIGNED.as_bytes()).dumped());
    assert_eq!(trigger.calls.get(), 2);
}

#[test]
fn disabled_mode_suppresses_whole_matrix() {
    for case in matrix_cases() {
        let trigger = Trigger {
            calls: Cell::new(0),
        };
        let dispatcher =
            Dispatcher::new(options_for(&case), &trigger).with_mode(DumpMode::Disabled);
        let _ = dispatcher.on_error_summary(case.report.as_bytes());
        assert_eq!(trigger.calls.get(), 0, "report={:?}", case.report);
    }
}
