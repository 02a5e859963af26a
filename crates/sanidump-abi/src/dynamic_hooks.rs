//! `RTLD_NEXT` hook strategy.
//!
//! Used where the sanitizer runtime is always a separate shared object
//! (Darwin, or any target with the `dynamic-hooks` feature). The fuzz target
//! defines the runtime's own extension point names; the runtime's
//! definitions are reached through `dlsym(RTLD_NEXT, ...)`.

use std::ffi::c_char;
#[cfg(target_vendor = "apple")]
use std::ffi::{c_int, c_void};

use crate::context::CONTEXT;
use crate::registry::DeathCallback;
#[cfg(target_vendor = "apple")]
use crate::symbols::NextSymbol;
use crate::symbols::{REAL_REPORT_ERROR_SUMMARY, REAL_SET_DEATH_CALLBACK};

type SetDeathCallbackFn = unsafe extern "C" fn(Option<DeathCallback>);
type ReportErrorSummaryFn = unsafe extern "C" fn(*const c_char);

/// Capture the engine's death callback, then register it with the runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __sanitizer_set_death_callback(callback: Option<DeathCallback>) {
    CONTEXT.on_death_callback_registered(callback);

    let real = REAL_SET_DEATH_CALLBACK.require();
    // Resolve now: a missing summary hook has to abort at startup, not on
    // the first finding.
    REAL_REPORT_ERROR_SUMMARY.require();

    // SAFETY: the next definition has the runtime's documented signature.
    let real: SetDeathCallbackFn = unsafe { std::mem::transmute(real.as_ptr()) };
    unsafe { real(callback) };
}

/// Forward the summary to the runtime, then dump if the finding is non-fatal.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __sanitizer_report_error_summary(error_summary: *const c_char) {
    let real = REAL_REPORT_ERROR_SUMMARY.require();
    // SAFETY: the next definition has the runtime's documented signature.
    let real: ReportErrorSummaryFn = unsafe { std::mem::transmute(real.as_ptr()) };
    unsafe { real(error_summary) };

    // SAFETY: the runtime passes a NUL-terminated summary (or null).
    unsafe { CONTEXT.on_error_summary(error_summary) };
}

// ASan on Darwin verifies its interceptors by checking that `puts` (older
// runtimes: `pthread_create`) is defined in the same image as
// `__sanitizer_report_error_summary`. Both are plain passthroughs.

#[cfg(target_vendor = "apple")]
static REAL_PUTS: NextSymbol = NextSymbol::new(c"puts");
#[cfg(target_vendor = "apple")]
static REAL_PTHREAD_CREATE: NextSymbol = NextSymbol::new(c"pthread_create");

#[cfg(target_vendor = "apple")]
type PutsFn = unsafe extern "C" fn(*const c_char) -> c_int;
#[cfg(target_vendor = "apple")]
type StartRoutine = extern "C" fn(*mut c_void) -> *mut c_void;
#[cfg(target_vendor = "apple")]
type PthreadCreateFn = unsafe extern "C" fn(
    *mut libc::pthread_t,
    *const libc::pthread_attr_t,
    StartRoutine,
    *mut c_void,
) -> c_int;

#[cfg(target_vendor = "apple")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn puts(s: *const c_char) -> c_int {
    // SAFETY: libc `puts` signature.
    let real: PutsFn = unsafe { std::mem::transmute(REAL_PUTS.require().as_ptr()) };
    unsafe { real(s) }
}

#[cfg(target_vendor = "apple")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pthread_create(
    thread: *mut libc::pthread_t,
    attr: *const libc::pthread_attr_t,
    start_routine: StartRoutine,
    arg: *mut c_void,
) -> c_int {
    // SAFETY: libc `pthread_create` signature.
    let real: PthreadCreateFn =
        unsafe { std::mem::transmute(REAL_PTHREAD_CREATE.require().as_ptr()) };
    unsafe { real(thread, attr, start_routine, arg) }
}
