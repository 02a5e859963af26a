//! Link-time wrapping hook strategy.
//!
//! Used where the sanitizer runtime may be linked statically, so `RTLD_NEXT`
//! cannot find it. The fuzz target is linked with
//! `-Wl,--wrap=__sanitizer_set_death_callback`, routing registration through
//! [`__wrap___sanitizer_set_death_callback`].
//!
//! `__sanitizer_report_error_summary` is not wrapped: calls made from inside
//! the runtime never reach a `__wrap_` definition for it. It is instead
//! defined here outright, overriding the runtime's weak default. The default
//! body is a single `Printf("%s\n", error_summary)`, reproduced below.

use std::ffi::c_char;

use crate::context::CONTEXT;
use crate::registry::DeathCallback;

unsafe extern "C" {
    /// The runtime's definition, bound by the linker under `--wrap`.
    fn __real___sanitizer_set_death_callback(callback: Option<DeathCallback>);

    /// `__sanitizer::Printf(const char *format, ...)`.
    #[link_name = "_ZN11__sanitizer6PrintfEPKcz"]
    fn sanitizer_printf(format: *const c_char, ...);
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wrap___sanitizer_set_death_callback(callback: Option<DeathCallback>) {
    CONTEXT.on_death_callback_registered(callback);
    // SAFETY: resolved by the linker to the runtime's registration function.
    unsafe { __real___sanitizer_set_death_callback(callback) };
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn __sanitizer_report_error_summary(error_summary: *const c_char) {
    if !error_summary.is_null() {
        // SAFETY: static format string with one `%s` argument.
        unsafe { sanitizer_printf(c"%s\n".as_ptr(), error_summary) };
    }

    // SAFETY: the runtime passes a NUL-terminated summary (or null).
    unsafe { CONTEXT.on_error_summary(error_summary) };
}
