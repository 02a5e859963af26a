//! `RTLD_NEXT` resolution of the definitions our hooks shadow.

use std::ffi::{CStr, c_void};
use std::io::Write;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use sanidump_core::HookError;
use sanidump_core::strategy::{REPORT_ERROR_SUMMARY, SET_DEATH_CALLBACK};

/// The runtime's callback registration, shadowed by the dynamic hooks.
pub static REAL_SET_DEATH_CALLBACK: NextSymbol = NextSymbol::new(SET_DEATH_CALLBACK);
/// The runtime's summary printer, shadowed by the dynamic hooks.
pub static REAL_REPORT_ERROR_SUMMARY: NextSymbol = NextSymbol::new(REPORT_ERROR_SUMMARY);

/// Look up the next definition of `name` after the calling object.
pub fn resolve_next(name: &CStr) -> Result<NonNull<c_void>, HookError> {
    // SAFETY: `name` is NUL-terminated; RTLD_NEXT is a valid pseudo-handle.
    let sym = unsafe { libc::dlsym(libc::RTLD_NEXT, name.as_ptr()) };
    NonNull::new(sym).ok_or_else(|| HookError::MissingSymbol {
        symbol: name.to_string_lossy().into_owned(),
    })
}

/// Lazily resolved, cached `RTLD_NEXT` symbol.
#[derive(Debug)]
pub struct NextSymbol {
    name: &'static CStr,
    addr: AtomicPtr<c_void>,
}

impl NextSymbol {
    #[must_use]
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            name,
            addr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static CStr {
        self.name
    }

    /// Resolve once; concurrent first calls may both look up, with the same result.
    pub fn get(&self) -> Result<NonNull<c_void>, HookError> {
        if let Some(addr) = NonNull::new(self.addr.load(Ordering::Acquire)) {
            return Ok(addr);
        }
        let addr = resolve_next(self.name)?;
        self.addr.store(addr.as_ptr(), Ordering::Release);
        Ok(addr)
    }

    /// Like [`get`](Self::get), but aborts the process when the symbol is missing.
    pub fn require(&self) -> NonNull<c_void> {
        match self.get() {
            Ok(addr) => addr,
            Err(err) => fail_fast(&err),
        }
    }
}

/// Print a diagnostic to stderr and abort.
pub fn fail_fast(err: &HookError) -> ! {
    let _ = writeln!(std::io::stderr(), "sanidump: {err}");
    std::process::abort()
}
