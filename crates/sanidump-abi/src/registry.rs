//! Death callback slot.
//!
//! Holds the callback the fuzzing engine passed to
//! `__sanitizer_set_death_callback`. The latest registration wins. Reads are
//! lock-free so the slot can be consulted from whatever thread a sanitizer
//! reports on.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use sanidump_core::DumpTrigger;

/// C type `void (*)(void)`.
pub type DeathCallback = unsafe extern "C" fn();

#[derive(Debug)]
pub struct CallbackRegistry {
    slot: AtomicPtr<()>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Store `callback`, returning the one it replaces. `None` empties the slot.
    pub fn register(&self, callback: Option<DeathCallback>) -> Option<DeathCallback> {
        let raw = callback.map_or(ptr::null_mut(), |f| f as *mut ());
        from_raw(self.slot.swap(raw, Ordering::AcqRel))
    }

    #[must_use]
    pub fn current(&self) -> Option<DeathCallback> {
        from_raw(self.slot.load(Ordering::Acquire))
    }

    /// Call the registered callback. No-op returning `false` when empty.
    pub fn invoke(&self) -> bool {
        match self.current() {
            Some(callback) => {
                // SAFETY: only values obtained from a `DeathCallback` are stored.
                unsafe { callback() };
                true
            }
            None => false,
        }
    }
}

impl DumpTrigger for CallbackRegistry {
    fn trigger_dump(&self) -> bool {
        self.invoke()
    }
}

fn from_raw(raw: *mut ()) -> Option<DeathCallback> {
    if raw.is_null() {
        None
    } else {
        // SAFETY: non-null slot values are always `DeathCallback` pointers.
        Some(unsafe { std::mem::transmute::<*mut (), DeathCallback>(raw) })
    }
}
