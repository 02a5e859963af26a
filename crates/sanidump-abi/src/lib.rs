// Exported hooks take raw pointers from the sanitizer runtime; each one
// documents its contract inline.
#![allow(clippy::missing_safety_doc)]
//! # sanidump-abi
//!
//! Sanitizer hook symbols that persist the current fuzz input on non-fatal
//! findings.
//!
//! This crate produces a static archive that is linked into a
//! sanitizer-instrumented fuzz target. It intercepts the two sanitizer
//! extension points:
//!
//! ```text
//! engine  -> __sanitizer_set_death_callback   -> registry -> runtime
//! runtime -> __sanitizer_report_error_summary -> runtime (print) -> dispatcher
//!                                                              -> death callback
//! ```
//!
//! The hook strategy is chosen by `build.rs`: `RTLD_NEXT` lookup on Darwin
//! (or with the `dynamic-hooks` feature), link-time `--wrap` elsewhere. See
//! [`LINKER_FLAGS`] for what the fuzz target link needs.

pub mod context;
pub mod registry;
pub mod symbols;

// The hook modules export sanitizer runtime symbol names and reference
// symbols only a sanitizer-linked binary provides; they stay out of test
// builds.
#[cfg(all(hook_strategy = "dynamic", not(test)))]
pub mod dynamic_hooks;
#[cfg(all(hook_strategy = "wrap", not(test)))]
pub mod wrap_hooks;

use sanidump_core::strategy::HookStrategy;

pub use context::{CONTEXT, HookContext, ProcessOptions};
pub use registry::{CallbackRegistry, DeathCallback};

/// Hook strategy compiled into this build.
pub const HOOK_STRATEGY: HookStrategy = if cfg!(hook_strategy = "dynamic") {
    HookStrategy::DynamicSymbol
} else {
    HookStrategy::LinkWrap
};

/// Space-separated linker flags the fuzz target must be linked with.
pub const LINKER_FLAGS: &str = env!("SANIDUMP_LINKER_FLAGS");
