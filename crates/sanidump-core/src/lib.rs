//! # sanidump-core
//!
//! Platform-independent logic for persisting fuzz inputs on non-fatal
//! sanitizer findings.
//!
//! A sanitizer that is configured to keep running after a finding never
//! invokes the fuzzing engine's death callback, so the reproducer is lost.
//! This crate decides, per error summary, whether the callback has to be
//! invoked manually:
//!
//! ```text
//! error summary -> classify -> resolve halt policy -> (Continue) trigger dump
//! ```
//!
//! Symbol interposition and the callback slot itself live in the
//! `sanidump-abi` crate. No `unsafe` code is permitted here.

#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event_log;
pub mod halt;
pub mod strategy;
pub mod summary;

pub use dispatch::{Dispatch, Dispatcher, DumpTrigger};
pub use error::HookError;
pub use halt::{HaltPolicy, OptionSource, StaticOptions, resolve_halt_policy};
pub use summary::{Classification, SanitizerKind, classify};
