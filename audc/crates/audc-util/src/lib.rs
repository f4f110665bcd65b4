//! audc-util - Foundation types shared by every stage of the Aud pipeline.
//!
//! This crate holds the pieces that the lexer, parser, type checker and
//! interpreter all agree on: source positions, diagnostics, and the
//! configurable limits. It has no dependency on any other `audc-*` crate.

pub mod diagnostic;
pub mod limits;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticKind, Handler};
pub use limits::Limits;
pub use span::Span;

// Fx hash maps are used for scope frames and world indices throughout the
// pipeline; re-exported here so downstream crates share one import path.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
