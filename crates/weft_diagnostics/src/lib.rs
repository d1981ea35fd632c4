//! Diagnostic creation, severity management, and terminal rendering.
//!
//! User-facing problems found while generating a fabric (an unsupported
//! clock-tree count, a block that cannot be emitted) are reported as
//! structured [`Diagnostic`]s collected in a [`DiagnosticSink`]. The caller
//! decides whether the run failed by asking the sink, and renders the
//! collected messages with a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
