//! Shared foundational types used across the Weft fabric generator.
//!
//! This crate provides the internal-error result type, structural content
//! hashing used to detect identical fabric blocks, the execution status of
//! generation passes, and a scoped timer for logging the duration of
//! long-running phases.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod status;
pub mod timer;

pub use hash::ContentHash;
pub use result::{InternalError, WeftResult};
pub use status::ExecStatus;
pub use timer::ScopedTimer;
