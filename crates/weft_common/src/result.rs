//! Common result and error types for the Weft generator.

/// The standard result type for fallible internal operations.
///
/// `Err` means a fabric invariant was violated (a node missing from a lookup,
/// a count that does not match its estimate, two allocations for one block).
/// Those are bugs in Weft or in the graph it was handed, never user input
/// problems. User-facing problems go to a
/// [`DiagnosticSink`](https://docs.rs/weft_diagnostics) and the operation
/// reports a fatal status instead.
pub type WeftResult<T> = Result<T, InternalError>;

/// An internal error indicating a broken fabric invariant.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("node missing from lookup");
        assert_eq!(format!("{err}"), "internal error: node missing from lookup");
    }

    #[test]
    fn question_mark_propagates() {
        fn inner() -> WeftResult<u32> {
            Err(InternalError::new("boom"))
        }
        fn outer() -> WeftResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer().unwrap_err().message, "boom");
    }

    #[test]
    fn from_string() {
        let err: InternalError = format!("block ({}, {})", 1, 2).into();
        assert_eq!(err.message, "block (1, 2)");
    }
}
