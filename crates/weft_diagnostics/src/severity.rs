//! How serious a fabric diagnostic is.

use crate::code::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic, least severe first.
///
/// Only [`Severity::Error`] makes a generation pass return a fatal status.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Information about the generated fabric.
    Note,
    /// The fabric is generated, but probably not as intended.
    Warning,
    /// Generation stops.
    Error,
}

impl Severity {
    /// Severity implied by a code's category (`E`, `W` or `I`).
    pub fn of_category(category: Category) -> Self {
        match category {
            Category::Error => Severity::Error,
            Category::Warning => Severity::Warning,
            Category::Info => Severity::Note,
        }
    }

    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Lowercase label printed before the code.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;

    #[test]
    fn clock_codes_map_to_their_severity() {
        let unsupported = DiagnosticCode::new(Category::Error, 301);
        let no_tree = DiagnosticCode::new(Category::Warning, 302);
        assert!(Severity::of_category(unsupported.category).is_error());
        assert_eq!(Severity::of_category(no_tree.category), Severity::Warning);
        assert_eq!(Severity::of_category(Category::Info), Severity::Note);
    }

    #[test]
    fn only_errors_are_fatal() {
        assert!(Severity::Warning < Severity::Error);
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Note.is_error());
    }

    #[test]
    fn header_labels() {
        assert_eq!(format!("{}[W302]", Severity::Warning), "warning[W302]");
        assert_eq!(Severity::Note.label(), "note");
    }
}
