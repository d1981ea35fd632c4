//! Collects the diagnostics of one generation run.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use std::cell::{Cell, RefCell};

/// Diagnostics reported by the passes of a single run.
///
/// Generation is sequential, so passes share the sink by reference and
/// emit through `&self`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
    errors: Cell<usize>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.set(self.errors.get() + 1);
        }
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Returns `true` if an error was emitted; the run must not write output.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }

    /// Number of errors emitted.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Returns `true` if a diagnostic with `code` is held.
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.code == code)
    }

    /// Copies of the held diagnostics, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;
    use crate::location::Location;

    const TWO_TREES: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
    const NO_TREE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);

    fn two_trees() -> Diagnostic {
        Diagnostic::error(
            TWO_TREES,
            "clock network has 2 trees, only 1 is supported",
            Location::config("clock_network.trees"),
        )
    }

    fn no_tree() -> Diagnostic {
        Diagnostic::warning(NO_TREE, "no clock tree", Location::config("clock_network.trees"))
    }

    #[test]
    fn warning_does_not_fail_the_run() {
        let sink = DiagnosticSink::new();
        sink.emit(no_tree());
        assert!(!sink.has_errors());
        assert!(sink.contains(NO_TREE));
        assert!(!sink.contains(TWO_TREES));
    }

    #[test]
    fn error_fails_the_run() {
        let sink = DiagnosticSink::new();
        sink.emit(no_tree());
        sink.emit(two_trees());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        let codes: Vec<DiagnosticCode> = sink.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![NO_TREE, TWO_TREES]);
    }

    #[test]
    fn notes_do_not_count_as_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::new(
            DiagnosticCode::new(Category::Info, 1),
            "connection block without pins skipped",
            Location::tile(2, 1),
        ));
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.diagnostics().len(), 1);
    }
}
