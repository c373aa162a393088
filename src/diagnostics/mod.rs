//! Positioned diagnostics
//!
//! Every recoverable problem found while parsing is appended to a
//! [`Diagnostics`] sink in the order it was found. Reporting never unwinds:
//! the production that noticed the problem picks its own synchronization
//! point and carries on, so one run can surface many errors.
//!
//! # Suppression
//!
//! A missing token is often noticed by more than one production (the
//! expression loop sees a stray identifier, then the statement wants its
//! `;`). A syntax diagnostic at the same position as the previous syntax
//! diagnostic is therefore dropped.

use crate::parser::ast::SourceLocation;
use std::fmt;

/// Category of a recoverable error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A required token or construct is absent
    Syntax,
    /// A name is declared twice in one scope
    Redeclaration,
    /// A name is not found in any enclosing scope
    UndefinedReference,
    /// Structural type equality failed where it is required
    TypeMismatch,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Syntax => write!(f, "Syntax error"),
            DiagnosticKind::Redeclaration => write!(f, "Redeclaration"),
            DiagnosticKind::UndefinedReference => write!(f, "Undefined reference"),
            DiagnosticKind::TypeMismatch => write!(f, "Type mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.location, self.message)
    }
}

/// Ordered collection of everything reported during one run
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    last_syntax_at: Option<SourceLocation>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: SourceLocation,
    ) {
        if kind == DiagnosticKind::Syntax {
            if self.last_syntax_at == Some(location) {
                return;
            }
            self.last_syntax_at = Some(location);
        }

        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            location,
        };
        log::debug!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn syntax(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.report(DiagnosticKind::Syntax, message, location);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_syntax_error_is_suppressed() {
        let mut diags = Diagnostics::new();
        let here = SourceLocation::new(3, 7);

        diags.syntax("perhaps missing ';'", here);
        diags.syntax("expected ';'", here);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().message, "perhaps missing ';'");
    }

    #[test]
    fn test_semantic_errors_are_never_suppressed() {
        let mut diags = Diagnostics::new();
        let here = SourceLocation::new(1, 1);

        diags.report(DiagnosticKind::TypeMismatch, "first", here);
        diags.report(DiagnosticKind::TypeMismatch, "second", here);
        diags.syntax("third", SourceLocation::new(1, 2));
        diags.syntax("fourth", SourceLocation::new(1, 3));

        assert_eq!(diags.count(DiagnosticKind::TypeMismatch), 2);
        assert_eq!(diags.count(DiagnosticKind::Syntax), 2);
    }

    #[test]
    fn test_display_includes_kind_and_position() {
        let d = Diagnostic {
            kind: DiagnosticKind::Redeclaration,
            message: "'x' is already declared in this scope".to_string(),
            location: SourceLocation::new(2, 9),
        };
        assert_eq!(
            d.to_string(),
            "Redeclaration at line 2, column 9: 'x' is already declared in this scope"
        );
    }
}
