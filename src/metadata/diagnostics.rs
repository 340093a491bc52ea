//! Diagnostics collection for weaving passes.
//!
//! This module provides types for collecting and reporting diagnostic messages
//! while a module is being transformed. Weaving is lenient by design: a policy
//! violation (for example an externally owned type that fails an eligibility
//! check) is reported here and the pass continues. Only structural
//! impossibilities abort a pass, and those travel through [`crate::Error`],
//! not through this sink.
//!
//! # Architecture
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for lock-free append
//! operations, so a host can hand one shared sink to every pass of a weaving
//! run and read it back afterwards. Passes only ever emit into the sink; they
//! never inspect it, and nothing recorded here changes control flow of an
//! in-progress pass.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Append-only container for diagnostic entries
//! - [`Diagnostic`] - Individual entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Which part of the weave produced the entry
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::metadata::diagnostics::{Diagnostics, DiagnosticCategory};
//!
//! let diagnostics = Diagnostics::new();
//!
//! diagnostics.warning(
//!     DiagnosticCategory::Propagation,
//!     "external type System.Uri is not serializable",
//! );
//!
//! assert!(diagnostics.has_warnings());
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```

use std::fmt::{self, Write};

use crate::metadata::token::Token;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for noting unusual but valid constructs.
    Info,

    /// Warning about a policy violation.
    ///
    /// The weave completes, but the reported element was left untouched or
    /// does not satisfy the property the transform establishes elsewhere.
    Warning,

    /// Error-level observation.
    ///
    /// Recorded when a pass skipped an element it could not process but chose
    /// to continue. A host may treat any error-level entry as build-failing
    /// after the run completes.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating which part of the weave produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Serializability closure propagation.
    ///
    /// Examples: externally owned field types failing the eligibility check.
    Propagation,

    /// Virtual-dispatch normalization.
    ///
    /// Examples: candidates skipped for structural reasons worth surfacing.
    Dispatch,

    /// Call-site rewriting inside method bodies.
    Rewrite,

    /// Type resolution and registry issues.
    Type,

    /// Method resolution and body issues.
    Method,

    /// General weaving issues not fitting other categories.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Propagation => write!(f, "Propagation"),
            DiagnosticCategory::Dispatch => write!(f, "Dispatch"),
            DiagnosticCategory::Rewrite => write!(f, "Rewrite"),
            DiagnosticCategory::Type => write!(f, "Type"),
            DiagnosticCategory::Method => write!(f, "Method"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry with context information.
///
/// Contains the severity, category, message and optionally the metadata token
/// of the element the entry refers to, so a host can map the diagnostic back
/// to a source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional metadata token related to the issue.
    pub token: Option<Token>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            token: None,
        }
    }

    /// Adds metadata token information to the diagnostic.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(token) = self.token {
            write!(f, " (token: {token})")?;
        }

        Ok(())
    }
}

/// Append-only container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free append operations, so the
/// container can be shared by reference across an entire weaving run without
/// synchronization.
///
/// # Example
///
/// ```rust
/// use cilweave::metadata::diagnostics::{Diagnostics, DiagnosticCategory};
///
/// let diagnostics = Diagnostics::new();
/// diagnostics.warning(DiagnosticCategory::Type, "unresolvable field type");
/// assert_eq!(diagnostics.warning_count(), 1);
/// ```
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly.
    ///
    /// Use this for diagnostics that carry a token.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for the host's build log.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} total",
            error_count,
            warning_count,
            self.count()
        );

        for diag in self.iter() {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Propagation,
            "Test message",
        );

        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert_eq!(diag.category, DiagnosticCategory::Propagation);
        assert_eq!(diag.message, "Test message");
        assert!(diag.token.is_none());
    }

    #[test]
    fn test_diagnostic_with_token() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Type,
            "Unresolvable",
        )
        .with_token(Token::new(0x0100_0005));

        assert_eq!(diag.token, Some(Token::new(0x0100_0005)));
        let display = format!("{diag}");
        assert!(display.contains("ERROR"));
        assert!(display.contains("0x01000005"));
    }

    #[test]
    fn test_diagnostics_container() {
        let diagnostics = Diagnostics::new();

        diagnostics.info(DiagnosticCategory::General, "Info message");
        diagnostics.warning(DiagnosticCategory::Propagation, "Warning message");
        diagnostics.error(DiagnosticCategory::Dispatch, "Error message");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert!(diagnostics.has_any());
    }

    #[test]
    fn test_diagnostics_by_category() {
        let diagnostics = Diagnostics::new();

        diagnostics.warning(DiagnosticCategory::Propagation, "a");
        diagnostics.warning(DiagnosticCategory::Propagation, "b");
        diagnostics.warning(DiagnosticCategory::Dispatch, "c");

        assert_eq!(
            diagnostics
                .by_category(DiagnosticCategory::Propagation)
                .len(),
            2
        );
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Dispatch).len(), 1);
    }
}
