// 🩺 Diagnostics - recoverable per-row problems collected during a run
//
// Loaders and classifiers push entries here instead of printing. The caller
// decides when (and whether) to replay them through the logger.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// DIAGNOSTIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning, // Row dropped or degraded mode entered
    Info,    // Expected gap, nothing the user must fix
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// No candidate date format matched the sample, fallback used
    DateFormatFallback,
    /// Timestamp did not parse with the detected format
    InvalidDate,
    /// Numeric field could not be parsed, the row is kept
    InvalidNumber,
    /// Balance change could not be parsed, the row is dropped
    InvalidQuantity,
    /// Operation type matched none of the known branches
    UnrecognizedOperation,
    /// Order execution leg with no opposite leg inside the pairing window
    UnmatchedLeg,
    /// Row produced neither a sent nor a received amount
    EmptyTransaction,
}

impl DiagnosticKind {
    pub fn name(&self) -> &str {
        match self {
            DiagnosticKind::DateFormatFallback => "date_format_fallback",
            DiagnosticKind::InvalidDate => "invalid_date",
            DiagnosticKind::InvalidNumber => "invalid_number",
            DiagnosticKind::InvalidQuantity => "invalid_quantity",
            DiagnosticKind::UnrecognizedOperation => "unrecognized_operation",
            DiagnosticKind::UnmatchedLeg => "unmatched_leg",
            DiagnosticKind::EmptyTransaction => "empty_transaction",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// 1-based physical line in the input file
    pub line: Option<usize>,
    pub message: String,
}

// ============================================================================
// COLLECTOR
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn warn(&mut self, kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Warning, kind, line, message);
    }

    pub fn info(&mut self, kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Info, kind, line, message);
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        line: Option<usize>,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            severity,
            kind,
            line,
            message: message.into(),
        });
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn warnings(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows dropped per kind, skipping kinds with none.
    /// Each of these kinds is recorded at most once per row.
    pub fn dropped_rows(&self) -> Vec<(DiagnosticKind, usize)> {
        [
            DiagnosticKind::InvalidDate,
            DiagnosticKind::InvalidQuantity,
            DiagnosticKind::UnrecognizedOperation,
            DiagnosticKind::EmptyTransaction,
        ]
        .into_iter()
        .map(|kind| (kind, self.count(kind)))
        .filter(|(_, n)| *n > 0)
        .collect()
    }

    /// Replay every entry through tracing, followed by per-kind drop counts
    pub fn log(&self) {
        for d in &self.entries {
            let location = d.line.map(|l| format!(" (line {})", l)).unwrap_or_default();
            match d.severity {
                Severity::Warning => warn!(kind = d.kind.name(), "{}{}", d.message, location),
                Severity::Info => info!(kind = d.kind.name(), "{}{}", d.message, location),
            }
        }

        for (kind, n) in self.dropped_rows() {
            warn!("{} row(s) dropped: {}", n, kind.name());
        }

        let bad_fields = self.count(DiagnosticKind::InvalidNumber);
        if bad_fields > 0 {
            warn!("{} invalid number field(s) read as empty", bad_fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_without_logging() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.warn(DiagnosticKind::InvalidDate, Some(4), "bad date 'x'");
        diags.warn(DiagnosticKind::InvalidDate, Some(7), "bad date 'y'");
        diags.info(DiagnosticKind::UnmatchedLeg, Some(9), "no partner");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::InvalidDate), 2);
        assert_eq!(diags.count(DiagnosticKind::UnrecognizedOperation), 0);
        assert_eq!(diags.warnings(), 2);
    }

    #[test]
    fn test_entries_keep_row_reference() {
        let mut diags = Diagnostics::new();
        diags.warn(DiagnosticKind::UnrecognizedOperation, Some(12), "UNKNOWN-OP");

        let first = diags.iter().next().unwrap();
        assert_eq!(first.line, Some(12));
        assert_eq!(first.severity, Severity::Warning);
        assert_eq!(first.kind.name(), "unrecognized_operation");
    }

    #[test]
    fn test_dropped_rows_ignore_kept_fields() {
        let mut diags = Diagnostics::new();
        diags.warn(DiagnosticKind::InvalidNumber, Some(5), "unparseable Preço BRL 'x'");
        diags.warn(DiagnosticKind::InvalidNumber, Some(5), "unparseable Bruto BRL 'y'");
        diags.warn(DiagnosticKind::InvalidQuantity, Some(6), "invalid quantity 'NaN'");
        diags.warn(DiagnosticKind::EmptyTransaction, Some(7), "nothing moved");

        assert_eq!(
            diags.dropped_rows(),
            vec![
                (DiagnosticKind::InvalidQuantity, 1),
                (DiagnosticKind::EmptyTransaction, 1)
            ]
        );
    }
}
