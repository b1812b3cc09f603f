// 🏗️ Statement Layouts - one pipeline shape, two export schemas
//
// Both exchange exports go through the same stages:
//   load (detect + normalize) -> classify/reconcile -> transactions
// Each schema implements `StatementLayout`; `LayoutKind` picks one either
// from configuration or by peeking at the input.

pub mod legacy;
pub mod operations;

pub use legacy::{LegacyLayout, StatementEntry};
pub use operations::{OperationEntry, OperationType, OperationsLayout};

use crate::detect::{detect_format, find_header, strip_bom, DateFormat, DEFAULT_SAMPLE_SIZE};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::Transaction;
use crate::reconciliation::DEFAULT_PAIR_WINDOW_SECS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Data, Categoria, Moeda, Quantidade, Saldo
    Legacy,
    /// Ativo, Operação Tipo, ... below a banner
    Operations,
}

impl LayoutKind {
    pub fn name(&self) -> &str {
        match self {
            LayoutKind::Legacy => "legacy",
            LayoutKind::Operations => "operations",
        }
    }

    /// Run the whole load + classify pipeline for this layout
    pub fn convert(
        &self,
        text: &str,
        options: &LayoutOptions,
        diagnostics: &mut Diagnostics,
    ) -> Result<Conversion> {
        match self {
            LayoutKind::Legacy => LegacyLayout::from_options(options).convert(text, diagnostics),
            LayoutKind::Operations => {
                OperationsLayout::from_options(options).convert(text, diagnostics)
            }
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(LayoutKind::Legacy),
            "operations" => Ok(LayoutKind::Operations),
            _ => Err(format!("unknown layout: {}", s)),
        }
    }
}

/// Tunables shared by both layouts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Non-empty timestamps sampled for date format detection
    pub sample_size: usize,
    /// Maximum distance between the two legs of an order execution
    pub pair_window_secs: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            sample_size: DEFAULT_SAMPLE_SIZE,
            pair_window_secs: DEFAULT_PAIR_WINDOW_SECS,
        }
    }
}

/// Output of the load stage
#[derive(Debug, Clone)]
pub struct Loaded<E> {
    /// Sorted ascending by timestamp
    pub entries: Vec<E>,
    pub date_format: DateFormat,
    /// Data rows read, before any drop
    pub rows_read: usize,
}

/// Output of a full layout run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub layout: LayoutKind,
    pub date_format: DateFormat,
    pub rows_read: usize,
    pub transactions: Vec<Transaction>,
}

// ============================================================================
// LAYOUT TRAIT
// ============================================================================

/// StatementLayout - one export schema
///
/// `load` fails only on structural problems (missing columns, no header);
/// everything row-level goes to `diagnostics` and the row is dropped.
pub trait StatementLayout {
    /// Typed, parsed row of this schema
    type Entry;

    fn kind(&self) -> LayoutKind;

    fn load(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<Loaded<Self::Entry>>;

    fn classify(&self, entries: Vec<Self::Entry>, diagnostics: &mut Diagnostics)
        -> Vec<Transaction>;

    fn convert(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<Conversion> {
        let loaded = self.load(text, diagnostics)?;
        let transactions = self.classify(loaded.entries, diagnostics);

        Ok(Conversion {
            layout: self.kind(),
            date_format: loaded.date_format,
            rows_read: loaded.rows_read,
            transactions,
        })
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Detect the date format of a column, falling back (with a warning) when
/// nothing in the sample parses
pub(crate) fn resolve_date_format<'a, I>(
    values: I,
    sample_size: usize,
    fallback: DateFormat,
    diagnostics: &mut Diagnostics,
) -> DateFormat
where
    I: IntoIterator<Item = &'a str>,
{
    match detect_format(values, sample_size) {
        Some(fmt) => fmt,
        None => {
            diagnostics.warn(
                DiagnosticKind::DateFormatFallback,
                None,
                format!("could not detect date format, using fallback {}", fallback.pattern()),
            );
            fallback
        }
    }
}

/// Pick a layout by looking at the input text
pub fn detect_layout(text: &str) -> Option<LayoutKind> {
    if find_header(text, &operations::HEADER_MARKERS).is_ok() {
        return Some(LayoutKind::Operations);
    }

    let first_line = strip_bom(text).lines().next()?;
    let mut cells: Vec<String> = first_line
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect();
    for cell in cells.iter_mut() {
        let alias = legacy::COLUMN_ALIASES
            .iter()
            .find(|(a, _)| *a == cell.as_str());
        if let Some((_, canonical)) = alias {
            *cell = canonical.to_string();
        }
    }

    let is_legacy = legacy::LAYOUT_MARKERS
        .iter()
        .all(|m| cells.iter().any(|c| c.as_str() == *m));
    if is_legacy {
        Some(LayoutKind::Legacy)
    } else {
        None
    }
}
