// 📜 Legacy statement layout
//
// Columns: Data, Categoria, Moeda, Quantidade, Saldo (older exports use
// lowercase names). One row per balance movement; an order execution is
// booked as two rows that must be paired back together.

use super::{resolve_date_format, LayoutKind, LayoutOptions, Loaded, StatementLayout};
use crate::detect::DateFormat;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::{Money, Transaction, EXCHANGE_NAME};
use crate::reconciliation::{PairingEngine, TradeLeg};
use crate::table::RawTable;
use chrono::NaiveDateTime;

pub const REQUIRED_COLUMNS: [&str; 5] = ["Data", "Categoria", "Moeda", "Quantidade", "Saldo"];

/// Accepted spellings, resolved once at load time
pub const COLUMN_ALIASES: [(&str, &str); 5] = [
    ("data", "Data"),
    ("categoria", "Categoria"),
    ("moeda", "Moeda"),
    ("quantidade", "Quantidade"),
    ("saldo", "Saldo"),
];

/// Columns whose presence identifies this layout
pub const LAYOUT_MARKERS: [&str; 2] = ["Data", "Categoria"];

pub const FALLBACK_FORMAT: DateFormat = DateFormat::Iso;

pub const CATEGORY_DEPOSIT: &str = "Depósito";
pub const CATEGORY_WITHDRAWAL: &str = "Saque/Retirada";
pub const CATEGORY_ORDER_EXECUTION: &str = "Execução de ordem";

/// One parsed statement row
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub line: usize,
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub currency: String,
    /// Signed balance change
    pub quantity: f64,
}

impl StatementEntry {
    fn leg(&self) -> TradeLeg {
        TradeLeg {
            timestamp: self.timestamp.and_utc(),
            quantity: self.quantity,
            currency: self.currency.clone(),
        }
    }
}

pub struct LegacyLayout {
    sample_size: usize,
    pairing: PairingEngine,
}

impl Default for LegacyLayout {
    fn default() -> Self {
        LegacyLayout::from_options(&LayoutOptions::default())
    }
}

impl LegacyLayout {
    pub fn new() -> Self {
        LegacyLayout::default()
    }

    pub fn from_options(options: &LayoutOptions) -> Self {
        LegacyLayout {
            sample_size: options.sample_size,
            pairing: PairingEngine::with_window(options.pair_window_secs),
        }
    }

    fn describe(category: &str) -> String {
        format!("{} - {}", category, EXCHANGE_NAME)
    }

    fn pair_executions(
        &self,
        executions: &[StatementEntry],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Transaction> {
        let legs: Vec<TradeLeg> = executions.iter().map(StatementEntry::leg).collect();
        let outcome = self.pairing.pair(&legs);

        for idx in &outcome.unmatched {
            let e = &executions[*idx];
            diagnostics.info(
                DiagnosticKind::UnmatchedLeg,
                Some(e.line),
                format!("order execution {} {} has no opposite leg", e.quantity, e.currency),
            );
        }

        outcome
            .pairs
            .iter()
            .map(|pair| {
                let sent = &executions[pair.sent];
                let received = &executions[pair.received];
                Transaction::trade(
                    sent.timestamp.min(received.timestamp),
                    Money::new(sent.quantity, sent.currency.as_str()),
                    Money::new(received.quantity, received.currency.as_str()),
                )
                .with_description(Self::describe(CATEGORY_ORDER_EXECUTION))
            })
            .collect()
    }
}

impl StatementLayout for LegacyLayout {
    type Entry = StatementEntry;

    fn kind(&self) -> LayoutKind {
        LayoutKind::Legacy
    }

    fn load(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<Loaded<StatementEntry>> {
        let mut table = RawTable::parse(text, b',', 0)?;
        table.resolve_aliases(&COLUMN_ALIASES);
        let cols = table.require(&REQUIRED_COLUMNS)?;
        // Saldo is required but never read
        let (date_col, category_col, currency_col, quantity_col) =
            (cols[0], cols[1], cols[2], cols[3]);

        let date_format = resolve_date_format(
            table.rows.iter().map(|r| r.get(date_col)),
            self.sample_size,
            FALLBACK_FORMAT,
            diagnostics,
        );

        let mut entries = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let raw_date = row.get(date_col);
            let Some(timestamp) = date_format.parse(raw_date) else {
                diagnostics.warn(
                    DiagnosticKind::InvalidDate,
                    Some(row.line),
                    format!("invalid date '{}', row dropped", raw_date),
                );
                continue;
            };

            let raw_quantity = row.get(quantity_col).trim();
            let Some(quantity) = raw_quantity.parse::<f64>().ok().filter(|q| q.is_finite()) else {
                diagnostics.warn(
                    DiagnosticKind::InvalidQuantity,
                    Some(row.line),
                    format!("invalid quantity '{}', row dropped", raw_quantity),
                );
                continue;
            };

            entries.push(StatementEntry {
                line: row.line,
                timestamp,
                category: row.get(category_col).trim().to_string(),
                currency: row.get(currency_col).trim().to_string(),
                quantity,
            });
        }

        entries.sort_by_key(|e| e.timestamp);

        Ok(Loaded {
            entries,
            date_format,
            rows_read: table.rows.len(),
        })
    }

    /// Deposits first, then withdrawals, then paired executions.
    /// Any other category is dropped silently.
    fn classify(
        &self,
        entries: Vec<StatementEntry>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = entries
            .iter()
            .filter(|e| e.category == CATEGORY_DEPOSIT)
            .map(|e| {
                Transaction::deposit(e.timestamp, Money::new(e.quantity, e.currency.as_str()))
                    .with_description(Self::describe(CATEGORY_DEPOSIT))
            })
            .collect();

        transactions.extend(
            entries
                .iter()
                .filter(|e| e.category == CATEGORY_WITHDRAWAL)
                .map(|e| {
                    Transaction::withdrawal(e.timestamp, Money::new(e.quantity, e.currency.as_str()))
                        .with_description(Self::describe(CATEGORY_WITHDRAWAL))
                }),
        );

        let executions: Vec<StatementEntry> = entries
            .into_iter()
            .filter(|e| e.category == CATEGORY_ORDER_EXECUTION)
            .collect();
        transactions.extend(self.pair_executions(&executions, diagnostics));

        transactions
    }
}
