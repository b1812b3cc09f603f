// 📤 Emitter - canonical sent/received CSV
//
// Fixed 12 columns, every field quoted, absent values written as empty
// strings. The header row is always written, even for an empty run.

use crate::error::{ConvertError, Result};
use crate::model::{Money, Transaction};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const HEADER: [&str; 12] = [
    "Date",
    "Sent Amount",
    "Sent Currency",
    "Received Amount",
    "Received Currency",
    "Fee Amount",
    "Fee Currency",
    "Net Worth Amount",
    "Net Worth Currency",
    "Label",
    "Description",
    "TxHash",
];

/// Literal suffix; timestamps are annotated, not converted
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One output line, already rendered to text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Sent Amount")]
    pub sent_amount: String,

    #[serde(rename = "Sent Currency")]
    pub sent_currency: String,

    #[serde(rename = "Received Amount")]
    pub received_amount: String,

    #[serde(rename = "Received Currency")]
    pub received_currency: String,

    #[serde(rename = "Fee Amount")]
    pub fee_amount: String,

    #[serde(rename = "Fee Currency")]
    pub fee_currency: String,

    #[serde(rename = "Net Worth Amount")]
    pub net_worth_amount: String,

    #[serde(rename = "Net Worth Currency")]
    pub net_worth_currency: String,

    #[serde(rename = "Label")]
    pub label: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "TxHash")]
    pub tx_hash: String,
}

fn split(money: &Option<Money>) -> (String, String) {
    match money {
        Some(m) => (format_amount(m.amount), m.currency.clone()),
        None => (String::new(), String::new()),
    }
}

/// Shortest representation that round-trips, never exponent notation
pub fn format_amount(amount: f64) -> String {
    format!("{}", amount)
}

impl From<&Transaction> for OutputRow {
    fn from(tx: &Transaction) -> Self {
        let (sent_amount, sent_currency) = split(&tx.sent);
        let (received_amount, received_currency) = split(&tx.received);
        let (fee_amount, fee_currency) = split(&tx.fee);
        let (net_worth_amount, net_worth_currency) = split(&tx.net_worth);

        OutputRow {
            date: tx.timestamp.format(DATE_FORMAT).to_string(),
            sent_amount,
            sent_currency,
            received_amount,
            received_currency,
            fee_amount,
            fee_currency,
            net_worth_amount,
            net_worth_currency,
            label: tx.label.as_str().to_string(),
            description: tx.description.clone(),
            tx_hash: String::new(),
        }
    }
}

/// Write header + one row per transaction to any writer
pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<usize> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for tx in transactions {
        wtr.serialize(OutputRow::from(tx))?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    Ok(transactions.len())
}

/// Create (or truncate) `path` and write the canonical file
pub fn write_file(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
    write_transactions(file, transactions)
}
