// 📑 Operations statement layout
//
// Newer exports: a few banner lines, then a header containing "Ativo" and
// "Operação Tipo", comma- or semicolon-separated, pt-BR numbers. Every row
// is a complete operation with gross and net amounts on both the BRL and
// the crypto side, so no pairing is needed.

use super::{resolve_date_format, LayoutKind, LayoutOptions, Loaded, StatementLayout};
use crate::detect::{find_header, strip_bom, DateFormat};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::{Label, Money, Transaction, EXCHANGE_NAME, FIAT};
use crate::number::parse_number;
use crate::table::{RawRow, RawTable};
use chrono::NaiveDateTime;

pub const HEADER_MARKERS: [&str; 2] = ["Ativo", "Operação Tipo"];

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Ativo",
    "Operação Tipo",
    "Operação Data/Hora",
    "Preço BRL",
    "Liquido BRL",
    "Bruto BRL",
    "Liquido Cripto",
    "Bruto Cripto",
];

pub const FALLBACK_FORMAT: DateFormat = DateFormat::DayFirst;

/// Fee differences at or below this are rounding noise
pub const FEE_EPSILON: f64 = 1e-8;

// ============================================================================
// OPERATION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Sell crypto for BRL
    TradingOut,
    /// Buy crypto with BRL
    TradingIn,
    /// Crypto leaves the exchange
    WalletOut,
    /// Crypto arrives at the exchange
    WalletIn,
    /// BRL leaves the exchange
    CashOut,
}

impl OperationType {
    /// Substring match on the uppercased type, checked in a fixed order.
    /// CASH-OUT only counts for BRL rows.
    pub fn classify(operation: &str, asset: &str) -> Option<OperationType> {
        let op = operation.trim().to_uppercase();

        if op.contains("TRADING-OUT") {
            Some(OperationType::TradingOut)
        } else if op.contains("TRADING-IN") {
            Some(OperationType::TradingIn)
        } else if op.contains("WALLET-OUT") {
            Some(OperationType::WalletOut)
        } else if op.contains("WALLET-IN") {
            Some(OperationType::WalletIn)
        } else if op.contains("CASH-OUT") && asset == FIAT {
            Some(OperationType::CashOut)
        } else {
            None
        }
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// One parsed operation row. Numbers are `None` when empty or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationEntry {
    pub line: usize,
    pub asset: String,
    pub operation: String,
    pub timestamp: NaiveDateTime,
    pub price_brl: Option<f64>,
    pub net_brl: Option<f64>,
    pub gross_brl: Option<f64>,
    pub net_crypto: Option<f64>,
    pub gross_crypto: Option<f64>,
}

impl OperationEntry {
    /// BRL difference wins; crypto difference only when BRL shows none.
    /// A side with a missing gross or net value has no difference at all.
    pub fn fee(&self) -> Option<Money> {
        if let Some(diff) = fee_basis(self.gross_brl, self.net_brl) {
            return Some(Money::new(diff, FIAT));
        }
        fee_basis(self.gross_crypto, self.net_crypto)
            .map(|diff| Money::new(diff, self.asset.as_str()))
    }
}

fn fee_basis(gross: Option<f64>, net: Option<f64>) -> Option<f64> {
    match (gross, net) {
        (Some(g), Some(n)) if (g - n).abs() > FEE_EPSILON => Some(g - n),
        _ => None,
    }
}

// Cleaned cells of one row, before typing
struct RowFields {
    line: usize,
    cells: Vec<String>,
}

impl RowFields {
    fn from_row(row: &RawRow, cols: &[usize]) -> Self {
        RowFields {
            line: row.line,
            cells: cols
                .iter()
                .map(|&c| row.get(c).trim().replace('"', ""))
                .collect(),
        }
    }

    fn number(&self, idx: usize, diagnostics: &mut Diagnostics) -> Option<f64> {
        let raw = self.cells[idx].as_str();
        let parsed = parse_number(raw);
        if parsed.is_none() && !raw.is_empty() {
            diagnostics.warn(
                DiagnosticKind::InvalidNumber,
                Some(self.line),
                format!("unparseable {} '{}'", REQUIRED_COLUMNS[idx], raw),
            );
        }
        parsed
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

pub struct OperationsLayout {
    sample_size: usize,
}

impl Default for OperationsLayout {
    fn default() -> Self {
        OperationsLayout::from_options(&LayoutOptions::default())
    }
}

impl OperationsLayout {
    pub fn new() -> Self {
        OperationsLayout::default()
    }

    pub fn from_options(options: &LayoutOptions) -> Self {
        OperationsLayout {
            sample_size: options.sample_size,
        }
    }

    fn build_transaction(
        entry: &OperationEntry,
        operation: OperationType,
    ) -> Option<Transaction> {
        let asset = entry.asset.as_str();
        let net_brl = entry.net_brl.unwrap_or(0.0);
        let net_crypto = entry.net_crypto.unwrap_or(0.0);

        let (sent, received, label, description, net_worth) = match operation {
            OperationType::TradingOut => (
                Money::nonzero(net_crypto, asset),
                Money::nonzero(net_brl, FIAT),
                Label::Trade,
                format!("Venda de {} - {}", asset, EXCHANGE_NAME),
                Money::nonzero(net_brl, FIAT),
            ),
            OperationType::TradingIn => (
                Money::nonzero(net_brl, FIAT),
                Money::nonzero(net_crypto, asset),
                Label::Trade,
                format!("Compra de {} - {}", asset, EXCHANGE_NAME),
                Money::nonzero(net_brl, FIAT),
            ),
            OperationType::WalletOut => (
                Money::nonzero(net_crypto, asset),
                None,
                Label::Withdrawal,
                format!("Retirada de {} - {}", asset, EXCHANGE_NAME),
                None,
            ),
            OperationType::WalletIn => (
                None,
                Money::nonzero(net_crypto, asset),
                Label::Deposit,
                format!("Depósito de {} - {}", asset, EXCHANGE_NAME),
                None,
            ),
            OperationType::CashOut => (
                Money::nonzero(net_brl, FIAT),
                None,
                Label::Withdrawal,
                format!("Saque de {} - {}", FIAT, EXCHANGE_NAME),
                None,
            ),
        };

        Transaction::try_new(entry.timestamp, sent, received).map(|tx| {
            tx.with_label(label)
                .with_description(description)
                .with_fee(entry.fee())
                .with_net_worth(net_worth)
        })
    }
}

impl StatementLayout for OperationsLayout {
    type Entry = OperationEntry;

    fn kind(&self) -> LayoutKind {
        LayoutKind::Operations
    }

    fn load(&self, text: &str, diagnostics: &mut Diagnostics) -> Result<Loaded<OperationEntry>> {
        let text = strip_bom(text);
        let header = find_header(text, &HEADER_MARKERS)?;
        let body = text.lines().skip(header.line).collect::<Vec<_>>().join("\n");

        let table = RawTable::parse(&body, header.delimiter, header.line)?;
        let cols = table.require(&REQUIRED_COLUMNS)?;
        let rows: Vec<RowFields> = table
            .rows
            .iter()
            .map(|r| RowFields::from_row(r, &cols))
            .collect();

        let date_format = resolve_date_format(
            rows.iter().map(|r| r.cells[2].as_str()),
            self.sample_size,
            FALLBACK_FORMAT,
            diagnostics,
        );

        let mut dated: Vec<(NaiveDateTime, RowFields)> = Vec::with_capacity(rows.len());
        for row in rows {
            match date_format.parse(&row.cells[2]) {
                Some(ts) => dated.push((ts, row)),
                None => diagnostics.warn(
                    DiagnosticKind::InvalidDate,
                    Some(row.line),
                    format!("invalid date '{}', row dropped", row.cells[2]),
                ),
            }
        }
        dated.sort_by_key(|(ts, _)| *ts);

        let entries = dated
            .into_iter()
            .map(|(timestamp, row)| OperationEntry {
                line: row.line,
                timestamp,
                price_brl: row.number(3, diagnostics),
                net_brl: row.number(4, diagnostics),
                gross_brl: row.number(5, diagnostics),
                net_crypto: row.number(6, diagnostics),
                gross_crypto: row.number(7, diagnostics),
                asset: row.cells[0].clone(),
                operation: row.cells[1].clone(),
            })
            .collect();

        Ok(Loaded {
            entries,
            date_format,
            rows_read: table.rows.len(),
        })
    }

    /// Unrecognized operations are logged and skipped, the run goes on
    fn classify(
        &self,
        entries: Vec<OperationEntry>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Transaction> {
        let mut transactions = Vec::with_capacity(entries.len());

        for entry in &entries {
            let Some(operation) = OperationType::classify(&entry.operation, &entry.asset) else {
                diagnostics.warn(
                    DiagnosticKind::UnrecognizedOperation,
                    Some(entry.line),
                    format!(
                        "unrecognized operation {}, asset {}",
                        entry.operation.to_uppercase(),
                        entry.asset
                    ),
                );
                continue;
            };

            match Self::build_transaction(entry, operation) {
                Some(tx) => transactions.push(tx),
                None => diagnostics.warn(
                    DiagnosticKind::EmptyTransaction,
                    Some(entry.line),
                    format!("{} {} moved no amount, row dropped", entry.operation, entry.asset),
                ),
            }
        }

        transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    const BANNER: &str = "Extrato de operações\nGerado em 01/11/2024\n";
    const HEADER: &str =
        "Ativo;Operação Tipo;Operação Data/Hora;Preço BRL;Liquido BRL;Bruto BRL;Liquido Cripto;Bruto Cripto\n";

    fn convert(body: &str) -> (Vec<Transaction>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let text = format!("\u{feff}{}{}{}", BANNER, HEADER, body);
        let conversion = OperationsLayout::new().convert(&text, &mut diags).unwrap();
        (conversion.transactions, diags)
    }

    #[test]
    fn test_trading_out_with_brl_fee() {
        let (txs, _) = convert("BTC;TRADING-OUT;29/10/2024 08:38:24;200;99;100;0,5;0,5\n");

        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.sent, Some(Money::new(0.5, "BTC")));
        assert_eq!(tx.received, Some(Money::new(99.0, "BRL")));
        assert_eq!(tx.fee, Some(Money::new(1.0, "BRL")));
        assert_eq!(tx.net_worth, Some(Money::new(99.0, "BRL")));
        assert_eq!(tx.label, Label::Trade);
        assert_eq!(tx.description, "Venda de BTC - Mercado Bitcoin");
    }

    #[test]
    fn test_trading_in_with_crypto_fee() {
        let (txs, _) = convert(
            "\"BTC\";\"trading-in\";\"29/10/2024 08:38:24\";\"300.000,00\";\"1.500,00\";\"1.500,00\";\"0,0049\";\"0,005\"\n",
        );

        let tx = &txs[0];
        assert_eq!(tx.sent, Some(Money::new(1500.0, "BRL")));
        assert_eq!(tx.received, Some(Money::new(0.0049, "BTC")));
        let fee = tx.fee.as_ref().unwrap();
        assert_eq!(fee.currency, "BTC");
        assert!((fee.amount - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_missing_gross_means_no_fee() {
        let (txs, _) = convert("BRL;CASH-OUT;29/10/2024 10:00:00;;500;;;\n");

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].sent, Some(Money::new(500.0, "BRL")));
        assert!(txs[0].fee.is_none());
    }

    #[test]
    fn test_unparseable_gross_means_no_fee() {
        let (txs, diags) =
            convert("BTC;TRADING-IN;29/10/2024 08:38:24;300000;1500;abc;0,005;0,005\n");

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].sent, Some(Money::new(1500.0, "BRL")));
        assert!(txs[0].fee.is_none());
        assert_eq!(diags.count(DiagnosticKind::InvalidNumber), 1);
    }

    #[test]
    fn test_crypto_fee_when_brl_side_missing() {
        let entry = OperationEntry {
            line: 4,
            asset: "ETH".to_string(),
            operation: "WALLET-OUT".to_string(),
            timestamp: DateFormat::DayFirst.parse("29/10/2024 08:00:00").unwrap(),
            price_brl: None,
            net_brl: Some(10.0),
            gross_brl: None,
            net_crypto: Some(1.0),
            gross_crypto: Some(1.5),
        };

        assert_eq!(entry.fee(), Some(Money::new(0.5, "ETH")));
    }

    #[test]
    fn test_wallet_and_cash_operations() {
        let (txs, _) = convert(
            "ETH;WALLET-OUT;29/10/2024 08:00:00;;;;2;2\n\
             ETH;WALLET-IN;29/10/2024 09:00:00;;;;3;3\n\
             BRL;CASH-OUT;29/10/2024 10:00:00;;500;500;;\n",
        );

        assert_eq!(txs.len(), 3);

        assert_eq!(txs[0].label, Label::Withdrawal);
        assert_eq!(txs[0].sent, Some(Money::new(2.0, "ETH")));
        assert!(txs[0].received.is_none() && txs[0].fee.is_none() && txs[0].net_worth.is_none());

        assert_eq!(txs[1].label, Label::Deposit);
        assert_eq!(txs[1].received, Some(Money::new(3.0, "ETH")));

        assert_eq!(txs[2].label, Label::Withdrawal);
        assert_eq!(txs[2].sent, Some(Money::new(500.0, "BRL")));
        assert_eq!(txs[2].description, "Saque de BRL - Mercado Bitcoin");
    }

    #[test]
    fn test_unknown_operation_skipped() {
        let (txs, diags) = convert(
            "BTC;UNKNOWN-OP;29/10/2024 08:00:00;1;1;1;1;1\n\
             BTC;CASH-OUT;29/10/2024 08:30:00;1;1;1;1;1\n\
             BTC;WALLET-IN;29/10/2024 09:00:00;;;;1;1\n",
        );

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].label, Label::Deposit);
        assert_eq!(diags.count(DiagnosticKind::UnrecognizedOperation), 2);
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(
            OperationType::classify(" pix-trading-out-market ", "BTC"),
            Some(OperationType::TradingOut)
        );
        assert_eq!(OperationType::classify("CASH-OUT", "USDT"), None);
        assert_eq!(
            OperationType::classify("cash-out", "BRL"),
            Some(OperationType::CashOut)
        );
    }

    #[test]
    fn test_comma_separated_with_iso_dates() {
        let mut diags = Diagnostics::new();
        let text = "Ativo,Operação Tipo,Operação Data/Hora,Preço BRL,Liquido BRL,Bruto BRL,Liquido Cripto,Bruto Cripto\n\
                    BTC,WALLET-IN,2024-10-29 08:38:24.123456,,,,1,1\n";
        let conversion = OperationsLayout::new().convert(text, &mut diags).unwrap();

        assert_eq!(conversion.date_format, DateFormat::IsoFractional);
        assert_eq!(conversion.transactions.len(), 1);
    }

    #[test]
    fn test_rows_sorted_and_lines_kept() {
        let mut diags = Diagnostics::new();
        let text = format!(
            "{}{}BTC;WALLET-IN;30/10/2024 08:00:00;;;;2;2\nBTC;WALLET-IN;29/10/2024 08:00:00;;;;1;1\n",
            BANNER, HEADER
        );
        let loaded = OperationsLayout::new().load(&text, &mut diags).unwrap();

        assert_eq!(loaded.entries[0].net_crypto, Some(1.0));
        assert_eq!(loaded.entries[0].line, 5);
        assert_eq!(loaded.entries[1].line, 4);
    }

    #[test]
    fn test_zero_amounts_dropped() {
        let (txs, diags) = convert("BTC;WALLET-IN;29/10/2024 08:00:00;;;;0;0\n");

        assert!(txs.is_empty());
        assert_eq!(diags.count(DiagnosticKind::EmptyTransaction), 1);
    }

    #[test]
    fn test_invalid_number_recorded() {
        let (txs, diags) = convert("BTC;WALLET-IN;29/10/2024 08:00:00;;;;abc;1\n");

        assert!(txs.is_empty());
        assert_eq!(diags.count(DiagnosticKind::InvalidNumber), 1);
    }

    #[test]
    fn test_header_not_found_is_fatal() {
        let mut diags = Diagnostics::new();
        let err = OperationsLayout::new()
            .convert("Data,Categoria\n1,2\n", &mut diags)
            .unwrap_err();

        assert!(matches!(err, ConvertError::HeaderNotFound { .. }));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let mut diags = Diagnostics::new();
        let err = OperationsLayout::new()
            .convert("Ativo;Operação Tipo;Operação Data/Hora\n", &mut diags)
            .unwrap_err();

        match err {
            ConvertError::MissingColumns { columns, .. } => assert_eq!(columns.len(), 5),
            other => panic!("unexpected error: {}", other),
        }
    }
}
