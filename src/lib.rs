// Exchange Ledger - Core Library
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod diagnostics;
pub mod detect;         // Date format + header discovery
pub mod number;         // Locale-ambiguous number parsing
pub mod table;          // Raw CSV rows with physical line numbers
pub mod model;          // Canonical transaction record
pub mod reconciliation; // Trade leg pairing
pub mod layout;         // Legacy + operations statement layouts
pub mod emitter;
pub mod config;
pub mod logging;
pub mod pipeline;

// Re-export commonly used types
pub use error::{ConvertError, Result};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use detect::{detect_format, find_header, DateFormat, HeaderLocation};
pub use number::parse_number;
pub use model::{Label, Money, Transaction, EXCHANGE_NAME, FIAT};
pub use reconciliation::{LegPair, PairingEngine, PairingOutcome, TradeLeg};
pub use layout::{
    detect_layout, Conversion, LayoutKind, LayoutOptions, LegacyLayout,
    OperationType, OperationsLayout, StatementLayout,
};
pub use emitter::{write_file, write_transactions, OutputRow, HEADER};
pub use config::ConvertConfig;
pub use logging::{setup_logs, LogLevel};
pub use pipeline::{convert, ConversionReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
