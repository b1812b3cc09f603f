// Exchange Ledger CLI
// Mercado Bitcoin statement → sent/received CSV

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use exchange_ledger::config::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use exchange_ledger::detect::DEFAULT_SAMPLE_SIZE;
use exchange_ledger::{convert, setup_logs, ConvertConfig, ConvertError, LayoutKind, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// Inspect the input and pick the layout
    Auto,
    Legacy,
    Operations,
}

impl LayoutArg {
    fn into_kind(self) -> Option<LayoutKind> {
        match self {
            LayoutArg::Auto => None,
            LayoutArg::Legacy => Some(LayoutKind::Legacy),
            LayoutArg::Operations => Some(LayoutKind::Operations),
        }
    }
}

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct CliArgument {
    /// Exchange statement export
    #[clap(value_name = "INPUT", default_value = DEFAULT_INPUT, env = "EXCHANGE_LEDGER_INPUT")]
    input: PathBuf,
    /// Destination CSV, overwritten if present
    #[clap(value_name = "OUTPUT", default_value = DEFAULT_OUTPUT, env = "EXCHANGE_LEDGER_OUTPUT")]
    output: PathBuf,
    #[clap(long, value_enum, default_value_t = LayoutArg::Auto, env = "EXCHANGE_LEDGER_LAYOUT")]
    layout: LayoutArg,
    /// Values sampled for date-format detection
    #[clap(long, default_value_t = DEFAULT_SAMPLE_SIZE, env = "EXCHANGE_LEDGER_SAMPLE_SIZE")]
    sample_size: usize,
    #[clap(long, default_value = "info", env = "EXCHANGE_LEDGER_LOG_LEVEL")]
    log_level: LogLevel,
    /// Write a JSON run report here
    #[clap(long, value_name = "FILE", env = "EXCHANGE_LEDGER_REPORT")]
    report: Option<PathBuf>,
}

impl CliArgument {
    fn to_config(&self) -> ConvertConfig {
        let mut config = ConvertConfig::new(self.input.clone(), self.output.clone());
        config.layout = self.layout.into_kind();
        config.sample_size = self.sample_size;
        config
    }
}

/// Top-line message for a failed run; input-shape problems point at the file itself
fn failure_context(err: &ConvertError, input: &Path) -> String {
    if err.is_structural() {
        format!("{} is not a usable statement export", input.display())
    } else {
        format!("Failed to convert {}", input.display())
    }
}

fn main() -> Result<()> {
    let args = CliArgument::parse();
    setup_logs(args.log_level)?;

    let config = args.to_config();
    let report = convert(&config).map_err(|err| {
        let context = failure_context(&err, &config.input);
        anyhow::Error::new(err).context(context)
    })?;
    report.diagnostics.log();

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    println!("✅ {}", report.summary());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_context_names_input() {
        let input = Path::new("extrato.csv");
        let structural = ConvertError::UnknownLayout {
            path: input.to_path_buf(),
        };
        let io = ConvertError::io(
            input,
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );

        assert_eq!(
            failure_context(&structural, input),
            "extrato.csv is not a usable statement export"
        );
        assert_eq!(failure_context(&io, input), "Failed to convert extrato.csv");
    }
}
