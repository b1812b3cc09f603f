// ⚙️ Conversion configuration
// Two paths plus a few tunables; the CLI fills this from args and env

use crate::detect::DEFAULT_SAMPLE_SIZE;
use crate::layout::{LayoutKind, LayoutOptions};
use crate::reconciliation::DEFAULT_PAIR_WINDOW_SECS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "extrato_mercadobitcoin.csv";
pub const DEFAULT_OUTPUT: &str = "koinly_output.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `None` = detect from the input
    #[serde(default)]
    pub layout: Option<LayoutKind>,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_pair_window")]
    pub pair_window_secs: f64,
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_pair_window() -> f64 {
    DEFAULT_PAIR_WINDOW_SECS
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            layout: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
            pair_window_secs: DEFAULT_PAIR_WINDOW_SECS,
        }
    }
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ConvertConfig {
            input: input.into(),
            output: output.into(),
            ..ConvertConfig::default()
        }
    }

    /// Builder pattern: force a layout instead of detecting it
    pub fn with_layout(mut self, layout: LayoutKind) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            sample_size: self.sample_size,
            pair_window_secs: self.pair_window_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();

        assert_eq!(config.input, PathBuf::from("extrato_mercadobitcoin.csv"));
        assert_eq!(config.layout, None);
        assert_eq!(config.layout_options(), LayoutOptions::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{"input": "in.csv", "output": "out.csv", "layout": "Operations"}"#)
                .unwrap();

        assert_eq!(config.layout, Some(LayoutKind::Operations));
        assert_eq!(config.sample_size, 5);
        assert_eq!(config.pair_window_secs, 2.0);
    }
}
