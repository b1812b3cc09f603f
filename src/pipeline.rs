// 🔄 Conversion pipeline - Load → Detect → Normalize → Classify → Emit
//
// Structural errors surface before the output file is created, so a failed
// run never leaves a partial or empty file behind.

use crate::config::ConvertConfig;
use crate::diagnostics::Diagnostics;
use crate::emitter;
use crate::error::{ConvertError, Result};
use crate::layout::{detect_layout, LayoutKind};
use crate::table::read_input;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// What a successful run did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub layout: LayoutKind,
    pub date_format: String,
    pub rows_read: usize,
    pub transactions: usize,
    pub diagnostics: Diagnostics,
}

impl ConversionReport {
    pub fn summary(&self) -> String {
        format!(
            "{} transaction(s) written to {} ({} layout, {} row(s) read, {} warning(s))",
            self.transactions,
            self.output.display(),
            self.layout,
            self.rows_read,
            self.diagnostics.warnings()
        )
    }
}

/// Pick the configured layout, or inspect the text when none is configured
pub fn select_layout(config: &ConvertConfig, text: &str) -> Result<LayoutKind> {
    if let Some(layout) = config.layout {
        return Ok(layout);
    }
    detect_layout(text).ok_or_else(|| ConvertError::UnknownLayout {
        path: config.input.clone(),
    })
}

pub fn convert(config: &ConvertConfig) -> Result<ConversionReport> {
    let text = read_input(&config.input)?;
    let layout = select_layout(config, &text)?;
    info!(layout = layout.name(), "converting {}", config.input.display());

    let mut diagnostics = Diagnostics::new();
    let conversion = layout.convert(&text, &config.layout_options(), &mut diagnostics)?;
    debug!(
        date_format = conversion.date_format.pattern(),
        rows = conversion.rows_read,
        "input normalized"
    );

    let written = emitter::write_file(&config.output, &conversion.transactions)?;

    Ok(ConversionReport {
        input: config.input.clone(),
        output: config.output.clone(),
        layout,
        date_format: conversion.date_format.pattern().to_string(),
        rows_read: conversion.rows_read,
        transactions: written,
        diagnostics,
    })
}
