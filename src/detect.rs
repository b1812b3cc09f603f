// 🔎 Format Detection - date formats and header location
//
// Exchange exports are not consistent: timestamps come day-first or ISO,
// with or without microseconds, and the operations export prepends banner
// lines before the real header. Everything here works on small samples and
// never touches the filesystem.

use crate::error::{ConvertError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How many non-empty values are sampled when guessing a date format
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

const BOM: char = '\u{feff}';

// ============================================================================
// DATE FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// 2024-01-17 09:47:30.536247
    IsoFractional,
    /// 2024-01-17 09:47:30
    Iso,
    /// 29/10/2024 08:38:24.123456
    DayFirstFractional,
    /// 29/10/2024 08:38:24
    DayFirst,
}

impl DateFormat {
    /// Candidates in scan order. Order matters for tie-breaks.
    pub const CANDIDATES: [DateFormat; 4] = [
        DateFormat::IsoFractional,
        DateFormat::Iso,
        DateFormat::DayFirstFractional,
        DateFormat::DayFirst,
    ];

    /// strftime-style pattern, as shown to users
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::IsoFractional => "%Y-%m-%d %H:%M:%S.%f",
            DateFormat::Iso => "%Y-%m-%d %H:%M:%S",
            DateFormat::DayFirstFractional => "%d/%m/%Y %H:%M:%S.%f",
            DateFormat::DayFirst => "%d/%m/%Y %H:%M:%S",
        }
    }

    // chrono's %.f treats the fraction as optional, so fractional
    // candidates additionally require the dot to be present
    fn chrono_pattern(&self) -> &'static str {
        match self {
            DateFormat::IsoFractional => "%Y-%m-%d %H:%M:%S%.f",
            DateFormat::Iso => "%Y-%m-%d %H:%M:%S",
            DateFormat::DayFirstFractional => "%d/%m/%Y %H:%M:%S%.f",
            DateFormat::DayFirst => "%d/%m/%Y %H:%M:%S",
        }
    }

    fn has_fraction(&self) -> bool {
        matches!(
            self,
            DateFormat::IsoFractional | DateFormat::DayFirstFractional
        )
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.contains('.') != self.has_fraction() {
            return None;
        }
        NaiveDateTime::parse_from_str(value, self.chrono_pattern()).ok()
    }

    /// First candidate that parses `value`
    pub fn guess(value: &str) -> Option<DateFormat> {
        DateFormat::CANDIDATES
            .iter()
            .copied()
            .find(|fmt| fmt.parse(value).is_some())
    }
}

/// Pick the date format that best explains the first `sample_size` non-empty values.
///
/// Each sampled value votes for the first candidate that parses it. The
/// winner is the first candidate (in `CANDIDATES` order) to reach the
/// highest vote count; later candidates with an equal count do not replace it.
/// Returns `None` when no candidate parses any sample.
pub fn detect_format<'a, I>(values: I, sample_size: usize) -> Option<DateFormat>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scores = [0usize; DateFormat::CANDIDATES.len()];

    for value in values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .take(sample_size)
    {
        if let Some(fmt) = DateFormat::guess(value) {
            if let Some(pos) = DateFormat::CANDIDATES.iter().position(|c| *c == fmt) {
                scores[pos] += 1;
            }
        }
    }

    let mut best: Option<(DateFormat, usize)> = None;
    for (fmt, score) in DateFormat::CANDIDATES.iter().zip(scores) {
        let current = best.map(|(_, s)| s).unwrap_or(0);
        if score > current {
            best = Some((*fmt, score));
        }
    }

    best.map(|(fmt, _)| fmt)
}

// ============================================================================
// HEADER SCAN
// ============================================================================

/// Where the real table starts inside a file with banner lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// 0-based index of the header line (BOM already stripped)
    pub line: usize,
    pub delimiter: u8,
}

fn splits_with_markers(line: &str, delimiter: char, markers: &[&str]) -> bool {
    let cells: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    markers.iter().all(|m| cells.contains(m))
}

/// Locate the first line containing every marker column.
///
/// Each line is tried with a comma split first, then a semicolon split,
/// before moving to the next line.
pub fn find_header(text: &str, markers: &[&str]) -> Result<HeaderLocation> {
    for (index, line) in strip_bom(text).lines().enumerate() {
        if splits_with_markers(line, ',', markers) {
            return Ok(HeaderLocation { line: index, delimiter: b',' });
        }
        if splits_with_markers(line, ';', markers) {
            return Ok(HeaderLocation { line: index, delimiter: b';' });
        }
    }

    Err(ConvertError::HeaderNotFound {
        markers: markers.iter().map(|m| m.to_string()).collect(),
    })
}

/// Drop a leading UTF-8 byte-order mark, if any
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}
