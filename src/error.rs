// 🚨 Fatal errors - structural problems that abort a conversion
// Per-row problems never land here, they go to Diagnostics

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// One or more required columns are absent from the header row
    #[error("missing required column(s) {columns:?}; columns present: {found:?}")]
    MissingColumns {
        columns: Vec<String>,
        found: Vec<String>,
    },

    /// No line carries the marker columns of the operations layout
    #[error("could not find a header line containing {markers:?}")]
    HeaderNotFound { markers: Vec<String> },

    /// Input matches neither statement layout
    #[error("could not detect statement layout of {}", path.display())]
    UnknownLayout { path: PathBuf },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConvertError {
    pub fn missing_columns(columns: Vec<String>, found: &[String]) -> Self {
        ConvertError::MissingColumns {
            columns,
            found: found.to_vec(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the shape of the input rather than the environment
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingColumns { .. }
                | ConvertError::HeaderNotFound { .. }
                | ConvertError::UnknownLayout { .. }
        )
    }
}
