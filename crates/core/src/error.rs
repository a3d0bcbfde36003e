//! Error taxonomy for the tracker
//!
//! Four kinds of failure reach the caller:
//! - configuration errors, which abort before any work starts
//! - missing or malformed data for a single timestep, which are logged and
//!   absorbed by the pipeline (the timestep becomes a gap)
//! - I/O failures on the intermediate record store, which abort the run
//! - missing upper-air pressure levels, which abort the thermal
//!   classification of the affected trajectory only

use std::path::PathBuf;

/// Errors raised by the detection and tracking pipeline
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Invalid or inconsistent configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be decoded
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A pressure level needed for the thermal-wind or asymmetry
    /// computation is absent from the upper-air data
    #[error("mandatory pressure level {level_hpa} hPa is missing from the upper-air data")]
    MissingPressureLevel {
        /// Missing level in hPa
        level_hpa: u32,
        /// Whether the regression level set was requested
        regression: bool,
    },

    /// Gridded inputs disagree on their dimensions
    #[error("field shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Filesystem failure on the record store or output directory
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stored record row could not be decoded
    #[error("malformed record in {path} at line {line}: {message}")]
    RecordParse {
        /// Record identifier (file name or timestep key)
        path: String,
        /// One-based line number
        line: usize,
        /// Decoder message
        message: String,
    },

    /// The detection worker pool could not be started
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error must stop the whole run.
    ///
    /// A missing pressure level only invalidates the thermal classification
    /// of one trajectory; everything else aborts.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingPressureLevel { .. })
    }

    /// Suggested action for the operator, when one exists
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::MissingPressureLevel { regression, .. } => {
                let levels = if *regression {
                    "900 to 300 hPa every 50 hPa"
                } else {
                    "900, 600 and 300 hPa"
                };
                Some(format!(
                    "supply geopotential heights at {levels}, or disable upper-air checking"
                ))
            }
            Self::Config(_) | Self::ConfigParse(_) => {
                Some("fix the configuration file and run again".to_string())
            }
            Self::WorkerPool(_) => Some("lower the number of workers".to_string()),
            _ => None,
        }
    }

    /// Human-readable block printed by front-ends before exiting
    pub fn report_block(&self) -> String {
        let rule = "=".repeat(72);
        let mut block = format!("{rule}\nERROR: {self}\n");
        if let Some(hint) = self.remediation() {
            block.push_str(&hint);
            block.push('\n');
        }
        block.push_str(&rule);
        block
    }
}
