//! Configuration module for docbundle.
//!
//! A [`Config`] is built once by the host (the CLI builds it from arguments)
//! and handed to the request bridge. It covers:
//! - Archive compression
//! - PDF engine settings
//! - Request timeout
//! - An optional fixed timestamp for reproducible output

use chrono::NaiveDateTime;
use std::{str::FromStr, time::Duration};

use crate::error::{ArchiveError, Result};
use crate::naming::TIMESTAMP_FORMAT;
use crate::pdf::EngineConfig;

/// Compression level, used for archive entries and PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression.
    None,
    /// Balanced compression.
    #[default]
    Standard,
    /// Smallest output, longer processing time.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = ArchiveError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(ArchiveError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Complete configuration for archive requests.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Compression applied to archive entries.
    pub compression: CompressionLevel,

    /// Settings passed to the PDF engine at construction.
    pub engine: EngineConfig,

    /// Abort a request that has not settled after this long.
    pub timeout: Option<Duration>,

    /// Use this timestamp instead of the current local time.
    pub timestamp: Option<NaiveDateTime>,
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ArchiveError::invalid_config("Timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Parse a timestamp in the filename layout (`2024-03-07_09-05-01`).
    pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|e| {
            ArchiveError::invalid_config(format!(
                "Invalid timestamp '{s}': {e}. Expected format like 2024-03-07_09-05-01"
            ))
        })
    }
}
