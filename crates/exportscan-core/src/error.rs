//! Error types for the exportscan-core library.
//!
//! Parsing a dump never fails: malformed input is handled by omission or a
//! secure default. The variants here cover the collaborators around the
//! parser (dump sources, metadata documents and file I/O).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exportscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all exportscan operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The collaborator producing the manifest dump could not deliver it
    #[error("manifest dump unavailable from {source_name}: {reason}")]
    DumpUnavailable {
        /// Human-readable description of the dump source
        source_name: String,
        /// Why the dump could not be produced
        reason: String,
    },

    /// Failed to parse a metadata document
    #[error("failed to parse metadata: {0}")]
    MetadataParse(#[source] serde_json::Error),

    /// Failed to serialize a metadata document
    #[error("failed to serialize metadata: {0}")]
    MetadataSerialize(#[source] serde_json::Error),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new dump-unavailable error
    pub fn dump_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DumpUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the caller should degrade to the fail-closed result
    /// instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DumpUnavailable { .. } | Self::FileRead { .. })
    }
}
