//! Error types for the absorption-correction cache.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by cache-key derivation, cache lookup/persistence, and the
/// correction entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// A named workspace was expected in the registry but is not there.
    #[error("workspace '{0}' not found in the registry")]
    WorkspaceNotFound(String),

    /// A run-log property required for cache keying is absent.
    #[error("workspace '{workspace}' is missing required run log '{property}'")]
    MissingMetadata { workspace: String, property: String },

    /// Method name outside the closed enumeration.
    #[error("unrecognized absorption correction method '{0}'")]
    UnknownAbsorptionMethod(String),

    /// An on-disk cache file held an unexpected workspace shape.
    #[error("unsupported cached workspace type: {0}")]
    UnsupportedCachedType(String),

    /// Writing a computed correction to disk failed.
    #[error("failed to persist correction cache to {path}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The resolved wavelength range is unusable.
    #[error("invalid wavelength range min={min}A max={max}A")]
    InvalidWavelengthRange { min: f64, max: f64 },

    /// Container height log carries units other than cm or mm.
    #[error("height-in-container units not recognized: '{0}' (expected cm or mm)")]
    UnsupportedHeightUnit(String),

    /// Elementwise arithmetic over workspaces of different binning.
    #[error("workspace shape mismatch between '{lhs}' and '{rhs}'")]
    WorkspaceShapeMismatch { lhs: String, rhs: String },

    /// A cache file exists but cannot be decoded.
    #[error("malformed cache file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
