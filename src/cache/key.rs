//! Cache-key derivation for absorption-correction workspaces.
//!
//! The key is a SHA-256 over a fixed, ordered set of `key=value` lines drawn
//! from the donor workspace's binning and run logs, with the method name
//! appended so two methods over identical physical data never collide. The
//! same metadata must always hash identically: floats are serialized with
//! Rust's shortest-roundtrip formatting and string logs are trimmed before
//! hashing so cosmetic whitespace never causes a spurious miss.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::method::AbsorptionMethod;
use crate::workspace::{LogValue, MatrixWorkspace, WorkspaceRegistry};

/// File extension for persisted correction workspaces.
pub const CACHE_FILE_EXT: &str = "nxs";

/// Run logs a donor workspace must carry to be cache-keyable.
pub const REQUIRED_LOGS: [&str; 5] = [
    "SampleFormula",
    "SampleDensity",
    "HeightInContainerUnits",
    "HeightInContainer",
    "SampleContainer",
];

/// Derived cache identity: the content signature and the processed-file
/// path results are persisted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Lowercase hex SHA-256 of the canonical property lines.
    pub signature: String,
    /// `<cache_dir>/<signature>.nxs`
    pub file_path: PathBuf,
}

/// Derive the cache key for `workspace_name` corrected with `method`.
///
/// Pure over the workspace metadata and `cache_dir`; fails with
/// `WorkspaceNotFound` if the donor is not in the registry and
/// `MissingMetadata` if a required run log is absent.
pub fn build_cache_key(
    registry: &dyn WorkspaceRegistry,
    workspace_name: &str,
    method: AbsorptionMethod,
    cache_dir: &Path,
) -> Result<CacheKey> {
    let ws = registry
        .get(workspace_name)
        .ok_or_else(|| Error::WorkspaceNotFound(workspace_name.to_string()))?;

    let lines = property_lines(ws, workspace_name, method)?;

    let mut hasher = Sha256::new();
    hasher.update(lines.join("\n").as_bytes());
    let signature = hex::encode(hasher.finalize());

    debug!(workspace = workspace_name, %method, %signature, "derived cache key");

    let file_path = cache_dir.join(format!("{}.{}", signature, CACHE_FILE_EXT));
    Ok(CacheKey {
        signature,
        file_path,
    })
}

/// Canonical `key=value` lines, fixed order.
fn property_lines(
    ws: &MatrixWorkspace,
    workspace_name: &str,
    method: AbsorptionMethod,
) -> Result<Vec<String>> {
    let log = |property: &str| -> Result<String> {
        let value = ws
            .run
            .last_value(property)
            .ok_or_else(|| Error::MissingMetadata {
                workspace: workspace_name.to_string(),
                property: property.to_string(),
            })?;
        Ok(canonical_value(value))
    };

    Ok(vec![
        format!("wavelength_min={}", ws.x_min()),
        format!("wavelength_max={}", ws.x_max()),
        format!("num_wavelength_bins={}", ws.num_bins()),
        format!("sample_formula={}", log("SampleFormula")?),
        format!("mass_density={}", log("SampleDensity")?),
        format!("height_unit={}", log("HeightInContainerUnits")?),
        format!("height={}", log("HeightInContainer")?),
        // interior spaces removed: container names differ only cosmetically
        format!("sample_container={}", log("SampleContainer")?.replace(' ', "")),
        format!("abs_method={}", method),
    ])
}

/// Stable textual form of a log value. f64 `Display` is shortest-roundtrip
/// and locale independent; text is trimmed.
fn canonical_value(value: &LogValue) -> String {
    match value {
        LogValue::Text(s) => s.trim().to_string(),
        LogValue::Number(v) => format!("{}", v),
    }
}
