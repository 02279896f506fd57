//! Seam to the framework's numerical correction algorithms.
//!
//! The attenuation physics (ray tracing through sample and container
//! geometry) is owned by the external framework. This crate drives it
//! through [`AbsorptionEngine`] so the orchestration and caching logic can
//! be exercised against a double.

use std::path::Path;

use crate::error::Result;
use crate::workspace::WorkspaceRegistry;

/// Which part of the sample assembly the correction is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterFrom {
    Sample,
    Container,
}

/// The framework algorithms the correction workflow invokes.
pub trait AbsorptionEngine {
    /// Load only the run metadata of `filename` into a workspace named
    /// `output`. The resulting workspace carries the sample-description
    /// run logs but no meaningful data.
    fn load_metadata(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        filename: &Path,
        output: &str,
    ) -> Result<()>;

    /// Single-term absorption correction over the donor's wavelength
    /// binning, written to `output`.
    fn absorption_correction(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        donor: &str,
        scatter_from: ScatterFrom,
        element_size_mm: f64,
        output: &str,
    ) -> Result<()>;

    /// Full Paalman-Pings correction. Produces the four term workspaces
    /// `<prefix>_ass`, `<prefix>_assc`, `<prefix>_acc`, `<prefix>_acsc`.
    fn paalman_pings_correction(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        donor: &str,
        element_size_mm: f64,
        prefix: &str,
    ) -> Result<()>;
}
