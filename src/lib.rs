//! Cached absorption-correction workflow for powder diffraction reduction.
//!
//! Absorption corrections are expensive to compute and depend only on the
//! sample description and wavelength binning of a measurement, so repeated
//! reductions of the same sample can reuse them. This crate derives a
//! content signature from the donor workspace's metadata, keeps computed
//! correction workspaces in a registry and in an on-disk processed-file
//! store, and wraps the correction computation so a reduction only pays for
//! the calculation once.
//!
//! The numerical correction algorithms and the real workspace store belong
//! to the analysis framework; they enter through the
//! [`correction::AbsorptionEngine`] and [`workspace::WorkspaceRegistry`]
//! seams.

pub mod cache;
pub mod correction;
pub mod error;
pub mod method;
pub mod workspace;

pub use cache::{build_cache_key, CacheKey, CachedComputation, CorrectionCompute};
pub use correction::{
    calculate_absorption_correction, create_absorption_input, AbsorptionEngine, AbsorptionParams,
    CharacterizationProps, Environment, Geometry, Material, ScatterFrom,
};
pub use error::{Error, Result};
pub use method::AbsorptionMethod;
pub use workspace::{InMemoryRegistry, MatrixWorkspace, RunLog, WorkspaceRegistry};
