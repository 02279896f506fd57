//! Absorption-correction workflow entry points.
//!
//! `calculate_absorption_correction` is the top-level operation: prepare a
//! donor workspace from a measurement file, then compute (or fetch from
//! cache) the sample and container correction workspaces. The applied
//! correction is `(I_s - I_c * k * A_csc / A_cc) / A_ssc` for full
//! Paalman-Pings, `I_s / A_ss - I_c / A_cc` without the cross terms, and
//! `I_s / A_ss` for sample-only.

mod compute;
mod engine;
mod input;
mod sample;

pub use compute::{compute_correction, divide, multiply};
pub use engine::{AbsorptionEngine, ScatterFrom};
pub use input::{base_name, create_absorption_input, CharacterizationProps, InputOptions};
pub use sample::{height_from_logs_cm, Environment, Geometry, Material};

use std::path::{Path, PathBuf};

use crate::cache::CachedComputation;
use crate::error::Result;
use crate::method::AbsorptionMethod;
use crate::workspace::WorkspaceRegistry;

/// Tunables for [`calculate_absorption_correction`].
#[derive(Debug, Clone)]
pub struct AbsorptionParams {
    /// Optional number density of the sample in atoms/A^3.
    pub number_density: Option<f64>,
    /// Container shape definition, such as `PAC06`.
    pub container_shape: String,
    /// Number of wavelength bins for the donor workspace.
    pub num_wavelength_bins: usize,
    /// Side of the integration element cube in mm.
    pub element_size_mm: f64,
    /// Existing metadata workspace to use instead of reading `filename`.
    pub metaws: Option<String>,
    /// Cache directory for persisted corrections; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl Default for AbsorptionParams {
    fn default() -> Self {
        Self {
            number_density: None,
            container_shape: "PAC06".to_string(),
            num_wavelength_bins: 1000,
            element_size_mm: 1.0,
            metaws: None,
            cache_dir: None,
        }
    }
}

/// Compute the absorption correction for a measurement file.
///
/// `method_name` is one of `None`, `SampleOnly`, `SampleAndContainer`,
/// `FullPaalmanPings`; `"None"` returns `(None, None)` without touching the
/// file, and an unknown name fails before any computation or I/O. Otherwise
/// returns the names of the sample correction workspace and, for the
/// two-handle methods, the container correction workspace.
#[allow(clippy::too_many_arguments)]
pub fn calculate_absorption_correction(
    engine: &mut dyn AbsorptionEngine,
    registry: &mut dyn WorkspaceRegistry,
    filename: &Path,
    method_name: &str,
    props: &CharacterizationProps,
    sample_formula: &str,
    mass_density: f64,
    params: &AbsorptionParams,
) -> Result<(Option<String>, Option<String>)> {
    let Some(method) = AbsorptionMethod::from_name(method_name)? else {
        return Ok((None, None));
    };

    let mut material = Material::new(sample_formula, mass_density);
    material.number_density = params.number_density;
    let environment = Environment::in_air(&params.container_shape);

    let donor = create_absorption_input(
        engine,
        registry,
        filename,
        props,
        params.num_wavelength_bins,
        Some(material),
        Geometry::None,
        Some(environment),
        &InputOptions {
            wavelength_min: None,
            wavelength_max: None,
            metaws: params.metaws.clone(),
        },
    )?;

    let prefix = format!("{}_abs_correction", base_name(filename));
    let element_size_mm = params.element_size_mm;
    let compute = |registry: &mut dyn WorkspaceRegistry,
                   donor: &str,
                   method: AbsorptionMethod|
     -> Result<(String, Option<String>)> {
        compute_correction(engine, registry, donor, method, element_size_mm, &prefix)
    };

    let mut cached = CachedComputation::new(compute);
    if let Some(dir) = &params.cache_dir {
        cached = cached.with_cache_dir(dir);
    }
    let (sample, container) = cached.run(registry, &donor, method)?;
    Ok((Some(sample), container))
}
