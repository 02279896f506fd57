//! Donor-workspace preparation.
//!
//! A donor workspace carries the geometry and metadata the correction
//! algorithms need: run logs loaded from the measurement file, an X axis
//! rebinned to the wavelength range of interest, and the resolved sample
//! description stamped back into the run logs.

use std::path::Path;

use tracing::info;

use crate::correction::engine::AbsorptionEngine;
use crate::correction::sample::{Environment, Geometry, Material};
use crate::error::{Error, Result};
use crate::workspace::{MatrixWorkspace, WorkspaceRegistry};

/// Suffixes stripped when deriving a workspace base name from a data file.
const DATA_FILE_SUFFIXES: [&str; 2] = ["_event.nxs", ".nxs.h5"];

/// Wavelength range from the run characterizations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterizationProps {
    pub wavelength_min: f64,
    pub wavelength_max: f64,
}

/// Optional inputs to [`create_absorption_input`].
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// Overrides the characterization wavelength minimum when set.
    pub wavelength_min: Option<f64>,
    /// Overrides the characterization wavelength maximum when set.
    pub wavelength_max: Option<f64>,
    /// Existing metadata workspace to reuse instead of loading `filename`.
    pub metaws: Option<String>,
}

/// File base name without path or data-file extension.
pub fn base_name(filename: &Path) -> String {
    let mut name = filename
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in DATA_FILE_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }
    name
}

/// Create a donor workspace for an absorption-correction calculation.
///
/// Loads the measurement metadata (or reuses `opts.metaws`), resolves the
/// wavelength range, rebins the donor to `num_wavelength_bins` even bins
/// across it, and records the resolved material/geometry/environment in the
/// donor's run logs. Returns the donor workspace name.
#[allow(clippy::too_many_arguments)]
pub fn create_absorption_input(
    engine: &mut dyn AbsorptionEngine,
    registry: &mut dyn WorkspaceRegistry,
    filename: &Path,
    props: &CharacterizationProps,
    num_wavelength_bins: usize,
    material: Option<Material>,
    geometry: Geometry,
    environment: Option<Environment>,
    opts: &InputOptions,
) -> Result<String> {
    let donor = match &opts.metaws {
        Some(name) => name.clone(),
        None => {
            let name = format!("__{}_abs", base_name(filename));
            engine.load_metadata(registry, filename, &name)?;
            name
        }
    };
    let run = registry
        .get(&donor)
        .ok_or_else(|| Error::WorkspaceNotFound(donor.clone()))?
        .run
        .clone();

    let mut wl_min = props.wavelength_min;
    let mut wl_max = props.wavelength_max;
    if let Some(min) = opts.wavelength_min {
        wl_min = min;
    }
    if let Some(max) = opts.wavelength_max {
        wl_max = max;
    }
    if wl_max <= wl_min {
        // the metadata-only donor is useless without a wavelength range
        registry.remove(&donor);
        return Err(Error::InvalidWavelengthRange {
            min: wl_min,
            max: wl_max,
        });
    }
    info!(wl_min, wl_max, "using wavelength range");

    let step = (wl_max - wl_min) / num_wavelength_bins as f64;
    let edges = (0..=num_wavelength_bins)
        .map(|i| wl_min + i as f64 * step)
        .collect();
    let mut ws = MatrixWorkspace::with_bin_edges(edges, run);

    let material = material
        .map(|m| m.resolve(&ws.run, &donor))
        .transpose()?;
    let environment = environment
        .map(|e| e.resolve(&ws.run, &donor))
        .transpose()?;
    let (geometry, height_cm) = geometry.resolve(&ws.run, &donor)?;

    stamp_sample_description(&mut ws, material, &geometry, height_cm, environment);

    // replaces the metadata-only donor
    registry.add_or_replace(&donor, ws);
    Ok(donor)
}

/// Record the resolved sample description in the donor run logs. This is
/// what the cache key and the correction algorithms read, so user-supplied
/// values participate in cache identity.
fn stamp_sample_description(
    ws: &mut MatrixWorkspace,
    material: Option<Material>,
    geometry: &Geometry,
    height_cm: f64,
    environment: Option<Environment>,
) {
    if let Some(material) = material {
        ws.run.set("SampleFormula", material.chemical_formula.as_str());
        if let Some(density) = material.mass_density {
            ws.run.set("SampleDensity", density);
        }
        if let Some(number_density) = material.number_density {
            ws.run.set("SampleNumberDensity", number_density);
        }
        if let Some(mass) = material.mass {
            ws.run.set("SampleMass", mass);
        }
    }
    ws.run.set("SampleShape", geometry.shape_name());
    ws.run.set("SampleHeight", height_cm);
    ws.run.set("HeightInContainer", height_cm);
    ws.run.set("HeightInContainerUnits", "cm");
    if let Some(environment) = environment {
        ws.run.set("SampleEnvironment", environment.name.as_str());
        ws.run.set("SampleContainer", environment.container.as_str());
    }
}
