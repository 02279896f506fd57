//! Sample, container, and geometry descriptors for setting up a donor
//! workspace.
//!
//! Geometry is a tagged union with a strongly-typed field set per shape,
//! selected by pattern match — not a string-keyed property bag. Fields the
//! caller leaves unset are back-filled from the donor's run logs.

use crate::error::{Error, Result};
use crate::workspace::{LogValue, RunLog};

/// Sample material for the correction calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Chemical formula; empty means "read from the SampleFormula log".
    pub chemical_formula: String,
    /// Mass density in g/cm^3; `None` means "read from the SampleDensity
    /// log, falling back to SampleMass when the log holds a placeholder".
    pub mass_density: Option<f64>,
    /// Optional number density in atoms/A^3.
    pub number_density: Option<f64>,
    /// Sample mass in g, used when no usable density is available.
    pub mass: Option<f64>,
}

impl Material {
    pub fn new(chemical_formula: &str, mass_density: f64) -> Self {
        Self {
            chemical_formula: chemical_formula.to_string(),
            mass_density: Some(mass_density),
            number_density: None,
            mass: None,
        }
    }

    /// Back-fill formula and density from the run logs.
    ///
    /// A density log of exactly 0 or 1 is a beamline placeholder, in which
    /// case the sample mass is used instead.
    pub fn resolve(mut self, run: &RunLog, workspace: &str) -> Result<Self> {
        if self.chemical_formula.is_empty() {
            let formula = text_log(run, workspace, "SampleFormula")?;
            self.chemical_formula = formula.trim().to_string();
        }

        if self.mass_density.is_none() && self.mass.is_none() {
            match run.last_value("SampleDensity").and_then(LogValue::as_number) {
                Some(density) if density != 0.0 && density != 1.0 => {
                    self.mass_density = Some(density);
                }
                _ => {
                    self.mass = Some(number_log(run, workspace, "SampleMass")?);
                }
            }
        }

        Ok(self)
    }
}

/// Sample environment: surrounding medium and container type.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    /// Container descriptor such as `PAC06`; empty means "read from the
    /// SampleContainer log".
    pub container: String,
}

impl Environment {
    pub fn in_air(container: &str) -> Self {
        Self {
            name: "InAir".to_string(),
            container: container.to_string(),
        }
    }

    pub fn resolve(mut self, run: &RunLog, workspace: &str) -> Result<Self> {
        if self.container.is_empty() {
            let container = text_log(run, workspace, "SampleContainer")?;
            self.container = container.replace(' ', "");
        }
        Ok(self)
    }
}

/// Sample geometry. All lengths in cm, angles in degrees.
///
/// `height: None` means "read the height from the container logs"; shapes
/// are fixed at construction and selected by pattern match.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    FlatPlate {
        width: f64,
        height: Option<f64>,
        thickness: f64,
        angle: f64,
    },
    Cylinder {
        height: Option<f64>,
        radius: f64,
    },
    Annulus {
        height: Option<f64>,
        inner_radius: f64,
        outer_radius: f64,
    },
    /// No geometry given; the container definition supplies the shape.
    None,
}

impl Geometry {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::FlatPlate { .. } => "FlatPlate",
            Self::Cylinder { .. } => "Cylinder",
            Self::Annulus { .. } => "Annulus",
            Self::None => "None",
        }
    }

    pub fn height(&self) -> Option<f64> {
        match self {
            Self::FlatPlate { height, .. }
            | Self::Cylinder { height, .. }
            | Self::Annulus { height, .. } => *height,
            Self::None => None,
        }
    }

    fn with_height(self, value: f64) -> Self {
        match self {
            Self::FlatPlate {
                width,
                thickness,
                angle,
                ..
            } => Self::FlatPlate {
                width,
                height: Some(value),
                thickness,
                angle,
            },
            Self::Cylinder { radius, .. } => Self::Cylinder {
                height: Some(value),
                radius,
            },
            Self::Annulus {
                inner_radius,
                outer_radius,
                ..
            } => Self::Annulus {
                height: Some(value),
                inner_radius,
                outer_radius,
            },
            Self::None => Self::None,
        }
    }

    /// Fill an unset height from the container logs, converting the logged
    /// units to cm.
    pub fn resolve(self, run: &RunLog, workspace: &str) -> Result<(Self, f64)> {
        if let Some(height) = self.height() {
            return Ok((self, height));
        }
        let height = height_from_logs_cm(run, workspace)?;
        Ok((self.with_height(height), height))
    }
}

/// Container height from the run logs, converted to cm.
pub fn height_from_logs_cm(run: &RunLog, workspace: &str) -> Result<f64> {
    let unit = text_log(run, workspace, "HeightInContainerUnits")?;
    let conversion = match unit.trim() {
        "cm" => 1.0,
        "mm" => 0.1,
        other => return Err(Error::UnsupportedHeightUnit(other.to_string())),
    };
    let height = number_log(run, workspace, "HeightInContainer")?;
    Ok(height * conversion)
}

fn text_log<'r>(run: &'r RunLog, workspace: &str, property: &str) -> Result<&'r str> {
    run.last_value(property)
        .and_then(LogValue::as_text)
        .ok_or_else(|| Error::MissingMetadata {
            workspace: workspace.to_string(),
            property: property.to_string(),
        })
}

fn number_log(run: &RunLog, workspace: &str, property: &str) -> Result<f64> {
    run.last_value(property)
        .and_then(LogValue::as_number)
        .ok_or_else(|| Error::MissingMetadata {
            workspace: workspace.to_string(),
            property: property.to_string(),
        })
}
