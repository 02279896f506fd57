//! Absorption-correction method selection.
//!
//! The method determines which framework algorithm runs, how many correction
//! workspaces come back (sample only, or sample plus container), and the
//! naming prefixes used for cached workspaces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed enumeration of supported absorption-correction methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbsorptionMethod {
    /// Attenuation through the sample material only.
    SampleOnly,
    /// Separate sample and container attenuation factors.
    SampleAndContainer,
    /// Full Paalman-Pings treatment including cross terms.
    FullPaalmanPings,
}

impl AbsorptionMethod {
    /// Parse a method name.
    ///
    /// `"None"` is a valid request meaning "no correction" and maps to
    /// `Ok(None)`; any other unrecognized name is an error, raised before
    /// any computation or I/O is attempted.
    pub fn from_name(name: &str) -> Result<Option<Self>> {
        match name {
            "None" => Ok(None),
            "SampleOnly" => Ok(Some(Self::SampleOnly)),
            "SampleAndContainer" => Ok(Some(Self::SampleAndContainer)),
            "FullPaalmanPings" => Ok(Some(Self::FullPaalmanPings)),
            other => Err(Error::UnknownAbsorptionMethod(other.to_string())),
        }
    }

    /// Whether a container correction workspace is part of this method's
    /// result. `SampleOnly` deliberately never has one.
    pub fn expects_container(self) -> bool {
        !matches!(self, Self::SampleOnly)
    }

    /// Workspace-name prefix for the sample correction.
    pub fn sample_prefix(self) -> &'static str {
        match self {
            Self::SampleOnly | Self::SampleAndContainer => "abs_ass",
            Self::FullPaalmanPings => "abs_assc",
        }
    }

    /// Workspace-name prefix for the container correction, if the method
    /// produces one.
    pub fn container_prefix(self) -> Option<&'static str> {
        match self {
            Self::SampleOnly => None,
            Self::SampleAndContainer => Some("abs_acc"),
            Self::FullPaalmanPings => Some("abs_ac"),
        }
    }
}

impl fmt::Display for AbsorptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SampleOnly => "SampleOnly",
            Self::SampleAndContainer => "SampleAndContainer",
            Self::FullPaalmanPings => "FullPaalmanPings",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known_methods() {
        assert_eq!(
            AbsorptionMethod::from_name("SampleOnly").unwrap(),
            Some(AbsorptionMethod::SampleOnly)
        );
        assert_eq!(
            AbsorptionMethod::from_name("SampleAndContainer").unwrap(),
            Some(AbsorptionMethod::SampleAndContainer)
        );
        assert_eq!(
            AbsorptionMethod::from_name("FullPaalmanPings").unwrap(),
            Some(AbsorptionMethod::FullPaalmanPings)
        );
    }

    #[test]
    fn test_from_name_none_is_no_correction() {
        assert_eq!(AbsorptionMethod::from_name("None").unwrap(), None);
    }

    #[test]
    fn test_from_name_unknown_is_error() {
        let err = AbsorptionMethod::from_name("Carpenter").unwrap_err();
        assert!(matches!(err, Error::UnknownAbsorptionMethod(name) if name == "Carpenter"));
    }

    #[test]
    fn test_container_expectation() {
        assert!(!AbsorptionMethod::SampleOnly.expects_container());
        assert!(AbsorptionMethod::SampleAndContainer.expects_container());
        assert!(AbsorptionMethod::FullPaalmanPings.expects_container());
    }

    #[test]
    fn test_prefixes_differ_per_method() {
        assert_eq!(AbsorptionMethod::SampleOnly.sample_prefix(), "abs_ass");
        assert_eq!(AbsorptionMethod::SampleOnly.container_prefix(), None);
        assert_eq!(
            AbsorptionMethod::SampleAndContainer.container_prefix(),
            Some("abs_acc")
        );
        assert_eq!(AbsorptionMethod::FullPaalmanPings.sample_prefix(), "abs_assc");
        assert_eq!(
            AbsorptionMethod::FullPaalmanPings.container_prefix(),
            Some("abs_ac")
        );
    }
}
