//! Correction computation over a prepared donor workspace.
//!
//! Dispatches on the method: one engine call for `SampleOnly`, two for
//! `SampleAndContainer`, and for `FullPaalmanPings` the four-term engine
//! output combined into an effective container correction
//! `A_c = A_cc * A_ssc / A_csc`.

use tracing::debug;

use crate::correction::engine::{AbsorptionEngine, ScatterFrom};
use crate::error::{Error, Result};
use crate::method::AbsorptionMethod;
use crate::workspace::WorkspaceRegistry;

/// Compute the correction workspaces for `donor`.
///
/// Outputs are named `<prefix>_<term>`; an empty prefix falls back to the
/// donor name. Returns the sample correction name and, for the two-handle
/// methods, the container correction name.
pub fn compute_correction(
    engine: &mut dyn AbsorptionEngine,
    registry: &mut dyn WorkspaceRegistry,
    donor: &str,
    method: AbsorptionMethod,
    element_size_mm: f64,
    prefix: &str,
) -> Result<(String, Option<String>)> {
    if !registry.exists(donor) {
        return Err(Error::WorkspaceNotFound(donor.to_string()));
    }
    let prefix = if prefix.is_empty() { donor } else { prefix };
    debug!(donor, %method, prefix, "computing absorption correction");

    match method {
        AbsorptionMethod::SampleOnly => {
            let sample = format!("{}_ass", prefix);
            engine.absorption_correction(
                registry,
                donor,
                ScatterFrom::Sample,
                element_size_mm,
                &sample,
            )?;
            Ok((sample, None))
        }
        AbsorptionMethod::SampleAndContainer => {
            let sample = format!("{}_ass", prefix);
            let container = format!("{}_acc", prefix);
            engine.absorption_correction(
                registry,
                donor,
                ScatterFrom::Sample,
                element_size_mm,
                &sample,
            )?;
            engine.absorption_correction(
                registry,
                donor,
                ScatterFrom::Container,
                element_size_mm,
                &container,
            )?;
            Ok((sample, Some(container)))
        }
        AbsorptionMethod::FullPaalmanPings => {
            engine.paalman_pings_correction(registry, donor, element_size_mm, prefix)?;

            let sample = format!("{}_assc", prefix);
            let container = format!("{}_ac", prefix);
            multiply(
                registry,
                &format!("{}_acc", prefix),
                &sample,
                &container,
            )?;
            divide(registry, &container, &format!("{}_acsc", prefix), &container)?;

            // terms folded into the effective container correction
            registry.remove(&format!("{}_ass", prefix));
            registry.remove(&format!("{}_acc", prefix));
            registry.remove(&format!("{}_acsc", prefix));

            Ok((sample, Some(container)))
        }
    }
}

/// Elementwise `lhs * rhs` into `output`.
pub fn multiply(
    registry: &mut dyn WorkspaceRegistry,
    lhs: &str,
    rhs: &str,
    output: &str,
) -> Result<()> {
    binary_op(registry, lhs, rhs, output, |a, b| a * b)
}

/// Elementwise `lhs / rhs` into `output`.
pub fn divide(
    registry: &mut dyn WorkspaceRegistry,
    lhs: &str,
    rhs: &str,
    output: &str,
) -> Result<()> {
    binary_op(registry, lhs, rhs, output, |a, b| a / b)
}

fn binary_op(
    registry: &mut dyn WorkspaceRegistry,
    lhs: &str,
    rhs: &str,
    output: &str,
    op: fn(f64, f64) -> f64,
) -> Result<()> {
    let (mut out, rhs_y) = {
        let l = registry
            .get(lhs)
            .ok_or_else(|| Error::WorkspaceNotFound(lhs.to_string()))?;
        let r = registry
            .get(rhs)
            .ok_or_else(|| Error::WorkspaceNotFound(rhs.to_string()))?;
        if l.y.len() != r.y.len() {
            return Err(Error::WorkspaceShapeMismatch {
                lhs: lhs.to_string(),
                rhs: rhs.to_string(),
            });
        }
        (l.clone(), r.y.clone())
    };

    for (a, b) in out.y.iter_mut().zip(&rhs_y) {
        *a = op(*a, *b);
    }
    registry.add_or_replace(output, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{InMemoryRegistry, MatrixWorkspace, RunLog};
    use std::path::Path;

    fn flat(values: &[f64]) -> MatrixWorkspace {
        MatrixWorkspace {
            x: (0..=values.len()).map(|i| i as f64).collect(),
            y: values.to_vec(),
            run: RunLog::new(),
        }
    }

    /// Engine double emitting constant attenuation factors.
    struct FixedEngine;

    impl AbsorptionEngine for FixedEngine {
        fn load_metadata(
            &mut self,
            _registry: &mut dyn WorkspaceRegistry,
            _filename: &Path,
            _output: &str,
        ) -> Result<()> {
            unreachable!("not used by compute_correction");
        }

        fn absorption_correction(
            &mut self,
            registry: &mut dyn WorkspaceRegistry,
            donor: &str,
            scatter_from: ScatterFrom,
            _element_size_mm: f64,
            output: &str,
        ) -> Result<()> {
            let bins = registry.get(donor).unwrap().num_bins();
            let factor = match scatter_from {
                ScatterFrom::Sample => 0.9,
                ScatterFrom::Container => 0.8,
            };
            registry.add_or_replace(output, flat(&vec![factor; bins]));
            Ok(())
        }

        fn paalman_pings_correction(
            &mut self,
            registry: &mut dyn WorkspaceRegistry,
            donor: &str,
            _element_size_mm: f64,
            prefix: &str,
        ) -> Result<()> {
            let bins = registry.get(donor).unwrap().num_bins();
            for (term, factor) in [("ass", 0.9), ("assc", 0.6), ("acc", 0.8), ("acsc", 0.4)] {
                registry.add_or_replace(&format!("{}_{}", prefix, term), flat(&vec![factor; bins]));
            }
            Ok(())
        }
    }

    fn donor_registry() -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", flat(&[0.0, 0.0]));
        registry
    }

    #[test]
    fn test_sample_only_single_output() {
        let mut registry = donor_registry();
        let (sample, container) = compute_correction(
            &mut FixedEngine,
            &mut registry,
            "donor",
            AbsorptionMethod::SampleOnly,
            1.0,
            "corr",
        )
        .unwrap();

        assert_eq!(sample, "corr_ass");
        assert_eq!(container, None);
        assert_eq!(registry.get("corr_ass").unwrap().y, vec![0.9, 0.9]);
    }

    #[test]
    fn test_sample_and_container_two_outputs() {
        let mut registry = donor_registry();
        let (sample, container) = compute_correction(
            &mut FixedEngine,
            &mut registry,
            "donor",
            AbsorptionMethod::SampleAndContainer,
            1.0,
            "corr",
        )
        .unwrap();

        assert_eq!(sample, "corr_ass");
        assert_eq!(container.as_deref(), Some("corr_acc"));
        assert_eq!(registry.get("corr_acc").unwrap().y, vec![0.8, 0.8]);
    }

    #[test]
    fn test_full_paalman_pings_combines_terms() {
        let mut registry = donor_registry();
        let (sample, container) = compute_correction(
            &mut FixedEngine,
            &mut registry,
            "donor",
            AbsorptionMethod::FullPaalmanPings,
            1.0,
            "corr",
        )
        .unwrap();

        assert_eq!(sample, "corr_assc");
        assert_eq!(container.as_deref(), Some("corr_ac"));

        // A_c = A_cc * A_ssc / A_csc = 0.8 * 0.6 / 0.4
        let ac = &registry.get("corr_ac").unwrap().y;
        for v in ac {
            assert!((v - 1.2).abs() < 1e-12);
        }

        // intermediate terms are cleaned up
        assert!(!registry.exists("corr_ass"));
        assert!(!registry.exists("corr_acc"));
        assert!(!registry.exists("corr_acsc"));
    }

    #[test]
    fn test_empty_prefix_uses_donor_name() {
        let mut registry = donor_registry();
        let (sample, _) = compute_correction(
            &mut FixedEngine,
            &mut registry,
            "donor",
            AbsorptionMethod::SampleOnly,
            1.0,
            "",
        )
        .unwrap();
        assert_eq!(sample, "donor_ass");
    }

    #[test]
    fn test_missing_donor_is_error() {
        let mut registry = InMemoryRegistry::new();
        let err = compute_correction(
            &mut FixedEngine,
            &mut registry,
            "ghost",
            AbsorptionMethod::SampleOnly,
            1.0,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, Error::WorkspaceNotFound(_)));
    }

    #[test]
    fn test_multiply_and_divide() {
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("a", flat(&[2.0, 3.0]));
        registry.add_or_replace("b", flat(&[4.0, 5.0]));

        multiply(&mut registry, "a", "b", "ab").unwrap();
        assert_eq!(registry.get("ab").unwrap().y, vec![8.0, 15.0]);

        divide(&mut registry, "ab", "b", "ab").unwrap();
        assert_eq!(registry.get("ab").unwrap().y, vec![2.0, 3.0]);
    }

    #[test]
    fn test_binary_op_shape_mismatch() {
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("a", flat(&[2.0, 3.0]));
        registry.add_or_replace("b", flat(&[4.0]));

        let err = multiply(&mut registry, "a", "b", "ab").unwrap_err();
        assert!(matches!(err, Error::WorkspaceShapeMismatch { .. }));
    }
}
