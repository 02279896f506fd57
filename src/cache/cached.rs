//! Caching wrapper around a correction computation.
//!
//! `CachedComputation` composes the inner computation with cache-key
//! derivation and store access explicitly, instead of a convention-based
//! decorator: the computation is an injected [`CorrectionCompute`], the
//! registry is passed per call, and the cache directory is optional state.
//! With no cache directory configured the wrapper is a pure passthrough —
//! that is the "caching disabled" mode, not an error.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::cache::key::build_cache_key;
use crate::cache::store;
use crate::error::Result;
use crate::method::AbsorptionMethod;
use crate::workspace::WorkspaceRegistry;

/// Run log recording the signature a correction workspace was computed
/// under, for later identity checks.
pub const SIGNATURE_LOG: &str = "abs_signature";

/// The wrapped computation: given a donor workspace name and a method,
/// produce the sample correction name and, for the two-handle methods, the
/// container correction name.
pub trait CorrectionCompute {
    fn compute(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        donor: &str,
        method: AbsorptionMethod,
    ) -> Result<(String, Option<String>)>;
}

impl<F> CorrectionCompute for F
where
    F: FnMut(&mut dyn WorkspaceRegistry, &str, AbsorptionMethod) -> Result<(String, Option<String>)>,
{
    fn compute(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        donor: &str,
        method: AbsorptionMethod,
    ) -> Result<(String, Option<String>)> {
        self(registry, donor, method)
    }
}

/// Cache-aware wrapper over a correction computation.
pub struct CachedComputation<C> {
    inner: C,
    cache_dir: Option<PathBuf>,
}

impl<C: CorrectionCompute> CachedComputation<C> {
    /// Wrapper with caching disabled.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache_dir: None,
        }
    }

    /// Enable caching under `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Return cached correction workspaces for `donor`, computing and
    /// persisting them on a miss.
    ///
    /// Computation errors propagate untouched. A persistence failure after
    /// a successful computation is logged and swallowed: the computed result
    /// is still correct and returned, the cache just stays cold.
    pub fn run(
        &mut self,
        registry: &mut dyn WorkspaceRegistry,
        donor: &str,
        method: AbsorptionMethod,
    ) -> Result<(String, Option<String>)> {
        let Some(cache_dir) = self.cache_dir.clone() else {
            return self.inner.compute(registry, donor, method);
        };

        let key = build_cache_key(&*registry, donor, method, &cache_dir)?;

        let found = store::lookup(registry, &key, method)?;
        if let Some(hit) = found.into_full_hit(method) {
            info!(signature = %key.signature, sample = %hit.0, "using cached absorption correction");
            return Ok(hit);
        }
        info!(signature = %key.signature, "no usable cache, computing absorption correction");

        let (raw_sample, raw_container) = self.inner.compute(registry, donor, method)?;

        // move the results onto the canonical cache names and stamp the
        // signature before persisting, so in-memory hits can be verified
        let (sample, container) = store::cached_names(method, &key.signature);
        registry.rename(&raw_sample, &sample)?;
        stamp_signature(registry, &sample, &key.signature);

        let container = match (raw_container, container) {
            (Some(raw), Some(canonical)) => {
                registry.rename(&raw, &canonical)?;
                stamp_signature(registry, &canonical, &key.signature);
                Some(canonical)
            }
            _ => None,
        };

        if let Err(e) = store::persist(&*registry, &sample, container.as_deref(), &key) {
            warn!(error = %e, "could not persist absorption correction, result is still usable");
        }

        Ok((sample, container))
    }
}

fn stamp_signature(registry: &mut dyn WorkspaceRegistry, name: &str, signature: &str) {
    if let Some(ws) = registry.get_mut(name) {
        ws.run.set(SIGNATURE_LOG, signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{InMemoryRegistry, LogValue, MatrixWorkspace, RunLog};
    use tempfile::TempDir;

    fn donor_workspace() -> MatrixWorkspace {
        let mut run = RunLog::new();
        run.set("SampleFormula", "V");
        run.set("SampleDensity", 6.11);
        run.set("HeightInContainerUnits", "cm");
        run.set("HeightInContainer", 4.0);
        run.set("SampleContainer", "PAC06");
        MatrixWorkspace::with_bin_edges(vec![0.5, 2.0, 4.0], run)
    }

    /// Computation double that counts invocations and emits fixed outputs.
    struct CountingCompute {
        calls: usize,
    }

    impl CorrectionCompute for CountingCompute {
        fn compute(
            &mut self,
            registry: &mut dyn WorkspaceRegistry,
            donor: &str,
            method: AbsorptionMethod,
        ) -> Result<(String, Option<String>)> {
            self.calls += 1;
            let template = registry.get(donor).expect("donor in registry").clone();

            let sample = format!("{}_ass_raw", donor);
            let mut ws = template.clone();
            ws.y = vec![0.9; ws.num_bins()];
            registry.add_or_replace(&sample, ws);

            let container = method.expects_container().then(|| {
                let name = format!("{}_acc_raw", donor);
                let mut ws = template.clone();
                ws.y = vec![0.8; ws.num_bins()];
                registry.add_or_replace(&name, ws);
                name
            });

            Ok((sample, container))
        }
    }

    #[test]
    fn test_passthrough_without_cache_dir() {
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let mut cached = CachedComputation::new(CountingCompute { calls: 0 });
        let (sample, container) = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleOnly)
            .unwrap();

        // raw names come straight through, nothing is renamed or persisted
        assert_eq!(sample, "donor_ass_raw");
        assert_eq!(container, None);

        cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleOnly)
            .unwrap();
        assert_eq!(cached.inner.calls, 2);
    }

    #[test]
    fn test_second_run_skips_computation() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let mut cached = CachedComputation::new(CountingCompute { calls: 0 })
            .with_cache_dir(temp_dir.path());

        let first = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleAndContainer)
            .unwrap();
        let second = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleAndContainer)
            .unwrap();

        assert_eq!(cached.inner.calls, 1);
        assert_eq!(first, second);
        assert!(first.0.starts_with("abs_ass_"));
        assert!(second.1.as_deref().unwrap().starts_with("abs_acc_"));
    }

    #[test]
    fn test_results_are_stamped_with_signature() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let mut cached = CachedComputation::new(CountingCompute { calls: 0 })
            .with_cache_dir(temp_dir.path());
        let (sample, container) = cached
            .run(&mut registry, "donor", AbsorptionMethod::FullPaalmanPings)
            .unwrap();

        let signature = sample.strip_prefix("abs_assc_").unwrap().to_string();
        for name in [&sample, container.as_ref().unwrap()] {
            let stamped = registry
                .get(name)
                .unwrap()
                .run
                .last_value(SIGNATURE_LOG)
                .and_then(LogValue::as_text)
                .map(str::to_string);
            assert_eq!(stamped, Some(signature.clone()));
        }
    }

    #[test]
    fn test_miss_writes_cache_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let mut cached = CachedComputation::new(CountingCompute { calls: 0 })
            .with_cache_dir(temp_dir.path());
        let (sample, _) = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleOnly)
            .unwrap();

        let signature = sample.strip_prefix("abs_ass_").unwrap();
        assert!(temp_dir.path().join(format!("{}.nxs", signature)).exists());
    }

    #[test]
    fn test_persist_failure_still_returns_result() {
        let temp_dir = TempDir::new().unwrap();
        // block the cache directory with a plain file
        let blocked = temp_dir.path().join("cache");
        std::fs::write(&blocked, "").unwrap();

        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let mut cached =
            CachedComputation::new(CountingCompute { calls: 0 }).with_cache_dir(&blocked);
        let (sample, container) = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleAndContainer)
            .unwrap();

        assert!(registry.exists(&sample));
        assert!(registry.exists(container.as_deref().unwrap()));
        assert_eq!(cached.inner.calls, 1);
    }

    #[test]
    fn test_compute_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace("donor", donor_workspace());

        let failing = |_: &mut dyn WorkspaceRegistry,
                       donor: &str,
                       _: AbsorptionMethod|
         -> Result<(String, Option<String>)> {
            Err(crate::error::Error::WorkspaceNotFound(donor.to_string()))
        };
        let mut cached = CachedComputation::new(failing).with_cache_dir(temp_dir.path());

        let err = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleOnly)
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::WorkspaceNotFound(_)));
    }

    #[test]
    fn test_missing_donor_metadata_fails_before_compute() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = InMemoryRegistry::new();
        registry.add_or_replace(
            "donor",
            MatrixWorkspace::with_bin_edges(vec![0.5, 4.0], RunLog::new()),
        );

        let mut cached = CachedComputation::new(CountingCompute { calls: 0 })
            .with_cache_dir(temp_dir.path());
        let err = cached
            .run(&mut registry, "donor", AbsorptionMethod::SampleOnly)
            .unwrap_err();

        assert!(matches!(err, crate::error::Error::MissingMetadata { .. }));
        assert_eq!(cached.inner.calls, 0);
    }
}
