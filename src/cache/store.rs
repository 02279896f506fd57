//! Lookup and persistence of computed correction workspaces.
//!
//! Two tiers: the workspace registry (in-memory, fast path) and the
//! processed-file store on disk. A lookup first checks the registry for the
//! canonical workspace names derived from the method and signature; if
//! anything is missing and a cache file exists it is loaded into the
//! registry, then the registry is checked again. Absent handles are reported
//! as `None`, never as an error — a partial hit is the caller's miss.

use tracing::{debug, info};

use crate::cache::key::CacheKey;
use crate::error::{Error, Result};
use crate::method::AbsorptionMethod;
use crate::workspace::{
    read_cache_file, write_cache_file, CacheFile, NamedWorkspace, WorkspaceRegistry,
};

/// Outcome of a cache lookup: whichever of the expected handles are resident
/// after the optional disk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub sample: Option<String>,
    pub container: Option<String>,
}

impl CacheLookup {
    /// Collapse into the result the caller may short-circuit with, or `None`
    /// when recomputation is required. `SampleOnly` needs only the sample
    /// handle; the two-handle methods need both (a partial hit is a miss).
    pub fn into_full_hit(self, method: AbsorptionMethod) -> Option<(String, Option<String>)> {
        if method.expects_container() {
            match (self.sample, self.container) {
                (Some(sample), Some(container)) => Some((sample, Some(container))),
                _ => None,
            }
        } else {
            self.sample.map(|sample| (sample, None))
        }
    }
}

/// Canonical registry names for the cached correction workspaces of
/// `method` under `signature`.
pub fn cached_names(method: AbsorptionMethod, signature: &str) -> (String, Option<String>) {
    let sample = format!("{}_{}", method.sample_prefix(), signature);
    let container = method
        .container_prefix()
        .map(|prefix| format!("{}_{}", prefix, signature));
    (sample, container)
}

/// Look for previously computed correction workspaces.
///
/// Only a missing cache file is a silent miss; a file that exists but cannot
/// be read propagates, and an unexpected entry shape is
/// `UnsupportedCachedType`. A file whose header signature does not match the
/// key is stale and treated as a miss.
pub fn lookup(
    registry: &mut dyn WorkspaceRegistry,
    key: &CacheKey,
    method: AbsorptionMethod,
) -> Result<CacheLookup> {
    let (sample_name, container_name) = cached_names(method, &key.signature);

    let resident = |registry: &dyn WorkspaceRegistry| {
        let sample = registry.exists(&sample_name).then(|| sample_name.clone());
        let container = container_name
            .as_ref()
            .filter(|name| registry.exists(name))
            .cloned();
        CacheLookup { sample, container }
    };

    // fast path: everything already in memory
    let in_memory = resident(&*registry);
    let complete = in_memory.sample.is_some()
        && (container_name.is_none() || in_memory.container.is_some());
    if complete {
        debug!(signature = %key.signature, "cache hit in registry");
        return Ok(in_memory);
    }

    if key.file_path.exists() {
        load_into_registry(registry, key, &sample_name)?;
    }

    Ok(resident(&*registry))
}

/// Persist the computed correction workspaces under `key.file_path`.
///
/// The sample workspace and, when present, the container workspace are
/// written as a single file; the write is atomic, so the caller either
/// observes a complete cache file or gets `PersistFailure`.
pub fn persist(
    registry: &dyn WorkspaceRegistry,
    sample: &str,
    container: Option<&str>,
    key: &CacheKey,
) -> Result<()> {
    let mut entries = vec![named_entry(registry, sample)?];
    if let Some(container) = container {
        entries.push(named_entry(registry, container)?);
    }

    let file = CacheFile::new(&key.signature, entries);
    write_cache_file(&key.file_path, &file).map_err(|source| Error::PersistFailure {
        path: key.file_path.clone(),
        source,
    })?;

    info!(signature = %key.signature, path = %key.file_path.display(), "persisted correction cache");
    Ok(())
}

fn named_entry(registry: &dyn WorkspaceRegistry, name: &str) -> Result<NamedWorkspace> {
    let workspace = registry
        .get(name)
        .ok_or_else(|| Error::WorkspaceNotFound(name.to_string()))?
        .clone();
    Ok(NamedWorkspace {
        name: name.to_string(),
        workspace,
    })
}

/// Load a cache file into the registry. A lone entry is renamed to the
/// expected sample name; a two-entry group is split under its stored names.
fn load_into_registry(
    registry: &mut dyn WorkspaceRegistry,
    key: &CacheKey,
    sample_name: &str,
) -> Result<()> {
    let file = read_cache_file(&key.file_path)?;

    if file.signature != key.signature {
        debug!(
            expected = %key.signature,
            found = %file.signature,
            "cache file signature mismatch, treating as miss"
        );
        return Ok(());
    }

    match file.entries.len() {
        1 => {
            let entry = file.entries.into_iter().next().expect("one entry");
            registry.add_or_replace(sample_name, entry.workspace);
        }
        2 => {
            for entry in file.entries {
                registry.add_or_replace(&entry.name, entry.workspace);
            }
        }
        n => {
            return Err(Error::UnsupportedCachedType(format!(
                "{} workspaces in {}",
                n,
                key.file_path.display()
            )))
        }
    }
    Ok(())
}
