//! Caching of computed absorption-correction workspaces.
//!
//! Three pieces, leaves first:
//! - [`key`] derives a deterministic signature and cache-file path from
//!   donor-workspace metadata and the chosen method;
//! - [`store`] checks the workspace registry and the on-disk processed-file
//!   store, loading disk hits back into memory;
//! - [`cached`] wraps a correction computation, short-circuiting on a full
//!   hit and persisting fresh results on a miss.
//!
//! Entries are never expired; they accumulate until the user clears the
//! cache directory.

pub mod cached;
pub mod key;
pub mod store;

pub use cached::{CachedComputation, CorrectionCompute, SIGNATURE_LOG};
pub use key::{build_cache_key, CacheKey, CACHE_FILE_EXT, REQUIRED_LOGS};
pub use store::{cached_names, CacheLookup};
