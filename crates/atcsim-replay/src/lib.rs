//! Replay source for the ATC traffic simulation.
//!
//! Normalizes raw track exports into a canonical time-indexed
//! [`TrackTable`] plus a scripted command timeline, caches the result on
//! disk and exposes a forward-only [`ReplayCursor`] over the table.

pub mod cache;
pub mod cursor;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod raw;
pub mod source;
pub mod table;
pub mod timeline;

pub use atcsim_core as core;
pub use cache::{CacheKey, ReplayCache};
pub use cursor::ReplayCursor;
pub use error::ReplayError;
pub use ingest::{ingest, IngestOptions, ReplayDataset};
pub use source::{ReplayRequest, SourceType};
pub use table::{TrackRow, TrackTable};

use tracing::{info, warn};

/// Load a dataset through the cache when one is given.
///
/// Returns the dataset and whether it came from the cache. A failure to
/// write the cache is logged and does not fail the load.
pub fn load(
    request: &ReplayRequest,
    options: &IngestOptions,
    cache: Option<&ReplayCache>,
) -> error::Result<(ReplayDataset, bool)> {
    let Some(cache) = cache else {
        return Ok((ingest(request, options)?, false));
    };

    let key = CacheKey::new(request, options);
    if let Some(dataset) = cache.load(&key) {
        info!(dataset = %request.dataset.display(), "replay cache hit");
        return Ok((dataset, true));
    }

    let dataset = ingest(request, options)?;
    if let Err(e) = cache.store(&key, &dataset) {
        warn!(error = %e, "could not write replay cache");
    }
    Ok((dataset, false))
}
