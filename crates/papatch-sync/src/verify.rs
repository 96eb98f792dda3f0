use std::collections::HashMap;

use papatch_manifest::{Bundle, Manifest};
use papatch_store::{CacheStore, PurgeMode};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pool::WorkerPool;

/// What a verification pass did to the cache and what it still lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Blobs removed by the purge step.
    pub purged: usize,
    /// Bundles that must be fetched, in manifest order, one per checksum.
    pub needed: Vec<Bundle>,
}

/// Reconciles a manifest against the cache.
#[derive(Debug, Clone)]
pub struct Verifier {
    store: CacheStore,
    pool: WorkerPool,
}

impl Verifier {
    pub fn new(store: CacheStore, pool: WorkerPool) -> Self {
        Self { store, pool }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Purge, then hash every cached bundle the manifest names.
    ///
    /// Absent and mismatched blobs land in the needed set. Any other I/O
    /// failure aborts the whole pass and no partial result is returned.
    pub async fn verify(&self, stream: &str, manifest: &Manifest, full: bool) -> Result<VerifyReport> {
        let purged = {
            let store = self.store.clone();
            let stream = stream.to_owned();
            let keep = manifest.checksums();
            tokio::task::spawn_blocking(move || {
                let mode = if full { PurgeMode::Full } else { PurgeMode::Stale(&keep) };
                store.purge(&stream, mode)
            })
            .await??
        };

        let candidates = merge_duplicates(&manifest.bundles);
        let checked = candidates.len();

        let valid = self
            .pool
            .run(candidates.iter(), |bundle| {
                let store = self.store.clone();
                let stream = stream.to_owned();
                let checksum = bundle.checksum.clone();
                async move {
                    let ok = tokio::task::spawn_blocking(move || store.verify(&stream, &checksum)).await??;
                    Ok(ok)
                }
            })
            .await?;

        let needed: Vec<Bundle> = candidates
            .into_iter()
            .zip(valid)
            .filter(|(_, ok)| !ok)
            .map(|(bundle, _)| bundle)
            .collect();

        info!(stream, purged, needed = needed.len(), full, "cache verified");
        debug!(stream, checked, "verification pool drained");
        Ok(VerifyReport { purged, needed })
    }
}

/// One bundle per checksum, in first-seen order.
///
/// Repeated checksums name the same blob, so their entry lists are merged
/// rather than dropped.
fn merge_duplicates(bundles: &[Bundle]) -> Vec<Bundle> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<Bundle> = Vec::new();

    for bundle in bundles {
        let Some(&at) = index.get(bundle.checksum.as_str()) else {
            index.insert(&bundle.checksum, merged.len());
            merged.push(bundle.clone());
            continue;
        };

        let target = &mut merged[at];
        let before = target.entries.len();
        for entry in &bundle.entries {
            if !target.entries.contains(entry) {
                target.entries.push(entry.clone());
            }
        }
        if target.entries.len() > before {
            warn!(
                checksum = %bundle.checksum,
                added = target.entries.len() - before,
                "bundle listed twice with different entries; merged"
            );
        }
    }
    merged
}
