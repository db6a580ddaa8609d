use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::domain::capacity::ledger::CapacityLedger;
use crate::domain::flow::flow::Tier;
use crate::domain::routing::path::Path;
use crate::domain::topology::topology::TopologyView;
use crate::domain::utils::id::NodeId;

/// Memoizing enumerator of all simple paths between two nodes.
///
/// Paths are trimmed of both endpoints and sorted by hop count (stable, so ties keep
/// enumeration order). The topology is static, so the cache is never invalidated.
#[derive(Debug)]
pub struct PathCatalog {
    topology: Arc<dyn TopologyView>,

    /// Cached sorted paths keyed by (source, destination).
    path_cache: HashMap<(NodeId, NodeId), Arc<[Path]>>,

    shuffle_candidates: bool,
}

impl PathCatalog {
    pub fn new(topology: Arc<dyn TopologyView>) -> Self {
        Self { topology, path_cache: HashMap::new(), shuffle_candidates: false }
    }

    /// Shuffles the admissible candidates returned by [`PathCatalog::available_paths`].
    pub fn with_shuffled_candidates(mut self, shuffle: bool) -> Self {
        self.shuffle_candidates = shuffle;
        self
    }

    pub fn topology(&self) -> &Arc<dyn TopologyView> {
        &self.topology
    }

    /// All paths from `source` to `destination`, shortest first.
    pub fn paths(&mut self, source: &NodeId, destination: &NodeId) -> Arc<[Path]> {
        let key = (source.clone(), destination.clone());

        if let Some(paths) = self.path_cache.get(&key) {
            return paths.clone();
        }

        let mut paths: Vec<Path> = self
            .topology
            .all_simple_paths(source, destination)
            .into_iter()
            // A path needs at least one transit device to carry a label stack.
            .filter(|nodes| nodes.len() >= 3)
            .map(|nodes| Path::new(nodes[1..nodes.len() - 1].to_vec()))
            .collect();
        paths.sort_by_key(|path| path.hop_count());

        log::debug!("Path catalog: cached {} paths {} => {}.", paths.len(), source, destination);

        let paths: Arc<[Path]> = paths.into();
        self.path_cache.insert(key, paths.clone());
        paths
    }

    /// Catalog paths that can carry `bandwidth` for `tier` under the current ledger.
    ///
    /// If none qualifies and `allow_degraded` is set, falls back to every path with any residual
    /// capacity at all (fits at zero bandwidth). The fallback admits oversubscription.
    pub fn available_paths(
        &mut self,
        ledger: &CapacityLedger,
        source: &NodeId,
        destination: &NodeId,
        bandwidth: i64,
        tier: Tier,
        allow_degraded: bool,
    ) -> Vec<Path> {
        let mut fitting = Vec::new();
        let mut degraded = Vec::new();

        for path in self.paths(source, destination).iter() {
            if ledger.fits(path, bandwidth, tier) {
                fitting.push(path.clone());
                degraded.push(path.clone());
            } else if ledger.fits(path, 0, tier) {
                degraded.push(path.clone());
            }
        }

        let mut candidates = if fitting.is_empty() && allow_degraded {
            if !degraded.is_empty() {
                log::warn!(
                    "No path {} => {} fits {} bit/s ({}); falling back to {} oversubscribed candidates.",
                    source,
                    destination,
                    bandwidth,
                    tier,
                    degraded.len()
                );
            }
            degraded
        } else {
            fitting
        };

        if self.shuffle_candidates {
            candidates.shuffle(&mut rand::rng());
        }

        candidates
    }
}
