use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::domain::flow::flow::Tier;
use crate::domain::routing::path::Path;
use crate::domain::topology::topology::TopologyView;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

new_key_type! {
    pub struct LinkKey;
}

/// Selects which residual map a query or allocation uses.
///
/// Views are nested: all-traffic contains silver+gold, which contains gold-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapacityView {
    AllTraffic = 0,
    SilverGold = 1,
    GoldOnly = 2,
}

impl CapacityView {
    pub const ALL: [CapacityView; 3] = [CapacityView::AllTraffic, CapacityView::SilverGold, CapacityView::GoldOnly];

    /// The view a tier is admitted against.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Gold => CapacityView::GoldOnly,
            Tier::Silver => CapacityView::SilverGold,
            Tier::Bronze => CapacityView::AllTraffic,
        }
    }

    /// The views that carry traffic of `tier`: its own view and every broader one.
    fn charged_by(tier: Tier) -> &'static [CapacityView] {
        match tier {
            Tier::Gold => &[CapacityView::AllTraffic, CapacityView::SilverGold, CapacityView::GoldOnly],
            Tier::Silver => &[CapacityView::AllTraffic, CapacityView::SilverGold],
            Tier::Bronze => &[CapacityView::AllTraffic],
        }
    }
}

/// One directed link and its residual bandwidth (bit/s) in each view.
#[derive(Debug, Clone)]
pub struct LinkCapacity {
    pub source: NodeId,
    pub target: NodeId,
    pub capacity: i64,
    residual: [i64; 3],
}

impl LinkCapacity {
    pub fn residual(&self, view: CapacityView) -> i64 {
        self.residual[view as usize]
    }
}

/// Residual bandwidth of every switch/router link, tracked per direction and per capacity view.
///
/// Host access links are not tracked.
#[derive(Debug, Clone, Default)]
pub struct CapacityLedger {
    links: SlotMap<LinkKey, LinkCapacity>,

    /// Lookup of the directed (source, target) pair.
    name_index: HashMap<(NodeId, NodeId), LinkKey>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the ledger from all non-host edges of `topology`, adding both directions at full capacity.
    pub fn from_topology(topology: &dyn TopologyView) -> Self {
        let mut ledger = CapacityLedger::new();

        for (a, b, bw) in topology.edges() {
            if topology.is_host(&a) || topology.is_host(&b) {
                continue;
            }
            ledger.add_link(a.clone(), b.clone(), bw);
            ledger.add_link(b, a, bw);
        }

        log::info!("Capacity ledger initialized with {} directed links.", ledger.links.len());
        ledger
    }

    pub fn add_link(&mut self, source: NodeId, target: NodeId, capacity: i64) -> LinkKey {
        let pair = (source.clone(), target.clone());
        if let Some(key) = self.name_index.get(&pair) {
            log::warn!("Link {} -> {} registered twice, keeping the first capacity.", source, target);
            return *key;
        }

        let key = self.links.insert(LinkCapacity { source, target, capacity, residual: [capacity; 3] });
        self.name_index.insert(pair, key);
        key
    }

    pub fn link(&self, source: &NodeId, target: &NodeId) -> Option<&LinkCapacity> {
        let key = self.name_index.get(&(source.clone(), target.clone()))?;
        self.links.get(*key)
    }

    pub fn residual(&self, source: &NodeId, target: &NodeId, view: CapacityView) -> Option<i64> {
        self.link(source, target).map(|link| link.residual(view))
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkCapacity> {
        self.links.values()
    }

    /// True iff every link along `path` has at least `bandwidth` residual in the view selected by `tier`.
    ///
    /// A hop that is not tracked by the ledger never fits.
    pub fn fits(&self, path: &Path, bandwidth: i64, tier: Tier) -> bool {
        let view = CapacityView::for_tier(tier);

        path.edges().all(|(a, b)| match self.link(a, b) {
            Some(link) => link.residual(view) - bandwidth >= 0,
            None => {
                log::error!("Link {} -> {} is not tracked by the capacity ledger.", a, b);
                false
            }
        })
    }

    /// Commits `bandwidth` along `path` in every view that carries `tier`.
    pub fn debit(&mut self, path: &Path, bandwidth: i64, tier: Tier) -> Result<()> {
        self.apply(path, -bandwidth, tier)
    }

    /// Releases `bandwidth` along `path`. Exact inverse of [`CapacityLedger::debit`].
    pub fn credit(&mut self, path: &Path, bandwidth: i64, tier: Tier) -> Result<()> {
        self.apply(path, bandwidth, tier)
    }

    /// Resolves every hop first so a path with an unknown link leaves the ledger untouched.
    fn apply(&mut self, path: &Path, delta: i64, tier: Tier) -> Result<()> {
        let keys = path
            .edges()
            .map(|(a, b)| {
                self.name_index.get(&(a.clone(), b.clone())).copied().ok_or_else(|| Error::UnknownLink { from: a.clone(), to: b.clone() })
            })
            .collect::<Result<Vec<LinkKey>>>()?;

        for key in keys {
            if let Some(link) = self.links.get_mut(key) {
                for view in CapacityView::charged_by(tier) {
                    link.residual[*view as usize] += delta;
                }
            }
        }

        Ok(())
    }
}
