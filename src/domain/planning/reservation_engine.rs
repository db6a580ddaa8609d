use crate::domain::device::programming::DeviceProgrammer;
use crate::domain::flow::flow::{Flow, group_flows_by_tier};
use crate::domain::planning::network_state::NetworkState;
use crate::domain::reservation::subflow::Subflow;
use crate::domain::routing::path::Path;
use crate::domain::utils::id::{FlowId, SubflowId};
use crate::error::Result;

/// Outcome of placing one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlacement {
    pub flow: Flow,

    /// Id of the first subflow. `None` if not even one subflow could be placed.
    pub flow_id: Option<FlowId>,

    pub requested_splits: u32,
    pub placed: Vec<SubflowId>,
}

impl FlowPlacement {
    pub fn is_complete(&self) -> bool {
        self.placed.len() == self.requested_splits as usize
    }
}

/// Admits flows tier by tier, splitting each into equal-rate subflows on least-overlapping paths.
pub struct ReservationEngine<'a> {
    state: &'a mut NetworkState,
    programmer: &'a DeviceProgrammer,
    allow_degraded: bool,
    splits_override: Option<u32>,
}

impl<'a> ReservationEngine<'a> {
    pub fn new(state: &'a mut NetworkState, programmer: &'a DeviceProgrammer, allow_degraded: bool, splits_override: Option<u32>) -> Self {
        Self { state, programmer, allow_degraded, splits_override }
    }

    /// Places gold flows, then silver, then bronze; input order is kept inside a tier.
    pub async fn place_flows(&mut self, flows: &[Flow]) -> Result<Vec<FlowPlacement>> {
        let (gold, silver, bronze) = group_flows_by_tier(flows);
        let mut placements = Vec::with_capacity(flows.len());

        for flow in gold.iter().chain(silver.iter()).chain(bronze.iter()) {
            placements.push(self.place_flow(flow).await?);
        }

        Ok(placements)
    }

    /// Splits `flow` into `n_splits` subflows with ids `flow_id + i`.
    ///
    /// Stops at the first subflow without a candidate path; the subflows placed so far are kept.
    ///
    /// # Returns
    /// The placement report; `placed` may be shorter than `requested_splits`.
    pub async fn place_flow(&mut self, flow: &Flow) -> Result<FlowPlacement> {
        let n_splits = flow.n_splits(self.splits_override);
        let rate_share = (flow.rate_bps as f64 / n_splits as f64).round() as i64;
        let flow_id = self.state.table.next_id();

        let mut placement = FlowPlacement { flow: flow.clone(), flow_id: None, requested_splits: n_splits, placed: Vec::new() };

        for i in 0..n_splits {
            let candidates = self.state.catalog.available_paths(
                &self.state.ledger,
                &flow.source,
                &flow.destination,
                rate_share,
                flow.tier,
                self.allow_degraded,
            );

            let siblings: Vec<Path> = self.state.table.flow_members(flow_id).map(|s| s.path.clone()).collect();
            let Some(path) = select_least_overlap(candidates, &siblings) else {
                log::warn!(
                    "No path for subflow {}/{} of {} => {} ({}, {} bit/s); flow is under-provisioned.",
                    i + 1,
                    n_splits,
                    flow.source,
                    flow.destination,
                    flow.tier,
                    rate_share
                );
                break;
            };

            let subflow_id = flow_id + i as u64;
            self.state.ledger.debit(&path, rate_share, flow.tier)?;
            self.state.table.insert(Subflow {
                id: subflow_id,
                flow_id,
                path: path.clone(),
                rate_share,
                n_splits,
                tier: flow.tier,
                source: flow.source.clone(),
                destination: flow.destination.clone(),
                active: true,
                parent_id: None,
                backup_id: None,
                failure_count: 0,
            })?;

            if let Some(ingress) = path.ingress().filter(|_| i == 0) {
                self.programmer.program_ecmp_select(ingress, &flow.destination, n_splits, flow_id).await?;
            }
            self.programmer.program_fec(&path, subflow_id).await?;

            log::info!("Subflow {} of flow {} ({}) placed on {}.", subflow_id, flow_id, flow.tier, path);
            placement.flow_id = Some(flow_id);
            placement.placed.push(subflow_id);
        }

        Ok(placement)
    }
}

/// First candidate sharing the fewest links with `siblings`, summed over all of them.
pub fn select_least_overlap(candidates: Vec<Path>, siblings: &[Path]) -> Option<Path> {
    let mut best: Option<(usize, Path)> = None;

    for candidate in candidates {
        let score: usize = siblings.iter().map(|sibling| candidate.shared_links(sibling)).sum();
        let disjoint = score == 0;

        if best.as_ref().is_none_or(|(best_score, _)| score < *best_score) {
            best = Some((score, candidate));
        }
        if disjoint {
            break;
        }
    }

    best.map(|(_, path)| path)
}
