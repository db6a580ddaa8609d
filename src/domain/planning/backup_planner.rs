use crate::domain::device::programming::DeviceProgrammer;
use crate::domain::flow::flow::Tier;
use crate::domain::planning::network_state::NetworkState;
use crate::domain::reservation::subflow::Subflow;
use crate::domain::routing::path::Path;
use crate::domain::utils::id::SubflowId;
use crate::error::{Error, Result};

/// Provisions standby subflows, one backup level per round.
///
/// A backup reserves its own capacity but is inactive until its parent fails over. Its path must not
/// fully contain the path of any subflow it protects, and shares as few links with them as possible.
pub struct BackupPlanner<'a> {
    state: &'a mut NetworkState,
    programmer: &'a DeviceProgrammer,
    allow_degraded: bool,
}

impl<'a> BackupPlanner<'a> {
    pub fn new(state: &'a mut NetworkState, programmer: &'a DeviceProgrammer, allow_degraded: bool) -> Self {
        Self { state, programmer, allow_degraded }
    }

    /// Runs `rounds` backup rounds for `tier`.
    ///
    /// Every round looks at the subflows that existed when it started, in ascending id, and gives each unprotected one a
    /// backup. Backups created in round k are therefore only protected in round k+1.
    ///
    /// # Returns
    /// The ids of all backups created.
    pub async fn plan(&mut self, tier: Tier, rounds: u32) -> Result<Vec<SubflowId>> {
        let mut created = Vec::new();

        for round in 0..rounds {
            let mut created_this_round = 0;

            for id in self.state.table.ids() {
                let Some(subflow) = self.state.table.get(id) else {
                    continue;
                };
                if subflow.tier != tier || subflow.backup_id.is_some() {
                    continue;
                }

                if let Some(backup_id) = self.add_backup(id).await? {
                    created.push(backup_id);
                    created_this_round += 1;
                }
            }

            log::info!("Backup round {} for {}: {} backups created.", round + 1, tier, created_this_round);
        }

        Ok(created)
    }

    /// Creates and programs a backup for `id`. Returns `None` if no admissible path exists.
    pub async fn add_backup(&mut self, id: SubflowId) -> Result<Option<SubflowId>> {
        let parent = self.state.table.get(id).cloned().ok_or(Error::UnknownSubflow(id))?;
        if let Some(existing) = parent.backup_id {
            return Err(Error::InvalidReservation(format!("subflow {} already has backup {}", id, existing)));
        }

        let protected: Vec<Path> = self
            .state
            .table
            .ancestor_chain(id)
            .into_iter()
            .filter_map(|ancestor| self.state.table.get(ancestor))
            .map(|ancestor| ancestor.path.clone())
            .collect();

        // The chain's own reservations must not block a backup that shares some of its links.
        for path in &protected {
            self.state.ledger.credit(path, parent.rate_share, parent.tier)?;
        }
        let candidates = self.state.catalog.available_paths(
            &self.state.ledger,
            &parent.source,
            &parent.destination,
            parent.rate_share,
            parent.tier,
            self.allow_degraded,
        );
        for path in &protected {
            self.state.ledger.debit(path, parent.rate_share, parent.tier)?;
        }

        let Some(path) = select_backup_path(candidates, &protected) else {
            log::debug!("No admissible backup path for subflow {} ({} => {}).", id, parent.source, parent.destination);
            return Ok(None);
        };
        let Some(ingress) = path.ingress().cloned() else {
            return Ok(None);
        };

        let backup_id = self.state.table.next_id();
        self.state.ledger.debit(&path, parent.rate_share, parent.tier)?;
        self.state.table.insert(Subflow {
            id: backup_id,
            flow_id: parent.flow_id,
            path: path.clone(),
            rate_share: parent.rate_share,
            n_splits: parent.n_splits,
            tier: parent.tier,
            source: parent.source.clone(),
            destination: parent.destination.clone(),
            active: false,
            parent_id: Some(id),
            backup_id: None,
            failure_count: 0,
        })?;

        self.programmer.program_fec(&path, backup_id).await?;
        self.programmer.program_backup_register(&ingress, id, backup_id).await?;

        log::info!("Backup {} protects subflow {} on {}.", backup_id, id, path);
        Ok(Some(backup_id))
    }
}

/// First candidate with the fewest links shared with `protected`.
///
/// A candidate containing every link of a protected path gives no protection against that path failing and is skipped.
pub fn select_backup_path(candidates: Vec<Path>, protected: &[Path]) -> Option<Path> {
    let mut best: Option<(usize, Path)> = None;

    'candidates: for candidate in candidates {
        let mut score = 0;
        for path in protected {
            let shared = candidate.shared_links(path);
            if shared >= path.edge_count() {
                continue 'candidates;
            }
            score += shared;
        }

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

#[cfg(test)]
mod tests {
    use super::*;

    fn path(hops: &[&str]) -> Path {
        hops.iter().copied().collect()
    }

    #[test]
    fn test_backup_skips_containing_candidates() {
        let protected = vec![path(&["s1", "s2", "s4"])];
        let candidates = vec![path(&["s1", "s2", "s4"]), path(&["s3", "s1", "s2", "s4"]), path(&["s1", "s2", "s3", "s4"])];

        assert_eq!(select_backup_path(candidates, &protected), Some(path(&["s1", "s2", "s3", "s4"])));
    }

    #[test]
    fn test_backup_single_switch_path_is_never_protected() {
        let protected = vec![path(&["s1"])];
        assert_eq!(select_backup_path(vec![path(&["s1"]), path(&["s1", "s2"])], &protected), None);
    }

    #[test]
    fn test_backup_scores_against_whole_chain() {
        let protected = vec![path(&["s1", "s2", "s4"]), path(&["s1", "s3", "s4"])];
        let candidates = vec![path(&["s1", "s2", "s3", "s4"]), path(&["s1", "s5", "s4"])];

        assert_eq!(select_backup_path(candidates, &protected), Some(path(&["s1", "s5", "s4"])));
    }
}
