use std::collections::HashSet;

use crate::domain::reservation::subflow::{Subflow, SubflowState};
use crate::domain::utils::id::{FlowId, SubflowId};
use crate::error::{Error, Result};

/// Flat arena owning every subflow. Ids are allocated densely from 1, so an id is its slot index plus one.
///
/// Backup chains are plain id relationships (`parent_id` / `backup_id`) between slots.
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    slots: Vec<Subflow>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next inserted subflow must carry (largest id + 1).
    pub fn next_id(&self) -> SubflowId {
        self.slots.len() as SubflowId + 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a subflow. Its id must be [`ReservationTable::next_id`], and its parent must exist and not yet have a backup.
    pub fn insert(&mut self, subflow: Subflow) -> Result<SubflowId> {
        if subflow.id != self.next_id() {
            return Err(Error::InvalidReservation(format!("subflow id {} is not the next free id {}", subflow.id, self.next_id())));
        }

        if let Some(parent_id) = subflow.parent_id {
            let parent = self.get_mut(parent_id).ok_or(Error::UnknownSubflow(parent_id))?;
            if let Some(existing) = parent.backup_id {
                return Err(Error::InvalidReservation(format!("subflow {} already has backup {}", parent_id, existing)));
            }
            parent.backup_id = Some(subflow.id);
        }

        let id = subflow.id;
        self.slots.push(subflow);
        Ok(id)
    }

    pub fn get(&self, id: SubflowId) -> Option<&Subflow> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, id: SubflowId) -> Option<&mut Subflow> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.slots.get_mut(index)
    }

    /// All subflows in ascending id (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = &Subflow> {
        self.slots.iter()
    }

    pub fn ids(&self) -> Vec<SubflowId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    /// Every subflow (primaries and backups) belonging to `flow_id`.
    pub fn flow_members(&self, flow_id: FlowId) -> impl Iterator<Item = &Subflow> {
        self.slots.iter().filter(move |s| s.flow_id == flow_id)
    }

    /// `id` followed by its parent, grandparent and so on up to the primary.
    pub fn ancestor_chain(&self, id: SubflowId) -> Vec<SubflowId> {
        self.walk(id, |s| s.parent_id)
    }

    /// Backups below `id`, nearest first. `id` itself is not included.
    pub fn descendant_chain(&self, id: SubflowId) -> Vec<SubflowId> {
        self.walk(id, |s| s.backup_id).into_iter().skip(1).collect()
    }

    /// Iterative pointer walk; stops at a missing id or at a revisited one.
    fn walk(&self, start: SubflowId, next: impl Fn(&Subflow) -> Option<SubflowId>) -> Vec<SubflowId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if !visited.insert(id) {
                log::error!("Backup chain starting at {} revisits subflow {}.", start, id);
                break;
            }
            let Some(subflow) = self.get(id) else {
                break;
            };
            chain.push(id);
            current = next(subflow);
        }

        chain
    }

    /// Whether the direct backup of `id` is forwarding.
    pub fn backup_active(&self, id: SubflowId) -> bool {
        self.get(id).and_then(|s| s.backup_id).and_then(|b| self.get(b)).map(|b| b.active).unwrap_or(false)
    }

    pub fn state(&self, id: SubflowId, threshold_fail: u32) -> Option<SubflowState> {
        self.get(id).map(|s| s.state(threshold_fail, self.backup_active(id)))
    }

    /// Hands the traffic of `id` to its backup. Returns the backup id, or `None` when there is nothing to fail over to.
    ///
    /// The failure count of `id` is kept; it keeps counting towards the recovery threshold.
    pub fn fail_over(&mut self, id: SubflowId) -> Result<Option<SubflowId>> {
        let backup_id = self.get(id).ok_or(Error::UnknownSubflow(id))?.backup_id;
        let Some(backup_id) = backup_id else {
            return Ok(None);
        };

        let backup = self.get_mut(backup_id).ok_or(Error::UnknownSubflow(backup_id))?;
        backup.active = true;
        backup.failure_count = 0;

        if let Some(subflow) = self.get_mut(id) {
            subflow.active = false;
        }

        Ok(Some(backup_id))
    }

    /// Puts `id` back in service and returns every backup below it to standby.
    ///
    /// # Returns
    /// The descendants that were forwarding before the reset.
    pub fn recover(&mut self, id: SubflowId) -> Result<Vec<SubflowId>> {
        let subflow = self.get_mut(id).ok_or(Error::UnknownSubflow(id))?;
        subflow.active = true;
        subflow.failure_count = 0;

        Ok(self.reset_backups(id))
    }

    /// Deactivates every backup below `id` and clears their counters.
    pub fn reset_backups(&mut self, id: SubflowId) -> Vec<SubflowId> {
        let mut deactivated = Vec::new();

        for backup_id in self.descendant_chain(id) {
            if let Some(backup) = self.get_mut(backup_id) {
                if backup.active {
                    deactivated.push(backup_id);
                }
                backup.active = false;
                backup.failure_count = 0;
            }
        }

        deactivated
    }
}
