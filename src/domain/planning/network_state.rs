use std::sync::Arc;

use crate::domain::capacity::ledger::CapacityLedger;
use crate::domain::reservation::reservation_table::ReservationTable;
use crate::domain::routing::path_catalog::PathCatalog;
use crate::domain::topology::topology::TopologyView;

/// Everything placement mutates: residual capacity, the path cache and the subflow table.
#[derive(Debug)]
pub struct NetworkState {
    pub ledger: CapacityLedger,
    pub catalog: PathCatalog,
    pub table: ReservationTable,
}

impl NetworkState {
    pub fn new(topology: Arc<dyn TopologyView>, shuffle_candidates: bool) -> Self {
        let ledger = CapacityLedger::from_topology(topology.as_ref());
        let catalog = PathCatalog::new(topology).with_shuffled_candidates(shuffle_candidates);

        NetworkState { ledger, catalog, table: ReservationTable::new() }
    }
}
