//! Aggregate pending-record counting
//!
//! The UI shows one number: how many records still wait for upload. The
//! three per-kind fetches run concurrently; their completion order is
//! irrelevant and the results are summed once all three are in.

use shiftlog_core::ports::record_store::{IRecordStore, StoreError};

/// Counts records with `synced = false` across all three kinds
pub async fn pending_count(store: &dyn IRecordStore) -> Result<u64, StoreError> {
    let (checklists, non_conformances, incidents) = tokio::join!(
        store.get_pending_checklists(),
        store.get_pending_non_conformances(),
        store.get_pending_incidents(),
    );

    Ok((checklists?.len() + non_conformances?.len() + incidents?.len()) as u64)
}
