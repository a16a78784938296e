//! Work queue derivation from the state store

use crate::state::ItemState;
use crate::storage::{ItemRecord, Storage};
use crate::RippleError;

/// Builds the ordered list of items still to scrape
///
/// An item is pending when it has no `ok` outcome and, unless
/// `retry_errors` is set, no `error` outcome either. Items come back in id
/// order; a non-zero `limit` keeps only the first `limit` of them.
pub fn build_work_queue(
    storage: &dyn Storage,
    retry_errors: bool,
    limit: usize,
) -> Result<Vec<ItemRecord>, RippleError> {
    let mut pending: Vec<ItemRecord> = storage
        .get_items_with_status()?
        .into_iter()
        .filter(|(_, status)| ItemState::from_outcome(*status).is_pending(retry_errors))
        .map(|(item, _)| item)
        .collect();

    pending.sort_by(|a, b| a.id.cmp(&b.id));

    if limit > 0 {
        pending.truncate(limit);
    }

    Ok(pending)
}
