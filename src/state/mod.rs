//! State module for tracking per-item scrape progress
//!
//! # Components
//!
//! - `OutcomeStatus`: the persisted result of the latest extraction attempt (ok / error)
//! - `ItemState`: the derived lifecycle position of an item (pending / done / failed),
//!   which decides whether the work queue picks it up

mod item_state;
mod outcome_status;

// Re-export main types
pub use item_state::ItemState;
pub use outcome_status::OutcomeStatus;
