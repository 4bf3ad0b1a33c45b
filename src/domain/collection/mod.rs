//! Batch selection policy and per-session collection state.

mod batching;
mod state;

pub use batching::{select_batch, DEFAULT_MAX_BATCH_SIZE};
pub use state::{CollectionPhase, CollectionState, MergeReport, RetryAction};
