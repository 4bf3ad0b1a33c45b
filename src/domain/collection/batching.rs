//! Field batching policy for question turns.
//!
//! Consecutive simple fields are grouped into a single question so the
//! conversation does not crawl ahead one field at a time. Complex fields
//! carry a structured widget and are always asked on their own.

use crate::domain::form::Field;

/// Upper bound on how many simple fields share one question.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 4;

/// Selects the next batch of fields to ask about.
///
/// Scans fillable fields in order, accumulating consecutive simple
/// fields up to `max_batch_size`. A complex field ends the scan: it is
/// deferred behind any simple fields already taken, or, when it comes
/// first, returned as a singleton batch.
///
/// The batch is always a prefix of `fillable`; it is empty only when
/// the input is.
pub fn select_batch(fillable: &[Field], max_batch_size: usize) -> &[Field] {
    let mut taken = 0;

    for field in fillable {
        if field.is_complex() {
            if taken == 0 {
                taken = 1;
            }
            break;
        }
        taken += 1;
        if taken >= max_batch_size {
            break;
        }
    }

    &fillable[..taken]
}
