//! Batch partitioning.
//!
//! Candidates are shuffled before slicing so nobody is systematically placed
//! in the first (earliest) batch because of input order.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::ScheduleError;

/// Shuffle `items` and slice them into batches of at most `batch_size`.
///
/// Every batch is non-empty; only the last may be short.
pub fn partition<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<Vec<T>>, ScheduleError> {
    if batch_size == 0 {
        return Err(ScheduleError::InvalidInput("batch size must be positive".to_string()));
    }
    if items.is_empty() {
        return Err(ScheduleError::InvalidInput("no candidates to partition".to_string()));
    }

    items.shuffle(rng);

    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut rest = items.into_iter().peekable();
    while rest.peek().is_some() {
        batches.push(rest.by_ref().take(batch_size).collect());
    }
    Ok(batches)
}
