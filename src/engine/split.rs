//! Corporate action adjustment of an in-flight lot queue.

use super::Lot;
use crate::domain::{Decimal, SplitRatio};
use std::collections::VecDeque;

/// Result of applying a split to a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitAdjustment {
    pub lots_adjusted: usize,
    /// Change in total remaining quantity (positive for forward splits).
    pub quantity_delta: Decimal,
}

/// Rescale every lot by `ratio`: quantity *= r, price /= r.
///
/// Queue order is untouched, so FIFO matching continues as before. Each
/// lot's `remaining_cost` is left as is, so the queue's entry cost is
/// conserved exactly even when the rescaled price does not terminate.
/// An unusable ratio is a no-op. Returns `None` and leaves the queue
/// unchanged if a rescaled quantity is out of range.
pub fn apply_split(queue: &mut VecDeque<Lot>, ratio: SplitRatio) -> Option<SplitAdjustment> {
    let Some(r) = ratio.factor() else {
        return Some(SplitAdjustment::default());
    };

    let mut rescaled = Vec::with_capacity(queue.len());
    let mut adjustment = SplitAdjustment::default();
    for lot in queue.iter() {
        let remaining = lot.remaining_quantity.checked_mul(r)?;
        let original = lot.original_quantity.checked_mul(r)?;
        let price = lot.price.checked_div(r).unwrap_or(lot.price);
        adjustment.quantity_delta = adjustment
            .quantity_delta
            .checked_add(remaining.checked_sub(lot.remaining_quantity)?)?;
        rescaled.push((remaining, original, price));
    }

    for (lot, (remaining, original, price)) in queue.iter_mut().zip(rescaled) {
        lot.remaining_quantity = remaining;
        lot.original_quantity = original;
        lot.price = price;
        adjustment.lots_adjusted += 1;
    }
    Some(adjustment)
}
