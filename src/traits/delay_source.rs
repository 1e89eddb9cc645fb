use crate::common::range::DelayRange;
use anyhow::Result;

/// Source of delay values. Implementations are driven from a single task,
/// one sample per request, so they take `&mut self` and need no locking.
pub trait DelaySource: Send {
    /// Draws one value in `[range.min(), range.max()]`.
    fn sample(&mut self, range: &DelayRange) -> Result<f64>;
}
