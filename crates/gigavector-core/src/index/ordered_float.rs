//! A thin `f32` wrapper implementing a total order, for use as a
//! [`std::collections::BinaryHeap`] key.
//!
//! `f32` only implements `PartialOrd` because of `NaN`; distance kernels
//! never produce `NaN` for finite inputs, so `total_cmp` gives us a
//! consistent order without the panics a naive `partial_cmp().unwrap()`
//! would risk.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedFloat(pub f32);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
