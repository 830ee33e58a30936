//! Chunking: splits a call whose payload includes one oversized memory
//! region into several transport-sized wire calls, re-issuing the same
//! task id for each slice.
//!
//! This module only computes the chunking plan; [`crate::engine::Engine`]
//! drives the actual repeated calls, since only it has `(basic_task, args)`
//! to build the per-slice request with.

use crate::error::{fatal, FramingFault};

/// `(offset, len)` pairs covering `total_len` bytes, each fitting under
/// `max_request_size` once `per_msg_overhead` bytes of fixed framing are
/// accounted for.
///
/// Size-transparent by construction: concatenating the slices described by
/// the plan, in order, reconstructs the original `0..total_len` range
/// exactly once. With `total_len == 0` the single slice `(0, 0)` is
/// returned so zero-length calls still get exactly one wire call.
///
/// `max_request_size` leaving no room for `per_msg_overhead` means no slice
/// of this call, however small, could ever fit under the configured wire
/// cap — a misconfiguration, not something to silently paper over by
/// chunking down to one byte at a time and still blowing the cap on every
/// message.
pub fn chunk_plan(total_len: usize, max_request_size: usize, per_msg_overhead: usize) -> Vec<(usize, usize)> {
    let budget = match max_request_size.checked_sub(per_msg_overhead) {
        Some(budget) if budget > 0 => budget,
        _ => fatal(FramingFault::new(format!(
            "max_request_size ({max_request_size}) cannot fit even the \
             {per_msg_overhead}-byte fixed overhead of this call"
        ))),
    };
    if total_len <= budget {
        return vec![(0, total_len)];
    }
    let mut plan = Vec::with_capacity(total_len / budget + 1);
    let mut offset = 0;
    while offset < total_len {
        let len = budget.min(total_len - offset);
        plan.push((offset, len));
        offset += len;
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_slice_when_under_budget() {
        assert_eq!(chunk_plan(100, 1000, 20), vec![(0, 100)]);
    }

    #[test]
    fn zero_length_region_still_yields_one_call() {
        assert_eq!(chunk_plan(0, 1000, 20), vec![(0, 0)]);
    }

    #[test]
    fn oversized_region_splits_with_a_remainder_last() {
        // region.len = 3 * max + 17, a whole number of budgets plus a remainder
        let max_request_size = 64 * 1024;
        let overhead = 0;
        let total = 3 * max_request_size + 17;
        let plan = chunk_plan(total, max_request_size, overhead);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0], (0, max_request_size));
        assert_eq!(plan[1], (max_request_size, max_request_size));
        assert_eq!(plan[2], (2 * max_request_size, max_request_size));
        assert_eq!(plan[3], (3 * max_request_size, 17));
    }

    #[test]
    fn plan_covers_the_whole_range_exactly_once() {
        let plan = chunk_plan(12345, 1000, 37);
        let mut cursor = 0;
        for (offset, len) in &plan {
            assert_eq!(*offset, cursor);
            cursor += len;
        }
        assert_eq!(cursor, 12345);
    }
}
