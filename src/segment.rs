//! Segment assignment.
//!
//! Assignment maps each filtered row to an integer segment id in
//! `[1, segment_count]`. The uniform-random strategy here is a stand-in for a
//! trained clustering result; the [`Assigner`] trait keeps the interface
//! stable so a real algorithm can replace it without touching aggregation.
//! Within one call the assignment is fixed — every statistic derived from an
//! [`Assignment`] sees the same ids — but [`RandomAssigner`] re-randomizes on
//! every call, so repeated runs over identical inputs differ. Callers that
//! need repeatable runs use [`SeededAssigner`].

use anyhow::{Result, bail};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Segment-count bounds offered to the analyst.
pub const MIN_SEGMENT_COUNT: u16 = 3;
pub const MAX_SEGMENT_COUNT: u16 = 20;

/// Produces one segment id per row, each in `[1, segment_count]`.
pub trait Assigner {
    fn assign(&mut self, row_count: usize, segment_count: u16) -> Vec<u16>;
}

/// Placeholder strategy: uniform ids from the thread RNG, fresh every call.
#[derive(Debug, Default)]
pub struct RandomAssigner;

impl Assigner for RandomAssigner {
    fn assign(&mut self, row_count: usize, segment_count: u16) -> Vec<u16> {
        let mut rng = rand::rng();
        (0..row_count)
            .map(|_| rng.random_range(1..=segment_count))
            .collect()
    }
}

/// Deterministic variant over a PCG stream, for repeatable runs and tests.
#[derive(Debug)]
pub struct SeededAssigner {
    rng: Pcg32,
}

impl SeededAssigner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl Assigner for SeededAssigner {
    fn assign(&mut self, row_count: usize, segment_count: u16) -> Vec<u16> {
        (0..row_count)
            .map(|_| self.rng.random_range(1..=segment_count))
            .collect()
    }
}

/// A completed partition of the filtered rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Segment id per row, parallel to the filtered row list.
    pub segment_ids: Vec<u16>,
    /// `sizes[i]` counts rows with id `i + 1`; sums to `segment_ids.len()`.
    pub sizes: Vec<usize>,
    pub segment_count: u16,
}

impl Assignment {
    /// Validates ids against the segment count and tallies segment sizes.
    pub fn from_ids(segment_ids: Vec<u16>, segment_count: u16) -> Result<Self> {
        if segment_count == 0 {
            bail!("Segment count must be at least 1");
        }
        let mut sizes = vec![0usize; segment_count as usize];
        for &id in &segment_ids {
            if id == 0 || id > segment_count {
                bail!("Segment id {id} outside [1, {segment_count}]");
            }
            sizes[(id - 1) as usize] += 1;
        }
        Ok(Self {
            segment_ids,
            sizes,
            segment_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.segment_ids.len()
    }
}

/// Runs an assigner over `row_count` rows and packages the partition.
/// `segment_count` is checked up front; assigners may assume a non-empty
/// id range.
pub fn assign_segments(
    row_count: usize,
    segment_count: u16,
    assigner: &mut dyn Assigner,
) -> Result<Assignment> {
    if segment_count == 0 {
        bail!("Segment count must be at least 1");
    }
    let ids = assigner.assign(row_count, segment_count);
    let assignment = Assignment::from_ids(ids, segment_count)?;
    debug!(
        "Assigned {} row(s) into {} segment(s)",
        row_count, segment_count
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_partition_the_rows_exactly() {
        let mut assigner = RandomAssigner;
        let assignment = assign_segments(500, 8, &mut assigner).expect("assign");
        assert_eq!(assignment.segment_ids.len(), 500);
        assert_eq!(assignment.sizes.iter().sum::<usize>(), 500);
        assert!(assignment.segment_ids.iter().all(|&id| (1..=8).contains(&id)));
    }

    #[test]
    fn seeded_assigner_is_reproducible() {
        let a = SeededAssigner::new(7).assign(100, 5);
        let b = SeededAssigner::new(7).assign(100, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn every_id_is_representable_with_enough_rows() {
        let assignment =
            assign_segments(2000, 4, &mut SeededAssigner::new(42)).expect("assign");
        assert!(assignment.sizes.iter().all(|&size| size > 0));
    }

    #[test]
    fn zero_segment_count_is_an_error_not_a_panic() {
        assert!(assign_segments(3, 0, &mut RandomAssigner).is_err());
        assert!(assign_segments(3, 0, &mut SeededAssigner::new(1)).is_err());
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert!(Assignment::from_ids(vec![0], 3).is_err());
        assert!(Assignment::from_ids(vec![4], 3).is_err());
        assert!(Assignment::from_ids(vec![1, 2, 3], 3).is_ok());
    }

    #[test]
    fn zero_rows_yield_an_empty_partition() {
        let assignment = assign_segments(0, 5, &mut RandomAssigner).expect("assign");
        assert_eq!(assignment.row_count(), 0);
        assert_eq!(assignment.sizes, vec![0; 5]);
    }
}
