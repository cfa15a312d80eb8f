/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Deterministic row partitioning of the grid among workers.
//!
//! Worker `i` of `n` gets `height / n` rows, plus one extra row if `i < height % n`. Every
//! implementation of the broker must reproduce exactly this distribution, because the halo of
//! worker `i` is read from workers `(i - 1 + n) % n` and `(i + 1) % n`.

use borsh::{BorshDeserialize, BorshSerialize};

/// A contiguous, inclusive range of global row indices owned by exactly one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Partition {
    pub start_row: u32,
    pub end_row: u32,
}

impl Partition {
    /// Number of rows in the partition.
    pub fn height(&self) -> u32 {
        self.end_row - self.start_row + 1
    }
}

/// Split `height` rows among `worker_count` workers.
pub fn plan(height: u32, worker_count: u32) -> Result<Vec<Partition>, PlanError> {
    if worker_count == 0 {
        return Err(PlanError::NoWorkers);
    }
    if worker_count > height {
        return Err(PlanError::MoreWorkersThanRows { worker_count, height });
    }

    let base = height / worker_count;
    let remainder = height % worker_count;

    let mut partitions = Vec::with_capacity(worker_count as usize);
    let mut start_row = 0;
    for worker in 0..worker_count {
        let rows = base + (worker < remainder) as u32;
        partitions.push(Partition {
            start_row,
            end_row: start_row + rows - 1,
        });
        start_row += rows;
    }

    Ok(partitions)
}

/// Index of the worker whose partition sits directly above worker `worker`'s, wrapping around.
pub fn upper_neighbour(worker: usize, worker_count: usize) -> usize {
    (worker + worker_count - 1) % worker_count
}

/// Index of the worker whose partition sits directly below worker `worker`'s, wrapping around.
pub fn lower_neighbour(worker: usize, worker_count: usize) -> usize {
    (worker + 1) % worker_count
}

/// Enumerates the requests [`plan`] cannot satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    NoWorkers,

    /// At least one partition would be empty.
    MoreWorkersThanRows { worker_count: u32, height: u32 },
}
