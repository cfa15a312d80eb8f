/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! What a client asks the broker to run, and what it gets back.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::partition;
use crate::types::{
    basic::{Cell, Turn},
    grid::Grid,
};

use super::errors::RunRequestError;

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum InitialState {
    /// Start at turn 0 from the given world.
    Fresh(Grid),

    /// Resume from the broker's checkpoint. The world, the turn, and the worker count are taken from
    /// the checkpoint, and the request's own `worker_count`, `width`, and `height` are ignored.
    Continue,
}

/// A request to compute a world up to turn `total_turns`.
///
/// `total_turns` is absolute: a run continued from a checkpoint taken at turn 40 with
/// `total_turns = 100` computes 60 more turns, and one with `total_turns <= 40` computes none.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RunRequest {
    pub initial: InitialState,
    pub total_turns: u64,
    pub worker_count: u32,
    pub width: u32,
    pub height: u32,
}

impl RunRequest {
    pub fn fresh(world: Grid, total_turns: u64, worker_count: u32) -> RunRequest {
        RunRequest {
            width: world.width(),
            height: world.height(),
            initial: InitialState::Fresh(world),
            total_turns,
            worker_count,
        }
    }

    pub fn continue_from_checkpoint(total_turns: u64) -> RunRequest {
        RunRequest {
            initial: InitialState::Continue,
            total_turns,
            worker_count: 0,
            width: 0,
            height: 0,
        }
    }

    /// Check a fresh request against its own declarations. Continue requests are checked against
    /// the checkpoint instead.
    pub(crate) fn validate(&self) -> Result<(), RunRequestError> {
        if let InitialState::Fresh(world) = &self.initial {
            validate_world(world, self.worker_count)?;
            if (world.width(), world.height()) != (self.width, self.height) {
                return Err(RunRequestError::DimensionMismatch {
                    declared: (self.width, self.height),
                    actual: (world.width(), world.height()),
                });
            }
        }

        Ok(())
    }
}

pub(crate) fn validate_world(world: &Grid, worker_count: u32) -> Result<(), RunRequestError> {
    if world.width() == 0 || world.height() == 0 {
        return Err(RunRequestError::EmptyWorld);
    }
    // A world decoded from the wire has not been through `Grid::from_rows`.
    if let Some((row, cells)) = world
        .rows()
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != world.width() as usize)
    {
        return Err(RunRequestError::RaggedRow {
            row: row as u32,
            len: cells.len(),
            width: world.width(),
        });
    }
    partition::plan(world.height(), worker_count)?;

    Ok(())
}

/// The result of a run that reached its last turn, or was reset before reaching it.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RunOutcome {
    pub world: Grid,
    pub turn: Turn,
    pub alive_cells: Vec<Cell>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PlanError;

    #[test]
    fn fresh_requests_are_validated() {
        assert_eq!(RunRequest::fresh(Grid::new(4, 4), 10, 2).validate(), Ok(()));
        assert_eq!(
            RunRequest::fresh(Grid::new(4, 4), 10, 0).validate(),
            Err(RunRequestError::Plan(PlanError::NoWorkers))
        );
        assert_eq!(
            RunRequest::fresh(Grid::new(4, 2), 10, 3).validate(),
            Err(RunRequestError::Plan(PlanError::MoreWorkersThanRows {
                worker_count: 3,
                height: 2
            }))
        );
        assert_eq!(RunRequest::fresh(Grid::new(0, 0), 10, 1).validate(), Err(RunRequestError::EmptyWorld));

        let mut request = RunRequest::fresh(Grid::new(4, 4), 10, 1);
        request.height = 5;
        assert_eq!(
            request.validate(),
            Err(RunRequestError::DimensionMismatch {
                declared: (4, 5),
                actual: (4, 4)
            })
        );
    }

    #[test]
    fn decoded_worlds_with_ragged_rows_are_refused() {
        let mut rows = vec![vec![false; 5]; 4];
        rows[2] = vec![false, true, false];
        let world = Grid::try_from_slice(&(5u32, rows).try_to_vec().unwrap()).unwrap();

        assert_eq!(
            RunRequest::fresh(world, 50, 2).validate(),
            Err(RunRequestError::RaggedRow {
                row: 2,
                len: 3,
                width: 5
            })
        );
    }

    #[test]
    fn continue_requests_skip_validation() {
        assert_eq!(RunRequest::continue_from_checkpoint(10).validate(), Ok(()));
    }
}
