/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state a worker keeps for the one partition it owns.
//!
//! A session starts uninitialized. [`WorkerSession::set_up`] moves it to ready, after which it can be
//! advanced once per turn and queried between turns. All methods take `&mut self` or `&self`, so a
//! session that is shared between connections must be wrapped in a lock; this is what keeps a query
//! from observing a half-written slice.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::grid_update;
use crate::networking::messages::HaloReply;
use crate::types::basic::{Cell, Row, Turn};

pub struct WorkerSession {
    state: Option<OwnedPartition>,
}

// The partition and halo of a session that has been set up.
struct OwnedPartition {
    slice: Vec<Row>,
    start_row: u32,
    width: u32,
    row_above: Row,
    row_below: Row,
    turn: Turn,
    changed_cells: Vec<Cell>,
}

impl WorkerSession {
    pub fn new() -> WorkerSession {
        WorkerSession { state: None }
    }

    pub fn is_set_up(&self) -> bool {
        self.state.is_some()
    }

    /// Store `slice` as this worker's partition, replacing any previous one. The halo starts empty,
    /// which [`advance`](grid_update::advance) treats as all-dead.
    ///
    /// `turn` is the number of turns `slice` has already been advanced by; the next call to
    /// [`advance_one_turn`](Self::advance_one_turn) must be for `turn + 1`.
    pub fn set_up(&mut self, slice: Vec<Row>, start_row: u32, turn: Turn) -> Result<(), SessionError> {
        let width = match slice.first() {
            Some(row) => row.len(),
            None => return Err(SessionError::EmptySlice),
        };
        if slice.iter().any(|row| row.len() != width) {
            return Err(SessionError::RaggedSlice);
        }

        self.state = Some(OwnedPartition {
            slice,
            start_row,
            width: width as u32,
            row_above: Row::new(),
            row_below: Row::new(),
            turn,
            changed_cells: Vec::new(),
        });

        Ok(())
    }

    /// Compute `turn` from the previous turn and the given halo.
    ///
    /// # Return value
    /// The new first and last rows of the partition, and the cells that changed since the last time
    /// the changed cells were drained.
    pub fn advance_one_turn(&mut self, row_above: Row, row_below: Row, turn: Turn) -> Result<HaloReply, SessionError> {
        let partition = self.state.as_mut().ok_or(SessionError::NotSetUp)?;
        if turn != partition.turn.next() {
            return Err(SessionError::TurnOutOfSequence {
                expected: partition.turn.next(),
                received: turn,
            });
        }
        for halo in [&row_above, &row_below] {
            if !halo.is_empty() && halo.len() != partition.width as usize {
                return Err(SessionError::HaloWidthMismatch {
                    expected: partition.width,
                    received: halo.len() as u32,
                });
            }
        }

        partition.row_above = row_above;
        partition.row_below = row_below;

        let (slice, changed_cells) = grid_update::advance(
            &partition.slice,
            &partition.row_above,
            &partition.row_below,
            partition.start_row,
        );
        partition.slice = slice;
        partition.changed_cells.extend(changed_cells);
        partition.turn = turn;

        // Safety: set_up rejects empty slices, so first and last exist.
        let top_row = partition.slice[0].clone();
        let bottom_row = partition.slice[partition.slice.len() - 1].clone();

        Ok(HaloReply {
            top_row,
            bottom_row,
            changed_cells: std::mem::take(&mut partition.changed_cells),
        })
    }

    pub fn alive_cell_count(&self) -> Result<u64, SessionError> {
        let partition = self.state.as_ref().ok_or(SessionError::NotSetUp)?;
        Ok(grid_update::alive_count(&partition.slice) as u64)
    }

    /// Alive cells of the partition, with global coordinates, in row-major order.
    pub fn alive_cell_list(&self) -> Result<Vec<Cell>, SessionError> {
        let partition = self.state.as_ref().ok_or(SessionError::NotSetUp)?;
        Ok(grid_update::alive_cells(&partition.slice, partition.start_row))
    }

    pub fn current_slice(&self) -> Result<Vec<Row>, SessionError> {
        let partition = self.state.as_ref().ok_or(SessionError::NotSetUp)?;
        Ok(partition.slice.clone())
    }

    /// The last turn this session computed, or the turn it was seeded at.
    pub fn turn(&self) -> Option<Turn> {
        self.state.as_ref().map(|partition| partition.turn)
    }

    /// Release the partition. The session cannot be used afterwards.
    pub fn shut_down(self) {}
}

impl Default for WorkerSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerates the requests a [`WorkerSession`] refuses to serve. Sent back to the broker inside
/// [`WorkerResponse::Rejected`](crate::networking::messages::WorkerResponse::Rejected).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum SessionError {
    /// The session has not been set up with a partition yet.
    NotSetUp,

    /// `set_up` was called with no rows.
    EmptySlice,

    /// `set_up` was called with rows of different lengths.
    RaggedSlice,

    /// A halo row is neither empty nor as wide as the partition.
    HaloWidthMismatch { expected: u32, received: u32 },

    /// The broker asked for a turn other than the one after the last computed turn.
    TurnOutOfSequence { expected: Turn, received: Turn },
}
