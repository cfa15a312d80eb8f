/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state of one run, and the turn barrier that advances it.
//!
//! ## Barrier
//!
//! Every turn goes through two phases:
//! 1. **Compute**: the boundary table is snapshotted, and every worker is sent its halo for the next
//!    turn: the bottom row of the partition above it and the top row of the partition below it, as of
//!    the last completed turn. The calls run concurrently, and all of them read the same snapshot.
//! 2. **Commit**: once every worker has replied, the new edge rows are written into the boundary
//!    table, the changed cells are merged in worker order, and the turn counter is incremented.
//!
//! The boundary table is only locked for the snapshot and for the commit, never while a call is in
//! flight. If any call fails, nothing is committed and the turn counter stays where it was. The
//! workers whose calls succeeded have moved on a generation by then, so the run is marked aborted
//! and every later query on it fails with [`BrokerError::RunAborted`].
//!
//! ## Superstep lock
//!
//! A second lock is held for the whole of a turn. Aggregation queries and reset take it too, so they
//! always observe the workers between turns, never halfway through one.

use std::mem;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use crate::display::DisplaySink;
use crate::networking::{
    messages::{HaloReply, WorkerRequest, WorkerResponse},
    network::{Network, WorkerConnection},
};
use crate::partition::{self, lower_neighbour, upper_neighbour};
use crate::types::{
    basic::{Cell, Row, Turn, WorkerAddress},
    grid::Grid,
};

use super::errors::{BrokerError, InvariantViolation, RunRequestError};
use super::fan_out::{broadcast, call_all, unexpected, WorkerRecord};
use super::lock;
use super::pause::PauseGate;
use super::run::RunOutcome;

pub(crate) struct RunContext<C: WorkerConnection> {
    width: u32,
    height: u32,
    total_turns: Turn,
    workers: Vec<WorkerRecord<C>>,
    barrier: Mutex<BarrierState>,
    superstep: Mutex<()>,
    pub(crate) pause: PauseGate,
    stopped: AtomicBool,
    aborted: AtomicBool,
}

struct BarrierState {
    turn: Turn,

    /// The (top, bottom) rows of every partition as of `turn`, in worker order.
    boundaries: Vec<(Row, Row)>,

    changed_cells: Vec<Cell>,
}

/// A turn that went through the barrier.
pub(crate) struct CompletedTurn {
    pub(crate) turn: Turn,
    pub(crate) changed_cell_count: usize,
}

impl<C: WorkerConnection> RunContext<C> {
    /// Connect to the workers at `addresses`, one per partition, and seed each with its slice of
    /// `world`, which is taken to be the world as of `turn`.
    pub(crate) fn set_up<N: Network<Connection = C>>(
        network: &N,
        addresses: &[WorkerAddress],
        world: &Grid,
        turn: Turn,
        total_turns: Turn,
    ) -> Result<RunContext<C>, BrokerError> {
        let partitions =
            partition::plan(world.height(), addresses.len() as u32).map_err(RunRequestError::from)?;

        let workers = addresses
            .iter()
            .zip(partitions)
            .map(|(address, partition)| {
                let connection = network.connect(address).map_err(|error| BrokerError::ConnectivityFailure {
                    worker: Some(address.clone()),
                    error,
                })?;
                Ok(WorkerRecord {
                    address: address.clone(),
                    partition,
                    connection,
                })
            })
            .collect::<Result<Vec<_>, BrokerError>>()?;

        let set_up_requests = workers
            .iter()
            .map(|worker| WorkerRequest::SetUpWorker {
                slice: world.slice(worker.partition.start_row, worker.partition.end_row),
                start_row: worker.partition.start_row,
                turn,
            })
            .collect();
        for (worker, response) in workers.iter().zip(call_all(&workers, set_up_requests)?) {
            if response != WorkerResponse::Ack {
                return Err(unexpected(worker, response));
            }
        }

        let boundaries = workers
            .iter()
            .map(|worker| {
                let top = world.rows()[worker.partition.start_row as usize].clone();
                let bottom = world.rows()[worker.partition.end_row as usize].clone();
                (top, bottom)
            })
            .collect();

        Ok(RunContext {
            width: world.width(),
            height: world.height(),
            total_turns,
            workers,
            barrier: Mutex::new(BarrierState {
                turn,
                boundaries,
                changed_cells: Vec::new(),
            }),
            superstep: Mutex::new(()),
            pause: PauseGate::new(),
            stopped: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        })
    }

    pub(crate) fn turn(&self) -> Turn {
        lock(&self.barrier).turn
    }

    pub(crate) fn total_turns(&self) -> Turn {
        self.total_turns
    }

    pub(crate) fn worker_count(&self) -> u32 {
        self.workers.len() as u32
    }

    /// Whether the run loop should stop: the last turn has been computed, or the run was stopped.
    pub(crate) fn is_finished(&self) -> bool {
        self.stopped.load(Ordering::SeqCst) || self.turn() >= self.total_turns
    }

    /// Stop the run at the next turn boundary, releasing it if it is paused.
    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.pause.close();
    }

    /// Take the run through one turn of the barrier and hand the changed cells to `display`.
    ///
    /// # Return value
    /// `None` if the run was stopped before the turn could start.
    pub(crate) fn execute_turn(&self, display: &impl DisplaySink) -> Result<Option<CompletedTurn>, BrokerError> {
        let _superstep = lock(&self.superstep);
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let worker_count = self.workers.len();
        let (next_turn, requests) = {
            let barrier = lock(&self.barrier);
            let next_turn = barrier.turn.next();
            let requests = (0..worker_count)
                .map(|worker| WorkerRequest::AdvanceHalo {
                    row_above: barrier.boundaries[upper_neighbour(worker, worker_count)].1.clone(),
                    row_below: barrier.boundaries[lower_neighbour(worker, worker_count)].0.clone(),
                    turn: next_turn,
                })
                .collect();
            (next_turn, requests)
        };

        let replies = match self.collect_halos(requests) {
            Ok(replies) => replies,
            Err(error) => {
                self.aborted.store(true, Ordering::SeqCst);
                return Err(error);
            }
        };

        let changed_cells = {
            let mut barrier = lock(&self.barrier);
            let barrier = &mut *barrier;
            for (boundary, reply) in barrier.boundaries.iter_mut().zip(replies) {
                *boundary = (reply.top_row, reply.bottom_row);
                barrier.changed_cells.extend(reply.changed_cells);
            }
            barrier.turn = next_turn;
            mem::take(&mut barrier.changed_cells)
        };

        display
            .notify_changed_cells(&changed_cells, next_turn)
            .map_err(BrokerError::display_failure)?;

        Ok(Some(CompletedTurn {
            turn: next_turn,
            changed_cell_count: changed_cells.len(),
        }))
    }

    fn collect_halos(&self, requests: Vec<WorkerRequest>) -> Result<Vec<HaloReply>, BrokerError> {
        let mut replies = Vec::with_capacity(self.workers.len());
        for (worker, response) in self.workers.iter().zip(call_all(&self.workers, requests)?) {
            match response {
                WorkerResponse::Halo(reply) => replies.push(reply),
                other => return Err(unexpected(worker, other)),
            }
        }

        Ok(replies)
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn ensure_consistent(&self) -> Result<(), BrokerError> {
        if self.is_aborted() {
            return Err(BrokerError::RunAborted { turn: self.turn() });
        }

        Ok(())
    }

    pub(crate) fn alive_count(&self) -> Result<(Turn, u64), BrokerError> {
        let _superstep = lock(&self.superstep);
        self.ensure_consistent()?;
        let mut total = 0;
        for (worker, response) in self.workers.iter().zip(broadcast(&self.workers, WorkerRequest::QueryAliveCount)?) {
            match response {
                WorkerResponse::AliveCount(count) => total += count,
                other => return Err(unexpected(worker, other)),
            }
        }

        Ok((self.turn(), total))
    }

    pub(crate) fn alive_cells(&self) -> Result<(Turn, Vec<Cell>), BrokerError> {
        let superstep = lock(&self.superstep);
        self.ensure_consistent()?;
        Ok((self.turn(), self.gather_alive_cells(&superstep)?))
    }

    pub(crate) fn world(&self) -> Result<(Grid, Turn), BrokerError> {
        let superstep = lock(&self.superstep);
        self.ensure_consistent()?;
        Ok((self.gather_world(&superstep)?, self.turn()))
    }

    /// The world, turn, and alive cells, all as of the same turn.
    pub(crate) fn outcome(&self) -> Result<RunOutcome, BrokerError> {
        let superstep = lock(&self.superstep);
        self.ensure_consistent()?;
        Ok(RunOutcome {
            world: self.gather_world(&superstep)?,
            turn: self.turn(),
            alive_cells: self.gather_alive_cells(&superstep)?,
        })
    }

    // The guard parameter documents that the caller holds the superstep lock.
    fn gather_world(&self, _superstep: &MutexGuard<'_, ()>) -> Result<Grid, BrokerError> {
        let mut rows = Vec::with_capacity(self.height as usize);
        for (worker, response) in self.workers.iter().zip(broadcast(&self.workers, WorkerRequest::QueryWorld)?) {
            match response {
                WorkerResponse::World(slice) if slice.len() as u32 == worker.partition.height() => rows.extend(slice),
                WorkerResponse::World(_) => return Err(InvariantViolation::MalformedWorld.into()),
                other => return Err(unexpected(worker, other)),
            }
        }

        Grid::from_rows(rows)
            .filter(|world| world.width() == self.width && world.height() == self.height)
            .ok_or_else(|| InvariantViolation::MalformedWorld.into())
    }

    fn gather_alive_cells(&self, _superstep: &MutexGuard<'_, ()>) -> Result<Vec<Cell>, BrokerError> {
        let mut cells = Vec::new();
        for (worker, response) in self.workers.iter().zip(broadcast(&self.workers, WorkerRequest::QueryAliveList)?) {
            match response {
                WorkerResponse::AliveList(list) => cells.extend(list),
                other => return Err(unexpected(worker, other)),
            }
        }

        Ok(cells)
    }
}
