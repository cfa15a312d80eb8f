/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Messages exchanged between the broker, its workers, the display, and the broker's clients.
//!
//! Every message is a request that receives exactly one response. All of them derive borsh so that
//! the [tcp](super::tcp) transport can frame them.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::broker::{BrokerFailure, RunOutcome, RunRequest};
use crate::types::{
    basic::{Cell, Row, Turn},
    grid::Grid,
};
use crate::worker::session::SessionError;

/// Requests the broker sends to a worker.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum WorkerRequest {
    /// Seed the worker with its partition. `start_row` is the global index of the first row of
    /// `slice`, and `turn` the number of turns the slice has already been advanced by.
    SetUpWorker { slice: Vec<Row>, start_row: u32, turn: Turn },

    /// Advance the partition by one turn using the given halo. `turn` is the turn being computed.
    AdvanceHalo { row_above: Row, row_below: Row, turn: Turn },

    QueryAliveCount,

    QueryAliveList,

    QueryWorld,

    ShutDownWorker,
}

/// Responses a worker sends back to the broker.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum WorkerResponse {
    Ack,
    Halo(HaloReply),
    AliveCount(u64),
    AliveList(Vec<Cell>),
    World(Vec<Row>),

    /// The worker could not serve the request in its current state.
    Rejected(SessionError),
}

/// A worker's reply to [`WorkerRequest::AdvanceHalo`]: the new edge rows of its partition, which
/// become the halo of its neighbours in the next turn, and the cells that changed this turn.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct HaloReply {
    pub top_row: Row,
    pub bottom_row: Row,
    pub changed_cells: Vec<Cell>,
}

/// Requests a client sends to the broker.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum BrokerRequest {
    RunBroker(RunRequest),
    QueryBrokerState,
    QueryBrokerWorld,
    PauseBroker,
    ResumeBroker,
    ResetBroker,
    ShutDownBroker,
}

/// Responses the broker sends back to a client.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum BrokerResponse {
    Ack,
    RunOutcome(RunOutcome),
    State { turn: Turn, alive_count: u64 },
    World { world: Grid, turn: Turn },
    Paused { turn: Turn },
    Failed(BrokerFailure),
}

/// The cells that changed in `turn`, pushed from the broker to the display once per turn.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DisplayUpdate {
    pub changed_cells: Vec<Cell>,
    pub turn: Turn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum DisplayResponse {
    Ack,
}
