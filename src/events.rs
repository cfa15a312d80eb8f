/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the events a [`Broker`](crate::broker::Broker) emits, for event handling and
//! logging.
//!
//! An event for a given action indicates that the action has been completed. Handlers are
//! registered on the [`BrokerDefinition`](crate::broker::BrokerDefinition) builder and are called
//! synchronously on the thread that completed the action.

use std::time::SystemTime;

use crate::types::basic::Turn;

pub enum Event {
    StartRun(StartRunEvent),
    CompleteTurn(CompleteTurnEvent),
    Pause(PauseEvent),
    Resume(ResumeEvent),
    Reset(ResetEvent),
    FinishRun(FinishRunEvent),
    ShutDown(ShutDownEvent),
}

/// The workers of a run have been set up and the first turn is about to start.
pub struct StartRunEvent {
    pub timestamp: SystemTime,
    pub turn: Turn,
    pub total_turns: Turn,
    pub worker_count: u32,
    pub from_checkpoint: bool,
    pub world_digest: [u8; 32],
}

/// A turn has gone through the barrier and its changed cells have been sent to the display.
pub struct CompleteTurnEvent {
    pub timestamp: SystemTime,
    pub turn: Turn,
    pub changed_cell_count: usize,
}

/// The run has parked at the boundary after `turn`.
pub struct PauseEvent {
    pub timestamp: SystemTime,
    pub turn: Turn,
}

pub struct ResumeEvent {
    pub timestamp: SystemTime,
}

/// The live run has been discarded, and checkpointed at `turn`.
pub struct ResetEvent {
    pub timestamp: SystemTime,
    pub turn: Turn,
    pub world_digest: [u8; 32],
}

/// A run has returned its outcome, either because it computed its last turn or because it was
/// reset.
pub struct FinishRunEvent {
    pub timestamp: SystemTime,
    pub turn: Turn,
    pub alive_count: usize,
}

pub struct ShutDownEvent {
    pub timestamp: SystemTime,
}
