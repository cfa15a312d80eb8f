/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Errors returned by the [`Broker`](super::Broker).
//!
//! [`BrokerError`] is what the library API returns. Because it carries I/O errors it cannot cross the
//! wire, so the TCP broker server flattens it into a [`BrokerFailure`] first.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::networking::{messages::WorkerResponse, network::NetworkError};
use crate::partition::PlanError;
use crate::types::basic::{Turn, WorkerAddress};
use crate::worker::session::SessionError;

#[derive(Debug)]
pub enum BrokerError {
    /// A worker or the display could not be reached, or the call to it failed. Fatal to the current
    /// run; never retried. `worker` is `None` when the display failed.
    ConnectivityFailure {
        worker: Option<WorkerAddress>,
        error: NetworkError,
    },

    /// The broker has no worker addresses to run on.
    NoWorkerAddresses,

    /// A continue was requested but no run has been reset since the broker started.
    NoCheckpoint,

    /// The operation needs a run that is running or paused.
    NoActiveRun,

    /// A run was requested while another run is still running or paused.
    RunInProgress,

    InvalidRunRequest(RunRequestError),

    /// A worker replied in a way that the protocol rules out.
    InvariantViolation(InvariantViolation),

    /// A turn failed after some workers had already advanced, so the workers no longer hold a single
    /// generation. `turn` is the last turn that completed. The run cannot be queried or checkpointed.
    RunAborted { turn: Turn },
}

impl BrokerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BrokerError::ConnectivityFailure { .. } | BrokerError::NoWorkerAddresses => {
                FailureKind::ConnectivityFailure
            }
            BrokerError::NoCheckpoint => FailureKind::NoCheckpoint,
            BrokerError::NoActiveRun => FailureKind::NoActiveRun,
            BrokerError::RunInProgress => FailureKind::RunInProgress,
            BrokerError::InvalidRunRequest(_) => FailureKind::InvalidRunRequest,
            BrokerError::InvariantViolation(_) => FailureKind::InvariantViolation,
            BrokerError::RunAborted { .. } => FailureKind::RunAborted,
        }
    }

    pub(crate) fn display_failure(error: NetworkError) -> BrokerError {
        BrokerError::ConnectivityFailure { worker: None, error }
    }
}

impl From<RunRequestError> for BrokerError {
    fn from(value: RunRequestError) -> Self {
        BrokerError::InvalidRunRequest(value)
    }
}

impl From<InvariantViolation> for BrokerError {
    fn from(value: InvariantViolation) -> Self {
        BrokerError::InvariantViolation(value)
    }
}

/// Enumerates the reasons a [`RunRequest`](super::RunRequest) is refused before any worker is
/// contacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequestError {
    /// The initial world's dimensions differ from the declared ones.
    DimensionMismatch {
        declared: (u32, u32),
        actual: (u32, u32),
    },

    /// The world has no rows or no columns.
    EmptyWorld,

    /// Row `row` of the world does not have the world's width.
    RaggedRow { row: u32, len: usize, width: u32 },

    Plan(PlanError),
}

impl From<PlanError> for RunRequestError {
    fn from(value: PlanError) -> Self {
        RunRequestError::Plan(value)
    }
}

#[derive(Debug)]
pub enum InvariantViolation {
    /// A fan-out collected a different number of replies than it sent requests.
    ReplyCountMismatch { expected: usize, received: usize },

    /// A worker answered with a response of the wrong kind.
    UnexpectedResponse { worker: WorkerAddress, response: WorkerResponse },

    /// A worker refused a request the broker only sends in a valid state.
    WorkerRejected { worker: WorkerAddress, error: SessionError },

    /// The rows gathered from the workers do not form a grid of the run's dimensions.
    MalformedWorld,
}

/// The kind of a [`BrokerError`], as reported to remote clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum FailureKind {
    ConnectivityFailure,
    NoCheckpoint,
    NoActiveRun,
    RunInProgress,
    InvalidRunRequest,
    InvariantViolation,
    RunAborted,
}

/// A [`BrokerError`] flattened for the wire: its kind, and its debug rendering.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BrokerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&BrokerError> for BrokerFailure {
    fn from(value: &BrokerError) -> Self {
        BrokerFailure {
            kind: value.kind(),
            message: format!("{:?}", value),
        }
    }
}
