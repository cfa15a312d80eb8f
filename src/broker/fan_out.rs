/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Fork-join calls to every worker of a run.
//!
//! [`call_all`] sends one request per worker, each on its own scoped thread, and returns only after
//! every thread has reported back through a channel. The replies are returned in worker order
//! regardless of the order they arrived in.

use std::sync::mpsc;
use std::thread;

use crate::networking::{
    messages::{WorkerRequest, WorkerResponse},
    network::{NetworkError, WorkerConnection},
};
use crate::partition::Partition;
use crate::types::basic::WorkerAddress;

use super::errors::{BrokerError, InvariantViolation};

/// What the broker keeps about one worker of a run.
pub(crate) struct WorkerRecord<C: WorkerConnection> {
    pub(crate) address: WorkerAddress,
    pub(crate) partition: Partition,
    pub(crate) connection: C,
}

/// Send `requests[i]` to `workers[i]` for every `i`, concurrently, and wait for all responses.
///
/// Fails if any call fails, after all calls have returned. Rejections are turned into
/// [`InvariantViolation::WorkerRejected`]; other response kinds are left to the caller to check.
pub(crate) fn call_all<C: WorkerConnection>(
    workers: &[WorkerRecord<C>],
    requests: Vec<WorkerRequest>,
) -> Result<Vec<WorkerResponse>, BrokerError> {
    let expected = workers.len();
    if requests.len() != expected {
        return Err(InvariantViolation::ReplyCountMismatch {
            expected,
            received: requests.len(),
        }
        .into());
    }

    let (reply_to, replies) = mpsc::channel::<(usize, Result<WorkerResponse, NetworkError>)>();
    thread::scope(|scope| {
        for (index, (worker, request)) in workers.iter().zip(requests).enumerate() {
            let reply_to = reply_to.clone();
            scope.spawn(move || {
                let _ = reply_to.send((index, worker.connection.call(request)));
            });
        }
    });
    drop(reply_to);

    let mut responses: Vec<Option<WorkerResponse>> = (0..expected).map(|_| None).collect();
    let mut received = 0;
    let mut first_error = None;
    for (index, result) in replies.iter() {
        received += 1;
        match result {
            Ok(WorkerResponse::Rejected(error)) => {
                first_error.get_or_insert(BrokerError::from(InvariantViolation::WorkerRejected {
                    worker: workers[index].address.clone(),
                    error,
                }));
            }
            Ok(response) => {
                if responses[index].replace(response).is_some() {
                    return Err(InvariantViolation::ReplyCountMismatch {
                        expected,
                        received: expected + 1,
                    }
                    .into());
                }
            }
            Err(error) => {
                first_error.get_or_insert(BrokerError::ConnectivityFailure {
                    worker: Some(workers[index].address.clone()),
                    error,
                });
            }
        }
    }

    if let Some(error) = first_error {
        return Err(error);
    }
    if received != expected {
        return Err(InvariantViolation::ReplyCountMismatch { expected, received }.into());
    }

    responses
        .into_iter()
        .map(|response| {
            response.ok_or_else(|| BrokerError::from(InvariantViolation::ReplyCountMismatch { expected, received }))
        })
        .collect()
}

/// Send the same request to every worker.
pub(crate) fn broadcast<C: WorkerConnection>(
    workers: &[WorkerRecord<C>],
    request: WorkerRequest,
) -> Result<Vec<WorkerResponse>, BrokerError> {
    call_all(workers, vec![request; workers.len()])
}

pub(crate) fn unexpected<C: WorkerConnection>(worker: &WorkerRecord<C>, response: WorkerResponse) -> BrokerError {
    InvariantViolation::UnexpectedResponse {
        worker: worker.address.clone(),
        response,
    }
    .into()
}
