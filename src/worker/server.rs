/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Serving [`WorkerRequest`]s from a [`WorkerSession`].
//!
//! [`handle_request`] is shared by every transport. [`start_worker`] runs a session on its own thread
//! behind a channel, which is how the [in-process](crate::networking::in_process) transport hosts
//! workers; the [tcp](crate::networking::tcp) transport wraps the session in a lock instead.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::networking::messages::{WorkerRequest, WorkerResponse};

use super::session::WorkerSession;

/// A request together with the channel its response should be sent back on.
pub(crate) type Envelope = (WorkerRequest, Sender<WorkerResponse>);

/// Apply `request` to `session` and produce the response to send back.
///
/// [`WorkerRequest::ShutDownWorker`] is acknowledged here; it is up to the transport to stop serving
/// the session afterwards.
pub fn handle_request(session: &mut WorkerSession, request: WorkerRequest) -> WorkerResponse {
    let result = match request {
        WorkerRequest::SetUpWorker { slice, start_row, turn } => {
            let height = slice.len();
            session.set_up(slice, start_row, turn).map(|()| {
                log::debug!("SetUpWorker, {}, {}, {}", start_row, height, turn);
                WorkerResponse::Ack
            })
        }
        WorkerRequest::AdvanceHalo { row_above, row_below, turn } => session
            .advance_one_turn(row_above, row_below, turn)
            .map(WorkerResponse::Halo),
        WorkerRequest::QueryAliveCount => session.alive_cell_count().map(WorkerResponse::AliveCount),
        WorkerRequest::QueryAliveList => session.alive_cell_list().map(WorkerResponse::AliveList),
        WorkerRequest::QueryWorld => session.current_slice().map(WorkerResponse::World),
        WorkerRequest::ShutDownWorker => {
            log::info!("ShutDownWorker, {:?}", session.turn());
            Ok(WorkerResponse::Ack)
        }
    };

    result.unwrap_or_else(|error| {
        log::warn!("Rejected, {:?}", error);
        WorkerResponse::Rejected(error)
    })
}

/// Spawn a thread that owns a fresh [`WorkerSession`] and serves the requests arriving on `requests`
/// one at a time, until it is shut down or every sender is dropped.
pub(crate) fn start_worker(requests: Receiver<Envelope>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut session = WorkerSession::new();
        while let Ok((request, reply_to)) = requests.recv() {
            let shut_down = request == WorkerRequest::ShutDownWorker;
            let response = handle_request(&mut session, request);

            // The caller may have given up waiting; the session keeps serving regardless.
            let _ = reply_to.send(response);

            if shut_down {
                session.shut_down();
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::basic::{Cell, Turn};
    use crate::worker::session::SessionError;
    use std::sync::mpsc;

    #[test]
    fn dispatches_requests_to_the_session() {
        let mut session = WorkerSession::new();
        assert_eq!(
            handle_request(&mut session, WorkerRequest::QueryAliveCount),
            WorkerResponse::Rejected(SessionError::NotSetUp)
        );

        let slice = vec![vec![false, true, false]];
        assert_eq!(
            handle_request(
                &mut session,
                WorkerRequest::SetUpWorker { slice: slice.clone(), start_row: 4, turn: Turn::new(0) }
            ),
            WorkerResponse::Ack
        );
        assert_eq!(handle_request(&mut session, WorkerRequest::QueryWorld), WorkerResponse::World(slice));
        assert_eq!(
            handle_request(&mut session, WorkerRequest::QueryAliveList),
            WorkerResponse::AliveList(vec![Cell::new(1, 4)])
        );
    }

    #[test]
    fn worker_thread_exits_after_shut_down() {
        let (to_worker, requests) = mpsc::channel();
        let worker = start_worker(requests);

        let (reply_to, reply) = mpsc::channel();
        to_worker.send((WorkerRequest::ShutDownWorker, reply_to)).unwrap();
        assert_eq!(reply.recv().unwrap(), WorkerResponse::Ack);
        worker.join().unwrap();

        let (reply_to, _reply) = mpsc::channel();
        assert!(to_worker.send((WorkerRequest::QueryAliveCount, reply_to)).is_err());
    }
}
