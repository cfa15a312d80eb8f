/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A [`Network`] whose workers are threads in the current process.
//!
//! Each worker spawned with [`InProcessNetwork::spawn_worker`] runs a
//! [`WorkerSession`](crate::worker::session::WorkerSession) on its own thread and is reachable under
//! the name it was spawned with. Calls are passed over channels, so this provider never leaves any
//! artifacts and is what the test suite runs on.

use std::collections::HashMap;
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex, PoisonError,
};
use std::thread::JoinHandle;

use crate::types::basic::WorkerAddress;
use crate::worker::server::{start_worker, Envelope};

use super::messages::{WorkerRequest, WorkerResponse};
use super::network::{Network, NetworkError, WorkerConnection};

#[derive(Clone, Default)]
pub struct InProcessNetwork {
    workers: Arc<Mutex<HashMap<WorkerAddress, Sender<Envelope>>>>,
}

impl InProcessNetwork {
    pub fn new() -> InProcessNetwork {
        Self::default()
    }

    /// Start a worker thread reachable at `address`. A worker previously spawned under the same
    /// address stays alive but can no longer be connected to.
    pub fn spawn_worker(&self, address: impl Into<WorkerAddress>) -> JoinHandle<()> {
        let (to_worker, requests) = mpsc::channel();
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into(), to_worker);

        start_worker(requests)
    }

    /// Start `count` workers named `worker-0`, `worker-1`, ... and return their addresses in order.
    pub fn spawn_workers(&self, count: usize) -> (Vec<WorkerAddress>, Vec<JoinHandle<()>>) {
        (0..count)
            .map(|index| {
                let address = format!("worker-{}", index);
                let handle = self.spawn_worker(address.clone());
                (address, handle)
            })
            .unzip()
    }
}

impl Network for InProcessNetwork {
    type Connection = InProcessConnection;

    fn connect(&self, address: &str) -> Result<InProcessConnection, NetworkError> {
        let workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let to_worker = workers
            .get(address)
            .ok_or_else(|| NetworkError::UnknownAddress(address.to_string()))?;

        Ok(InProcessConnection {
            to_worker: Mutex::new(to_worker.clone()),
        })
    }
}

pub struct InProcessConnection {
    to_worker: Mutex<Sender<Envelope>>,
}

impl WorkerConnection for InProcessConnection {
    fn call(&self, request: WorkerRequest) -> Result<WorkerResponse, NetworkError> {
        let (reply_to, reply) = mpsc::channel();
        self.to_worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send((request, reply_to))
            .map_err(|_| NetworkError::Disconnected)?;

        reply.recv().map_err(|_| NetworkError::Disconnected)
    }
}
