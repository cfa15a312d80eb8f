/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::JoinHandle;

use gol_halo::{
    networking::{
        in_process::{InProcessConnection, InProcessNetwork},
        messages::{WorkerRequest, WorkerResponse},
        network::{Network, NetworkError, WorkerConnection},
    },
    types::basic::{Row, Turn, WorkerAddress},
};

/// An [`AdvanceHalo`](WorkerRequest::AdvanceHalo) request as it was sent to a worker.
#[derive(Clone, Debug)]
pub(crate) struct HaloRecord {
    pub(crate) address: WorkerAddress,
    pub(crate) turn: Turn,
    pub(crate) row_above: Row,
    pub(crate) row_below: Row,
}

/// An in-process network that records every halo the broker sends.
#[derive(Clone)]
pub(crate) struct RecordingNetwork {
    inner: InProcessNetwork,
    halos: Arc<Mutex<Vec<HaloRecord>>>,
}

impl RecordingNetwork {
    pub(crate) fn new() -> RecordingNetwork {
        RecordingNetwork {
            inner: InProcessNetwork::new(),
            halos: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn spawn_workers(&self, count: usize) -> (Vec<WorkerAddress>, Vec<JoinHandle<()>>) {
        self.inner.spawn_workers(count)
    }

    pub(crate) fn halos(&self) -> Vec<HaloRecord> {
        self.halos.lock().unwrap().clone()
    }
}

impl Network for RecordingNetwork {
    type Connection = RecordingConnection;

    fn connect(&self, address: &str) -> Result<RecordingConnection, NetworkError> {
        Ok(RecordingConnection {
            address: address.to_string(),
            inner: self.inner.connect(address)?,
            halos: Arc::clone(&self.halos),
        })
    }
}

pub(crate) struct RecordingConnection {
    address: WorkerAddress,
    inner: InProcessConnection,
    halos: Arc<Mutex<Vec<HaloRecord>>>,
}

impl WorkerConnection for RecordingConnection {
    fn call(&self, request: WorkerRequest) -> Result<WorkerResponse, NetworkError> {
        if let WorkerRequest::AdvanceHalo {
            row_above,
            row_below,
            turn,
        } = &request
        {
            self.halos.lock().unwrap().push(HaloRecord {
                address: self.address.clone(),
                turn: *turn,
                row_above: row_above.clone(),
                row_below: row_below.clone(),
            });
        }
        self.inner.call(request)
    }
}

/// An in-process network on which the `AdvanceHalo` call for `turn` to the worker at `address`
/// fails once, after being delivered to no one.
#[derive(Clone)]
pub(crate) struct FailingNetwork {
    inner: InProcessNetwork,
    address: WorkerAddress,
    turn: Turn,
    failed: Arc<AtomicBool>,
}

impl FailingNetwork {
    pub(crate) fn new(address: &str, turn: Turn) -> FailingNetwork {
        FailingNetwork {
            inner: InProcessNetwork::new(),
            address: address.to_string(),
            turn,
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn spawn_workers(&self, count: usize) -> (Vec<WorkerAddress>, Vec<JoinHandle<()>>) {
        self.inner.spawn_workers(count)
    }
}

impl Network for FailingNetwork {
    type Connection = FailingConnection;

    fn connect(&self, address: &str) -> Result<FailingConnection, NetworkError> {
        Ok(FailingConnection {
            inner: self.inner.connect(address)?,
            fail_at: (address == self.address).then_some(self.turn),
            failed: Arc::clone(&self.failed),
        })
    }
}

pub(crate) struct FailingConnection {
    inner: InProcessConnection,
    fail_at: Option<Turn>,
    failed: Arc<AtomicBool>,
}

impl WorkerConnection for FailingConnection {
    fn call(&self, request: WorkerRequest) -> Result<WorkerResponse, NetworkError> {
        if let WorkerRequest::AdvanceHalo { turn, .. } = &request {
            if Some(*turn) == self.fail_at && !self.failed.swap(true, Ordering::SeqCst) {
                return Err(NetworkError::Disconnected);
            }
        }
        self.inner.call(request)
    }
}
