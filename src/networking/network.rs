/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::io;

use super::messages::{WorkerRequest, WorkerResponse};

/// A transport over which the broker can reach workers by address.
pub trait Network: Clone + Send + Sync + 'static {
    type Connection: WorkerConnection;

    /// Open a connection to the worker listening at `address`.
    fn connect(&self, address: &str) -> Result<Self::Connection, NetworkError>;
}

/// A request/response link to a single worker.
///
/// Implementations must be safe to share between threads: the broker calls different workers
/// concurrently, although it never issues two calls to the same connection at the same time
/// during a turn.
pub trait WorkerConnection: Send + Sync + 'static {
    /// Send `request` and block until the worker's response arrives.
    fn call(&self, request: WorkerRequest) -> Result<WorkerResponse, NetworkError>;
}

/// Enumerates the ways a call over a [`Network`] can fail. None of them are retried.
#[derive(Debug)]
pub enum NetworkError {
    /// Reading from or writing to the underlying stream failed.
    Io(io::Error),

    /// A frame could not be encoded or decoded.
    Codec(io::Error),

    /// A frame announced a length above the transport's limit.
    FrameTooLarge { len: u32 },

    /// The peer closed the connection, or (in-process) the worker thread exited.
    Disconnected,

    /// No worker is listening at the address.
    UnknownAddress(String),
}

impl From<io::Error> for NetworkError {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => NetworkError::Disconnected,
            _ => NetworkError::Io(value),
        }
    }
}
