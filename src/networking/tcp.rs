/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The TCP transport, and the servers that expose workers, the broker, and the display over it.
//!
//! Every connection is persistent and strictly request/response: a peer writes one
//! [frame](super::stream), then reads one frame back. Servers accept any number of connections and
//! serve each on its own thread; all connections to a worker share its one
//! [`WorkerSession`](crate::worker::session::WorkerSession).

use std::io::{self, ErrorKind};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc, Mutex, PoisonError,
};
use std::thread;
use std::time::Duration;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::broker::{Broker, BrokerFailure, RunOutcome, RunRequest};
use crate::display::DisplaySink;
use crate::types::{
    basic::{Cell, Turn},
    grid::Grid,
};
use crate::worker::{server::handle_request, session::WorkerSession};

use super::messages::*;
use super::network::{Network, NetworkError, WorkerConnection};
use super::stream::{read_frame, write_frame};

/// How long an idle accept loop sleeps before checking for new connections and for shutdown.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, Default)]
pub struct TcpNetwork;

impl Network for TcpNetwork {
    type Connection = TcpConnection;

    fn connect(&self, address: &str) -> Result<TcpConnection, NetworkError> {
        Ok(TcpConnection {
            stream: Mutex::new(connect(address)?),
        })
    }
}

pub struct TcpConnection {
    stream: Mutex<TcpStream>,
}

impl WorkerConnection for TcpConnection {
    fn call(&self, request: WorkerRequest) -> Result<WorkerResponse, NetworkError> {
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        write_frame(&mut *stream, &request)?;
        read_frame(&mut *stream)
    }
}

fn connect(address: impl ToSocketAddrs) -> Result<TcpStream, NetworkError> {
    let stream = TcpStream::connect(address).map_err(NetworkError::Io)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// A [`DisplaySink`] that pushes updates to a display server. The connection is opened on the first
/// update and reopened on the next update after a failure.
pub struct TcpDisplay {
    address: String,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpDisplay {
    pub fn new(address: impl Into<String>) -> TcpDisplay {
        TcpDisplay {
            address: address.into(),
            stream: Mutex::new(None),
        }
    }
}

impl DisplaySink for TcpDisplay {
    fn notify_changed_cells(&self, changed_cells: &[Cell], turn: Turn) -> Result<(), NetworkError> {
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => connect(self.address.as_str())?,
        };

        let update = DisplayUpdate {
            changed_cells: changed_cells.to_vec(),
            turn,
        };
        write_frame(&mut stream, &update)?;
        let DisplayResponse::Ack = read_frame(&mut stream)?;
        *slot = Some(stream);
        Ok(())
    }
}

/// Whether a server keeps accepting connections after serving a request.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Stop,
}

/// Accept connections on `listener` and answer every request on them with `handler`, until a
/// request makes `handler` return [`Control::Stop`].
fn serve<Q, R, H>(listener: TcpListener, handler: H) -> io::Result<()>
where
    Q: BorshDeserialize + 'static,
    R: BorshSerialize + 'static,
    H: Fn(Q) -> (R, Control) + Send + Sync + 'static,
{
    listener.set_nonblocking(true)?;
    let handler = Arc::new(handler);
    let stopped = Arc::new(AtomicBool::new(false));

    while !stopped.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(error) = stream.set_nonblocking(false).and_then(|()| stream.set_nodelay(true)) {
                    log::warn!("Dropping connection from {}: {}", peer, error);
                    continue;
                }
                log::debug!("Accepted connection from {}", peer);

                let handler = Arc::clone(&handler);
                let stopped = Arc::clone(&stopped);
                thread::spawn(move || serve_connection(stream, &*handler, &stopped));
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

fn serve_connection<Q, R>(mut stream: TcpStream, handler: &dyn Fn(Q) -> (R, Control), stopped: &AtomicBool)
where
    Q: BorshDeserialize,
    R: BorshSerialize,
{
    loop {
        let request = match read_frame::<Q>(&mut stream) {
            Ok(request) => request,
            Err(NetworkError::Disconnected) => return,
            Err(error) => {
                log::warn!("Dropping connection after a bad request: {:?}", error);
                return;
            }
        };

        let (response, control) = handler(request);
        if let Err(error) = write_frame(&mut stream, &response) {
            log::debug!("Could not send response: {:?}", error);
            return;
        }
        if control == Control::Stop {
            stopped.store(true, Ordering::SeqCst);
            return;
        }
    }
}

/// Serve a single worker on `listener` until it is told to shut down.
pub fn serve_worker(listener: TcpListener) -> io::Result<()> {
    let session = Mutex::new(WorkerSession::new());
    serve(listener, move |request: WorkerRequest| {
        let control = match request {
            WorkerRequest::ShutDownWorker => Control::Stop,
            _ => Control::Continue,
        };
        let response = handle_request(&mut session.lock().unwrap_or_else(PoisonError::into_inner), request);
        (response, control)
    })
}

/// Serve `broker` on `listener` until it is shut down.
pub fn serve_broker<N: Network, D: DisplaySink>(listener: TcpListener, broker: Arc<Broker<N, D>>) -> io::Result<()> {
    serve(listener, move |request: BrokerRequest| {
        let response = handle_broker_request(&broker, request);
        let control = if broker.is_shut_down() {
            Control::Stop
        } else {
            Control::Continue
        };
        (response, control)
    })
}

fn handle_broker_request<N: Network, D: DisplaySink>(broker: &Broker<N, D>, request: BrokerRequest) -> BrokerResponse {
    let result = match request {
        BrokerRequest::RunBroker(run_request) => broker.run(run_request).map(BrokerResponse::RunOutcome),
        BrokerRequest::QueryBrokerState => broker
            .state()
            .map(|(turn, alive_count)| BrokerResponse::State { turn, alive_count }),
        BrokerRequest::QueryBrokerWorld => broker.world().map(|(world, turn)| BrokerResponse::World { world, turn }),
        BrokerRequest::PauseBroker => broker.pause().map(|turn| BrokerResponse::Paused { turn }),
        BrokerRequest::ResumeBroker => broker.resume().map(|()| BrokerResponse::Ack),
        BrokerRequest::ResetBroker => broker.reset().map(|_| BrokerResponse::Ack),
        BrokerRequest::ShutDownBroker => {
            broker.shut_down();
            Ok(BrokerResponse::Ack)
        }
    };

    result.unwrap_or_else(|error| BrokerResponse::Failed(BrokerFailure::from(&error)))
}

/// Serve a display on `listener`, forwarding every update into `updates`. Stops once the receiving
/// end of `updates` is dropped and another update arrives.
pub fn serve_display(listener: TcpListener, updates: Sender<DisplayUpdate>) -> io::Result<()> {
    let updates = Mutex::new(updates);
    serve(listener, move |update: DisplayUpdate| {
        let sent = updates.lock().unwrap_or_else(PoisonError::into_inner).send(update);
        let control = match sent {
            Ok(()) => Control::Continue,
            Err(_) => Control::Stop,
        };
        (DisplayResponse::Ack, control)
    })
}

/// A client of a broker served by [`serve_broker`].
///
/// A call blocks until the broker responds; in particular [`run`](Self::run) blocks for the whole run.
/// To pause or query a run in progress, open a second client.
pub struct TcpBrokerClient {
    stream: TcpStream,
}

impl TcpBrokerClient {
    pub fn connect(address: impl ToSocketAddrs) -> Result<TcpBrokerClient, NetworkError> {
        Ok(TcpBrokerClient {
            stream: connect(address)?,
        })
    }

    pub fn run(&mut self, request: RunRequest) -> Result<RunOutcome, ClientError> {
        match self.call(BrokerRequest::RunBroker(request))? {
            BrokerResponse::RunOutcome(outcome) => Ok(outcome),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// The latest run's completed turn and number of alive cells.
    pub fn state(&mut self) -> Result<(Turn, u64), ClientError> {
        match self.call(BrokerRequest::QueryBrokerState)? {
            BrokerResponse::State { turn, alive_count } => Ok((turn, alive_count)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub fn world(&mut self) -> Result<(Grid, Turn), ClientError> {
        match self.call(BrokerRequest::QueryBrokerWorld)? {
            BrokerResponse::World { world, turn } => Ok((world, turn)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub fn pause(&mut self) -> Result<Turn, ClientError> {
        match self.call(BrokerRequest::PauseBroker)? {
            BrokerResponse::Paused { turn } => Ok(turn),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub fn resume(&mut self) -> Result<(), ClientError> {
        self.call_for_ack(BrokerRequest::ResumeBroker)
    }

    pub fn reset(&mut self) -> Result<(), ClientError> {
        self.call_for_ack(BrokerRequest::ResetBroker)
    }

    pub fn shut_down(&mut self) -> Result<(), ClientError> {
        self.call_for_ack(BrokerRequest::ShutDownBroker)
    }

    fn call_for_ack(&mut self, request: BrokerRequest) -> Result<(), ClientError> {
        match self.call(request)? {
            BrokerResponse::Ack => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn call(&mut self, request: BrokerRequest) -> Result<BrokerResponse, ClientError> {
        write_frame(&mut self.stream, &request)?;
        match read_frame(&mut self.stream)? {
            BrokerResponse::Failed(failure) => Err(ClientError::Broker(failure)),
            response => Ok(response),
        }
    }
}

#[derive(Debug)]
pub enum ClientError {
    Network(NetworkError),

    /// The broker refused or failed the request.
    Broker(BrokerFailure),

    /// The broker answered with a response of the wrong kind.
    UnexpectedResponse,
}

impl From<NetworkError> for ClientError {
    fn from(value: NetworkError) -> Self {
        ClientError::Network(value)
    }
}
