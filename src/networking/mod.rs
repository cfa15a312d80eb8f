/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable request/response transport between the broker, its workers, and the display.
//!
//! The broker never talks to a socket directly. It reaches workers through an implementation of
//! [`Network`](network::Network), whose connections implement
//! [`WorkerConnection`](network::WorkerConnection): a single blocking `call` that sends one
//! [`WorkerRequest`](messages::WorkerRequest) and returns its
//! [`WorkerResponse`](messages::WorkerResponse). Two providers are included:
//! - [`in_process`]: workers are threads and calls travel over channels. Used by tests and by
//!   embedders that want a single process.
//! - [`tcp`]: workers, the broker, and the display are separate processes exchanging length-prefixed
//!   [borsh](https://docs.rs/borsh) frames.

pub mod messages;

pub mod network;

pub mod in_process;

pub mod tcp;

pub(crate) mod stream;
