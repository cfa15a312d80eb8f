/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The worker side of the protocol: a [session](session::WorkerSession) that owns one partition, and
//! the [dispatch](server::handle_request) of wire requests onto it.

pub mod session;

pub mod server;
