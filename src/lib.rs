/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A broker/worker implementation of Conway's Game of Life on a toroidal grid.
//!
//! The grid is split into contiguous bands of rows, one per worker. Every turn, the
//! [broker](broker::Broker) sends each worker the two rows bordering its band (its halo), the
//! workers compute the next generation of their band concurrently, and the broker commits the new
//! border rows only once every worker has replied.
//!
//! ## Crate layout
//!
//! - [`grid_update`] and [`partition`]: pure functions for one generation of a band, and for splitting
//!   a grid into bands.
//! - [`worker`]: the per-band state machine and its request dispatch.
//! - [`broker`]: the turn barrier, pause/resume, reset/continue, and aggregation queries.
//! - [`networking`]: the pluggable transport and its in-process and TCP providers.
//! - [`display`]: where the changed cells of each turn are sent.
//! - [`config`], [`events`], and [`logging`]: configuration, event handlers, and event logs.

pub mod types;

pub mod grid_update;

pub mod partition;

pub mod worker;

pub mod broker;

pub mod networking;

pub mod display;

pub mod config;

pub mod events;

pub mod logging;

pub(crate) mod event_handlers;
