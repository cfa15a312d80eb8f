/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The broker's static configuration, and the loader for the worker address file.

use std::{fs, io, path::Path};

use typed_builder::TypedBuilder;

use crate::types::basic::WorkerAddress;

/// Stores the parameters a [`Broker`](crate::broker::Broker) needs regardless of the run it is
/// serving.
///
/// ## Worker addresses
///
/// The addresses are read once, when the broker starts, and are used in order: a run with `n`
/// workers uses the first `n` addresses. If a run asks for more workers than there are addresses,
/// the run is given one worker per address instead.
///
/// ## Log Events
///
/// gol_halo logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Required:
    - `.worker_addresses(...)`
    - `.log_events(...)`
"))]
pub struct Configuration {
    #[builder(setter(doc = "Set the ordered list of worker addresses. Required."))]
    pub worker_addresses: Vec<WorkerAddress>,
    #[builder(setter(doc = "Enable logging? Required."))]
    pub log_events: bool,
}

/// Read a worker address file: one address per line, surrounding whitespace and blank lines ignored.
pub fn read_worker_addresses(path: impl AsRef<Path>) -> Result<Vec<WorkerAddress>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let addresses = parse_worker_addresses(&contents);
    if addresses.is_empty() {
        return Err(ConfigError::Empty);
    }

    Ok(addresses)
}

fn parse_worker_addresses(contents: &str) -> Vec<WorkerAddress> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),

    /// The file contains no addresses.
    Empty,
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        ConfigError::Io(value)
    }
}
