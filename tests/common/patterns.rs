/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Grids with known evolutions, a single-partition reference simulation, and broker constructors.

use gol_halo::{
    broker::{Broker, BrokerDefinition},
    config::Configuration,
    display::{DisplaySink, NoDisplay},
    grid_update,
    networking::{in_process::InProcessNetwork, network::Network},
    types::{
        basic::{Cell, Turn, WorkerAddress},
        grid::Grid,
    },
};

/// A glider heading down and to the right, in the top-left corner of a 5x5 grid.
pub(crate) fn glider() -> Grid {
    Grid::with_alive_cells(
        5,
        5,
        &[
            Cell::new(1, 0),
            Cell::new(2, 1),
            Cell::new(0, 2),
            Cell::new(1, 2),
            Cell::new(2, 2),
        ],
    )
}

/// Advance `world` by one turn as a single partition whose halo is its own last and first rows.
pub(crate) fn step(world: &Grid) -> (Grid, Vec<Cell>) {
    let (rows, changed_cells) = grid_update::advance(
        world.rows(),
        world.row(-1),
        world.row(world.height() as i64),
        0,
    );
    (Grid::from_rows(rows).unwrap(), changed_cells)
}

/// `worlds[t]` is `world` after `t` turns, for `t` in `0..=turns`.
pub(crate) fn reference_worlds(world: &Grid, turns: u64) -> Vec<Grid> {
    let mut worlds = vec![world.clone()];
    for _ in 0..turns {
        let (next, _) = step(worlds.last().unwrap());
        worlds.push(next);
    }
    worlds
}

pub(crate) fn reference_world(world: &Grid, turns: u64) -> Grid {
    reference_worlds(world, turns).pop().unwrap()
}

pub(crate) fn configuration(worker_addresses: Vec<WorkerAddress>) -> Configuration {
    Configuration::builder()
        .worker_addresses(worker_addresses)
        .log_events(true)
        .build()
}

/// A broker over `worker_count` fresh in-process workers, without a display.
pub(crate) fn in_process_broker(worker_count: usize) -> Broker<InProcessNetwork, NoDisplay> {
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(worker_count);
    broker_on(network, NoDisplay, addresses)
}

pub(crate) fn broker_on<N: Network, D: DisplaySink>(network: N, display: D, addresses: Vec<WorkerAddress>) -> Broker<N, D> {
    BrokerDefinition::builder()
        .network(network)
        .display(display)
        .configuration(configuration(addresses))
        .build()
        .start()
}

pub(crate) fn turn(int: u64) -> Turn {
    Turn::new(int)
}
