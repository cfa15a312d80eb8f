/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Runs of the broker over in-process workers, checked against a single-partition simulation.

mod common;

use std::sync::{Arc, Mutex};

use borsh::{BorshDeserialize, BorshSerialize};
use gol_halo::{
    broker::{BrokerDefinition, BrokerError, FailureKind, RunRequest, RunRequestError},
    display::{ChannelDisplay, NoDisplay},
    events::{CompleteTurnEvent, StartRunEvent},
    networking::in_process::InProcessNetwork,
    partition::PlanError,
    types::{basic::Cell, grid::Grid},
};
use log::LevelFilter;

use common::{
    logging::setup_logger,
    network::FailingNetwork,
    patterns::{broker_on, configuration, glider, in_process_broker, reference_world, reference_worlds, step, turn},
};

#[test]
fn glider_translates_diagonally_in_four_turns() {
    setup_logger(LevelFilter::Info);
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(1);
    let (display, updates) = ChannelDisplay::new();
    let broker = broker_on(network, display, addresses);

    let outcome = broker.run(RunRequest::fresh(glider(), 4, 1)).unwrap();

    assert_eq!(outcome.turn, turn(4));
    assert_eq!(
        outcome.alive_cells,
        vec![
            Cell::new(2, 1),
            Cell::new(3, 2),
            Cell::new(1, 3),
            Cell::new(2, 3),
            Cell::new(3, 3)
        ]
    );
    assert_eq!(outcome.world, Grid::with_alive_cells(5, 5, &outcome.alive_cells));

    let updates: Vec<_> = updates.try_iter().collect();
    let worlds = reference_worlds(&glider(), 4);
    assert_eq!(updates.len(), 4);
    for (index, update) in updates.iter().enumerate() {
        assert_eq!(update.turn, turn(index as u64 + 1));
        assert_eq!(update.changed_cells, step(&worlds[index]).1);
    }
}

#[test]
fn two_rows_split_over_two_workers_match_one_partition() {
    setup_logger(LevelFilter::Info);
    let world = Grid::with_alive_cells(6, 2, &[Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0), Cell::new(4, 1)]);

    let single = in_process_broker(1).run(RunRequest::fresh(world.clone(), 5, 1)).unwrap();
    let split = in_process_broker(2).run(RunRequest::fresh(world.clone(), 5, 2)).unwrap();

    assert_eq!(split, single);
    assert_eq!(split.world, reference_world(&world, 5));
}

#[test]
fn random_soups_match_the_reference_for_any_worker_count() {
    setup_logger(LevelFilter::Info);
    for (seed, worker_count) in [(1, 1), (2, 2), (3, 3), (4, 5), (5, 8), (6, 17)] {
        let world = Grid::random(24, 17, 0.35, seed);
        let expected = reference_world(&world, 30);

        let outcome = in_process_broker(worker_count as usize)
            .run(RunRequest::fresh(world, 30, worker_count))
            .unwrap();

        assert_eq!(outcome.world, expected, "seed {} on {} workers", seed, worker_count);
        assert_eq!(outcome.alive_cells, expected.alive_cells());
    }
}

#[test]
fn changed_cells_of_all_workers_are_merged_in_row_order() {
    setup_logger(LevelFilter::Info);
    let world = Grid::random(12, 12, 0.4, 99);
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(4);
    let (display, updates) = ChannelDisplay::new();
    let broker = broker_on(network, display, addresses);

    broker.run(RunRequest::fresh(world.clone(), 6, 4)).unwrap();

    let worlds = reference_worlds(&world, 6);
    for (index, update) in updates.try_iter().enumerate() {
        assert_eq!(update.changed_cells, step(&worlds[index]).1);
    }
}

#[test]
fn completed_turns_are_consecutive() {
    setup_logger(LevelFilter::Info);
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(3);
    let completed = Arc::new(Mutex::new(Vec::new()));
    let broker = {
        let completed = Arc::clone(&completed);
        BrokerDefinition::builder()
            .network(network)
            .display(NoDisplay)
            .configuration(configuration(addresses))
            .on_complete_turn(move |event: &CompleteTurnEvent| completed.lock().unwrap().push(event.turn.int()))
            .build()
            .start()
    };

    broker.run(RunRequest::fresh(Grid::random(9, 9, 0.3, 5), 25, 3)).unwrap();

    assert_eq!(*completed.lock().unwrap(), (1..=25).collect::<Vec<u64>>());
    assert_eq!(broker.state().unwrap().0, turn(25));
}

#[test]
fn worker_count_is_reduced_to_the_number_of_addresses() {
    setup_logger(LevelFilter::Info);
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(2);
    let started_with = Arc::new(Mutex::new(None));
    let broker = {
        let started_with = Arc::clone(&started_with);
        BrokerDefinition::builder()
            .network(network)
            .display(NoDisplay)
            .configuration(configuration(addresses))
            .on_start_run(move |event: &StartRunEvent| *started_with.lock().unwrap() = Some(event.worker_count))
            .build()
            .start()
    };

    let world = Grid::random(10, 10, 0.3, 8);
    let outcome = broker.run(RunRequest::fresh(world.clone(), 7, 5)).unwrap();

    assert_eq!(*started_with.lock().unwrap(), Some(2));
    assert_eq!(outcome.world, reference_world(&world, 7));
}

#[test]
fn invalid_requests_are_refused_before_contacting_workers() {
    setup_logger(LevelFilter::Info);
    let broker = in_process_broker(2);

    let error = broker.run(RunRequest::fresh(Grid::new(4, 4), 3, 0)).unwrap_err();
    assert!(matches!(
        error,
        BrokerError::InvalidRunRequest(RunRequestError::Plan(PlanError::NoWorkers))
    ));
    assert_eq!(error.kind(), FailureKind::InvalidRunRequest);

    let mut mismatched = RunRequest::fresh(Grid::new(4, 4), 3, 1);
    mismatched.width = 8;
    assert!(matches!(
        broker.run(mismatched),
        Err(BrokerError::InvalidRunRequest(RunRequestError::DimensionMismatch { .. }))
    ));

    assert!(matches!(
        broker.run(RunRequest::fresh(Grid::new(4, 1), 3, 2)),
        Err(BrokerError::InvalidRunRequest(RunRequestError::Plan(PlanError::MoreWorkersThanRows { .. })))
    ));

    // A world decoded from the wire whose rows are narrower than its width.
    let ragged = Grid::try_from_slice(&(5u32, vec![vec![false, true, false]; 4]).try_to_vec().unwrap()).unwrap();
    assert!(matches!(
        broker.run(RunRequest::fresh(ragged, 50, 2)),
        Err(BrokerError::InvalidRunRequest(RunRequestError::RaggedRow { row: 0, len: 3, width: 5 }))
    ));

    assert!(matches!(broker.state(), Err(BrokerError::NoActiveRun)));
}

#[test]
fn unreachable_workers_fail_the_run() {
    setup_logger(LevelFilter::Info);
    let broker = broker_on(InProcessNetwork::new(), NoDisplay, Vec::new());
    let error = broker.run(RunRequest::fresh(Grid::new(4, 4), 3, 1)).unwrap_err();
    assert!(matches!(error, BrokerError::NoWorkerAddresses));
    assert_eq!(error.kind(), FailureKind::ConnectivityFailure);

    let broker = broker_on(InProcessNetwork::new(), NoDisplay, vec!["nowhere".to_string()]);
    match broker.run(RunRequest::fresh(Grid::new(4, 4), 3, 1)) {
        Err(BrokerError::ConnectivityFailure { worker, .. }) => assert_eq!(worker.as_deref(), Some("nowhere")),
        other => panic!("expected a connectivity failure, got {:?}", other),
    }
}

#[test]
fn a_closed_display_fails_the_run() {
    setup_logger(LevelFilter::Info);
    let network = InProcessNetwork::new();
    let (addresses, _) = network.spawn_workers(1);
    let (display, updates) = ChannelDisplay::new();
    drop(updates);
    let broker = broker_on(network, display, addresses);

    match broker.run(RunRequest::fresh(glider(), 4, 1)) {
        Err(BrokerError::ConnectivityFailure { worker: None, .. }) => (),
        other => panic!("expected a display failure, got {:?}", other),
    }
    // The first turn was committed before its update was refused.
    assert_eq!(broker.state().unwrap().0, turn(1));
}

#[test]
fn a_turn_that_fails_part_way_aborts_the_run() {
    setup_logger(LevelFilter::Info);
    let world = Grid::random(8, 8, 0.4, 31);
    let network = FailingNetwork::new("worker-1", turn(3));
    let (addresses, _) = network.spawn_workers(2);
    let broker = broker_on(network, NoDisplay, addresses);

    match broker.run(RunRequest::fresh(world.clone(), 10, 2)) {
        Err(BrokerError::ConnectivityFailure { worker, .. }) => assert_eq!(worker.as_deref(), Some("worker-1")),
        other => panic!("expected a connectivity failure, got {:?}", other),
    }

    // worker-0 has computed turn 3 and worker-1 has not, so nothing may be reported or checkpointed.
    assert!(matches!(broker.state(), Err(BrokerError::RunAborted { turn: completed }) if completed == turn(2)));
    assert!(matches!(broker.world(), Err(BrokerError::RunAborted { .. })));
    assert!(matches!(broker.alive_cells(), Err(BrokerError::RunAborted { .. })));
    let error = broker.reset().unwrap_err();
    assert_eq!(error.kind(), FailureKind::RunAborted);
    assert!(broker.checkpoint().is_none());
    assert!(matches!(broker.state(), Err(BrokerError::NoActiveRun)));
    assert!(matches!(
        broker.run(RunRequest::continue_from_checkpoint(10)),
        Err(BrokerError::NoCheckpoint)
    ));

    // A fresh run sets the workers up again.
    let outcome = broker.run(RunRequest::fresh(world.clone(), 10, 2)).unwrap();
    assert_eq!(outcome.world, reference_world(&world, 10));
}

#[test]
fn shut_down_stops_every_worker() {
    setup_logger(LevelFilter::Info);
    let network = InProcessNetwork::new();
    let (addresses, workers) = network.spawn_workers(3);
    let broker = broker_on(network, NoDisplay, addresses);
    broker.run(RunRequest::fresh(Grid::random(6, 6, 0.5, 1), 2, 3)).unwrap();

    broker.shut_down();

    assert!(broker.is_shut_down());
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(matches!(broker.state(), Err(BrokerError::NoActiveRun)));
}
