/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::SystemTime;

use typed_builder::TypedBuilder;

use crate::config::Configuration;
use crate::display::DisplaySink;
use crate::event_handlers::{EventHandlers, HandlerPtr};
use crate::events::*;
use crate::networking::{
    messages::WorkerRequest,
    network::{Network, WorkerConnection},
};
use crate::types::{
    basic::{Cell, Turn, WorkerAddress},
    grid::Grid,
};

use super::checkpoint::Checkpoint;
use super::errors::BrokerError;
use super::lock;
use super::run::{validate_world, InitialState, RunOutcome, RunRequest};
use super::run_context::RunContext;

/// Stores all necessary parameters and trait implementations required to run the [Broker].
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [BrokerDefinition]. On the builder call the following methods to construct a valid [BrokerDefinition].

    Required:
    - `.network(...)`
    - `.display(...)`
    - `.configuration(...)`

    Optional:
    - `.checkpoint(...)`
    - `.on_start_run(...)`
    - `.on_complete_turn(...)`
    - `.on_pause(...)`
    - `.on_resume(...)`
    - `.on_reset(...)`
    - `.on_finish_run(...)`
    - `.on_shut_down(...)`
"))]
pub struct BrokerDefinition<N: Network, D: DisplaySink> {
    #[builder(setter(doc = "Set the transport used to reach workers. The argument must implement the [Network](crate::networking::network::Network) trait. Required."))]
    network: N,
    #[builder(setter(doc = "Set the sink that receives the changed cells of every turn. Use [NoDisplay](crate::display::NoDisplay) if there is none. Required."))]
    display: D,
    #[builder(setter(doc = "Set the [configuration](Configuration). Required."))]
    configuration: Configuration,
    #[builder(default, setter(strip_option, doc = "Seed the broker with a [Checkpoint] to continue from, e.g., one read back with [Checkpoint::from_bytes]. Optional."))]
    checkpoint: Option<Checkpoint>,

    #[builder(default, setter(transform = |handler: impl Fn(&StartRunEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<StartRunEvent>),
    doc = "Register a handler closure to be invoked after the workers of a run are set up. Optional."))]
    on_start_run: Option<HandlerPtr<StartRunEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&CompleteTurnEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<CompleteTurnEvent>),
    doc = "Register a handler closure to be invoked after every turn goes through the barrier. Optional."))]
    on_complete_turn: Option<HandlerPtr<CompleteTurnEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&PauseEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<PauseEvent>),
    doc = "Register a handler closure to be invoked after the run parks at a turn boundary. Optional."))]
    on_pause: Option<HandlerPtr<PauseEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ResumeEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ResumeEvent>),
    doc = "Register a handler closure to be invoked after the run is resumed. Optional."))]
    on_resume: Option<HandlerPtr<ResumeEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ResetEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ResetEvent>),
    doc = "Register a handler closure to be invoked after the run is checkpointed and discarded. Optional."))]
    on_reset: Option<HandlerPtr<ResetEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&FinishRunEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<FinishRunEvent>),
    doc = "Register a handler closure to be invoked after a run returns its outcome. Optional."))]
    on_finish_run: Option<HandlerPtr<FinishRunEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ShutDownEvent) + Send + Sync + 'static| Some(Box::new(handler) as HandlerPtr<ShutDownEvent>),
    doc = "Register a handler closure to be invoked after the workers are told to shut down. Optional."))]
    on_shut_down: Option<HandlerPtr<ShutDownEvent>>,
}

impl<N: Network, D: DisplaySink> BrokerDefinition<N, D> {
    pub fn start(self) -> Broker<N, D> {
        let event_handlers = EventHandlers::new(
            self.configuration.log_events,
            self.on_start_run,
            self.on_complete_turn,
            self.on_pause,
            self.on_resume,
            self.on_reset,
            self.on_finish_run,
            self.on_shut_down,
        );

        Broker {
            network: self.network,
            display: self.display,
            configuration: self.configuration,
            event_handlers,
            current: Mutex::new(None),
            checkpoint: Mutex::new(self.checkpoint),
            run_active: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        }
    }
}

/// A broker serving one run at a time. Share it between threads with an [`Arc`]: [`run`](Self::run)
/// blocks for the length of a run, and every other method may be called concurrently with it.
pub struct Broker<N: Network, D: DisplaySink> {
    network: N,
    display: D,
    configuration: Configuration,
    event_handlers: EventHandlers,

    /// The latest run. Kept after the run completes or fails, so that it can still be queried (or,
    /// if it was aborted, report why it cannot be), until it is reset or replaced.
    current: Mutex<Option<Arc<RunContext<N::Connection>>>>,
    checkpoint: Mutex<Option<Checkpoint>>,
    run_active: AtomicBool,
    shut_down: AtomicBool,
}

impl<N: Network, D: DisplaySink> Broker<N, D> {
    /// Compute the requested run to its last turn, or until it is reset, and return the final world.
    pub fn run(&self, request: RunRequest) -> Result<RunOutcome, BrokerError> {
        request.validate()?;
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BrokerError::RunInProgress);
        }
        let _active = ActiveRun(&self.run_active);

        let (world, turn, requested_workers, from_checkpoint) = match request.initial {
            InitialState::Fresh(world) => (world, Turn::new(0), request.worker_count, false),
            InitialState::Continue => {
                let checkpoint = lock(&self.checkpoint).clone().ok_or(BrokerError::NoCheckpoint)?;
                validate_world(&checkpoint.world, checkpoint.worker_count)?;
                (checkpoint.world, checkpoint.turn, checkpoint.worker_count, true)
            }
        };
        let addresses = self.discover_workers(requested_workers)?;

        let context = Arc::new(RunContext::set_up(
            &self.network,
            addresses,
            &world,
            turn,
            Turn::new(request.total_turns),
        )?);
        *lock(&self.current) = Some(Arc::clone(&context));

        if !self.event_handlers.is_empty() {
            self.event_handlers.fire_handlers(Event::StartRun(StartRunEvent {
                timestamp: SystemTime::now(),
                turn,
                total_turns: context.total_turns(),
                worker_count: context.worker_count(),
                from_checkpoint,
                world_digest: world.digest(),
            }));
        }

        let driven = self.drive(&context);
        context.pause.close();
        let outcome = driven.and_then(|()| context.outcome());

        match &outcome {
            Ok(outcome) => self.event_handlers.fire_handlers(Event::FinishRun(FinishRunEvent {
                timestamp: SystemTime::now(),
                turn: outcome.turn,
                alive_count: outcome.alive_cells.len(),
            })),
            Err(error) => log::warn!("Run failed at turn {}: {:?}", context.turn(), error),
        }
        outcome
    }

    /// The turn loop. Returns when the run reaches its last turn or is stopped.
    fn drive(&self, context: &RunContext<N::Connection>) -> Result<(), BrokerError> {
        while !context.is_finished() {
            context.pause.wait_at_turn_boundary();
            if context.is_finished() {
                break;
            }

            if let Some(completed) = context.execute_turn(&self.display)? {
                self.event_handlers.fire_handlers(Event::CompleteTurn(CompleteTurnEvent {
                    timestamp: SystemTime::now(),
                    turn: completed.turn,
                    changed_cell_count: completed.changed_cell_count,
                }));
            }
        }

        Ok(())
    }

    /// The first `requested` configured addresses, or all of them if there are fewer.
    fn discover_workers(&self, requested: u32) -> Result<&[WorkerAddress], BrokerError> {
        let addresses = &self.configuration.worker_addresses;
        if addresses.is_empty() {
            return Err(BrokerError::NoWorkerAddresses);
        }
        if addresses.len() < requested as usize {
            log::warn!(
                "Expected {} workers but only {} addresses are configured; running on {}",
                requested,
                addresses.len(),
                addresses.len()
            );
        }

        Ok(&addresses[..addresses.len().min(requested as usize)])
    }

    fn current_run(&self) -> Result<Arc<RunContext<N::Connection>>, BrokerError> {
        lock(&self.current).clone().ok_or(BrokerError::NoActiveRun)
    }

    /// Completed turn of the latest run, and its number of alive cells.
    pub fn state(&self) -> Result<(Turn, u64), BrokerError> {
        self.current_run()?.alive_count()
    }

    pub fn world(&self) -> Result<(Grid, Turn), BrokerError> {
        self.current_run()?.world()
    }

    pub fn alive_cells(&self) -> Result<(Turn, Vec<Cell>), BrokerError> {
        self.current_run()?.alive_cells()
    }

    /// Stop the live run at the next turn boundary and return the turn it stopped after. Pausing a
    /// paused run returns the same turn again.
    pub fn pause(&self) -> Result<Turn, BrokerError> {
        let context = self.current_run()?;
        if !context.pause.pause() {
            return Err(BrokerError::NoActiveRun);
        }

        let turn = context.turn();
        self.event_handlers.fire_handlers(Event::Pause(PauseEvent {
            timestamp: SystemTime::now(),
            turn,
        }));
        Ok(turn)
    }

    /// Let a paused run continue. Resuming a run that is not paused has no effect.
    pub fn resume(&self) -> Result<(), BrokerError> {
        let context = self.current_run()?;
        if context.pause.resume() {
            self.event_handlers.fire_handlers(Event::Resume(ResumeEvent {
                timestamp: SystemTime::now(),
            }));
        }

        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.current)
            .as_ref()
            .map_or(false, |context| context.pause.is_paused())
    }

    /// Stop the latest run, checkpoint it at its last completed turn, and discard it. A blocked
    /// [`run`](Self::run) call returns the outcome as of that turn.
    ///
    /// An aborted run is discarded without a checkpoint, and the previous checkpoint is kept.
    pub fn reset(&self) -> Result<Turn, BrokerError> {
        let context = self.current_run()?;
        context.stop();

        let (world, turn) = match context.world() {
            Ok(gathered) => gathered,
            Err(error) => {
                if context.is_aborted() {
                    self.discard(&context);
                }
                return Err(error);
            }
        };
        let world_digest = world.digest();
        *lock(&self.checkpoint) = Some(Checkpoint {
            turn,
            world,
            worker_count: context.worker_count(),
        });
        self.discard(&context);

        self.event_handlers.fire_handlers(Event::Reset(ResetEvent {
            timestamp: SystemTime::now(),
            turn,
            world_digest,
        }));
        Ok(turn)
    }

    // Forget `context` unless a newer run has already replaced it.
    fn discard(&self, context: &Arc<RunContext<N::Connection>>) {
        let mut current = lock(&self.current);
        if current.as_ref().map_or(false, |latest| Arc::ptr_eq(latest, context)) {
            *current = None;
        }
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        lock(&self.checkpoint).clone()
    }

    /// Stop the latest run and tell every configured worker to shut down. Workers that cannot be
    /// reached are skipped.
    pub fn shut_down(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        if let Some(context) = lock(&self.current).take() {
            context.stop();
        }

        for address in &self.configuration.worker_addresses {
            let result = self
                .network
                .connect(address)
                .and_then(|connection| connection.call(WorkerRequest::ShutDownWorker));
            if let Err(error) = result {
                log::debug!("Could not shut down worker {}: {:?}", address, error);
            }
        }

        self.event_handlers.fire_handlers(Event::ShutDown(ShutDownEvent {
            timestamp: SystemTime::now(),
        }));
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

// Clears the run-active flag when `run` returns, however it returns.
struct ActiveRun<'a>(&'a AtomicBool);

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
