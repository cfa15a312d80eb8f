/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The broker: partitions a world across workers and drives them through the turn barrier.
//!
//! ## Starting a broker
//!
//! ```ignore
//! let broker = BrokerDefinition::builder()
//!     .network(network)
//!     .display(NoDisplay)
//!     .configuration(
//!         Configuration::builder()
//!             .worker_addresses(addresses)
//!             .log_events(true)
//!             .build()
//!     )
//!     .on_complete_turn(|event| println!("turn {} done", event.turn))
//!     .build()
//!     .start();
//!
//! let outcome = broker.run(RunRequest::fresh(world, 100, 4))?;
//! ```
//!
//! ## Lifecycle of a run
//!
//! [`Broker::run`] blocks until the run ends. While it blocks, other threads may [pause](Broker::pause),
//! [resume](Broker::resume), [query](Broker::state), or [reset](Broker::reset) it. A reset stores a
//! [`Checkpoint`] from which a later run with [`InitialState::Continue`] picks up, on fresh
//! connections.

mod checkpoint;
pub use checkpoint::Checkpoint;

mod errors;
pub use errors::{BrokerError, BrokerFailure, FailureKind, InvariantViolation, RunRequestError};

mod fan_out;

mod pause;

mod run;
pub use run::{InitialState, RunOutcome, RunRequest};

mod run_context;

mod service;
pub use service::{Broker, BrokerDefinition};

use std::sync::{Mutex, MutexGuard, PoisonError};

// A poisoned lock means a handler panicked mid-event; the guarded state is still consistent, since
// it is only written in single assignments.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
