/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the broker's
//! [configuration](crate::config::Configuration).
//!
//! gol_halo logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how a [StartRun](crate::events::StartRunEvent) is printed:
//!
//! ```text
//! StartRun, 1701329264, 0, 1000, 4, false, fNGCJyk
//! ```
//!
//! In the snippet:
//! - The third and fourth values are the turn the run starts at and the turn it runs up to.
//! - The fifth value is the number of workers.
//! - The sixth value is whether the run was continued from a checkpoint.
//! - The seventh value is the first seven characters of the Base64 encoding of the world's digest.

use std::{io, thread, time::SystemTime};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::event_handlers::HandlerPtr;
use crate::events::*;

// Names of each event in PascalCase for printing:
pub const START_RUN: &str = "StartRun";
pub const COMPLETE_TURN: &str = "CompleteTurn";
pub const PAUSE: &str = "Pause";
pub const RESUME: &str = "Resume";
pub const RESET: &str = "Reset";
pub const FINISH_RUN: &str = "FinishRun";
pub const SHUT_DOWN: &str = "ShutDown";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> HandlerPtr<Self>;
}

impl Logger for StartRunEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |start_run_event: &StartRunEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}, {}",
                START_RUN,
                secs_since_unix_epoch(start_run_event.timestamp),
                start_run_event.turn,
                start_run_event.total_turns,
                start_run_event.worker_count,
                start_run_event.from_checkpoint,
                first_seven_base64_chars(&start_run_event.world_digest)
            )
        };
        Box::new(logger)
    }
}

impl Logger for CompleteTurnEvent {
    fn get_logger() -> HandlerPtr<Self> {
        // One line per turn is too chatty for info.
        let logger = |complete_turn_event: &CompleteTurnEvent| {
            log::debug!(
                "{}, {}, {}, {}",
                COMPLETE_TURN,
                secs_since_unix_epoch(complete_turn_event.timestamp),
                complete_turn_event.turn,
                complete_turn_event.changed_cell_count
            )
        };
        Box::new(logger)
    }
}

impl Logger for PauseEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |pause_event: &PauseEvent| {
            log::info!(
                "{}, {}, {}",
                PAUSE,
                secs_since_unix_epoch(pause_event.timestamp),
                pause_event.turn
            )
        };
        Box::new(logger)
    }
}

impl Logger for ResumeEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |resume_event: &ResumeEvent| {
            log::info!("{}, {}", RESUME, secs_since_unix_epoch(resume_event.timestamp))
        };
        Box::new(logger)
    }
}

impl Logger for ResetEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |reset_event: &ResetEvent| {
            log::info!(
                "{}, {}, {}, {}",
                RESET,
                secs_since_unix_epoch(reset_event.timestamp),
                reset_event.turn,
                first_seven_base64_chars(&reset_event.world_digest)
            )
        };
        Box::new(logger)
    }
}

impl Logger for FinishRunEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |finish_run_event: &FinishRunEvent| {
            log::info!(
                "{}, {}, {}, {}",
                FINISH_RUN,
                secs_since_unix_epoch(finish_run_event.timestamp),
                finish_run_event.turn,
                finish_run_event.alive_count
            )
        };
        Box::new(logger)
    }
}

impl Logger for ShutDownEvent {
    fn get_logger() -> HandlerPtr<Self> {
        let logger = |shut_down_event: &ShutDownEvent| {
            log::info!("{}, {}", SHUT_DOWN, secs_since_unix_epoch(shut_down_event.timestamp))
        };
        Box::new(logger)
    }
}

/// Print every log message at `level` or above to standard error, prefixed with the emitting thread
/// and the level. Used by the binaries; embedders bring their own logger.
pub fn setup_terminal_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:?}][{}] {}",
                thread::current().id(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
}

/// Map a count of `-v` flags to a level: info, then debug, then trace.
pub fn level_filter(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

pub fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

/// Clock skew can put a timestamp before the epoch; such timestamps are printed as 0.
fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
