/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::sync::Once;

use gol_halo::logging::setup_terminal_logger;
use log::LevelFilter;

static LOGGER_INIT: Once = Once::new();

// Install the crate's terminal logger once per test binary, whichever test gets there first.
pub(crate) fn setup_logger(level: LevelFilter) {
    LOGGER_INIT.call_once(|| {
        if let Err(error) = setup_terminal_logger(level) {
            eprintln!("Could not set up logging: {}", error);
        }
    })
}
