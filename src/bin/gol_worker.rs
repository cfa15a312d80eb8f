/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::net::TcpListener;
use std::process::ExitCode;

use clap::Parser;
use gol_halo::{
    logging::{level_filter, setup_terminal_logger},
    networking::tcp::serve_worker,
};

#[derive(Parser)]
#[command(name = "gol-worker", about = "Serve one Game of Life partition to a broker")]
struct Args {
    /// Address to listen on for the broker.
    #[arg(long, default_value = "0.0.0.0:8030")]
    listen: String,

    /// Log more; repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = setup_terminal_logger(level_filter(args.verbose)) {
        eprintln!("Could not set up logging: {}", error);
    }

    let listener = match TcpListener::bind(&args.listen) {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("Could not listen on {}: {}", args.listen, error);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Worker listening on {}", args.listen);

    match serve_worker(listener) {
        Ok(()) => {
            log::info!("Worker shut down");
            ExitCode::SUCCESS
        }
        Err(error) => {
            log::error!("Worker stopped: {}", error);
            ExitCode::FAILURE
        }
    }
}
