/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gol_halo::{
    broker::BrokerDefinition,
    config::{read_worker_addresses, Configuration},
    logging::{level_filter, setup_terminal_logger},
    networking::tcp::{serve_broker, TcpDisplay, TcpNetwork},
};

#[derive(Parser)]
#[command(name = "gol-broker", about = "Coordinate Game of Life workers through the turn barrier")]
struct Args {
    /// Address to listen on for clients.
    #[arg(long, default_value = "0.0.0.0:8060")]
    listen: String,

    /// File listing worker addresses, one per line.
    #[arg(long, default_value = "IP")]
    workers: PathBuf,

    /// Address of a display server to send the changed cells of every turn to.
    #[arg(long)]
    display: Option<String>,

    /// Print broker events as CSV log lines.
    #[arg(long)]
    log_events: bool,

    /// Log more; repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = setup_terminal_logger(level_filter(args.verbose)) {
        eprintln!("Could not set up logging: {}", error);
    }

    let worker_addresses = match read_worker_addresses(&args.workers) {
        Ok(addresses) => addresses,
        Err(error) => {
            log::error!("Could not read worker addresses from {}: {:?}", args.workers.display(), error);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Read {} worker addresses", worker_addresses.len());

    let listener = match TcpListener::bind(&args.listen) {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("Could not listen on {}: {}", args.listen, error);
            return ExitCode::FAILURE;
        }
    };

    let broker = BrokerDefinition::builder()
        .network(TcpNetwork)
        .display(args.display.map(TcpDisplay::new))
        .configuration(
            Configuration::builder()
                .worker_addresses(worker_addresses)
                .log_events(args.log_events)
                .build(),
        )
        .build()
        .start();
    log::info!("Broker listening on {}", args.listen);

    match serve_broker(listener, Arc::new(broker)) {
        Ok(()) => {
            log::info!("Broker shut down");
            ExitCode::SUCCESS
        }
        Err(error) => {
            log::error!("Broker stopped: {}", error);
            ExitCode::FAILURE
        }
    }
}
