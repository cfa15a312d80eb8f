/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gol_halo::{
    broker::{RunOutcome, RunRequest},
    logging::{first_seven_base64_chars, level_filter, setup_terminal_logger},
    networking::tcp::{ClientError, TcpBrokerClient},
    types::grid::Grid,
};

#[derive(Parser)]
#[command(name = "gol-client", about = "Submit Game of Life runs to a broker and control them")]
struct Args {
    /// Address of the broker.
    #[arg(long, default_value = "127.0.0.1:8060")]
    broker: String,

    /// Log more; repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a random soup and print the outcome.
    Run {
        #[arg(long, default_value_t = 64)]
        width: u32,
        #[arg(long, default_value_t = 64)]
        height: u32,
        /// Probability that a cell starts alive.
        #[arg(long, default_value_t = 0.25)]
        density: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        turns: u64,
        #[arg(long, default_value_t = 4)]
        workers: u32,
        /// Seconds between progress reports while the run is in progress. 0 disables them.
        #[arg(long, default_value_t = 2)]
        ticker: u64,
    },
    /// Continue the broker's last reset run up to `turns`.
    Continue {
        #[arg(long)]
        turns: u64,
        #[arg(long, default_value_t = 2)]
        ticker: u64,
    },
    /// Print the completed turn and alive cell count of the latest run.
    State,
    /// Print the world of the latest run.
    World,
    Pause,
    Resume,
    Reset,
    /// Shut down the broker and its workers.
    ShutDown,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = setup_terminal_logger(level_filter(args.verbose)) {
        eprintln!("Could not set up logging: {}", error);
    }

    match execute(&args.broker, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{:?}", error);
            ExitCode::FAILURE
        }
    }
}

fn execute(broker: &str, command: Command) -> Result<(), ClientError> {
    let mut client = TcpBrokerClient::connect(broker)?;
    match command {
        Command::Run {
            width,
            height,
            density,
            seed,
            turns,
            workers,
            ticker,
        } => {
            let world = Grid::random(width, height, density, seed);
            println!(
                "Running {}x{} soup {} with {} alive cells",
                width,
                height,
                first_seven_base64_chars(&world.digest()),
                world.alive_count()
            );
            let outcome = with_ticker(broker, ticker, || client.run(RunRequest::fresh(world, turns, workers)))?;
            print_outcome(&outcome);
        }
        Command::Continue { turns, ticker } => {
            let outcome = with_ticker(broker, ticker, || client.run(RunRequest::continue_from_checkpoint(turns)))?;
            print_outcome(&outcome);
        }
        Command::State => {
            let (turn, alive_count) = client.state()?;
            println!("Completed turns: {}, alive cells: {}", turn, alive_count);
        }
        Command::World => {
            let (world, turn) = client.world()?;
            println!("Turn {}", turn);
            print_world(&world);
        }
        Command::Pause => println!("Paused after turn {}", client.pause()?),
        Command::Resume => {
            client.resume()?;
            println!("Resumed");
        }
        Command::Reset => {
            client.reset()?;
            println!("Reset; the run can be continued");
        }
        Command::ShutDown => {
            client.shut_down()?;
            println!("Shut down");
        }
    }

    Ok(())
}

/// Call `run` while a second connection to the broker reports its progress every `interval_secs`.
fn with_ticker<T>(
    broker: &str,
    interval_secs: u64,
    run: impl FnOnce() -> Result<T, ClientError>,
) -> Result<T, ClientError> {
    if interval_secs == 0 {
        return run();
    }

    let mut ticker_client = TcpBrokerClient::connect(broker)?;
    let (stop, stopped) = mpsc::channel::<()>();
    let ticker = thread::spawn(move || loop {
        match stopped.recv_timeout(Duration::from_secs(interval_secs)) {
            Err(RecvTimeoutError::Timeout) => match ticker_client.state() {
                Ok((turn, alive_count)) => println!("Completed turns: {}, alive cells: {}", turn, alive_count),
                Err(error) => log::debug!("Progress report failed: {:?}", error),
            },
            _ => return,
        }
    });

    let result = run();
    drop(stop);
    let _ = ticker.join();
    result
}

fn print_outcome(outcome: &RunOutcome) {
    println!(
        "Finished at turn {} with {} alive cells (world {})",
        outcome.turn,
        outcome.alive_cells.len(),
        first_seven_base64_chars(&outcome.world.digest())
    );
}

fn print_world(world: &Grid) {
    for row in world.rows() {
        let line: String = row.iter().map(|&alive| if alive { '#' } else { '.' }).collect();
        println!("{}", line);
    }
}
