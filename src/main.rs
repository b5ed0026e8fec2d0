mod aggregate;
mod client;
mod data;
mod error;
mod export;
mod render;
mod request;
mod server;
mod state;

use clap::Parser;
use client::SolverClient;
use log::error;
use state::AppState;
use std::path::PathBuf;
use std::process::ExitCode;

/// Web console for submitting timetable requests to a solver and reviewing
/// the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to serve the console on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Base URL of the timetable solver API; requests go to <URL>/solve
    #[arg(long, default_value = "http://localhost:8080/api/timetable")]
    solver_url: String,

    /// Request file used to pre-fill the input. Without it, request.json is
    /// looked up in a few relative locations.
    #[arg(long)]
    request_file: Option<PathBuf>,

    /// Weekly teacher cap used when a request does not specify one
    #[arg(
        long,
        default_value_t = aggregate::DEFAULT_TEACHER_CAP,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    teacher_cap: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let initial = request::load_initial(args.request_file.as_deref());
    let state = AppState::new(SolverClient::new(args.solver_url), initial, args.teacher_cap);

    match server::run_server(&args.bind, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
