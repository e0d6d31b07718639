use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gridcore::{api::decode_response, Algorithm, Config, Grid, RunResponse, Session, Speed};
use log::info;

/// Plays a recorded backend reply onto an empty grid and prints the result
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file holding `{"visited_order": [...], "path_indexes": [...]}`
    response: PathBuf,

    #[arg(long, default_value_t = 10)]
    rows: usize,

    #[arg(long, default_value_t = 10)]
    cols: usize,

    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Defaults to the last cell
    #[arg(long)]
    end: Option<usize>,

    #[arg(long, default_value = "dijkstra")]
    algorithm: Algorithm,

    #[arg(long, default_value = "fast")]
    speed: Speed,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let bytes = std::fs::read(&args.response)
        .with_context(|| format!("could not read {}", args.response.display()))?;
    let response: RunResponse = decode_response(200, &bytes)?;

    let end = args.end.unwrap_or((args.rows * args.cols).saturating_sub(1));
    let grid = Grid::new(args.rows, args.cols, args.start, end)?;

    let mut session = Session::from_grid(Config::default(), grid);
    session.set_algorithm(args.algorithm);
    session.set_speed(args.speed);

    session.play().context("session refused to start a run")?;
    session.finish_run(0, Ok(response));
    if let Some(e) = session.last_error() {
        anyhow::bail!("{}", e);
    }

    // step through the timeline the way a frontend would
    let mut frames = 0;
    while let Some(due) = session.next_due_ms() {
        session.tick(due);
        frames += 1;
    }
    info!("played {} frames", frames + 1);

    println!("{}", session.grid());
    if let Some(stats) = session.stats() {
        println!(
            "{}: visited {} of {} open cells ({:.1}%), path length {}, complexity {}",
            stats.algorithm,
            stats.visited,
            stats.non_walls,
            stats.visited_percentage(),
            stats.path_length,
            stats.algorithm.complexity()
        );
    }

    Ok(())
}
