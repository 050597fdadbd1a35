//! Replicate the airport checkpoint model and print the average waits.
//!
//! ```text
//! cargo run --release --example airport_checkpoint -- --checkers 35 --scanners 35
//! RUST_LOG=checkpoint_sim=info cargo run --example airport_checkpoint
//! ```

use anyhow::{Context, Result};
use checkpoint_sim::checkpoint::{CheckpointConfig, RoutingPolicy, ScanInterval};
use checkpoint_sim::replication::Replications;
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Parser)]
#[command(name = "airport_checkpoint")]
#[command(about = "Average passenger waits at an airport security checkpoint", long_about = None)]
struct Cli {
    /// ID/boarding-pass checkers sharing one line
    #[arg(long, default_value_t = 35)]
    checkers: usize,
    /// Personal scanners, each with its own line
    #[arg(long, default_value_t = 35)]
    scanners: usize,
    /// Mean check duration, in minutes
    #[arg(long, default_value_t = 0.75)]
    mean_check: f64,
    /// Shortest scan duration, in minutes
    #[arg(long, default_value_t = 0.5)]
    scan_min: f64,
    /// Longest scan duration, in minutes
    #[arg(long, default_value_t = 1.0)]
    scan_max: f64,
    /// Passengers arriving per minute
    #[arg(long, default_value_t = 50.0)]
    arrival_rate: f64,
    /// Minutes simulated per replication
    #[arg(long, default_value_t = 720.0)]
    stop_time: f64,
    #[arg(long, default_value_t = 20)]
    replications: usize,
    #[arg(long, default_value_t = 123)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = Routing::ShortestQueue)]
    routing: Routing,
}

#[derive(Clone, Copy, ValueEnum)]
enum Routing {
    ShortestQueue,
    LeastLoaded,
}

impl From<Routing> for RoutingPolicy {
    fn from(routing: Routing) -> Self {
        match routing {
            Routing::ShortestQueue => RoutingPolicy::ShortestQueue,
            Routing::LeastLoaded => RoutingPolicy::LeastLoaded,
        }
    }
}

impl From<Cli> for CheckpointConfig {
    fn from(cli: Cli) -> Self {
        CheckpointConfig::default()
            .with_checkers(cli.checkers)
            .with_scanners(cli.scanners)
            .with_mean_check_duration(cli.mean_check)
            .with_scan_duration(ScanInterval::new(cli.scan_min, cli.scan_max))
            .with_arrival_rate(cli.arrival_rate)
            .with_stop_time(cli.stop_time)
            .with_replications(cli.replications)
            .with_seed(cli.seed)
            .with_routing(cli.routing.into())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = CheckpointConfig::from(Cli::parse());
    info!(?config, "running replications");

    let report = Replications::new(config).run().context("simulation failed")?;
    if report.degenerate_count() > 0 {
        println!(
            "{} of {} replications processed no passengers and were left out",
            report.degenerate_count(),
            report.runs().len()
        );
    }

    let mean = report.mean().context("no replication processed any passenger")?;
    println!("Average total wait: {:.4}", mean.total_wait);
    println!("Average check wait: {:.4}", mean.check_wait);
    println!("Average scan wait: {:.4}", mean.scan_wait);
    Ok(())
}
