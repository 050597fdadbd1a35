//! Independent replications of the checkpoint model.
//!
//! Every replication owns its own [`Simulation`], model state and random stream, so nothing is shared between them
//! and, with the default `parallel` feature, they run concurrently on the `rayon` thread pool. Each replication's
//! stream is derived from the master seed and the replication index alone, which makes a report independent of
//! thread scheduling.
//!
//! [`Simulation`]: crate::engine::Simulation

use crate::checkpoint::{self, CheckpointConfig, RunAverages, RunStatistics};
use crate::variates::{RandomVariates, VariateSource};
use crate::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

/// Run one replication to `config.stop_time` and return what it measured.
///
/// # Errors
///
/// [`Error::InvalidConfiguration`] for an invalid `config`, or any error raised by the model during the run.
pub fn run_replication<Variates>(config: &CheckpointConfig, variates: Variates) -> crate::Result<RunStatistics>
where
    Variates: VariateSource + 'static,
{
    let mut simulation = checkpoint::build(config, variates)?;
    simulation.run_until(checkpoint::duration(config.stop_time)?)?;
    Ok(simulation.into_state().into_statistics())
}

/// Runs `config.replications` seeded replications of one configuration.
#[derive(Debug, Clone)]
pub struct Replications {
    config: CheckpointConfig,
}

impl Replications {
    /// Prepare to replicate `config`. Nothing is validated or run until [`run()`](Self::run).
    pub fn new(config: CheckpointConfig) -> Self {
        Self { config }
    }

    /// The configuration every replication shares.
    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    /// Run every replication and collect their averages.
    ///
    /// A replication in which no passenger finished is kept in the report as [`Error::NoPassengersProcessed`] and left
    /// out of the mean.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] before anything runs, or the first other error any replication raises.
    pub fn run(&self) -> crate::Result<ReplicationReport> {
        self.config.validate()?;

        #[cfg(feature = "parallel")]
        let runs = (0..self.config.replications)
            .into_par_iter()
            .map(|index| self.run_one(index))
            .collect::<crate::Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let runs = (0..self.config.replications)
            .map(|index| self.run_one(index))
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(ReplicationReport { runs })
    }

    /// Outer error aborts the experiment; inner error marks a degenerate replication.
    fn run_one(&self, index: usize) -> crate::Result<crate::Result<RunAverages>> {
        info!(replication = index, "replication started");
        let variates = RandomVariates::for_replication(self.config.seed, index);
        let statistics = run_replication(&self.config, variates)?;

        match statistics.averages() {
            Ok(averages) => {
                info!(
                    replication = index,
                    arrivals = statistics.arrivals(),
                    processed = statistics.processed(),
                    total_wait = averages.total_wait,
                    "replication finished"
                );
                Ok(Ok(averages))
            },
            Err(Error::NoPassengersProcessed) => {
                warn!(
                    replication = index,
                    arrivals = statistics.arrivals(),
                    "no passenger finished; replication excluded from the mean"
                );
                Ok(Err(Error::NoPassengersProcessed))
            },
            Err(error) => Err(error),
        }
    }
}

/// Outcome of a set of replications, in replication-index order.
#[derive(Debug, PartialEq)]
pub struct ReplicationReport {
    runs: Vec<crate::Result<RunAverages>>,
}

impl ReplicationReport {
    /// Per-replication averages, or [`Error::NoPassengersProcessed`] for degenerate replications.
    pub fn runs(&self) -> &[crate::Result<RunAverages>] {
        &self.runs
    }

    /// Averages of the replications in which at least one passenger finished.
    pub fn completed(&self) -> impl Iterator<Item = &RunAverages> {
        self.runs.iter().filter_map(|run| run.as_ref().ok())
    }

    /// Number of replications in which no passenger finished.
    pub fn degenerate_count(&self) -> usize {
        self.runs.iter().filter(|run| run.is_err()).count()
    }

    /// Mean of each average across non-degenerate replications.
    ///
    /// # Errors
    ///
    /// [`Error::NoPassengersProcessed`] if every replication was degenerate.
    pub fn mean(&self) -> crate::Result<RunAverages> {
        RunAverages::mean(self.completed()).ok_or(Error::NoPassengersProcessed)
    }
}
