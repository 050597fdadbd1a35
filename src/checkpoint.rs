//! The airport security checkpoint model.
//!
//! Passengers arrive as a Poisson process, queue for one of a pool of identical ID/boarding-pass checkers sharing a
//! single line, then walk to the personal scanner with the shortest line and queue there. The quantity of interest is
//! how long passengers spend waiting in those two lines.
//!
//! [`build()`] turns a [`CheckpointConfig`] into a ready-to-run [`Simulation`] on [`VirtualTime`], with one checker
//! resource, one resource per scanner and an [`ArrivalGenerator`] already spawned.

mod arrivals;
mod config;
mod passenger;
mod routing;
mod state;

pub use arrivals::ArrivalGenerator;
pub use config::{CheckpointConfig, ScanInterval};
pub use passenger::{Passenger, Stage};
pub use routing::RoutingPolicy;
pub use state::{CheckpointState, RunAverages, RunStatistics};

use crate::engine::{ResourceId, Simulation};
use crate::variates::VariateSource;
use crate::Error;

use ordered_float::NotNan;
use std::rc::Rc;
use tracing::debug;

/// The clock of the checkpoint model. Any unit works as long as durations, rates and the stop time agree.
pub type VirtualTime = NotNan<f64>;

/// Resource handles and service parameters shared by every process of one replication.
#[derive(Debug)]
pub struct CheckpointLayout {
    /// The checker pool, one resource with one unit per checker.
    pub checkers: ResourceId,
    /// One resource per scanner, in scanner-index order.
    pub scanners: Vec<ResourceId>,
    /// Mean of the exponential check duration.
    pub mean_check_duration: f64,
    /// Interval the uniform scan duration is drawn from.
    pub scan_duration: ScanInterval,
    /// Mean arrivals per time unit.
    pub arrival_rate: f64,
    /// How a checked passenger picks a scanner.
    pub routing: RoutingPolicy,
}

/// Convert a sampled duration to clock time.
///
/// # Errors
///
/// [`Error::BadExecution`] if `value` is NaN, which is how a [`VariateSource`] reports invalid parameters.
pub(crate) fn duration(value: f64) -> crate::Result<VirtualTime> {
    NotNan::new(value).map_err(Error::execution)
}

/// Assemble a replication: validate `config`, create the resources and start the arrival generator at time zero.
///
/// The returned simulation has not dispatched anything yet beyond the generator's first step, which records the first
/// arrival and schedules the second.
///
/// # Errors
///
/// [`Error::InvalidConfiguration`] for a config that fails [`CheckpointConfig::validate()`], or anything raised while
/// spawning the generator.
pub fn build<Variates>(
    config: &CheckpointConfig,
    variates: Variates,
) -> crate::Result<Simulation<CheckpointState<Variates>, VirtualTime>>
where
    Variates: VariateSource + 'static,
{
    config.validate()?;

    let state = CheckpointState::new(variates, config.scanners);
    let mut simulation = Simulation::new(state, duration(0.0)?);

    let checkers = simulation.add_resource(config.checkers)?;
    let scanners = (0..config.scanners)
        .map(|_| simulation.add_resource(1))
        .collect::<crate::Result<Vec<_>>>()?;
    debug!(checkers = config.checkers, scanners = scanners.len(), "checkpoint resources created");

    let layout = Rc::new(CheckpointLayout {
        checkers,
        scanners,
        mean_check_duration: config.mean_check_duration,
        scan_duration: config.scan_duration,
        arrival_rate: config.arrival_rate,
        routing: config.routing,
    });
    simulation.spawn(ArrivalGenerator::new(layout))?;
    Ok(simulation)
}
