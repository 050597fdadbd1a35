use super::RoutingPolicy;
use crate::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed interval `[low, high]` from which scan durations are drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanInterval {
    /// Shortest possible scan.
    pub low: f64,
    /// Longest possible scan.
    pub high: f64,
}

impl ScanInterval {
    /// The interval `[low, high]`. Checked by [`CheckpointConfig::validate()`], not here.
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// A degenerate interval: every scan takes exactly `duration`.
    pub fn fixed(duration: f64) -> Self {
        Self::new(duration, duration)
    }
}

/// Everything needed to build and replicate a checkpoint simulation.
///
/// Durations and the stop time share one unit (minutes in the defaults); the arrival rate is passengers per that
/// unit. [`Default`] reproduces a busy airport: 35 checkers, 35 scanners, 50 arrivals per minute over a 12 hour day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CheckpointConfig {
    /// Identical ID/boarding-pass checkers sharing one queue.
    pub checkers: usize,
    /// Personal scanners, each with its own queue.
    pub scanners: usize,
    /// Mean of the exponentially distributed check duration.
    pub mean_check_duration: f64,
    /// Interval the uniformly distributed scan duration is drawn from.
    pub scan_duration: ScanInterval,
    /// Mean arrivals per time unit of the Poisson arrival process.
    pub arrival_rate: f64,
    /// Virtual time at which each replication stops.
    pub stop_time: f64,
    /// Independent replications run by [`Replications`].
    ///
    /// [`Replications`]: crate::replication::Replications
    pub replications: usize,
    /// Master seed from which each replication's random stream is derived.
    pub seed: u64,
    /// How checked passengers pick a scanner.
    pub routing: RoutingPolicy,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            checkers: 35,
            scanners: 35,
            mean_check_duration: 0.75,
            scan_duration: ScanInterval::new(0.5, 1.0),
            arrival_rate: 50.0,
            stop_time: 720.0,
            replications: 20,
            seed: 123,
            routing: RoutingPolicy::ShortestQueue,
        }
    }
}

/// Builder-style setters. None of them validates; call [`CheckpointConfig::validate()`] once the config is complete.
impl CheckpointConfig {
    /// Set [`checkers`](Self::checkers).
    pub fn with_checkers(mut self, checkers: usize) -> Self {
        self.checkers = checkers;
        self
    }

    /// Set [`scanners`](Self::scanners).
    pub fn with_scanners(mut self, scanners: usize) -> Self {
        self.scanners = scanners;
        self
    }

    /// Set [`mean_check_duration`](Self::mean_check_duration).
    pub fn with_mean_check_duration(mut self, mean_check_duration: f64) -> Self {
        self.mean_check_duration = mean_check_duration;
        self
    }

    /// Set [`scan_duration`](Self::scan_duration).
    pub fn with_scan_duration(mut self, scan_duration: ScanInterval) -> Self {
        self.scan_duration = scan_duration;
        self
    }

    /// Set [`arrival_rate`](Self::arrival_rate).
    pub fn with_arrival_rate(mut self, arrival_rate: f64) -> Self {
        self.arrival_rate = arrival_rate;
        self
    }

    /// Set [`stop_time`](Self::stop_time).
    pub fn with_stop_time(mut self, stop_time: f64) -> Self {
        self.stop_time = stop_time;
        self
    }

    /// Set [`replications`](Self::replications).
    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    /// Set [`seed`](Self::seed).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set [`routing`](Self::routing).
    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }

    /// Check every value before anything is scheduled.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> crate::Result {
        if self.checkers == 0 {
            return Err(invalid("checkers must be at least 1"));
        }
        if self.scanners == 0 {
            return Err(invalid("scanners must be at least 1"));
        }
        positive("mean_check_duration", self.mean_check_duration)?;
        positive("arrival_rate", self.arrival_rate)?;
        positive("stop_time", self.stop_time)?;

        let ScanInterval { low, high } = self.scan_duration;
        if !low.is_finite() || low < 0.0 {
            return Err(invalid(format!("scan_duration.low must be finite and non-negative, got {low}")));
        }
        if !high.is_finite() || high < low {
            return Err(invalid(format!(
                "scan_duration.high must be finite and at least {low}, got {high}"
            )));
        }

        if self.replications == 0 {
            return Err(invalid("replications must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfiguration(message.into())
}

fn positive(field: &str, value: f64) -> crate::Result {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be finite and positive, got {value}")))
    }
}
