use super::VirtualTime;
use crate::variates::VariateSource;
use crate::SimState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Model state of one checkpoint replication: the variate stream its processes draw from and the statistics they
/// accumulate.
#[derive(Debug)]
pub struct CheckpointState<Variates> {
    pub(crate) variates: Variates,
    pub(crate) statistics: RunStatistics,
}

impl<Variates> CheckpointState<Variates>
where
    Variates: VariateSource,
{
    /// Fresh state drawing from `variates`, with empty statistics for `scanners` scanners.
    pub fn new(variates: Variates, scanners: usize) -> Self {
        Self {
            variates,
            statistics: RunStatistics::new(scanners),
        }
    }

    /// What the run has measured so far.
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// The variate source processes draw from.
    pub fn variates(&self) -> &Variates {
        &self.variates
    }

    /// Drop the variate source and keep the statistics.
    pub fn into_statistics(self) -> RunStatistics {
        self.statistics
    }
}

impl<Variates> SimState<VirtualTime> for CheckpointState<Variates> {}

/// Accumulated results of one replication. Only passengers who made it all the way through are counted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStatistics {
    arrivals: u64,
    processed: u64,
    check_wait: f64,
    scan_wait: f64,
    served_per_scanner: Vec<u64>,
}

impl RunStatistics {
    /// Empty statistics for a checkpoint with `scanners` scanners.
    pub fn new(scanners: usize) -> Self {
        Self {
            served_per_scanner: vec![0; scanners],
            ..Self::default()
        }
    }

    pub(crate) fn record_arrival(&mut self) {
        self.arrivals += 1;
    }

    pub(crate) fn record_departure(&mut self, check_wait: f64, scan_wait: f64, scanner: usize) {
        self.processed += 1;
        self.check_wait += check_wait;
        self.scan_wait += scan_wait;
        if let Some(served) = self.served_per_scanner.get_mut(scanner) {
            *served += 1;
        }
    }

    /// Passengers who entered the checkpoint.
    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    /// Passengers who finished scanning before the run ended.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Passengers still inside the checkpoint when the run ended.
    pub fn in_system(&self) -> u64 {
        self.arrivals.saturating_sub(self.processed)
    }

    /// Sum of check-queue waits over processed passengers.
    pub fn total_check_wait(&self) -> f64 {
        self.check_wait
    }

    /// Sum of scanner-queue waits over processed passengers.
    pub fn total_scan_wait(&self) -> f64 {
        self.scan_wait
    }

    /// Sum of both waits over processed passengers.
    pub fn total_wait(&self) -> f64 {
        self.check_wait + self.scan_wait
    }

    /// Processed passengers per scanner, by scanner index.
    pub fn served_per_scanner(&self) -> &[u64] {
        &self.served_per_scanner
    }

    /// Per-passenger averages.
    ///
    /// # Errors
    ///
    /// [`Error::NoPassengersProcessed`] if nobody finished, so that a degenerate run is never mistaken for one without
    /// any waiting.
    ///
    /// [`Error::NoPassengersProcessed`]: crate::Error::NoPassengersProcessed
    pub fn averages(&self) -> crate::Result<RunAverages> {
        if self.processed == 0 {
            return Err(crate::Error::NoPassengersProcessed);
        }

        let processed = self.processed as f64;
        Ok(RunAverages {
            total_wait: self.total_wait() / processed,
            check_wait: self.check_wait / processed,
            scan_wait: self.scan_wait / processed,
        })
    }
}

/// Average waits per processed passenger.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunAverages {
    /// Check wait plus scan wait.
    pub total_wait: f64,
    /// Time between arriving and reaching a checker.
    pub check_wait: f64,
    /// Time between leaving the checker and reaching a scanner.
    pub scan_wait: f64,
}

impl RunAverages {
    /// Arithmetic mean of each field, or `None` if `runs` is empty.
    pub fn mean<'a, Runs>(runs: Runs) -> Option<Self>
    where
        Runs: IntoIterator<Item = &'a RunAverages>,
    {
        let mut count = 0usize;
        let mut sum = RunAverages {
            total_wait: 0.0,
            check_wait: 0.0,
            scan_wait: 0.0,
        };
        for run in runs {
            count += 1;
            sum.total_wait += run.total_wait;
            sum.check_wait += run.check_wait;
            sum.scan_wait += run.scan_wait;
        }

        if count == 0 {
            return None;
        }
        let count = count as f64;
        Some(RunAverages {
            total_wait: sum.total_wait / count,
            check_wait: sum.check_wait / count,
            scan_wait: sum.scan_wait / count,
        })
    }
}
