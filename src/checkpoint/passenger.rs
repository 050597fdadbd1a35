use super::{duration, CheckpointLayout, CheckpointState, VirtualTime};
use crate::engine::{Acquisition, Context, Process, Suspend, Wake};
use crate::variates::VariateSource;
use crate::Error;

use std::fmt::{Display, Formatter};
use std::rc::Rc;
use tracing::debug;

/// Where a passenger is in the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Spawned, not yet queued.
    Arrived,
    /// Queued for the checker pool.
    CheckWait,
    /// Holding a checker.
    Checking,
    /// Queued for the chosen scanner.
    ScanWait,
    /// Holding a scanner.
    Scanning,
    /// Left the checkpoint and counted in the statistics.
    Done,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Arrived => "arrived",
            Self::CheckWait => "waiting for a checker",
            Self::Checking => "at a checker",
            Self::ScanWait => "waiting for a scanner",
            Self::Scanning => "at a scanner",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// One passenger's trip through the checkpoint: queue for a checker, get checked, queue for the shortest scanner
/// line, get scanned, leave.
#[derive(Debug)]
pub struct Passenger {
    number: u64,
    layout: Rc<CheckpointLayout>,
    stage: Stage,
    arrive_time: VirtualTime,
    check_start: VirtualTime,
    check_complete: VirtualTime,
    scan_start: VirtualTime,
    scanner: usize,
    held: Option<Acquisition>,
}

impl Passenger {
    pub(crate) fn new(number: u64, layout: Rc<CheckpointLayout>, arrive_time: VirtualTime) -> Self {
        Self {
            number,
            layout,
            stage: Stage::Arrived,
            arrive_time,
            check_start: arrive_time,
            check_complete: arrive_time,
            scan_start: arrive_time,
            scanner: 0,
            held: None,
        }
    }

    fn enter(&mut self, stage: Stage, now: VirtualTime) {
        debug!(passenger = self.number, time = now.into_inner(), from = %self.stage, to = %stage, "passenger moved");
        self.stage = stage;
    }

    fn release_held<Variates>(&mut self, context: &mut Context<'_, CheckpointState<Variates>, VirtualTime>) -> crate::Result
    where
        Variates: VariateSource,
    {
        match self.held.take() {
            Some(acquisition) => context.release(acquisition),
            None => Err(Error::UnexpectedWake {
                process: context.id(),
                stage: self.stage.to_string(),
                wake: "timeout without a held resource".to_string(),
            }),
        }
    }
}

impl<Variates> Process<CheckpointState<Variates>, VirtualTime> for Passenger
where
    Variates: VariateSource,
{
    fn resume(
        &mut self,
        context: &mut Context<'_, CheckpointState<Variates>, VirtualTime>,
        wake: Wake,
    ) -> crate::Result<Suspend<VirtualTime>> {
        let now = *context.current_time();

        match (self.stage, wake) {
            (Stage::Arrived, Wake::Start) => {
                self.enter(Stage::CheckWait, now);
                Ok(Suspend::Request(self.layout.checkers))
            },
            (Stage::CheckWait, Wake::Acquired(acquisition)) => {
                self.check_start = now;
                self.held = Some(acquisition);
                self.enter(Stage::Checking, now);

                let check = context.state_mut().variates.exponential(self.layout.mean_check_duration);
                Ok(Suspend::Timeout(duration(check)?))
            },
            (Stage::Checking, Wake::Timeout) => {
                self.release_held(context)?;
                self.check_complete = now;

                let choice = self
                    .layout
                    .routing
                    .select(self.layout.scanners.iter().map(|scanner| context.resource(*scanner)))?;
                let Some(scanner) = choice else {
                    return Err(Error::InvalidConfiguration("checkpoint has no scanners".to_string()));
                };
                self.scanner = scanner;
                self.enter(Stage::ScanWait, now);
                Ok(Suspend::Request(self.layout.scanners[scanner]))
            },
            (Stage::ScanWait, Wake::Acquired(acquisition)) => {
                self.scan_start = now;
                self.held = Some(acquisition);
                self.enter(Stage::Scanning, now);

                let interval = self.layout.scan_duration;
                let scan = context.state_mut().variates.uniform(interval.low, interval.high);
                Ok(Suspend::Timeout(duration(scan)?))
            },
            (Stage::Scanning, Wake::Timeout) => {
                self.release_held(context)?;

                let check_wait = self.check_start.into_inner() - self.arrive_time.into_inner();
                let scan_wait = self.scan_start.into_inner() - self.check_complete.into_inner();
                context
                    .state_mut()
                    .statistics
                    .record_departure(check_wait, scan_wait, self.scanner);
                self.enter(Stage::Done, now);
                Ok(Suspend::Done)
            },
            (stage, wake) => Err(Error::UnexpectedWake {
                process: context.id(),
                stage: stage.to_string(),
                wake: wake.to_string(),
            }),
        }
    }
}
