use super::{duration, CheckpointLayout, CheckpointState, Passenger, VirtualTime};
use crate::engine::{Context, Process, Suspend, Wake};
use crate::variates::VariateSource;
use crate::Error;

use std::rc::Rc;
use tracing::trace;

/// Creates passengers forever, with exponentially distributed gaps between consecutive arrivals.
///
/// Each step draws the gap to the next arrival, then spawns the arriving passenger (who immediately draws any durations
/// it needs), then sleeps for the gap. The first passenger arrives at time zero.
#[derive(Debug)]
pub struct ArrivalGenerator {
    layout: Rc<CheckpointLayout>,
    spawned: u64,
}

impl ArrivalGenerator {
    /// A generator feeding passengers into the checkpoint described by `layout`.
    pub fn new(layout: Rc<CheckpointLayout>) -> Self {
        Self { layout, spawned: 0 }
    }
}

impl<Variates> Process<CheckpointState<Variates>, VirtualTime> for ArrivalGenerator
where
    Variates: VariateSource,
{
    fn resume(
        &mut self,
        context: &mut Context<'_, CheckpointState<Variates>, VirtualTime>,
        wake: Wake,
    ) -> crate::Result<Suspend<VirtualTime>> {
        if let Wake::Acquired(_) = &wake {
            return Err(Error::UnexpectedWake {
                process: context.id(),
                stage: "generating arrivals".to_string(),
                wake: wake.to_string(),
            });
        }

        let now = *context.current_time();
        let gap = context.state_mut().variates.exponential(1.0 / self.layout.arrival_rate);
        let gap = duration(gap)?;

        self.spawned += 1;
        context.state_mut().statistics.record_arrival();
        let passenger = context.spawn(Passenger::new(self.spawned, Rc::clone(&self.layout), now))?;
        trace!(passenger = self.spawned, process = %passenger, time = now.into_inner(), "passenger arrived");

        Ok(Suspend::Timeout(gap))
    }
}
