use crate::engine::ProcessId;
use crate::SimTime;
use std::cmp::Ordering;

/// Helper struct for the event queue. Holds the process to resume alongside the data necessary to sort wake-ups
/// within the priority queue, namely the execution time and a record of the wake-up's insertion sequence.
///
/// The implementation of [`Ord`] on this struct cares first about the execution time, comparing the insertion
/// sequences only to break ties.
#[derive(Debug)]
pub(super) struct WakeUp<Time>
where
    Time: SimTime,
{
    pub execution_time: Time,
    pub process: ProcessId,
    pub insertion_sequence: u64,
}

impl<Time> PartialEq<Self> for WakeUp<Time>
where
    Time: SimTime,
{
    fn eq(&self, other: &Self) -> bool {
        self.insertion_sequence == other.insertion_sequence && self.execution_time == other.execution_time
    }
}

impl<Time> Eq for WakeUp<Time> where Time: SimTime {}

impl<Time> PartialOrd<Self> for WakeUp<Time>
where
    Time: SimTime,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Time> Ord for WakeUp<Time>
where
    Time: SimTime,
{
    fn cmp(&self, other: &Self) -> Ordering {
        let comparison = self.execution_time.cmp(&other.execution_time);
        match comparison {
            Ordering::Equal => self.insertion_sequence.cmp(&other.insertion_sequence),
            _ => comparison,
        }
    }
}
