mod event_holder;

use crate::engine::ProcessId;
use crate::SimTime;
use event_holder::WakeUp;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::Add;

/// Priority queue of scheduled wake-ups, together with the simulation clock.
///
/// Wake-ups execute in ascending order of execution time, with ties broken by the order in which they were pushed onto
/// the queue. This tiebreaker is in addition to any built-in to the implementation of [`SimTime`] used for the clock
/// as a way to stabilize the observed order of execution: two processes that yield timeouts due at the same instant
/// resume in the order they yielded them.
///
/// Pushing and popping are both O(log n) as the queue is backed by a [`BinaryHeap`].
///
/// An [`EventQueue`] is read-only outside of the kernel. Processes schedule themselves by returning
/// [`Suspend::Timeout`] from [`Process::resume()`], and only [`Simulation::run_until()`] pops from the queue.
///
/// # Errors
///
/// Attempting to schedule a wake-up for a time that is already past results in an [`Error::BackInTime`] without
/// modifying the queue. Should the heap ever hand back a wake-up that is earlier than the clock, the pop fails with
/// [`Error::OutOfOrder`]. Both indicate a logical error, as the clock in a discrete-event simulation never rewinds.
///
/// [`Suspend::Timeout`]: crate::engine::Suspend::Timeout
/// [`Process::resume()`]: crate::engine::Process::resume
/// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
/// [`Error::BackInTime`]: crate::Error::BackInTime
/// [`Error::OutOfOrder`]: crate::Error::OutOfOrder
#[derive(Debug, Default)]
pub struct EventQueue<Time>
where
    Time: SimTime,
{
    events: BinaryHeap<Reverse<WakeUp<Time>>>,
    last_execution_time: Time,
    events_added: u64,
}

impl<Time> EventQueue<Time>
where
    Time: SimTime,
{
    /// Construct a new [`EventQueue`] with no scheduled wake-ups and a clock initialized to the provided time.
    pub(crate) fn new(start_time: Time) -> Self {
        Self {
            events: BinaryHeap::default(),
            last_execution_time: start_time,
            events_added: 0,
        }
    }

    /// Schedule `process` to wake at the specified time.
    ///
    /// # Errors
    ///
    /// If `time` is less than the current clock time, returns an [`Error::BackInTime`] with no modifications to the
    /// queue.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub(crate) fn schedule(&mut self, process: ProcessId, time: Time) -> crate::Result {
        if time < self.last_execution_time {
            return Err(crate::Error::BackInTime);
        }

        let insertion_sequence = self.increment_event_count();
        self.events.push(Reverse(WakeUp {
            execution_time: time,
            process,
            insertion_sequence,
        }));
        Ok(())
    }

    /// Helper function to make sure incrementing the internal count of added wake-ups occurs the same way across all
    /// scheduling methods.
    fn increment_event_count(&mut self) -> u64 {
        let count = self.events_added;
        self.events_added += 1;
        count
    }

    /// Pop the next wake-up if it is due no later than `stop_time` (or unconditionally when `stop_time` is `None`),
    /// advancing the clock to its execution time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfOrder`] if the popped wake-up is due before the current clock time.
    ///
    /// [`Error::OutOfOrder`]: crate::Error::OutOfOrder
    pub(crate) fn next_due_by(&mut self, stop_time: Option<&Time>) -> crate::Result<Option<ProcessId>> {
        match (self.events.peek(), stop_time) {
            (None, _) => return Ok(None),
            (Some(Reverse(wake_up)), Some(stop_time)) if wake_up.execution_time > *stop_time => return Ok(None),
            _ => {},
        }

        let Some(Reverse(wake_up)) = self.events.pop() else {
            return Ok(None);
        };
        if wake_up.execution_time < self.last_execution_time {
            return Err(crate::Error::OutOfOrder);
        }

        self.last_execution_time = wake_up.execution_time;
        Ok(Some(wake_up.process))
    }

    /// Move the clock forward to `time` without dispatching anything. Earlier times are ignored.
    pub(crate) fn advance_to(&mut self, time: Time) {
        if time > self.last_execution_time {
            self.last_execution_time = time;
        }
    }

    /// Get a shared reference to the simulation's current clock time.
    pub fn current_time(&self) -> &Time {
        &self.last_execution_time
    }

    /// Execution time of the earliest pending wake-up, if any.
    pub fn next_time(&self) -> Option<&Time> {
        self.events.peek().map(|Reverse(wake_up)| &wake_up.execution_time)
    }

    /// Number of pending wake-ups.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no wake-ups are pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of wake-ups ever scheduled on this queue.
    pub fn scheduled_count(&self) -> u64 {
        self.events_added
    }
}

impl<Time> EventQueue<Time>
where
    Time: SimTime + Clone + Add<Output = Time>,
{
    /// Schedule `process` to wake after the specified delay. The execution time will be equal to the result of
    /// `self.current_time().clone() + delay`.
    ///
    /// # Errors
    ///
    /// If the calculated execution time is less than the current clock time, i.e. the delay is negative, returns an
    /// [`Error::BackInTime`] with no modifications to the queue.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub(crate) fn schedule_with_delay(&mut self, process: ProcessId, delay: Time) -> crate::Result {
        let event_time = self.last_execution_time.clone() + delay;
        self.schedule(process, event_time)
    }
}

impl<Time> std::fmt::Display for EventQueue<Time>
where
    Time: SimTime,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            formatter,
            "EventQueue with {} scheduled wake-ups at current time {:?}",
            self.events.len(),
            self.last_execution_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::NotNan;

    fn pid(raw: u64) -> ProcessId {
        ProcessId::new(raw)
    }

    fn drain(queue: &mut EventQueue<u32>) -> Vec<(u32, ProcessId)> {
        let mut popped = Vec::new();
        while let Some(process) = queue.next_due_by(None).unwrap() {
            popped.push((*queue.current_time(), process));
        }
        popped
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new(0);
        queue.schedule(pid(1), 10).unwrap();
        queue.schedule(pid(2), 5).unwrap();
        queue.schedule(pid(3), 20).unwrap();

        let expected = vec![(5, pid(2)), (10, pid(1)), (20, pid(3))];
        assert_eq!(expected, drain(&mut queue), "wake-ups did not pop in time order");
    }

    #[test]
    fn simultaneous_wake_ups_pop_in_scheduling_order() {
        let mut queue = EventQueue::new(0);
        for raw in [7, 3, 9, 1] {
            queue.schedule(pid(raw), 4).unwrap();
        }

        let order: Vec<ProcessId> = drain(&mut queue).into_iter().map(|(_, process)| process).collect();
        assert_eq!(vec![pid(7), pid(3), pid(9), pid(1)], order, "ties should resolve by insertion");
    }

    #[test]
    fn rejects_scheduling_in_the_past() {
        let mut queue = EventQueue::new(0);
        queue.schedule(pid(1), 8).unwrap();
        queue.next_due_by(None).unwrap();

        assert_eq!(Err(crate::Error::BackInTime), queue.schedule(pid(2), 7));
        assert!(queue.is_empty(), "rejected wake-up should not be queued");
    }

    #[test]
    fn rejects_negative_delay() {
        let mut queue = EventQueue::new(NotNan::new(3.0).unwrap());
        let result = queue.schedule_with_delay(pid(1), NotNan::new(-0.5).unwrap());
        assert_eq!(Err(crate::Error::BackInTime), result);
        assert_eq!(0, queue.scheduled_count());
    }

    #[test]
    fn zero_delay_lands_behind_existing_wake_ups_for_now() {
        let mut queue = EventQueue::new(2);
        queue.schedule(pid(1), 2).unwrap();
        queue.schedule_with_delay(pid(2), 0).unwrap();
        queue.schedule_with_delay(pid(3), 0).unwrap();

        let order: Vec<ProcessId> = drain(&mut queue).into_iter().map(|(_, process)| process).collect();
        assert_eq!(vec![pid(1), pid(2), pid(3)], order);
    }

    #[test]
    fn stop_time_is_inclusive() {
        let mut queue = EventQueue::new(0);
        queue.schedule(pid(1), 5).unwrap();
        queue.schedule(pid(2), 6).unwrap();

        assert_eq!(Some(pid(1)), queue.next_due_by(Some(&5)).unwrap());
        assert_eq!(None, queue.next_due_by(Some(&5)).unwrap());
        assert_eq!(5, *queue.current_time(), "clock should stay at the last dispatched time");
        assert_eq!(Some(&6), queue.next_time());
    }

    #[test]
    fn advance_never_rewinds() {
        let mut queue: EventQueue<u32> = EventQueue::new(10);
        queue.advance_to(4);
        assert_eq!(10, *queue.current_time());
        queue.advance_to(12);
        assert_eq!(12, *queue.current_time());
    }
}
