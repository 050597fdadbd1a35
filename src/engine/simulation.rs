use super::{Acquisition, Context, EventQueue, Process, ProcessId, Resource, ResourceId, Suspend, Wake};
use crate::{SimState, SimTime};

use std::collections::HashMap;
use std::fmt::Formatter;
use std::ops::Add;
use tracing::{trace, warn};

/// Contains the clock, event queue, processes, resources and model state belonging to a simulation.
///
/// The defining struct for a process-oriented discrete-event simulation. A [`Simulation`] owns everything associated
/// with one replication, so independent replications never share memory and may run on separate threads.
///
/// The expected workflow for a Simulation is:
///
/// 1. Initialize a struct that implements [`SimState`].
/// 2. Pass this struct and the start time to [`new()`].
/// 3. Create resources with [`add_resource()`] and record their ids in the state.
/// 4. [`spawn()`] at least one initial process.
/// 5. Call [`run_until()`] or [`run()`]. Handle any error it might return.
/// 6. Use the [`state()`] or [`into_state()`] accessors to finish processing the results.
///
/// # Scheduling rules
///
/// * A spawned process runs synchronously until it first suspends.
/// * Wake-ups due at the same instant resume in the order they were requested.
/// * A request for a resource with spare capacity is granted on the spot; otherwise the process joins the resource's
///   FIFO queue.
/// * A release hands the resource to the head of its queue and resumes that process before the releasing process
///   continues, at the same virtual instant.
/// * Processes that are still suspended when the run ends are never resumed.
///
/// [`new()`]: Simulation::new
/// [`add_resource()`]: Simulation::add_resource
/// [`spawn()`]: Simulation::spawn
/// [`run_until()`]: Simulation::run_until
/// [`run()`]: Simulation::run
/// [`state()`]: Simulation::state
/// [`into_state()`]: Simulation::into_state
#[derive(Debug, Default)]
pub struct Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Priority queue of pending wake-ups, ordered ascending by execution time, and the clock.
    event_queue: EventQueue<Time>,
    /// Suspended processes. A process is absent from this table while it runs.
    processes: HashMap<ProcessId, Box<dyn Process<State, Time>>>,
    resources: Vec<Resource>,
    /// Resources each live process currently holds, for release on exit.
    holdings: HashMap<ProcessId, Vec<ResourceId>>,
    next_process_id: u64,
    /// The current shared state of the Simulation. Exclusive access will be granted to each process that runs.
    state: State,
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Initialize a Simulation instance with the provided starting state and a clock set to the provided starting
    /// time.
    pub fn new(initial_state: State, start_time: Time) -> Self {
        Self {
            event_queue: EventQueue::new(start_time),
            processes: HashMap::new(),
            resources: Vec::new(),
            holdings: HashMap::new(),
            next_process_id: 0,
            state: initial_state,
        }
    }

    /// Create a resource admitting at most `capacity` simultaneous holders.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `capacity` is zero.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn add_resource(&mut self, capacity: usize) -> crate::Result<ResourceId> {
        let id = ResourceId::new(self.resources.len());
        self.resources.push(Resource::new(id, capacity)?);
        Ok(id)
    }

    /// Look up a resource.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownResource`] if `resource` was not created on this simulation.
    ///
    /// [`Error::UnknownResource`]: crate::Error::UnknownResource
    pub fn resource(&self, resource: ResourceId) -> crate::Result<&Resource> {
        self.resources
            .get(resource.index())
            .ok_or(crate::Error::UnknownResource(resource))
    }

    /// All resources, indexed by creation order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    fn resource_mut(&mut self, resource: ResourceId) -> crate::Result<&mut Resource> {
        self.resources
            .get_mut(resource.index())
            .ok_or(crate::Error::UnknownResource(resource))
    }

    /// Get a shared reference to the simulation's current clock time.
    pub fn current_time(&self) -> &Time {
        self.event_queue.current_time()
    }

    /// Number of processes that are suspended, i.e. spawned but not yet finished.
    pub fn live_processes(&self) -> usize {
        self.processes.len()
    }

    /// Get a shared reference to the simulation state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Get an exclusive reference to the simulation state.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Tear down the simulation and keep only its state.
    pub fn into_state(self) -> State {
        self.state
    }

    /// Get a shared reference to the event queue.
    pub fn event_queue(&self) -> &EventQueue<Time> {
        &self.event_queue
    }

    fn record_holding(&mut self, process: ProcessId, resource: ResourceId) {
        self.holdings.entry(process).or_default().push(resource);
    }

    fn forget_holding(&mut self, process: ProcessId, resource: ResourceId) {
        if let Some(held) = self.holdings.get_mut(&process) {
            if let Some(position) = held.iter().position(|id| *id == resource) {
                held.swap_remove(position);
            }
            if held.is_empty() {
                self.holdings.remove(&process);
            }
        }
    }
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone + Add<Output = Time>,
{
    /// Start a new process. It runs synchronously up to its first suspension before this call returns.
    ///
    /// # Errors
    ///
    /// Passes on any error raised while the new process runs to its first suspension.
    pub fn spawn<ProcessType>(&mut self, process: ProcessType) -> crate::Result<ProcessId>
    where
        ProcessType: Process<State, Time> + 'static,
    {
        self.spawn_from_boxed(Box::new(process))
    }

    /// Start a new, already boxed process. It runs synchronously up to its first suspension before this call returns.
    ///
    /// # Errors
    ///
    /// Passes on any error raised while the new process runs to its first suspension.
    pub fn spawn_from_boxed(&mut self, process: Box<dyn Process<State, Time>>) -> crate::Result<ProcessId> {
        let id = ProcessId::new(self.next_process_id);
        self.next_process_id += 1;
        trace!(process = %id, time = ?self.current_time(), "spawning process");

        self.drive(id, process, Wake::Start)?;
        Ok(id)
    }

    /// Dispatch wake-ups in time order until the queue is empty or [`SimState::is_complete()`] reports true.
    ///
    /// # Errors
    ///
    /// Errors raised by processes are passed back unchanged. [`Error::BackInTime`] and [`Error::OutOfOrder`] point
    /// at a process that yielded a negative delay, or at an inconsistent [`Ord`] implementation on the clock type.
    ///
    /// [`SimState::is_complete()`]: crate::SimState::is_complete
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    /// [`Error::OutOfOrder`]: crate::Error::OutOfOrder
    pub fn run(&mut self) -> crate::Result {
        self.dispatch(None).map(|_| ())
    }

    /// Dispatch wake-ups in time order until the queue is empty, the next wake-up is due after `stop_time`, or
    /// [`SimState::is_complete()`] reports true. Wake-ups due exactly at `stop_time` are dispatched.
    ///
    /// Processes still suspended afterwards are left incomplete. Unless the state asked to stop early, the clock reads
    /// `stop_time` when this returns.
    ///
    /// # Errors
    ///
    /// As for [`run()`].
    ///
    /// [`SimState::is_complete()`]: crate::SimState::is_complete
    /// [`run()`]: Simulation::run
    pub fn run_until(&mut self, stop_time: Time) -> crate::Result {
        let stopped_by_state = self.dispatch(Some(&stop_time))?;
        if !stopped_by_state {
            self.event_queue.advance_to(stop_time);
        }
        Ok(())
    }

    /// Main loop. Returns whether the state reported completion.
    fn dispatch(&mut self, stop_time: Option<&Time>) -> crate::Result<bool> {
        loop {
            if self.state.is_complete(self.event_queue.current_time()) {
                return Ok(true);
            }

            let Some(process) = self.event_queue.next_due_by(stop_time)? else {
                return Ok(false);
            };
            trace!(process = %process, time = ?self.current_time(), "dispatching wake-up");
            self.resume(process, Wake::Timeout)?;
        }
    }

    /// Take a suspended process out of the table and drive it.
    fn resume(&mut self, id: ProcessId, wake: Wake) -> crate::Result {
        let process = self.processes.remove(&id).ok_or(crate::Error::UnknownProcess(id))?;
        self.drive(id, process, wake)
    }

    /// Run `process` until it suspends on something that is not immediately available, then park it in the table.
    ///
    /// Whatever goes wrong along the way, the process's acquisitions are released before the error is returned.
    fn drive(&mut self, id: ProcessId, mut process: Box<dyn Process<State, Time>>, mut wake: Wake) -> crate::Result {
        loop {
            match self.step(id, &mut *process, wake) {
                Ok(Step::Continue(next)) => wake = next,
                Ok(Step::Park) => break,
                Ok(Step::Finished) => {
                    trace!(process = %id, time = ?self.current_time(), "process finished");
                    return self.release_holdings(id);
                },
                Err(error) => {
                    if let Err(cleanup) = self.release_holdings(id) {
                        warn!(process = %id, %cleanup, "failed to release resources of a failing process");
                    }
                    return Err(error);
                },
            }
        }

        self.processes.insert(id, process);
        Ok(())
    }

    /// Resume `process` once and act on the suspension it asks for.
    fn step(&mut self, id: ProcessId, process: &mut dyn Process<State, Time>, wake: Wake) -> crate::Result<Step> {
        match process.resume(&mut Context::new(self, id), wake)? {
            Suspend::Timeout(delay) => {
                self.event_queue.schedule_with_delay(id, delay)?;
                Ok(Step::Park)
            },
            Suspend::Request(resource_id) => {
                let resource = self.resource_mut(resource_id)?;
                if resource.try_admit(id) {
                    self.record_holding(id, resource_id);
                    Ok(Step::Continue(Wake::Acquired(Acquisition::new(resource_id, id))))
                } else {
                    resource.enqueue(id);
                    trace!(
                        process = %id,
                        resource = %resource_id,
                        queue_length = resource.queue_length(),
                        "waiting for resource"
                    );
                    Ok(Step::Park)
                }
            },
            Suspend::Done => Ok(Step::Finished),
        }
    }

    /// Give back one acquisition and hand the resource to the next waiter, if any.
    pub(crate) fn release(&mut self, acquisition: Acquisition) -> crate::Result {
        self.release_unit(acquisition.holder(), acquisition.resource())
    }

    fn release_unit(&mut self, holder: ProcessId, resource_id: ResourceId) -> crate::Result {
        self.forget_holding(holder, resource_id);
        self.hand_over(holder, resource_id)
    }

    /// Release everything `process` still holds, in acquisition order.
    fn release_holdings(&mut self, process: ProcessId) -> crate::Result {
        let Some(held) = self.holdings.remove(&process) else {
            return Ok(());
        };
        for resource_id in held {
            trace!(process = %process, resource = %resource_id, "releasing resource on process exit");
            self.hand_over(process, resource_id)?;
        }
        Ok(())
    }

    /// Remove `holder` from the resource and resume whoever the resource admits in its place.
    fn hand_over(&mut self, holder: ProcessId, resource_id: ResourceId) -> crate::Result {
        let Some(next) = self.resource_mut(resource_id)?.release(holder)? else {
            return Ok(());
        };
        self.record_holding(next, resource_id);
        self.resume(next, Wake::Acquired(Acquisition::new(resource_id, next)))
    }
}

/// What `drive` does after one resumption.
enum Step {
    /// Resume again at once with this wake.
    Continue(Wake),
    /// Suspended on a wake-up or a resource queue.
    Park,
    Finished,
}

impl<State, Time> std::fmt::Display for Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Simulation at time {:?}", self.event_queue.current_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Log {
        entries: Vec<(u32, &'static str)>,
        complete_at: Option<u32>,
    }

    impl SimState<u32> for Log {
        fn is_complete(&self, current_time: &u32) -> bool {
            self.complete_at.is_some_and(|time| *current_time >= time)
        }
    }

    impl SimState<i32> for Log {}

    /// Requests each resource in turn, keeping them all, then sleeps once.
    #[derive(Debug)]
    struct Grabber {
        wants: Vec<ResourceId>,
        then_sleep: i32,
    }

    impl Process<Log, i32> for Grabber {
        fn resume(&mut self, _: &mut Context<'_, Log, i32>, wake: Wake) -> crate::Result<Suspend<i32>> {
            match wake {
                Wake::Timeout => Ok(Suspend::Done),
                Wake::Start | Wake::Acquired(_) if !self.wants.is_empty() => Ok(Suspend::Request(self.wants.remove(0))),
                Wake::Start | Wake::Acquired(_) => Ok(Suspend::Timeout(self.then_sleep)),
            }
        }
    }

    /// Logs its name, then sleeps for each delay in turn.
    #[derive(Debug)]
    struct Sleeper {
        name: &'static str,
        delays: Vec<u32>,
    }

    impl Process<Log, u32> for Sleeper {
        fn resume(&mut self, context: &mut Context<'_, Log, u32>, _: Wake) -> crate::Result<Suspend<u32>> {
            let now = *context.current_time();
            context.state_mut().entries.push((now, self.name));
            if self.delays.is_empty() {
                Ok(Suspend::Done)
            } else {
                Ok(Suspend::Timeout(self.delays.remove(0)))
            }
        }
    }

    /// Holds a resource for a fixed time, optionally skipping the explicit release.
    #[derive(Debug)]
    struct Worker {
        name: &'static str,
        resource: ResourceId,
        hold_for: u32,
        release_explicitly: bool,
        held: Option<Acquisition>,
    }

    impl Worker {
        fn new(name: &'static str, resource: ResourceId, hold_for: u32) -> Self {
            Self {
                name,
                resource,
                hold_for,
                release_explicitly: true,
                held: None,
            }
        }
    }

    impl Process<Log, u32> for Worker {
        fn resume(&mut self, context: &mut Context<'_, Log, u32>, wake: Wake) -> crate::Result<Suspend<u32>> {
            let now = *context.current_time();
            match wake {
                Wake::Start => Ok(Suspend::Request(self.resource)),
                Wake::Acquired(acquisition) => {
                    context.state_mut().entries.push((now, self.name));
                    self.held = Some(acquisition);
                    Ok(Suspend::Timeout(self.hold_for))
                },
                Wake::Timeout => {
                    if let (true, Some(acquisition)) = (self.release_explicitly, self.held.take()) {
                        context.release(acquisition)?;
                    }
                    Ok(Suspend::Done)
                },
            }
        }
    }

    #[test]
    fn spawn_runs_to_first_suspension() {
        let mut sim = Simulation::new(Log::default(), 0);
        sim.spawn(Sleeper {
            name: "a",
            delays: vec![3],
        })
        .unwrap();

        assert_eq!(vec![(0, "a")], sim.state().entries, "spawn should run the process immediately");
        assert_eq!(1, sim.live_processes());
        assert_eq!(1, sim.event_queue().len());
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut sim = Simulation::new(Log::default(), 0);
        let first = sim.spawn(Sleeper { name: "a", delays: vec![] }).unwrap();
        let second = sim.spawn(Sleeper { name: "b", delays: vec![] }).unwrap();
        assert_eq!((0, 1), (first.get(), second.get()));

        let desk = sim.add_resource(2).unwrap();
        let door = sim.add_resource(1).unwrap();
        assert_eq!(door, sim.resource(door).unwrap().id());
        assert_eq!(vec![desk, door], sim.resources().iter().map(Resource::id).collect::<Vec<_>>());
    }

    #[test]
    fn simulation_resumes_processes_in_time_order() {
        let mut sim = Simulation::new(Log::default(), 0);
        sim.spawn(Sleeper {
            name: "slow",
            delays: vec![5],
        })
        .unwrap();
        sim.spawn(Sleeper {
            name: "fast",
            delays: vec![2, 2],
        })
        .unwrap();
        sim.run().unwrap();

        let expected = vec![(0, "slow"), (0, "fast"), (2, "fast"), (4, "fast"), (5, "slow")];
        assert_eq!(expected, sim.state().entries, "processes did not resume in correct order");
        assert_eq!(0, sim.live_processes());
    }

    #[test]
    fn run_until_leaves_later_wake_ups_pending() {
        let mut sim = Simulation::new(Log::default(), 0);
        sim.spawn(Sleeper {
            name: "a",
            delays: vec![4, 4, 4],
        })
        .unwrap();
        sim.run_until(8).unwrap();

        assert_eq!(vec![(0, "a"), (4, "a"), (8, "a")], sim.state().entries);
        assert_eq!(1, sim.live_processes(), "process should remain suspended");

        sim.run_until(10).unwrap();
        assert_eq!(10, *sim.current_time(), "clock should advance to the stop time");
        assert_eq!(3, sim.state().entries.len());
    }

    #[test]
    fn simulation_stops_when_state_is_complete() {
        let mut sim = Simulation::new(
            Log {
                complete_at: Some(3),
                ..Log::default()
            },
            0,
        );
        sim.spawn(Sleeper {
            name: "a",
            delays: vec![2, 2, 2],
        })
        .unwrap();
        sim.run_until(100).unwrap();

        assert_eq!(vec![(0, "a"), (2, "a"), (4, "a")], sim.state().entries);
        assert_eq!(4, *sim.current_time(), "clock should not jump to the stop time");
    }

    #[test]
    fn waiting_processes_are_admitted_in_request_order() {
        let mut sim = Simulation::new(Log::default(), 0);
        let desk = sim.add_resource(1).unwrap();
        for name in ["first", "second", "third"] {
            sim.spawn(Worker::new(name, desk, 3)).unwrap();
        }

        assert_eq!(2, sim.resource(desk).unwrap().queue_length());
        sim.run().unwrap();

        let expected = vec![(0, "first"), (3, "second"), (6, "third")];
        assert_eq!(expected, sim.state().entries);
        assert!(sim.resource(desk).unwrap().is_idle());
    }

    #[test]
    fn finishing_process_releases_what_it_holds() {
        let mut sim = Simulation::new(Log::default(), 0);
        let desk = sim.add_resource(1).unwrap();
        let mut forgetful = Worker::new("forgetful", desk, 2);
        forgetful.release_explicitly = false;
        sim.spawn(forgetful).unwrap();
        sim.spawn(Worker::new("next", desk, 1)).unwrap();
        sim.run().unwrap();

        assert_eq!(vec![(0, "forgetful"), (2, "next")], sim.state().entries);
        assert!(sim.resource(desk).unwrap().is_idle());
    }

    #[test]
    fn negative_delay_aborts_the_run() {
        let mut sim: Simulation<Log, i32> = Simulation::new(Log::default(), 0);
        let grabber = Grabber {
            wants: vec![],
            then_sleep: -1,
        };
        assert_eq!(Err(crate::Error::BackInTime), sim.spawn(grabber).map(|_| ()));
    }

    #[test]
    fn negative_delay_releases_what_the_process_holds() {
        let mut sim: Simulation<Log, i32> = Simulation::new(Log::default(), 0);
        let desk = sim.add_resource(1).unwrap();
        let grabber = Grabber {
            wants: vec![desk],
            then_sleep: -1,
        };

        assert_eq!(Err(crate::Error::BackInTime), sim.spawn(grabber).map(|_| ()));
        assert_eq!(0, sim.resource(desk).unwrap().in_use(), "failed process should not keep the desk");
        assert_eq!(0, sim.live_processes());
    }

    #[test]
    fn unknown_resource_releases_what_the_process_holds() {
        let mut sim: Simulation<Log, i32> = Simulation::new(Log::default(), 0);
        let desk = sim.add_resource(1).unwrap();
        let missing = ResourceId::new(9);
        let grabber = Grabber {
            wants: vec![desk, missing],
            then_sleep: 1,
        };

        assert_eq!(Err(crate::Error::UnknownResource(missing)), sim.spawn(grabber).map(|_| ()));
        assert!(sim.resource(desk).unwrap().is_idle());
    }

    #[test]
    fn unknown_resource_is_reported() {
        let mut sim = Simulation::new(Log::default(), 0);
        let missing = ResourceId::new(7);
        let result = sim.spawn(Worker::new("lost", missing, 1));
        assert_eq!(Err(crate::Error::UnknownResource(missing)), result.map(|_| ()));
    }
}
