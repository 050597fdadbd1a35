use super::{Acquisition, Resource, ResourceId, Simulation};
use crate::{SimState, SimTime};

use std::fmt::{Debug, Display, Formatter};
use std::ops::Add;

/// Identity of a process, assigned in spawn order starting from zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(u64);

impl ProcessId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw spawn-order number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Why a process is being resumed.
#[derive(Debug)]
pub enum Wake {
    /// First resumption, immediately after spawning.
    Start,
    /// A previously yielded [`Suspend::Timeout`] has elapsed.
    Timeout,
    /// A previously yielded [`Suspend::Request`] has been granted. The process now holds the resource until it hands
    /// the acquisition to [`Context::release()`] or finishes.
    Acquired(Acquisition),
}

impl Display for Wake {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Timeout => write!(f, "timeout"),
            Self::Acquired(acquisition) => write!(f, "acquisition of {}", acquisition.resource()),
        }
    }
}

/// What a process waits for after returning from [`Process::resume()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suspend<Time> {
    /// Resume with [`Wake::Timeout`] once the given delay has elapsed on the simulation clock.
    Timeout(Time),
    /// Resume with [`Wake::Acquired`] once the resource admits this process. Admission is immediate, with no time
    /// advance, when the resource has spare capacity.
    Request(ResourceId),
    /// The process is finished. Any acquisitions it still holds are released on its behalf.
    Done,
}

/// A logical process: a unit of sequential behavior that suspends and resumes without blocking other processes.
///
/// Processes are explicit state machines. The [`Simulation`] calls [`resume()`] each time the process's last
/// suspension request is satisfied, passing a [`Wake`] that says which request it was. The process updates its own
/// record of where it is, does whatever work happens at this instant, and returns its next [`Suspend`].
///
/// Requiring implementors to be [`Debug`] enables printing the full contents of a [`Simulation`] when necessary.
///
/// [`resume()`]: Process::resume
pub trait Process<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Advance the process from its current suspension point to the next one.
    ///
    /// The simulation's clock, readable through `context`, is updated before this method is invoked.
    ///
    /// # Errors
    ///
    /// Any error returned here aborts the run and is passed back unchanged from [`Simulation::run_until()`]. Client
    /// errors are expected to travel as [`Error::BadExecution`]. Acquisitions held by a failing process are released
    /// before the error propagates.
    ///
    /// [`Simulation::run_until()`]: Simulation::run_until
    /// [`Error::BadExecution`]: crate::Error::BadExecution
    fn resume(&mut self, context: &mut Context<'_, State, Time>, wake: Wake) -> crate::Result<Suspend<Time>>;
}

/// The view of the simulation granted to a running process.
///
/// Only one process runs at a time, so a [`Context`] carries exclusive access to the model state and the kernel. It is
/// also how a process creates other processes and gives back resources.
pub struct Context<'a, State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    simulation: &'a mut Simulation<State, Time>,
    process: ProcessId,
}

impl<'a, State, Time> Context<'a, State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub(crate) fn new(simulation: &'a mut Simulation<State, Time>, process: ProcessId) -> Self {
        Self { simulation, process }
    }

    /// Identity of the running process.
    pub fn id(&self) -> ProcessId {
        self.process
    }

    /// Get a shared reference to the simulation's current clock time.
    pub fn current_time(&self) -> &Time {
        self.simulation.current_time()
    }

    /// Get a shared reference to the model state.
    pub fn state(&self) -> &State {
        self.simulation.state()
    }

    /// Get an exclusive reference to the model state.
    pub fn state_mut(&mut self) -> &mut State {
        self.simulation.state_mut()
    }

    /// Look up a resource.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownResource`] if `resource` was not created on this simulation.
    ///
    /// [`Error::UnknownResource`]: crate::Error::UnknownResource
    pub fn resource(&self, resource: ResourceId) -> crate::Result<&Resource> {
        self.simulation.resource(resource)
    }
}

impl<'a, State, Time> Context<'a, State, Time>
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
        self.simulation.spawn(process)
    }

    /// Give back a resource. If another process is waiting for it, the longest-waiting one is admitted and resumed
    /// before this call returns, at the same virtual instant.
    ///
    /// # Errors
    ///
    /// [`Error::NotHeld`] if the acquisition is stale, plus anything raised by the process admitted in its place.
    ///
    /// [`Error::NotHeld`]: crate::Error::NotHeld
    pub fn release(&mut self, acquisition: Acquisition) -> crate::Result {
        self.simulation.release(acquisition)
    }
}
