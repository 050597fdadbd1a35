//! The process-oriented simulation kernel.
//!
//! A [`Simulation`] owns a clock, a priority queue of pending wake-ups, a table of suspended [`Process`]es and a set
//! of capacity-bounded [`Resource`]s. Processes are state machines: the scheduler calls [`Process::resume()`] with a
//! [`Wake`] describing why the process woke up, and the process answers with a [`Suspend`] naming what it waits for
//! next. Everything runs on one thread, one process at a time, so the scheduler itself is the only mutual-exclusion
//! mechanism the model ever needs.

mod events;
mod process;
mod resource;
mod simulation;

pub use events::EventQueue;
pub use process::{Context, Process, ProcessId, Suspend, Wake};
pub use resource::{Acquisition, Resource, ResourceId};
pub use simulation::Simulation;
