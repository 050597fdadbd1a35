//! # Overview
//!
//! checkpoint-sim is a process-oriented discrete-event simulation of an airport security checkpoint, built on a small
//! general-purpose kernel:
//!
//! * The [`engine`] module provides the kernel. A [`Simulation`] owns a virtual clock, a priority queue of pending
//!   wake-ups, a table of suspended [`Process`]es and a set of capacity-bounded, FIFO-queued [`Resource`]s. Processes
//!   are explicit state machines that the scheduler resumes one at a time, so they get exclusive access to the
//!   model state without locks or interior mutability.
//! * Parameterizing over the [`SimState`] trait gives full access to your model's state type while processes run, and
//!   lets that type end a run early.
//! * Parameterizing over the [`SimTime`] trait gives full control over how wake-ups are sequenced, determined entirely
//!   through your type's implementation of the [`Ord`] supertrait. Ties resume in the order they were scheduled.
//! * Every process step is capable of failing. The first error halts the run and is handed back to client code
//!   unchanged.
//!
//! The [`checkpoint`] module models the checkpoint itself: passengers arrive as a Poisson process, wait for one of a
//! pool of ID checkers, then join the shortest personal-scanner line. The [`replication`] module runs independent,
//! seeded replications of that model and averages their waiting times.
//!
//! A [`Simulation`] owns all data associated with one replication. Replications are therefore isolated from each
//! other by construction and may run on separate threads; each one draws from its own random stream, derived from
//! a master seed, so results do not depend on how they were scheduled.
//!
//! # Features
//!
//! * `parallel` (default): run replications on the [`rayon`] thread pool. Without it they run one after another,
//!   with identical results.
//! * `serde`: derive `Serialize` and `Deserialize` for configuration and statistics types.
//!
//! [`rayon`]: https://docs.rs/rayon/1
//! [`Simulation`]: engine::Simulation
//! [`Process`]: engine::Process
//! [`Resource`]: engine::Resource

pub mod checkpoint;
pub mod engine;
mod error;
mod generic_parameters;
pub mod replication;
pub mod variates;

pub use error::{Error, Result};
pub use generic_parameters::{SimState, SimTime};
