use crate::engine::{ProcessId, ResourceId};

/// Errors that may be encountered while configuring or executing a simulation.
///
/// The [`BackInTime`] and [`OutOfOrder`] variants originate from the [`EventQueue`] and indicate that the clock would
/// have run backwards. Either one almost certainly corresponds to a logical bug, e.g. a process yielding a negative
/// delay, and aborts the run rather than letting it produce silently wrong statistics.
///
/// The [`BadExecution`] variant originates from client code, providing a wrapper that can pass through
/// [`Simulation::run_until()`] in a type-safe manner. Invoking [`std::error::Error::source()`] on this variant will
/// acquire a shared reference to the wrapped [`std::error::Error`] for handling on the client side.
///
/// [`EventQueue`]: crate::engine::EventQueue
/// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
/// [`BackInTime`]: Error::BackInTime
/// [`OutOfOrder`]: Error::OutOfOrder
/// [`BadExecution`]: Error::BadExecution
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value was rejected before anything was scheduled.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The event queue rejected a wake-up that would have been scheduled for a time that has already passed.
    #[error("event execution time is less than current simulation time")]
    BackInTime,
    /// The event queue produced a wake-up due before the current clock time.
    #[error("event queue yielded an event scheduled before the current simulation time")]
    OutOfOrder,
    /// A wake-up or release referred to a process the scheduler does not own.
    #[error("process {0} is not owned by the scheduler")]
    UnknownProcess(ProcessId),
    /// A request or query referred to a resource that was never created.
    #[error("resource {0} does not exist")]
    UnknownResource(ResourceId),
    /// A process tried to release a resource it does not hold.
    #[error("process {process} does not hold resource {resource}")]
    NotHeld {
        /// The releasing process.
        process: ProcessId,
        /// The resource named in the acquisition.
        resource: ResourceId,
    },
    /// A process was resumed for a reason that does not match its suspension point.
    #[error("process {process} woke with {wake} while {stage}")]
    UnexpectedWake {
        /// The resumed process.
        process: ProcessId,
        /// Description of the process's suspension point.
        stage: String,
        /// Description of the wake-up it received.
        wake: String,
    },
    /// A replication ended before any passenger made it through the checkpoint.
    #[error("no passengers completed the checkpoint before the run ended")]
    NoPassengersProcessed,
    /// A client-generated error was encountered while executing a process. Call [`source()`] or unpack this value to
    /// handle it directly.
    ///
    /// [`source()`]: #method.source
    #[error("error while executing process: {0}")]
    BadExecution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wrap any client error as [`Error::BadExecution`].
    pub fn execution<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BadExecution(Box::new(error))
    }
}

/// Variants compare by value, except [`Error::BadExecution`], which is equal only to itself: two payloads match when
/// they live at the same address. Zero-sized payloads share a dangling address, so any two of them compare equal.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::InvalidConfiguration(a), Error::InvalidConfiguration(b)) => a == b,
            (Error::BackInTime, Error::BackInTime)
            | (Error::OutOfOrder, Error::OutOfOrder)
            | (Error::NoPassengersProcessed, Error::NoPassengersProcessed) => true,
            (Error::UnknownProcess(a), Error::UnknownProcess(b)) => a == b,
            (Error::UnknownResource(a), Error::UnknownResource(b)) => a == b,
            (
                Error::NotHeld { process, resource },
                Error::NotHeld {
                    process: other_process,
                    resource: other_resource,
                },
            ) => process == other_process && resource == other_resource,
            (
                Error::UnexpectedWake { process, stage, wake },
                Error::UnexpectedWake {
                    process: other_process,
                    stage: other_stage,
                    wake: other_wake,
                },
            ) => process == other_process && stage == other_stage && wake == other_wake,
            (Error::BadExecution(e1), Error::BadExecution(e2)) => {
                let e1: *const dyn std::error::Error = e1.as_ref();
                let e2: *const dyn std::error::Error = e2.as_ref();
                std::ptr::eq(e1, e2)
            },
            _ => false,
        }
    }
}

impl Eq for Error {}

/// [`std::result::Result`]`<T, `[`checkpoint_sim::Error`]`>`, defaulting to `()` for the many operations that only
/// succeed or fail.
///
/// [`checkpoint_sim::Error`]: Error
pub type Result<T = ()> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn bad_execution_exposes_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let error = Error::execution(inner);
        assert!(error.source().is_some(), "wrapped error should be reachable");
        assert_eq!("error while executing process: boom", error.to_string());
    }

    #[test]
    fn bad_execution_compares_by_identity() {
        let a = Error::execution(std::io::Error::new(std::io::ErrorKind::Other, "first"));
        let b = Error::execution(std::io::Error::new(std::io::ErrorKind::Other, "first"));
        assert_ne!(a, b, "distinct boxes should not compare equal");
        assert_eq!(a, a);
    }

    #[test]
    fn not_held_names_both_parties() {
        let error = Error::NotHeld {
            process: ProcessId::new(4),
            resource: ResourceId::new(2),
        };
        assert_eq!("process P4 does not hold resource R2", error.to_string());
    }
}
