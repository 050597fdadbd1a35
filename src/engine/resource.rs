use super::ProcessId;

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

/// Handle of a resource created by [`Simulation::add_resource()`].
///
/// [`Simulation::add_resource()`]: crate::engine::Simulation::add_resource
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(usize);

impl ResourceId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Proof that a process holds one unit of a resource.
///
/// Handed out through [`Wake::Acquired`] and consumed by [`Context::release()`]. It cannot be cloned, so a grant is
/// released at most once; a process that finishes while still holding one has it released by the scheduler.
///
/// [`Wake::Acquired`]: crate::engine::Wake::Acquired
/// [`Context::release()`]: crate::engine::Context::release
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an acquisition should be released once the resource is no longer needed"]
pub struct Acquisition {
    resource: ResourceId,
    holder: ProcessId,
}

impl Acquisition {
    pub(crate) fn new(resource: ResourceId, holder: ProcessId) -> Self {
        Self { resource, holder }
    }

    /// The acquired resource.
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// The process holding it.
    pub fn holder(&self) -> ProcessId {
        self.holder
    }
}

/// A capacity-bounded lock with a FIFO wait queue.
///
/// At most `capacity` processes hold the resource at once. Requests beyond that wait in arrival order, and each
/// release admits the process at the head of the queue. A process is either holding, waiting, or neither; never both.
#[derive(Debug, Clone)]
pub struct Resource {
    id: ResourceId,
    capacity: usize,
    holders: Vec<ProcessId>,
    wait_queue: VecDeque<ProcessId>,
}

impl Resource {
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] for a capacity of zero.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub(crate) fn new(id: ResourceId, capacity: usize) -> crate::Result<Self> {
        if capacity == 0 {
            return Err(crate::Error::InvalidConfiguration(format!(
                "resource {id} needs a capacity of at least 1"
            )));
        }

        Ok(Self {
            id,
            capacity,
            holders: Vec::with_capacity(capacity),
            wait_queue: VecDeque::new(),
        })
    }

    /// Handle under which the owning simulation knows this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Maximum number of simultaneous holders.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of processes currently holding the resource.
    pub fn in_use(&self) -> usize {
        self.holders.len()
    }

    /// Number of processes waiting to be admitted.
    pub fn queue_length(&self) -> usize {
        self.wait_queue.len()
    }

    /// Whether nobody holds the resource.
    pub fn is_idle(&self) -> bool {
        self.holders.is_empty()
    }

    /// Whether `process` currently holds the resource.
    pub fn is_held_by(&self, process: ProcessId) -> bool {
        self.holders.contains(&process)
    }

    /// Waiting processes, longest-waiting first.
    pub fn waiting(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.wait_queue.iter().copied()
    }

    /// Admit `process` if there is spare capacity. Returns whether it was admitted.
    pub(crate) fn try_admit(&mut self, process: ProcessId) -> bool {
        if self.holders.len() < self.capacity {
            self.holders.push(process);
            true
        } else {
            false
        }
    }

    pub(crate) fn enqueue(&mut self, process: ProcessId) {
        self.wait_queue.push_back(process);
    }

    /// Remove `process` from the holders and, if anyone is waiting, move the head of the queue into its place.
    /// Returns the newly admitted process.
    ///
    /// # Errors
    ///
    /// [`Error::NotHeld`] if `process` is not a holder.
    ///
    /// [`Error::NotHeld`]: crate::Error::NotHeld
    pub(crate) fn release(&mut self, process: ProcessId) -> crate::Result<Option<ProcessId>> {
        let Some(position) = self.holders.iter().position(|holder| *holder == process) else {
            return Err(crate::Error::NotHeld {
                process,
                resource: self.id,
            });
        };
        self.holders.swap_remove(position);

        let next = self.wait_queue.pop_front();
        if let Some(next) = next {
            self.holders.push(next);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: u64) -> ProcessId {
        ProcessId::new(raw)
    }

    fn resource(capacity: usize) -> Resource {
        Resource::new(ResourceId::new(0), capacity).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = Resource::new(ResourceId::new(3), 0);
        assert!(matches!(result, Err(crate::Error::InvalidConfiguration(_))));
    }

    #[test]
    fn admits_up_to_capacity() {
        let mut resource = resource(2);
        assert!(resource.try_admit(pid(1)));
        assert!(resource.try_admit(pid(2)));
        assert!(!resource.try_admit(pid(3)), "third request should not be admitted");
        assert_eq!(2, resource.in_use());
    }

    #[test]
    fn release_admits_head_of_queue() {
        let mut resource = resource(1);
        assert!(resource.try_admit(pid(1)));
        for raw in [4, 2, 3] {
            resource.enqueue(pid(raw));
        }

        assert_eq!(Some(pid(4)), resource.release(pid(1)).unwrap());
        assert!(resource.is_held_by(pid(4)));
        assert_eq!(vec![pid(2), pid(3)], resource.waiting().collect::<Vec<_>>());
        assert_eq!(1, resource.in_use(), "handover should keep capacity occupied");
    }

    #[test]
    fn release_without_waiters_frees_capacity() {
        let mut resource = resource(1);
        assert!(resource.try_admit(pid(1)));
        assert_eq!(None, resource.release(pid(1)).unwrap());
        assert!(resource.is_idle());
    }

    #[test]
    fn releasing_unheld_resource_fails() {
        let mut resource = resource(1);
        let result = resource.release(pid(9));
        assert_eq!(
            Err(crate::Error::NotHeld {
                process: pid(9),
                resource: ResourceId::new(0),
            }),
            result
        );
    }
}
