use std::fmt::Debug;

/// The generic type used for a simulation's clock.
///
/// Kept generic to support as many variations of clock as possible. This trait is a superset of [`Ord`] and [`Debug`]
/// with no additional requirements or functionality.
///
/// Wake-ups execute in ascending order of execution time, i.e. if `A.cmp(&B) == std::cmp::Ordering::Less` then the
/// process woken by A resumes before the process woken by B. Ties are resolved by the order in which wake-ups were
/// scheduled, which keeps a run reproducible for a fixed stream of random variates.
///
/// The [`Simulation`] additionally needs the clock to be [`Clone`] and closed under [`Add`] so that processes can
/// yield relative delays.
///
/// Implementations are provided for integral builtin types, but not for floating-point builtin types as the latter do
/// not implement [`Ord`]. The [`OrderedFloat`] and [`NotNan`] wrappers from [`ordered-float`] are supported directly;
/// the checkpoint model runs on [`NotNan<f64>`].
///
/// [`Simulation`]: crate::engine::Simulation
/// [`Add`]: std::ops::Add
/// [`ordered-float`]: https://docs.rs/ordered-float/4
/// [`OrderedFloat`]: https://docs.rs/ordered-float/4/ordered_float/struct.OrderedFloat.html
/// [`NotNan`]: https://docs.rs/ordered-float/4/ordered_float/struct.NotNan.html
/// [`NotNan<f64>`]: https://docs.rs/ordered-float/4/ordered_float/struct.NotNan.html
pub trait SimTime: Ord + Debug {}

impl SimTime for u8 {}
impl SimTime for u16 {}
impl SimTime for u32 {}
impl SimTime for u64 {}
impl SimTime for u128 {}
impl SimTime for usize {}
impl SimTime for i8 {}
impl SimTime for i16 {}
impl SimTime for i32 {}
impl SimTime for i64 {}
impl SimTime for i128 {}
impl SimTime for isize {}

impl<Float> SimTime for ordered_float::OrderedFloat<Float> where Float: ordered_float::FloatCore + Debug {}

impl<Float> SimTime for ordered_float::NotNan<Float> where Float: ordered_float::FloatCore + Debug {}

/// The generic type used for a simulation's model state.
///
/// This type holds whatever the processes of a model share: resource handles, accumulated statistics, the variate
/// source they draw from. Processes get exclusive access to it through their [`Context`] while they run.
///
/// This trait has only one method, which provides a way for [`Simulation::run()`] to ask whether it should wrap up
/// event execution. The default implementation of this method will always answer "no," and so a simulation running
/// with the default will continue until the event queue becomes empty.
///
/// [`Context`]: crate::engine::Context
/// [`Simulation::run()`]: crate::engine::Simulation::run
pub trait SimState<Time>
where
    Time: SimTime,
{
    /// Reports whether the simulation has run to completion. This method will be invoked in [`Simulation::run()`]
    /// and [`Simulation::run_until()`] before popping each wake-up off the queue: `true` indicates that the
    /// simulation is finished, whereas `false` means that the next scheduled wake-up should be dispatched.
    ///
    /// [`Simulation::run()`]: crate::engine::Simulation::run
    /// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
    // expect that other implementations will make use of the
    // argument even though this one doesn't
    #[allow(unused_variables)]
    fn is_complete(&self, current_time: &Time) -> bool {
        false
    }
}
