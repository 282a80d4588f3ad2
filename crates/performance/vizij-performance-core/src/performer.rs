//! The performer contract.
//!
//! A [`Performer`] is a registered source of performances (a `MoveRegistry`, or a nested
//! `Actor`). Preparing an act on it yields a boxed [`Performance`]: the single-use,
//! self-advancing instance that the dispatcher pushes onto its active stack.
//!
//! Lifecycle events are returned as data from [`Performance::update`] and routed back to
//! the performer that created them through [`Performer::on_event`], so no performer ever
//! holds a callback into the dispatcher.

use crate::act::Act;
use crate::error::Result;
use crate::ids::PerformanceId;
use crate::moves::PoseSample;
use crate::outputs::PerformanceEvent;
use crate::state::PerformanceState;
use crate::world::World;

/// One running performance.
pub trait Performance {
    fn id(&self) -> PerformanceId;

    /// The act that started this performance.
    fn act(&self) -> &Act;

    /// Display name of what is being performed.
    fn name(&self) -> &str;

    fn state(&self) -> PerformanceState;

    /// Seconds spent performing (scaled by the perform-speed stat).
    fn run_time(&self) -> f32;

    fn is_canceled(&self) -> bool;

    /// Release the charge. Returns false when the performance can no longer be driven
    /// (cancelled or completed).
    fn try_perform(&mut self) -> bool;

    /// Request cancellation. `force` always succeeds on a live performance; a soft cancel
    /// is only honoured while preparing. The state change lands on the next `update`.
    fn try_cancel(&mut self, force: bool) -> bool;

    /// Advance by `dt` seconds, appending lifecycle events in emission order.
    fn update(&mut self, dt: f32, world: &mut World, events: &mut Vec<PerformanceEvent>);

    /// Current pose blend for animation adapters.
    fn sample(&self) -> PoseSample {
        PoseSample::default()
    }
}

/// A source of performances registered into an Actor.
pub trait Performer {
    fn name(&self) -> &str;

    /// Higher priorities are attempted first.
    fn priority(&self) -> i32;

    fn supports_act(&self, title: &str) -> bool;

    /// Titles this performer currently answers to.
    fn supported_acts(&self) -> Vec<String>;

    /// Aggregate state of the performances this performer created.
    fn state(&self) -> PerformanceState;

    /// Create a performance for `act`, or explain why none can start.
    fn try_prepare(&mut self, act: &Act, world: &mut World) -> Result<Box<dyn Performance>>;

    /// Lifecycle event of a performance this performer created.
    fn on_event(&mut self, _event: &PerformanceEvent) {}

    /// The performer was unregistered. Performances it created keep running, but their
    /// events will no longer reach it, so it must forget them.
    fn detach(&mut self) {}
}
