//! Output contracts from the dispatcher.
//!
//! Outputs carry the lifecycle events raised during one `Actor::update` tick. Adapters
//! (animation, audio, AI) read them after the tick; nothing calls back into the host.

use serde::{Deserialize, Serialize};

use crate::ids::PerformanceId;
use crate::state::PerformanceState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Perform time first left zero.
    Started,
    /// Raised every tick while the performance is alive, after its transition.
    Updated,
    /// Terminal; raised exactly once.
    Completed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvent {
    pub kind: EventKind,
    pub performance: PerformanceId,
    /// Title of the act that started the performance.
    pub act: String,
    /// Name of the move being performed.
    pub name: String,
    pub state: PerformanceState,
    pub run_time: f32,
}

/// Events returned by `Actor::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<PerformanceEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: PerformanceEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one kind, in emission order.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &PerformanceEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}
