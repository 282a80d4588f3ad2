use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Lifecycle state of a performance.
///
/// Ordered: a performance only moves forward along
/// `Inactive → Preparing → Performing → Finishing → Completed`; cancellation jumps from any
/// live state straight to `Finishing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceState {
    Inactive,
    Preparing,
    Performing,
    Finishing,
    Completed,
}

impl PerformanceState {
    pub const ALL: [PerformanceState; 5] = [
        Self::Inactive,
        Self::Preparing,
        Self::Performing,
        Self::Finishing,
        Self::Completed,
    ];

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Preparing => "preparing",
            Self::Performing => "performing",
            Self::Finishing => "finishing",
            Self::Completed => "completed",
        }
    }

    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Inactive => 1,
            Self::Preparing => 1 << 1,
            Self::Performing => 1 << 2,
            Self::Finishing => 1 << 3,
            Self::Completed => 1 << 4,
        }
    }

    /// The performer no longer holds control: a new performance may start on top of it.
    #[inline]
    pub fn is_yielding(&self) -> bool {
        matches!(self, Self::Finishing | Self::Completed)
    }
}

impl fmt::Display for PerformanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of states, used by registry entries to describe when a move is available.
///
/// Serialized as a list of state names so authored movesets stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PerformanceState>", into = "Vec<PerformanceState>")]
pub struct StateMask(u8);

impl StateMask {
    pub const NONE: StateMask = StateMask(0);
    pub const ALL: StateMask = StateMask(0b1_1111);
    /// Default availability of a base move: the owner is idle or winding down.
    pub const IDLE: StateMask = StateMask(
        PerformanceState::Inactive.bit()
            | PerformanceState::Finishing.bit()
            | PerformanceState::Completed.bit(),
    );

    #[inline]
    pub const fn of(state: PerformanceState) -> Self {
        StateMask(state.bit())
    }

    #[inline]
    pub fn contains(&self, state: PerformanceState) -> bool {
        self.0 & state.bit() != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn states(&self) -> impl Iterator<Item = PerformanceState> + '_ {
        PerformanceState::ALL
            .into_iter()
            .filter(move |s| self.contains(*s))
    }
}

impl From<PerformanceState> for StateMask {
    fn from(s: PerformanceState) -> Self {
        StateMask::of(s)
    }
}

impl BitOr for PerformanceState {
    type Output = StateMask;
    fn bitor(self, rhs: PerformanceState) -> StateMask {
        StateMask(self.bit() | rhs.bit())
    }
}

impl BitOr<PerformanceState> for StateMask {
    type Output = StateMask;
    fn bitor(self, rhs: PerformanceState) -> StateMask {
        StateMask(self.0 | rhs.bit())
    }
}

impl BitOr for StateMask {
    type Output = StateMask;
    fn bitor(self, rhs: StateMask) -> StateMask {
        StateMask(self.0 | rhs.0)
    }
}

impl BitOrAssign<PerformanceState> for StateMask {
    fn bitor_assign(&mut self, rhs: PerformanceState) {
        self.0 |= rhs.bit();
    }
}

impl From<Vec<PerformanceState>> for StateMask {
    fn from(v: Vec<PerformanceState>) -> Self {
        v.into_iter().fold(StateMask::NONE, |m, s| m | s)
    }
}

impl From<StateMask> for Vec<PerformanceState> {
    fn from(m: StateMask) -> Self {
        m.states().collect()
    }
}
