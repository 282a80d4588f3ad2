//! Acts: named input/intention values delivered to an [`crate::Actor`].

use serde::{Deserialize, Serialize};

/// Payload carried by an act. Most acts are button edges (`Bool`); analog triggers may
/// send a `Float` which counts as pressed while positive.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActValue {
    Bool(bool),
    Float(f32),
}

impl ActValue {
    #[inline]
    pub fn is_pressed(&self) -> bool {
        match self {
            ActValue::Bool(b) => *b,
            ActValue::Float(v) => *v > 0.0,
        }
    }
}

impl Default for ActValue {
    fn default() -> Self {
        ActValue::Bool(true)
    }
}

impl From<bool> for ActValue {
    fn from(b: bool) -> Self {
        ActValue::Bool(b)
    }
}

/// Interruption metadata and retry window shared by every act with the same title.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActSettings {
    /// A performance started by this act may be soft-cancelled by an interruptor.
    #[serde(default)]
    pub interruptable: bool,
    /// This act may soft-cancel an interruptable main performance.
    #[serde(default)]
    pub interruptor: bool,
    /// Seconds a failed attempt stays eligible for replay.
    #[serde(default)]
    pub buffer: f32,
}

/// Immutable input value. Created per input edge and consumed by `Actor::send`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Act {
    pub title: String,
    #[serde(default)]
    pub value: ActValue,
    #[serde(default)]
    pub interruptable: bool,
    #[serde(default)]
    pub interruptor: bool,
    /// Retry window in seconds (see the Actor's input buffering).
    #[serde(default)]
    pub buffer: f32,
}

impl Act {
    /// Plain act with no interruption metadata and no buffer.
    pub fn new(title: impl Into<String>, value: impl Into<ActValue>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            interruptable: false,
            interruptor: false,
            buffer: 0.0,
        }
    }

    pub fn press(title: impl Into<String>) -> Self {
        Self::new(title, true)
    }

    pub fn release(title: impl Into<String>) -> Self {
        Self::new(title, false)
    }

    /// Build an act from shared per-title settings.
    pub fn with_settings(
        title: impl Into<String>,
        value: impl Into<ActValue>,
        s: &ActSettings,
    ) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            interruptable: s.interruptable,
            interruptor: s.interruptor,
            buffer: s.buffer,
        }
    }

    pub fn interruptable(mut self, on: bool) -> Self {
        self.interruptable = on;
        self
    }

    pub fn interruptor(mut self, on: bool) -> Self {
        self.interruptor = on;
        self
    }

    pub fn buffered(mut self, seconds: f32) -> Self {
        self.buffer = seconds;
        self
    }

    /// Copy of this act carrying a different value (used for synthetic replays).
    pub fn with_value(&self, value: impl Into<ActValue>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    #[inline]
    pub fn is_press(&self) -> bool {
        self.value.is_pressed()
    }
}
