//! Core configuration for vizij-performance-core.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::act::{Act, ActSettings, ActValue};

/// Dispatcher configuration shared by an Actor and the registries it owns.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title of the act that soft-cancels the main performance and bypasses blockers.
    pub cancel_act: String,
    /// Buffer applied by `send_input` for titles without settings.
    pub default_buffer: f32,
    /// Per-title interruption metadata used to build acts in `send_input`.
    pub acts: IndexMap<String, ActSettings>,
    /// Stat scaling charge accumulation; absent stat means 1.
    pub charge_speed_stat: Option<String>,
    /// Stat scaling perform time; absent stat means 1.
    pub perform_speed_stat: Option<String>,
    /// Maximum events retained in `Outputs` per tick.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cancel_act: "Cancel".to_string(),
            default_buffer: 0.25,
            acts: IndexMap::new(),
            charge_speed_stat: Some("ChargeSpeed".to_string()),
            perform_speed_stat: Some("PerformSpeed".to_string()),
            max_events_per_tick: 1024,
        }
    }
}

impl Config {
    pub fn with_act(mut self, title: impl Into<String>, settings: ActSettings) -> Self {
        self.acts.insert(title.into(), settings);
        self
    }

    /// Build an act for `title` from the configured settings (or the default buffer).
    pub fn act(&self, title: &str, value: impl Into<ActValue>) -> Act {
        match self.acts.get(title) {
            Some(s) => Act::with_settings(title, value, s),
            None => Act::new(title, value).buffered(self.default_buffer),
        }
    }

    #[inline]
    pub fn is_cancel(&self, title: &str) -> bool {
        title == self.cancel_act
    }
}
