use serde::{Deserialize, Serialize};

use crate::error::{ActError, Result};
use crate::moves::PerformanceMove;
use crate::state::StateMask;

fn default_states() -> StateMask {
    StateMask::IDLE
}

/// One authored registry entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveDef {
    pub act: String,
    #[serde(default = "default_states")]
    pub states: StateMask,
    #[serde(default)]
    pub priority: i32,
    #[serde(rename = "move")]
    pub mv: PerformanceMove,
}

/// Authored moveset: a named group of moves loaded into one registry context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovesetDef {
    pub name: String,
    /// Priority of the registry built from this moveset.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub moves: Vec<MoveDef>,
}

/// Public API: parse moveset JSON into a validated [`MovesetDef`].
///
/// Notes:
/// - Entry `states` default to `["Inactive", "Finishing", "Completed"]`.
/// - Move fields default per `PerformanceMove` (no charge, zero durations).
/// - Follow-ups nest full moves under `"move"`.
pub fn parse_moveset_json(s: &str) -> Result<MovesetDef> {
    let def: MovesetDef = serde_json::from_str(s).map_err(|e| ActError::Parse {
        reason: e.to_string(),
    })?;
    def.validate()?;
    Ok(def)
}

impl MovesetDef {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ActError::config("moveset name is empty"));
        }
        for m in &self.moves {
            if m.act.is_empty() {
                return Err(ActError::config(format!(
                    "moveset '{}' has an entry with an empty act title",
                    self.name
                )));
            }
            if m.states.is_empty() {
                return Err(ActError::config(format!(
                    "move '{}' for act '{}' is never available (empty state mask)",
                    m.mv.name, m.act
                )));
            }
            validate_move(&m.mv)?;
        }
        Ok(())
    }
}

fn validate_move(mv: &PerformanceMove) -> Result<()> {
    let p = &mv.perform;
    let c = &mv.charge;
    let times = [
        ("min_duration", p.min_duration),
        ("release", p.release),
        ("cancel_duration", p.cancel_duration),
        ("min_charge", c.min_charge),
        ("max_charge", c.max_charge),
    ];
    if let Some((field, v)) = times.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        return Err(ActError::config(format!(
            "move '{}': {} must be a non-negative number, got {}",
            mv.name, field, v
        )));
    }
    if c.max_charge > 0.0 && c.min_charge > c.max_charge {
        return Err(ActError::config(format!(
            "move '{}': min_charge {} exceeds max_charge {}",
            mv.name, c.min_charge, c.max_charge
        )));
    }
    for f in &mv.follow_ups {
        if f.act.is_empty() {
            return Err(ActError::config(format!(
                "move '{}' has a follow-up with an empty act title",
                mv.name
            )));
        }
        validate_move(&f.mv)?;
    }
    Ok(())
}
