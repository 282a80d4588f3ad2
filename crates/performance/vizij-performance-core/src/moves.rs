//! PerformanceMove: immutable timing/cost data for one kind of performance.
//!
//! Moves are authored once (code or JSON, see `moveset_json`) and shared behind `Arc` by
//! every registry entry and running `MovePerformer` that uses them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::StateMask;

/// Charge (wind-up) parameters. Charge accumulates in seconds scaled by the
/// charge-speed stat while the act is held.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeParams {
    pub has_charge: bool,
    pub min_charge: f32,
    /// Charge is clamped here and reaching it starts the performance; `0` disables the cap.
    pub max_charge: f32,
    /// Releasing before `min_charge` cancels instead of waiting for the threshold.
    pub require_min_charge: bool,
    /// Seconds for the pose to blend into the charge pose.
    pub transition: f32,
}

impl Default for ChargeParams {
    fn default() -> Self {
        Self {
            has_charge: false,
            min_charge: 0.0,
            max_charge: 0.0,
            require_min_charge: false,
            transition: 0.1,
        }
    }
}

/// Perform/release timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformParams {
    pub has_performance: bool,
    /// Seconds of committed performance before the move starts finishing.
    pub min_duration: f32,
    /// Seconds of release (recovery) after `min_duration`.
    pub release: f32,
    /// Seconds a cancelled performance lingers in `Finishing` before completing.
    pub cancel_duration: f32,
    /// Fraction of `min_duration` used to ease from the charge pose to full weight.
    pub charge_fadeout: f32,
}

impl Default for PerformParams {
    fn default() -> Self {
        Self {
            has_performance: true,
            min_duration: 0.0,
            release: 0.0,
            cancel_duration: 0.0,
            charge_fadeout: 0.2,
        }
    }
}

/// Resource gate and deduction. Preparing fails while the stat's value is `<= 0`;
/// `amount` is subtracted from the stat's base value when the performance starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub stat: String,
    pub amount: f32,
}

/// A move that becomes available while the performance that registered it is alive and
/// in one of `states`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub act: String,
    pub states: StateMask,
    #[serde(rename = "move")]
    pub mv: Arc<PerformanceMove>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMove {
    pub name: String,
    pub charge: ChargeParams,
    pub perform: PerformParams,
    pub follow_ups: Vec<FollowUp>,
    pub costs: Vec<Cost>,
    /// World condition flags that must all be set to prepare this move.
    pub requires: Vec<String>,
}

/// Pose blend output consumed by animation adapters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Normalized progress through the charge pose in [0, 1].
    pub charge: f32,
    /// Normalized progress through the perform clip in [0, 1].
    pub perform: f32,
    /// Overall blend weight of this performance in [0, 1].
    pub weight: f32,
}

#[inline]
fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Cubic smoothstep ease on [0, 1].
#[inline]
pub fn ease(t: f32) -> f32 {
    let t = clamp01(t);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Ratio with a degenerate span treated as already complete.
#[inline]
fn progress(t: f32, span: f32) -> f32 {
    if span > 0.0 {
        clamp01(t / span)
    } else {
        1.0
    }
}

impl PerformanceMove {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Instant move: no charge, performs for `min_duration` then releases for `release`.
    pub fn strike(
        name: impl Into<String>,
        min_duration: f32,
        release: f32,
        cancel_duration: f32,
    ) -> Self {
        let mut mv = Self::new(name);
        mv.perform.min_duration = min_duration;
        mv.perform.release = release;
        mv.perform.cancel_duration = cancel_duration;
        mv
    }

    pub fn with_charge(
        mut self,
        min_charge: f32,
        max_charge: f32,
        require_min_charge: bool,
    ) -> Self {
        self.charge.has_charge = true;
        self.charge.min_charge = min_charge;
        self.charge.max_charge = max_charge;
        self.charge.require_min_charge = require_min_charge;
        self
    }

    pub fn with_cost(mut self, stat: impl Into<String>, amount: f32) -> Self {
        self.costs.push(Cost {
            stat: stat.into(),
            amount,
        });
        self
    }

    pub fn with_follow_up(
        mut self,
        act: impl Into<String>,
        states: impl Into<StateMask>,
        mv: Arc<PerformanceMove>,
        priority: i32,
    ) -> Self {
        self.follow_ups.push(FollowUp {
            act: act.into(),
            states: states.into(),
            mv,
            priority,
        });
        self
    }

    pub fn requiring(mut self, condition: impl Into<String>) -> Self {
        self.requires.push(condition.into());
        self
    }

    /// `min_duration + release`, or zero for moves without a performance phase.
    #[inline]
    pub fn total_duration(&self) -> f32 {
        if self.perform.has_performance {
            self.perform.min_duration + self.perform.release
        } else {
            0.0
        }
    }

    /// Blend weight contributed by the charge pose after `charge_time` seconds of charge.
    fn charge_weight(&self, charge_time: f32) -> f32 {
        if !self.charge.has_charge {
            return 0.0;
        }
        ease(progress(charge_time, self.charge.transition))
    }

    /// Pose blend for the given charge and perform times.
    ///
    /// Weight eases from the charge-pose weight to 1 over `min_duration * charge_fadeout`,
    /// holds, then eases back to 0 over `release`. A cancelled performance additionally
    /// scales the weight down to 0 over `cancel_duration`.
    pub fn evaluate(
        &self,
        charge_time: f32,
        perform_time: f32,
        cancel_time: Option<f32>,
    ) -> PoseSample {
        let p = &self.perform;
        let charge_w = self.charge_weight(charge_time);
        let mut weight = if perform_time <= 0.0 {
            charge_w
        } else {
            let fade = p.min_duration * p.charge_fadeout;
            if perform_time < fade {
                lerp_f32(charge_w, 1.0, ease(perform_time / fade))
            } else if perform_time <= p.min_duration {
                1.0
            } else {
                1.0 - ease(progress(perform_time - p.min_duration, p.release))
            }
        };
        if let Some(ct) = cancel_time {
            weight *= 1.0 - progress(ct, p.cancel_duration);
        }

        let charge_span = self.charge.max_charge.max(self.charge.min_charge);
        PoseSample {
            charge: if self.charge.has_charge {
                progress(charge_time, charge_span)
            } else {
                0.0
            },
            perform: if perform_time > 0.0 {
                progress(perform_time, self.total_duration())
            } else {
                0.0
            },
            weight: clamp01(weight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-5, "left={a} right={b}");
    }

    #[test]
    fn total_duration_sums_min_and_release() {
        let mv = PerformanceMove::strike("Jab", 0.4, 0.5, 0.25);
        approx(mv.total_duration(), 0.9);
        let mut idle = mv.clone();
        idle.perform.has_performance = false;
        approx(idle.total_duration(), 0.0);
    }

    #[test]
    fn weight_ramps_holds_and_releases() {
        let mv = PerformanceMove::strike("Jab", 1.0, 0.5, 0.25);
        // fade window = 1.0 * 0.2
        approx(mv.evaluate(0.0, 0.0, None).weight, 0.0);
        approx(mv.evaluate(0.0, 0.1, None).weight, 0.5);
        approx(mv.evaluate(0.0, 0.5, None).weight, 1.0);
        approx(mv.evaluate(0.0, 1.0, None).weight, 1.0);
        approx(mv.evaluate(0.0, 1.25, None).weight, 0.5);
        approx(mv.evaluate(0.0, 1.5, None).weight, 0.0);
    }

    #[test]
    fn charge_pose_feeds_the_fade_in() {
        let mv = PerformanceMove::strike("Heavy", 1.0, 0.5, 0.25).with_charge(0.3, 1.0, true);
        // transition defaults to 0.1s, so 0.2s of charge is fully in the charge pose.
        let s = mv.evaluate(0.2, 0.0, None);
        approx(s.weight, 1.0);
        approx(s.charge, 0.2);
        approx(mv.evaluate(0.2, 0.1, None).weight, 1.0);
        approx(mv.evaluate(0.05, 0.0, None).weight, 0.5);
    }

    #[test]
    fn cancel_scales_weight_to_zero() {
        let mv = PerformanceMove::strike("Jab", 1.0, 0.5, 0.25);
        approx(mv.evaluate(0.0, 0.5, Some(0.125)).weight, 0.5);
        approx(mv.evaluate(0.0, 0.5, Some(0.25)).weight, 0.0);
    }

    #[test]
    fn follow_up_move_parses_from_json() {
        let json = r#"{
            "name": "Jab",
            "perform": { "min_duration": 0.3, "release": 0.2 },
            "follow_ups": [
                {
                    "act": "Light",
                    "states": ["Finishing"],
                    "move": { "name": "Cross" },
                    "priority": 5
                }
            ]
        }"#;
        let mv: PerformanceMove = serde_json::from_str(json).unwrap();
        assert_eq!(mv.follow_ups.len(), 1);
        assert_eq!(mv.follow_ups[0].mv.name, "Cross");
        assert!(mv.perform.has_performance);
        approx(mv.perform.charge_fadeout, 0.2);
    }
}
