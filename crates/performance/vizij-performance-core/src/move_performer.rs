//! MovePerformer: drives one PerformanceMove through charge → perform → release → complete.
//!
//! Per-tick rules:
//! - Preparing: charge accumulates by `dt * charge_speed`. A release below `min_charge` on a
//!   move that requires it cancels; otherwise the move starts performing once charge reaches
//!   `min_charge` and it is released (or immediately, when the minimum is not required).
//! - Performing/Finishing: run time accumulates by `dt * perform_speed`. The first tick it
//!   leaves zero raises `Started` and deducts costs; `min_duration` enters Finishing and
//!   `min_duration + release` completes.
//! - Cancelled: forced to Finishing, completes after `cancel_duration`.
//!
//! `Updated` is raised every tick after the transition, `Completed` exactly once.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::act::Act;
use crate::config::Config;
use crate::error::ActError;
use crate::ids::PerformanceId;
use crate::moves::{PerformanceMove, PoseSample};
use crate::outputs::{EventKind, PerformanceEvent};
use crate::performer::Performance;
use crate::state::PerformanceState;
use crate::world::World;

#[derive(Debug, Clone)]
pub struct MovePerformer {
    id: PerformanceId,
    act: Act,
    mv: Arc<PerformanceMove>,
    state: PerformanceState,
    charge: f32,
    run_time: f32,
    canceled: bool,
    cancel_time: f32,
    released: bool,
    started: bool,
    charge_speed_stat: Option<String>,
    perform_speed_stat: Option<String>,
}

impl MovePerformer {
    /// Creating a performer is the successful prepare: it starts charging, or performing
    /// right away when the move has no charge phase.
    pub fn new(id: PerformanceId, act: Act, mv: Arc<PerformanceMove>, cfg: &Config) -> Self {
        let state = if mv.charge.has_charge {
            PerformanceState::Preparing
        } else {
            PerformanceState::Performing
        };
        Self {
            id,
            act,
            mv,
            state,
            charge: 0.0,
            run_time: 0.0,
            canceled: false,
            cancel_time: 0.0,
            released: false,
            started: false,
            charge_speed_stat: cfg.charge_speed_stat.clone(),
            perform_speed_stat: cfg.perform_speed_stat.clone(),
        }
    }

    #[inline]
    pub fn charge(&self) -> f32 {
        self.charge
    }

    #[inline]
    pub fn cancel_time(&self) -> f32 {
        self.cancel_time
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn performance_move(&self) -> &Arc<PerformanceMove> {
        &self.mv
    }

    fn event(&self, kind: EventKind) -> PerformanceEvent {
        PerformanceEvent {
            kind,
            performance: self.id,
            act: self.act.title.clone(),
            name: self.mv.name.clone(),
            state: self.state,
            run_time: self.run_time,
        }
    }

    fn warn_completed(&self, op: &str) {
        let err = ActError::AlreadyCompleted { id: self.id };
        warn!("{op} ignored: {err}");
    }

    fn enter(&mut self, next: PerformanceState) {
        trace!(
            "performance {:?} '{}': {} -> {}",
            self.id,
            self.mv.name,
            self.state,
            next
        );
        self.state = next;
    }

    fn speed(stat: &Option<String>, world: &World) -> f32 {
        stat.as_deref()
            .map(|id| world.stats.value_or(id, 1.0))
            .unwrap_or(1.0)
    }

    fn begin_performing(&mut self) {
        self.enter(PerformanceState::Performing);
        self.run_time = 0.0;
    }

    fn tick_charge(&mut self, dt: f32) {
        let min = self.mv.charge.min_charge;
        let max = self.mv.charge.max_charge;
        let require_min = self.mv.charge.require_min_charge;
        if self.released && require_min && self.charge < min {
            debug!(
                "performance {:?} '{}' released at charge {} below minimum {}",
                self.id, self.mv.name, self.charge, min
            );
            self.canceled = true;
            self.enter(PerformanceState::Finishing);
            return;
        }
        self.charge += dt;
        if max > 0.0 && self.charge >= max {
            self.charge = max;
            self.begin_performing();
        } else if self.charge >= min && (self.released || !require_min) {
            self.begin_performing();
        }
    }

    fn tick_perform(&mut self, dt: f32, world: &mut World, events: &mut Vec<PerformanceEvent>) {
        self.run_time += dt;
        if !self.started && self.run_time > 0.0 {
            self.started = true;
            for cost in &self.mv.costs {
                if let Some(stat) = world.stats.get_mut(&cost.stat) {
                    stat.base_value -= cost.amount;
                }
            }
            events.push(self.event(EventKind::Started));
        }
        if self.run_time >= self.mv.total_duration() {
            self.enter(PerformanceState::Completed);
        } else if self.run_time >= self.mv.perform.min_duration
            && self.state == PerformanceState::Performing
        {
            self.enter(PerformanceState::Finishing);
        }
    }
}

impl Performance for MovePerformer {
    fn id(&self) -> PerformanceId {
        self.id
    }

    fn act(&self) -> &Act {
        &self.act
    }

    fn name(&self) -> &str {
        &self.mv.name
    }

    fn state(&self) -> PerformanceState {
        self.state
    }

    fn run_time(&self) -> f32 {
        self.run_time
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn try_perform(&mut self) -> bool {
        if self.state == PerformanceState::Completed {
            self.warn_completed("try_perform");
            return false;
        }
        if self.canceled {
            return false;
        }
        if self.state == PerformanceState::Preparing {
            self.released = true;
        }
        true
    }

    fn try_cancel(&mut self, force: bool) -> bool {
        if self.state == PerformanceState::Completed {
            self.warn_completed("try_cancel");
            return false;
        }
        if self.canceled {
            return true;
        }
        if force || self.state == PerformanceState::Preparing {
            debug!(
                "performance {:?} '{}' cancelled (force={})",
                self.id, self.mv.name, force
            );
            self.canceled = true;
            return true;
        }
        false
    }

    fn update(&mut self, dt: f32, world: &mut World, events: &mut Vec<PerformanceEvent>) {
        if self.state == PerformanceState::Completed {
            self.warn_completed("update");
            return;
        }
        if self.canceled {
            if self.state != PerformanceState::Finishing {
                self.enter(PerformanceState::Finishing);
            }
            self.cancel_time += dt;
            if self.cancel_time >= self.mv.perform.cancel_duration {
                self.enter(PerformanceState::Completed);
            }
        } else {
            match self.state {
                PerformanceState::Preparing => {
                    let speed = Self::speed(&self.charge_speed_stat, world);
                    self.tick_charge(dt * speed);
                }
                PerformanceState::Performing | PerformanceState::Finishing => {
                    let speed = Self::speed(&self.perform_speed_stat, world);
                    self.tick_perform(dt * speed, world, events);
                }
                PerformanceState::Inactive | PerformanceState::Completed => {}
            }
        }

        events.push(self.event(EventKind::Updated));
        if self.state == PerformanceState::Completed {
            events.push(self.event(EventKind::Completed));
        }
    }

    fn sample(&self) -> PoseSample {
        let cancel = if self.canceled {
            Some(self.cancel_time)
        } else {
            None
        };
        self.mv.evaluate(self.charge, self.run_time, cancel)
    }
}
