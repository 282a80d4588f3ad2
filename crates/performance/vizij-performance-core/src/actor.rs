//! Actor: top-level act dispatcher for one agent.
//!
//! Owns the priority-sorted performers, the stack of active performances (top = main
//! performance), the input buffer for failed attempts, and the blocker set.
//!
//! Dispatch of a press:
//! 1. Rejected when no performer supports the title, or the actor is blocked (the cancel
//!    act bypasses blockers and soft-cancels the main performance instead).
//! 2. A repeated press of the act currently charging on the main performance is ignored.
//! 3. Room is made when there is no main performance, it is finishing, or the act is an
//!    interruptor and the main performance's act is interruptable and accepts a soft cancel.
//! 4. Performers are tried in descending priority (first registered wins ties); the first
//!    successful prepare is pushed on the stack.
//!
//! A release skips the support and blocker gates. It is accepted only right after an
//! accepted press of the same title, and only when the main performance was started by
//! that title; it is then forwarded to the main performance.
//!
//! A failed attempt is remembered with a timer of `act.buffer` seconds. Whenever the main
//! performance raises `Updated` the attempt is replayed (press, then release if the attempt
//! was a release) while the press is still held or the timer has not expired.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::act::Act;
use crate::config::Config;
use crate::error::{ActError, Result};
use crate::ids::{IdAllocator, PerformanceId, PerformerKey};
use crate::outputs::{EventKind, Outputs, PerformanceEvent};
use crate::performer::{Performance, Performer};
use crate::state::PerformanceState;
use crate::world::World;

/// Countdown sampled on tick. It only counts once it has seen an update, so an attempt
/// recorded during a tick is not replayed within that same tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferTimer {
    pub remaining: f32,
    pub started: bool,
}

impl BufferTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration,
            started: false,
        }
    }

    #[inline]
    pub fn tick(&mut self, dt: f32) {
        self.remaining -= dt;
        self.started = true;
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.remaining < 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub act: Act,
    pub timer: BufferTimer,
}

/// How an act that was not rejected was handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dispatch {
    /// Started, released or cancelled a performance.
    Accepted,
    /// Repeated press of the act that is still charging on the main performance.
    Debounced,
    /// Release of the cancel act.
    Ignored,
}

#[derive(Clone, Debug)]
struct ProcessedAct {
    act: Act,
    accepted: bool,
}

struct Registered {
    key: PerformerKey,
    performer: Box<dyn Performer>,
}

struct Active {
    /// Performer that created this performance; `None` once that performer was removed.
    source: Option<PerformerKey>,
    performance: Box<dyn Performance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveSummary {
    pub id: PerformanceId,
    pub act: String,
    pub name: String,
    pub state: PerformanceState,
    pub run_time: f32,
    pub canceled: bool,
}

/// Diagnostics view of an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub name: String,
    pub state: PerformanceState,
    pub blockers: Vec<String>,
    /// Registered performers as (name, priority), in dispatch order.
    pub performers: Vec<(String, i32)>,
    /// Active stack, bottom first.
    pub stack: Vec<ActiveSummary>,
    pub pending: Option<FailedAttempt>,
}

pub struct Actor {
    name: String,
    priority: i32,
    cfg: Config,
    keys: IdAllocator,
    performers: Vec<Registered>,
    active: Vec<Active>,
    last_processed: Option<ProcessedAct>,
    last_failed: Option<FailedAttempt>,
    blockers: IndexMap<String, u32>,
    // Performances handed out while nested inside another actor.
    spawned: HashMap<PerformanceId, PerformerKey>,
    live: Vec<(PerformanceId, PerformanceState)>,
    outputs: Outputs,
    overflowed: bool,
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("performers", &self.performers.len())
            .field("active", &self.active.len())
            .field("blockers", &self.blockers)
            .finish()
    }
}

impl Actor {
    pub fn new(name: impl Into<String>, cfg: Config) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            cfg,
            keys: IdAllocator::new(),
            performers: Vec::new(),
            active: Vec::new(),
            last_processed: None,
            last_failed: None,
            blockers: IndexMap::new(),
            spawned: HashMap::new(),
            live: Vec::new(),
            outputs: Outputs::default(),
            overflowed: false,
        }
    }

    /// Priority of this actor when nested as a performer of another actor.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    // ---- performers ----

    /// Register a performer and re-sort by descending priority; equal priorities keep
    /// registration order. Names must be unique within an actor.
    ///
    /// Ownership makes registering an actor into itself unrepresentable.
    pub fn add_performer(&mut self, performer: Box<dyn Performer>) -> Result<PerformerKey> {
        if self
            .performers
            .iter()
            .any(|r| r.performer.name() == performer.name())
        {
            let err = ActError::config(format!(
                "actor '{}' already has a performer named '{}'",
                self.name,
                performer.name()
            ));
            warn!("{err}");
            return Err(err);
        }
        let key = self.keys.alloc_performer();
        self.performers.push(Registered { key, performer });
        self.performers
            .sort_by_key(|r| std::cmp::Reverse(r.performer.priority()));
        Ok(key)
    }

    /// Unregister a performer. Its running performances keep running but their events are
    /// no longer routed to it.
    pub fn remove_performer(&mut self, key: PerformerKey) -> Option<Box<dyn Performer>> {
        let pos = self.performers.iter().position(|r| r.key == key)?;
        let mut reg = self.performers.remove(pos);
        reg.performer.detach();
        for a in self.active.iter_mut().filter(|a| a.source == Some(key)) {
            a.source = None;
        }
        self.spawned.retain(|_, k| *k != key);
        Some(reg.performer)
    }

    pub fn performer(&self, key: PerformerKey) -> Option<&dyn Performer> {
        self.performers
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.performer.as_ref())
    }

    /// Performer keys in dispatch order.
    pub fn performer_keys(&self) -> Vec<PerformerKey> {
        self.performers.iter().map(|r| r.key).collect()
    }

    // ---- active stack ----

    /// The performance currently in control (top of the active stack).
    pub fn main_performance(&self) -> Option<&dyn Performance> {
        self.active.last().map(|a| a.performance.as_ref())
    }

    pub fn main_performance_mut(&mut self) -> Option<&mut (dyn Performance + 'static)> {
        self.active.last_mut().map(|a| a.performance.as_mut())
    }

    /// Active performances, bottom of the stack first.
    pub fn active_performances(&self) -> impl Iterator<Item = &dyn Performance> {
        self.active.iter().map(|a| a.performance.as_ref())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn performance(&self, id: PerformanceId) -> Option<&dyn Performance> {
        self.active
            .iter()
            .find(|a| a.performance.id() == id)
            .map(|a| a.performance.as_ref())
    }

    pub fn pending_attempt(&self) -> Option<&FailedAttempt> {
        self.last_failed.as_ref()
    }

    /// Cancel the main performance. A forced cancel always succeeds and lands on the next
    /// `update`.
    pub fn cancel(&mut self, force: bool) -> bool {
        match self.main_performance_mut() {
            Some(p) => p.try_cancel(force),
            None => false,
        }
    }

    // ---- blockers ----

    /// Reference-counted: each `add_blocker` needs a matching `remove_blocker`.
    pub fn add_blocker(&mut self, token: impl Into<String>) {
        *self.blockers.entry(token.into()).or_insert(0) += 1;
    }

    pub fn remove_blocker(&mut self, token: &str) {
        if let Some(count) = self.blockers.get_mut(token) {
            *count -= 1;
            if *count == 0 {
                self.blockers.shift_remove(token);
            }
        }
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    // ---- input ----

    /// Dispatch one act. Returns whether it was accepted; debounced and ignored acts
    /// report false.
    pub fn send(&mut self, act: Act, world: &mut World) -> bool {
        matches!(self.try_send(act, world), Ok(Dispatch::Accepted))
    }

    /// Build acts from the configured settings for `title`. Without a value a press and a
    /// release are sent back to back; the result is true only if both were accepted.
    pub fn send_input(&mut self, title: &str, value: Option<bool>, world: &mut World) -> bool {
        match value {
            Some(v) => {
                let act = self.cfg.act(title, v);
                self.send(act, world)
            }
            None => {
                let press = self.cfg.act(title, true);
                let release = self.cfg.act(title, false);
                let pressed = self.send(press, world);
                let released = self.send(release, world);
                pressed && released
            }
        }
    }

    /// Dispatch one act, returning how it was handled or why it was rejected.
    pub fn try_send(&mut self, act: Act, world: &mut World) -> Result<Dispatch> {
        let is_cancel = self.cfg.is_cancel(&act.title);
        if is_cancel && !act.is_press() {
            return Ok(Dispatch::Ignored);
        }
        if !is_cancel && self.is_debounced(&act) {
            debug!("actor '{}': repeated press of '{}' ignored", self.name, act.title);
            return Ok(Dispatch::Debounced);
        }

        let result = self.dispatch(&act, world);
        match &result {
            Ok(()) => {
                debug!("actor '{}': accepted {}", self.name, describe(&act));
                self.last_failed = None;
            }
            Err(e) => {
                debug!("actor '{}': rejected {}: {e}", self.name, describe(&act));
                // A failed cancel has nothing worth replaying.
                if !is_cancel {
                    self.last_failed = Some(FailedAttempt {
                        act: act.clone(),
                        timer: BufferTimer::new(act.buffer),
                    });
                }
            }
        }
        self.last_processed = if is_cancel {
            None
        } else {
            Some(ProcessedAct {
                accepted: result.is_ok(),
                act,
            })
        };
        result.map(|()| Dispatch::Accepted)
    }

    fn is_debounced(&self, act: &Act) -> bool {
        act.is_press()
            && self.main_performance().is_some_and(|m| {
                m.state() == PerformanceState::Preparing && m.act().title == act.title
            })
    }

    fn dispatch(&mut self, act: &Act, world: &mut World) -> Result<()> {
        if !act.is_press() {
            return self.release(act);
        }
        if self.cfg.is_cancel(&act.title) {
            return self.soft_cancel();
        }
        if !self.supports_act(&act.title) {
            return Err(ActError::unsupported(act.title.clone()));
        }
        if self.is_blocked() {
            return Err(ActError::conflict(format!("actor '{}' is blocked", self.name)));
        }
        self.make_room(act)?;
        let (key, performance) = self.prepare_from_performers(act, world)?;
        self.active.push(Active {
            source: Some(key),
            performance,
        });
        Ok(())
    }

    fn soft_cancel(&mut self) -> Result<()> {
        let Some(p) = self.main_performance_mut() else {
            return Err(ActError::conflict("nothing to cancel"));
        };
        if p.try_cancel(false) {
            Ok(())
        } else {
            Err(ActError::conflict(format!(
                "'{}' cannot be cancelled while {}",
                p.name(),
                p.state()
            )))
        }
    }

    fn make_room(&mut self, act: &Act) -> Result<()> {
        let Some(main) = self.active.last_mut() else {
            return Ok(());
        };
        let p = &mut main.performance;
        if p.state().is_yielding() {
            return Ok(());
        }
        if act.interruptor && p.act().interruptable && p.try_cancel(false) {
            debug!("'{}' interrupted '{}'", act.title, p.name());
            return Ok(());
        }
        Err(ActError::conflict(format!(
            "'{}' is busy ({})",
            p.name(),
            p.state()
        )))
    }

    fn release(&mut self, act: &Act) -> Result<()> {
        let follows_press = matches!(
            &self.last_processed,
            Some(p) if p.accepted && p.act.is_press() && p.act.title == act.title
        );
        let Some(main) = self.active.last_mut() else {
            return Err(ActError::conflict("no main performance to release"));
        };
        if !follows_press {
            return Err(ActError::conflict(format!(
                "no accepted press of '{}' to release",
                act.title
            )));
        }
        if main.performance.act().title != act.title {
            return Err(ActError::conflict(format!(
                "'{}' was not started by '{}'",
                main.performance.name(),
                act.title
            )));
        }
        if main.performance.try_perform() {
            Ok(())
        } else {
            Err(ActError::conflict(format!(
                "'{}' refused release",
                main.performance.name()
            )))
        }
    }

    /// Try performers in dispatch order; the first successful prepare wins.
    fn prepare_from_performers(
        &mut self,
        act: &Act,
        world: &mut World,
    ) -> Result<(PerformerKey, Box<dyn Performance>)> {
        let mut last_err = None;
        for reg in self.performers.iter_mut() {
            if !reg.performer.supports_act(&act.title) {
                continue;
            }
            match reg.performer.try_prepare(act, world) {
                Ok(performance) => return Ok((reg.key, performance)),
                Err(e) => {
                    debug!(
                        "performer '{}' declined '{}': {e}",
                        reg.performer.name(),
                        act.title
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ActError::unsupported(act.title.clone())))
    }

    // ---- ticking ----

    /// Advance every active performance by `dt` seconds and return this tick's events.
    ///
    /// Performances pushed during the tick (by a buffered replay) start ticking on the
    /// next call.
    pub fn update(&mut self, dt: f32, world: &mut World) -> &Outputs {
        self.outputs.clear();
        self.overflowed = false;
        if let Some(attempt) = self.last_failed.as_mut() {
            attempt.timer.tick(dt);
        }

        let ids: Vec<PerformanceId> = self.active.iter().map(|a| a.performance.id()).collect();
        let mut events = Vec::new();
        for id in ids {
            let Some(entry) = self.active.iter_mut().find(|a| a.performance.id() == id) else {
                continue;
            };
            entry.performance.update(dt, world, &mut events);
            for event in events.drain(..) {
                self.handle_event(event, world);
            }
        }
        &self.outputs
    }

    /// Events produced by the last `update`.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    fn handle_event(&mut self, event: PerformanceEvent, world: &mut World) {
        let source = self
            .active
            .iter()
            .find(|a| a.performance.id() == event.performance)
            .and_then(|a| a.source);
        if let Some(key) = source {
            if let Some(reg) = self.performers.iter_mut().find(|r| r.key == key) {
                reg.performer.on_event(&event);
            }
        }
        let is_main = self
            .active
            .last()
            .is_some_and(|a| a.performance.id() == event.performance);
        let kind = event.kind;
        self.push_output(event.clone());

        match kind {
            EventKind::Updated if is_main => self.replay_buffered(world),
            EventKind::Completed => {
                self.active
                    .retain(|a| a.performance.id() != event.performance);
            }
            _ => {}
        }
    }

    fn push_output(&mut self, event: PerformanceEvent) {
        if self.outputs.events.len() >= self.cfg.max_events_per_tick {
            if !self.overflowed {
                warn!(
                    "actor '{}': more than {} events this tick; dropping the rest",
                    self.name, self.cfg.max_events_per_tick
                );
                self.overflowed = true;
            }
            return;
        }
        self.outputs.push_event(event);
    }

    fn replay_buffered(&mut self, world: &mut World) {
        let Some(attempt) = self.last_failed.as_ref() else {
            return;
        };
        if !attempt.timer.started {
            return;
        }
        let held = attempt.act.is_press();
        if !held && attempt.timer.expired() {
            debug!("actor '{}': buffered '{}' expired", self.name, attempt.act.title);
            self.last_failed = None;
            return;
        }
        let attempt = attempt.clone();
        let remaining = attempt.timer.remaining.max(0.0);
        debug!(
            "actor '{}': replaying buffered '{}' ({remaining}s left)",
            self.name, attempt.act.title
        );
        let press = attempt.act.with_value(true).buffered(remaining);
        let _ = self.try_send(press, world);
        if !held {
            let release = attempt.act.buffered(remaining);
            let _ = self.try_send(release, world);
        }
    }

    // ---- diagnostics ----

    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            name: self.name.clone(),
            state: self.state(),
            blockers: self.blockers.keys().cloned().collect(),
            performers: self
                .performers
                .iter()
                .map(|r| (r.performer.name().to_string(), r.performer.priority()))
                .collect(),
            stack: self
                .active
                .iter()
                .map(|a| {
                    let p = &a.performance;
                    ActiveSummary {
                        id: p.id(),
                        act: p.act().title.clone(),
                        name: p.name().to_string(),
                        state: p.state(),
                        run_time: p.run_time(),
                        canceled: p.is_canceled(),
                    }
                })
                .collect(),
            pending: self.last_failed.clone(),
        }
    }
}

fn describe(act: &Act) -> String {
    let edge = if act.is_press() { "press" } else { "release" };
    format!("{edge} of '{}'", act.title)
}

/// An actor nested inside another actor routes prepares to its own performers, honouring
/// its own blockers, and forwards lifecycle events to the performer that created each
/// performance.
impl Performer for Actor {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supports_act(&self, title: &str) -> bool {
        self.cfg.is_cancel(title)
            || self
                .performers
                .iter()
                .any(|r| r.performer.supports_act(title))
    }

    fn supported_acts(&self) -> Vec<String> {
        let mut acts: Vec<String> = Vec::new();
        for r in &self.performers {
            for title in r.performer.supported_acts() {
                if !acts.contains(&title) {
                    acts.push(title);
                }
            }
        }
        acts
    }

    /// Main performance state, else the newest performance handed out while nested,
    /// else `Inactive`.
    fn state(&self) -> PerformanceState {
        if let Some(main) = self.main_performance() {
            return main.state();
        }
        self.live
            .last()
            .map(|(_, s)| *s)
            .unwrap_or(PerformanceState::Inactive)
    }

    fn try_prepare(&mut self, act: &Act, world: &mut World) -> Result<Box<dyn Performance>> {
        if self.is_blocked() {
            return Err(ActError::conflict(format!("actor '{}' is blocked", self.name)));
        }
        let (key, performance) = self.prepare_from_performers(act, world)?;
        self.spawned.insert(performance.id(), key);
        self.live.push((performance.id(), performance.state()));
        Ok(performance)
    }

    fn detach(&mut self) {
        for reg in self.performers.iter_mut() {
            reg.performer.detach();
        }
        self.spawned.clear();
        self.live.clear();
    }

    fn on_event(&mut self, event: &PerformanceEvent) {
        if let Some(key) = self.spawned.get(&event.performance).copied() {
            if let Some(reg) = self.performers.iter_mut().find(|r| r.key == key) {
                reg.performer.on_event(event);
            }
        }
        if event.kind == EventKind::Completed {
            self.spawned.remove(&event.performance);
            self.live.retain(|(id, _)| *id != event.performance);
        } else if let Some(entry) = self.live.iter_mut().find(|(id, _)| *id == event.performance) {
            entry.1 = event.state;
        }
    }
}
