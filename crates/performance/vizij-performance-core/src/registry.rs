//! MoveRegistry: dynamic priority table mapping act titles to the best available move.
//!
//! Entries are keyed by `(act, context)`. A context is an opaque owner token: base movesets
//! register under a `Named` context, and every performance this registry creates registers
//! its follow-ups under `MoveContext::Performance(id)`. Those follow-ups are dropped when
//! that performance completes.
//!
//! The resolved [`MoveRegistry::moveset`] is recomputed after every mutation and whenever
//! the registry's aggregate state changes. Among the entries whose state mask contains the
//! current state, the highest priority wins; ties go to the most recently added entry.
//! Use [`MoveRegistry::batch`] to apply many mutations with a single resolve.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::act::Act;
use crate::config::Config;
use crate::error::{ActError, Result};
use crate::ids::PerformanceId;
use crate::move_performer::MovePerformer;
use crate::moves::PerformanceMove;
use crate::moveset_json::MovesetDef;
use crate::outputs::{EventKind, PerformanceEvent};
use crate::performer::{Performance, Performer};
use crate::state::{PerformanceState, StateMask};
use crate::world::World;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveContext {
    Named(String),
    Performance(PerformanceId),
}

impl From<&str> for MoveContext {
    fn from(s: &str) -> Self {
        MoveContext::Named(s.to_string())
    }
}

#[derive(Clone, Debug)]
struct MoveEntry {
    context: MoveContext,
    states: StateMask,
    mv: Arc<PerformanceMove>,
    priority: i32,
    /// Insertion order; later entries win priority ties.
    seq: u64,
}

#[derive(Debug)]
pub struct MoveRegistry {
    name: String,
    priority: i32,
    cfg: Config,
    table: IndexMap<String, Vec<MoveEntry>>,
    moveset: IndexMap<String, Arc<PerformanceMove>>,
    next_seq: u64,
    batch_depth: u32,
    dirty: bool,
    /// Performances created here that have not completed, oldest first.
    live: Vec<(PerformanceId, PerformanceState)>,
}

impl MoveRegistry {
    pub fn new(name: impl Into<String>, priority: i32, cfg: Config) -> Self {
        Self {
            name: name.into(),
            priority,
            cfg,
            table: IndexMap::new(),
            moveset: IndexMap::new(),
            next_seq: 0,
            batch_depth: 0,
            dirty: false,
            live: Vec::new(),
        }
    }

    /// Registry pre-filled from an authored moveset, registered under the moveset's name.
    pub fn from_moveset(def: &MovesetDef, cfg: Config) -> Self {
        let mut reg = Self::new(def.name.clone(), def.priority, cfg);
        reg.load_moveset(def);
        reg
    }

    /// Register every move of `def` under `MoveContext::Named(def.name)` with one resolve.
    pub fn load_moveset(&mut self, def: &MovesetDef) {
        let context = MoveContext::Named(def.name.clone());
        self.batch(|reg| {
            for m in &def.moves {
                reg.add_move(
                    m.act.clone(),
                    context.clone(),
                    m.states,
                    Arc::new(m.mv.clone()),
                    m.priority,
                );
            }
        });
    }

    /// Insert or replace the entry for `(act, context)`.
    pub fn add_move(
        &mut self,
        act: impl Into<String>,
        context: MoveContext,
        states: StateMask,
        mv: Arc<PerformanceMove>,
        priority: i32,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = MoveEntry {
            context,
            states,
            mv,
            priority,
            seq,
        };
        let entries = self.table.entry(act.into()).or_default();
        match entries.iter_mut().find(|e| e.context == entry.context) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.touch();
    }

    /// Base move available whenever this registry is idle or winding down.
    pub fn add(&mut self, act: impl Into<String>, mv: PerformanceMove) {
        let context = MoveContext::Named(self.name.clone());
        self.add_move(act, context, StateMask::IDLE, Arc::new(mv), 0);
    }

    /// Remove the entry for `(act, context)`. Returns whether one existed.
    pub fn remove_move(&mut self, act: &str, context: &MoveContext) -> bool {
        let Some(entries) = self.table.get_mut(act) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| &e.context != context);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.table.shift_remove(act);
        }
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove every entry registered under `context`. Returns how many were removed.
    pub fn remove_context(&mut self, context: &MoveContext) -> usize {
        let mut removed = 0;
        self.table.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| &e.context != context);
            removed += before - entries.len();
            !entries.is_empty()
        });
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Run `f` with resolve deferred until it returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let out = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.dirty {
            self.resolve();
        }
        out
    }

    fn touch(&mut self) {
        self.dirty = true;
        if self.batch_depth == 0 {
            self.resolve();
        }
    }

    /// Recompute the moveset against the current aggregate state.
    pub fn resolve(&mut self) {
        let state = self.current_state();
        self.moveset.clear();
        for (act, entries) in &self.table {
            let best = entries
                .iter()
                .filter(|e| e.states.contains(state))
                .max_by_key(|e| (e.priority, e.seq));
            if let Some(e) = best {
                self.moveset.insert(act.clone(), e.mv.clone());
            }
        }
        self.dirty = false;
    }

    /// Resolved best-candidate move per act title.
    pub fn moveset(&self) -> &IndexMap<String, Arc<PerformanceMove>> {
        &self.moveset
    }

    pub fn resolved(&self, act: &str) -> Option<&Arc<PerformanceMove>> {
        self.moveset.get(act)
    }

    /// Number of `(act, context)` entries in the table.
    pub fn entry_count(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn has_context(&self, context: &MoveContext) -> bool {
        self.table
            .values()
            .any(|entries| entries.iter().any(|e| &e.context == context))
    }

    /// State of the most recent live performance, or `Inactive` when idle.
    pub fn current_state(&self) -> PerformanceState {
        self.live
            .last()
            .map(|(_, s)| *s)
            .unwrap_or(PerformanceState::Inactive)
    }

    fn check_requirements(mv: &PerformanceMove, act: &Act, world: &World) -> Result<()> {
        if let Some(flag) = mv.requires.iter().find(|f| !world.has_condition(f)) {
            return Err(ActError::conflict(format!(
                "'{}' requires condition '{}'",
                act.title, flag
            )));
        }
        for cost in &mv.costs {
            // Only the starting threshold is gated; costs may overdraw the stat.
            if let Some(stat) = world.stats.get(&cost.stat) {
                if stat.value() <= 0.0 {
                    return Err(ActError::ResourceInsufficient {
                        stat: cost.stat.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Performer for MoveRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supports_act(&self, title: &str) -> bool {
        self.moveset.contains_key(title)
    }

    fn supported_acts(&self) -> Vec<String> {
        self.moveset.keys().cloned().collect()
    }

    fn state(&self) -> PerformanceState {
        self.current_state()
    }

    fn try_prepare(&mut self, act: &Act, world: &mut World) -> Result<Box<dyn Performance>> {
        let Some(mv) = self.moveset.get(&act.title).cloned() else {
            return Err(ActError::unsupported(act.title.clone()));
        };
        Self::check_requirements(&mv, act, world)?;

        let id = world.alloc_performance();
        let performer = MovePerformer::new(id, act.clone(), mv.clone(), &self.cfg);
        debug!(
            "registry '{}' prepared '{}' for act '{}' as {:?}",
            self.name, mv.name, act.title, id
        );
        self.live.push((id, performer.state()));
        self.dirty = true;
        self.batch(|reg| {
            for f in &mv.follow_ups {
                reg.add_move(
                    f.act.clone(),
                    MoveContext::Performance(id),
                    f.states,
                    f.mv.clone(),
                    f.priority,
                );
            }
        });
        Ok(Box::new(performer))
    }

    fn detach(&mut self) {
        let live = std::mem::take(&mut self.live);
        debug!(
            "registry '{}' detached with {} live performance(s)",
            self.name,
            live.len()
        );
        self.batch(|reg| {
            for (id, _) in &live {
                reg.remove_context(&MoveContext::Performance(*id));
            }
            reg.dirty = true;
        });
    }

    fn on_event(&mut self, event: &PerformanceEvent) {
        let Some(pos) = self
            .live
            .iter()
            .position(|(id, _)| *id == event.performance)
        else {
            return;
        };
        match event.kind {
            EventKind::Completed => {
                self.live.remove(pos);
                self.batch(|reg| {
                    reg.remove_context(&MoveContext::Performance(event.performance));
                    reg.dirty = true;
                });
            }
            EventKind::Updated | EventKind::Started => {
                let before = self.current_state();
                self.live[pos].1 = event.state;
                if self.current_state() != before {
                    self.resolve();
                }
            }
        }
    }
}
