//! Vizij Performance Core (engine-agnostic)
//!
//! Arbitrates which of several competing performances (attacks, guards, dashes, ...) an
//! agent may run in response to discrete input acts, and drives each chosen performance
//! through its charge → perform → release → complete lifecycle.
//!
//! The crate is tick-driven and single-threaded: a host calls [`Actor::send`] for each
//! input edge and [`Actor::update`] once per frame. Stats, condition flags and id
//! allocation live in an explicit [`World`] that the host passes in; there is no hidden
//! global state. Animation, physics and AI are consumers of the [`Outputs`] events and of
//! [`PerformanceMove::evaluate`].

pub mod act;
pub mod actor;
pub mod config;
pub mod error;
pub mod ids;
pub mod move_performer;
pub mod moves;
pub mod moveset_json;
pub mod outputs;
pub mod performer;
pub mod registry;
pub mod state;
pub mod world;

// Re-exports for consumers (adapters)
pub use act::{Act, ActSettings, ActValue};
pub use actor::{Actor, ActorSnapshot, Dispatch};
pub use config::Config;
pub use error::{ActError, Result};
pub use ids::{IdAllocator, PerformanceId, PerformerKey};
pub use move_performer::MovePerformer;
pub use moves::{ChargeParams, Cost, FollowUp, PerformParams, PerformanceMove, PoseSample};
pub use moveset_json::{parse_moveset_json, MoveDef, MovesetDef};
pub use outputs::{EventKind, Outputs, PerformanceEvent};
pub use performer::{Performance, Performer};
pub use registry::{MoveContext, MoveRegistry};
pub use state::{PerformanceState, StateMask};
pub use world::{Stat, Stats, World};
