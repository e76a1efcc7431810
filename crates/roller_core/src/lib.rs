//! Core of the 3D dice roller: roll sessions, settlement detection and face
//! resolution on top of the [`roller_physics`] rigid-body world.
//!
//! The public surface is [`DiceEngine`]: load a die, call
//! [`start_roll`](DiceEngine::start_roll), drive [`update`](DiceEngine::update)
//! from the host's render/update loop, and the returned receiver completes
//! with the face values once the whole batch has settled. Rendering, UI and
//! networking live outside this crate; it only exposes per-tick body
//! snapshots and session lifecycle events for those layers to consume.

pub mod config;
pub mod engine;
pub mod error;
pub mod faces;
pub mod session;
pub mod settle;

pub use config::{ContactParams, DieSpec, EngineConfig, SettleConfig};
pub use engine::{BodySnapshot, DiceEngine, DiePose, EngineEvent};
pub use error::{ConfigError, RollError};
pub use faces::{face_for_up, resolve_face, FACE_NORMALS};
pub use session::{OutcomeReceiver, RollResult, RollSession};
pub use settle::{SettleDetector, SettleVerdict};
