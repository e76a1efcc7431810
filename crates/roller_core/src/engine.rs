//! The dice engine: spawns roll sessions into the physics world, watches
//! them settle, and completes each roll with the resolved face values.
//!
//! One engine value owns the world, the active session, the RNG and the
//! simulated clock; there is no process-wide state. The caller drives it
//! from whatever update loop it has (`update(dt)` once per tick) and awaits
//! or polls the receiver returned by [`DiceEngine::start_roll`].

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rapier3d::prelude as rapier;
use rapier::nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info, warn};

use roller_physics::PhysicsWorld;

use crate::config::{DieSpec, EngineConfig};
use crate::error::RollError;
use crate::faces::resolve_face;
use crate::session::{OutcomeReceiver, RollSession};
use crate::settle::{SettleDetector, SettleVerdict};

/// Initial placement of one die.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiePose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl DiePose {
    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Identity orientation at the given position. Dropped from rest this
    /// pose settles showing 5 (the +Y face of the canonical table).
    pub fn upright(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }
}

/// Per-die pose for a renderer to copy onto its visual representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    /// Index in spawn order, stable across the session's lifetime.
    pub die_index: usize,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub sleeping: bool,
}

/// Session lifecycle notifications, for a UI layer to gate its own state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RollStarted { session: u64, count: usize },
    RollSettled { session: u64, values: Vec<u8> },
    RollTimedOut { session: u64 },
}

pub struct DiceEngine {
    world: PhysicsWorld,
    config: EngineConfig,
    die: Option<DieSpec>,
    session: Option<RollSession>,
    rng: StdRng,
    /// Simulated time in seconds, the sum of all `update` deltas.
    clock: f64,
    next_session_id: u64,
    events: Vec<EngineEvent>,
}

impl DiceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Seeded construction pins spawn positions and orientations, for
    /// replays and tests.
    pub fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        let mut world = PhysicsWorld::new(Vector3::from(config.gravity));
        world.set_solver_iterations(config.solver_iterations);
        world.add_ground_plane(config.ground.into());
        Self {
            world,
            config,
            die: None,
            session: None,
            rng,
            clock: 0.0,
            next_session_id: 0,
            events: Vec::new(),
        }
    }

    /// Register the die geometry. Until this is called every roll fails with
    /// [`RollError::NotReady`] (the model asset may still be loading).
    pub fn load_die(&mut self, spec: DieSpec) {
        self.die = Some(spec);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Dynamic bodies currently in the world (dice only, the ground is
    /// static).
    pub fn live_dice(&self) -> usize {
        self.world.dynamic_body_count()
    }

    /// Throw `count` dice and get a receiver for the resolved face values.
    ///
    /// Any previous session's bodies are removed first, even if that roll
    /// never completed; its receiver observes `Canceled`. Validation errors
    /// reject before the world is touched.
    pub fn start_roll(&mut self, count: i32) -> Result<OutcomeReceiver, RollError> {
        if count < 1 {
            return Err(RollError::InvalidCount(count));
        }
        let die = self.die.ok_or(RollError::NotReady)?;
        let poses: Vec<DiePose> = (0..count).map(|_| self.sample_pose()).collect();
        Ok(self.spawn_session(die, &poses))
    }

    /// Throw dice at explicit poses (scripted drops and replays). The batch
    /// must be non-empty.
    pub fn start_roll_from(&mut self, poses: &[DiePose]) -> Result<OutcomeReceiver, RollError> {
        if poses.is_empty() {
            return Err(RollError::InvalidCount(0));
        }
        let die = self.die.ok_or(RollError::NotReady)?;
        Ok(self.spawn_session(die, poses))
    }

    /// Horizontal position uniform over the spawn square, fixed drop height,
    /// orientation from three independent Euler angles in [0, TAU). The
    /// Euler sampling is deliberately kept from the reference behavior even
    /// though it is not uniform over the rotation group; changing it would
    /// change the outcome distribution.
    fn sample_pose(&mut self) -> DiePose {
        let h = self.config.spawn_half_extent;
        let (x, z) = if h > 0.0 {
            (self.rng.gen_range(-h..h), self.rng.gen_range(-h..h))
        } else {
            (0.0, 0.0)
        };
        let rotation = UnitQuaternion::from_euler_angles(
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
        );
        DiePose::new(Vector3::new(x, self.config.drop_height, z), rotation)
    }

    fn spawn_session(&mut self, die: DieSpec, poses: &[DiePose]) -> OutcomeReceiver {
        self.clear_session();

        let half = Vector3::new(die.half_extent, die.half_extent, die.half_extent);
        let dice: Vec<rapier::RigidBodyHandle> = poses
            .iter()
            .map(|pose| {
                self.world.spawn_cuboid(
                    half,
                    die.mass,
                    pose.position,
                    pose.rotation,
                    die.contact_params(),
                )
            })
            .collect();

        let id = self.next_session_id;
        self.next_session_id += 1;
        let detector = SettleDetector::new(self.config.settle, self.clock);
        let (session, receiver) = RollSession::new(id, dice, detector);

        info!(session = id, count = poses.len(), "roll started");
        self.events.push(EngineEvent::RollStarted {
            session: id,
            count: poses.len(),
        });
        self.session = Some(session);
        receiver
    }

    /// Remove the active session's bodies and drop it. Dropping the session
    /// drops its sender, which cancels a still-pending receiver.
    fn clear_session(&mut self) {
        if let Some(old) = self.session.take() {
            if !old.is_complete() {
                debug!(session = old.id(), "superseding unfinished roll");
            }
            for handle in old.dice() {
                self.world.remove_body(*handle);
            }
        }
    }

    /// Advance the simulation by `dt` seconds and run the settlement poll if
    /// one is due. Call once per tick of the outer update loop.
    pub fn update(&mut self, dt: f64) {
        self.clock += dt.max(0.0);
        self.world.step(dt as f32);

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_complete() || !session.detector.poll_due(self.clock) {
            return;
        }

        let all_still = session.dice().iter().all(|handle| {
            match self.world.body(*handle) {
                Some(body) => session
                    .detector
                    .is_still(body.linvel().norm(), body.angvel().norm()),
                // A vanished body cannot move.
                None => true,
            }
        });

        match session.detector.observe(self.clock, all_still) {
            SettleVerdict::Pending => {}
            SettleVerdict::Settled => {
                let values: Vec<u8> = session
                    .dice()
                    .iter()
                    .filter_map(|handle| self.world.body(*handle))
                    .map(|body| resolve_face(body.rotation()))
                    .collect();
                info!(session = session.id(), ?values, "roll settled");
                self.events.push(EngineEvent::RollSettled {
                    session: session.id(),
                    values: values.clone(),
                });
                session.complete(Ok(values));
            }
            SettleVerdict::TimedOut => {
                let waited = self.config.settle.max_wait_secs;
                warn!(session = session.id(), waited, "roll timed out");
                self.events.push(EngineEvent::RollTimedOut {
                    session: session.id(),
                });
                // Bodies stay in the world for inspection; the next roll
                // clears them.
                session.complete(Err(RollError::SettleTimeout {
                    waited_secs: waited,
                }));
            }
        }
    }

    /// Current pose of every live die in the active session, in spawn order.
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        session
            .dice()
            .iter()
            .enumerate()
            .filter_map(|(die_index, handle)| {
                self.world.body(*handle).map(|body| BodySnapshot {
                    die_index,
                    position: *body.translation(),
                    rotation: *body.rotation(),
                    sleeping: body.is_sleeping(),
                })
            })
            .collect()
    }

    /// Take all pending lifecycle events, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
