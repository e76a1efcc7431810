//! Rigid-body world for the dice roller, built on rapier3d.
//!
//! Owns the whole rapier pipeline bundle and advances it with a fixed-timestep
//! accumulator so callers can feed it whatever frame delta their update loop
//! measures. Dice and the ground plane all share one contact material.

use std::num::NonZeroUsize;

use rapier3d::prelude as rapier;
use rapier::nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use tracing::trace;

/// Nominal physics tick (seconds). Frame deltas are consumed in substeps of
/// this length.
pub const NOMINAL_DT: f32 = 1.0 / 60.0;

/// Upper bound on substeps consumed per `step` call. Time beyond this budget
/// is dropped, so a long frame hitch cannot fire an explosive catch-up step.
pub const MAX_SUBSTEPS: u32 = 3;

/// Friction/restitution applied to every collider in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactParams {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.7,
        }
    }
}

pub struct PhysicsWorld {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    accumulator: f32,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        let mut integration_parameters = rapier::IntegrationParameters::default();
        integration_parameters.dt = NOMINAL_DT;
        Self {
            gravity,
            integration_parameters,
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            accumulator: 0.0,
        }
    }

    pub fn set_solver_iterations(&mut self, iterations: usize) {
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations).unwrap_or(NonZeroUsize::MIN);
    }

    /// Static ground at y = 0 (top surface), wide enough that dice never
    /// tumble off the edge.
    pub fn add_ground_plane(&mut self, params: ContactParams) -> rapier::RigidBodyHandle {
        let ground_body =
            rapier::RigidBodyBuilder::fixed().translation(Vector3::new(0.0, -0.5, 0.0));
        let ground_handle = self.rigid_body_set.insert(ground_body);
        let ground_collider = rapier::ColliderBuilder::cuboid(50.0, 0.5, 50.0)
            .friction(params.friction)
            .restitution(params.restitution);
        self.collider_set.insert_with_parent(
            ground_collider,
            ground_handle,
            &mut self.rigid_body_set,
        );
        ground_handle
    }

    /// Dynamic box body at the given pose, at rest.
    pub fn spawn_cuboid(
        &mut self,
        half_extents: Vector3<f32>,
        mass: f32,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        params: ContactParams,
    ) -> rapier::RigidBodyHandle {
        let pose = Isometry3::from_parts(Translation3::from(position), rotation);
        let body = rapier::RigidBodyBuilder::dynamic().position(pose);
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .mass(mass)
            .friction(params.friction)
            .restitution(params.restitution);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Detach a body and its colliders. Stale handles are a no-op.
    pub fn remove_body(&mut self, handle: rapier::RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn body(&self, handle: rapier::RigidBodyHandle) -> Option<&rapier::RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn contains(&self, handle: rapier::RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Count of dynamic bodies (the ground plane is fixed and excluded).
    pub fn dynamic_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .count()
    }

    /// Advance the world by `dt` seconds of wall time, consumed in fixed
    /// `NOMINAL_DT` substeps (at most `MAX_SUBSTEPS` per call). `dt <= 0` is
    /// a no-op, so the first frame of a clock can pass zero safely.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.accumulator += dt.min(NOMINAL_DT * MAX_SUBSTEPS as f32);
        let mut substeps = 0;
        while self.accumulator >= NOMINAL_DT && substeps < MAX_SUBSTEPS {
            self.step_once();
            self.accumulator -= NOMINAL_DT;
            substeps += 1;
        }
        if substeps > 0 {
            trace!(substeps, "physics stepped");
        }
        // Drop any backlog the substep budget did not cover.
        if self.accumulator >= NOMINAL_DT {
            self.accumulator %= NOMINAL_DT;
        }
    }

    fn step_once(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(Vector3::new(0.0, -9.82, 0.0));
        world.add_ground_plane(ContactParams::default());
        world
    }

    #[test]
    fn zero_dt_is_a_noop() {
        let mut world = test_world();
        let handle = world.spawn_cuboid(
            Vector3::new(0.25, 0.25, 0.25),
            1.0,
            Vector3::new(0.0, 3.0, 0.0),
            UnitQuaternion::identity(),
            ContactParams::default(),
        );
        world.step(0.0);
        let body = world.body(handle).unwrap();
        assert_eq!(body.translation().y, 3.0, "body must not move on dt == 0");
    }

    #[test]
    fn gravity_pulls_a_spawned_body_down() {
        let mut world = test_world();
        let handle = world.spawn_cuboid(
            Vector3::new(0.25, 0.25, 0.25),
            1.0,
            Vector3::new(0.0, 3.0, 0.0),
            UnitQuaternion::identity(),
            ContactParams::default(),
        );
        for _ in 0..30 {
            world.step(NOMINAL_DT);
        }
        let body = world.body(handle).unwrap();
        assert!(
            body.translation().y < 3.0,
            "body should have fallen, y = {}",
            body.translation().y
        );
    }

    #[test]
    fn removing_a_stale_handle_is_a_noop() {
        let mut world = test_world();
        let handle = world.spawn_cuboid(
            Vector3::new(0.25, 0.25, 0.25),
            1.0,
            Vector3::new(0.0, 3.0, 0.0),
            UnitQuaternion::identity(),
            ContactParams::default(),
        );
        world.remove_body(handle);
        assert!(!world.contains(handle));
        // Second removal must be tolerated.
        world.remove_body(handle);
        assert_eq!(world.dynamic_body_count(), 0);
    }

    #[test]
    fn large_dt_is_clamped_to_the_substep_budget() {
        let mut world = test_world();
        let handle = world.spawn_cuboid(
            Vector3::new(0.25, 0.25, 0.25),
            1.0,
            Vector3::new(0.0, 100.0, 0.0),
            UnitQuaternion::identity(),
            ContactParams::default(),
        );
        // A 10 s hitch must advance at most MAX_SUBSTEPS nominal ticks.
        world.step(10.0);
        let free_fall_cap =
            0.5 * 9.82 * (NOMINAL_DT * MAX_SUBSTEPS as f32) * (NOMINAL_DT * MAX_SUBSTEPS as f32);
        let fallen = 100.0 - world.body(handle).unwrap().translation().y;
        assert!(
            fallen <= free_fall_cap + 0.05,
            "hitch integrated too much time, fell {fallen}"
        );
    }
}
