//! Tuning knobs for the dice engine.
//!
//! Defaults reproduce the reference table: gravity (0, -9.82, 0), a shared
//! contact material of friction 0.5 / restitution 0.7, dice dropped from
//! y = 3 over a 3x3 square around the origin.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use roller_physics::ContactParams;

use crate::error::ConfigError;

/// Geometry and surface of a single die. Loaded once before the first roll,
/// standing in for the asset pipeline that produces the visual die model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DieSpec {
    /// Half-extent of the cubic collider on every axis.
    pub half_extent: f32,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for DieSpec {
    fn default() -> Self {
        Self {
            half_extent: 0.25,
            mass: 1.0,
            friction: 0.5,
            restitution: 0.7,
        }
    }
}

impl DieSpec {
    pub fn contact_params(&self) -> ContactParams {
        ContactParams {
            friction: self.friction,
            restitution: self.restitution,
        }
    }
}

/// Settlement hysteresis parameters (all times in seconds of simulated time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettleConfig {
    /// A body counts as still when |linvel| is below this.
    pub linear_eps: f32,
    /// A body counts as still when |angvel| is below this.
    pub angular_eps: f32,
    /// All bodies must stay still for this long, continuously.
    pub hold_secs: f64,
    /// Cadence of the stillness check, decoupled from the step rate.
    pub poll_interval_secs: f64,
    /// Hard bound on the total wait; expiry fails the roll instead of
    /// hanging forever on a simulation that never converges.
    pub max_wait_secs: f64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            linear_eps: 0.005,
            angular_eps: 0.005,
            hold_secs: 1.0,
            poll_interval_secs: 0.2,
            max_wait_secs: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub gravity: [f32; 3],
    /// Dice spawn with x/z uniform in [-spawn_half_extent, spawn_half_extent].
    pub spawn_half_extent: f32,
    /// Fixed drop height of every spawned die.
    pub drop_height: f32,
    /// Contact material of the ground plane.
    pub ground: ContactParamsConfig,
    pub solver_iterations: usize,
    pub settle: SettleConfig,
}

/// Serde-friendly mirror of [`ContactParams`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactParamsConfig {
    pub friction: f32,
    pub restitution: f32,
}

impl From<ContactParamsConfig> for ContactParams {
    fn from(c: ContactParamsConfig) -> Self {
        ContactParams {
            friction: c.friction,
            restitution: c.restitution,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
            spawn_half_extent: 1.5,
            drop_height: 3.0,
            ground: ContactParamsConfig {
                friction: 0.5,
                restitution: 0.7,
            },
            solver_iterations: 4,
            settle: SettleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file, e.g. a table tuned for heavier dice.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_table() {
        let config = EngineConfig::default();
        assert_eq!(config.gravity, [0.0, -9.82, 0.0]);
        assert_eq!(config.drop_height, 3.0);
        assert_eq!(config.spawn_half_extent, 1.5);
        assert_eq!(config.settle.linear_eps, 0.005);
        assert_eq!(config.settle.angular_eps, 0.005);
        assert_eq!(config.settle.hold_secs, 1.0);
        assert_eq!(config.settle.poll_interval_secs, 0.2);

        let die = DieSpec::default();
        assert_eq!(die.half_extent, 0.25);
        assert_eq!(die.mass, 1.0);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
