//! Settlement detection with hysteresis.
//!
//! A die balanced on an edge can read near-zero velocity for an instant
//! before tipping, so a single stillness check is not enough: every body must
//! stay below both velocity epsilons continuously for a hold window. The
//! detector is an explicit state machine driven by the engine's simulated
//! clock; `stable_since` is the whole state. Polling runs on its own cadence,
//! decoupled from the physics step rate, and a hard deadline bounds the total
//! wait so a simulation that never converges fails the roll instead of
//! hanging.

use tracing::debug;

use crate::config::SettleConfig;

/// Outcome of one settlement poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleVerdict {
    /// Keep stepping and polling.
    Pending,
    /// Every body has been still for the full hold window. Terminal.
    Settled,
    /// The deadline passed without a completed hold window. Terminal.
    TimedOut,
}

#[derive(Debug)]
pub struct SettleDetector {
    config: SettleConfig,
    /// Simulated time at which all bodies were first simultaneously still,
    /// or `None` while any body is still moving.
    stable_since: Option<f64>,
    next_poll_at: f64,
    deadline: f64,
    finished: bool,
}

impl SettleDetector {
    /// `now` is the simulated time the session started at.
    pub fn new(config: SettleConfig, now: f64) -> Self {
        Self {
            config,
            stable_since: None,
            next_poll_at: now,
            deadline: now + config.max_wait_secs,
            finished: false,
        }
    }

    pub fn config(&self) -> &SettleConfig {
        &self.config
    }

    /// True once per poll interval; between polls the engine skips the
    /// (cheap but pointless) stillness scan entirely.
    pub fn poll_due(&self, now: f64) -> bool {
        !self.finished && now >= self.next_poll_at
    }

    /// Speed test a single body must pass to count as still.
    pub fn is_still(&self, linear_speed: f32, angular_speed: f32) -> bool {
        linear_speed < self.config.linear_eps && angular_speed < self.config.angular_eps
    }

    /// Apply the transition table for one poll. `all_still` is the
    /// conjunction of [`is_still`](Self::is_still) over every body in the
    /// session.
    pub fn observe(&mut self, now: f64, all_still: bool) -> SettleVerdict {
        if self.finished {
            return SettleVerdict::Pending;
        }
        self.next_poll_at = now + self.config.poll_interval_secs;

        if !all_still {
            if self.stable_since.is_some() {
                debug!(now, "hold window broken, resetting");
            }
            self.stable_since = None;
        } else {
            match self.stable_since {
                None => {
                    self.stable_since = Some(now);
                }
                Some(since) if now - since >= self.config.hold_secs => {
                    debug!(now, held = now - since, "all dice settled");
                    self.finished = true;
                    return SettleVerdict::Settled;
                }
                Some(_) => {}
            }
        }

        if now >= self.deadline {
            debug!(now, "settlement deadline passed");
            self.finished = true;
            return SettleVerdict::TimedOut;
        }
        SettleVerdict::Pending
    }
}
