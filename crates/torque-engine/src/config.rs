//! World configuration, validation, and error types.
//!
//! [`WorldConfig`] is the input to [`PhysicsWorld::new`](crate::PhysicsWorld::new).
//! [`validate()`](WorldConfig::validate) checks structural invariants once at
//! startup; nothing is re-checked per step.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use torque_arena::{ScratchConfig, ScratchError};
use torque_core::{SceneDesc, Vec3};

use crate::error::StepError;
use crate::hooks::{LogCrateSink, LogSink};

// ── Timestep ──────────────────────────────────────────────────────

/// How [`update`](crate::PhysicsWorld::update) turns its `dt` argument into
/// the simulated step length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestep {
    /// Always simulate `1 / frame_rate` seconds; the caller's `dt` is
    /// ignored.
    Fixed {
        /// Steps per simulated second. Default: 60.
        frame_rate: u32,
    },
    /// Simulate exactly the caller's `dt`.
    Variable,
}

impl Timestep {
    /// Default frame rate for [`Timestep::Fixed`].
    pub const DEFAULT_FRAME_RATE: u32 = 60;

    /// The step length to simulate for a caller-supplied `dt`.
    pub fn resolve(&self, dt: f32) -> Result<f32, StepError> {
        match *self {
            Timestep::Fixed { frame_rate } => Ok(1.0 / frame_rate as f32),
            Timestep::Variable => {
                if dt.is_finite() && dt > 0.0 {
                    Ok(dt)
                } else {
                    Err(StepError::InvalidTimestep { dt })
                }
            }
        }
    }
}

impl Default for Timestep {
    fn default() -> Self {
        Timestep::Fixed {
            frame_rate: Self::DEFAULT_FRAME_RATE,
        }
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`WorldConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Scratch arena sizing is invalid.
    Scratch(ScratchError),
    /// A fixed timestep has a frame rate of zero.
    InvalidFrameRate,
    /// The backend worker pool needs at least one thread.
    ZeroWorkerThreads,
    /// Gravity has a NaN or infinite component.
    InvalidGravity {
        /// The rejected vector.
        gravity: Vec3,
    },
    /// A tolerance scale is not finite and positive.
    InvalidTolerance {
        /// Which scale: `"length"` or `"speed"`.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scratch(e) => write!(f, "scratch: {e}"),
            Self::InvalidFrameRate => write!(f, "fixed timestep frame_rate must be at least 1"),
            Self::ZeroWorkerThreads => write!(f, "worker_threads must be at least 1"),
            Self::InvalidGravity { gravity } => {
                write!(f, "gravity must be finite, got {gravity:?}")
            }
            Self::InvalidTolerance { name, value } => {
                write!(f, "tolerance_{name} must be finite and positive, got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Scratch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScratchError> for ConfigError {
    fn from(e: ScratchError) -> Self {
        Self::Scratch(e)
    }
}

// ── WorldConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a [`PhysicsWorld`](crate::PhysicsWorld).
#[derive(Clone)]
pub struct WorldConfig {
    /// Step length policy. Default: fixed at 60 Hz.
    pub timestep: Timestep,
    /// Gravity acceleration. Default: `(0, -9.81, 0)`.
    pub gravity: Vec3,
    /// Backend worker pool size. Default: 4.
    pub worker_threads: usize,
    /// Continuous collision detection for dynamic bodies. Default: on.
    pub enable_ccd: bool,
    /// Typical object length for backend tolerances. Default: 1.0.
    pub tolerance_length: f32,
    /// Typical object speed for backend tolerances. Default: 9.81.
    pub tolerance_speed: f32,
    /// Scratch arena sizing.
    pub scratch: ScratchConfig,
    /// Where world messages and backend errors go. Default: [`LogCrateSink`].
    pub log_sink: Arc<dyn LogSink>,
}

impl WorldConfig {
    /// Replace the log sink.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    /// Replace the scratch sizing.
    pub fn with_scratch(mut self, scratch: ScratchConfig) -> Self {
        self.scratch = scratch;
        self
    }

    /// Replace the timestep policy.
    pub fn with_timestep(mut self, timestep: Timestep) -> Self {
        self.timestep = timestep;
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Timestep::Fixed { frame_rate: 0 } = self.timestep {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::ZeroWorkerThreads);
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::InvalidGravity {
                gravity: self.gravity,
            });
        }
        for (name, value) in [
            ("length", self.tolerance_length),
            ("speed", self.tolerance_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        self.scratch.validate()?;
        Ok(())
    }

    /// The scene parameters handed to the backend.
    pub fn scene_desc(&self) -> SceneDesc {
        SceneDesc {
            gravity: self.gravity,
            worker_threads: self.worker_threads,
            enable_ccd: self.enable_ccd,
            tolerance_length: self.tolerance_length,
            tolerance_speed: self.tolerance_speed,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        let scene = SceneDesc::default();
        Self {
            timestep: Timestep::default(),
            gravity: scene.gravity,
            worker_threads: scene.worker_threads,
            enable_ccd: scene.enable_ccd,
            tolerance_length: scene.tolerance_length,
            tolerance_speed: scene.tolerance_speed,
            scratch: ScratchConfig::default(),
            log_sink: Arc::new(LogCrateSink),
        }
    }
}

impl fmt::Debug for WorldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldConfig")
            .field("timestep", &self.timestep)
            .field("gravity", &self.gravity)
            .field("worker_threads", &self.worker_threads)
            .field("enable_ccd", &self.enable_ccd)
            .field("tolerance_length", &self.tolerance_length)
            .field("tolerance_speed", &self.tolerance_speed)
            .field("scratch", &self.scratch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = WorldConfig::default();
        assert_eq!(c.timestep, Timestep::Fixed { frame_rate: 60 });
        assert_eq!(c.worker_threads, 4);
        assert!(c.enable_ccd);
        assert_eq!(c.scene_desc(), SceneDesc::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn fixed_timestep_ignores_caller_dt() {
        let t = Timestep::default();
        assert_eq!(t.resolve(0.5).unwrap(), 1.0 / 60.0);
        assert_eq!(t.resolve(f32::NAN).unwrap(), 1.0 / 60.0);
    }

    #[test]
    fn variable_timestep_rejects_bad_dt() {
        let t = Timestep::Variable;
        assert_eq!(t.resolve(0.02).unwrap(), 0.02);
        assert_eq!(t.resolve(0.0), Err(StepError::InvalidTimestep { dt: 0.0 }));
        assert!(t.resolve(-1.0).is_err());
        assert!(t.resolve(f32::INFINITY).is_err());
    }

    #[test]
    fn validate_rejects_each_invalid_field() {
        let c = WorldConfig::default().with_timestep(Timestep::Fixed { frame_rate: 0 });
        assert_eq!(c.validate(), Err(ConfigError::InvalidFrameRate));

        let mut c = WorldConfig::default();
        c.worker_threads = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroWorkerThreads));

        let mut c = WorldConfig::default();
        c.gravity = Vec3::new(0.0, f32::NAN, 0.0);
        assert!(matches!(c.validate(), Err(ConfigError::InvalidGravity { .. })));

        let mut c = WorldConfig::default();
        c.tolerance_speed = 0.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidTolerance {
                name: "speed",
                value: 0.0
            })
        );

        let c = WorldConfig::default().with_scratch(ScratchConfig::new(4096, 1024 * 1024));
        assert!(matches!(c.validate(), Err(ConfigError::Scratch(_))));
    }
}
