//! Benchmark profiles for the Torque physics façade.
//!
//! - [`bench_config`]: fixed 60 Hz steps, zero gravity, 1 MiB step block
//! - [`crowd_profile`]: a seeded cloud of overlapping spheres
//! - [`trigger_profile`]: one large trigger volume over a crowd

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use torque_arena::ScratchConfig;
use torque_core::{BodyDesc, BodyHandle, ColliderShape, PhysicsBackend, Vec3};
use torque_engine::{LogSink, PhysicsWorld, Timestep, WorldConfig};
use torque_test_utils::scatter_spheres;

/// Handle given to the trigger volume in [`trigger_profile`].
pub const TRIGGER_HANDLE: BodyHandle = BodyHandle(0);

/// Sink that drops everything; keeps formatting out of the measurement.
#[derive(Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn message(&self, _text: &str) {}
    fn error(&self, _text: &str) {}
}

/// World configuration used by every benchmark.
pub fn bench_config() -> WorldConfig {
    WorldConfig {
        timestep: Timestep::Fixed { frame_rate: 60 },
        gravity: Vec3::ZERO,
        scratch: ScratchConfig {
            minimum_block_size: 256 * 1024,
            reserve_size: 64 * 1024 * 1024,
            step_block_size: 1024 * 1024,
            step_block_alignment: 16,
        },
        ..WorldConfig::default()
    }
    .with_log_sink(std::sync::Arc::new(NullSink))
}

/// `count` spheres packed densely enough that most touch a neighbour.
///
/// Handles start at 1.
pub fn crowd_profile(seed: u64, count: u32) -> Vec<(BodyHandle, BodyDesc)> {
    let extent = (count as f32).cbrt().max(1.0);
    scatter_spheres(seed, count, 1, extent, 0.6)
}

/// [`crowd_profile`] plus a fixed trigger cube covering its centre.
pub fn trigger_profile(seed: u64, count: u32) -> Vec<(BodyHandle, BodyDesc)> {
    let mut bodies = crowd_profile(seed, count);
    let half = (count as f32).cbrt().max(1.0) * 0.5;
    bodies.push((
        TRIGGER_HANDLE,
        BodyDesc::fixed(ColliderShape::cuboid(half, half, half)).trigger(),
    ));
    bodies
}

/// Build a world over `backend` and populate it with `bodies`.
pub fn populate<B: PhysicsBackend>(
    backend: B,
    bodies: Vec<(BodyHandle, BodyDesc)>,
) -> Result<PhysicsWorld<B>, Box<dyn std::error::Error>> {
    let world = PhysicsWorld::new(bench_config(), backend)?;
    for (handle, desc) in bodies {
        world.add_body(handle, desc, None)?;
    }
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use torque_test_utils::ScriptedBackend;

    #[test]
    fn profiles_are_deterministic() {
        assert_eq!(crowd_profile(9, 64), crowd_profile(9, 64));
        let triggered = trigger_profile(9, 64);
        assert_eq!(triggered.len(), 65);
        assert_eq!(triggered.last().map(|(h, _)| *h), Some(TRIGGER_HANDLE));
    }

    #[test]
    fn crowd_produces_contacts() {
        let world = populate(ScriptedBackend::new(), crowd_profile(3, 128)).unwrap();
        let report = world.update(0.0).unwrap();
        assert!(report.metrics.collision_enter_events > 0);
    }

    #[test]
    fn config_is_valid() {
        bench_config().validate().unwrap();
    }
}
