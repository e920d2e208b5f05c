//! Small-footprint configs, logging setup, and seeded scene layouts.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use torque_arena::ScratchConfig;
use torque_core::{BodyDesc, BodyHandle, ColliderShape, Vec3};
use torque_engine::{LogSink, PhysicsWorld, Timestep, WorldConfig};

use crate::backend::ScriptedBackend;

/// 4 MiB reserve, 64 KiB commits, 16 KiB step block.
pub fn small_scratch() -> ScratchConfig {
    ScratchConfig {
        minimum_block_size: 64 * 1024,
        reserve_size: 4 * 1024 * 1024,
        step_block_size: 16 * 1024,
        step_block_alignment: 16,
    }
}

/// A variable-timestep config with zero gravity and small scratch.
pub fn test_config() -> WorldConfig {
    WorldConfig {
        timestep: Timestep::Variable,
        gravity: Vec3::ZERO,
        scratch: small_scratch(),
        ..WorldConfig::default()
    }
}

/// A world over a fresh [`ScriptedBackend`] with [`test_config`].
pub fn scripted_world() -> PhysicsWorld<ScriptedBackend> {
    world_with(ScriptedBackend::new(), test_config())
}

/// A world over `backend` with `config`, panicking on failure.
pub fn world_with(backend: ScriptedBackend, config: WorldConfig) -> PhysicsWorld<ScriptedBackend> {
    PhysicsWorld::new(config, backend).expect("test world should initialise")
}

/// A world whose messages and errors go to `sink`.
pub fn world_logging_to(sink: Arc<dyn LogSink>) -> PhysicsWorld<ScriptedBackend> {
    world_with(ScriptedBackend::new(), test_config().with_log_sink(sink))
}

/// Route `log` output to the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `count` dynamic spheres scattered deterministically inside a cube of
/// half size `extent`, with handles starting at `first`.
pub fn scatter_spheres(
    seed: u64,
    count: u32,
    first: u32,
    extent: f32,
    radius: f32,
) -> Vec<(BodyHandle, BodyDesc)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let at = Vec3::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            );
            (
                BodyHandle(first + i),
                BodyDesc::dynamic(ColliderShape::sphere(radius)).at(at),
            )
        })
        .collect()
}
