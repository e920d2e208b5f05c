//! Test utilities for Torque development.
//!
//! - [`ScriptedBackend`]: deterministic brute-force backend with report
//!   and failure injection.
//! - [`RecordingListener`] / [`RecordingLogSink`]: capture hook calls and
//!   log output.
//! - [`fixtures`]: small-footprint configs and seeded scene layouts.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod fixtures;
pub mod recording;

pub use backend::{Scripted, ScriptedBackend};
pub use fixtures::{
    init_logging, scatter_spheres, scripted_world, small_scratch, test_config, world_logging_to,
    world_with,
};
pub use recording::{Hook, RecordingListener, RecordingLogSink};
