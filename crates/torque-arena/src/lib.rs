//! Reserved-address-space scratch arena for per-step physics memory.
//!
//! A physics step needs a large block of transient memory that is thrown
//! away as soon as the step returns. [`ScratchAllocator`] reserves one
//! large virtual range up front and hands out bump-allocated blocks from
//! it, committing physical pages lazily in coarse chunks. Resetting the
//! arena is a single store; no per-block bookkeeping exists.
//!
//! # Architecture
//!
//! ```text
//! ScratchAllocator
//! └── Mutex<ArenaState>
//!     ├── Region (raw.rs)   reserve / commit / release pages
//!     └── current offset    0 <= current <= committed <= reserved
//! ```
//!
//! This is the only crate in the workspace that contains `unsafe` code,
//! and all of it lives in the private `raw` module.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod raw;
pub mod scratch;

pub use config::ScratchConfig;
pub use error::ScratchError;
pub use scratch::{align_up, ScratchAllocator, ScratchBlock, ScratchMarker};
