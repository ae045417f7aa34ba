//! Delta-sync primitives: signatures, deltas and patching.

pub mod delta;
pub mod engine;
pub mod patch;
pub mod signature;

pub use engine::{DeltaEngine, FastRsyncEngine};
pub use signature::BlockOptions;
