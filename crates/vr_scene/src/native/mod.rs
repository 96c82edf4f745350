//! Native engine boundary
//!
//! [`NativeBackend`] is the only way results leave the scene graph.
//! [`RecordingBackend`] keeps everything in memory.

pub mod backend;
pub mod recording;

pub use backend::{GeometrySource, NativeBackend, NativeHandle, StereoMode};
pub use recording::{BackendStats, RecordingBackend};
