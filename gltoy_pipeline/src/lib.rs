//! Shader programs, static geometry and the per-frame loop, kept apart from any window system.
//!
//! Everything here talks to the GPU through the [`device::Device`] trait, so the same code runs
//! against real OpenGL in the `gltoy` binary and against [`headless::HeadlessDevice`] in tests.

pub mod device;
pub mod frame;
pub mod geometry;
pub mod headless;
pub mod input;
pub mod shader;

pub use device::{Device, Topology, UniformValue, VertexAttribute, Viewport};
pub use frame::{FrameConfig, FrameLoop, FrameStatus, ProgramSource};
pub use geometry::{Geometry, GeometryKind};
pub use input::{FrameState, Key, KeyEdge, KeyToggle};
pub use shader::{Diagnostics, ShaderProgram};
