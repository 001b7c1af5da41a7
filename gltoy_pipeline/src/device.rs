//! The narrow slice of a graphics API that shader programs and the frame loop need.
//!
//! Everything that touches the GPU goes through [`Device`]. The binary implements it over raw
//! OpenGL function pointers; [`crate::headless::HeadlessDevice`] implements it in software so the
//! rest of this crate can be exercised without a window or a driver.

use std::ffi::CStr;
use std::fmt;

pub type ShaderId = u32;
pub type ProgramId = u32;
pub type BufferId = u32;
pub type VertexArrayId = u32;
pub type UniformLocation = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A value that can be written into a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(f32, f32),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self { UniformValue::Bool(value) }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self { UniformValue::Int(value) }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self { UniformValue::Float(value) }
}

impl From<(f32, f32)> for UniformValue {
    fn from((x, y): (f32, f32)) -> Self { UniformValue::Vec2(x, y) }
}

/// How consecutive vertices are assembled into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    TriangleStrip,
}

/// Describes how one attribute is read out of an interleaved `f32` vertex buffer. Offsets and
/// strides are counted in floats, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub components: i32,
    pub stride: usize,
    pub offset: usize,
}

/// A rectangle of the presentation surface, in pixels, with the origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn sized(width: u32, height: u32) -> Self {
        Viewport { x: 0, y: 0, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

pub trait Device {
    fn create_shader(&self, stage: ShaderStage) -> ShaderId;

    /// Uploads `source` into `shader` and compiles it. On failure the error carries the
    /// compiler's info log.
    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> Result<(), String>;

    fn delete_shader(&self, shader: ShaderId);

    fn create_program(&self) -> ProgramId;

    fn attach_shader(&self, program: ProgramId, shader: ShaderId);

    fn detach_shader(&self, program: ProgramId, shader: ShaderId);

    /// Links `program`. On failure the error carries the linker's info log.
    fn link_program(&self, program: ProgramId) -> Result<(), String>;

    fn delete_program(&self, program: ProgramId);

    fn use_program(&self, program: ProgramId);

    /// Returns `None` when `program` has no active uniform called `name`.
    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation>;

    /// Writes `value` at `location` of the currently used program.
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    /// Uploads `vertices` into a new static buffer and records `attributes` in a new vertex
    /// array object.
    fn create_vertex_array(
        &self,
        vertices: &[f32],
        attributes: &[VertexAttribute],
    ) -> (VertexArrayId, BufferId);

    fn delete_vertex_array(&self, vertex_array: VertexArrayId, buffer: BufferId);

    fn viewport(&self, viewport: Viewport);

    fn clear(&self, color: [f32; 4]);

    fn draw_arrays(&self, vertex_array: VertexArrayId, topology: Topology, first: usize, count: usize);
}
