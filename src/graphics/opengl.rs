use std::ffi::{c_void, CStr};
use std::mem::size_of;
use std::ptr::null;

use gl;
// NB: I don't bother with most GL types because they're all type aliases for Rust primitives
use gl::types::*;
use log::debug;

use pipeline::device::{
    BufferId, Device, ProgramId, ShaderId, ShaderStage, Topology, UniformLocation, UniformValue,
    VertexArrayId, VertexAttribute, Viewport,
};

use super::utils::*;

/// Entry points that have to resolve before anything can be drawn.
const REQUIRED: &[(&str, fn() -> bool)] = &[
    ("glCreateShader", gl::CreateShader::is_loaded),
    ("glShaderSource", gl::ShaderSource::is_loaded),
    ("glCompileShader", gl::CompileShader::is_loaded),
    ("glCreateProgram", gl::CreateProgram::is_loaded),
    ("glLinkProgram", gl::LinkProgram::is_loaded),
    ("glUseProgram", gl::UseProgram::is_loaded),
    ("glGetUniformLocation", gl::GetUniformLocation::is_loaded),
    ("glUniform1i", gl::Uniform1i::is_loaded),
    ("glUniform1f", gl::Uniform1f::is_loaded),
    ("glUniform2f", gl::Uniform2f::is_loaded),
    ("glGenVertexArrays", gl::GenVertexArrays::is_loaded),
    ("glGenBuffers", gl::GenBuffers::is_loaded),
    ("glBufferData", gl::BufferData::is_loaded),
    ("glVertexAttribPointer", gl::VertexAttribPointer::is_loaded),
    ("glViewport", gl::Viewport::is_loaded),
    ("glClear", gl::Clear::is_loaded),
    ("glDrawArrays", gl::DrawArrays::is_loaded),
];

/// The OpenGL driver of whichever context is current on this thread.
///
/// Only [`NativeGl::load`] hands these out, so holding one means the function pointers are in
/// place.
#[derive(Debug, Clone, Copy)]
pub struct NativeGl {
    _loaded: (),
}

impl NativeGl {
    pub fn load<F>(loader: F) -> Result<Self, String>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let missing: Vec<&str> = REQUIRED
            .iter()
            .filter(|(_, is_loaded)| !is_loaded())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(format!("missing OpenGL functions: {}", missing.join(", ")));
        }

        debug!("loaded {} required OpenGL functions", REQUIRED.len());
        Ok(Self { _loaded: () })
    }
}

fn stage_kind(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn topology_mode(topology: Topology) -> GLenum {
    match topology {
        Topology::Triangles => gl::TRIANGLES,
        Topology::TriangleStrip => gl::TRIANGLE_STRIP,
    }
}

impl Device for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> ShaderId {
        unsafe { gl::CreateShader(stage_kind(stage)) }
    }

    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> Result<(), String> {
        unsafe {
            gl::ShaderSource(shader, 1, &source.as_ptr(), null());
            gl::CompileShader(shader);
        }

        let mut success = 1;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        }

        if success == 0 {
            return Err(shader_info_log(shader));
        }

        Ok(())
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader); }
    }

    fn create_program(&self) -> ProgramId {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program, shader); }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::DetachShader(program, shader); }
    }

    fn link_program(&self, program: ProgramId) -> Result<(), String> {
        let mut success = 1;
        unsafe {
            gl::LinkProgram(program);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        }

        if success == 0 {
            return Err(program_info_log(program));
        }

        Ok(())
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program); }
    }

    fn use_program(&self, program: ProgramId) {
        unsafe { gl::UseProgram(program); }
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation> {
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        if location < 0 { None } else { Some(location) }
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Bool(b) => gl::Uniform1i(location, b as GLint),
                UniformValue::Int(n) => gl::Uniform1i(location, n),
                UniformValue::Float(f) => gl::Uniform1f(location, f),
                UniformValue::Vec2(x, y) => gl::Uniform2f(location, x, y),
            }
        }
    }

    fn create_vertex_array(
        &self,
        vertices: &[f32],
        attributes: &[VertexAttribute],
    ) -> (VertexArrayId, BufferId) {
        let mut vao = 0u32;
        let mut vbo = 0u32;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);
            gl::BindVertexArray(vao);

            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (vertices.len() * size_of::<f32>()) as GLsizeiptr,
                vertices.as_ptr() as *const c_void,
                gl::STATIC_DRAW
            );
        }

        for attribute in attributes {
            set_vertex_attrib(attribute.index, attribute.offset, attribute.components, attribute.stride);
        }

        // The vertex array keeps its own reference to the buffer.
        unbind_buffers(GlBufferType::Array);
        unsafe { gl::BindVertexArray(0); }

        (vao, vbo)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId, buffer: BufferId) {
        unsafe {
            gl::DeleteVertexArrays(1, &vertex_array);
            gl::DeleteBuffers(1, &buffer);
        }
    }

    fn viewport(&self, viewport: Viewport) {
        unsafe {
            gl::Viewport(viewport.x, viewport.y, viewport.width as GLsizei, viewport.height as GLsizei);
        }
    }

    fn clear(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn draw_arrays(&self, vertex_array: VertexArrayId, topology: Topology, first: usize, count: usize) {
        unsafe {
            gl::BindVertexArray(vertex_array);
            gl::DrawArrays(topology_mode(topology), first as GLint, count as GLsizei);
        }
    }
}
