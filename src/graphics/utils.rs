use std::ffi::CString;
use std::mem::size_of;
use std::ffi::c_void;
use std::ptr::null_mut;

use gl;
use gl::types::*;

pub enum GlBufferType {
    Array = gl::ARRAY_BUFFER as isize,
}

pub fn shader_info_log(id: GLuint) -> String {
    let mut len = 0;
    unsafe {
        gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
    }

    let error = create_ws_cstring_with_len(len.max(0) as usize);
    unsafe {
        gl::GetShaderInfoLog(id, len, null_mut(), error.as_ptr() as *mut GLchar);
    }

    // The log's own nul terminator lands inside the buffer.
    error.to_string_lossy().trim_end_matches('\0').to_owned()
}

pub fn program_info_log(id: GLuint) -> String {
    let mut len = 0;
    unsafe {
        gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut len);
    }

    let error = create_ws_cstring_with_len(len.max(0) as usize);
    unsafe {
        gl::GetProgramInfoLog(id, len, null_mut(), error.as_ptr() as *mut GLchar);
    }

    error.to_string_lossy().trim_end_matches('\0').to_owned()
}

/// A `CString` of `len` spaces, for GL to write an info log into.
pub fn create_ws_cstring_with_len(len: usize) -> CString {
    let mut buf: Vec<u8> = Vec::with_capacity(len + 1);
    buf.extend([b' '].iter().cycle().take(len));
    unsafe { CString::from_vec_unchecked(buf) }
}

pub fn unbind_buffers(buffer_type: GlBufferType) {
    unsafe { gl::BindBuffer(buffer_type as u32, 0); }
}

/// Describes one float attribute of the bound array buffer. `offset` and `stride` are in floats.
pub fn set_vertex_attrib(index: u32, offset: usize, size: i32, stride: usize) {
    unsafe {
        gl::EnableVertexAttribArray(index);
        gl::VertexAttribPointer(
            index,
            size,
            gl::FLOAT,
            gl::FALSE,
            (stride * size_of::<f32>()) as GLsizei,
            (offset * size_of::<f32>()) as *const c_void
        );
    }
}
