//! Compiled and linked shader programs.
//!
//! Building a program never fails outright. Each stage is compiled on its own, the program is
//! linked with whatever compiled, and any compiler or linker output is logged and kept in
//! [`Diagnostics`]. Callers that care can check [`ShaderProgram::is_valid`] and bail; everyone
//! else just gets a program that draws nothing useful.

use std::ffi::CString;
use std::fs;
use std::path::Path;

use log::{error, info, trace};

use crate::device::{Device, ProgramId, ShaderId, ShaderStage, UniformValue};

/// Compiler and linker output collected while building a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub link: Option<String>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.vertex.is_none() && self.fragment.is_none() && self.link.is_none()
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut Option<String> {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

pub struct ShaderProgram<D: Device> {
    device: D,
    id: ProgramId,
    linked: bool,
    diagnostics: Diagnostics,
}

impl<D: Device> ShaderProgram<D> {
    pub fn from_source(device: D, vertex_source: &str, fragment_source: &str) -> Self {
        let mut diagnostics = Diagnostics::default();

        let vertex = compile_stage(&device, ShaderStage::Vertex, vertex_source, &mut diagnostics);
        let fragment =
            compile_stage(&device, ShaderStage::Fragment, fragment_source, &mut diagnostics);

        let id = device.create_program();
        device.attach_shader(id, vertex);
        device.attach_shader(id, fragment);

        let linked = match device.link_program(id) {
            Ok(()) => true,
            Err(log) => {
                error!("shader program {} failed to link:\n{}", id, log.trim_end());
                diagnostics.link = Some(log);
                false
            }
        };

        for shader in &[vertex, fragment] {
            device.detach_shader(id, *shader);
            device.delete_shader(*shader);
        }

        Self { device, id, linked, diagnostics }
    }

    /// Reads both stages from disk. A file that can't be read is logged and compiled as an empty
    /// source, which leaves the program invalid.
    pub fn from_files<V, F>(device: D, vertex_path: V, fragment_path: F) -> Self
    where
        V: AsRef<Path>,
        F: AsRef<Path>,
    {
        let vertex_source = read_source(vertex_path.as_ref());
        let fragment_source = read_source(fragment_path.as_ref());

        let program = Self::from_source(device, &vertex_source, &fragment_source);
        if program.is_valid() {
            info!(
                "built shader program {} from {} + {}",
                program.id,
                vertex_path.as_ref().display(),
                fragment_path.as_ref().display()
            );
        }

        program
    }

    pub fn id(&self) -> ProgramId { self.id }

    /// Whether both stages compiled and the program linked.
    pub fn is_valid(&self) -> bool {
        self.linked && self.diagnostics.vertex.is_none() && self.diagnostics.fragment.is_none()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Makes this the program used by subsequent draw calls.
    pub fn set_used(&self) {
        self.device.use_program(self.id);
    }

    /// Writes `value` into the uniform called `name`.
    ///
    /// The location is looked up against this program on every call and the write lands in the
    /// currently used program, so call [`set_used`](Self::set_used) first. Names the program
    /// doesn't have (misspelled, or optimized out by the driver) are ignored.
    pub fn set_uniform<V: Into<UniformValue>>(&self, name: &str, value: V) {
        let c_name = match CString::new(name) {
            Ok(c_name) => c_name,
            Err(_) => {
                trace!("uniform name {:?} contains a nul byte, ignoring", name);
                return;
            }
        };

        match self.device.uniform_location(self.id, &c_name) {
            Some(location) => self.device.set_uniform(location, value.into()),
            None => trace!("program {} has no uniform {:?}", self.id, name),
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_vec2(&self, name: &str, x: f32, y: f32) {
        self.set_uniform(name, (x, y));
    }
}

impl<D: Device> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.device.delete_program(self.id);
    }
}

fn compile_stage<D: Device>(
    device: &D,
    stage: ShaderStage,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> ShaderId {
    let id = device.create_shader(stage);

    let result = CString::new(source)
        .map_err(|e| format!("source has a nul byte at offset {}", e.nul_position()))
        .and_then(|source| device.compile_shader(id, &source));

    if let Err(log) = result {
        error!("{} shader failed to compile:\n{}", stage, log.trim_end());
        *diagnostics.stage_mut(stage) = Some(log);
    }

    id
}

fn read_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        error!("failed to read shader source {}: {}", path.display(), e);
        String::new()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headless::HeadlessDevice;

    const VERT: &str = "#version 330 core
layout (location = 0) in vec3 a_position;
void main() {
    gl_Position = vec4(a_position, 1.0);
}
";

    const FRAG: &str = "#version 330 core
out vec4 frag_color;
uniform float iTime;
uniform vec2 iResolution;
uniform bool showLighting;
void main() {
    frag_color = vec4(iTime, iResolution.x, 0.0, 1.0);
}
";

    #[test]
    fn valid_sources_link_and_release_stage_objects() {
        let device = HeadlessDevice::new(4, 4);
        let program = ShaderProgram::from_source(device.clone(), VERT, FRAG);

        assert!(program.is_valid());
        assert!(program.diagnostics().is_empty());
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.live_programs(), 1);
    }

    #[test]
    fn missing_main_still_constructs_an_invalid_program() {
        let device = HeadlessDevice::new(4, 4);
        let broken = "#version 330 core\nout vec4 frag_color;\n";

        let program = ShaderProgram::from_source(device.clone(), VERT, broken);

        assert!(!program.is_valid());
        assert!(program.diagnostics().vertex.is_none());
        assert!(program.diagnostics().fragment.is_some());
        assert!(program.diagnostics().link.is_some());

        // Using and writing to a broken program is harmless.
        program.set_used();
        program.set_float("iTime", 1.0);

        drop(program);
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn nul_byte_in_source_is_a_compile_failure() {
        let device = HeadlessDevice::new(4, 4);
        let program = ShaderProgram::from_source(device, "void main() {}\0", FRAG);

        assert!(!program.is_valid());
        assert!(program.diagnostics().vertex.as_ref().unwrap().contains("nul byte"));
    }

    #[test]
    fn unreadable_file_yields_an_invalid_program() {
        let device = HeadlessDevice::new(4, 4);
        let program =
            ShaderProgram::from_files(device, "does/not/exist.vert", "does/not/exist.frag");

        assert!(!program.is_valid());
        assert!(program.diagnostics().vertex.is_some());
        assert!(program.diagnostics().fragment.is_some());
    }

    #[test]
    fn uniform_writes_are_isolated_between_programs() {
        let device = HeadlessDevice::new(4, 4);
        let a = ShaderProgram::from_source(device.clone(), VERT, FRAG);
        let b = ShaderProgram::from_source(device.clone(), VERT, FRAG);

        b.set_used();
        b.set_float("iTime", 7.0);

        a.set_used();
        a.set_float("iTime", 1.5);
        a.set_vec2("iResolution", 640.0, 480.0);
        a.set_bool("showLighting", true);

        assert_eq!(device.uniform(a.id(), "iTime"), Some(UniformValue::Float(1.5)));
        assert_eq!(device.uniform(b.id(), "iTime"), Some(UniformValue::Float(7.0)));
        assert_eq!(device.uniform(b.id(), "iResolution"), None);
        assert_eq!(device.uniform(b.id(), "showLighting"), None);
    }

    #[test]
    fn unknown_uniform_name_is_a_no_op() {
        let device = HeadlessDevice::new(4, 4);
        let program = ShaderProgram::from_source(device.clone(), VERT, FRAG);

        program.set_used();
        program.set_float("iTime", 2.0);
        program.set_int("iTmie", 42);
        program.set_vec2("not\0a name", 1.0, 1.0);

        assert_eq!(device.uniform(program.id(), "iTime"), Some(UniformValue::Float(2.0)));
        assert_eq!(device.uniform(program.id(), "iTmie"), None);
    }

    #[test]
    fn moving_a_program_does_not_release_it() {
        let device = HeadlessDevice::new(4, 4);
        let program = ShaderProgram::from_source(device.clone(), VERT, FRAG);
        let programs = vec![program];

        assert_eq!(device.live_programs(), 1);
        drop(programs);
        assert_eq!(device.live_programs(), 0);
    }
}
