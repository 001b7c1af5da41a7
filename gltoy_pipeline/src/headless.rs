//! A software [`Device`] with no window and no driver behind it.
//!
//! It models just enough of OpenGL to check what the rest of the crate does with it:
//!
//! * a stage "compiles" when it defines `void main`, and its `uniform` declarations become the
//!   program's uniform table (nothing is optimized out);
//! * a program links when exactly one compiled vertex stage and one compiled fragment stage are
//!   attached;
//! * uniform values are stored per program and written into whichever program is in use;
//! * draw calls are rasterized into an RGBA float framebuffer. A fragment stage whose output is a
//!   constant `vec4(r, g, b, a)` literal paints that color, any other stage paints opaque white,
//!   and an unlinked program paints nothing.
//!
//! Every draw call is also recorded, along with the viewport and program it used.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::rc::Rc;

use crate::device::*;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub viewport: Viewport,
    pub topology: Topology,
    pub first: usize,
    pub count: usize,
}

struct CompiledStage {
    uniforms: Vec<String>,
    constant_color: Option<[f32; 4]>,
}

struct Shader {
    stage: ShaderStage,
    compiled: Option<CompiledStage>,
}

struct LinkedProgram {
    uniforms: Vec<String>,
    values: HashMap<UniformLocation, UniformValue>,
    color: [f32; 4],
}

#[derive(Default)]
struct Program {
    attached: Vec<ShaderId>,
    linked: Option<LinkedProgram>,
}

struct VertexArray {
    vertices: Vec<f32>,
    attributes: Vec<VertexAttribute>,
    buffer: BufferId,
}

struct State {
    next_id: u32,
    shaders: HashMap<ShaderId, Shader>,
    programs: HashMap<ProgramId, Program>,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    buffers: HashSet<BufferId>,
    current_program: ProgramId,
    viewport: Viewport,
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
    draws: Vec<DrawRecord>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        // 0 is reserved, as in GL.
        self.next_id += 1;
        self.next_id
    }
}

/// Cloning hands out another handle to the same device.
#[derive(Clone)]
pub struct HeadlessDevice {
    state: Rc<RefCell<State>>,
}

impl HeadlessDevice {
    /// Creates a device with a `width` x `height` framebuffer, cleared to transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let state = State {
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            buffers: HashSet::new(),
            current_program: 0,
            viewport: Viewport::sized(width, height),
            width,
            height,
            pixels: vec![[0.0; 4]; (width * height) as usize],
            draws: Vec::new(),
        };

        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Reallocates the framebuffer, as a window system would after a resize. The viewport is
    /// left alone.
    pub fn resize_surface(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
        state.pixels = vec![[0.0; 4]; (width * height) as usize];
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    /// The color at `(x, y)`, counted from the bottom-left corner.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let state = self.state.borrow();
        assert!(x < state.width && y < state.height, "pixel ({}, {}) is off the surface", x, y);
        state.pixels[(y * state.width + x) as usize]
    }

    /// The last value written into `program`'s uniform `name`, if any.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program)?.linked.as_ref()?;
        let location = linked.uniforms.iter().position(|u| u == name)?;
        linked.values.get(&(location as UniformLocation)).copied()
    }

    pub fn current_viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    pub fn current_program(&self) -> ProgramId {
        self.state.borrow().current_program
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }
}

impl Device for HeadlessDevice {
    fn create_shader(&self, stage: ShaderStage) -> ShaderId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders.insert(id, Shader { stage, compiled: None });
        id
    }

    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let shader = state
            .shaders
            .get_mut(&shader)
            .ok_or_else(|| format!("error: {} is not a shader object", shader))?;

        let source = source.to_string_lossy();
        let compiled = compile(shader.stage, &source);
        let result = compiled.as_ref().map(|_| ()).map_err(|e| e.clone());
        shader.compiled = compiled.ok();
        result
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> ProgramId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, Program::default());
        id
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(program) = state.programs.get_mut(&program) {
            program.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(program) = state.programs.get_mut(&program) {
            program.attached.retain(|attached| *attached != shader);
        }
    }

    fn link_program(&self, program: ProgramId) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let State { shaders, programs, .. } = &mut *state;
        let program = programs
            .get_mut(&program)
            .ok_or_else(|| format!("error: {} is not a program object", program))?;

        program.linked = None;
        let linked = link(shaders, &program.attached)?;
        program.linked = Some(linked);
        Ok(())
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == program {
            state.current_program = 0;
        }
    }

    fn use_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if program == 0 || state.programs.contains_key(&program) {
            state.current_program = program;
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program)?.linked.as_ref()?;
        let name = name.to_str().ok()?;
        linked.uniforms.iter().position(|u| u == name).map(|location| location as UniformLocation)
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let current = state.current_program;
        let linked = match state.programs.get_mut(&current).and_then(|p| p.linked.as_mut()) {
            Some(linked) => linked,
            None => return,
        };

        if location >= 0 && (location as usize) < linked.uniforms.len() {
            linked.values.insert(location, value);
        }
    }

    fn create_vertex_array(
        &self,
        vertices: &[f32],
        attributes: &[VertexAttribute],
    ) -> (VertexArrayId, BufferId) {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.next_id();
        let buffer = state.next_id();

        state.buffers.insert(buffer);
        state.vertex_arrays.insert(
            vertex_array,
            VertexArray { vertices: vertices.to_vec(), attributes: attributes.to_vec(), buffer },
        );

        (vertex_array, buffer)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId, buffer: BufferId) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        state.buffers.remove(&buffer);
    }

    fn viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    fn clear(&self, color: [f32; 4]) {
        // Clearing ignores the viewport.
        for pixel in self.state.borrow_mut().pixels.iter_mut() {
            *pixel = color;
        }
    }

    fn draw_arrays(&self, vertex_array: VertexArrayId, topology: Topology, first: usize, count: usize) {
        let mut state = self.state.borrow_mut();
        let record = DrawRecord {
            program: state.current_program,
            viewport: state.viewport,
            topology,
            first,
            count,
        };
        state.draws.push(record);

        let State { programs, vertex_arrays, pixels, width, height, viewport, .. } = &mut *state;

        let color = match programs.get(&record.program).and_then(|p| p.linked.as_ref()) {
            Some(linked) => linked.color,
            None => return,
        };
        let vertex_array = match vertex_arrays.get(&vertex_array) {
            Some(vertex_array) if vertex_array.buffer != 0 => vertex_array,
            _ => return,
        };

        let points = window_positions(vertex_array, *viewport, first, count);
        for triangle in assemble(&points, topology) {
            fill_triangle(pixels, *width, *height, *viewport, triangle, color);
        }
    }
}

fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    if !source.contains("void main") {
        return Err(format!("0:1: error: {} shader has no entry point 'main'", stage));
    }

    let constant_color = match stage {
        ShaderStage::Fragment => source.lines().find_map(constant_vec4),
        ShaderStage::Vertex => None,
    };

    Ok(CompiledStage { uniforms: uniform_names(source), constant_color })
}

fn link(shaders: &HashMap<ShaderId, Shader>, attached: &[ShaderId]) -> Result<LinkedProgram, String> {
    let mut vertex = Vec::new();
    let mut fragment = Vec::new();

    for id in attached {
        let shader = shaders.get(id).ok_or_else(|| format!("error: shader {} was deleted", id))?;
        let compiled = shader
            .compiled
            .as_ref()
            .ok_or_else(|| format!("error: {} shader {} is not compiled", shader.stage, id))?;
        match shader.stage {
            ShaderStage::Vertex => vertex.push(compiled),
            ShaderStage::Fragment => fragment.push(compiled),
        }
    }

    if vertex.len() != 1 || fragment.len() != 1 {
        return Err(format!(
            "error: expected one vertex and one fragment stage, found {} and {}",
            vertex.len(),
            fragment.len()
        ));
    }

    let mut uniforms: Vec<String> = Vec::new();
    for name in vertex[0].uniforms.iter().chain(fragment[0].uniforms.iter()) {
        if !uniforms.contains(name) {
            uniforms.push(name.clone());
        }
    }

    Ok(LinkedProgram {
        uniforms,
        values: HashMap::new(),
        color: fragment[0].constant_color.unwrap_or(WHITE),
    })
}

/// Collects the names from `uniform <type> <name>[, <name>...];` declarations.
fn uniform_names(source: &str) -> Vec<String> {
    let mut names = Vec::new();

    for line in source.lines() {
        let declaration = match line.trim().strip_prefix("uniform ") {
            Some(rest) => rest.split(';').next().unwrap_or(""),
            None => continue,
        };

        let mut tokens = declaration
            .split_whitespace()
            .skip_while(|t| matches!(*t, "lowp" | "mediump" | "highp"));
        // Skip the type.
        tokens.next();

        let rest: String = tokens.collect::<Vec<_>>().join(" ");
        for name in rest.split(',') {
            let name = name.split(|c| c == '[' || c == '=').next().unwrap_or("").trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }

    names
}

/// Parses the first `= vec4(r, g, b, a)` on `line` when all four components are literals.
fn constant_vec4(line: &str) -> Option<[f32; 4]> {
    let assignment = &line[line.find('=')? + 1..];
    let args = assignment.trim().strip_prefix("vec4(")?;
    let args = &args[..args.find(')')?];

    let mut color = [0.0; 4];
    let mut parts = args.split(',');
    for component in color.iter_mut() {
        *component = parts.next()?.trim().trim_end_matches('f').parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }
    Some(color)
}

/// Maps the clip-space positions of `count` vertices into window coordinates.
fn window_positions(
    vertex_array: &VertexArray,
    viewport: Viewport,
    first: usize,
    count: usize,
) -> Vec<(f32, f32)> {
    let position = match vertex_array.attributes.iter().find(|a| a.index == 0) {
        Some(position) if position.components >= 2 => *position,
        _ => return Vec::new(),
    };
    let stride = position.stride.max(position.components as usize);

    (first..first + count)
        .filter_map(|i| {
            let base = i * stride + position.offset;
            let x = *vertex_array.vertices.get(base)?;
            let y = *vertex_array.vertices.get(base + 1)?;
            Some((
                viewport.x as f32 + (x + 1.0) * 0.5 * viewport.width as f32,
                viewport.y as f32 + (y + 1.0) * 0.5 * viewport.height as f32,
            ))
        })
        .collect()
}

fn assemble(points: &[(f32, f32)], topology: Topology) -> Vec<[(f32, f32); 3]> {
    match topology {
        Topology::Triangles => points.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect(),
        Topology::TriangleStrip => points.windows(3).map(|t| [t[0], t[1], t[2]]).collect(),
    }
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn fill_triangle(
    pixels: &mut [[f32; 4]],
    width: u32,
    height: u32,
    viewport: Viewport,
    [a, b, c]: [(f32, f32); 3],
    color: [f32; 4],
) {
    if edge(a, b, c) == 0.0 {
        return;
    }

    let x0 = viewport.x.max(0);
    let y0 = viewport.y.max(0);
    let x1 = (viewport.x + viewport.width as i32).min(width as i32);
    let y1 = (viewport.y + viewport.height as i32).min(height as i32);

    for y in y0..y1 {
        for x in x0..x1 {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let (w0, w1, w2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
            let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if inside {
                pixels[(y as u32 * width + x as u32) as usize] = color;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn uniform_declarations_are_collected() {
        let source = "uniform vec2 iResolution;\n  uniform highp float iTime;\nuniform int a, b[4];\nin vec3 pos;";

        assert_eq!(uniform_names(source), vec!["iResolution", "iTime", "a", "b"]);
    }

    #[test]
    fn constant_colors_need_four_literals() {
        assert_eq!(constant_vec4("    frag_color = vec4(1.0, 0.5, 0.0f, 1);"), Some([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(constant_vec4("frag_color = vec4(color, 1.0);"), None);
        assert_eq!(constant_vec4("frag_color = texture(t, uv);"), None);
    }

    #[test]
    fn programs_need_one_of_each_stage() {
        let device = HeadlessDevice::new(1, 1);
        let source = CString::new("void main() {}").unwrap();

        let vertex = device.create_shader(ShaderStage::Vertex);
        device.compile_shader(vertex, &source).unwrap();

        let program = device.create_program();
        device.attach_shader(program, vertex);

        assert!(device.link_program(program).is_err());
        assert_eq!(device.uniform_location(program, &CString::new("x").unwrap()), None);
    }

    #[test]
    fn triangle_list_covers_only_its_own_area() {
        let device = HeadlessDevice::new(4, 4);
        let vertex = device.create_shader(ShaderStage::Vertex);
        let fragment = device.create_shader(ShaderStage::Fragment);
        device.compile_shader(vertex, &CString::new("void main() {}").unwrap()).unwrap();
        device
            .compile_shader(fragment, &CString::new("void main() {\n c = vec4(0.0, 0.0, 1.0, 1.0);\n}").unwrap())
            .unwrap();
        let program = device.create_program();
        device.attach_shader(program, vertex);
        device.attach_shader(program, fragment);
        device.link_program(program).unwrap();

        // Lower-left half of clip space.
        let (vao, _) = device.create_vertex_array(
            &[-1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
            &[VertexAttribute { index: 0, components: 2, stride: 2, offset: 0 }],
        );

        device.use_program(program);
        device.clear([0.0, 0.0, 0.0, 1.0]);
        device.draw_arrays(vao, Topology::Triangles, 0, 3);

        assert_eq!(device.pixel(0, 0), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(device.pixel(3, 3), [0.0, 0.0, 0.0, 1.0]);
    }
}
