//! The per-frame contract: sample input, write uniforms, clear, draw.
//!
//! [`FrameLoop`] owns the shader programs, the geometry and the [`FrameState`]. The platform layer
//! feeds it key edges and resizes as they arrive, calls [`FrameLoop::tick`] once per frame, and
//! presents the result when the tick says to keep running.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::device::{Device, Viewport};
use crate::geometry::{Geometry, GeometryKind};
use crate::input::{FrameState, Key, KeyEdge};
use crate::shader::ShaderProgram;

pub const RESOLUTION_UNIFORM: &str = "iResolution";
pub const TIME_UNIFORM: &str = "iTime";
pub const LIGHTING_UNIFORM: &str = "showLighting";
pub const FRAME_UNIFORM: &str = "iFrame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ProgramSource {
    pub fn new<V: Into<PathBuf>, F: Into<PathBuf>>(vertex: V, fragment: F) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub clear_color: [f32; 4],
    pub geometry: GeometryKind,
    pub programs: Vec<ProgramSource>,
}

impl FrameConfig {
    /// The shaders a geometry preset is drawn with when none are given.
    pub fn default_programs(geometry: GeometryKind) -> Vec<ProgramSource> {
        match geometry {
            GeometryKind::Quad => vec![
                ProgramSource::new("shaders/default.vert", "shaders/rendering/raytrace.frag"),
                ProgramSource::new("shaders/default.vert", "shaders/rendering/raymarch.frag"),
            ],
            GeometryKind::Triangle => {
                vec![ProgramSource::new("shaders/triangle.vert", "shaders/triangle.frag")]
            }
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            width: 600,
            height: 600,
            title: String::from("OpenGL"),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            geometry: GeometryKind::Quad,
            programs: Self::default_programs(GeometryKind::Quad),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was drawn and should be presented.
    Running,
    /// Close was requested; nothing was drawn.
    Exit,
}

pub struct FrameLoop<D: Device> {
    // Field order is drop order: programs, then geometry.
    programs: Vec<ShaderProgram<D>>,
    geometry: Geometry<D>,
    device: D,
    state: FrameState,
    pending_input: Vec<(Key, KeyEdge)>,
    viewport: Viewport,
    viewport_dirty: bool,
    clear_color: [f32; 4],
    frame: u32,
}

impl<D: Device + Clone> FrameLoop<D> {
    /// Builds every configured program and uploads the configured geometry.
    pub fn setup(device: D, config: &FrameConfig) -> Result<Self, String> {
        let programs = config
            .programs
            .iter()
            .map(|source| ShaderProgram::from_files(device.clone(), &source.vertex, &source.fragment))
            .collect();
        let geometry = Geometry::preset(device.clone(), config.geometry);

        Self::new(device, programs, geometry, config)
    }

    pub fn new(
        device: D,
        programs: Vec<ShaderProgram<D>>,
        geometry: Geometry<D>,
        config: &FrameConfig,
    ) -> Result<Self, String> {
        if programs.is_empty() {
            return Err(String::from("at least one shader program is required"));
        }

        info!(
            "frame loop ready: {} shader program(s), {}x{} viewport",
            programs.len(),
            config.width,
            config.height
        );

        Ok(FrameLoop {
            programs,
            geometry,
            device,
            state: FrameState::default(),
            pending_input: Vec::new(),
            viewport: Viewport::sized(config.width, config.height),
            viewport_dirty: true,
            clear_color: config.clear_color,
            frame: 0,
        })
    }
}

impl<D: Device> FrameLoop<D> {
    pub fn state(&self) -> &FrameState { &self.state }

    pub fn viewport(&self) -> Viewport { self.viewport }

    pub fn programs(&self) -> &[ShaderProgram<D>] { &self.programs }

    pub fn active_program(&self) -> &ShaderProgram<D> {
        &self.programs[self.state.active_program]
    }

    /// Queues a key edge; it takes effect at the start of the next tick.
    pub fn push_key(&mut self, key: Key, edge: KeyEdge) {
        self.pending_input.push((key, edge));
    }

    /// Records a new surface size. The next draw uses the most recent one.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("surface resized to {}x{}", width, height);
        self.viewport = Viewport::sized(width, height);
        self.viewport_dirty = true;
    }

    pub fn tick(&mut self, elapsed: Duration) -> FrameStatus {
        let program_count = self.programs.len();
        for (key, edge) in self.pending_input.drain(..) {
            self.state.apply(key, edge, program_count);
        }

        if self.state.close_requested {
            return FrameStatus::Exit;
        }

        // A minimized window reports a zero size; keep the old viewport until it comes back.
        if self.viewport_dirty && !self.viewport.is_empty() {
            self.device.viewport(self.viewport);
            self.viewport_dirty = false;
        }

        let program = &self.programs[self.state.active_program];
        program.set_used();
        program.set_vec2(RESOLUTION_UNIFORM, self.viewport.width as f32, self.viewport.height as f32);
        program.set_float(TIME_UNIFORM, elapsed.as_secs_f32());
        program.set_bool(LIGHTING_UNIFORM, self.state.show_lighting());
        program.set_int(FRAME_UNIFORM, self.frame as i32);

        self.device.clear(self.clear_color);
        self.geometry.draw();

        self.frame = self.frame.wrapping_add(1);
        FrameStatus::Running
    }
}
