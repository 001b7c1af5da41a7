use std::time::Instant;

use anyhow::{anyhow, Result};
use glutin::dpi::LogicalSize;
use glutin::event::{ElementState, Event, WindowEvent};
use glutin::event_loop::{ControlFlow, EventLoop};
use glutin::window::WindowBuilder;
use glutin::{Api, ContextBuilder, GlProfile, GlRequest, PossiblyCurrent, WindowedContext};
use log::{error, info};

use pipeline::{FrameConfig, FrameLoop, FrameStatus, KeyEdge, ShaderProgram};

use super::opengl::NativeGl;
use crate::interface::keymap;

pub type GlContext = WindowedContext<PossiblyCurrent>;

/// Opens a window with a current OpenGL 3.3 core context and loads the GL function pointers.
pub fn create_context(
    events: &EventLoop<()>,
    config: &FrameConfig,
    visible: bool,
) -> Result<(GlContext, NativeGl)> {
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
        .with_visible(visible);

    let context = ContextBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, (3, 3)))
        .with_gl_profile(GlProfile::Core)
        .build_windowed(window, events)
        .map_err(|e| anyhow!("failed to create window: {}", e))?;

    let context = unsafe { context.make_current() }
        .map_err(|(_, e)| anyhow!("failed to make the OpenGL context current: {}", e))?;

    let device = NativeGl::load(|s| context.get_proc_address(s) as *const _)
        .map_err(|e| anyhow!("failed to initialize OpenGL: {}", e))?;

    info!("created {}x{} window \"{}\"", config.width, config.height, config.title);
    Ok((context, device))
}

/// Runs the render loop until the window closes. Only returns if setup fails; a normal shutdown
/// exits the process from inside the event loop.
pub fn run(config: FrameConfig) -> Result<()> {
    let events = EventLoop::new();
    let (context, device) = create_context(&events, &config, true)?;

    let mut frames = FrameLoop::setup(device, &config).map_err(|e| anyhow!(e))?;
    let size = context.window().inner_size();
    frames.resize(size.width, size.height);

    // The event loop never returns, so these are taken and dropped by hand on the way out, frame
    // loop first, while the context is still current.
    let mut frames = Some(frames);
    let mut context = Some(context);
    let start = Instant::now();

    events.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        let (frames_ref, context_ref) = match (frames.as_mut(), context.as_ref()) {
            (Some(frames), Some(context)) => (frames, context),
            _ => return,
        };

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => {
                    context_ref.resize(size);
                    frames_ref.resize(size.width, size.height);
                }
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput { input, .. } => {
                    if let Some(key) = input.virtual_keycode.and_then(keymap::lookup) {
                        let edge = match input.state {
                            ElementState::Pressed => KeyEdge::Down,
                            ElementState::Released => KeyEdge::Up,
                        };
                        frames_ref.push_key(key, edge);
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => context_ref.window().request_redraw(),
            Event::RedrawRequested(_) => match frames_ref.tick(start.elapsed()) {
                FrameStatus::Running => {
                    if let Err(e) = context_ref.swap_buffers() {
                        error!("failed to swap buffers: {}", e);
                    }
                }
                FrameStatus::Exit => *control_flow = ControlFlow::Exit,
            },
            Event::LoopDestroyed => {
                frames.take();
                context.take();
                info!("shut down");
            }
            _ => {}
        }
    })
}

/// Builds every configured program in a hidden window and prints what the driver said about
/// each. Returns whether all of them linked.
pub fn check(config: &FrameConfig) -> Result<bool> {
    let events = EventLoop::new();
    let (_context, device) = create_context(&events, config, false)?;

    let mut all_valid = true;
    for (n, source) in config.programs.iter().enumerate() {
        let program = ShaderProgram::from_files(device, &source.vertex, &source.fragment);
        let status = if program.is_valid() { "ok" } else { "FAILED" };

        println!(
            "[{}] {} + {}: {}",
            n + 1,
            source.vertex.display(),
            source.fragment.display(),
            status
        );

        let diagnostics = program.diagnostics();
        for (what, log) in &[
            ("vertex", &diagnostics.vertex),
            ("fragment", &diagnostics.fragment),
            ("link", &diagnostics.link),
        ] {
            if let Some(log) = log {
                println!("    {}:\n{}", what, log.trim_end());
            }
        }

        all_valid &= program.is_valid();
    }

    Ok(all_valid)
}
