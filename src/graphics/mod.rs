//! The OpenGL side of gltoy.
//!
//! [`opengl::NativeGl`] implements the pipeline's `Device` trait with raw `gl` calls, so the
//! shader programs and the frame loop never touch an `unsafe` block themselves. [`window`] owns
//! the glutin window and context and drives the event loop.
//!
//! A working knowledge of OpenGL helps with reading any of this. [Learn OpenGL](learnopengl) is a
//! good place to start, and [Rust and OpenGL from scratch](rs-opengl-from-scratch) shows how to
//! wrap the raw calls safely in Rust.
//!
//! [learnopengl]: https://learnopengl.com/
//! [rs-opengl-from-scratch]: http://nercury.github.io/rust/opengl/tutorial/2018/02/09/opengl-in-rust-from-scratch-02-opengl-context.html

pub mod opengl;
pub mod utils;
pub mod window;
