//! Frontend using the `minifb` crate for window creation and event handling.

use std::{
    ops::ControlFlow::{self, Break},
    time::Instant,
};

use log::info;
use minifb::{Key, WindowOptions};

use rasterine_core::math::color::Color4;
use rasterine_core::render::{Context, Framebuf};

use crate::Frame;

/// A lightweight wrapper of a `minifb` window.
pub struct Window {
    /// The wrapped minifb window.
    pub imp: minifb::Window,
    /// The width and height of the window.
    pub dims: (u32, u32),
    /// Rendering context defaults.
    pub ctx: Context,
}

/// Builder for creating `Window`s.
pub struct Builder<'title> {
    pub dims: (u32, u32),
    pub title: &'title str,
    pub target_fps: Option<u32>,
    pub opts: WindowOptions,
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Self {
            dims: (640, 480),
            title: "// rasterine application //",
            target_fps: Some(60),
            opts: WindowOptions::default(),
        }
    }
}

impl<'t> Builder<'t> {
    /// Sets the width and height of the window.
    pub fn dims(mut self, w: u32, h: u32) -> Self {
        self.dims = (w, h);
        self
    }
    /// Sets the title of the window.
    pub fn title(mut self, title: &'t str) -> Self {
        self.title = title;
        self
    }
    /// Sets the frame rate cap of the window. `None` means unlimited
    /// frame rate (the main loop runs as fast as possible).
    pub fn target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }
    /// Sets other `minifb` options.
    pub fn options(mut self, opts: WindowOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Creates the window.
    pub fn build(self) -> minifb::Result<Window> {
        let Self { dims, title, target_fps, opts } = self;
        let mut imp =
            minifb::Window::new(title, dims.0 as usize, dims.1 as usize, opts)?;
        if let Some(fps) = target_fps {
            imp.set_target_fps(fps as usize);
        }
        let ctx = Context::default();
        Ok(Window { imp, dims, ctx })
    }
}

impl Window {
    /// Returns a window builder.
    pub fn builder() -> Builder<'static> {
        Builder::default()
    }

    /// Updates the window content with pixel data from `fb`.
    pub fn present(&mut self, fb: &Framebuf, scratch: &mut Vec<u32>) {
        let (w, h) = self.dims;
        scratch.clear();
        scratch.extend(fb.color().data().iter().map(|c| c.to_rgb_u32()));
        self.imp
            .update_with_buffer(scratch, w as usize, h as usize)
            .unwrap();
    }

    /// Runs the main loop of the program, invoking the callback on each
    /// iteration to compute and draw the next frame.
    ///
    /// The framebuffer is cleared to black and the depth buffer to the
    /// far plane before each invocation, and the context's viewport is
    /// set to cover the whole window.
    ///
    /// The main loop stops and this function returns if:
    /// * the user closes the window via the GUI (e.g. titlebar close button);
    /// * the Esc key is pressed; or
    /// * the callback returns `ControlFlow::Break`.
    pub fn run<F>(&mut self, mut frame_fn: F)
    where
        F: FnMut(&mut Frame<Self>) -> ControlFlow<()>,
    {
        let (w, h) = self.dims;
        let mut fb = Framebuf::new(w, h);
        let mut scratch = Vec::with_capacity((w * h) as usize);

        let mut ctx = self.ctx.clone();
        ctx.set_viewport(&fb, 0, 0, w, h);

        let start = Instant::now();
        let mut last = Instant::now();
        let mut frames = 0u64;
        loop {
            if self.should_quit() {
                break;
            }
            fb.clear(Color4::BLACK);
            fb.clear_depth(1.0);

            let frame = &mut Frame {
                t: start.elapsed(),
                dt: last.elapsed(),
                fb: &mut fb,
                win: self,
                ctx: &mut ctx,
            };

            last = Instant::now();
            if let Break(_) = frame_fn(frame) {
                break;
            }
            self.present(&fb, &mut scratch);
            frames += 1;
        }

        let secs = start.elapsed().as_secs_f32();
        if secs > 0.0 {
            info!("{frames} frames in {secs:.2} s ({:.1} fps)", frames as f32 / secs);
        }
    }

    fn should_quit(&self) -> bool {
        !self.imp.is_open() || self.imp.is_key_down(Key::Escape)
    }
}
