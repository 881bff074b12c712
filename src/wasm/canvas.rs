use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::MountError;
use crate::surface::{DrawSurface, Rgba};

/// 2D canvas context as a [`DrawSurface`].
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn acquire(canvas: HtmlCanvasElement) -> Result<Self, MountError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|err| MountError::SurfaceUnavailable(format!("{err:?}")))?
            .ok_or_else(|| MountError::SurfaceUnavailable("2d context not supported".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| MountError::SurfaceUnavailable("unexpected context type".into()))?;
        Ok(Self { canvas, ctx })
    }
}

impl DrawSurface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn clear(&mut self) {
        let (width, height) = self.size();
        self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius, 0.0, TAU).is_ok() {
            self.ctx.set_fill_style_str(&color.to_string());
            self.ctx.fill();
        }
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) {
        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(&color.to_string());
        self.ctx.set_line_width(width);
        self.ctx.move_to(from.0, from.1);
        self.ctx.line_to(to.0, to.1);
        self.ctx.stroke();
    }
}

// A released surface should not keep showing the last frame.
impl Drop for CanvasSurface {
    fn drop(&mut self) {
        self.clear();
    }
}
