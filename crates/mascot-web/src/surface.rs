// surface.rs
//
// WebGL implementation of the rendering-surface trait. The probe reads a
// basic context parameter; a context that cannot answer is treated as lost
// even when no loss event ever fired.

use mascot_engine::RenderSurface;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGlRenderingContext, WebglLoseContext};

pub struct CanvasSurface {
    context: WebGlRenderingContext,
}

impl CanvasSurface {
    /// `None` when the canvas has no WebGL context (yet).
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Option<Self> {
        let context = canvas
            .get_context("webgl")
            .ok()
            .flatten()?
            .dyn_into()
            .ok()?;
        Some(Self { context })
    }
}

impl RenderSurface for CanvasSurface {
    fn is_lost(&self) -> bool {
        self.context.is_context_lost()
    }

    fn probe(&self) -> bool {
        self.context
            .get_parameter(WebGlRenderingContext::MAX_TEXTURE_SIZE)
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v > 0.0)
            .unwrap_or(false)
    }

    fn force_restore(&self) -> bool {
        match self.context.get_extension("WEBGL_lose_context") {
            Ok(Some(ext)) => {
                ext.unchecked_into::<WebglLoseContext>().restore_context();
                true
            }
            _ => false,
        }
    }
}
