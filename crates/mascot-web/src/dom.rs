// dom.rs
//
// Live DOM readings behind the core's platform traits. Every accessor
// re-queries the document — nothing here caches layout, so a resize or a
// re-render can never leave a stale measurement behind.

use mascot_engine::{
    validate_sizing, ContainerProbe, ObstacleView, Position, Rect, SizingReport, Viewport,
    VisibilitySample,
};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement};

/// Id of the mascot's positioned container element.
pub const CONTAINER_ID: &str = "jubee-mascot";

/// UI chrome the mascot must not cover. Elements inside the mascot's own
/// container are filtered out after the query.
const OBSTACLE_SELECTORS: &str = "\
    .content-card, .activity-card, .achievement-card, \
    header, nav, button:not(.mascot-toggle)";

pub fn viewport() -> Option<Viewport> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some(Viewport::new(width, height))
}

/// Fresh viewport plus the container size for its breakpoint.
pub fn layout() -> Option<(Viewport, mascot_engine::ContainerSize)> {
    let vp = viewport()?;
    Some((vp, vp.breakpoint().container_size()))
}

pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn container() -> Option<Element> {
    document()?.get_element_by_id(CONTAINER_ID)
}

pub fn canvas() -> Option<HtmlCanvasElement> {
    container()?
        .query_selector("canvas")
        .ok()
        .flatten()?
        .dyn_into()
        .ok()
}

fn rect_of(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::from_origin_size(r.left(), r.top(), r.width(), r.height())
}

fn computed_opacity(el: &Element) -> Option<f64> {
    let style = web_sys::window()?.get_computed_style(el).ok()??;
    style.get_property_value("opacity").ok()?.parse().ok()
}

/// Write a committed position through to the container's inline style.
pub fn apply_position(position: Position) {
    let Some(el) = container() else { return };
    let Some(html) = el.dyn_ref::<HtmlElement>() else { return };
    let style = html.style();
    let _ = style.set_property("bottom", &format!("{:.0}px", position.bottom));
    let _ = style.set_property("right", &format!("{:.0}px", position.right));
}

pub fn apply_visibility(visible: bool) {
    let Some(el) = container() else { return };
    let Some(html) = el.dyn_ref::<HtmlElement>() else { return };
    let _ = html
        .style()
        .set_property("display", if visible { "block" } else { "none" });
}

/// Measure the container (and its canvas, when mounted) against the locked
/// breakpoint baseline.
pub fn sizing_report() -> Option<SizingReport> {
    let vp = viewport()?;
    let el = container()?;
    let rect = rect_of(&el);
    let surface = canvas().map(|c| {
        let r = c.get_bounding_client_rect();
        (r.width(), r.height())
    });
    Some(validate_sizing(
        vp.breakpoint(),
        (rect.width, rect.height),
        surface,
    ))
}

/// Scene-graph view for the collision detector: the mascot's live bounding
/// box and the boxes of everything it should stay clear of.
pub struct DomObstacleView;

impl ObstacleView for DomObstacleView {
    fn mascot_rect(&self) -> Option<Rect> {
        let el = container()?;
        let rect = rect_of(&el);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            // Not laid out yet.
            return None;
        }
        Some(rect)
    }

    fn obstacle_rects(&self) -> Vec<Rect> {
        let mut rects = Vec::new();
        let Some(doc) = document() else {
            return rects;
        };
        let Ok(nodes) = doc.query_selector_all(OBSTACLE_SELECTORS) else {
            return rects;
        };
        let mascot_scope = format!("#{CONTAINER_ID}");
        for i in 0..nodes.length() {
            let Some(node) = nodes.item(i) else { continue };
            let Some(el) = node.dyn_ref::<Element>() else {
                continue;
            };
            // The mascot's own toggle and chrome are not obstacles.
            if matches!(el.closest(&mascot_scope), Ok(Some(_))) {
                continue;
            }
            let rect = rect_of(el);
            if rect.width > 0.0 && rect.height > 0.0 {
                rects.push(rect);
            }
        }
        rects
    }
}

/// Container probe for the visibility monitor. `None` until the container
/// is in the DOM.
pub struct DomContainerProbe;

impl ContainerProbe for DomContainerProbe {
    fn sample(&self) -> Option<VisibilitySample> {
        let el = container()?;
        let vp = viewport()?;
        let rect = rect_of(&el);
        Some(VisibilitySample {
            width: rect.width,
            height: rect.height,
            in_viewport: rect.intersects_viewport(&vp),
            has_surface: matches!(el.query_selector("canvas"), Ok(Some(_))),
            opacity: computed_opacity(&el).unwrap_or(1.0),
        })
    }
}
