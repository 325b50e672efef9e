//! Per-document render state: the viewport stack, the mouse event queue,
//! live animations and the frame-loop bookkeeping.

use crate::context::{LineCap, LineJoin, Paint, RenderingContext};
use crate::document::Document;
use crate::element::{ElementRef, NodeId};
use crate::geometry::BoundingBox;
use crate::property::{Axis, Value};
use crate::util::to_numbers;
use crate::view_port::ViewPort;
use std::cell::{Cell, Ref, RefCell, RefMut};

/// Frames per second of the redraw loop.
pub const FRAMERATE: f64 = 30.0;

/// Largest surface side the root element may resize the surface to.
pub const MAX_SURFACE_SIZE: u32 = 16384;

/// Per-render overrides of the root element's geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    /// Keep the surface size instead of resizing it to the root's
    /// `width`/`height`.
    pub ignore_dimensions: bool,
    pub ignore_clear: bool,
    pub scale_width: Option<f64>,
    pub scale_height: Option<f64>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Click,
    MouseMove,
}

/// A pointer event in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: f64,
    pub y: f64,
}

/// Queued pointer events and the topmost element hit by each, filled in by
/// hit tests while the next frame renders.
#[derive(Debug, Default)]
pub struct Mouse {
    working: Cell<bool>,
    events: RefCell<Vec<MouseEvent>>,
    event_elements: RefCell<Vec<Option<NodeId>>>,
}

impl Mouse {
    pub fn start(&self) {
        self.working.set(true);
    }

    pub fn stop(&self) {
        self.working.set(false);
        self.events.borrow_mut().clear();
        self.event_elements.borrow_mut().clear();
    }

    pub fn is_working(&self) -> bool {
        self.working.get()
    }

    pub fn has_events(&self) -> bool {
        self.is_working() && !self.events.borrow().is_empty()
    }

    /// Queues an event. Ignored while the mouse is stopped.
    pub fn push(&self, event: MouseEvent) {
        if !self.is_working() {
            return;
        }
        self.events.borrow_mut().push(event);
        self.event_elements.borrow_mut().push(None);
    }

    fn record_hits(&self, element: ElementRef<'_>, hit: impl Fn(f64, f64) -> bool) {
        let events = self.events.borrow();
        let mut elements = self.event_elements.borrow_mut();
        for (event, slot) in events.iter().zip(elements.iter_mut()) {
            if slot.is_none() && hit(event.x, event.y) {
                *slot = Some(element.id());
            }
        }
    }

    pub fn check_path(&self, element: ElementRef<'_>, ctx: &dyn RenderingContext) {
        if !self.is_working() {
            return;
        }
        self.record_hits(element, |x, y| ctx.is_point_in_path(x, y));
    }

    pub fn check_bounding_box(&self, element: ElementRef<'_>, bbox: Option<&BoundingBox>) {
        let Some(bbox) = bbox.filter(|_| self.is_working()) else {
            return;
        };
        self.record_hits(element, |x, y| bbox.is_point_in_box(x, y));
    }

    /// Delivers every queued event to its hit element and that element's
    /// ancestors, then clears the queue.
    pub fn run_events(&self, document: &Document) {
        if !self.is_working() {
            return;
        }
        document.screen.set_cursor("");
        let events: Vec<_> = self.events.borrow_mut().drain(..).collect();
        let elements: Vec<_> = self.event_elements.borrow_mut().drain(..).collect();
        for (event, element) in events.iter().zip(elements) {
            let mut current = element.map(|id| document.element(id));
            while let Some(element) = current {
                match event.kind {
                    MouseEventKind::Click => element.on_click(),
                    MouseEventKind::MouseMove => element.on_mouse_move(),
                }
                current = element.parent();
            }
        }
    }
}

/// The root's own transform and size before the first scaled render
/// overwrote them, so repeated renders do not compound.
#[derive(Debug, Clone)]
struct ScaleBase {
    transform: Value,
    width: f64,
    height: f64,
}

#[derive(Debug)]
pub struct Screen {
    view_port: RefCell<ViewPort>,
    pub mouse: Mouse,
    animations: RefCell<Vec<NodeId>>,
    cursor: RefCell<String>,
    frame_duration: f64,
    is_first_render: Cell<bool>,
    ready_lock: Cell<bool>,
    scale_base: RefCell<Option<ScaleBase>>,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            view_port: RefCell::new(ViewPort::new()),
            mouse: Mouse::default(),
            animations: RefCell::new(Vec::new()),
            cursor: RefCell::new(String::new()),
            frame_duration: 1000.0 / FRAMERATE,
            is_first_render: Cell::new(true),
            ready_lock: Cell::new(false),
            scale_base: RefCell::new(None),
        }
    }
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_port(&self) -> Ref<'_, ViewPort> {
        self.view_port.borrow()
    }

    pub fn view_port_mut(&self) -> RefMut<'_, ViewPort> {
        self.view_port.borrow_mut()
    }

    /// Milliseconds per frame of the redraw loop.
    pub fn frame_duration(&self) -> f64 {
        self.frame_duration
    }

    /// Resets the surface state that SVG defaults differ from canvas on.
    pub fn set_defaults(&self, ctx: &mut dyn RenderingContext) {
        ctx.set_stroke_style(Paint::transparent());
        ctx.set_line_cap(LineCap::Butt);
        ctx.set_line_join(LineJoin::Miter);
        ctx.set_miter_limit(4.0);
    }

    pub fn is_mouse_working(&self) -> bool {
        self.mouse.is_working()
    }

    pub fn check_path(&self, element: ElementRef<'_>, ctx: &dyn RenderingContext) {
        self.mouse.check_path(element, ctx);
    }

    pub fn check_bounding_box(&self, element: ElementRef<'_>, bbox: Option<&BoundingBox>) {
        self.mouse.check_bounding_box(element, bbox);
    }

    pub fn set_cursor(&self, cursor: &str) {
        *self.cursor.borrow_mut() = cursor.to_string();
    }

    /// The cursor requested by the last delivered pointer events.
    pub fn cursor(&self) -> String {
        self.cursor.borrow().clone()
    }

    pub(crate) fn register_animation(&self, id: NodeId) {
        self.animations.borrow_mut().push(id);
    }

    pub(crate) fn animation_ids(&self) -> Vec<NodeId> {
        self.animations.borrow().clone()
    }

    /// Whether every resource has loaded. Once true it stays true.
    pub fn is_ready(&self, document: &Document) -> bool {
        if self.ready_lock.get() {
            return true;
        }
        let ready = document.resources_loaded();
        if ready {
            log::debug!(target: "canvg::screen", "document is ready");
        }
        self.ready_lock.set(ready);
        ready
    }

    /// Advances every animation by one frame. Returns whether any changed.
    pub fn update_animations(&self, document: &Document) -> bool {
        document
            .animations()
            .fold(false, |changed, animation| {
                crate::element::animate::update(animation, self.frame_duration) || changed
            })
    }

    /// Whether the next frame must be drawn.
    pub fn should_update(
        &self,
        document: &Document,
        ignore_animation: bool,
        force_redraw: &mut dyn FnMut() -> bool,
    ) -> bool {
        if !ignore_animation && self.update_animations(document) {
            return true;
        }
        if force_redraw() {
            return true;
        }
        if !self.ready_lock.get() && self.is_ready(document) {
            return true;
        }
        self.mouse.has_events()
    }

    /// Sizes the surface and viewport from the root element, applies the
    /// scale and offset overrides, clears and draws one frame.
    pub fn render(&self, root: ElementRef<'_>, ctx: &mut dyn RenderingContext, options: &RenderOptions) {
        let is_first_render = self.is_first_render.get();
        {
            let mut view_port = self.view_port_mut();
            view_port.clear();
            view_port.set_current(f64::from(ctx.width()), f64::from(ctx.height()));
        }

        let width_style = root.get_style("width");
        let height_style = root.get_style("height");
        let scaled = options.scale_width.is_some() || options.scale_height.is_some();
        if !options.ignore_dimensions && (is_first_render || !scaled) {
            let mut width = ctx.width();
            let mut height = ctx.height();
            if width_style.has_value() {
                width = width_style.get_pixels(Axis::X).max(0.0) as u32;
            }
            if height_style.has_value() {
                height = height_style.get_pixels(Axis::Y).max(0.0) as u32;
            }
            if width > MAX_SURFACE_SIZE || height > MAX_SURFACE_SIZE {
                log::warn!(
                    target: "canvg::screen",
                    "root size {width}x{height} exceeds {MAX_SURFACE_SIZE}px, keeping {}x{}",
                    ctx.width(),
                    ctx.height()
                );
            } else if (width, height) != (ctx.width(), ctx.height()) {
                log::debug!(target: "canvg::screen", "resizing surface to {width}x{height}");
                ctx.set_size(width, height);
            }
        }

        let mut surface_width = f64::from(ctx.width());
        let mut surface_height = f64::from(ctx.height());
        if options.ignore_dimensions && width_style.has_value() && height_style.has_value() {
            surface_width = width_style.get_pixels(Axis::X);
            surface_height = height_style.get_pixels(Axis::Y);
        }
        self.view_port_mut().set_current(surface_width, surface_height);

        if let Some(offset_x) = options.offset_x {
            root.ensure_attribute("x").set_value(offset_x);
        }
        if let Some(offset_y) = options.offset_y {
            root.ensure_attribute("y").set_value(offset_y);
        }
        if scaled {
            self.apply_scale(root, options);
        }

        if !options.ignore_clear {
            ctx.clear_rect(0.0, 0.0, surface_width, surface_height);
        }
        log::debug!(target: "canvg::render", "rendering frame {surface_width}x{surface_height}");
        root.render(ctx);
        self.is_first_render.set(false);
    }

    fn apply_scale(&self, root: ElementRef<'_>, options: &RenderOptions) {
        let mut base = self.scale_base.borrow_mut();
        let base = base.get_or_insert_with(|| {
            let view_box = to_numbers(&root.get_attribute("viewBox").get_string());
            let size = |style: &str, index: usize, axis: Axis| {
                let size = root.get_style(style);
                if size.has_value() {
                    size.get_pixels(axis)
                } else {
                    view_box.get(index).copied().unwrap_or(0.0)
                }
            };
            ScaleBase {
                transform: root.get_own_style("transform").value().clone(),
                width: size("width", 2, Axis::X),
                height: size("height", 3, Axis::Y),
            }
        });

        let ratio = |scale: Option<f64>, size: f64| match scale {
            Some(scale) if scale != 0.0 => size / scale,
            _ => 0.0,
        };
        let mut x_ratio = ratio(options.scale_width, base.width);
        let mut y_ratio = ratio(options.scale_height, base.height);
        if x_ratio == 0.0 {
            x_ratio = y_ratio;
        }
        if y_ratio == 0.0 {
            y_ratio = x_ratio;
        }

        if let Some(width) = options.scale_width {
            root.ensure_attribute("width").set_value(width);
        }
        if let Some(height) = options.scale_height {
            root.ensure_attribute("height").set_value(height);
        }
        if x_ratio == 0.0 || y_ratio == 0.0 {
            return;
        }

        let scale = format!("scale({}, {})", 1.0 / x_ratio, 1.0 / y_ratio);
        let transform = format!("{} {scale}", base.transform.as_string());
        root.get_style_with("transform", true, true)
            .set_value(transform.trim().to_string());
    }
}
