//! The entry point: a parsed document bound to the surface it draws on.

use crate::context::RenderingContext;
use crate::document::{Document, DocumentOptions, NavigateHook};
use crate::element::structure::svg_resize;
use crate::error::CanvgResult;
use crate::parser::Parser;
use crate::resources::FetchHook;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::screen::{MouseEvent, MouseEventKind, RenderOptions};

/// Render and redraw-loop configuration.
#[derive(Default)]
pub struct CanvgOptions {
    /// Do not queue pointer events while the redraw loop runs.
    pub ignore_mouse: bool,
    pub ignore_animation: bool,
    /// Keep the surface size instead of resizing it to the root element.
    pub ignore_dimensions: bool,
    pub ignore_clear: bool,
    /// Keep redrawing on scheduled frames after [`Canvg::start`].
    pub enable_redraw: bool,
    /// Asked every frame; returning true redraws even without changes.
    pub force_redraw: Option<Box<dyn FnMut() -> bool>>,
    pub scale_width: Option<f64>,
    pub scale_height: Option<f64>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub anonymous_cross_origin: bool,
    pub fetch: Option<FetchHook>,
    pub navigate: Option<NavigateHook>,
}

impl std::fmt::Debug for CanvgOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvgOptions")
            .field("ignore_mouse", &self.ignore_mouse)
            .field("ignore_animation", &self.ignore_animation)
            .field("ignore_dimensions", &self.ignore_dimensions)
            .field("ignore_clear", &self.ignore_clear)
            .field("enable_redraw", &self.enable_redraw)
            .field("has_force_redraw", &self.force_redraw.is_some())
            .field("scale_width", &self.scale_width)
            .field("scale_height", &self.scale_height)
            .field("offset_x", &self.offset_x)
            .field("offset_y", &self.offset_y)
            .field("anonymous_cross_origin", &self.anonymous_cross_origin)
            .field("has_fetch_hook", &self.fetch.is_some())
            .field("has_navigate_hook", &self.navigate.is_some())
            .finish()
    }
}

impl CanvgOptions {
    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            fetch: self.fetch.clone(),
            anonymous_cross_origin: self.anonymous_cross_origin,
            navigate: self.navigate.clone(),
            base_dir: None,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            ignore_dimensions: self.ignore_dimensions,
            ignore_clear: self.ignore_clear,
            scale_width: self.scale_width,
            scale_height: self.scale_height,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

pub struct Canvg<C: RenderingContext> {
    ctx: C,
    document: Document,
    options: CanvgOptions,
    scheduler: Option<Box<dyn FrameScheduler>>,
    frame: Option<FrameHandle>,
    then: f64,
}

impl<C: RenderingContext> std::fmt::Debug for Canvg<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvg")
            .field("document", &self.document)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}

impl<C: RenderingContext> Canvg<C> {
    /// Parses `svg` markup for drawing onto `ctx`.
    pub fn from_string(ctx: C, svg: &str, options: CanvgOptions) -> CanvgResult<Self> {
        let document = Parser::new(options.document_options()).parse_from_string(svg)?;
        Ok(Self::from_document(ctx, document, options))
    }

    /// Parses markup, or loads it when `source` is a URL or file path.
    pub fn from_source(ctx: C, source: &str, options: CanvgOptions) -> CanvgResult<Self> {
        let document = Parser::new(options.document_options()).parse(source)?;
        Ok(Self::from_document(ctx, document, options))
    }

    pub fn from_document(ctx: C, document: Document, options: CanvgOptions) -> Self {
        Self {
            ctx,
            document,
            options,
            scheduler: None,
            frame: None,
            then: 0.0,
        }
    }

    /// A new instance on another surface that shares this one's fetch and
    /// navigation hooks unless `options` sets its own.
    pub fn fork_string<D: RenderingContext>(
        &self,
        ctx: D,
        svg: &str,
        mut options: CanvgOptions,
    ) -> CanvgResult<Canvg<D>> {
        if options.fetch.is_none() {
            options.fetch = self.options.fetch.clone();
        }
        if options.navigate.is_none() {
            options.navigate = self.options.navigate.clone();
        }
        options.anonymous_cross_origin |= self.options.anonymous_cross_origin;
        Canvg::from_string(ctx, svg, options)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn into_context(self) -> C {
        self.ctx
    }

    pub fn options(&self) -> &CanvgOptions {
        &self.options
    }

    pub fn is_ready(&self) -> bool {
        self.document.is_ready()
    }

    /// Blocks until every resource has loaded.
    pub fn ready(&mut self) {
        self.document.wait_for_resources();
        self.document.install_font_faces();
        self.document.is_ready();
    }

    /// Waits for resources and draws one frame.
    pub fn render(&mut self) {
        self.ready();
        self.render_frame();
    }

    fn render_frame(&mut self) {
        let options = self.options.render_options();
        let document = &self.document;
        document.screen.render(document.root(), &mut self.ctx, &options);
    }

    /// Draws once if ready and, with `enable_redraw`, requests the first
    /// frame of the redraw loop from `scheduler`.
    pub fn start(&mut self, scheduler: impl FrameScheduler + 'static) {
        self.stop();
        self.document.install_font_faces();
        if self.document.is_ready() {
            self.render_frame();
        }
        if !self.options.enable_redraw {
            return;
        }
        if !self.options.ignore_mouse {
            self.document.screen.mouse.start();
        }
        let mut scheduler: Box<dyn FrameScheduler> = Box::new(scheduler);
        self.then = scheduler.now();
        self.frame = Some(scheduler.request_frame());
        self.scheduler = Some(scheduler);
        log::debug!(target: "canvg::screen", "redraw loop started");
    }

    /// The scheduled frame callback. Redraws when a frame's worth of time
    /// has passed and something changed, then requests the next frame.
    /// Returns whether a frame was drawn.
    pub fn tick(&mut self) -> bool {
        let Some(now) = self.scheduler.as_ref().map(|scheduler| scheduler.now()) else {
            return false;
        };
        if !self.document.font_faces.is_empty() {
            self.document.install_font_faces();
        }
        let screen = &self.document.screen;
        let frame_duration = screen.frame_duration();
        let delta = now - self.then;
        let mut rendered = false;
        if delta >= frame_duration {
            self.then = now - delta % frame_duration;
            let force_redraw = &mut self.options.force_redraw;
            let mut force = || force_redraw.as_mut().is_some_and(|redraw| redraw());
            if screen.should_update(&self.document, self.options.ignore_animation, &mut force) {
                self.render_frame();
                self.document.screen.mouse.run_events(&self.document);
                rendered = true;
            }
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            self.frame = Some(scheduler.request_frame());
        }
        rendered
    }

    /// Cancels the pending frame and stops listening to the mouse. Does
    /// nothing when the loop is not running.
    pub fn stop(&mut self) {
        let Some(mut scheduler) = self.scheduler.take() else {
            return;
        };
        if let Some(frame) = self.frame.take() {
            scheduler.cancel_frame(frame);
        }
        self.document.screen.mouse.stop();
        log::debug!(target: "canvg::screen", "redraw loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Resizes the root element. `height` defaults to `width`.
    pub fn resize(&mut self, width: f64, height: Option<f64>, preserve_aspect_ratio: Option<&str>) {
        svg_resize(
            self.document.root(),
            width,
            height.unwrap_or(width),
            preserve_aspect_ratio,
        );
    }

    /// Queues a click at surface coordinates for the next frame.
    pub fn click(&self, x: f64, y: f64) {
        self.document.screen.mouse.push(MouseEvent {
            kind: MouseEventKind::Click,
            x,
            y,
        });
    }

    pub fn mouse_move(&self, x: f64, y: f64) {
        self.document.screen.mouse.push(MouseEvent {
            kind: MouseEventKind::MouseMove,
            x,
            y,
        });
    }

    /// The cursor hovering content asks for, e.g. `pointer` over links.
    pub fn cursor(&self) -> String {
        self.document.screen.cursor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCall, RecordingContext};
    use crate::scheduler::ManualScheduler;
    use std::cell::Cell;
    use std::rc::Rc;

    const ANIMATED: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
        <rect id='r' width='10' height='10'>\
          <animate attributeName='width' from='10' to='100' dur='1s' fill='freeze'/>\
        </rect></svg>";

    fn clears(ctx: &RecordingContext) -> usize {
        ctx.calls()
            .iter()
            .filter(|call| matches!(call, DrawCall::ClearRect(..)))
            .count()
    }

    #[test]
    fn test_render_draws_one_frame() {
        let mut canvg = Canvg::from_string(
            RecordingContext::new(10, 10),
            "<svg xmlns='http://www.w3.org/2000/svg' width='40' height='30'><rect width='5' height='5'/></svg>",
            CanvgOptions::default(),
        )
        .unwrap();
        canvg.render();
        let ctx = canvg.context();
        assert_eq!((ctx.width(), ctx.height()), (40, 30));
        assert_eq!(ctx.paint_calls().count(), 1);
        assert!(!canvg.is_running());
    }

    #[test]
    fn test_redraw_loop_follows_frame_time() {
        let host = ManualScheduler::new();
        let mut canvg = Canvg::from_string(
            RecordingContext::new(100, 100),
            ANIMATED,
            CanvgOptions {
                enable_redraw: true,
                ..Default::default()
            },
        )
        .unwrap();
        canvg.start(host.clone());
        assert_eq!(clears(canvg.context()), 1);
        assert!(host.pending().is_some());

        host.advance(10.0);
        assert!(!canvg.tick());
        host.advance(30.0);
        assert!(canvg.tick());
        assert_eq!(clears(canvg.context()), 2);
        let rect = canvg.document().get_element_by_id("r").unwrap();
        assert!(rect.get_attribute("width").get_number() > 10.0);

        canvg.stop();
        assert!(host.pending().is_none());
        canvg.stop();
        assert!(!canvg.tick());
    }

    #[test]
    fn test_ignore_animation_needs_force_redraw() {
        let host = ManualScheduler::new();
        let forced = Rc::new(Cell::new(false));
        let flag = forced.clone();
        let mut canvg = Canvg::from_string(
            RecordingContext::new(100, 100),
            ANIMATED,
            CanvgOptions {
                enable_redraw: true,
                ignore_animation: true,
                force_redraw: Some(Box::new(move || flag.get())),
                ..Default::default()
            },
        )
        .unwrap();
        canvg.start(host.clone());
        host.advance(100.0);
        assert!(!canvg.tick());
        forced.set(true);
        host.advance(100.0);
        assert!(canvg.tick());
    }

    #[test]
    fn test_click_on_link_navigates() {
        let host = ManualScheduler::new();
        let sink = std::sync::Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let hook_sink = sink.clone();
        let mut canvg = Canvg::from_string(
            RecordingContext::new(100, 100),
            "<svg xmlns='http://www.w3.org/2000/svg' width='100' height='100'>\
               <a href='https://example.com/next'><rect width='50' height='50'/></a></svg>",
            CanvgOptions {
                enable_redraw: true,
                navigate: Some(std::sync::Arc::new(move |href: &str| {
                    hook_sink.lock().unwrap().push(href.to_string());
                })),
                ..Default::default()
            },
        )
        .unwrap();
        canvg.start(host.clone());
        canvg.click(10.0, 10.0);
        canvg.mouse_move(10.0, 10.0);
        host.advance(40.0);
        assert!(canvg.tick());
        assert_eq!(*sink.lock().unwrap(), vec!["https://example.com/next".to_string()]);
        assert_eq!(canvg.cursor(), "pointer");
    }

    #[test]
    fn test_resize_keeps_coordinate_system() {
        let mut canvg = Canvg::from_string(
            RecordingContext::new(10, 10),
            "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='10' style='width: 20px'/>",
            CanvgOptions::default(),
        )
        .unwrap();
        canvg.resize(200.0, Some(100.0), Some(" xMidYMid meet "));
        let root = canvg.document().root();
        assert_eq!(root.get_attribute("viewBox").get_string(), "0 0 20 10");
        assert_eq!(root.get_attribute("width").get_number(), 200.0);
        assert_eq!(root.get_own_style("width").get_string(), "200px");
        assert_eq!(
            root.get_attribute("preserveAspectRatio").get_string(),
            "xMidYMid meet"
        );
        canvg.render();
        assert_eq!((canvg.context().width(), canvg.context().height()), (200, 100));
    }

    #[test]
    fn test_pending_font_face_holds_readiness_until_fetched() {
        let font = "<svg xmlns='http://www.w3.org/2000/svg'><font horiz-adv-x='500'>\
                      <glyph unicode='A' d='M0 0 L500 0 L500 500 Z'/></font></svg>";
        let (release, gate) = std::sync::mpsc::channel::<()>();
        let gate = std::sync::Mutex::new(gate);
        let mut canvg = Canvg::from_string(
            RecordingContext::new(50, 50),
            "<svg xmlns='http://www.w3.org/2000/svg' width='50' height='50'>\
               <style>@font-face { font-family: Late; src: url(late.svg) format('svg') }</style>\
               <text font-family='Late' y='20'>A</text></svg>",
            CanvgOptions {
                fetch: Some(std::sync::Arc::new(move |_: &str| -> CanvgResult<Vec<u8>> {
                    gate.lock().unwrap().recv().unwrap();
                    Ok(font.as_bytes().to_vec())
                })),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!canvg.is_ready());
        assert!(canvg.document().get_definition("Late").is_none());

        release.send(()).unwrap();
        canvg.ready();
        assert!(canvg.is_ready());
        let font = canvg.document().get_definition("Late").unwrap();
        assert_eq!(font.kind(), crate::element::ElementKind::Font);
        assert!(canvg.document().font_faces.is_empty());
    }
}
