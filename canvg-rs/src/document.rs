//! The per-parse state every element reads from: the element arena, the
//! definitions table, the em-size stack, loading resources and the screen.

use crate::context::RenderingContext;
use crate::element::image::ImageSource;
use crate::element::{Element, ElementData, ElementRef, NodeId};
use crate::error::CanvgResult;
use crate::parser::Parser;
use crate::resources::{FetchHook, Resource, ResourceLoader};
use crate::screen::Screen;
use crate::view_box::{compute_view_box, ViewBoxParams};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Font size in pixels that `em` resolves to outside any `font-size`.
pub const DEFAULT_EM_SIZE: f64 = 12.0;

/// Receives the target of a clicked `<a>`.
pub type NavigateHook = Arc<dyn Fn(&str) + Send + Sync>;

/// How a document reaches the outside world while it is built and rendered.
#[derive(Clone, Default)]
pub struct DocumentOptions {
    /// Replaces file and network access for every resource.
    pub fetch: Option<FetchHook>,
    /// Fetch remote resources without sending a referrer.
    pub anonymous_cross_origin: bool,
    pub navigate: Option<NavigateHook>,
    /// Directory relative resource paths resolve against.
    pub base_dir: Option<PathBuf>,
}

impl std::fmt::Debug for DocumentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentOptions")
            .field("has_fetch_hook", &self.fetch.is_some())
            .field("anonymous_cross_origin", &self.anonymous_cross_origin)
            .field("has_navigate_hook", &self.navigate.is_some())
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl DocumentOptions {
    pub(crate) fn loader(&self) -> ResourceLoader {
        ResourceLoader::new(self.fetch.clone(), self.anonymous_cross_origin)
            .with_base_dir(self.base_dir.clone())
    }
}

/// An `@font-face` SVG source still loading. Its `<font>` elements are
/// built into the arena once the slot completes.
#[derive(Debug)]
pub(crate) struct PendingFontFace {
    pub(crate) family: String,
    pub(crate) resource: Arc<Resource>,
}

pub struct Document {
    pub(crate) nodes: Vec<Element>,
    pub(crate) root: NodeId,
    /// Element ids and SVG font families. The first element with an id wins.
    pub(crate) definitions: HashMap<String, NodeId>,
    pub(crate) images: Vec<NodeId>,
    pub(crate) font_faces: Vec<PendingFontFace>,
    pub(crate) loader: ResourceLoader,
    pub(crate) navigate: Option<NavigateHook>,
    em_sizes: RefCell<Vec<f64>>,
    pub(crate) use_depth: Cell<usize>,
    pub screen: Screen,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.nodes.len())
            .field("root", &self.nodes[self.root].tag)
            .field("definitions", &self.definitions.len())
            .field("images", &self.images.len())
            .field("pending_font_faces", &self.font_faces.len())
            .finish()
    }
}

impl Document {
    pub(crate) fn new(loader: ResourceLoader, navigate: Option<NavigateHook>) -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
            definitions: HashMap::new(),
            images: Vec::new(),
            font_faces: Vec::new(),
            loader,
            navigate,
            em_sizes: RefCell::new(Vec::new()),
            use_depth: Cell::new(0),
            screen: Screen::new(),
        }
    }

    /// Parses SVG markup with default options.
    pub fn from_string(markup: &str) -> CanvgResult<Document> {
        Parser::default().parse_from_string(markup)
    }

    /// Parses markup whose resources load through an existing loader, as
    /// for SVG documents nested in `<image>`.
    pub(crate) fn from_string_with_loader(
        markup: &str,
        loader: ResourceLoader,
    ) -> CanvgResult<Document> {
        let xml = crate::parser::parse_xml(markup)?;
        let mut document = crate::builder::build(&xml, loader, None)?;
        // Nested documents are drawn through a shared reference, so their
        // fonts have to be in place before the first draw.
        for face in &document.font_faces {
            face.resource.wait();
        }
        document.install_font_faces();
        Ok(document)
    }

    pub fn root(&self) -> ElementRef<'_> {
        ElementRef::new(self, self.root)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> ElementRef<'_> {
        ElementRef::new(self, id)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.get_definition(id)
    }

    /// An element by id, or an SVG `<font>` by family name.
    pub fn get_definition(&self, name: &str) -> Option<ElementRef<'_>> {
        self.definitions
            .get(name)
            .map(|id| ElementRef::new(self, *id))
    }

    pub(crate) fn define_if_absent(&mut self, name: &str, id: NodeId) {
        self.definitions.entry(name.to_string()).or_insert(id);
    }

    pub(crate) fn define(&mut self, name: &str, id: NodeId) {
        self.definitions.insert(name.to_string(), id);
    }

    pub fn em_size(&self) -> f64 {
        self.em_sizes
            .borrow()
            .last()
            .copied()
            .unwrap_or(DEFAULT_EM_SIZE)
    }

    pub fn root_em_size(&self) -> f64 {
        self.em_sizes
            .borrow()
            .first()
            .copied()
            .unwrap_or(DEFAULT_EM_SIZE)
    }

    pub fn push_em_size(&self, size: f64) {
        self.em_sizes.borrow_mut().push(size);
    }

    pub fn pop_em_size(&self) {
        self.em_sizes.borrow_mut().pop();
    }

    /// Maps a viewBox onto the viewport described by `params`.
    pub fn set_view_box(&self, ctx: &mut dyn RenderingContext, params: &ViewBoxParams<'_>) {
        compute_view_box(params).apply(ctx);
    }

    /// Follows a clicked link.
    pub fn navigate(&self, href: &str) {
        match &self.navigate {
            Some(navigate) => {
                log::debug!(target: "canvg::document", "navigating to {href}");
                navigate(href);
            }
            None => log::info!(target: "canvg::document", "no navigation hook for {href}"),
        }
    }

    pub fn animations(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.screen
            .animation_ids()
            .into_iter()
            .map(move |id| ElementRef::new(self, id))
    }

    fn image_sources(&self) -> impl Iterator<Item = &ImageSource> + '_ {
        self.images.iter().filter_map(|id| match &self.nodes[*id].data {
            ElementData::Image(source) => Some(source),
            _ => None,
        })
    }

    /// True once every image and `@font-face` source has finished loading,
    /// successfully or not.
    pub fn resources_loaded(&self) -> bool {
        self.image_sources().all(ImageSource::is_loaded)
            && self.font_faces.iter().all(|face| face.resource.is_loaded())
    }

    /// Blocks until every image and font source has finished loading.
    pub fn wait_for_resources(&self) {
        for source in self.image_sources() {
            source.resource.wait();
        }
        for face in &self.font_faces {
            face.resource.wait();
        }
    }

    /// Builds the SVG fonts of every completed `@font-face` slot and
    /// registers their families. Slots still loading are kept.
    pub fn install_font_faces(&mut self) {
        let (loaded, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.font_faces)
            .into_iter()
            .partition(|face| face.resource.is_loaded());
        self.font_faces = pending;
        for face in loaded {
            if let Some(bytes) = face.resource.data() {
                crate::builder::install_font_face(self, &face.family, face.resource.href(), &bytes);
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.screen.is_ready(self)
    }

    pub(crate) fn loader(&self) -> &ResourceLoader {
        &self.loader
    }
}
