//! Fire-and-forget loading of images, external SVG documents and SVG fonts.
//!
//! Every resource gets a [`Resource`] slot whose `loaded` flag the scheduler
//! polls. Failures are logged and still mark the slot loaded, so a missing
//! file never keeps a document from becoming ready.

use crate::error::{CanvgError, CanvgResult};
use base64::Engine;
use lazy_static::lazy_static;
use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

static CANVG_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref RESOURCE_TOKIO_RUNTIME: tokio::runtime::Runtime =
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to construct resource runtime");
    static ref REQWEST_CLIENT: Client = reqwest::ClientBuilder::new()
        .user_agent(CANVG_USER_AGENT)
        .build()
        .expect("Failed to construct reqwest client");
    static ref REQWEST_CLIENT_ANONYMOUS: Client = reqwest::ClientBuilder::new()
        .user_agent(CANVG_USER_AGENT)
        .referer(false)
        .build()
        .expect("Failed to construct reqwest client");
}

/// Replaces file and network access: maps an href to its bytes.
pub type FetchHook = Arc<dyn Fn(&str) -> CanvgResult<Vec<u8>> + Send + Sync>;

/// One asynchronously loading resource.
#[derive(Default)]
pub struct Resource {
    href: String,
    loaded: AtomicBool,
    data: Mutex<Option<Vec<u8>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("href", &self.href)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Resource {
    fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            ..Default::default()
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// The fetched bytes, once loaded. `None` while pending or after a failure.
    pub fn data(&self) -> Option<Vec<u8>> {
        if !self.is_loaded() {
            return None;
        }
        self.data.lock().ok().and_then(|data| data.clone())
    }

    fn finish(&self, result: CanvgResult<Vec<u8>>) {
        match result {
            Ok(bytes) => {
                debug!(target: "canvg::resources", "loaded {} ({} bytes)", self.href, bytes.len());
                if let Ok(mut data) = self.data.lock() {
                    *data = Some(bytes);
                }
            }
            Err(err) => {
                error!(target: "canvg::resources", "Error while loading \"{}\": {}", self.href, err);
            }
        }
        self.loaded.store(true, Ordering::Release);
    }

    /// Blocks until the load task has finished.
    pub fn wait(&self) {
        let task = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(task) = task {
            if let Err(err) = RESOURCE_TOKIO_RUNTIME.block_on(task) {
                error!(target: "canvg::resources", "load task for {} failed: {}", self.href, err);
                self.loaded.store(true, Ordering::Release);
            }
        }
    }
}

/// Resolves hrefs to bytes: `data:` URIs inline, everything else through the
/// fetch hook, the filesystem or HTTP.
#[derive(Clone, Default)]
pub struct ResourceLoader {
    fetch: Option<FetchHook>,
    anonymous_cross_origin: bool,
    base_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("has_fetch_hook", &self.fetch.is_some())
            .field("anonymous_cross_origin", &self.anonymous_cross_origin)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl ResourceLoader {
    pub fn new(fetch: Option<FetchHook>, anonymous_cross_origin: bool) -> Self {
        Self {
            fetch,
            anonymous_cross_origin,
            base_dir: None,
        }
    }

    /// Relative file paths resolve against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Starts loading `href` and returns its slot immediately.
    pub fn spawn(&self, href: &str) -> Arc<Resource> {
        let resource = Arc::new(Resource::new(href));
        if href.trim_start().starts_with("data:") {
            resource.finish(decode_data_uri(href));
            return resource;
        }

        let target = resource.clone();
        let href = href.to_string();
        let task = match &self.fetch {
            // The hook may block, so it runs off the async workers.
            Some(fetch) => {
                let fetch = fetch.clone();
                RESOURCE_TOKIO_RUNTIME.spawn_blocking(move || target.finish(fetch(&href)))
            }
            None => {
                let loader = self.clone();
                RESOURCE_TOKIO_RUNTIME.spawn(async move {
                    let result = loader.fetch_async(&href).await;
                    target.finish(result);
                })
            }
        };
        if let Ok(mut slot) = resource.task.lock() {
            *slot = Some(task);
        }
        resource
    }

    /// Fetches `href` on the calling thread.
    pub fn fetch_blocking(&self, href: &str) -> CanvgResult<Vec<u8>> {
        if href.trim_start().starts_with("data:") {
            return decode_data_uri(href);
        }
        if let Some(fetch) = &self.fetch {
            return fetch(href);
        }
        RESOURCE_TOKIO_RUNTIME.block_on(self.fetch_async(href))
    }

    async fn fetch_async(&self, href: &str) -> CanvgResult<Vec<u8>> {
        if href.starts_with("http://") || href.starts_with("https://") {
            let client = if self.anonymous_cross_origin {
                &*REQWEST_CLIENT_ANONYMOUS
            } else {
                &*REQWEST_CLIENT
            };
            info!(target: "canvg::resources", "fetching {href}");
            let response = client.get(href).send().await?;
            return match response.status() {
                StatusCode::OK => Ok(response.bytes().await?.to_vec()),
                status => Err(CanvgError::Fetch(format!("{href}: HTTP {status}"))),
            };
        }

        let path = href.strip_prefix("file://").unwrap_or(href);
        let path = match &self.base_dir {
            Some(base) if PathBuf::from(path).is_relative() => base.join(path),
            _ => PathBuf::from(path),
        };
        Ok(tokio::fs::read(&path).await?)
    }
}

/// Decodes a `data:` URI, base64 or percent-encoded.
pub fn decode_data_uri(uri: &str) -> CanvgResult<Vec<u8>> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| CanvgError::InvalidArgument(format!("not a data URI: {uri}")))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| CanvgError::InvalidArgument("data URI without payload".to_string()))?;
    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|err| CanvgError::Fetch(format!("invalid base64 payload: {err}")))
    } else {
        Ok(urlencoding::decode_binary(data.as_bytes()).into_owned())
    }
}

/// True for hrefs that point at SVG content.
pub fn is_svg_href(href: &str) -> bool {
    let trimmed = href.trim_start();
    trimmed.ends_with(".svg")
        || trimmed
            .get(..19)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/svg+xml;"))
        || trimmed
            .get(..19)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/svg+xml,"))
}
