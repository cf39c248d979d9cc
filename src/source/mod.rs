// Fetching and decoding of single images. The loader only ever sees the
// outcome of a fetch: an image, or an error it folds into the failed status.

mod fetchers;
mod resource_path;

use std::{future::Future, path::PathBuf, pin::Pin, sync::Arc};

use anyhow::Context;
use image::DynamicImage;
use tracing::debug;

pub use resource_path::ResourcePath;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The host primitive that turns a URL into an image.
///
/// `fetch` is called exactly once per issued load, after the loader has
/// registered the handle, and the returned future resolves exactly once.
/// The loader is locked while `fetch` runs, so it must not call back into it;
/// the actual work belongs in the returned future.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, url: String) -> BoxFuture<anyhow::Result<DynamicImage>>;
}

impl<F> ImageSource for F
where
    F: Fn(String) -> BoxFuture<anyhow::Result<DynamicImage>> + Send + Sync + 'static,
{
    fn fetch(&self, url: String) -> BoxFuture<anyhow::Result<DynamicImage>> {
        self(url)
    }
}

/// Loads images over http(s), from `data:` URLs and from the filesystem.
#[derive(Clone, Debug)]
pub struct DefaultSource {
    client: reqwest::Client,
    root: Arc<PathBuf>,
}

impl DefaultSource {
    pub fn new() -> Self {
        Self::with_root(".")
    }

    /// Relative filesystem paths are resolved against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        DefaultSource {
            client: reqwest::Client::new(),
            root: Arc::new(root.into()),
        }
    }
}

impl Default for DefaultSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for DefaultSource {
    fn fetch(&self, url: String) -> BoxFuture<anyhow::Result<DynamicImage>> {
        let client = self.client.clone();
        let root = self.root.clone();

        Box::pin(async move {
            let bytes = fetchers::load_any(&client, &root, &url).await?;
            debug!("Fetched {} bytes for {}", bytes.len(), ResourcePath::from(url.as_str()));

            tokio::task::spawn_blocking(move || fetchers::decode(&bytes))
                .await
                .context("Decoder task failed to finish")?
        })
    }
}
