// Preloads a list of images, either all at once or one after another, and
// reports every resolution through the progress and completion callbacks.
//
// Fetches run as spawned tasks. Their outcomes are funneled through a single
// driver task, so counters, handles and callbacks are only ever touched from
// one place at a time.

mod events;
mod handle;
mod options;

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use image::DynamicImage;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::source::{DefaultSource, ImageSource};

pub use events::{CompletionEvent, ProgressEvent};
pub use handle::{ImageHandle, Status, FAILED, LOADED, LOADING, NOT_LOADED};
pub use options::{CompleteCallback, LoaderConfig, Options, ProgressCallback, Urls};

struct Resolution {
    generation: u64,
    handle_id: u64,
    outcome: anyhow::Result<DynamicImage>,
}

// One call to `load()`. The URL list and the sequencing mode are frozen for
// the lifetime of the cycle.
#[derive(Default)]
struct Cycle {
    generation: u64,
    urls: Arc<Vec<String>>,
    parallel: bool,
    completed: usize,
    failed: usize,
    current_index: usize,
    finished: bool,
}

struct State {
    urls: Vec<String>,
    config: LoaderConfig,
    cycle: Cycle,
    items: Vec<ImageHandle>,
    next_handle_id: u64,
}

struct Inner {
    state: Mutex<State>,
    source: Arc<dyn ImageSource>,
    resolutions: mpsc::Sender<Resolution>,
    // generation of the last cycle that finished
    settled: watch::Sender<u64>,
}

/// Event-driven image preloader. Cloning gives another handle to the same loader.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<Inner>,
}

impl Loader {
    /// Creates a loader backed by [`DefaultSource`], and starts loading right
    /// away if `auto_start` is set and there is anything to load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(urls: impl Into<Urls>, options: Options) -> Self {
        Self::with_source(urls, options, DefaultSource::new())
    }

    pub fn with_source(urls: impl Into<Urls>, options: Options, source: impl ImageSource) -> Self {
        let mut config = LoaderConfig::default();
        config.merge(options);

        let (resolutions, receiver) = mpsc::channel(16);
        let (settled, _) = watch::channel(0);

        let loader = Loader {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    urls: vec![],
                    config,
                    cycle: Cycle::default(),
                    items: vec![],
                    next_handle_id: 0,
                }),
                source: Arc::new(source),
                resolutions,
                settled,
            }),
        };

        tokio::spawn(drive(receiver, Arc::downgrade(&loader.inner)));

        loader.set_urls(urls);

        let auto_start = {
            let state = loader.state();
            state.config.auto_start && !state.urls.is_empty()
        };
        if auto_start {
            loader.load();
        }

        loader
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Overrides the given keys of the current configuration. A cycle that
    /// is already running keeps its sequencing mode.
    pub fn set_options(&self, options: Options) -> &Self {
        self.state().config.merge(options);
        self
    }

    /// Replaces the URL list. Takes effect on the next `load()`.
    pub fn set_urls(&self, urls: impl Into<Urls>) -> &Self {
        self.state().urls = urls.into().into_vec();
        self
    }

    /// Starts a new load cycle and returns immediately.
    ///
    /// Loads still in flight from an earlier cycle are not cancelled, but
    /// their outcomes are dropped once they arrive.
    pub fn load(&self) -> &Self {
        // The whole fan-out is one critical section: the driver cannot resolve
        // anything of this cycle before every parallel fetch has been issued.
        let mut state = self.state();

        let generation = state.cycle.generation + 1;
        let urls = Arc::new(state.urls.clone());
        let parallel = state.config.parallel;

        state.cycle = Cycle {
            generation,
            urls: urls.clone(),
            parallel,
            ..Cycle::default()
        };
        state.items.clear();

        info!(
            "Loading {} images ({})",
            urls.len(),
            if parallel { "parallel" } else { "serial" }
        );

        if parallel {
            for index in 0..urls.len() {
                self.issue(&mut state, index);
            }
        } else if !urls.is_empty() {
            self.issue(&mut state, 0);
        }

        self
    }

    // Issues one load of the running cycle. Called with the state locked.
    fn issue(&self, state: &mut State, index: usize) {
        let generation = state.cycle.generation;
        let Some(url) = state.cycle.urls.get(index).cloned() else {
            return;
        };

        let handle_id = state.next_handle_id;
        state.next_handle_id += 1;

        let mut handle = ImageHandle::new(handle_id, url.clone(), index);
        handle.status = Status::Loading;

        if index < state.items.len() {
            state.items[index] = handle;
        } else {
            state.items.push(handle);
        }

        debug!("Issuing load #{} for {}", index, url);

        // the route back is in place before the fetch is triggered
        let resolutions = self.inner.resolutions.clone();
        let fetch = self.inner.source.fetch(url);

        tokio::spawn(async move {
            let outcome = fetch.await;
            let resolution = Resolution {
                generation,
                handle_id,
                outcome,
            };
            let _ = resolutions.send(resolution).await; // driver outlives every sender
        });
    }

    fn resolve(&self, resolution: Resolution) {
        let Resolution {
            generation,
            handle_id,
            outcome,
        } = resolution;

        let (progress, completion, next, on_progress, on_complete) = {
            let mut guard = self.state();
            let state = &mut *guard;

            if state.cycle.generation != generation {
                debug!("Discarding resolution from stale load cycle {}", generation);
                return;
            }

            let Some(index) = state.items.iter().position(|h| h.id == handle_id) else {
                return;
            };

            let handle = &mut state.items[index];
            let cycle = &mut state.cycle;

            match outcome {
                Ok(image) => {
                    handle.status = Status::Loaded;
                    handle.image = Some(Arc::new(image));
                    cycle.completed += 1;
                }
                Err(err) => {
                    warn!("Failed to load {}: {:#}", handle.url(), err);
                    handle.status = Status::Failed;
                    cycle.failed += 1;
                }
            }

            let total = cycle.urls.len();
            let progress = ProgressEvent::new(
                self.clone(),
                handle.clone(),
                index,
                cycle.completed,
                cycle.failed,
                total,
            );

            let completion = if cycle.completed + cycle.failed == total {
                cycle.finished = true;
                Some(CompletionEvent {
                    loader: self.clone(),
                    images: state.items.clone(),
                    completed: cycle.completed,
                    failed: cycle.failed,
                    total,
                })
            } else {
                None
            };

            let next = if cycle.parallel {
                None
            } else {
                cycle.current_index += 1;
                Some(cycle.current_index).filter(|next| *next < total)
            };

            (
                progress,
                completion,
                next,
                state.config.on_progress.clone(),
                state.config.on_complete.clone(),
            )
        };

        // callbacks run without the lock so they may call back into the loader
        if let Some(on_progress) = on_progress {
            on_progress(&progress);
        }

        if let Some(completion) = completion {
            info!(
                "Finished loading {} images, {} failed",
                completion.total, completion.failed
            );
            on_complete(&completion);
            self.inner.settled.send_replace(generation);
        }

        if let Some(next) = next {
            let mut state = self.state();
            // a callback may have started a new cycle in the meantime
            if state.cycle.generation == generation {
                self.issue(&mut state, next);
            }
        }
    }

    /// Waits until the current cycle has finished. Returns immediately when
    /// nothing is pending, including when there are no URLs at all.
    pub async fn wait(&self) {
        let mut settled = self.inner.settled.subscribe();
        loop {
            let (generation, nothing_to_load) = {
                let state = self.state();
                (state.cycle.generation, state.cycle.urls.is_empty())
            };
            // published only after `on_complete` has returned
            if nothing_to_load || *settled.borrow_and_update() == generation {
                return;
            }
            if settled.changed().await.is_err() {
                return;
            }
        }
    }

    /// All handles created so far in the current cycle, whatever their status.
    pub fn get_images(&self) -> Vec<ImageHandle> {
        self.state().items.clone()
    }

    pub fn get_completed(&self) -> Vec<ImageHandle> {
        self.with_status(Status::Loaded)
    }

    pub fn get_failed(&self) -> Vec<ImageHandle> {
        self.with_status(Status::Failed)
    }

    fn with_status(&self, status: Status) -> Vec<ImageHandle> {
        self.state()
            .items
            .iter()
            .filter(|handle| handle.status == status)
            .cloned()
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.state().urls.clone()
    }

    pub fn completed_count(&self) -> usize {
        self.state().cycle.completed
    }

    pub fn failed_count(&self) -> usize {
        self.state().cycle.failed
    }

    /// Number of URLs in the current cycle.
    pub fn total(&self) -> usize {
        self.state().cycle.urls.len()
    }

    pub fn is_complete(&self) -> bool {
        self.state().cycle.finished
    }

    pub fn ptr_eq(&self, other: &Loader) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Loader");
        if let Ok(state) = self.inner.state.try_lock() {
            out.field("urls", &state.urls.len())
                .field("generation", &state.cycle.generation)
                .field("completed", &state.cycle.completed)
                .field("failed", &state.cycle.failed)
                .field("total", &state.cycle.urls.len());
        } else {
            out.field("state", &"<locked>");
        }
        out.finish()
    }
}

// Single consumer of fetch outcomes. Holds the loader weakly so that dropping
// every `Loader` lets the channel close once in-flight fetches are done.
async fn drive(mut resolutions: mpsc::Receiver<Resolution>, inner: Weak<Inner>) {
    while let Some(resolution) = resolutions.recv().await {
        let Some(inner) = inner.upgrade() else {
            debug!("Loader dropped, ignoring resolution");
            continue;
        };
        Loader { inner }.resolve(resolution);
    }
}
