//! Event-driven image preloading.
//!
//! A [`Loader`] takes one or more image URLs, fetches them either all at once
//! or one after another, and reports each resolution to an `on_progress`
//! callback and the end of the batch to an `on_complete` callback.
//!
//! ```no_run
//! use imgpreload::{Loader, Options};
//!
//! # async fn run() {
//! let loader = Loader::new(
//!     ["https://example.com/a.png", "images/b.gif"],
//!     Options::new()
//!         .parallel(false)
//!         .on_progress(|event| println!("{} -> {}", event.url, event.status)),
//! );
//! loader.wait().await;
//! # }
//! ```

pub mod loader;
pub mod source;

pub use loader::{
    CompletionEvent, ImageHandle, Loader, LoaderConfig, Options, ProgressEvent, Status, Urls,
    FAILED, LOADED, LOADING, NOT_LOADED,
};
pub use source::{DefaultSource, ImageSource};
