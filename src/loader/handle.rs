use std::{fmt::Display, sync::Arc};

use image::DynamicImage;

/// Load status of a single image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Never attempted in the current cycle.
    NotLoaded,
    Loading,
    Loaded,
    /// Attempted, and the fetch or the decode failed (or was aborted).
    Failed,
}

pub const NOT_LOADED: Status = Status::NotLoaded;
pub const LOADING: Status = Status::Loading;
pub const LOADED: Status = Status::Loaded;
pub const FAILED: Status = Status::Failed;

impl Status {
    pub fn as_str(&self) -> &'static str {
        use Status::*;
        match self {
            NotLoaded => "not-loaded",
            Loading => "loading",
            Loaded => "loaded",
            Failed => "failed",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL's loading attempt. Handles handed out by the loader are
/// snapshots: they do not change after being returned.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    pub(crate) id: u64,
    url: String,
    index: usize,
    pub(crate) status: Status,
    pub(crate) image: Option<Arc<DynamicImage>>,
}

impl ImageHandle {
    pub(crate) fn new(id: u64, url: String, index: usize) -> Self {
        ImageHandle {
            id,
            url,
            index,
            status: Status::NotLoaded,
            image: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Position of the URL in the list the image was loaded from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The decoded image, present only once the status is `Loaded`.
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    /// Two handles are the same attempt if they came from the same issued load.
    pub fn same_attempt(&self, other: &ImageHandle) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_match_the_wire_strings() {
        assert_eq!(NOT_LOADED.to_string(), "not-loaded");
        assert_eq!(LOADING.to_string(), "loading");
        assert_eq!(LOADED.to_string(), "loaded");
        assert_eq!(FAILED.to_string(), "failed");
    }

    #[test]
    fn new_handle_starts_not_loaded() {
        let handle = ImageHandle::new(7, "a.png".to_owned(), 2);
        assert_eq!(handle.status(), NOT_LOADED);
        assert_eq!(handle.index(), 2);
        assert_eq!(handle.url(), "a.png");
        assert!(handle.image().is_none());
        assert!(handle.same_attempt(&handle.clone()));
        assert!(!handle.same_attempt(&ImageHandle::new(8, "a.png".to_owned(), 2)));
    }
}
