use super::{handle::ImageHandle, Loader, Status};

/// Fired once per resolved image, success or failure.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    pub loader: Loader,
    pub image: ImageHandle,
    pub url: String,
    /// Position of the image in the loader's items, not the resolution order.
    pub index: usize,
    pub status: Status,
    pub success: bool,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Fired once per load cycle, after the last progress event of that cycle.
#[derive(Clone, Debug)]
pub struct CompletionEvent {
    pub loader: Loader,
    pub images: Vec<ImageHandle>,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProgressEvent {
    pub(super) fn new(
        loader: Loader,
        image: ImageHandle,
        index: usize,
        completed: usize,
        failed: usize,
        total: usize,
    ) -> Self {
        let status = image.status();
        ProgressEvent {
            loader,
            url: image.url().to_owned(),
            index,
            status,
            success: status == Status::Loaded,
            image,
            completed,
            failed,
            total,
        }
    }
}
