//! Shared data structures handed from the loader thread to subscribers
//!
//! These structs represent what flows out of the pipeline: the loaded
//! textures and the per-request outcome record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::gpu::{RenderDevice, TextureId};
use crate::state::request::PathRequest;

/// A decoded preview image resident on a render device
///
/// The texture is released on the originating device when the last
/// reference is dropped, provided the device still exists.
pub struct LoadedThumbnail {
    texture: TextureId,
    width: u32,
    height: u32,
    /// File the pixels were decoded from (the request path itself, a file
    /// in its thumbnail folder, or a shader colour map)
    source: PathBuf,
    device: Weak<dyn RenderDevice>,
}

impl LoadedThumbnail {
    pub fn new(
        device: Weak<dyn RenderDevice>,
        texture: TextureId,
        (width, height): (u32, u32),
        source: PathBuf,
    ) -> Self {
        Self {
            texture,
            width,
            height,
            source,
            device,
        }
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The device this texture lives on, if it is still alive
    pub fn device(&self) -> Option<Arc<dyn RenderDevice>> {
        self.device.upgrade()
    }
}

impl fmt::Debug for LoadedThumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedThumbnail")
            .field("texture", &self.texture)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("source", &self.source)
            .finish()
    }
}

impl Drop for LoadedThumbnail {
    fn drop(&mut self) {
        if let Some(device) = self.device.upgrade() {
            device.release(self.texture);
        }
    }
}

/// Outcome of one request, raised exactly once per request
#[derive(Debug, Clone)]
pub struct ResultArgs {
    pub request: PathRequest,
    /// In resolution order; may be empty
    pub thumbnails: Vec<Arc<LoadedThumbnail>>,
    /// `true` when the request was drained by `stop` before it started
    pub cancelled: bool,
}

impl ResultArgs {
    pub fn completed(request: PathRequest, thumbnails: Vec<Arc<LoadedThumbnail>>) -> Self {
        Self {
            request,
            thumbnails,
            cancelled: false,
        }
    }

    pub fn cancelled(request: PathRequest) -> Self {
        Self {
            request,
            thumbnails: Vec::new(),
            cancelled: true,
        }
    }

    pub fn path(&self) -> &Path {
        self.request.path()
    }
}

/// Snapshot of the loader's bookkeeping counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Ready-signal increments issued by `enqueue` (one per new path)
    pub signals: usize,
    /// Repeat requests that only moved an entry to the front
    pub reprioritized: usize,
    /// Requests popped and resolved by the loader thread
    pub serviced: usize,
    /// Requests drained by `stop`
    pub cancelled: usize,
    /// Thumbnails delivered across all completed requests
    pub thumbnails: usize,
    /// Candidates that failed to load and were skipped
    pub failed_candidates: usize,
}

impl LoaderStats {
    /// Requests that have been enqueued but not yet consumed
    pub fn outstanding(&self) -> usize {
        self.signals.saturating_sub(self.serviced + self.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use image::RgbaImage;

    #[test]
    fn test_drop_releases_texture() {
        let device = Arc::new(HeadlessDevice::new());
        let texture = device.upload(&RgbaImage::new(2, 2)).unwrap();
        let weak: Weak<dyn RenderDevice> = Arc::downgrade(&device) as Weak<dyn RenderDevice>;

        let thumbnail = Arc::new(LoadedThumbnail::new(weak, texture, (2, 2), "a.png".into()));
        let retained = Arc::clone(&thumbnail);
        drop(thumbnail);
        assert_eq!(device.texture_count(), 1);

        drop(retained);
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_drop_after_device_is_gone() {
        let device = Arc::new(HeadlessDevice::new());
        let texture = device.upload(&RgbaImage::new(1, 1)).unwrap();
        let weak: Weak<dyn RenderDevice> = Arc::downgrade(&device) as Weak<dyn RenderDevice>;
        let thumbnail = LoadedThumbnail::new(weak, texture, (1, 1), "a.png".into());

        drop(device);
        assert!(thumbnail.device().is_none());
        drop(thumbnail);
    }

    #[test]
    fn test_cancelled_args_are_empty() {
        let args = ResultArgs::cancelled("a.png".into());
        assert!(args.cancelled);
        assert!(args.thumbnails.is_empty());
        assert_eq!(args.path(), Path::new("a.png"));
    }
}
