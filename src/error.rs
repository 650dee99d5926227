//! Error types for the thumbnail loader

use std::path::PathBuf;

use crate::gpu::DeviceError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("there was an i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error while loading the image (via the `image` crate): {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to enumerate thumbnail folder: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read shader asset {}: {source}", path.display())]
    ShaderAsset {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid loader config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("render device rejected the upload: {0}")]
    Device(#[from] DeviceError),
    #[error("failed to spawn the loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("the render device went away while the loader was still running")]
    DeviceGone,
    #[error("ready signal fired with an empty request queue")]
    QueueInvariant,
    #[error("the loader thread panicked")]
    WorkerPanicked,
    #[error("the image provided is unsupported: {}", .0.display())]
    UnsupportedImage(PathBuf),
    #[error("no embedded JPEG preview found in {}", .0.display())]
    NoEmbeddedPreview(PathBuf),
}
