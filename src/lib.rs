//! Asynchronous thumbnail loading for asset browsers
//!
//! A `Loader` runs one background thread that turns queued file paths into
//! device textures while the UI keeps running. Results are delivered
//! through a multicast `ResultDispatcher`, one `ResultArgs` per request.

pub mod config;
pub mod error;
pub mod gpu;
pub mod loader;
pub mod state;
pub mod thumbnail;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use gpu::{HeadlessDevice, RecoveryState, RenderDevice, TextureId};
pub use loader::{Loader, ResultDispatcher, SubscriptionId};
pub use state::{LoadedThumbnail, LoaderStats, PathRequest, ResultArgs};
pub use thumbnail::{AssetClassifier, ExtensionClassifier};
