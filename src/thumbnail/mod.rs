//! Thumbnail resolution
//!
//! This module handles:
//! - Classifying requested paths (images, assets, shader assets)
//! - Decoding image files and embedded RAW previews
//! - Locating pre-baked thumbnail folders
//! - Turning a request into loaded device textures

pub mod classify;
pub mod decode;
pub mod resolve;

pub use classify::{AssetClassifier, ExtensionClassifier, ShaderAsset};
pub use resolve::{thumbnail_folder, Resolution, Resolver};
