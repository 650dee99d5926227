//! Request resolution
//!
//! Turns one `PathRequest` into zero or more thumbnails, in this order:
//! 1. the path itself, when it is a directly loadable image
//! 2. otherwise every file in the path's thumbnail folder
//! 3. plus, for shader assets, the referenced colour map
//!
//! A candidate that fails to load is skipped; it never fails the request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::gpu::RenderDevice;
use crate::state::{LoadedThumbnail, PathRequest};
use crate::thumbnail::classify::AssetClassifier;
use crate::thumbnail::decode;

/// Folder holding the pre-baked thumbnails of `path`
///
/// The folder name is the BLAKE3 hash of the path's string form.
pub fn thumbnail_folder(root: &Path, path: &Path) -> PathBuf {
    let hash = blake3::hash(path.to_string_lossy().as_bytes());
    root.join(hash.to_hex().as_str())
}

/// Files directly inside `folder`, sorted by file name
///
/// A missing folder yields nothing.
pub fn folder_candidates(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Everything `resolve` produced for one request
#[derive(Debug, Default)]
pub struct Resolution {
    pub thumbnails: Vec<Arc<LoadedThumbnail>>,
    /// Candidates that were attempted but could not be loaded
    pub failed: usize,
}

pub struct Resolver {
    thumbnail_directory: PathBuf,
    thumbnail_size: u32,
    classifier: Arc<dyn AssetClassifier>,
}

impl Resolver {
    pub fn new(
        thumbnail_directory: PathBuf,
        thumbnail_size: u32,
        classifier: Arc<dyn AssetClassifier>,
    ) -> Self {
        Self {
            thumbnail_directory,
            thumbnail_size,
            classifier,
        }
    }

    pub fn thumbnail_directory(&self) -> &Path {
        &self.thumbnail_directory
    }

    pub fn resolve(&self, device: &Arc<dyn RenderDevice>, request: &PathRequest) -> Resolution {
        let path = request.path();
        let mut resolution = Resolution::default();

        if self.classifier.is_loadable_image(path) {
            self.load_candidate(device, path, &mut resolution);
            return resolution;
        }

        let folder = thumbnail_folder(&self.thumbnail_directory, path);
        match folder_candidates(&folder) {
            Ok(candidates) => {
                for candidate in candidates {
                    self.load_candidate(device, &candidate, &mut resolution);
                }
            }
            Err(e) => {
                warn!(folder = %folder.display(), "failed to list thumbnail folder: {e}");
                resolution.failed += 1;
            }
        }

        if self.classifier.is_shader_asset(path) {
            match self.classifier.color_map_path(path) {
                Ok(Some(color_map)) => {
                    if color_map.exists() && self.classifier.is_loadable_image(&color_map) {
                        self.load_candidate(device, &color_map, &mut resolution);
                    } else {
                        debug!(
                            shader = %path.display(),
                            color_map = %color_map.display(),
                            "colour map missing or not an image"
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(shader = %path.display(), "failed to read shader asset: {e}");
                    resolution.failed += 1;
                }
            }
        }

        resolution
    }

    fn load_candidate(
        &self,
        device: &Arc<dyn RenderDevice>,
        candidate: &Path,
        resolution: &mut Resolution,
    ) {
        match self.load(device, candidate) {
            Ok(thumbnail) => resolution.thumbnails.push(Arc::new(thumbnail)),
            Err(e) => {
                warn!(candidate = %candidate.display(), "skipping thumbnail: {e}");
                resolution.failed += 1;
            }
        }
    }

    fn load(&self, device: &Arc<dyn RenderDevice>, candidate: &Path) -> Result<LoadedThumbnail> {
        let pixels = decode::decode_thumbnail(candidate, self.thumbnail_size)?;
        let texture = device.upload(&pixels)?;
        Ok(LoadedThumbnail::new(
            Arc::downgrade(device),
            texture,
            pixels.dimensions(),
            candidate.to_path_buf(),
        ))
    }
}
