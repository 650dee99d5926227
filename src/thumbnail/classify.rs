//! Asset classification
//!
//! Decides, for a requested path, whether it is an image we can show
//! directly or an asset whose previews live elsewhere (a pre-baked
//! thumbnail folder, and for shaders their colour map).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::thumbnail::decode;

/// Answers the three questions the resolver asks about a path
pub trait AssetClassifier: Send + Sync {
    fn is_loadable_image(&self, path: &Path) -> bool;

    fn is_shader_asset(&self, path: &Path) -> bool;

    /// Colour map referenced by a shader asset, if it names one
    fn color_map_path(&self, shader: &Path) -> Result<Option<PathBuf>>;
}

/// Shader asset metadata, stored as JSON next to the asset
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ShaderAsset {
    /// Path of the colour map texture, relative to the shader file or absolute
    #[serde(default)]
    pub color_map: Option<PathBuf>,
}

impl ShaderAsset {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|source| Error::ShaderAsset {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Classifies by file extension
///
/// Images are whatever `decode` can read; shader assets are files whose
/// full extension (everything after the first dot of the file name)
/// matches `shader_extension`.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    shader_extension: String,
}

impl ExtensionClassifier {
    pub fn new(shader_extension: impl Into<String>) -> Self {
        Self {
            shader_extension: shader_extension.into().trim_start_matches('.').to_lowercase(),
        }
    }
}

/// `"wood.shader.json"` -> `"shader.json"`
fn full_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let (_, ext) = name.split_once('.')?;
    Some(ext.to_lowercase())
}

impl AssetClassifier for ExtensionClassifier {
    fn is_loadable_image(&self, path: &Path) -> bool {
        decode::is_supported_image(path)
    }

    fn is_shader_asset(&self, path: &Path) -> bool {
        full_extension(path).is_some_and(|ext| ext == self.shader_extension)
    }

    fn color_map_path(&self, shader: &Path) -> Result<Option<PathBuf>> {
        let asset = ShaderAsset::load(shader)?;
        let Some(color_map) = asset.color_map else {
            return Ok(None);
        };

        if color_map.is_absolute() {
            return Ok(Some(color_map));
        }

        let base = shader.parent().unwrap_or_else(|| Path::new(""));
        Ok(Some(base.join(color_map)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_extension() {
        assert_eq!(
            full_extension(Path::new("/a/wood.shader.json")).as_deref(),
            Some("shader.json")
        );
        assert_eq!(full_extension(Path::new("plain")), None);
    }

    #[test]
    fn test_shader_detection() {
        let classifier = ExtensionClassifier::new(".shader.json");
        assert!(classifier.is_shader_asset(Path::new("assets/Wood.SHADER.json")));
        assert!(!classifier.is_shader_asset(Path::new("assets/wood.json")));
        assert!(!classifier.is_loadable_image(Path::new("assets/wood.shader.json")));
        assert!(classifier.is_loadable_image(Path::new("assets/wood.png")));
    }

    #[test]
    fn test_color_map_relative_to_shader() {
        let dir = tempfile::tempdir().unwrap();
        let shader = dir.path().join("wood.shader.json");
        fs::write(&shader, r#"{ "color_map": "textures/wood.png" }"#).unwrap();

        let classifier = ExtensionClassifier::new("shader.json");
        let color_map = classifier.color_map_path(&shader).unwrap();
        assert_eq!(color_map, Some(dir.path().join("textures/wood.png")));
    }

    #[test]
    fn test_shader_without_color_map() {
        let dir = tempfile::tempdir().unwrap();
        let shader = dir.path().join("flat.shader.json");
        fs::write(&shader, "{}").unwrap();

        let classifier = ExtensionClassifier::new("shader.json");
        assert_eq!(classifier.color_map_path(&shader).unwrap(), None);
    }

    #[test]
    fn test_malformed_shader() {
        let dir = tempfile::tempdir().unwrap();
        let shader = dir.path().join("bad.shader.json");
        fs::write(&shader, "{ not json").unwrap();

        let classifier = ExtensionClassifier::new("shader.json");
        let err = classifier.color_map_path(&shader).unwrap_err();
        assert!(matches!(err, Error::ShaderAsset { .. }));
    }
}
