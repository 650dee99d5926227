//! Image decoding for thumbnail candidates
//!
//! Regular image files go straight through the `image` crate. Camera RAW
//! files are not decoded; instead the largest embedded JPEG preview is
//! pulled out of the container and decoded.

use image::{imageops::FilterType, DynamicImage, ImageFormat, RgbaImage};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Camera RAW extensions whose embedded preview we can use
pub const RAW_EXTENSIONS: [&str; 16] = [
    "nef", "dng", "cr2", "cr3", "arw", "raf", "orf", "rw2", "pef", "srw", "erf", "kdc", "dcr",
    "mos", "raw", "rwl",
];

/// How far into a RAW file to look for a preview, and the smallest stream
/// accepted at each depth. Most cameras put the full-size preview near the
/// start, so the narrow windows are tried first.
const PREVIEW_TIERS: [(usize, usize); 3] = [
    (256 * 1024, 50_000),
    (512 * 1024, 30_000),
    (5 * 1024 * 1024, 10_000),
];

/// Nothing past this offset is ever read from a RAW file
const MAX_PREVIEW_SCAN: u64 = 5 * 1024 * 1024;

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn is_raw_file(path: &Path) -> bool {
    extension(path).is_some_and(|ext| RAW_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether `path` names a file this module knows how to decode
pub fn is_supported_image(path: &Path) -> bool {
    if is_raw_file(path) {
        return true;
    }

    ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

/// Decode `path` into RGBA pixels no larger than `max_size` on either side
pub fn decode_thumbnail(path: &Path, max_size: u32) -> Result<RgbaImage> {
    let img = if is_raw_file(path) {
        let data = read_head(path, MAX_PREVIEW_SCAN)?;
        let jpeg = embedded_preview(&data)
            .ok_or_else(|| Error::NoEmbeddedPreview(path.to_path_buf()))?;
        image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?
    } else if is_supported_image(path) {
        image::open(path)?
    } else {
        return Err(Error::UnsupportedImage(path.to_path_buf()));
    };

    Ok(fit(img, max_size).into_rgba8())
}

/// Read at most `max_bytes` from the start of `path`
fn read_head(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    File::open(path)?.take(max_bytes).read_to_end(&mut data)?;
    Ok(data)
}

/// Pick the preview from the head of a RAW file, widening the window tier
/// by tier and finally accepting any complete stream
fn embedded_preview(data: &[u8]) -> Option<&[u8]> {
    PREVIEW_TIERS
        .iter()
        .find_map(|&(window, min_size)| {
            extract_largest_jpeg(&data[..window.min(data.len())], min_size)
        })
        .or_else(|| extract_largest_jpeg(data, 0))
}

/// Downscale to fit a `max_size` square, keeping aspect ratio
fn fit(img: DynamicImage, max_size: u32) -> DynamicImage {
    if img.width() <= max_size && img.height() <= max_size {
        return img;
    }
    img.resize(max_size, max_size, FilterType::Lanczos3)
}

/// Find the largest complete JPEG stream inside `data`
///
/// Streams are delimited by SOI (`FF D8`) and the first EOI (`FF D9`)
/// after it. Streams of `min_size` bytes or less are ignored. Runs in one
/// pass: each EOI is searched for once and shared by every SOI ahead of it.
fn extract_largest_jpeg(data: &[u8], min_size: usize) -> Option<&[u8]> {
    let jpeg_start = [0xFF, 0xD8];
    let jpeg_end = [0xFF, 0xD9];

    let mut best: Option<&[u8]> = None;
    let mut next_end: Option<usize> = None;

    for (i, window) in data.windows(2).enumerate() {
        if window != jpeg_start {
            continue;
        }

        let end = match next_end {
            Some(end) if end >= i => end,
            _ => match data[i..].windows(2).position(|w| w == jpeg_end) {
                Some(offset) => i + offset,
                // no EOI after this point, so no later SOI can close either
                None => break,
            },
        };
        next_end = Some(end);
        let candidate = &data[i..end + 2];

        if candidate.len() > min_size && best.map_or(true, |b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }

    best
}
