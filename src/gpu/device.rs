//! Render device capability used by the loader
//!
//! The loader never creates or destroys a device. It holds a non-owning
//! handle and only asks three things of it:
//! - is the device still there at all (`is_present`)
//! - can it service uploads right now (`recovery_state`)
//! - turn decoded RGBA pixels into a texture handle (`upload`)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use image::RgbaImage;
use parking_lot::Mutex;

/// Opaque handle to a texture living on a render device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Whether the device can currently accept uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Uploads may proceed
    Operational,
    /// Device lost (e.g. display mode change); expected to come back
    Lost,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("the device is lost")]
    Lost,
    #[error("texture of {width}x{height} exceeds the device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
    #[error("texture upload failed: {0}")]
    Upload(String),
}

/// Capability interface over the host rendering subsystem
///
/// Implementations are externally synchronised by their owner; the loader
/// thread only calls these methods and must tolerate the answers changing
/// between calls.
pub trait RenderDevice: Send + Sync {
    /// `false` once the owner has started tearing the device down.
    fn is_present(&self) -> bool {
        true
    }

    fn recovery_state(&self) -> RecoveryState;

    fn upload(&self, image: &RgbaImage) -> Result<TextureId, DeviceError>;

    fn release(&self, texture: TextureId);
}

/// CPU-side device that keeps uploaded textures in memory
///
/// Used by the command line front end and by tests. Loss and removal can
/// be toggled from any thread to simulate a real device misbehaving.
#[derive(Debug)]
pub struct HeadlessDevice {
    textures: Mutex<HashMap<TextureId, RgbaImage>>,
    next_id: AtomicU64,
    lost: AtomicBool,
    present: AtomicBool,
    max_dimension: u32,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::with_max_dimension(8192)
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            textures: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            lost: AtomicBool::new(false),
            present: AtomicBool::new(true),
            max_dimension,
        }
    }

    /// Simulate a device loss (`true`) or recovery (`false`)
    pub fn set_lost(&self, lost: bool) {
        self.lost.store(lost, Ordering::SeqCst);
    }

    /// Simulate the owner tearing the device down
    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    /// Number of textures currently resident
    pub fn texture_count(&self) -> usize {
        self.textures.lock().len()
    }

    /// Dimensions of a resident texture
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.lock().get(&texture).map(|img| img.dimensions())
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for HeadlessDevice {
    fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn recovery_state(&self) -> RecoveryState {
        if self.lost.load(Ordering::SeqCst) {
            RecoveryState::Lost
        } else {
            RecoveryState::Operational
        }
    }

    fn upload(&self, image: &RgbaImage) -> Result<TextureId, DeviceError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(DeviceError::Lost);
        }

        let (width, height) = image.dimensions();
        if width > self.max_dimension || height > self.max_dimension {
            return Err(DeviceError::TooLarge {
                width,
                height,
                limit: self.max_dimension,
            });
        }

        let id = TextureId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.textures.lock().insert(id, image.clone());
        Ok(id)
    }

    fn release(&self, texture: TextureId) {
        self.textures.lock().remove(&texture);
    }
}
