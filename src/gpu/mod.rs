//! Render device abstraction
//!
//! Architecture:
//! - `device.rs` - the `RenderDevice` capability trait plus an in-memory
//!   implementation for headless use
//!
//! Decoded thumbnails are handed to the device as RGBA8 pixels and come
//! back as opaque texture handles.

pub mod device;

pub use device::{DeviceError, HeadlessDevice, RecoveryState, RenderDevice, TextureId};
