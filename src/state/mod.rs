//! Loader state
//!
//! - Pending requests and their ordering (request.rs)
//! - The counting signal the loader thread waits on (signal.rs)
//! - Loaded thumbnails and result records (data.rs)

pub mod data;
pub mod request;
pub mod signal;

pub use data::{LoadedThumbnail, LoaderStats, ResultArgs};
pub use request::{AddOutcome, PathRequest, RequestSet};
pub use signal::ReadySignal;
