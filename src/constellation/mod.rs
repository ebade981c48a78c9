mod client;
mod error;
mod stitcher;
mod types;

pub use client::SnapshotClient;
pub use error::ConstellationError;
pub use stitcher::{stitch_window, MAX_LINK_KM};
pub use types::{HourPayload, Position, RawPoint, TrackMap};
