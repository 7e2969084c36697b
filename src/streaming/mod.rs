//! Streamed delivery of shared assets.

mod direct;

pub use direct::stream_shared;
