//! Clipvault-Common: shared error taxonomy and typed identifiers.
//!
//! Everything in this crate is used by at least two other clipvault crates:
//! the [`Error`]/[`Result`] pair that the lifecycle, link, and streaming
//! layers report through, and the UUID newtypes that keep asset and link
//! identifiers from being mixed up.

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{AssetId, LinkId};
