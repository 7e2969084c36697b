//! # clipvault-av
//!
//! External-tool layer for clipvault. Everything that shells out to ffmpeg
//! or ffprobe lives here:
//!
//! - Probing a media file's duration (ffprobe JSON output)
//! - Trimming a sub-range into a new file
//! - Concatenating files listed in a manifest, without re-encoding
//! - Rendering the concat manifest with precise path escaping
//!
//! The trim operation validates the requested range against the source's
//! probed duration before spawning ffmpeg, so an out-of-bounds range never
//! reaches the tool.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let duration = clipvault_av::probe_duration(Path::new("/media/in.mp4"))?;
//! println!("{duration} seconds");
//! # Ok::<(), clipvault_av::Error>(())
//! ```

mod error;
pub mod actions;
pub mod manifest;
pub mod probe;
pub mod tools;

// Re-exports
pub use actions::{concat, trim};
pub use error::{Error, Result};
pub use probe::probe_duration;
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
