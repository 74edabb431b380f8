//! Stackview library - turns captured stack traces into display-ready rows.
//!
//! The input is a stack trace (raw frames stored oldest call first, an
//! optional register snapshot and an optional omitted-frame range) plus the
//! binary images that were loaded when it was captured. The output is an
//! ordered list of frame rows and "frames omitted" markers.
//!
//! # Modules
//!
//! - [`model`] - Frames, images and the report that carries them
//! - [`symbolize`] - Mapping instruction addresses onto binary images
//! - [`render`] - Visibility, repeat collapsing, omitted markers, ordering
//! - [`view`] - Display toggles and text formatting
//!
//! # Example
//!
//! ```
//! use stackview::model::{RawFrame, StackTrace};
//! use stackview::render::{render_frames, RenderOptions};
//!
//! let trace = StackTrace {
//!     frames: vec![RawFrame {
//!         function: Some("main".to_string()),
//!         in_app: true,
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let rendered = render_frames(&trace, &[], &RenderOptions::default());
//! assert_eq!(rendered.frames().count(), 1);
//! ```

pub mod model;
pub mod render;
pub mod stackview_core;
pub mod symbolize;
pub mod utils;
pub mod view;

// Re-export for convenience
pub use model::{BinaryImage, EventReport, RawFrame, StackTrace};
pub use render::{render_frames, RenderEntry, RenderFrame, RenderOptions, RenderedTrace};
pub use stackview_core::{load_report, render_report, stackview, Config};
pub use view::{OutputFormat, Platform, ViewState};
