//! Eye animation core
//!
//! Splits into the geometry constants, the per-tick state controller, and
//! the pure rasterizer that turns a frame into a tray icon image.

pub mod geometry;
pub mod render;
pub mod state;

pub use geometry::EyeGeometry;
pub use render::{render_eyes, render_roll_frame, to_tray_icon};
pub use state::{Eye, EyeTracker, RenderRequest};
