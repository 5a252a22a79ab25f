//! Room map layout engine.
//!
//! Turns an allocation snapshot (rooms with optional courses plus the courses
//! that could not be placed) into a deterministic geometric layout, and paints
//! that layout as SVG or PNG.

pub mod color;
pub mod config;
pub mod mapper;
pub mod render;
pub mod types;

pub use color::{utilization_color, UtilizationColor};
pub use config::{LayoutConfig, MapConfig, OverflowMode, Theme};
pub use mapper::RoomMapper;
pub use types::*;
