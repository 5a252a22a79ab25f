use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Course assigned to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub size: u32,
}

/// Room from the allocation snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    /// Category label, shared by every room of the same kind
    #[serde(rename = "type")]
    pub room_type: String,
    pub capacity: u32,
    /// `None` when the room is vacant
    #[serde(default)]
    pub course: Option<Course>,
}

/// Ratio of a course size to a room capacity.
/// Not clamped: an over-filled room yields a value above 1.0.
pub fn utilization_ratio(size: u32, capacity: u32) -> f64 {
    size as f64 / capacity as f64
}

/// Truncated integer percentage, computed without float rounding drift.
pub fn utilization_percent(size: u32, capacity: u32) -> u64 {
    size as u64 * 100 / capacity as u64
}

/// Course that could not be placed in any room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnallocatedCourse {
    pub name: String,
    pub size: u32,
}

/// Input: the two lists the room map is drawn from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSnapshot {
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub unallocated_courses: Vec<UnallocatedCourse>,
}

/// Document shapes accepted on disk: either the exporter's envelope
/// (`{"allocation": {...}, ...}`) or a bare snapshot.
/// Unknown top-level fields such as run statistics are ignored.
#[derive(Debug, Clone)]
pub enum SnapshotDocument {
    Envelope { allocation: AllocationSnapshot },
    Bare(AllocationSnapshot),
}

// The shape is picked by hand so a malformed record reports the field
// that is actually wrong.
impl<'de> Deserialize<'de> for SnapshotDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut document = serde_json::Value::deserialize(deserializer)?;

        let allocation = document.get_mut("allocation").map(serde_json::Value::take);

        let parsed = match allocation {
            Some(allocation) => serde_json::from_value(allocation)
                .map(|allocation| SnapshotDocument::Envelope { allocation }),
            None => serde_json::from_value(document).map(SnapshotDocument::Bare),
        };

        parsed.map_err(|err| D::Error::custom(format!("invalid allocation snapshot: {err}")))
    }
}

impl SnapshotDocument {
    pub fn into_snapshot(self) -> AllocationSnapshot {
        match self {
            SnapshotDocument::Envelope { allocation } => allocation,
            SnapshotDocument::Bare(snapshot) => snapshot,
        }
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Axis-aligned rectangle in canvas pixels (top-left origin, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Extent of a region in its local data space (y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Uniform mapping from a region's local bounds into its pixel frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pixels per local unit
    pub scale: f64,
    /// Canvas position of the bounds' top-left corner
    pub offset_x: f64,
    pub offset_y: f64,
    pub bounds: Bounds,
}

impl Viewport {
    /// Maps a local point to canvas pixels, flipping the y axis.
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.offset_x + (x - self.bounds.min_x) * self.scale,
            self.offset_y + (self.bounds.max_y - y) * self.scale,
        )
    }

    /// Maps a local rectangle anchored at its bottom-left corner.
    pub fn rect_to_canvas(&self, x: f64, y: f64, width: f64, height: f64) -> Rect {
        let (left, top) = self.to_canvas(x, y + height);
        Rect {
            x: left,
            y: top,
            width: width * self.scale,
            height: height * self.scale,
        }
    }

    pub fn length(&self, value: f64) -> f64 {
        value * self.scale
    }
}

/// Address of a cell in the top-level region grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

/// Centered text; lines are separated by `\n`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Filled circle showing a room's utilization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub fill: Rgb,
    /// Contrasting color for text painted over `fill`
    pub ink: Rgb,
}

/// Course shown on an occupied room card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub utilization: f64,
    pub percent: u64,
    pub indicator: Disc,
    pub percent_label: Label,
    pub course_label: Label,
}

/// Card for one room, in region-local units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomCard {
    pub room_name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Only set for headline categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_label: Option<Label>,
    pub capacity_label: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<Occupancy>,
}

/// Region title text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTitle {
    pub text: String,
    /// Paint an opaque box behind the title (dense categories)
    pub backdrop: bool,
}

/// Sub-grid of cards for one room category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRegion {
    pub category: String,
    pub cell: GridCell,
    pub frame: Rect,
    pub title: RegionTitle,
    pub grid_columns: usize,
    pub grid_rows: usize,
    pub bounds: Bounds,
    pub viewport: Viewport,
    pub cards: Vec<RoomCard>,
}

/// Card for one unallocated course, in page-local units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseCard {
    pub course_name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: Label,
}

/// One framed block of the overflow region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowPage {
    pub index: usize,
    pub frame: Rect,
    pub columns: usize,
    pub rows: usize,
    pub bounds: Bounds,
    pub viewport: Viewport,
    pub cards: Vec<CourseCard>,
}

/// Reserved column holding every unallocated course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowRegion {
    pub title: String,
    pub pages: Vec<OverflowPage>,
}

impl OverflowRegion {
    pub fn card_count(&self) -> usize {
        self.pages.iter().map(|page| page.cards.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendStop {
    /// Normalized position in `[0, 1]`
    pub offset: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendTick {
    pub value: f64,
    pub label: String,
}

/// Shared utilization gradient, painted once outside the region grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub frame: Rect,
    pub label: String,
    pub stops: Vec<LegendStop>,
    pub ticks: Vec<LegendTick>,
}

/// Top-level canvas geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    pub width: f64,
    pub height: f64,
    pub rows: usize,
    pub columns: usize,
    /// Columns available to categories (the overflow column excluded)
    pub category_columns: usize,
    pub has_overflow: bool,
}

/// Output: everything a rendering backend needs to paint the room map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMapLayout {
    pub canvas: CanvasLayout,
    pub regions: Vec<CategoryRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowRegion>,
    pub legend: Legend,
}

impl RoomMapLayout {
    pub fn card_count(&self) -> usize {
        self.regions.iter().map(|region| region.cards.len()).sum()
    }

    pub fn occupied_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|region| &region.cards)
            .filter(|card| card.occupancy.is_some())
            .count()
    }
}

/// Error type for room map composition
#[derive(Debug, thiserror::Error)]
pub enum RoomMapError {
    #[error("Snapshot contains no rooms - nothing to draw")]
    NoRooms,

    #[error("Invalid room '{room}': {reason}")]
    InvalidRoom { room: String, reason: String },

    #[error("Invalid course '{course}': {reason}")]
    InvalidCourse { course: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl From<std::fmt::Error> for RoomMapError {
    fn from(err: std::fmt::Error) -> Self {
        RoomMapError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoomMapError>;
