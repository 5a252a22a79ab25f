use crate::types::{RoomMapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the unallocated course list is split inside the reserved column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowMode {
    /// One page spanning every canvas row
    #[default]
    SinglePage,
    /// One page per canvas row (legacy output shape)
    PerRow,
}

/// Geometry constants for the room map.
///
/// Card and spacing values are region-local units; canvas values are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub card_width: f64,
    pub card_height: f64,
    /// Distance between the origins of neighbouring room cards
    pub spacing: f64,
    /// Maximum room cards per row inside a category region
    pub max_columns: usize,
    /// Margin around a region's card grid
    pub region_padding: f64,

    pub overflow_card_width: f64,
    pub overflow_card_height: f64,
    pub overflow_step_x: f64,
    pub overflow_step_y: f64,
    pub overflow_per_row: usize,
    pub overflow_mode: OverflowMode,

    /// Categories whose cards also show the room name
    pub headline_categories: BTreeSet<String>,

    pub margin: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gutter: f64,
    /// Band at the top of every region frame reserved for its title
    pub title_height: f64,
    /// Band right of the grid holding the legend
    pub legend_width: f64,
    /// Upper bound on pixels per local unit, keeps sparse regions from ballooning
    pub max_unit_px: f64,
    pub legend_stops: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: 1.8,
            card_height: 1.8,
            spacing: 2.2,
            max_columns: 5,
            region_padding: 0.5,
            overflow_card_width: 2.5,
            overflow_card_height: 0.8,
            overflow_step_x: 3.0,
            overflow_step_y: 1.2,
            overflow_per_row: 8,
            overflow_mode: OverflowMode::SinglePage,
            headline_categories: ["Grands Amphis", "Amphis 80_100"]
                .into_iter()
                .map(String::from)
                .collect(),
            margin: 40.0,
            cell_width: 720.0,
            cell_height: 400.0,
            gutter: 40.0,
            title_height: 48.0,
            legend_width: 110.0,
            max_unit_px: 64.0,
            legend_stops: 11,
        }
    }
}

impl LayoutConfig {
    pub fn is_headline(&self, category: &str) -> bool {
        self.headline_categories.contains(category)
    }

    /// Rejects geometry the packers cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("card_width", self.card_width),
            ("card_height", self.card_height),
            ("spacing", self.spacing),
            ("overflow_card_width", self.overflow_card_width),
            ("overflow_card_height", self.overflow_card_height),
            ("overflow_step_x", self.overflow_step_x),
            ("overflow_step_y", self.overflow_step_y),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
            ("max_unit_px", self.max_unit_px),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RoomMapError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("region_padding", self.region_padding),
            ("margin", self.margin),
            ("gutter", self.gutter),
            ("title_height", self.title_height),
            ("legend_width", self.legend_width),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RoomMapError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if self.spacing <= self.card_width || self.spacing <= self.card_height {
            return Err(RoomMapError::InvalidConfig(
                "spacing must exceed both card dimensions".to_string(),
            ));
        }

        if self.overflow_step_x <= self.overflow_card_width
            || self.overflow_step_y <= self.overflow_card_height
        {
            return Err(RoomMapError::InvalidConfig(
                "overflow steps must exceed the overflow card dimensions".to_string(),
            ));
        }

        if self.max_columns == 0 {
            return Err(RoomMapError::InvalidConfig(
                "max_columns must be at least 1".to_string(),
            ));
        }

        if self.overflow_per_row == 0 {
            return Err(RoomMapError::InvalidConfig(
                "overflow_per_row must be at least 1".to_string(),
            ));
        }

        if self.title_height >= self.cell_height {
            return Err(RoomMapError::InvalidConfig(
                "title_height leaves no room for cards".to_string(),
            ));
        }

        Ok(())
    }
}

/// Visual style, passed explicitly to the renderer.
///
/// Font sizes are in region-local units and scale with each region's viewport;
/// title and legend sizes are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub text_color: String,
    pub card_fill: String,
    pub card_stroke: String,
    pub card_opacity: f64,
    pub overflow_fill: String,
    pub overflow_stroke: String,
    pub title_backdrop: String,
    pub name_font_size: f64,
    pub capacity_font_size: f64,
    pub percent_font_size: f64,
    pub course_font_size: f64,
    pub overflow_font_size: f64,
    pub title_font_size: f64,
    pub legend_font_size: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "DejaVu Sans, Arial, sans-serif".to_string(),
            background: "#ffffff".to_string(),
            text_color: "#222222".to_string(),
            card_fill: "#ffffff".to_string(),
            card_stroke: "#000000".to_string(),
            card_opacity: 0.8,
            overflow_fill: "#ffe4e1".to_string(),
            overflow_stroke: "#ff0000".to_string(),
            title_backdrop: "#ffffff".to_string(),
            name_font_size: 0.24,
            capacity_font_size: 0.2,
            percent_font_size: 0.17,
            course_font_size: 0.18,
            overflow_font_size: 0.2,
            title_font_size: 15.0,
            legend_font_size: 12.0,
        }
    }
}

/// Everything that shapes one room map, threaded through a single render
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub layout: LayoutConfig,
    pub theme: Theme,
}
