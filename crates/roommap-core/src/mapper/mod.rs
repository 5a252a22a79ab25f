use crate::color::legend_stops;
use crate::config::MapConfig;
use crate::render;
use crate::types::*;
use cards::region_title;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

mod canvas;
mod cards;
mod overflow;
#[cfg(test)]
mod tests;

const LEGEND_LABEL: &str = "Utilization Rate";
const LEGEND_TICKS: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Rooms sharing one `type`, in input order
pub(crate) struct Category<'a> {
    pub name: &'a str,
    pub rooms: Vec<&'a Room>,
}

/// Lays out an allocation snapshot as a grid of per-category room cards,
/// a column of unallocated courses and a utilization legend.
pub struct RoomMapper {
    snapshot: AllocationSnapshot,
    config: MapConfig,
}

impl RoomMapper {
    /// Validates the snapshot and configuration and builds a new mapper.
    pub fn new(snapshot: AllocationSnapshot, config: MapConfig) -> Result<Self> {
        config.layout.validate()?;

        if snapshot.rooms.is_empty() {
            return Err(RoomMapError::NoRooms);
        }

        let mut seen = HashSet::new();
        for room in &snapshot.rooms {
            if room.name.trim().is_empty() {
                return Err(RoomMapError::InvalidRoom {
                    room: room.name.clone(),
                    reason: "name is empty".to_string(),
                });
            }

            if room.room_type.trim().is_empty() {
                return Err(RoomMapError::InvalidRoom {
                    room: room.name.clone(),
                    reason: "type is empty".to_string(),
                });
            }

            if room.capacity == 0 {
                return Err(RoomMapError::InvalidRoom {
                    room: room.name.clone(),
                    reason: "capacity must be positive".to_string(),
                });
            }

            if !seen.insert(room.name.as_str()) {
                return Err(RoomMapError::InvalidRoom {
                    room: room.name.clone(),
                    reason: "name appears more than once".to_string(),
                });
            }

            if let Some(course) = &room.course {
                validate_course(&course.name, course.size)?;
            }
        }

        for course in &snapshot.unallocated_courses {
            validate_course(&course.name, course.size)?;
        }

        Ok(Self { snapshot, config })
    }

    pub fn snapshot(&self) -> &AllocationSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Computes every position, size, color and label of the room map.
    pub fn layout(&self) -> Result<RoomMapLayout> {
        let categories = self.group_categories();
        let unallocated = &self.snapshot.unallocated_courses;
        let canvas = self.partition_canvas(categories.len(), !unallocated.is_empty());

        let mut regions = Vec::with_capacity(categories.len());
        for (idx, category) in categories.iter().enumerate() {
            let cell = self.category_cell(&canvas, idx);
            let frame = self.cell_frame(cell);
            let packed = self.pack_category(category);
            let viewport = self.fit_viewport(frame, packed.bounds);

            debug!(
                category = category.name,
                rooms = category.rooms.len(),
                columns = packed.grid_columns,
                rows = packed.grid_rows,
                "Packed category"
            );

            regions.push(CategoryRegion {
                category: category.name.to_string(),
                cell,
                frame,
                title: region_title(category),
                grid_columns: packed.grid_columns,
                grid_rows: packed.grid_rows,
                bounds: packed.bounds,
                viewport,
                cards: packed.cards,
            });
        }

        let overflow = if unallocated.is_empty() {
            None
        } else {
            Some(self.layout_overflow(&canvas))
        };

        let legend = Legend {
            frame: self.legend_frame(&canvas),
            label: LEGEND_LABEL.to_string(),
            stops: legend_stops(self.config.layout.legend_stops),
            ticks: LEGEND_TICKS
                .iter()
                .map(|&value| LegendTick {
                    value,
                    label: format!("{value:.1}"),
                })
                .collect(),
        };

        info!(
            width = canvas.width,
            height = canvas.height,
            rows = canvas.rows,
            columns = canvas.columns,
            "Composed room map"
        );

        Ok(RoomMapLayout {
            canvas,
            regions,
            overflow,
            legend,
        })
    }

    /// Composes and paints the room map as an SVG document.
    pub fn render_svg(&self) -> Result<String> {
        let layout = self.layout()?;
        render::render_svg(&layout, &self.config.theme)
    }

    /// Composes, paints and encodes the room map as PNG bytes.
    pub fn render_png(&self, scale: f32) -> Result<Vec<u8>> {
        let svg = self.render_svg()?;
        render::rasterize(&svg, scale)
    }

    /// Groups rooms by type in the order each type is first seen.
    pub(crate) fn group_categories(&self) -> Vec<Category<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut categories: Vec<Category<'_>> = Vec::new();

        for room in &self.snapshot.rooms {
            let slot = *index.entry(room.room_type.as_str()).or_insert_with(|| {
                categories.push(Category {
                    name: room.room_type.as_str(),
                    rooms: Vec::new(),
                });
                categories.len() - 1
            });
            categories[slot].rooms.push(room);
        }

        categories
    }
}

fn validate_course(name: &str, size: u32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RoomMapError::InvalidCourse {
            course: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    if size == 0 {
        return Err(RoomMapError::InvalidCourse {
            course: name.to_string(),
            reason: "size must be positive".to_string(),
        });
    }

    Ok(())
}
