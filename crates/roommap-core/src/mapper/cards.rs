use super::*;
use crate::color::utilization_color;

// Label anchors as fractions of the card height. The `_FROM_TOP` pair is
// measured down from the card top, the rest up from the card bottom.
const NAME_FROM_TOP: f64 = 0.2 / 1.8;
const CAPACITY_FROM_TOP: f64 = 0.5 / 1.8;
const INDICATOR_Y: f64 = 0.7 / 1.8;
const INDICATOR_RADIUS: f64 = 0.25 / 1.8;
const COURSE_Y: f64 = 0.3 / 1.8;

/// Categories with more rooms than this get a backdrop behind their title.
const DENSE_CATEGORY_ROOMS: usize = 15;

/// Card grid computed for one category
pub(super) struct PackedCategory {
    pub grid_columns: usize,
    pub grid_rows: usize,
    pub bounds: Bounds,
    pub cards: Vec<RoomCard>,
}

/// Columns and rows of a bounded sub-grid holding `count` cards.
pub(super) fn grid_shape(count: usize, max_columns: usize) -> (usize, usize) {
    let columns = max_columns.min(count).max(1);
    (columns, count.div_ceil(columns))
}

impl RoomMapper {
    /// Places a category's rooms row-major in input order, first rooms on the
    /// top row. The sub-grid is sized from this category alone.
    pub(super) fn pack_category(&self, category: &Category<'_>) -> PackedCategory {
        let layout = &self.config.layout;
        let (grid_columns, grid_rows) = grid_shape(category.rooms.len(), layout.max_columns);
        let headline = layout.is_headline(category.name);

        let cards = category
            .rooms
            .iter()
            .enumerate()
            .map(|(i, room)| {
                let x = (i % grid_columns) as f64 * layout.spacing;
                let y = (grid_rows - 1 - i / grid_columns) as f64 * layout.spacing;
                self.room_card(room, x, y, headline)
            })
            .collect();

        let pad = layout.region_padding;
        PackedCategory {
            grid_columns,
            grid_rows,
            bounds: Bounds {
                min_x: -pad,
                max_x: grid_columns as f64 * layout.spacing + pad,
                min_y: -pad,
                max_y: grid_rows as f64 * layout.spacing + pad,
            },
            cards,
        }
    }

    fn room_card(&self, room: &Room, x: f64, y: f64, headline: bool) -> RoomCard {
        let width = self.config.layout.card_width;
        let height = self.config.layout.card_height;
        let center_x = x + width / 2.0;

        let name_label = headline.then(|| Label {
            text: room.name.clone(),
            x: center_x,
            y: y + height - height * NAME_FROM_TOP,
        });

        let capacity_label = Label {
            text: format!("Cap: {}", room.capacity),
            x: center_x,
            y: y + height - height * CAPACITY_FROM_TOP,
        };

        let occupancy = room.course.as_ref().map(|course| {
            let utilization = utilization_ratio(course.size, room.capacity);
            let percent = utilization_percent(course.size, room.capacity);
            let color = utilization_color(utilization);
            let center_y = y + height * INDICATOR_Y;

            Occupancy {
                utilization,
                percent,
                indicator: Disc {
                    center_x,
                    center_y,
                    radius: height * INDICATOR_RADIUS,
                    fill: color.fill,
                    ink: color.ink,
                },
                percent_label: Label {
                    text: format!("{percent}%"),
                    x: center_x,
                    y: center_y,
                },
                course_label: Label {
                    text: format!("{}\n({})", course.name, course.size),
                    x: center_x,
                    y: y + height * COURSE_Y,
                },
            }
        });

        RoomCard {
            room_name: room.name.clone(),
            x,
            y,
            width,
            height,
            name_label,
            capacity_label,
            occupancy,
        }
    }
}

/// Title shown above a category region.
pub(super) fn region_title(category: &Category<'_>) -> RegionTitle {
    let count = category.rooms.len();
    RegionTitle {
        text: format!("{}\n({} rooms)", category.name, count),
        backdrop: count > DENSE_CATEGORY_ROOMS,
    }
}
