use super::*;
use crate::config::OverflowMode;

const OVERFLOW_TITLE: &str = "Unallocated Courses";

/// Course grid computed for one overflow page
pub(super) struct PackedPage {
    pub columns: usize,
    pub rows: usize,
    pub bounds: Bounds,
    pub cards: Vec<CourseCard>,
}

impl RoomMapper {
    /// Lays out every unallocated course inside the reserved column.
    pub(super) fn layout_overflow(&self, canvas: &CanvasLayout) -> OverflowRegion {
        let frames = self.overflow_frames(canvas);
        let chunks = self.paginate_overflow(frames.len());

        let pages = chunks
            .into_iter()
            .zip(frames)
            .enumerate()
            .map(|(index, (courses, frame))| {
                let packed = self.pack_page(courses);
                debug!(
                    page = index,
                    courses = courses.len(),
                    rows = packed.rows,
                    "Packed overflow page"
                );

                OverflowPage {
                    index,
                    frame,
                    columns: packed.columns,
                    rows: packed.rows,
                    bounds: packed.bounds,
                    viewport: self.fit_viewport(frame, packed.bounds),
                    cards: packed.cards,
                }
            })
            .collect();

        OverflowRegion {
            title: OVERFLOW_TITLE.to_string(),
            pages,
        }
    }

    /// Splits the unallocated list into consecutive page chunks.
    /// Single-page mode keeps the whole list together; per-row mode spreads it
    /// evenly over at most `page_slots` pages. Empty pages are never produced.
    pub(super) fn paginate_overflow(&self, page_slots: usize) -> Vec<&[UnallocatedCourse]> {
        let courses = self.snapshot.unallocated_courses.as_slice();
        if courses.is_empty() {
            return Vec::new();
        }

        match self.config.layout.overflow_mode {
            OverflowMode::SinglePage => vec![courses],
            OverflowMode::PerRow => {
                let per_page = courses.len().div_ceil(page_slots.max(1));
                courses.chunks(per_page).collect()
            }
        }
    }

    /// Places courses row-major, `overflow_per_row` to a row, first course at the top.
    pub(super) fn pack_page(&self, courses: &[UnallocatedCourse]) -> PackedPage {
        let layout = &self.config.layout;
        let per_row = layout.overflow_per_row;
        let columns = per_row.min(courses.len()).max(1);
        let rows = courses.len().div_ceil(per_row).max(1);

        let width = layout.overflow_card_width;
        let height = layout.overflow_card_height;

        let cards = courses
            .iter()
            .enumerate()
            .map(|(i, course)| {
                let x = (i % per_row) as f64 * layout.overflow_step_x;
                let y = (rows - 1 - i / per_row) as f64 * layout.overflow_step_y;

                CourseCard {
                    course_name: course.name.clone(),
                    x,
                    y,
                    width,
                    height,
                    label: Label {
                        text: format!("{}\n({})", course.name, course.size),
                        x: x + width / 2.0,
                        y: y + height / 2.0,
                    },
                }
            })
            .collect();

        let pad = layout.region_padding;
        PackedPage {
            columns,
            rows,
            bounds: Bounds {
                min_x: -pad,
                max_x: columns as f64 * layout.overflow_step_x + pad,
                min_y: -pad,
                max_y: rows as f64 * layout.overflow_step_y + pad,
            },
            cards,
        }
    }
}
