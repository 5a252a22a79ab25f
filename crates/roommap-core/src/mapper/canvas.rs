use super::*;
use crate::config::OverflowMode;

/// Share of the legend band left of the gradient bar, and the bar's own share.
const LEGEND_BAR_OFFSET: f64 = 0.3;
const LEGEND_BAR_WIDTH: f64 = 0.2;

impl RoomMapper {
    /// Decides the top-level region grid and the canvas size in pixels.
    /// With overflow the last column is reserved for unallocated courses
    /// across every row, so it never holds a category.
    pub(super) fn partition_canvas(&self, category_count: usize, has_overflow: bool) -> CanvasLayout {
        let layout = &self.config.layout;

        let columns = if has_overflow { 3 } else { 2 };
        let category_columns = if has_overflow { columns - 1 } else { columns };
        let rows = category_count.div_ceil(category_columns).max(1);

        let width = 2.0 * layout.margin
            + columns as f64 * layout.cell_width
            + (columns - 1) as f64 * layout.gutter
            + layout.legend_width;
        let height = 2.0 * layout.margin + self.grid_height(rows);

        CanvasLayout {
            width,
            height,
            rows,
            columns,
            category_columns,
            has_overflow,
        }
    }

    /// Row-major cell for the `index`-th category.
    pub(super) fn category_cell(&self, canvas: &CanvasLayout, index: usize) -> GridCell {
        GridCell {
            row: index / canvas.category_columns,
            col: index % canvas.category_columns,
        }
    }

    /// Pixel frame of a single grid cell.
    pub(super) fn cell_frame(&self, cell: GridCell) -> Rect {
        let layout = &self.config.layout;
        Rect {
            x: layout.margin + cell.col as f64 * (layout.cell_width + layout.gutter),
            y: layout.margin + cell.row as f64 * (layout.cell_height + layout.gutter),
            width: layout.cell_width,
            height: layout.cell_height,
        }
    }

    /// Frames of the overflow pages inside the reserved column.
    pub(super) fn overflow_frames(&self, canvas: &CanvasLayout) -> Vec<Rect> {
        let reserved = canvas.columns - 1;

        match self.config.layout.overflow_mode {
            OverflowMode::SinglePage => {
                let top = self.cell_frame(GridCell {
                    row: 0,
                    col: reserved,
                });
                vec![Rect {
                    height: self.grid_height(canvas.rows),
                    ..top
                }]
            }
            OverflowMode::PerRow => (0..canvas.rows)
                .map(|row| self.cell_frame(GridCell { row, col: reserved }))
                .collect(),
        }
    }

    /// Gradient bar right of the grid, from under the first title band to the grid bottom.
    pub(super) fn legend_frame(&self, canvas: &CanvasLayout) -> Rect {
        let layout = &self.config.layout;
        let grid_right = layout.margin
            + canvas.columns as f64 * layout.cell_width
            + (canvas.columns - 1) as f64 * layout.gutter;

        Rect {
            x: grid_right + layout.legend_width * LEGEND_BAR_OFFSET,
            y: layout.margin + layout.title_height,
            width: layout.legend_width * LEGEND_BAR_WIDTH,
            height: self.grid_height(canvas.rows) - layout.title_height,
        }
    }

    /// Fits local bounds into the part of `frame` below its title band.
    /// Scale is uniform and capped; the grid is centered horizontally and
    /// pinned to the top so the first cards sit right under the title.
    pub(super) fn fit_viewport(&self, frame: Rect, bounds: Bounds) -> Viewport {
        let layout = &self.config.layout;
        let content_top = frame.y + layout.title_height;
        let content_height = frame.height - layout.title_height;

        let scale = (frame.width / bounds.width())
            .min(content_height / bounds.height())
            .min(layout.max_unit_px);

        Viewport {
            scale,
            offset_x: frame.x + (frame.width - bounds.width() * scale) / 2.0,
            offset_y: content_top,
            bounds,
        }
    }

    fn grid_height(&self, rows: usize) -> f64 {
        let layout = &self.config.layout;
        rows as f64 * layout.cell_height + rows.saturating_sub(1) as f64 * layout.gutter
    }
}
