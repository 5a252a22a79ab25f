use super::cards::grid_shape;
use super::*;
use crate::color::utilization_color;
use crate::config::{LayoutConfig, OverflowMode};

fn room(name: &str, room_type: &str, capacity: u32, course: Option<(&str, u32)>) -> Room {
    Room {
        name: name.to_string(),
        room_type: room_type.to_string(),
        capacity,
        course: course.map(|(name, size)| Course {
            name: name.to_string(),
            size,
        }),
    }
}

fn unallocated(count: usize) -> Vec<UnallocatedCourse> {
    (0..count)
        .map(|i| UnallocatedCourse {
            name: format!("U{i}"),
            size: 10 + i as u32,
        })
        .collect()
}

fn rooms_of(room_type: &str, count: usize) -> Vec<Room> {
    (0..count)
        .map(|i| {
            let course = if i % 2 == 0 { Some(("C", 20)) } else { None };
            room(&format!("{room_type}-{i}"), room_type, 40, course)
        })
        .collect()
}

fn mapper(rooms: Vec<Room>, unallocated_courses: Vec<UnallocatedCourse>) -> RoomMapper {
    mapper_with(rooms, unallocated_courses, MapConfig::default())
}

fn mapper_with(
    rooms: Vec<Room>,
    unallocated_courses: Vec<UnallocatedCourse>,
    config: MapConfig,
) -> RoomMapper {
    RoomMapper::new(
        AllocationSnapshot {
            rooms,
            unallocated_courses,
        },
        config,
    )
    .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn overlaps(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
}

fn assert_inside(viewport: &Viewport, frame: Rect) {
    let eps = 1e-6;
    let right = viewport.offset_x + viewport.bounds.width() * viewport.scale;
    let bottom = viewport.offset_y + viewport.bounds.height() * viewport.scale;

    assert!(viewport.offset_x >= frame.x - eps);
    assert!(viewport.offset_y >= frame.y - eps);
    assert!(right <= frame.x + frame.width + eps);
    assert!(bottom <= frame.y + frame.height + eps);
}

#[test]
fn test_end_to_end_scenario() {
    let rooms = vec![
        room("A1", "A", 10, Some(("Math", 5))),
        room("A2", "A", 10, Some(("Physics", 10))),
        room("A3", "A", 10, Some(("History", 12))),
        room("A4", "A", 10, None),
        room("A5", "A", 10, None),
    ];

    let layout = mapper(rooms, unallocated(2)).layout().unwrap();

    assert_eq!(layout.regions.len(), 1);
    let region = &layout.regions[0];
    assert_eq!(region.category, "A");
    assert_eq!((region.grid_columns, region.grid_rows), (5, 1));
    assert_eq!(region.cards.len(), 5);

    let percents: Vec<Option<u64>> = region
        .cards
        .iter()
        .map(|card| card.occupancy.as_ref().map(|o| o.percent))
        .collect();
    assert_eq!(percents, vec![Some(50), Some(100), Some(120), None, None]);

    let over = region.cards[2].occupancy.as_ref().unwrap();
    assert!(approx(over.utilization, 1.2));
    assert_eq!(over.percent_label.text, "120%");
    assert_eq!(over.indicator.fill, utilization_color(1.0).fill);
    assert_eq!(over.indicator.ink, Rgb::BLACK);

    let half = region.cards[0].occupancy.as_ref().unwrap();
    assert_eq!(half.indicator.ink, Rgb::WHITE);
    assert_eq!(half.course_label.text, "Math\n(5)");

    for (i, card) in region.cards.iter().enumerate() {
        assert!(approx(card.x, i as f64 * 2.2));
        assert!(approx(card.y, 0.0));
        assert!(card.name_label.is_none());
    }

    let overflow = layout.overflow.as_ref().unwrap();
    assert_eq!(overflow.pages.len(), 1);
    assert_eq!(overflow.pages[0].rows, 1);
    assert_eq!(overflow.pages[0].columns, 2);
    assert_eq!(overflow.card_count(), 2);

    assert_eq!(layout.canvas.columns, 3);
    assert_eq!(layout.canvas.rows, 1);
}

#[test]
fn test_every_room_rendered_once_without_overlap() {
    let mut rooms = rooms_of("Salles TD", 12);
    rooms.extend(rooms_of("Labs", 3));
    rooms.extend(rooms_of("Grands Amphis", 7));
    rooms.extend(rooms_of("Amphis 80_100", 1));
    rooms.extend(rooms_of("Studios", 23));

    let expected: Vec<String> = rooms.iter().map(|r| r.name.clone()).collect();
    let layout = mapper(rooms, unallocated(30)).layout().unwrap();

    let mut rendered: Vec<String> = layout
        .regions
        .iter()
        .flat_map(|region| region.cards.iter().map(|card| card.room_name.clone()))
        .collect();
    let mut expected_sorted = expected.clone();
    rendered.sort();
    expected_sorted.sort();
    assert_eq!(rendered, expected_sorted);

    for region in &layout.regions {
        for (i, a) in region.cards.iter().enumerate() {
            for b in &region.cards[i + 1..] {
                assert!(
                    !overlaps((a.x, a.y, a.width, a.height), (b.x, b.y, b.width, b.height)),
                    "{} overlaps {}",
                    a.room_name,
                    b.room_name
                );
            }
        }
    }

    for page in &layout.overflow.as_ref().unwrap().pages {
        for (i, a) in page.cards.iter().enumerate() {
            for b in &page.cards[i + 1..] {
                assert!(!overlaps(
                    (a.x, a.y, a.width, a.height),
                    (b.x, b.y, b.width, b.height)
                ));
            }
        }
    }
}

#[test]
fn test_grid_shape_is_tight() {
    for n in 1..=40 {
        let (cols, rows) = grid_shape(n, 5);
        assert_eq!(cols, n.min(5));
        assert!(cols * rows >= n, "n={n}");
        assert!(cols * (rows - 1) < n, "n={n}");
    }
}

#[test]
fn test_first_rooms_fill_top_row() {
    let layout = mapper(rooms_of("Salles", 7), Vec::new()).layout().unwrap();
    let region = &layout.regions[0];

    assert_eq!((region.grid_columns, region.grid_rows), (5, 2));
    // Input order is kept, row-major, top row first
    assert!(approx(region.cards[0].y, 2.2));
    assert!(approx(region.cards[4].x, 4 as f64 * 2.2));
    assert!(approx(region.cards[4].y, 2.2));
    assert!(approx(region.cards[5].x, 0.0));
    assert!(approx(region.cards[5].y, 0.0));
    assert_eq!(region.cards[6].room_name, "Salles-6");

    assert!(approx(region.bounds.min_x, -0.5));
    assert!(approx(region.bounds.max_x, 5.0 * 2.2 + 0.5));
    assert!(approx(region.bounds.max_y, 2.0 * 2.2 + 0.5));
}

#[test]
fn test_region_size_is_independent_per_category() {
    let mut rooms = rooms_of("Small", 2);
    rooms.extend(rooms_of("Large", 14));

    let layout = mapper(rooms, Vec::new()).layout().unwrap();

    assert_eq!((layout.regions[0].grid_columns, layout.regions[0].grid_rows), (2, 1));
    assert_eq!((layout.regions[1].grid_columns, layout.regions[1].grid_rows), (5, 3));
}

#[test]
fn test_categories_keep_first_seen_order() {
    let rooms = vec![
        room("z1", "Zeta", 10, None),
        room("a1", "Alpha", 10, None),
        room("z2", "Zeta", 10, None),
        room("m1", "Mu", 10, None),
        room("a2", "Alpha", 10, None),
    ];

    let layout = mapper(rooms, Vec::new()).layout().unwrap();
    let order: Vec<&str> = layout
        .regions
        .iter()
        .map(|region| region.category.as_str())
        .collect();

    assert_eq!(order, vec!["Zeta", "Alpha", "Mu"]);
    let zeta: Vec<&str> = layout.regions[0]
        .cards
        .iter()
        .map(|card| card.room_name.as_str())
        .collect();
    assert_eq!(zeta, vec!["z1", "z2"]);
}

#[test]
fn test_partition_four_categories_without_overflow() {
    let mapper = mapper(rooms_of("A", 1), Vec::new());
    let canvas = mapper.partition_canvas(4, false);

    assert_eq!(canvas.columns, 2);
    assert_eq!(canvas.rows, 2);
    assert_eq!(canvas.category_columns, 2);
    assert!(!canvas.has_overflow);
}

#[test]
fn test_partition_four_categories_with_overflow() {
    let mapper = mapper(rooms_of("A", 1), Vec::new());
    let canvas = mapper.partition_canvas(4, true);

    assert_eq!(canvas.columns, 3);
    assert_eq!(canvas.rows, 2);
    assert_eq!(canvas.category_columns, 2);

    let cells: Vec<GridCell> = (0..4).map(|i| mapper.category_cell(&canvas, i)).collect();
    assert_eq!(cells[0], GridCell { row: 0, col: 0 });
    assert_eq!(cells[1], GridCell { row: 0, col: 1 });
    assert_eq!(cells[2], GridCell { row: 1, col: 0 });
    assert_eq!(cells[3], GridCell { row: 1, col: 1 });
    assert!(cells.iter().all(|cell| cell.col < 2));
}

#[test]
fn test_canvas_grows_with_rows_and_overflow() {
    let mapper = mapper(rooms_of("A", 1), Vec::new());
    let narrow = mapper.partition_canvas(2, false);
    let wide = mapper.partition_canvas(2, true);
    let tall = mapper.partition_canvas(5, false);

    assert!(wide.width > narrow.width);
    assert!(approx(wide.height, narrow.height));
    assert!(tall.height > narrow.height);
    assert!(approx(tall.width, narrow.width));
}

#[test]
fn test_overflow_spans_reserved_column() {
    let mut rooms = Vec::new();
    for category in ["A", "B", "C", "D", "E"] {
        rooms.extend(rooms_of(category, 2));
    }

    let layout = mapper(rooms, unallocated(17)).layout().unwrap();
    let canvas = layout.canvas;
    assert_eq!((canvas.columns, canvas.rows), (3, 3));

    let overflow = layout.overflow.as_ref().unwrap();
    assert_eq!(overflow.pages.len(), 1);

    let page = &overflow.pages[0];
    assert_eq!(page.rows, 3);
    assert_eq!(page.columns, 8);
    assert!(approx(page.cards[0].y, 2.0 * 1.2));
    assert!(approx(page.cards[16].x, 0.0));
    assert!(approx(page.cards[16].y, 0.0));
    assert!(approx(page.cards[7].x, 7.0 * 3.0));

    let last_region_frame = layout.regions[4].frame;
    assert!(page.frame.x > last_region_frame.x + last_region_frame.width);
    let grid_bottom = layout.regions[4].frame.y + layout.regions[4].frame.height;
    assert!(approx(page.frame.y + page.frame.height, grid_bottom));
}

#[test]
fn test_overflow_rows_follow_per_row() {
    for m in 1..=33 {
        let layout = mapper(rooms_of("A", 1), unallocated(m)).layout().unwrap();
        let overflow = layout.overflow.unwrap();
        assert_eq!(overflow.pages[0].rows, m.div_ceil(8), "m={m}");
        assert_eq!(overflow.card_count(), m);
    }
}

#[test]
fn test_no_overflow_region_without_unallocated() {
    let layout = mapper(rooms_of("A", 3), Vec::new()).layout().unwrap();

    assert!(layout.overflow.is_none());
    assert_eq!(layout.canvas.columns, 2);
    assert!(!layout.canvas.has_overflow);
}

#[test]
fn test_per_row_pagination_covers_every_course() {
    let mut rooms = Vec::new();
    for category in ["A", "B", "C", "D", "E"] {
        rooms.extend(rooms_of(category, 1));
    }
    let config = MapConfig {
        layout: LayoutConfig {
            overflow_mode: OverflowMode::PerRow,
            ..LayoutConfig::default()
        },
        ..MapConfig::default()
    };

    let layout = mapper_with(rooms, unallocated(10), config).layout().unwrap();
    let overflow = layout.overflow.unwrap();

    let sizes: Vec<usize> = overflow.pages.iter().map(|page| page.cards.len()).collect();
    assert_eq!(sizes, vec![4, 4, 2]);

    let names: Vec<String> = overflow
        .pages
        .iter()
        .flat_map(|page| page.cards.iter().map(|card| card.course_name.clone()))
        .collect();
    let expected: Vec<String> = (0..10).map(|i| format!("U{i}")).collect();
    assert_eq!(names, expected);

    let tops: Vec<f64> = overflow.pages.iter().map(|page| page.frame.y).collect();
    assert!(tops[0] < tops[1] && tops[1] < tops[2]);
}

#[test]
fn test_per_row_pagination_skips_empty_pages() {
    let mut rooms = Vec::new();
    for category in ["A", "B", "C", "D", "E"] {
        rooms.extend(rooms_of(category, 1));
    }
    let config = MapConfig {
        layout: LayoutConfig {
            overflow_mode: OverflowMode::PerRow,
            ..LayoutConfig::default()
        },
        ..MapConfig::default()
    };

    let layout = mapper_with(rooms, unallocated(2), config).layout().unwrap();
    let overflow = layout.overflow.unwrap();

    assert_eq!(overflow.pages.len(), 2);
    assert!(overflow.pages.iter().all(|page| page.cards.len() == 1));
}

#[test]
fn test_headline_categories_show_room_names() {
    let mut rooms = rooms_of("Grands Amphis", 2);
    rooms.extend(rooms_of("Salles TD", 2));

    let layout = mapper(rooms, Vec::new()).layout().unwrap();

    assert!(layout.regions[0].cards.iter().all(|c| c.name_label.is_some()));
    assert!(layout.regions[1].cards.iter().all(|c| c.name_label.is_none()));
    assert_eq!(
        layout.regions[0].cards[0].name_label.as_ref().unwrap().text,
        "Grands Amphis-0"
    );
    assert_eq!(layout.regions[1].cards[1].capacity_label.text, "Cap: 40");
}

#[test]
fn test_headline_set_comes_from_config() {
    let config = MapConfig {
        layout: LayoutConfig {
            headline_categories: ["Labs".to_string()].into_iter().collect(),
            ..LayoutConfig::default()
        },
        ..MapConfig::default()
    };

    let mut rooms = rooms_of("Labs", 1);
    rooms.extend(rooms_of("Grands Amphis", 1));
    let layout = mapper_with(rooms, Vec::new(), config).layout().unwrap();

    assert!(layout.regions[0].cards[0].name_label.is_some());
    assert!(layout.regions[1].cards[0].name_label.is_none());
}

#[test]
fn test_dense_category_title_gets_backdrop() {
    let mut rooms = rooms_of("Dense", 16);
    rooms.extend(rooms_of("Sparse", 15));

    let layout = mapper(rooms, Vec::new()).layout().unwrap();

    assert_eq!(layout.regions[0].title.text, "Dense\n(16 rooms)");
    assert!(layout.regions[0].title.backdrop);
    assert!(!layout.regions[1].title.backdrop);
}

#[test]
fn test_card_labels_anchor_to_card_edges() {
    let rooms = vec![room("GA1", "Grands Amphis", 100, Some(("Math", 50)))];
    let layout = mapper(rooms, Vec::new()).layout().unwrap();
    let card = &layout.regions[0].cards[0];
    let top = card.y + card.height;

    // Name and capacity hang from the top edge
    assert!(approx(card.name_label.as_ref().unwrap().y, top - 0.2));
    assert!(approx(card.capacity_label.y, top - 0.5));

    // Indicator and course sit on the bottom edge
    let occupancy = card.occupancy.as_ref().unwrap();
    assert!(approx(occupancy.indicator.center_y, card.y + 0.7));
    assert!(approx(occupancy.indicator.radius, 0.25));
    assert!(approx(occupancy.course_label.y, card.y + 0.3));
}

#[test]
fn test_region_grid_hangs_below_title_band() {
    let mut rooms = rooms_of("Wide", 5);
    rooms.extend(rooms_of("Tall", 40));

    let layout = mapper(rooms, unallocated(3)).layout().unwrap();
    let title_height = LayoutConfig::default().title_height;

    for region in &layout.regions {
        let viewport = &region.viewport;
        assert!(approx(viewport.offset_y, region.frame.y + title_height));

        let drawn_width = viewport.bounds.width() * viewport.scale;
        let left_gap = viewport.offset_x - region.frame.x;
        let right_gap = region.frame.x + region.frame.width - (viewport.offset_x + drawn_width);
        assert!(approx(left_gap, right_gap));
    }

    let legend = layout.legend.frame;
    let first_frame = layout.regions[0].frame;
    let last_row_bottom = layout.canvas.height - LayoutConfig::default().margin;
    assert!(approx(legend.y, first_frame.y + title_height));
    assert!(approx(legend.y + legend.height, last_row_bottom));
}

#[test]
fn test_regions_fit_inside_their_frames() {
    let mut rooms = rooms_of("Tiny", 1);
    rooms.extend(rooms_of("Huge", 60));
    rooms.extend(rooms_of("Mid", 9));

    let layout = mapper(rooms, unallocated(50)).layout().unwrap();

    for region in &layout.regions {
        assert_inside(&region.viewport, region.frame);
        assert!(region.viewport.scale <= 64.0 + 1e-9);
    }
    for page in &layout.overflow.as_ref().unwrap().pages {
        assert_inside(&page.viewport, page.frame);
    }

    let legend = layout.legend.frame;
    assert!(legend.x + legend.width <= layout.canvas.width);
    assert!(legend.y + legend.height <= layout.canvas.height);
}

#[test]
fn test_legend_spans_full_range() {
    let layout = mapper(rooms_of("A", 2), Vec::new()).layout().unwrap();
    let legend = &layout.legend;

    assert_eq!(legend.stops.len(), 11);
    assert_eq!(legend.stops[0].color, utilization_color(0.0).fill);
    assert_eq!(legend.stops[10].color, utilization_color(1.0).fill);
    assert_eq!(legend.ticks.first().unwrap().label, "0.0");
    assert_eq!(legend.ticks.last().unwrap().label, "1.0");
    assert_eq!(legend.label, "Utilization Rate");
}

#[test]
fn test_layout_is_idempotent() {
    let mut rooms = rooms_of("Salles", 11);
    rooms.extend(rooms_of("Amphis 80_100", 4));
    let mapper = mapper(rooms, unallocated(9));

    let first = serde_json::to_string(&mapper.layout().unwrap()).unwrap();
    let second = serde_json::to_string(&mapper.layout().unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_empty_snapshot_is_rejected() {
    let result = RoomMapper::new(AllocationSnapshot::default(), MapConfig::default());
    assert!(matches!(result, Err(RoomMapError::NoRooms)));
}

#[test]
fn test_invalid_rooms_are_rejected() {
    let cases = vec![
        vec![room("R1", "T", 0, None)],
        vec![room("R1", "  ", 10, None)],
        vec![room("", "T", 10, None)],
        vec![room("R1", "T", 10, None), room("R1", "U", 20, None)],
    ];

    for rooms in cases {
        let result = RoomMapper::new(
            AllocationSnapshot {
                rooms,
                unallocated_courses: Vec::new(),
            },
            MapConfig::default(),
        );
        assert!(matches!(result, Err(RoomMapError::InvalidRoom { .. })));
    }
}

#[test]
fn test_invalid_courses_are_rejected() {
    let result = RoomMapper::new(
        AllocationSnapshot {
            rooms: vec![room("R1", "T", 10, Some(("Math", 0)))],
            unallocated_courses: Vec::new(),
        },
        MapConfig::default(),
    );
    assert!(matches!(result, Err(RoomMapError::InvalidCourse { .. })));

    let result = RoomMapper::new(
        AllocationSnapshot {
            rooms: vec![room("R1", "T", 10, None)],
            unallocated_courses: vec![UnallocatedCourse {
                name: "Bio".to_string(),
                size: 0,
            }],
        },
        MapConfig::default(),
    );
    assert!(matches!(result, Err(RoomMapError::InvalidCourse { .. })));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = MapConfig {
        layout: LayoutConfig {
            card_width: 3.0,
            ..LayoutConfig::default()
        },
        ..MapConfig::default()
    };

    let result = RoomMapper::new(
        AllocationSnapshot {
            rooms: rooms_of("A", 1),
            unallocated_courses: Vec::new(),
        },
        config,
    );
    assert!(matches!(result, Err(RoomMapError::InvalidConfig(_))));
}
