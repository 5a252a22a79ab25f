//! Diverging utilization scale: green when a room is nearly empty, yellow at
//! half, red when full or over-filled.

use crate::types::{LegendStop, Rgb};

/// RdYlGn colorbrewer stops, reversed so that index 0 is the low end.
const SCALE: [Rgb; 11] = [
    Rgb::new(0x00, 0x68, 0x37),
    Rgb::new(0x1a, 0x98, 0x50),
    Rgb::new(0x66, 0xbd, 0x63),
    Rgb::new(0xa6, 0xd9, 0x6a),
    Rgb::new(0xd9, 0xef, 0x8b),
    Rgb::new(0xff, 0xff, 0xbf),
    Rgb::new(0xfe, 0xe0, 0x8b),
    Rgb::new(0xfd, 0xae, 0x61),
    Rgb::new(0xf4, 0x6d, 0x43),
    Rgb::new(0xd7, 0x30, 0x27),
    Rgb::new(0xa5, 0x00, 0x26),
];

/// Utilization above which labels switch to black ink.
pub const INK_THRESHOLD: f64 = 0.5;

/// Fill color plus the ink that stays legible on top of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilizationColor {
    pub fill: Rgb,
    pub ink: Rgb,
}

/// Maps a utilization ratio onto the scale.
///
/// The ratio is taken as-is; samples outside `[0, 1]` saturate at the end
/// colors while the ink rule still sees the raw value.
pub fn utilization_color(utilization: f64) -> UtilizationColor {
    let ink = if utilization > INK_THRESHOLD {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    };

    UtilizationColor {
        fill: sample(utilization),
        ink,
    }
}

/// Samples the scale at `count` evenly spaced positions over `[0, 1]`.
pub fn legend_stops(count: usize) -> Vec<LegendStop> {
    let count = count.max(2);
    (0..count)
        .map(|i| {
            let offset = i as f64 / (count - 1) as f64;
            LegendStop {
                offset,
                color: utilization_color(offset).fill,
            }
        })
        .collect()
}

fn sample(value: f64) -> Rgb {
    if value.is_nan() || value <= 0.0 {
        return SCALE[0];
    }
    if value >= 1.0 {
        return SCALE[SCALE.len() - 1];
    }

    let position = value * (SCALE.len() - 1) as f64;
    let index = position.floor() as usize;
    let t = position - index as f64;
    let lower = SCALE[index];
    let upper = SCALE[(index + 1).min(SCALE.len() - 1)];

    Rgb::new(
        lerp(lower.r, upper.r, t),
        lerp(lower.g, upper.g, t),
        lerp(lower.b, upper.b, t),
    )
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + t * (b as f64 - a as f64)).round() as u8
}
