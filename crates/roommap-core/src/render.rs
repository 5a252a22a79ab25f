//! Paints a [`RoomMapLayout`] as SVG and rasterizes it to PNG.

use crate::config::Theme;
use crate::types::*;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use std::fmt::Write;

const LINE_HEIGHT: f64 = 1.2;
const GRADIENT_ID: &str = "utilization-scale";
const TICK_LENGTH: f64 = 5.0;

/// Builds the SVG document for a composed layout.
pub fn render_svg(layout: &RoomMapLayout, theme: &Theme) -> Result<String> {
    let mut svg = String::new();
    let width = layout.canvas.width;
    let height = layout.canvas.height;

    writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        &mut svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = fmt_num(width),
        h = fmt_num(height),
        font = escape(&theme.font_family),
    )?;
    writeln!(
        &mut svg,
        r#"  <rect width="100%" height="100%" fill="{}"/>"#,
        escape(&theme.background)
    )?;

    for region in &layout.regions {
        write_category(&mut svg, region, theme)?;
    }

    if let Some(overflow) = &layout.overflow {
        write_overflow(&mut svg, overflow, theme)?;
    }

    write_legend(&mut svg, &layout.legend, theme)?;

    writeln!(&mut svg, "</svg>")?;
    Ok(svg)
}

/// Rasterizes an SVG document into PNG bytes.
pub fn rasterize(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(RoomMapError::InvalidConfig(format!(
            "scale must be a positive number, got {scale}"
        )));
    }

    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = Tree::from_str(svg, &options)
        .map_err(|err| RoomMapError::Render(format!("failed to parse generated SVG: {err}")))?;

    let size = tree.size().to_int_size();
    let scaled_width = (size.width() as f32 * scale).ceil();
    let scaled_height = (size.height() as f32 * scale).ceil();

    if scaled_width < 1.0 || scaled_height < 1.0 {
        return Err(RoomMapError::Render(
            "scaled dimensions collapsed below 1px".to_string(),
        ));
    }

    if scaled_width > u32::MAX as f32 || scaled_height > u32::MAX as f32 {
        return Err(RoomMapError::Render(
            "scaled dimensions exceed supported limits".to_string(),
        ));
    }

    let (scaled_width, scaled_height) = (scaled_width as u32, scaled_height as u32);
    let mut pixmap = Pixmap::new(scaled_width, scaled_height).ok_or_else(|| {
        RoomMapError::Render(format!(
            "failed to allocate {scaled_width}x{scaled_height} surface"
        ))
    })?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|err| RoomMapError::Render(format!("failed to encode PNG: {err}")))
}

fn write_category(svg: &mut String, region: &CategoryRegion, theme: &Theme) -> Result<()> {
    let viewport = &region.viewport;
    write_title(svg, region.frame, viewport, &region.title.text, region.title.backdrop, theme)?;

    for card in &region.cards {
        let rect = viewport.rect_to_canvas(card.x, card.y, card.width, card.height);
        writeln!(
            svg,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="1"/>"#,
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
            escape(&theme.card_fill),
            theme.card_opacity,
            escape(&theme.card_stroke),
        )?;

        if let Some(name) = &card.name_label {
            let size = viewport.length(theme.name_font_size);
            write_label(svg, viewport, name, size, &theme.text_color, true)?;
        }

        let size = viewport.length(theme.capacity_font_size);
        write_label(svg, viewport, &card.capacity_label, size, &theme.text_color, false)?;

        if let Some(occupancy) = &card.occupancy {
            let disc = &occupancy.indicator;
            let (cx, cy) = viewport.to_canvas(disc.center_x, disc.center_y);
            writeln!(
                svg,
                r#"  <circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                fmt_num(cx),
                fmt_num(cy),
                fmt_num(viewport.length(disc.radius)),
                disc.fill.to_hex(),
            )?;

            let size = viewport.length(theme.percent_font_size);
            write_label(
                svg,
                viewport,
                &occupancy.percent_label,
                size,
                &disc.ink.to_hex(),
                true,
            )?;

            let size = viewport.length(theme.course_font_size);
            write_label(svg, viewport, &occupancy.course_label, size, &theme.text_color, false)?;
        }
    }

    Ok(())
}

fn write_overflow(svg: &mut String, overflow: &OverflowRegion, theme: &Theme) -> Result<()> {
    for page in &overflow.pages {
        let viewport = &page.viewport;
        if page.index == 0 {
            write_title(svg, page.frame, viewport, &overflow.title, false, theme)?;
        }

        for card in &page.cards {
            let rect = viewport.rect_to_canvas(card.x, card.y, card.width, card.height);
            writeln!(
                svg,
                r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="1"/>"#,
                fmt_num(rect.x),
                fmt_num(rect.y),
                fmt_num(rect.width),
                fmt_num(rect.height),
                escape(&theme.overflow_fill),
                theme.card_opacity,
                escape(&theme.overflow_stroke),
            )?;

            let size = viewport.length(theme.overflow_font_size);
            write_label(svg, viewport, &card.label, size, &theme.text_color, false)?;
        }
    }

    Ok(())
}

fn write_legend(svg: &mut String, legend: &Legend, theme: &Theme) -> Result<()> {
    let frame = legend.frame;

    // Gradient runs bottom (0.0) to top (1.0)
    writeln!(svg, "  <defs>")?;
    writeln!(
        svg,
        r#"    <linearGradient id="{GRADIENT_ID}" x1="0" y1="1" x2="0" y2="0">"#
    )?;
    for stop in &legend.stops {
        writeln!(
            svg,
            r#"      <stop offset="{}" stop-color="{}"/>"#,
            fmt_num(stop.offset),
            stop.color.to_hex()
        )?;
    }
    writeln!(svg, "    </linearGradient>")?;
    writeln!(svg, "  </defs>")?;

    writeln!(
        svg,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="url(#{GRADIENT_ID})" stroke="{}" stroke-width="1"/>"#,
        fmt_num(frame.x),
        fmt_num(frame.y),
        fmt_num(frame.width),
        fmt_num(frame.height),
        escape(&theme.text_color),
    )?;

    let right = frame.x + frame.width;
    for tick in &legend.ticks {
        let y = frame.y + frame.height * (1.0 - tick.value);
        writeln!(
            svg,
            r#"  <line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-width="1"/>"#,
            fmt_num(right),
            fmt_num(right + TICK_LENGTH),
            escape(&theme.text_color),
            y = fmt_num(y),
        )?;
        writeln!(
            svg,
            r#"  <text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="start" dominant-baseline="central">{}</text>"#,
            fmt_num(right + TICK_LENGTH * 2.0),
            fmt_num(y),
            fmt_num(theme.legend_font_size),
            escape(&theme.text_color),
            escape(&tick.label),
        )?;
    }

    let label_x = right + TICK_LENGTH * 2.0 + theme.legend_font_size * 3.0;
    let label_y = frame.y + frame.height / 2.0;
    writeln!(
        svg,
        r#"  <text x="{x}" y="{y}" font-size="{}" fill="{}" text-anchor="middle" dominant-baseline="central" transform="rotate(-90 {x} {y})">{}</text>"#,
        fmt_num(theme.legend_font_size),
        escape(&theme.text_color),
        escape(&legend.label),
        x = fmt_num(label_x),
        y = fmt_num(label_y),
    )?;

    Ok(())
}

/// Centers a title in the band between the frame top and the viewport.
fn write_title(
    svg: &mut String,
    frame: Rect,
    viewport: &Viewport,
    text: &str,
    backdrop: bool,
    theme: &Theme,
) -> Result<()> {
    let x = frame.x + frame.width / 2.0;
    let y = (frame.y + viewport.offset_y) / 2.0;
    let size = theme.title_font_size;

    if backdrop {
        let lines = text.lines().count().max(1) as f64;
        let longest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0) as f64;
        let width = longest * size * 0.6 + size;
        let height = lines * size * LINE_HEIGHT + size * 0.4;
        writeln!(
            svg,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="0.8"/>"#,
            fmt_num(x - width / 2.0),
            fmt_num(y - height / 2.0),
            fmt_num(width),
            fmt_num(height),
            escape(&theme.title_backdrop),
        )?;
    }

    write_text(svg, x, y, text, size, &theme.text_color, true)
}

fn write_label(
    svg: &mut String,
    viewport: &Viewport,
    label: &Label,
    size: f64,
    fill: &str,
    bold: bool,
) -> Result<()> {
    let (x, y) = viewport.to_canvas(label.x, label.y);
    write_text(svg, x, y, &label.text, size, fill, bold)
}

/// Writes centered, possibly multi-line text around `(x, y)`.
fn write_text(
    svg: &mut String,
    x: f64,
    y: f64,
    text: &str,
    size: f64,
    fill: &str,
    bold: bool,
) -> Result<()> {
    let lines: Vec<&str> = text.split('\n').collect();
    let step = size * LINE_HEIGHT;
    let first = y - step * (lines.len() - 1) as f64 / 2.0;
    let weight = if bold { "bold" } else { "normal" };

    write!(
        svg,
        r#"  <text font-size="{}" font-weight="{weight}" fill="{}" text-anchor="middle" dominant-baseline="central">"#,
        fmt_num(size),
        escape(fill),
    )?;
    for (i, line) in lines.iter().enumerate() {
        write!(
            svg,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            fmt_num(x),
            fmt_num(first + step * i as f64),
            escape(line),
        )?;
    }
    writeln!(svg, "</text>")?;

    Ok(())
}

fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{rounded:.0}")
    } else {
        format!("{rounded}")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::mapper::RoomMapper;

    fn sample_mapper() -> RoomMapper {
        let snapshot = AllocationSnapshot {
            rooms: vec![
                Room {
                    name: "Amphi <A>".to_string(),
                    room_type: "Grands Amphis".to_string(),
                    capacity: 200,
                    course: Some(Course {
                        name: "Algebra & Logic".to_string(),
                        size: 150,
                    }),
                },
                Room {
                    name: "S101".to_string(),
                    room_type: "Salles TD".to_string(),
                    capacity: 30,
                    course: None,
                },
            ],
            unallocated_courses: vec![UnallocatedCourse {
                name: "Chemistry".to_string(),
                size: 40,
            }],
        };
        RoomMapper::new(snapshot, MapConfig::default()).unwrap()
    }

    #[test]
    fn test_svg_contains_every_element() {
        let svg = sample_mapper().render_svg().unwrap();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Amphi &lt;A&gt;"));
        assert!(svg.contains("Algebra &amp; Logic"));
        assert!(svg.contains("75%"));
        assert!(svg.contains("Cap: 30"));
        assert!(svg.contains("Unallocated Courses"));
        assert!(svg.contains("Chemistry"));
        assert!(svg.contains("Utilization Rate"));
        assert!(svg.contains(GRADIENT_ID));
        // Vacant room in a non-headline category shows no name
        assert!(!svg.contains(">S101<"));
    }

    #[test]
    fn test_svg_is_deterministic() {
        let mapper = sample_mapper();
        assert_eq!(mapper.render_svg().unwrap(), mapper.render_svg().unwrap());
    }

    #[test]
    fn test_png_output_has_signature() {
        let png = sample_mapper().render_png(0.5).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_rasterize_rejects_bad_scale() {
        let svg = sample_mapper().render_svg().unwrap();
        assert!(matches!(
            rasterize(&svg, 0.0),
            Err(RoomMapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fmt_num_trims_integers() {
        assert_eq!(fmt_num(40.0), "40");
        assert_eq!(fmt_num(12.346), "12.35");
        assert_eq!(fmt_num(-0.5), "-0.5");
    }
}
