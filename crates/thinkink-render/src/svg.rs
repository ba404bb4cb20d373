//! SVG export.
//!
//! Produces a standalone document covering the element bounds plus
//! [`EXPORT_PADDING`]. Shapes are written as clean geometry; the hand-drawn
//! wobble is a raster effect only.

use crate::pipeline::arrow_head;
use crate::raster::{EXPORT_PADDING, export_bounds};
use crate::renderer::ExportError;
use kurbo::Point;
use std::fmt::{self, Write};
use thinkink_core::element::{Element, ElementKind, Rgba};
use thinkink_core::geometry::{element_bounds, text_font_size};

/// Export `elements` as an SVG document.
pub fn export_svg(elements: &[Element]) -> Result<String, ExportError> {
    let bounds = export_bounds(elements).ok_or(ExportError::EmptyDocument)?;
    let mut out = String::new();
    write_document(&mut out, elements, bounds).map_err(|e| ExportError::Encode(e.to_string()))?;
    log::info!("Exported {} elements as SVG", elements.len());
    Ok(out)
}

fn write_document(out: &mut String, elements: &[Element], bounds: kurbo::Rect) -> fmt::Result {
    let (x, y, w, h) = (bounds.x0, bounds.y0, bounds.width(), bounds.height());
    writeln!(
        out,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"##,
        num(w),
        num(h),
        num(x),
        num(y),
        num(w),
        num(h)
    )?;
    writeln!(
        out,
        r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff"/>"##,
        num(x),
        num(y),
        num(w),
        num(h)
    )?;
    for element in elements {
        write_element(out, element)?;
    }
    out.push_str("</svg>\n");
    Ok(())
}

fn write_element(out: &mut String, el: &Element) -> fmt::Result {
    let style = &el.style;
    let mut common = format!(r##" opacity="{}""##, num(style.opacity));
    if el.rotation != 0.0 {
        let center = element_bounds(el).center();
        write!(
            common,
            r##" transform="rotate({} {} {})""##,
            num(el.rotation.to_degrees()),
            num(center.x),
            num(center.y)
        )?;
    }
    let stroke = paint("stroke", style.stroke_color);
    let width = num(style.stroke_width);

    match &el.kind {
        ElementKind::Rectangle => writeln!(
            out,
            r##"  <rect x="{}" y="{}" width="{}" height="{}" {} {} stroke-width="{}"{}/>"##,
            num(el.position.x),
            num(el.position.y),
            num(el.width),
            num(el.height),
            stroke,
            fill(style.fill_color),
            width,
            common
        ),
        ElementKind::Ellipse => writeln!(
            out,
            r##"  <ellipse cx="{}" cy="{}" rx="{}" ry="{}" {} {} stroke-width="{}"{}/>"##,
            num(el.position.x + el.width / 2.0),
            num(el.position.y + el.height / 2.0),
            num(el.width / 2.0),
            num(el.height / 2.0),
            stroke,
            fill(style.fill_color),
            width,
            common
        ),
        ElementKind::Line { .. } => {
            let [start, end] = endpoints(el);
            writeln!(
                out,
                r##"  <line x1="{}" y1="{}" x2="{}" y2="{}" {} stroke-width="{}" stroke-linecap="round"{}/>"##,
                num(start.x),
                num(start.y),
                num(end.x),
                num(end.y),
                stroke,
                width,
                common
            )
        }
        ElementKind::Arrow { .. } => {
            let [start, end] = endpoints(el);
            let [left, right] = arrow_head(start, end);
            writeln!(out, r##"  <g{}>"##, common)?;
            writeln!(
                out,
                r##"    <line x1="{}" y1="{}" x2="{}" y2="{}" {} stroke-width="{}" stroke-linecap="round"/>"##,
                num(start.x),
                num(start.y),
                num(end.x),
                num(end.y),
                stroke,
                width
            )?;
            writeln!(
                out,
                r##"    <polyline points="{},{} {},{} {},{}" fill="none" {} stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"##,
                num(left.x),
                num(left.y),
                num(end.x),
                num(end.y),
                num(right.x),
                num(right.y),
                stroke,
                width
            )?;
            writeln!(out, "  </g>")
        }
        ElementKind::Pen { .. } | ElementKind::DisappearingPen { .. } => {
            let points = el.absolute_points();
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            let mut d = format!("M {} {}", num(first.x), num(first.y));
            for p in rest {
                write!(d, " L {} {}", num(p.x), num(p.y))?;
            }
            writeln!(
                out,
                r##"  <path d="{}" fill="none" {} stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"{}/>"##,
                d, stroke, width, common
            )
        }
        ElementKind::Text { text } => writeln!(
            out,
            r##"  <text x="{}" y="{}" font-family="sans-serif" font-size="{}" {}{}>{}</text>"##,
            num(el.position.x),
            num(el.position.y),
            num(text_font_size(el)),
            paint("fill", style.stroke_color),
            common,
            escape_xml(text)
        ),
        ElementKind::Image { image } => writeln!(
            out,
            r##"  <image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" href="{}"{}/>"##,
            num(el.position.x),
            num(el.position.y),
            num(el.width),
            num(el.height),
            image.to_data_url(),
            common
        ),
    }
}

fn endpoints(el: &Element) -> [Point; 2] {
    match el.absolute_points().as_slice() {
        &[start, end, ..] => [start, end],
        _ => [el.position, el.position],
    }
}

/// `name="#rrggbb"` plus a separate opacity attribute for translucent colors.
fn paint(name: &str, color: Rgba) -> String {
    if color.is_transparent() {
        return format!(r##"{name}="none""##);
    }
    let opaque = Rgba { a: 255, ..color };
    if color.a == 255 {
        format!(r##"{name}="{}""##, opaque.to_hex())
    } else {
        format!(
            r##"{name}="{}" {name}-opacity="{}""##,
            opaque.to_hex(),
            num(color.a as f64 / 255.0)
        )
    }
}

fn fill(color: Option<Rgba>) -> String {
    paint("fill", color.unwrap_or(Rgba::TRANSPARENT))
}

/// Compact decimal form: at most three fractional digits, no trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
