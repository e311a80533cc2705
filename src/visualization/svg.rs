use super::sampled;
use crate::frame::SociomeDataFrame;
use crate::performance::Timer;
use crate::types::{BoundingBox, Geometry, Point};
use anyhow::{bail, Context, Result};
use log::info;
use std::fmt::Write as _;
use std::path::Path;

const PANEL_SIZE: f64 = 480.0;
const MARGIN: f64 = 24.0;
const TITLE_HEIGHT: f64 = 28.0;
const MARKER_RADIUS: f64 = 1.5;
const LOCATIONS_COLOR: &str = "#1f77b4";
const MISSING_COLOR: &str = "#d9d9d9";

/// ColorBrewer OrRd, 9 classes.
const OR_RD: [(u8, u8, u8); 9] = [
    (0xff, 0xf7, 0xec),
    (0xfe, 0xe8, 0xc8),
    (0xfd, 0xd4, 0x9e),
    (0xfd, 0xbb, 0x84),
    (0xfc, 0x8d, 0x59),
    (0xef, 0x65, 0x48),
    (0xd7, 0x30, 0x1f),
    (0xb3, 0x00, 0x00),
    (0x7f, 0x00, 0x00),
];

/// Colour for `t` in [0, 1] along the OrRd ramp.
pub fn or_rd(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (OR_RD.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(OR_RD.len() - 1);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (OR_RD[lo], OR_RD[hi]);
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

struct Projection {
    bbox: BoundingBox,
    scale: f64,
}

impl Projection {
    fn new(bbox: BoundingBox) -> Self {
        let span = (bbox.max_x - bbox.min_x).max(bbox.max_y - bbox.min_y);
        let scale = if span > 0.0 { (PANEL_SIZE - 2.0 * MARGIN) / span } else { 1.0 };
        Self { bbox, scale }
    }

    fn project(&self, offset_x: f64, p: &Point) -> (f64, f64) {
        (
            offset_x + MARGIN + (p.x - self.bbox.min_x) * self.scale,
            TITLE_HEIGHT + MARGIN + (self.bbox.max_y - p.y) * self.scale,
        )
    }
}

fn ring_path(out: &mut String, projection: &Projection, offset_x: f64, ring: &[Point]) {
    for (i, p) in ring.iter().enumerate() {
        let (x, y) = projection.project(offset_x, p);
        let _ = write!(out, "{}{:.2},{:.2} ", if i == 0 { "M" } else { "L" }, x, y);
    }
    out.push_str("Z ");
}

fn draw_geometry(out: &mut String, projection: &Projection, offset_x: f64, geometry: &Geometry, color: &str) {
    match geometry {
        Geometry::Point(p) => {
            let (x, y) = projection.project(offset_x, p);
            let _ = writeln!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}"/>"#,
                x, y, MARKER_RADIUS, color
            );
        }
        Geometry::MultiPoint(points) => {
            for p in points {
                draw_geometry(out, projection, offset_x, &Geometry::Point(*p), color);
            }
        }
        Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            let lines = match geometry {
                Geometry::LineString(line) => std::slice::from_ref(line),
                Geometry::MultiLineString(lines) => lines.as_slice(),
                _ => &[],
            };
            let mut d = String::new();
            for line in lines {
                for (i, p) in line.iter().enumerate() {
                    let (x, y) = projection.project(offset_x, p);
                    let _ = write!(d, "{}{:.2},{:.2} ", if i == 0 { "M" } else { "L" }, x, y);
                }
            }
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="1"/>"#,
                d.trim_end(),
                color
            );
        }
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
            let polygons = match geometry {
                Geometry::Polygon(p) => std::slice::from_ref(p),
                Geometry::MultiPolygon(ps) => ps.as_slice(),
                _ => &[],
            };
            let mut d = String::new();
            for polygon in polygons {
                ring_path(&mut d, projection, offset_x, &polygon.exterior);
                for hole in &polygon.holes {
                    ring_path(&mut d, projection, offset_x, hole);
                }
            }
            let _ = writeln!(
                out,
                r##"<path d="{}" fill="{}" fill-rule="evenodd" stroke="#ffffff" stroke-width="0.3"/>"##,
                d.trim_end(),
                color
            );
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl SociomeDataFrame {
    /// Render one map panel per column, side by side, as an SVG document.
    pub fn to_svg_string(&self, columns: &[&str], sampling_rate: f64) -> Result<String> {
        if columns.is_empty() {
            bail!("At least one column is required to render");
        }
        for column in columns {
            self.require_column(column)?;
        }
        let frame = sampled(self, sampling_rate)?;

        let mut bbox = BoundingBox::empty();
        for geometry in frame.geometry.iter().flatten() {
            bbox.merge(&geometry.bbox());
        }
        if bbox.is_empty() {
            bail!("Nothing to render: frame has no geometry");
        }
        let projection = Projection::new(bbox);
        let flat = columns == [Self::LOCATIONS_KEY];

        let width = PANEL_SIZE * columns.len() as f64;
        let height = PANEL_SIZE + TITLE_HEIGHT;
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = width,
            h = height
        );
        let _ = writeln!(out, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);

        for (panel, column) in columns.iter().enumerate() {
            let offset_x = panel as f64 * PANEL_SIZE;
            let values = frame.require_column(column)?;
            let numbers: Vec<Option<f64>> = values.iter().map(|v| v.as_f64().filter(|x| x.is_finite())).collect();
            let (min, max) = numbers
                .iter()
                .flatten()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let range = max - min;

            let _ = writeln!(out, r#"<g id="panel-{}">"#, panel);
            let _ = writeln!(
                out,
                r#"<text x="{:.1}" y="20" font-family="sans-serif" font-size="14" text-anchor="middle">{}</text>"#,
                offset_x + PANEL_SIZE / 2.0,
                escape(column)
            );
            for (row, geometry) in frame.geometry.iter().enumerate() {
                let Some(geometry) = geometry else { continue };
                let color = if flat {
                    LOCATIONS_COLOR.to_string()
                } else {
                    match numbers[row] {
                        Some(v) if range > 0.0 => or_rd((v - min) / range),
                        Some(_) => or_rd(1.0),
                        None => MISSING_COLOR.to_string(),
                    }
                };
                draw_geometry(&mut out, &projection, offset_x, geometry, &color);
            }
            out.push_str("</g>\n");
        }
        out.push_str("</svg>\n");
        Ok(out)
    }

    /// Write the rendering from [`Self::to_svg_string`] to `path`.
    pub fn to_svg_file<P: AsRef<Path>>(&self, path: P, columns: &[&str], sampling_rate: f64) -> Result<()> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] to_svg_file");
        info!("[SociomeDataFrame] Rendering {:?} to {}", columns, path.display());
        let svg = self.to_svg_string(columns, sampling_rate)?;
        std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        timer.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn frame() -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![
            Some(Geometry::point(-87.6, 41.8)),
            Some(Geometry::point(-87.7, 41.9)),
            Some(Geometry::point(-87.65, 41.85)),
        ]);
        frame.fill_column(SociomeDataFrame::LOCATIONS_KEY, Value::from(1.0)).unwrap();
        frame
            .set_column("pm25", vec![Value::from(5.0), Value::from(15.0), Value::Null])
            .unwrap();
        frame
    }

    #[test]
    fn ramp_endpoints() {
        assert_eq!(or_rd(0.0), "#fff7ec");
        assert_eq!(or_rd(1.0), "#7f0000");
        assert_eq!(or_rd(f64::NAN), "#fff7ec");
    }

    #[test]
    fn one_panel_per_column() {
        let svg = frame().to_svg_string(&["pm25", "LOCATIONS"], 1.0).unwrap();
        assert!(svg.contains(r#"id="panel-0""#));
        assert!(svg.contains(r#"id="panel-1""#));
        assert_eq!(svg.matches("<circle").count(), 6);
        assert!(svg.contains("#7f0000"));
        assert!(svg.contains(MISSING_COLOR));
    }

    #[test]
    fn locations_only_uses_flat_colour() {
        let svg = frame().to_svg_string(&["LOCATIONS"], 1.0).unwrap();
        assert_eq!(svg.matches(LOCATIONS_COLOR).count(), 3);
    }

    #[test]
    fn unknown_column_is_an_error() {
        assert!(frame().to_svg_string(&["nope"], 1.0).is_err());
        assert!(frame().to_svg_string(&[], 1.0).is_err());
    }
}
