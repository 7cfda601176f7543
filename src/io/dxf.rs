// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Minimal ASCII DXF support
//!
//! Reading understands `LWPOLYLINE`, `POLYLINE`/`VERTEX`/`SEQEND`, `CIRCLE`
//! and `LINE` in the `ENTITIES` section. Writing emits an R12-style file with
//! a layer table and `LWPOLYLINE`/`LINE` entities.

use crate::geometry::Segment;
use nalgebra::Point2;
use pest::Parser;
use pest_derive::Parser;
use std::io::{self, Write};

#[derive(Parser)]
#[grammar = "io/dxf.pest"]
struct DxfParser;

/// Vertices closer than this to the first vertex close an open polyline
const CLOSE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct DxfPolyline {
    pub layer: String,
    pub points: Vec<Point2<f64>>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DxfCircle {
    pub layer: String,
    pub center: Point2<f64>,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DxfLine {
    pub layer: String,
    pub color: Option<i16>,
    pub segment: Segment,
}

/// Entities of interest found in a drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfDrawing {
    pub polylines: Vec<DxfPolyline>,
    pub circles: Vec<DxfCircle>,
    pub lines: Vec<DxfLine>,
    /// Entity types present but not understood
    pub skipped: Vec<String>,
}

/// Entity under construction
#[derive(Debug)]
enum Pending {
    None,
    Light(DxfPolyline),
    Heavy(DxfPolyline),
    Vertex(DxfPolyline, Option<f64>, Option<f64>),
    Circle(String, Option<f64>, Option<f64>, Option<f64>),
    Line(String, Option<i16>, [Option<f64>; 4]),
}

/// Parse DXF text, keeping geometry from the `ENTITIES` section
pub fn parse_dxf(source: &str) -> Result<DxfDrawing, String> {
    let drawing = DxfParser::parse(Rule::drawing, source)
        .map_err(|e| e.to_string())?
        .next()
        .ok_or_else(|| "empty parse".to_string())?;

    let mut groups = Vec::new();
    for group in drawing.into_inner().filter(|p| p.as_rule() == Rule::group) {
        let (line, _) = group.line_col();
        let mut inner = group.into_inner();
        let code = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
        let value = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
        let code: i32 = code
            .parse()
            .map_err(|_| format!("line {}: bad group code '{}'", line, code))?;
        groups.push((line, code, value));
    }

    let mut out = DxfDrawing::default();
    let mut in_entities = false;
    let mut expect_section_name = false;
    let mut pending = Pending::None;

    for (line, code, value) in groups {
        if code == 0 {
            pending = finish(pending, value, &mut out);
            if value == "SECTION" {
                expect_section_name = true;
                continue;
            }
            if value == "ENDSEC" {
                in_entities = false;
                continue;
            }
            if !in_entities {
                continue;
            }
            pending = match (value, pending) {
                ("LWPOLYLINE", _) => Pending::Light(empty_polyline()),
                ("POLYLINE", _) => Pending::Heavy(empty_polyline()),
                ("VERTEX", Pending::Heavy(poly)) => Pending::Vertex(poly, None, None),
                ("CIRCLE", _) => Pending::Circle(String::new(), None, None, None),
                ("LINE", _) => Pending::Line(String::new(), None, [None; 4]),
                (other, _) => {
                    if other != "SEQEND" && other != "EOF" {
                        out.skipped.push(other.to_string());
                    }
                    Pending::None
                }
            };
            continue;
        }

        if expect_section_name && code == 2 {
            in_entities = value == "ENTITIES";
            expect_section_name = false;
            continue;
        }

        let number = || -> Result<f64, String> {
            value.parse().map_err(|_| {
                format!(
                    "line {}: expected number for code {}, got '{}'",
                    line + 1,
                    code,
                    value
                )
            })
        };

        match &mut pending {
            Pending::Light(poly) => match code {
                8 => poly.layer = value.to_string(),
                70 => poly.closed = flags(value) & 1 == 1,
                10 => poly.points.push(Point2::new(number()?, 0.0)),
                20 => {
                    if let Some(last) = poly.points.last_mut() {
                        last.y = number()?;
                    }
                }
                _ => {}
            },
            Pending::Heavy(poly) => match code {
                8 => poly.layer = value.to_string(),
                70 => poly.closed = flags(value) & 1 == 1,
                _ => {}
            },
            Pending::Vertex(_, x, y) => match code {
                10 => *x = Some(number()?),
                20 => *y = Some(number()?),
                _ => {}
            },
            Pending::Circle(layer, x, y, r) => match code {
                8 => *layer = value.to_string(),
                10 => *x = Some(number()?),
                20 => *y = Some(number()?),
                40 => *r = Some(number()?),
                _ => {}
            },
            Pending::Line(layer, color, coords) => match code {
                8 => *layer = value.to_string(),
                62 => *color = value.parse().ok(),
                10 => coords[0] = Some(number()?),
                20 => coords[1] = Some(number()?),
                11 => coords[2] = Some(number()?),
                21 => coords[3] = Some(number()?),
                _ => {}
            },
            Pending::None => {}
        }
    }
    finish(pending, "EOF", &mut out);

    Ok(out)
}

fn empty_polyline() -> DxfPolyline {
    DxfPolyline {
        layer: String::new(),
        points: Vec::new(),
        closed: false,
    }
}

fn flags(value: &str) -> i32 {
    value.parse().unwrap_or(0)
}

/// Complete the pending entity when group code 0 `next` arrives
fn finish(pending: Pending, next: &str, out: &mut DxfDrawing) -> Pending {
    match pending {
        Pending::Light(poly) => {
            out.polylines.push(normalise(poly));
            Pending::None
        }
        Pending::Heavy(poly) if next == "VERTEX" => Pending::Heavy(poly),
        Pending::Heavy(poly) => {
            out.polylines.push(normalise(poly));
            Pending::None
        }
        Pending::Vertex(mut poly, x, y) => {
            if let (Some(x), Some(y)) = (x, y) {
                poly.points.push(Point2::new(x, y));
            }
            if next == "VERTEX" {
                Pending::Heavy(poly)
            } else {
                out.polylines.push(normalise(poly));
                Pending::None
            }
        }
        Pending::Circle(layer, Some(x), Some(y), Some(radius)) => {
            out.circles.push(DxfCircle {
                layer,
                center: Point2::new(x, y),
                radius,
            });
            Pending::None
        }
        Pending::Line(layer, color, [Some(x0), Some(y0), Some(x1), Some(y1)]) => {
            out.lines.push(DxfLine {
                layer,
                color,
                segment: Segment::new(Point2::new(x0, y0), Point2::new(x1, y1)),
            });
            Pending::None
        }
        _ => Pending::None,
    }
}

/// Treat a polyline whose last vertex repeats the first as closed
fn normalise(mut poly: DxfPolyline) -> DxfPolyline {
    if poly.points.len() > 2 {
        if let (Some(first), Some(last)) = (poly.points.first(), poly.points.last()) {
            if (first - last).norm() < CLOSE_EPSILON {
                poly.points.pop();
                poly.closed = true;
            }
        }
    }
    poly
}

/// Streaming DXF writer
pub struct DxfWriter<W: Write> {
    out: W,
    in_entities: bool,
}

impl<W: Write> DxfWriter<W> {
    /// Write the header and a layer table of `(name, colour)` pairs
    pub fn new(mut out: W, layers: &[(String, i16)]) -> io::Result<Self> {
        pair(&mut out, 0, "SECTION")?;
        pair(&mut out, 2, "HEADER")?;
        pair(&mut out, 9, "$ACADVER")?;
        pair(&mut out, 1, "AC1009")?;
        pair(&mut out, 9, "$INSUNITS")?;
        pair(&mut out, 70, "4")?;
        pair(&mut out, 0, "ENDSEC")?;

        pair(&mut out, 0, "SECTION")?;
        pair(&mut out, 2, "TABLES")?;
        pair(&mut out, 0, "TABLE")?;
        pair(&mut out, 2, "LAYER")?;
        pair(&mut out, 70, &layers.len().to_string())?;
        for (name, color) in layers {
            pair(&mut out, 0, "LAYER")?;
            pair(&mut out, 2, name)?;
            pair(&mut out, 70, "0")?;
            pair(&mut out, 62, &color.to_string())?;
            pair(&mut out, 6, "CONTINUOUS")?;
        }
        pair(&mut out, 0, "ENDTAB")?;
        pair(&mut out, 0, "ENDSEC")?;

        pair(&mut out, 0, "SECTION")?;
        pair(&mut out, 2, "ENTITIES")?;
        Ok(Self {
            out,
            in_entities: true,
        })
    }

    pub fn lwpolyline(
        &mut self,
        layer: &str,
        points: &[Point2<f64>],
        closed: bool,
    ) -> io::Result<()> {
        pair(&mut self.out, 0, "LWPOLYLINE")?;
        pair(&mut self.out, 8, layer)?;
        pair(&mut self.out, 90, &points.len().to_string())?;
        pair(&mut self.out, 70, if closed { "1" } else { "0" })?;
        for p in points {
            pair(&mut self.out, 10, &coord(p.x))?;
            pair(&mut self.out, 20, &coord(p.y))?;
        }
        Ok(())
    }

    pub fn line(&mut self, layer: &str, color: i16, segment: &Segment) -> io::Result<()> {
        pair(&mut self.out, 0, "LINE")?;
        pair(&mut self.out, 8, layer)?;
        pair(&mut self.out, 62, &color.to_string())?;
        pair(&mut self.out, 10, &coord(segment.start.x))?;
        pair(&mut self.out, 20, &coord(segment.start.y))?;
        pair(&mut self.out, 30, "0.0")?;
        pair(&mut self.out, 11, &coord(segment.end.x))?;
        pair(&mut self.out, 21, &coord(segment.end.y))?;
        pair(&mut self.out, 31, "0.0")
    }

    pub fn circle(&mut self, layer: &str, center: &Point2<f64>, radius: f64) -> io::Result<()> {
        pair(&mut self.out, 0, "CIRCLE")?;
        pair(&mut self.out, 8, layer)?;
        pair(&mut self.out, 10, &coord(center.x))?;
        pair(&mut self.out, 20, &coord(center.y))?;
        pair(&mut self.out, 30, "0.0")?;
        pair(&mut self.out, 40, &coord(radius))
    }

    /// Close the entities section and the file
    pub fn finish(mut self) -> io::Result<W> {
        if self.in_entities {
            pair(&mut self.out, 0, "ENDSEC")?;
            self.in_entities = false;
        }
        pair(&mut self.out, 0, "EOF")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

fn pair<W: Write>(out: &mut W, code: i32, value: &str) -> io::Result<()> {
    writeln!(out, "{:>3}", code)?;
    writeln!(out, "{}", value)
}

fn coord(v: f64) -> String {
    format!("{:.6}", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written<F>(f: F) -> String
    where
        F: FnOnce(&mut DxfWriter<Vec<u8>>) -> io::Result<()>,
    {
        let mut writer = DxfWriter::new(Vec::new(), &[("LAYER_0".to_string(), 7)]).unwrap();
        f(&mut writer).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_polyline_round_trip() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 5.0),
        ];
        let text = written(|w| w.lwpolyline("LAYER_0", &points, true));
        let drawing = parse_dxf(&text).unwrap();
        assert_eq!(drawing.polylines.len(), 1);
        assert_eq!(drawing.polylines[0].points, points);
        assert!(drawing.polylines[0].closed);
        assert_eq!(drawing.polylines[0].layer, "LAYER_0");
    }

    #[test]
    fn test_lines_and_circles() {
        let seg = Segment::new(Point2::new(1.0, 2.0), Point2::new(3.0, 4.0));
        let text = written(|w| {
            w.line("PASS_0", 1, &seg)?;
            w.circle("LAYER_0", &Point2::new(5.0, 5.0), 2.5)
        });
        let drawing = parse_dxf(&text).unwrap();
        assert_eq!(drawing.lines.len(), 1);
        assert_eq!(drawing.lines[0].segment, seg);
        assert_eq!(drawing.lines[0].color, Some(1));
        assert_eq!(drawing.circles.len(), 1);
        assert_eq!(drawing.circles[0].radius, 2.5);
    }

    #[test]
    fn test_heavy_polyline() {
        let text = "0\nSECTION\n2\nENTITIES\n0\nPOLYLINE\n8\n0\n70\n1\n\
                    0\nVERTEX\n10\n0\n20\n0\n0\nVERTEX\n10\n4\n20\n0\n\
                    0\nVERTEX\n10\n4\n20\n3\n0\nSEQEND\n0\nENDSEC\n0\nEOF\n";
        let drawing = parse_dxf(text).unwrap();
        assert_eq!(drawing.polylines.len(), 1);
        assert_eq!(drawing.polylines[0].points.len(), 3);
        assert!(drawing.polylines[0].closed);
    }

    #[test]
    fn test_open_polyline_with_repeated_start_closes() {
        let text = "0\nSECTION\n2\nENTITIES\n0\nLWPOLYLINE\n70\n0\n\
                    10\n0\n20\n0\n10\n1\n20\n0\n10\n1\n20\n1\n10\n0\n20\n0\n\
                    0\nENDSEC\n0\nEOF";
        let drawing = parse_dxf(text).unwrap();
        assert!(drawing.polylines[0].closed);
        assert_eq!(drawing.polylines[0].points.len(), 3);
    }

    #[test]
    fn test_bad_group_code() {
        assert!(parse_dxf("zero\nSECTION\n").is_err());
    }

    #[test]
    fn test_unknown_entities_are_recorded() {
        let text = "0\nSECTION\n2\nENTITIES\n0\nSPLINE\n8\n0\n0\nENDSEC\n0\nEOF\n";
        let drawing = parse_dxf(text).unwrap();
        assert_eq!(drawing.skipped, vec!["SPLINE".to_string()]);
    }
}
