//! UFO contour parsing and joint conversion to TrueType point lists.

use kurbo::{CubicBez, Point, QuadBez};
use lectura_font_ufo::{Contour, ContourPoint, Glyph, PointType};
use write_fonts::read::tables::glyf::CurvePoint;

use crate::{
    error::{Error, Result},
    quadratic::cubics_to_quads_jointly,
};

/// One segment of a closed contour, ending on an on-curve point.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Line(Point),
    /// Cubic with two controls.
    Cubic(Point, Point, Point),
    /// Quadratic run (TrueType style, possibly with implied on-curves).
    Quad(Vec<Point>, Point),
}

/// A parsed closed contour: a start point plus segments returning to it.
#[derive(Debug, Clone, PartialEq)]
struct ParsedContour {
    start: Point,
    segments: Vec<Segment>,
}

fn point(p: &ContourPoint) -> Point {
    Point::new(p.x, p.y)
}

/// Parse a closed UFO contour into segments starting at its last on-curve
/// point.
fn parse_contour(glyph_name: &str, contour: &Contour) -> Result<ParsedContour> {
    if contour.is_open() {
        return Err(Error::OpenContour { glyph: glyph_name.to_string() });
    }

    let points = &contour.points;
    let Some(last_on_curve) = points.iter().rposition(ContourPoint::on_curve) else {
        return Err(Error::UnsupportedSegment {
            glyph: glyph_name.to_string(),
            message: "contour has no on-curve points".to_string(),
        });
    };

    let start = point(&points[last_on_curve]);
    let mut segments = Vec::new();
    let mut off_curves: Vec<Point> = Vec::new();

    // Walk the cyclic point list from just after the start point.
    for i in 0..points.len() {
        let p = &points[(last_on_curve + 1 + i) % points.len()];
        match p.typ {
            PointType::OffCurve => off_curves.push(point(p)),
            PointType::Line => {
                if !off_curves.is_empty() {
                    return Err(Error::UnsupportedSegment {
                        glyph: glyph_name.to_string(),
                        message: "line preceded by off-curve points".to_string(),
                    });
                }
                segments.push(Segment::Line(point(p)));
            }
            PointType::Curve => match off_curves.len() {
                0 => segments.push(Segment::Line(point(p))),
                1 => segments.push(Segment::Quad(std::mem::take(&mut off_curves), point(p))),
                2 => {
                    let c2 = off_curves.pop().expect("two off-curves");
                    let c1 = off_curves.pop().expect("two off-curves");
                    segments.push(Segment::Cubic(c1, c2, point(p)));
                }
                n => {
                    return Err(Error::UnsupportedSegment {
                        glyph: glyph_name.to_string(),
                        message: format!("curve with {n} off-curve points"),
                    });
                }
            },
            PointType::QCurve => {
                segments.push(Segment::Quad(std::mem::take(&mut off_curves), point(p)));
            }
            PointType::Move => {
                return Err(Error::OpenContour { glyph: glyph_name.to_string() });
            }
        }
    }

    if !off_curves.is_empty() {
        return Err(Error::UnsupportedSegment {
            glyph: glyph_name.to_string(),
            message: "trailing off-curve points".to_string(),
        });
    }

    Ok(ParsedContour { start, segments })
}

fn round_point(p: Point, on_curve: bool) -> CurvePoint {
    CurvePoint::new(p.x.round() as i16, p.y.round() as i16, on_curve)
}

fn check_structure(
    glyph_name: &str,
    master_name: &str,
    reference: &ParsedContour,
    other: &ParsedContour,
    contour_idx: usize,
) -> Result<()> {
    let compatible = reference.segments.len() == other.segments.len()
        && reference
            .segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| match (a, b) {
                (Segment::Line(_), Segment::Line(_)) => true,
                (Segment::Cubic(..), Segment::Cubic(..)) => true,
                (Segment::Quad(c1, _), Segment::Quad(c2, _)) => c1.len() == c2.len(),
                _ => false,
            });

    if !compatible {
        return Err(Error::PointMismatch {
            glyph: glyph_name.to_string(),
            master: master_name.to_string(),
            message: format!("contour {contour_idx} differs in segment structure"),
        });
    }
    Ok(())
}

/// Convert a glyph's contours across all masters to TrueType point lists.
///
/// All masters must share the same contour structure; cubic segments are
/// converted jointly so every master gets identical point counts. Returns
/// per-master, per-contour point lists.
pub(crate) fn convert_contours(
    glyph_name: &str,
    master_names: &[String],
    glyphs: &[&Glyph],
    max_err: f64,
) -> Result<Vec<Vec<Vec<CurvePoint>>>> {
    let reference = glyphs[0];

    for (master_idx, glyph) in glyphs.iter().enumerate() {
        if glyph.contours.len() != reference.contours.len() {
            return Err(Error::ContourCountMismatch {
                glyph: glyph_name.to_string(),
                master: master_names[master_idx].clone(),
                expected: reference.contours.len(),
                actual: glyph.contours.len(),
            });
        }
    }

    let mut output: Vec<Vec<Vec<CurvePoint>>> = vec![Vec::new(); glyphs.len()];

    for contour_idx in 0..reference.contours.len() {
        let parsed: Vec<ParsedContour> = glyphs
            .iter()
            .map(|glyph| parse_contour(glyph_name, &glyph.contours[contour_idx]))
            .collect::<Result<_>>()?;

        for (master_idx, contour) in parsed.iter().enumerate().skip(1) {
            check_structure(
                glyph_name,
                &master_names[master_idx],
                &parsed[0],
                contour,
                contour_idx,
            )?;
        }

        let mut contours: Vec<Vec<CurvePoint>> = parsed
            .iter()
            .map(|p| vec![round_point(p.start, true)])
            .collect();

        let num_segments = parsed[0].segments.len();
        for segment_idx in 0..num_segments {
            let is_last = segment_idx == num_segments - 1;

            match &parsed[0].segments[segment_idx] {
                Segment::Line(_) => {
                    for (master_idx, contour) in parsed.iter().enumerate() {
                        let Segment::Line(end) = &contour.segments[segment_idx] else {
                            unreachable!("structure checked above");
                        };
                        if !is_last {
                            contours[master_idx].push(round_point(*end, true));
                        }
                    }
                }
                Segment::Quad(..) => {
                    for (master_idx, contour) in parsed.iter().enumerate() {
                        let Segment::Quad(controls, end) = &contour.segments[segment_idx] else {
                            unreachable!("structure checked above");
                        };
                        for control in controls {
                            contours[master_idx].push(round_point(*control, false));
                        }
                        if !is_last {
                            contours[master_idx].push(round_point(*end, true));
                        }
                    }
                }
                Segment::Cubic(..) => {
                    let cubics: Vec<CubicBez> = parsed
                        .iter()
                        .map(|contour| {
                            let prev = match segment_idx {
                                0 => contour.start,
                                i => segment_end(&contour.segments[i - 1]),
                            };
                            let Segment::Cubic(c1, c2, end) = &contour.segments[segment_idx] else {
                                unreachable!("structure checked above");
                            };
                            CubicBez::new(prev, *c1, *c2, *end)
                        })
                        .collect();

                    let quads = cubics_to_quads_jointly(&cubics, max_err);
                    for (master_idx, master_quads) in quads.iter().enumerate() {
                        push_quads(&mut contours[master_idx], master_quads, is_last);
                    }
                }
            }
        }

        for (master_idx, contour) in contours.into_iter().enumerate() {
            output[master_idx].push(contour);
        }
    }

    Ok(output)
}

fn segment_end(segment: &Segment) -> Point {
    match segment {
        Segment::Line(end) => *end,
        Segment::Cubic(_, _, end) => *end,
        Segment::Quad(_, end) => *end,
    }
}

/// Append a quad run: each quad contributes its control (off-curve) and
/// end (on-curve); the last end is the contour start and is not repeated.
fn push_quads(points: &mut Vec<CurvePoint>, quads: &[QuadBez], is_last_segment: bool) {
    for (i, quad) in quads.iter().enumerate() {
        points.push(round_point(quad.p1, false));
        if !(is_last_segment && i == quads.len() - 1) {
            points.push(round_point(quad.p2, true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Contour {
        Contour {
            points: vec![
                ContourPoint::new(0.0, 0.0, PointType::Line),
                ContourPoint::new(100.0, 0.0, PointType::Line),
                ContourPoint::new(50.0, 100.0, PointType::Line),
            ],
        }
    }

    fn curved(scale: f64) -> Contour {
        Contour {
            points: vec![
                ContourPoint::new(100.0, 0.0, PointType::Line),
                ContourPoint::new(100.0, 60.0 * scale, PointType::OffCurve),
                ContourPoint::new(0.0, 60.0 * scale, PointType::OffCurve),
                ContourPoint::new(0.0, 0.0, PointType::Curve),
            ],
        }
    }

    #[test]
    fn lines_pass_through() {
        let mut glyph = Glyph::new("tri");
        glyph.contours.push(triangle());

        let out = convert_contours("tri", &["m".to_string()], &[&glyph], 1.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);
        let points = &out[0][0];
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.on_curve));
        // Starts at the last on-curve point.
        assert_eq!((points[0].x, points[0].y), (50, 100));
    }

    #[test]
    fn masters_get_identical_point_counts() {
        let mut a = Glyph::new("c");
        a.contours.push(curved(1.0));
        let mut b = Glyph::new("c");
        b.contours.push(curved(8.0));

        let out = convert_contours(
            "c",
            &["a".to_string(), "b".to_string()],
            &[&a, &b],
            1.0,
        )
        .unwrap();
        assert_eq!(out[0][0].len(), out[1][0].len());
        // On/off pattern is identical too.
        for (p, q) in out[0][0].iter().zip(&out[1][0]) {
            assert_eq!(p.on_curve, q.on_curve);
        }
    }

    #[test]
    fn contour_count_mismatch_is_an_error() {
        let mut a = Glyph::new("x");
        a.contours.push(triangle());
        let mut b = Glyph::new("x");
        b.contours.push(triangle());
        b.contours.push(triangle());

        let err = convert_contours("x", &["a".to_string(), "b".to_string()], &[&a, &b], 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::ContourCountMismatch { .. }));
    }

    #[test]
    fn open_contour_is_an_error() {
        let mut glyph = Glyph::new("open");
        glyph.contours.push(Contour {
            points: vec![
                ContourPoint::new(0.0, 0.0, PointType::Move),
                ContourPoint::new(100.0, 0.0, PointType::Line),
            ],
        });

        let err = convert_contours("open", &["m".to_string()], &[&glyph], 1.0).unwrap_err();
        assert!(matches!(err, Error::OpenContour { .. }));
    }

    #[test]
    fn closing_point_not_duplicated() {
        let mut glyph = Glyph::new("c");
        glyph.contours.push(curved(1.0));

        let out = convert_contours("c", &["m".to_string()], &[&glyph], 1.0).unwrap();
        let points = &out[0][0];
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        // The final segment closes onto the start; the start point must not
        // appear twice.
        assert!(!(last.on_curve && last.x == first.x && last.y == first.y));
    }
}
