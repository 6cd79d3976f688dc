//! Cubic-to-quadratic conversion.
//!
//! TrueType outlines are quadratic; UFO drawings are cubic. Each cubic
//! segment is split into n equal subsegments, each approximated by a
//! single quadratic whose control point sits at the intersection of the
//! subsegment's end tangents. n grows until the sampled deviation is
//! within tolerance.
//!
//! For interpolatable output the same segment across all masters must
//! produce the same number of quadratics, so the joint conversion picks
//! the smallest n that satisfies every master.

use kurbo::{CubicBez, ParamCurve, Point, QuadBez};

/// Upper bound on quadratics per cubic segment. Reached only for extreme
/// tolerance values; the last candidate is used regardless of error.
const MAX_SEGMENTS: usize = 8;

/// Samples per quadratic for the deviation estimate.
const ERROR_SAMPLES: usize = 7;

/// The quadratic control point for a cubic segment: the intersection of
/// the end tangents, or the least-squares control when the tangents are
/// parallel or point away from each other.
fn approx_control(c: &CubicBez) -> Point {
    let d0 = c.p1 - c.p0;
    let d1 = c.p2 - c.p3;
    let cross = d0.cross(d1);

    if cross.abs() > 1e-12 {
        let t = (c.p3 - c.p0).cross(d1) / cross;
        if t > 0.0 {
            return c.p0 + d0 * t;
        }
    }

    Point::new(
        (3.0 * (c.p1.x + c.p2.x) - (c.p0.x + c.p3.x)) / 4.0,
        (3.0 * (c.p1.y + c.p2.y) - (c.p0.y + c.p3.y)) / 4.0,
    )
}

fn split(c: &CubicBez, n: usize) -> Vec<CubicBez> {
    (0..n)
        .map(|i| c.subsegment(i as f64 / n as f64..(i + 1) as f64 / n as f64))
        .collect()
}

fn approx_with_n(c: &CubicBez, n: usize) -> Vec<QuadBez> {
    split(c, n)
        .iter()
        .map(|seg| QuadBez::new(seg.p0, approx_control(seg), seg.p3))
        .collect()
}

/// Maximum sampled deviation between a cubic and its n-quad approximation.
fn approx_error(c: &CubicBez, n: usize) -> f64 {
    split(c, n)
        .iter()
        .zip(approx_with_n(c, n))
        .map(|(seg, quad)| {
            (1..=ERROR_SAMPLES)
                .map(|i| {
                    let t = i as f64 / (ERROR_SAMPLES + 1) as f64;
                    seg.eval(t).distance(quad.eval(t))
                })
                .fold(0.0, f64::max)
        })
        .fold(0.0, f64::max)
}

/// Convert one cubic to quadratics within `max_err` font units.
pub fn cubic_to_quads(c: &CubicBez, max_err: f64) -> Vec<QuadBez> {
    for n in 1..MAX_SEGMENTS {
        if approx_error(c, n) <= max_err {
            return approx_with_n(c, n);
        }
    }
    approx_with_n(c, MAX_SEGMENTS)
}

/// Convert the same cubic segment across all masters, using one shared
/// segment count so the outputs stay point-compatible.
pub fn cubics_to_quads_jointly(cubics: &[CubicBez], max_err: f64) -> Vec<Vec<QuadBez>> {
    let mut n = MAX_SEGMENTS;
    for candidate in 1..MAX_SEGMENTS {
        if cubics.iter().all(|c| approx_error(c, candidate) <= max_err) {
            n = candidate;
            break;
        }
    }
    cubics.iter().map(|c| approx_with_n(c, n)).collect()
}
