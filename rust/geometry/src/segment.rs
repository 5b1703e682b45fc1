// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D segment predicates.

use nalgebra::Point2;

/// Below this the cross product of two directions means "parallel".
const PARALLEL_EPSILON: f64 = 1e-12;

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < PARALLEL_EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Returns `true` when `p` lies on `a..b` within `tolerance`.
#[inline]
pub fn segment_contains(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>, tolerance: f64) -> bool {
    distance_to_segment(p, a, b) <= tolerance
}

/// Intersection point of two non-parallel segments.
///
/// Endpoints are allowed to miss by up to `tolerance`, so a segment stopping
/// just short of another still counts as touching it. Parallel or collinear
/// pairs return `None`.
pub fn segment_intersection(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
    tolerance: f64,
) -> Option<Point2<f64>> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.perp(&s);
    if denom.abs() < PARALLEL_EPSILON * r.norm().max(1.0) * s.norm().max(1.0) {
        return None;
    }
    let qp = b0 - a0;
    let t = qp.perp(&s) / denom;
    let u = qp.perp(&r) / denom;

    let ta = tolerance / r.norm();
    let tb = tolerance / s.norm();
    if t < -ta || t > 1.0 + ta || u < -tb || u > 1.0 + tb {
        return None;
    }
    Some(a0 + r * t)
}

/// Returns `true` when the open interiors of `a0..a1` and `b0..b1` cross.
///
/// Touching at endpoints does not count.
pub fn segments_cross(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
    tolerance: f64,
) -> bool {
    match segment_intersection(a0, a1, b0, b1, 0.0) {
        Some(p) => {
            (p - a0).norm() > tolerance
                && (p - a1).norm() > tolerance
                && (p - b0).norm() > tolerance
                && (p - b1).norm() > tolerance
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_crossing_segments() {
        let p = segment_intersection(
            &Point2::new(0.0, 0.0),
            &Point2::new(4.0, 0.0),
            &Point2::new(1.0, -1.0),
            &Point2::new(1.0, 2.0),
            0.0,
        )
        .unwrap();
        assert_relative_eq!(p, Point2::new(1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_short_segment_counts_with_tolerance() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(4.0, 0.0);
        let b0 = Point2::new(2.0, 0.03);
        let b1 = Point2::new(2.0, 3.0);
        assert!(segment_intersection(&a0, &a1, &b0, &b1, 0.0).is_none());
        let p = segment_intersection(&a0, &a1, &b0, &b1, 0.05).unwrap();
        assert_relative_eq!(p, Point2::new(2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(segment_intersection(
            &Point2::new(0.0, 0.0),
            &Point2::new(4.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(4.0, 1.0),
            0.1,
        )
        .is_none());
    }

    #[test]
    fn test_segments_cross_ignores_shared_endpoint() {
        let o = Point2::new(0.0, 0.0);
        assert!(!segments_cross(&o, &Point2::new(1.0, 0.0), &o, &Point2::new(0.0, 1.0), 1e-9));
        assert!(segments_cross(
            &Point2::new(-1.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, -1.0),
            &Point2::new(0.0, 1.0),
            1e-9
        ));
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(1.0, 1.0), &a, &b), 1.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(3.0, 0.0), &a, &b), 1.0);
        assert!(segment_contains(&a, &b, &Point2::new(1.0, 0.01), 0.05));
    }
}
