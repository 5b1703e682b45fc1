// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector helpers on top of `nalgebra`.
//!
//! The "quick angle" is a trig-free stand-in for the angle of a 2D direction.
//! It maps the upper half plane onto `[-1, 1]` and the lower half plane onto
//! `[-3, -1)`. Ascending values sweep clockwise, starting just below the
//! positive x-axis and ending on it.

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{GeometryError, Result};

/// Squared length below which a vector is treated as zero.
const ZERO_LENGTH_SQ: f64 = 1e-18;

/// Monotonic proxy for the angle of `v` against the positive x-axis.
///
/// Returns `None` for a zero vector.
pub fn quick_angle(v: &Vector2<f64>) -> Option<f64> {
    let len = v.norm();
    if len * len < ZERO_LENGTH_SQ {
        return None;
    }
    let x = v.x / len;
    if v.y >= 0.0 {
        Some(x)
    } else {
        Some(-x - 2.0)
    }
}

/// Returns `true` when `a` and `b` point along the same line.
///
/// Zero vectors are parallel to everything.
pub fn parallel(a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
    let la = a.norm();
    let lb = b.norm();
    if la * la < ZERO_LENGTH_SQ || lb * lb < ZERO_LENGTH_SQ {
        return true;
    }
    let cos = a.dot(b) / (la * lb);
    cos.abs() >= 1.0 - tolerance
}

/// Same as [`parallel`] for planar directions.
pub fn parallel_2d(a: &Vector2<f64>, b: &Vector2<f64>, tolerance: f64) -> bool {
    parallel(
        &Vector3::new(a.x, a.y, 0.0),
        &Vector3::new(b.x, b.y, 0.0),
        tolerance,
    )
}

/// Normalizes `v`, refusing zero vectors.
pub fn unit(v: &Vector3<f64>) -> Result<Vector3<f64>> {
    let len = v.norm();
    if len * len < ZERO_LENGTH_SQ {
        return Err(GeometryError::ZeroVector);
    }
    Ok(v / len)
}

/// Newell normal of a 3D ring. The result is normalized.
pub fn newell_normal(ring: &[Point3<f64>]) -> Result<Vector3<f64>> {
    if ring.len() < 3 {
        return Err(GeometryError::TooFewVertices(ring.len()));
    }
    let mut n = Vector3::zeros();
    for i in 0..ring.len() {
        let a = &ring[i];
        let b = &ring[(i + 1) % ring.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    unit(&n).map_err(|_| GeometryError::DegenerateNormal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quick_angle_is_monotonic() {
        // Clockwise from just below +x.
        let dirs = [
            Vector2::new(1.0, -0.5),
            Vector2::new(0.0, -1.0),
            Vector2::new(-1.0, -0.001),
            Vector2::new(-1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 0.0),
        ];
        let angles: Vec<f64> = dirs.iter().map(|d| quick_angle(d).unwrap()).collect();
        for w in angles.windows(2) {
            assert!(w[0] < w[1], "{:?}", angles);
        }
    }

    #[test]
    fn test_quick_angle_ranges() {
        assert_relative_eq!(quick_angle(&Vector2::new(3.0, 0.0)).unwrap(), 1.0);
        assert_relative_eq!(quick_angle(&Vector2::new(-2.0, 0.0)).unwrap(), -1.0);
        assert_relative_eq!(quick_angle(&Vector2::new(0.0, -4.0)).unwrap(), -2.0);
        assert!(quick_angle(&Vector2::zeros()).is_none());
    }

    #[test]
    fn test_parallel() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        assert!(parallel(&x, &Vector3::new(-5.0, 0.0, 0.0), 0.01));
        assert!(parallel(&x, &Vector3::new(1.0, 0.05, 0.0), 0.01));
        assert!(!parallel(&x, &Vector3::new(1.0, 1.0, 0.0), 0.01));
        assert!(parallel(&x, &Vector3::zeros(), 0.01));
    }

    #[test]
    fn test_newell_normal_square() {
        let ring = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(&ring).unwrap();
        assert_relative_eq!(n, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_newell_normal_collinear_fails() {
        let ring = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert_eq!(newell_normal(&ring), Err(GeometryError::DegenerateNormal));
    }
}
