// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon measures and containment predicates.
//!
//! Contours are open rings (the closing vertex is not repeated) of
//! `Point2<f64>`. A [`Region`] is an outer contour with optional holes.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{GeometryError, Result};
use crate::segment::{distance_to_segment, segments_cross};

/// A polygon with holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Region {
    pub fn new(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self { outer, holes }
    }

    pub fn simple(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Net area: outer area minus hole areas.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| area(h)).sum();
        (area(&self.outer) - holes).max(0.0)
    }

    /// Point inside the outer contour and outside every hole.
    pub fn contains_point(&self, p: &Point2<f64>) -> bool {
        point_in_contour(p, &self.outer) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }
}

/// Drops a repeated closing vertex, if any.
pub fn open_ring(ring: &[Point2<f64>]) -> &[Point2<f64>] {
    match (ring.first(), ring.last()) {
        (Some(a), Some(b)) if ring.len() > 1 && a == b => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Signed shoelace area. Positive means counter-clockwise.
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let n = contour.len();
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += contour[i].x * contour[j].y - contour[j].x * contour[i].y;
    }
    sum * 0.5
}

#[inline]
pub fn area(contour: &[Point2<f64>]) -> f64 {
    signed_area(contour).abs()
}

#[inline]
pub fn is_ccw(contour: &[Point2<f64>]) -> bool {
    signed_area(contour) > 0.0
}

/// Area of a planar 3D ring: half the length of its Newell vector.
pub fn area_3d(ring: &[Point3<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let n = ring.len();
    let mut sum = Vector3::zeros();
    for i in 0..n {
        sum += ring[i].coords.cross(&ring[(i + 1) % n].coords);
    }
    sum.norm() * 0.5
}

/// Area-weighted centroid; falls back to the vertex mean for zero area.
pub fn centroid(contour: &[Point2<f64>]) -> Option<Point2<f64>> {
    if contour.is_empty() {
        return None;
    }
    let a = signed_area(contour);
    let n = contour.len();
    if a.abs() < 1e-12 {
        let sum = contour.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        return Some(Point2::from(sum / n as f64));
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let p = &contour[i];
        let q = &contour[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Point2::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Ray-casting point-in-polygon test. Boundary points are undefined.
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = contour.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from `p` to the nearest edge of `contour`.
pub fn distance_to_boundary(p: &Point2<f64>, contour: &[Point2<f64>]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| distance_to_segment(p, &contour[i], &contour[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Inside the contour and farther than `tolerance` from its boundary.
pub fn point_strictly_inside(p: &Point2<f64>, contour: &[Point2<f64>], tolerance: f64) -> bool {
    point_in_contour(p, contour) && distance_to_boundary(p, contour) > tolerance
}

/// Inside the contour or within `tolerance` of its boundary.
pub fn point_inside_or_on(p: &Point2<f64>, contour: &[Point2<f64>], tolerance: f64) -> bool {
    point_in_contour(p, contour) || distance_to_boundary(p, contour) <= tolerance
}

fn any_edges_cross(a: &[Point2<f64>], b: &[Point2<f64>], tolerance: f64) -> bool {
    let (na, nb) = (a.len(), b.len());
    (0..na).any(|i| {
        (0..nb).any(|j| {
            segments_cross(&a[i], &a[(i + 1) % na], &b[j], &b[(j + 1) % nb], tolerance)
        })
    })
}

/// `inner` lies in the interior of `outer` without touching its boundary.
pub fn contains_properly(outer: &[Point2<f64>], inner: &[Point2<f64>], tolerance: f64) -> bool {
    if outer.len() < 3 || inner.len() < 3 {
        return false;
    }
    inner.iter().all(|p| point_strictly_inside(p, outer, tolerance))
        && !any_edges_cross(outer, inner, tolerance)
}

/// `inner` lies inside `outer`, boundary contact allowed.
pub fn contains(outer: &[Point2<f64>], inner: &[Point2<f64>], tolerance: f64) -> bool {
    if outer.len() < 3 || inner.len() < 3 {
        return false;
    }
    let n = inner.len();
    inner.iter().all(|p| point_inside_or_on(p, outer, tolerance))
        && (0..n).all(|i| {
            let mid = Point2::from((inner[i].coords + inner[(i + 1) % n].coords) * 0.5);
            point_inside_or_on(&mid, outer, tolerance)
        })
        && !any_edges_cross(outer, inner, tolerance)
}

/// Checks that a contour is usable as a polygon: enough vertices, no
/// zero-length edge and no crossing between non-adjacent edges.
pub fn validate_contour(contour: &[Point2<f64>], tolerance: f64) -> Result<()> {
    let n = contour.len();
    if n < 3 {
        return Err(GeometryError::TooFewVertices(n));
    }
    for i in 0..n {
        if (contour[(i + 1) % n] - contour[i]).norm() < tolerance {
            return Err(GeometryError::ZeroLengthEdge(i));
        }
    }
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_cross(
                &contour[i],
                &contour[(i + 1) % n],
                &contour[j],
                &contour[(j + 1) % n],
                tolerance,
            ) {
                return Err(GeometryError::SelfIntersecting);
            }
        }
    }
    Ok(())
}

/// Axis-aligned bounding box.
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = contour.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in contour.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}
