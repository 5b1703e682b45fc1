// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane-local coordinate frames.
//!
//! A [`Projection`] maps world points onto `(u, v, w)` coordinates where `w`
//! is the signed distance from the plane. Planar polygons are pushed through
//! 2D algorithms in UV space and mapped back with [`Projection::to_world`].
//!
//! For a vertical plane the default frame keeps `v` aligned with world up,
//! so `v` differences are elevation differences.

use nalgebra::{Matrix3, Point2, Point3, Vector3};

use crate::error::Result;
use crate::vector::{newell_normal, parallel, unit};

/// Orthonormal frame attached to a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub origin: Point3<f64>,
    pub axis_x: Vector3<f64>,
    pub axis_y: Vector3<f64>,
    pub axis_z: Vector3<f64>,
    /// Rows are the three axes; maps world offsets to local coordinates.
    rotation: Matrix3<f64>,
}

impl Projection {
    /// Builds a frame on the plane through `origin` with the given normal.
    ///
    /// `preferred_x` is projected into the plane and used as the u-axis when
    /// it is not parallel to the normal.
    pub fn new(
        origin: Point3<f64>,
        normal: &Vector3<f64>,
        preferred_x: Option<&Vector3<f64>>,
    ) -> Result<Self> {
        let axis_z = unit(normal)?;
        let axis_x = preferred_x
            .map(|x| x - axis_z * x.dot(&axis_z))
            .and_then(|x| unit(&x).ok())
            .map_or_else(|| default_axis_x(&axis_z), Ok)?;
        let axis_y = axis_z.cross(&axis_x);
        let rotation = Matrix3::from_rows(&[
            axis_x.transpose(),
            axis_y.transpose(),
            axis_z.transpose(),
        ]);
        Ok(Self {
            origin,
            axis_x,
            axis_y,
            axis_z,
            rotation,
        })
    }

    /// Frame for a planar ring: Newell normal, first vertex as origin and
    /// the dominant edge direction as u-axis.
    pub fn from_polygon(ring: &[Point3<f64>], angle_tolerance: f64) -> Result<Self> {
        let normal = newell_normal(ring)?;
        let basis = find_orthogonal_basis(ring, &normal, angle_tolerance);
        Self::new(ring[0], &normal, basis.as_ref())
    }

    /// World point to `(u, v, w)`.
    pub fn to_uv(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * (p - self.origin))
    }

    /// `(u, v, w)` back to world coordinates.
    pub fn to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        self.origin + self.rotation.transpose() * p.coords
    }

    /// Drops the off-plane component of every projected vertex.
    pub fn ring_to_uv(&self, ring: &[Point3<f64>]) -> Vec<Point2<f64>> {
        ring.iter()
            .map(|p| {
                let q = self.to_uv(p);
                Point2::new(q.x, q.y)
            })
            .collect()
    }

    /// Lifts a UV ring back onto the plane.
    pub fn ring_to_world(&self, ring: &[Point2<f64>]) -> Vec<Point3<f64>> {
        ring.iter()
            .map(|p| self.to_world(&Point3::new(p.x, p.y, 0.0)))
            .collect()
    }
}

fn default_axis_x(axis_z: &Vector3<f64>) -> Result<Vector3<f64>> {
    let up = Vector3::z();
    if axis_z.z.abs() < 1.0 - 1e-9 {
        unit(&up.cross(axis_z))
    } else {
        Ok(Vector3::x())
    }
}

/// Majority vote over edge directions of `ring`.
///
/// Each in-plane edge direction scores the number of edges parallel or
/// perpendicular to it; the best scoring direction wins. Returns `None` when
/// the ring has no usable edge.
pub fn find_orthogonal_basis(
    ring: &[Point3<f64>],
    normal: &Vector3<f64>,
    angle_tolerance: f64,
) -> Option<Vector3<f64>> {
    let n = ring.len();
    let directions: Vec<Vector3<f64>> = (0..n)
        .filter_map(|i| {
            let d = ring[(i + 1) % n] - ring[i];
            let in_plane = d - normal * d.dot(normal);
            unit(&in_plane).ok()
        })
        .collect();

    let mut best: Option<(usize, Vector3<f64>)> = None;
    for d in &directions {
        let score = directions
            .iter()
            .filter(|o| parallel(d, o, angle_tolerance) || d.dot(o).abs() < angle_tolerance)
            .count();
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, *d));
        }
    }
    best.map(|(_, d)| d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tilted_quad() -> Vec<Point3<f64>> {
        vec![
            Point3::new(1.0, 2.0, 0.5),
            Point3::new(4.0, 2.0, 0.5),
            Point3::new(4.0, 4.0, 2.5),
            Point3::new(1.0, 4.0, 2.5),
        ]
    }

    #[test]
    fn test_round_trip_tilted_polygon() {
        let ring = tilted_quad();
        let proj = Projection::from_polygon(&ring, 0.01).unwrap();
        for p in &ring {
            let back = proj.to_world(&proj.to_uv(p));
            assert_relative_eq!(back, *p, epsilon = 1e-9);
        }
        for p in &ring {
            assert_relative_eq!(proj.to_uv(p).z, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ring_round_trip_through_2d() {
        let ring = tilted_quad();
        let proj = Projection::from_polygon(&ring, 0.01).unwrap();
        let uv = proj.ring_to_uv(&ring);
        let world = proj.ring_to_world(&uv);
        for (a, b) in ring.iter().zip(world.iter()) {
            assert!((a - b).norm() < 0.05);
        }
    }

    #[test]
    fn test_vertical_plane_keeps_elevation_in_v() {
        let proj = Projection::new(
            Point3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.0, -1.0, 0.0),
            None,
        )
        .unwrap();
        let uv = proj.to_uv(&Point3::new(2.0, 0.0, 3.5));
        assert_relative_eq!(uv.y, 2.5, epsilon = 1e-12);
        assert_relative_eq!(uv.x.abs(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_horizontal_plane_defaults_to_world_x() {
        let proj = Projection::new(Point3::origin(), &Vector3::z(), None).unwrap();
        assert_relative_eq!(proj.axis_x, Vector3::x());
        assert_relative_eq!(proj.axis_y, Vector3::y());
    }

    #[test]
    fn test_preferred_axis_follows_dominant_edges() {
        // Rotated rectangle with one short chamfer edge.
        let c = (30.0_f64).to_radians().cos();
        let s = (30.0_f64).to_radians().sin();
        let rot = |x: f64, y: f64| Point3::new(x * c - y * s, x * s + y * c, 0.0);
        let ring = vec![rot(0.0, 0.0), rot(4.0, 0.0), rot(4.0, 2.5), rot(3.5, 3.0), rot(0.0, 3.0)];
        let basis = find_orthogonal_basis(&ring, &Vector3::z(), 0.01).unwrap();
        let expected = Vector3::new(c, s, 0.0);
        assert!(parallel(&basis, &expected, 0.01) || basis.dot(&expected).abs() < 0.01);
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert!(Projection::new(Point3::origin(), &Vector3::zeros(), None).is_err());
    }
}
