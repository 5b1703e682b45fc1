// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance settings shared by every stage of the reconstruction.
//!
//! All comparisons in the workspace go through a [`Precision`] value passed
//! by reference, so a run can be reconfigured without touching globals.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Tolerances used for geometric comparisons and topology search limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precision {
    /// Two points closer than this are the same location (metres).
    pub point: f64,
    /// Area differences below this are ignored (square metres).
    pub area: f64,
    /// Parallelism tolerance applied to `|cos θ|`.
    pub angle_tolerance: f64,
    /// A face is horizontal when `|n·z|` is at least this value.
    pub horizontal_threshold: f64,
    /// Faces within this vertical distance of a level belong to it.
    pub level_max_offset: f64,
    /// Levels carrying less horizontal area than this are merged downwards.
    pub level_min_area: f64,
    /// Walls lower than this never become network edges.
    pub min_wall_height: f64,
    /// Depth limit of the path search used by the subdivider.
    pub path_max_depth: usize,
    /// Step limit of the outer boundary walk.
    pub walk_iteration_cap: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            point: 0.05,
            area: 1.0,
            angle_tolerance: 0.01,
            horizontal_threshold: (30.0_f64).to_radians().cos(),
            level_max_offset: 1.2,
            level_min_area: 5.0,
            min_wall_height: 0.9,
            path_max_depth: 50,
            walk_iteration_cap: 10_000,
        }
    }
}

impl Precision {
    /// Radius used when fusing network endpoints.
    #[inline]
    pub fn merge_radius(&self) -> f64 {
        1.1 * self.point
    }

    /// Radius used when comparing wall footprints for equality.
    #[inline]
    pub fn equality_radius(&self) -> f64 {
        1.2 * self.point
    }

    /// Snaps a scalar to the nearest multiple of the point tolerance.
    #[inline]
    pub fn snap(&self, value: f64) -> f64 {
        (value / self.point).round() * self.point
    }

    /// Integer grid cell of a scalar, used for hashing quantized coordinates.
    #[inline]
    pub fn grid_index(&self, value: f64) -> i64 {
        (value / self.point).round() as i64
    }

    pub fn snap_point2(&self, p: &Point2<f64>) -> Point2<f64> {
        Point2::new(self.snap(p.x), self.snap(p.y))
    }

    pub fn grid_key3(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            self.grid_index(p.x),
            self.grid_index(p.y),
            self.grid_index(p.z),
        )
    }

    #[inline]
    pub fn same_point2(&self, a: &Point2<f64>, b: &Point2<f64>) -> bool {
        (a - b).norm() < self.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_constants() {
        let p = Precision::default();
        assert_relative_eq!(p.point, 0.05);
        assert_relative_eq!(p.merge_radius(), 0.055, epsilon = 1e-12);
        assert_relative_eq!(p.equality_radius(), 0.06, epsilon = 1e-12);
        assert_relative_eq!(p.horizontal_threshold, 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_snap_to_grid() {
        let p = Precision::default();
        assert_relative_eq!(p.snap(1.02), 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.snap(1.03), 1.05, epsilon = 1e-9);
        assert_relative_eq!(p.snap(-0.26), -0.25, epsilon = 1e-9);
        assert_eq!(p.grid_index(0.3), 6);
    }

    #[test]
    fn test_same_point2() {
        let p = Precision::default();
        assert!(p.same_point2(&Point2::new(0.0, 0.0), &Point2::new(0.03, 0.0)));
        assert!(!p.same_point2(&Point2::new(0.0, 0.0), &Point2::new(0.06, 0.0)));
    }
}
