// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based node lookup and merging.
//!
//! The plane is divided into square cells of side `cell_size`; a lookup scans
//! the 3x3 block of cells around the query point. This is how wall endpoints
//! closer than the merge radius collapse into one network node.

use floorgraph_geometry::Point2;
use rustc_hash::FxHashMap;

/// A spatial hash grid of 2D nodes, indexed by insertion order.
#[derive(Debug)]
pub struct NodeGrid {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point2<f64>>,
}

impl NodeGrid {
    /// `cell_size` should be >= the tolerance used for queries.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-10),
            grid: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Point2<f64> {
        self.points[index]
    }

    pub fn into_points(self) -> Vec<Point2<f64>> {
        self.points
    }

    /// Adds a node without looking for an existing one.
    pub fn insert(&mut self, p: Point2<f64>) -> usize {
        let index = self.points.len();
        self.points.push(p);
        let cell = self.cell_coords(&p);
        self.grid.entry(cell).or_default().push(index);
        index
    }

    /// First node within `tolerance` of `p`, in insertion order.
    pub fn find_near(&self, p: &Point2<f64>, tolerance: f64) -> Option<usize> {
        self.find_all_near(p, tolerance).into_iter().min()
    }

    /// All nodes within `tolerance` of `p`.
    pub fn find_all_near(&self, p: &Point2<f64>, tolerance: f64) -> Vec<usize> {
        let (cx, cy) = self.cell_coords(p);
        let reach = (tolerance / self.cell_size).ceil().max(1.0) as i64;
        let tol_sq = tolerance * tolerance;
        let mut result = Vec::new();

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(indices) = self.grid.get(&(cx + dx, cy + dy)) {
                    result.extend(
                        indices
                            .iter()
                            .copied()
                            .filter(|&i| (self.points[i] - p).norm_squared() <= tol_sq),
                    );
                }
            }
        }
        result
    }

    /// Returns an existing node within `tolerance` of `p`, or creates one.
    pub fn find_or_insert(&mut self, p: Point2<f64>, tolerance: f64) -> usize {
        match self.find_near(&p, tolerance) {
            Some(existing) => existing,
            None => self.insert(p),
        }
    }

    fn cell_coords(&self, p: &Point2<f64>) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }
}
