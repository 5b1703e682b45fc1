// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate snapping applied to freshly loaded geometry.
//!
//! Near-identical coordinates coming from different faces (0.999 vs 1.001)
//! would otherwise survive as distinct network nodes.

use nalgebra::Point3;

use crate::precision::Precision;

/// Keeps values exactly one grid step apart from collapsing on a re-run.
const SNAP_EPSILON: f64 = 1e-9;

/// Collapses near-equal coordinates across all `rings`, axis by axis, then
/// quantizes every coordinate to the precision grid.
///
/// Per axis, all coordinate values are sorted and each value closer than
/// `precision.point` to its predecessor takes the predecessor's value, so
/// chains of close values collapse onto the smallest one.
pub fn round_polygons(rings: &mut [Vec<Point3<f64>>], precision: &Precision) {
    let mut slots: Vec<(usize, usize)> = Vec::new();
    for (r, ring) in rings.iter().enumerate() {
        for v in 0..ring.len() {
            slots.push((r, v));
        }
    }
    if slots.is_empty() {
        return;
    }

    for axis in 0..3 {
        let mut values: Vec<(f64, usize)> = slots
            .iter()
            .enumerate()
            .map(|(i, &(r, v))| (rings[r][v][axis], i))
            .collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        for i in 1..values.len() {
            if (values[i].0 - values[i - 1].0).abs() < precision.point - SNAP_EPSILON {
                values[i].0 = values[i - 1].0;
            }
        }
        for (value, i) in values {
            let (r, v) = slots[i];
            rings[r][v][axis] = precision.snap(value);
        }
    }
}
