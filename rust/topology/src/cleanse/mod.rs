// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-level cleansing passes.
//!
//! Walls come out of classification with duplicates, slivers, overlaps and
//! T-junctions that never produced a vertex. The passes below repair that,
//! in a fixed order where each one relies on the previous:
//!
//! 1. invalid horizontal faces are dropped
//! 2. duplicate walls are dissolved
//! 3. degenerate walls are absorbed by a neighbour or dropped
//! 4. overlapping collinear walls are re-partitioned
//! 5. coplanar walls sharing a free edge are merged
//! 6. walls are broken where other walls cross or end on them
//!
//! Every pass skips elements it cannot repair and logs a warning instead of
//! failing the level.

mod coplanar;
mod duplicate;
mod faces;
mod intersection;
mod invalid;
mod overlap;

pub use coplanar::merge_coplanar_walls;
pub use duplicate::remove_duplicate_walls;
pub use faces::remove_invalid_faces;
pub use intersection::break_intersections;
pub use invalid::remove_invalid_walls;
pub use overlap::resolve_overlaps;

use std::time::Instant;

use floorgraph_geometry::segment::{distance_to_segment, segment_contains};
use floorgraph_geometry::vector::parallel;
use floorgraph_geometry::{Point2, Precision};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arena::ModelRepository;
use crate::element::Element;
use crate::keys::ElementKey;

/// Which passes [`cleanse_level`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanseOptions {
    pub invalid_faces: bool,
    pub duplicates: bool,
    pub invalid_walls: bool,
    pub overlaps: bool,
    pub coplanar: bool,
    pub intersections: bool,
}

impl Default for CleanseOptions {
    fn default() -> Self {
        Self {
            invalid_faces: true,
            duplicates: true,
            invalid_walls: true,
            overlaps: true,
            coplanar: true,
            intersections: true,
        }
    }
}

/// Number of elements each pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanseReport {
    pub invalid_faces: usize,
    pub duplicates: usize,
    pub invalid_walls: usize,
    pub overlaps: usize,
    pub coplanar: usize,
    pub intersections: usize,
}

impl CleanseReport {
    pub fn total(&self) -> usize {
        self.invalid_faces
            + self.duplicates
            + self.invalid_walls
            + self.overlaps
            + self.coplanar
            + self.intersections
    }

    /// Adds the counts of another report.
    pub fn merge(&mut self, other: &CleanseReport) {
        self.invalid_faces += other.invalid_faces;
        self.duplicates += other.duplicates;
        self.invalid_walls += other.invalid_walls;
        self.overlaps += other.overlaps;
        self.coplanar += other.coplanar;
        self.intersections += other.intersections;
    }
}

/// Runs the enabled passes on the walls and faces of `level`.
pub fn cleanse_level(
    repo: &mut ModelRepository,
    level: usize,
    options: &CleanseOptions,
    precision: &Precision,
) -> CleanseReport {
    let started = Instant::now();
    let mut report = CleanseReport::default();

    if options.invalid_faces {
        report.invalid_faces = remove_invalid_faces(repo, level, precision);
    }
    if options.duplicates {
        report.duplicates = remove_duplicate_walls(repo, level, precision);
    }
    if options.invalid_walls {
        report.invalid_walls = remove_invalid_walls(repo, level, precision);
    }
    if options.overlaps {
        report.overlaps = resolve_overlaps(repo, level, precision);
    }
    if options.coplanar {
        report.coplanar = merge_coplanar_walls(repo, level, precision);
    }
    if options.intersections {
        report.intersections = break_intersections(repo, level, precision);
    }

    debug!(
        level,
        invalid_faces = report.invalid_faces,
        duplicates = report.duplicates,
        invalid_walls = report.invalid_walls,
        overlaps = report.overlaps,
        coplanar = report.coplanar,
        intersections = report.intersections,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "level cleansed"
    );
    report
}

/// Disjoint-set forest over `0..n` with path halving.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index stays root so groups keep arena order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Groups with more than one member, each in ascending order.
    pub(crate) fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            let r = self.find(i);
            by_root[r].push(i);
        }
        by_root.into_iter().filter(|g| g.len() > 1).collect()
    }
}

/// Walls of `level` split into sets lying on one line.
///
/// Walls are first grouped by parallel normals, then by the perpendicular
/// offset of their first footprint point from the group's minimum corner.
/// Offsets closer than the point tolerance share a line. Each set keeps
/// arena order; walls without a segment footprint are left out.
pub(crate) fn collinear_groups(
    repo: &ModelRepository,
    level: usize,
    precision: &Precision,
) -> Vec<Vec<ElementKey>> {
    let walls: Vec<(ElementKey, Point2<f64>, Point2<f64>)> = repo
        .wall_keys(level)
        .into_iter()
        .filter_map(|k| {
            let (a, b) = repo.wall(k)?.segment()?;
            Some((k, a, b))
        })
        .collect();

    // Parallel groups, by index into `walls`.
    let mut parallel_groups: Vec<Vec<usize>> = Vec::new();
    for (i, &(key, _, _)) in walls.iter().enumerate() {
        let Some(normal) = repo.wall(key).map(|w| w.normal) else { continue };
        let slot = parallel_groups.iter().position(|g| {
            repo.wall(walls[g[0]].0)
                .is_some_and(|w| parallel(&w.normal, &normal, precision.angle_tolerance))
        });
        match slot {
            Some(g) => parallel_groups[g].push(i),
            None => parallel_groups.push(vec![i]),
        }
    }

    let mut out = Vec::new();
    for group in parallel_groups {
        let Some(reference) = repo.wall(walls[group[0]].0) else { continue };
        let n2 = floorgraph_geometry::Vector2::new(reference.normal.x, reference.normal.y);
        if n2.norm() < 1e-9 {
            continue;
        }
        let n2 = n2.normalize();

        let mut corner = Point2::new(f64::INFINITY, f64::INFINITY);
        for &i in &group {
            for p in [walls[i].1, walls[i].2] {
                corner.x = corner.x.min(p.x);
                corner.y = corner.y.min(p.y);
            }
        }

        let mut offsets: Vec<(f64, usize)> = group
            .iter()
            .map(|&i| ((walls[i].1 - corner).dot(&n2), i))
            .collect();
        offsets.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut current: Vec<usize> = Vec::new();
        let mut last = f64::NEG_INFINITY;
        for (offset, i) in offsets {
            if !current.is_empty() && offset - last > precision.point {
                out.push(finish_line(&mut current, &walls));
            }
            current.push(i);
            last = offset;
        }
        if !current.is_empty() {
            out.push(finish_line(&mut current, &walls));
        }
    }
    out
}

fn finish_line(
    current: &mut Vec<usize>,
    walls: &[(ElementKey, Point2<f64>, Point2<f64>)],
) -> Vec<ElementKey> {
    current.sort_unstable();
    current.drain(..).map(|i| walls[i].0).collect()
}

/// Re-hosts glazings on whichever of `hosts` covers them, falling back to
/// the host whose footprint passes nearest to the glazing midpoint.
pub(crate) fn rehome_glazings(
    repo: &mut ModelRepository,
    glazings: &[ElementKey],
    hosts: &[ElementKey],
    precision: &Precision,
) {
    if hosts.is_empty() {
        return;
    }
    let tolerance = precision.equality_radius();
    for &glazing in glazings {
        let Some((ga, gb)) = repo.element(glazing).and_then(Element::as_wall).and_then(|g| g.segment())
        else {
            continue;
        };
        let mid = Point2::from((ga.coords + gb.coords) * 0.5);

        let covering = hosts.iter().copied().find(|&h| {
            repo.wall(h)
                .and_then(|w| w.segment())
                .is_some_and(|(a, b)| {
                    segment_contains(&a, &b, &ga, tolerance) && segment_contains(&a, &b, &gb, tolerance)
                })
        });
        let host = covering.or_else(|| {
            hosts
                .iter()
                .copied()
                .filter_map(|h| {
                    let (a, b) = repo.wall(h)?.segment()?;
                    Some((distance_to_segment(&mid, &a, &b), h))
                })
                .min_by(|x, y| x.0.total_cmp(&y.0))
                .map(|(_, h)| h)
        });

        if let Some(wall) = host.and_then(|h| repo.wall_mut(h)) {
            if !wall.apertures.contains(&glazing) {
                wall.apertures.push(glazing);
            }
        }
    }
}
