// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::{Point2, Precision};
use tracing::{debug, warn};

use super::{collinear_groups, rehome_glazings, UnionFind};
use crate::arena::ModelRepository;
use crate::element::FaceCategory;
use crate::error::{Result, TopologyError};
use crate::keys::ElementKey;

/// Replaces groups of overlapping collinear walls by a clean partition.
///
/// Overlap is transitive: walls chained through pairwise overlaps form one
/// group. The group's endpoints, sorted along the line, delimit the new
/// walls, which span from the lowest bottom to the highest top of the group.
/// Returns the number of walls replaced.
pub fn resolve_overlaps(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let mut replaced = 0;
    for line in collinear_groups(repo, level, precision) {
        if line.len() < 2 {
            continue;
        }
        let segments: Option<Vec<(Point2<f64>, Point2<f64>)>> =
            line.iter().map(|&k| repo.wall(k).and_then(|w| w.segment())).collect();
        let Some(segments) = segments else { continue };

        let mut sets = UnionFind::new(line.len());
        for i in 0..line.len() {
            for j in i + 1..line.len() {
                if overlaps(segments[i], segments[j], precision.point) {
                    sets.union(i, j);
                }
            }
        }

        for group in sets.groups() {
            let members: Vec<ElementKey> = group.iter().map(|&i| line[i]).collect();
            match partition(repo, &members, precision) {
                Ok(pieces) => {
                    debug!(level, members = members.len(), pieces, "overlapping walls re-partitioned");
                    replaced += members.len();
                }
                Err(e) => warn!(level, error = %e, "overlapping walls kept"),
            }
        }
    }
    replaced
}

/// Two collinear footprints overlap when, with all four endpoints sorted
/// along the line, the first two belong to different walls and the middle
/// two are apart.
fn overlaps(a: (Point2<f64>, Point2<f64>), b: (Point2<f64>, Point2<f64>), tolerance: f64) -> bool {
    let mut ends = [(a.0, 0u8), (a.1, 0), (b.0, 1), (b.1, 1)];
    ends.sort_by(|p, q| lexicographic(&p.0, &q.0));
    ends[0].1 != ends[1].1 && (ends[1].0 - ends[2].0).norm() > tolerance
}

fn lexicographic(a: &Point2<f64>, b: &Point2<f64>) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Replaces `members` by one wall per stretch between consecutive
/// endpoints. Returns the number of walls created.
fn partition(repo: &mut ModelRepository, members: &[ElementKey], precision: &Precision) -> Result<usize> {
    let first = *members.first().ok_or(TopologyError::DegenerateBoundary(0))?;
    let reference = repo.wall(first).ok_or(TopologyError::ElementNotFound(first))?;
    let normal = reference.normal;
    let mut category = reference.category;

    let mut ends: Vec<Point2<f64>> = Vec::with_capacity(members.len() * 2);
    let mut bottom = f64::INFINITY;
    let mut top = f64::NEG_INFINITY;
    let mut glazings: Vec<ElementKey> = Vec::new();
    for &key in members {
        let wall = repo.wall(key).ok_or(TopologyError::ElementNotFound(key))?;
        let (a, b) = wall.segment().ok_or(TopologyError::ElementNotFound(key))?;
        ends.extend([a, b]);
        bottom = bottom.min(wall.bottom);
        top = top.max(wall.top);
        glazings.extend(wall.apertures.iter().copied());
        if wall.category == FaceCategory::Opaque {
            category = FaceCategory::Opaque;
        }
    }

    ends.sort_by(lexicographic);
    ends.dedup_by(|a, b| (*a - *b).norm() <= precision.point);

    let mut created = Vec::with_capacity(ends.len());
    for pair in ends.windows(2) {
        if (pair[1] - pair[0]).norm() <= precision.point {
            continue;
        }
        match repo.wall_from_segment(pair[0], pair[1], bottom, top, normal, category, precision) {
            Ok(key) => created.push(key),
            Err(e) => {
                for key in created {
                    repo.remove_element(key);
                }
                return Err(e);
            }
        }
    }
    if created.is_empty() {
        return Err(TopologyError::DegenerateBoundary(0));
    }

    for &key in members {
        repo.remove_element(key);
    }
    rehome_glazings(repo, &glazings, &created, precision);
    Ok(created.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanse::tests::{add_glazing, add_wall, repo};
    use approx::assert_relative_eq;

    fn seg(a: (f64, f64), b: (f64, f64)) -> (Point2<f64>, Point2<f64>) {
        (Point2::new(a.0, a.1), Point2::new(b.0, b.1))
    }

    #[test]
    fn test_overlap_predicate() {
        let tol = 0.05;
        assert!(overlaps(seg((0.0, 0.0), (4.0, 0.0)), seg((2.0, 0.0), (6.0, 0.0)), tol));
        assert!(overlaps(seg((6.0, 0.0), (2.0, 0.0)), seg((0.0, 0.0), (4.0, 0.0)), tol));
        // Containment, sharing a start point.
        assert!(overlaps(seg((0.0, 0.0), (10.0, 0.0)), seg((0.0, 0.0), (4.0, 0.0)), tol));
        // End to end.
        assert!(!overlaps(seg((0.0, 0.0), (4.0, 0.0)), seg((4.0, 0.0), (8.0, 0.0)), tol));
        assert!(!overlaps(seg((0.0, 0.0), (4.0, 0.0)), seg((5.0, 0.0), (8.0, 0.0)), tol));
    }

    #[test]
    fn test_overlapping_walls_partitioned() {
        let mut repo = repo();
        let p = Precision::default();
        let a = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let b = add_wall(&mut repo, (2.0, 0.0), (6.0, 0.0));
        let glazing = add_glazing(&mut repo, (0.5, 0.0), (1.5, 0.0));
        repo.wall_mut(a).unwrap().apertures.push(glazing);

        assert_eq!(resolve_overlaps(&mut repo, 0, &p), 2);
        assert!(repo.wall(a).is_none() && repo.wall(b).is_none());

        let walls = repo.wall_keys(0);
        assert_eq!(walls.len(), 3);
        let total: f64 = walls.iter().map(|&k| repo.wall(k).unwrap().length()).sum();
        assert_relative_eq!(total, 6.0, epsilon = 1e-9);

        let host = walls
            .iter()
            .find(|&&k| repo.wall(k).unwrap().apertures.contains(&glazing))
            .unwrap();
        let (s, e) = repo.wall(*host).unwrap().segment().unwrap();
        assert_relative_eq!((s.x + e.x) / 2.0, 1.0, epsilon = 1e-9);

        assert_eq!(resolve_overlaps(&mut repo, 0, &p), 0);
    }
}
