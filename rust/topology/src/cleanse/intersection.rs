// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::segment::segment_intersection;
use floorgraph_geometry::vector::parallel;
use floorgraph_geometry::{Point2, Precision, Vector3};
use tracing::{debug, warn};

use super::rehome_glazings;
use crate::arena::ModelRepository;
use crate::error::{Result, TopologyError};
use crate::keys::ElementKey;

/// Breaks walls where a non-parallel wall on the same level crosses them
/// or ends on them.
///
/// Cut points are collected for every wall first, so a wall crossed several
/// times is broken once into all its pieces. A point within the point
/// tolerance of one of the wall's own endpoints is not a cut. Returns the
/// number of walls broken.
pub fn break_intersections(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let walls: Vec<(ElementKey, Point2<f64>, Point2<f64>, Vector3<f64>)> = repo
        .wall_keys(level)
        .into_iter()
        .filter_map(|k| {
            let wall = repo.wall(k)?;
            let (a, b) = wall.segment()?;
            Some((k, a, b, wall.normal))
        })
        .collect();

    let mut cuts: Vec<Vec<Point2<f64>>> = vec![Vec::new(); walls.len()];
    for i in 0..walls.len() {
        for j in i + 1..walls.len() {
            let (_, ai, bi, ni) = walls[i];
            let (_, aj, bj, nj) = walls[j];
            if parallel(&ni, &nj, precision.angle_tolerance) {
                continue;
            }
            let Some(x) = segment_intersection(&ai, &bi, &aj, &bj, precision.point) else {
                continue;
            };
            let x = precision.snap_point2(&x);
            if interior(&x, &ai, &bi, precision.point) {
                cuts[i].push(x);
            }
            if interior(&x, &aj, &bj, precision.point) {
                cuts[j].push(x);
            }
        }
    }

    let mut broken = 0;
    for ((key, ..), points) in walls.into_iter().zip(cuts) {
        if points.is_empty() {
            continue;
        }
        match break_wall(repo, key, points, precision) {
            Ok(pieces) => {
                debug!(level, ?key, pieces, "wall broken at intersections");
                broken += 1;
            }
            Err(e) => warn!(level, ?key, error = %e, "wall left unbroken"),
        }
    }
    broken
}

fn interior(x: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, tolerance: f64) -> bool {
    (x - a).norm() > tolerance && (x - b).norm() > tolerance
}

/// Replaces the wall by one piece per stretch between its endpoints and
/// the cut points. Returns the number of pieces.
fn break_wall(
    repo: &mut ModelRepository,
    key: ElementKey,
    mut points: Vec<Point2<f64>>,
    precision: &Precision,
) -> Result<usize> {
    let wall = repo.wall(key).ok_or(TopologyError::ElementNotFound(key))?;
    let (a, b) = wall.segment().ok_or(TopologyError::ElementNotFound(key))?;
    let (bottom, top, normal, category) = (wall.bottom, wall.top, wall.normal, wall.category);
    let glazings = wall.apertures.clone();

    let along = b - a;
    points.sort_by(|p, q| (p - a).dot(&along).total_cmp(&(q - a).dot(&along)));
    points.dedup_by(|p, q| (*p - *q).norm() <= precision.point);

    let mut stops = Vec::with_capacity(points.len() + 2);
    stops.push(a);
    stops.extend(points);
    stops.push(b);

    let mut created = Vec::with_capacity(stops.len() - 1);
    for pair in stops.windows(2) {
        match repo.wall_from_segment(pair[0], pair[1], bottom, top, normal, category, precision) {
            Ok(piece) => created.push(piece),
            Err(e) => {
                for piece in created {
                    repo.remove_element(piece);
                }
                return Err(e);
            }
        }
    }

    repo.remove_element(key);
    rehome_glazings(repo, &glazings, &created, precision);
    Ok(created.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanse::tests::{add_wall, repo};
    use approx::assert_relative_eq;

    fn lengths(repo: &ModelRepository) -> Vec<f64> {
        let mut out: Vec<f64> = repo
            .wall_keys(0)
            .iter()
            .map(|&k| repo.wall(k).unwrap().length())
            .collect();
        out.sort_by(f64::total_cmp);
        out
    }

    #[test]
    fn test_t_junction_breaks_host_only() {
        let mut repo = repo();
        let p = Precision::default();
        let host = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let stem = add_wall(&mut repo, (1.0, 0.0), (1.0, 3.0));

        assert_eq!(break_intersections(&mut repo, 0, &p), 1);
        assert!(repo.wall(host).is_none());
        assert!(repo.wall(stem).is_some());
        let l = lengths(&repo);
        assert_eq!(l.len(), 3);
        assert_relative_eq!(l[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(l[2], 3.0, epsilon = 1e-9);

        assert_eq!(break_intersections(&mut repo, 0, &p), 0);
    }

    #[test]
    fn test_crossing_breaks_both() {
        let mut repo = repo();
        let p = Precision::default();
        add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        add_wall(&mut repo, (2.0, -2.0), (2.0, 2.0));

        assert_eq!(break_intersections(&mut repo, 0, &p), 2);
        let l = lengths(&repo);
        assert_eq!(l.len(), 4);
        for len in l {
            assert_relative_eq!(len, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_multiple_cuts_in_one_pass() {
        let mut repo = repo();
        let p = Precision::default();
        add_wall(&mut repo, (0.0, 0.0), (6.0, 0.0));
        add_wall(&mut repo, (2.0, 0.0), (2.0, 3.0));
        add_wall(&mut repo, (4.0, 0.0), (4.0, 3.0));

        assert_eq!(break_intersections(&mut repo, 0, &p), 1);
        assert_eq!(repo.wall_keys(0).len(), 5);
    }
}
