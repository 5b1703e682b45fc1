// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::{Point2, Precision};
use tracing::{debug, warn};

use super::collinear_groups;
use crate::arena::ModelRepository;

/// Dissolves walls whose footprint repeats a later wall on the same line.
///
/// Footprints match when both endpoints coincide within the equality
/// radius, in either direction. The earlier wall is merged into the later
/// one, apertures included. Returns the number of walls removed.
pub fn remove_duplicate_walls(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let radius = precision.equality_radius();
    let mut removed = 0;

    for line in collinear_groups(repo, level, precision) {
        for (i, &key) in line.iter().enumerate() {
            let Some(seg) = repo.wall(key).and_then(|w| w.segment()) else { continue };
            let twin = line[i + 1..].iter().copied().find(|&other| {
                repo.wall(other)
                    .and_then(|w| w.segment())
                    .is_some_and(|o| same_footprint(seg, o, radius))
            });
            let Some(twin) = twin else { continue };
            match repo.dissolve_wall(twin, key, precision) {
                Ok(()) => removed += 1,
                Err(e) => warn!(level, error = %e, "duplicate wall kept"),
            }
        }
    }

    if removed > 0 {
        debug!(level, removed, "duplicate walls dissolved");
    }
    removed
}

fn same_footprint(
    (a0, a1): (Point2<f64>, Point2<f64>),
    (b0, b1): (Point2<f64>, Point2<f64>),
    radius: f64,
) -> bool {
    let close = |p: Point2<f64>, q: Point2<f64>| (p - q).norm() <= radius;
    (close(a0, b0) && close(a1, b1)) || (close(a0, b1) && close(a1, b0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanse::tests::{add_wall, repo};

    #[test]
    fn test_reversed_duplicate_dissolved() {
        let mut repo = repo();
        let p = Precision::default();
        let first = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let second = add_wall(&mut repo, (4.0, 0.02), (0.0, 0.02));
        let other = add_wall(&mut repo, (0.0, 0.0), (0.0, 3.0));

        assert_eq!(remove_duplicate_walls(&mut repo, 0, &p), 1);
        assert!(repo.wall(first).is_none());
        let kept = repo.wall(second).unwrap();
        assert_eq!(kept.geometries.len(), 2);
        assert!(repo.wall(other).is_some());
        assert_eq!(remove_duplicate_walls(&mut repo, 0, &p), 0);
    }

    #[test]
    fn test_partial_overlap_is_not_duplicate() {
        let mut repo = repo();
        let p = Precision::default();
        add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        add_wall(&mut repo, (2.0, 0.0), (6.0, 0.0));
        assert_eq!(remove_duplicate_walls(&mut repo, 0, &p), 0);
    }
}
