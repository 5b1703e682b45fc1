// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::segment::segment_contains;
use floorgraph_geometry::vector::parallel;
use floorgraph_geometry::{Point2, Precision};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use super::UnionFind;
use crate::arena::ModelRepository;
use crate::element::{ElementGeometry, GridEdge};
use crate::keys::ElementKey;

/// Merges coplanar walls that meet along an edge nobody else uses.
///
/// A pair qualifies when their normals are parallel and every edge they
/// share belongs to exactly the two of them. Pairs meeting along a vertical
/// edge where a third wall's footprint arrives are left apart, so the
/// junction keeps its node. Merging repeats until the wall count settles.
/// Returns the number of walls absorbed.
pub fn merge_coplanar_walls(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let mut absorbed = 0;
    loop {
        let keys = repo.wall_keys(level);
        let edges: Vec<FxHashSet<GridEdge>> = keys
            .iter()
            .map(|&k| repo.wall(k).map(|w| w.grid_edges(precision)).unwrap_or_default())
            .collect();

        let mut owners: FxHashMap<GridEdge, Vec<usize>> = FxHashMap::default();
        for (i, set) in edges.iter().enumerate() {
            for &edge in set {
                owners.entry(edge).or_default().push(i);
            }
        }

        let mut sets = UnionFind::new(keys.len());
        for (edge, list) in &owners {
            let &[i, j] = list.as_slice() else { continue };
            let (Some(wi), Some(wj)) = (repo.wall(keys[i]), repo.wall(keys[j])) else { continue };
            if !parallel(&wi.normal, &wj.normal, precision.angle_tolerance) {
                continue;
            }
            let exclusive = edges[i]
                .intersection(&edges[j])
                .all(|e| owners.get(e).map_or(0, Vec::len) == 2);
            if !exclusive || junction_in_use(repo, &keys, (i, j), edge, precision) {
                continue;
            }
            sets.union(i, j);
        }

        let groups = sets.groups();
        if groups.is_empty() {
            break;
        }
        let before = absorbed;
        for group in groups {
            let target = keys[group[0]];
            for &m in &group[1..] {
                match repo.dissolve_wall(target, keys[m], precision) {
                    Ok(()) => absorbed += 1,
                    Err(e) => warn!(level, error = %e, "coplanar wall kept"),
                }
            }
        }
        if absorbed == before {
            break;
        }
    }

    if absorbed > 0 {
        debug!(level, absorbed, "coplanar walls merged");
    }
    absorbed
}

/// A vertical shared edge whose plan position lies on a third wall.
fn junction_in_use(
    repo: &ModelRepository,
    keys: &[ElementKey],
    (i, j): (usize, usize),
    edge: &GridEdge,
    precision: &Precision,
) -> bool {
    let ((ax, ay, _), (bx, by, _)) = *edge;
    if (ax, ay) != (bx, by) {
        return false;
    }
    let q = Point2::new(ax as f64 * precision.point, ay as f64 * precision.point);
    keys.iter().enumerate().any(|(k, &key)| {
        k != i
            && k != j
            && repo
                .wall(key)
                .and_then(|w| w.segment())
                .is_some_and(|(a, b)| segment_contains(&a, &b, &q, precision.point))
    })
}
