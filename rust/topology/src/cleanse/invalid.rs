// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::Precision;
use tracing::warn;

use crate::arena::ModelRepository;
use crate::element::Validity;
use crate::keys::ElementKey;

/// Removes walls that cannot become network edges.
///
/// Slivers (point footprint, short footprint or tiny area) are dissolved
/// into a valid wall that shares an edge with them and is at least as tall,
/// searched on the level below first and then on their own level. Slivers
/// without such a neighbour and walls of zero height are dropped. Returns
/// the number of walls removed either way.
pub fn remove_invalid_walls(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let mut removed = 0;
    for key in repo.wall_keys(level) {
        let Some(validity) = repo.wall(key).map(|w| w.validity(precision)) else { continue };
        if validity == Validity::Valid {
            continue;
        }

        if validity.dissolvable() {
            if let Some(receiver) = find_receiver(repo, key, level, precision) {
                match repo.dissolve_wall(receiver, key, precision) {
                    Ok(()) => {
                        removed += 1;
                        continue;
                    }
                    Err(e) => warn!(level, error = %e, "sliver could not be dissolved"),
                }
            }
        }

        warn!(level, ?key, ?validity, "invalid wall dropped");
        repo.remove_element(key);
        removed += 1;
    }
    removed
}

fn find_receiver(
    repo: &ModelRepository,
    key: ElementKey,
    level: usize,
    precision: &Precision,
) -> Option<ElementKey> {
    let wall = repo.wall(key)?;
    let height = wall.height();
    let mut search = Vec::with_capacity(2);
    if level > 0 {
        search.push(level - 1);
    }
    search.push(level);

    search
        .into_iter()
        .flat_map(|l| repo.wall_keys(l))
        .find(|&other| {
            other != key
                && repo.wall(other).is_some_and(|w| {
                    w.validity(precision) == Validity::Valid
                        && w.height() >= height
                        && w.shares_edge(wall, precision)
                })
        })
}
