// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Space and element adjacency.
//!
//! Two spaces are horizontal neighbours when a wall bounds both of them and
//! vertical neighbours when a face is the ceiling of one and the floor of
//! the other. Elements shared that way are interior; everything else stays
//! exterior. Independently of spaces, elements whose rings share an edge
//! are recorded as edge neighbours.

use floorgraph_geometry::Precision;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::arena::ModelRepository;
use crate::element::{Element, GridEdge};
use crate::keys::{ElementKey, SpaceKey};
use crate::space::Floor;

/// Recomputes the neighbour lists of every space and the exterior flag of
/// every element. Returns the number of links, with horizontal and vertical
/// links between the same two spaces counted apart.
pub fn build_adjacency(repo: &mut ModelRepository) -> usize {
    for space in repo.spaces.values_mut() {
        space.neighbors.clear();
    }

    let mut links: Vec<(SpaceKey, SpaceKey, ElementKey, bool)> = Vec::new();
    for (key, element) in repo.elements.iter() {
        let Element::Wall(wall) = element else { continue };
        for (i, &a) in wall.spaces.iter().enumerate() {
            for &b in &wall.spaces[i + 1..] {
                links.push((a, b, key, false));
            }
        }
    }

    let caps: Vec<(SpaceKey, Vec<ElementKey>, Vec<ElementKey>)> = repo
        .spaces
        .iter()
        .map(|(k, s)| {
            let faces = |c: &Option<Floor>| c.as_ref().map(|f| f.faces.clone()).unwrap_or_default();
            (k, faces(&s.floor), faces(&s.ceiling))
        })
        .collect();
    for (below, _, ceiling) in &caps {
        for (above, floor, _) in &caps {
            if below == above {
                continue;
            }
            for face in ceiling.iter().filter(|f| floor.contains(f)) {
                links.push((*below, *above, *face, true));
            }
        }
    }

    let mut shared = FxHashSet::default();
    for &(a, b, element, vertical) in &links {
        if a == b {
            continue;
        }
        shared.insert(element);
        if let Some(space) = repo.spaces.get_mut(a) {
            space.add_neighbor(b, element, vertical);
        }
        if let Some(space) = repo.spaces.get_mut(b) {
            space.add_neighbor(a, element, vertical);
        }
    }
    mark_exterior(repo, &shared);

    let pairs = repo.spaces.values().map(|s| s.neighbors.len()).sum::<usize>() / 2;
    debug!(pairs, interior = shared.len(), "adjacency built");
    pairs
}

/// Elements in `interior` and the apertures they host lose the exterior
/// flag, all others get it back.
fn mark_exterior(repo: &mut ModelRepository, interior: &FxHashSet<ElementKey>) {
    let hosted: Vec<(ElementKey, bool)> = repo
        .elements
        .iter()
        .filter(|(_, e)| !e.kind().is_aperture())
        .flat_map(|(k, e)| {
            let exterior = !interior.contains(&k);
            e.apertures().iter().map(move |&a| (a, exterior))
        })
        .collect();

    for (key, element) in repo.elements.iter_mut() {
        element.set_exterior(!interior.contains(&key));
    }
    for (aperture, exterior) in hosted {
        if let Some(element) = repo.elements.get_mut(aperture) {
            element.set_exterior(exterior);
        }
    }
}

/// Links every pair of elements whose snapped rings share an edge.
/// Glazings take no part. Returns the number of pairs.
pub fn build_edge_adjacency(repo: &mut ModelRepository, precision: &Precision) -> usize {
    let mut owners: FxHashMap<GridEdge, Vec<ElementKey>> = FxHashMap::default();
    for (key, element) in repo.elements.iter() {
        if matches!(element, Element::Glazing(_)) {
            continue;
        }
        for edge in element.grid_edges(precision) {
            owners.entry(edge).or_default().push(key);
        }
    }

    let mut neighbors: FxHashMap<ElementKey, Vec<ElementKey>> = FxHashMap::default();
    for keys in owners.values() {
        for (i, &a) in keys.iter().enumerate() {
            for &b in &keys[i + 1..] {
                let list = neighbors.entry(a).or_default();
                if !list.contains(&b) {
                    list.push(b);
                }
                let list = neighbors.entry(b).or_default();
                if !list.contains(&a) {
                    list.push(a);
                }
            }
        }
    }

    let mut links = 0;
    for (key, element) in repo.elements.iter_mut() {
        let mut list = neighbors.remove(&key).unwrap_or_default();
        list.sort_unstable();
        links += list.len();
        element.set_edge_neighbors(list);
    }
    debug!(pairs = links / 2, edges = owners.len(), "edge adjacency built");
    links / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanse::tests::{add_glazing, add_wall, repo};
    use crate::element::FaceCategory;
    use crate::space::Space;
    use floorgraph_geometry::{Point2, Region};

    fn square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_shared_wall_links_spaces() {
        let mut repo = repo();
        let shared = add_wall(&mut repo, (4.0, 0.0), (4.0, 3.0));
        let facade = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let a = repo.insert_space(Space::new(0, vec![shared, facade], square()));
        let b = repo.insert_space(Space::new(0, vec![shared], square()));
        repo.wall_mut(shared).unwrap().spaces = vec![a, b];
        repo.wall_mut(facade).unwrap().spaces = vec![a];

        assert_eq!(build_adjacency(&mut repo), 1);
        let neighbors = &repo.space(a).unwrap().neighbors;
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].space, b);
        assert_eq!(neighbors[0].elements, vec![shared]);
        assert!(!neighbors[0].vertical);
        assert!(!repo.wall(shared).unwrap().exterior);
        assert!(repo.wall(facade).unwrap().exterior);
    }

    #[test]
    fn test_glazing_follows_host() {
        let mut repo = repo();
        let shared = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let glazing = add_glazing(&mut repo, (1.0, 0.0), (2.0, 0.0));
        repo.wall_mut(shared).unwrap().apertures.push(glazing);
        let a = repo.insert_space(Space::new(0, vec![shared], square()));
        let b = repo.insert_space(Space::new(0, vec![shared], square()));
        repo.wall_mut(shared).unwrap().spaces = vec![a, b];

        build_adjacency(&mut repo);
        assert!(!repo.element(glazing).unwrap().exterior());

        // Once the wall bounds a single space both are exterior again.
        repo.wall_mut(shared).unwrap().spaces = vec![a];
        build_adjacency(&mut repo);
        assert!(repo.wall(shared).unwrap().exterior);
        assert!(repo.element(glazing).unwrap().exterior());
    }

    #[test]
    fn test_shared_slab_links_storeys() {
        let mut repo = repo();
        let slab = crate::network::tests::keys(1)[0];
        let mut lower = Space::new(0, Vec::new(), square());
        lower.ceiling = Some(Floor {
            faces: vec![slab],
            area: 1.0,
        });
        let mut upper = Space::new(1, Vec::new(), square());
        upper.floor = Some(Floor {
            faces: vec![slab],
            area: 1.0,
        });
        let lower = repo.insert_space(lower);
        let upper = repo.insert_space(upper);

        assert_eq!(build_adjacency(&mut repo), 1);
        let neighbors = &repo.space(upper).unwrap().neighbors;
        assert_eq!(neighbors[0].space, lower);
        assert!(neighbors[0].vertical);

        // Rebuilding does not duplicate entries.
        assert_eq!(build_adjacency(&mut repo), 1);
        assert_eq!(repo.space(lower).unwrap().neighbors.len(), 1);
    }

    #[test]
    fn test_edge_neighbours() {
        let mut repo = repo();
        let p = Precision::default();
        let south = add_wall(&mut repo, (0.0, 0.0), (4.0, 0.0));
        let east = add_wall(&mut repo, (4.0, 0.0), (4.0, 3.0));
        let apart = add_wall(&mut repo, (10.0, 0.0), (12.0, 0.0));
        let floor = Region::simple(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
        ]);
        let floor = repo
            .face_from_region(&floor, 0.0, 0, FaceCategory::Opaque)
            .unwrap();

        assert_eq!(build_edge_adjacency(&mut repo, &p), 3);
        let mut expected = vec![east, floor];
        expected.sort_unstable();
        assert_eq!(repo.element(south).unwrap().edge_neighbors(), expected.as_slice());
        assert_eq!(repo.element(floor).unwrap().edge_neighbors().len(), 2);
        assert!(repo.element(apart).unwrap().edge_neighbors().is_empty());

        // Idempotent.
        assert_eq!(build_edge_adjacency(&mut repo, &p), 3);
    }
}
