// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end reconstruction of small models through the public API.

use approx::assert_relative_eq;
use floorgraph_geometry::polygon::area;
use floorgraph_geometry::{Point3, Precision, Vector3};
use floorgraph_topology::{
    build_adjacency, classify, cleanse_level, pack_model, trace_level, CleanseOptions, FaceCategory,
    LevelBoundaries, ModelRepository,
};

fn wall(repo: &mut ModelRepository, a: (f64, f64), b: (f64, f64), bottom: f64, top: f64) {
    let ring = vec![
        Point3::new(a.0, a.1, bottom),
        Point3::new(b.0, b.1, bottom),
        Point3::new(b.0, b.1, top),
        Point3::new(a.0, a.1, top),
    ];
    repo.include_geometry(None, FaceCategory::Opaque, ring, Vec::new(), Vector3::zeros())
        .unwrap();
}

fn slab(repo: &mut ModelRepository, min: (f64, f64), max: (f64, f64), z: f64) {
    let ring = vec![
        Point3::new(min.0, min.1, z),
        Point3::new(max.0, min.1, z),
        Point3::new(max.0, max.1, z),
        Point3::new(min.0, max.1, z),
    ];
    repo.include_geometry(None, FaceCategory::Opaque, ring, Vec::new(), Vector3::z())
        .unwrap();
}

fn rectangle(repo: &mut ModelRepository, min: (f64, f64), max: (f64, f64), bottom: f64, top: f64) {
    let corners = [min, (max.0, min.1), max, (min.0, max.1)];
    for i in 0..4 {
        wall(repo, corners[i], corners[(i + 1) % 4], bottom, top);
    }
}

fn reconstruct(repo: &mut ModelRepository) -> Precision {
    let p = Precision::default();
    classify(repo, &p).unwrap();
    let options = CleanseOptions::default();
    let mut boundaries = Vec::new();
    for level in 0..repo.level_count() {
        cleanse_level(repo, level, &options, &p);
        boundaries.push(LevelBoundaries {
            level,
            loops: trace_level(repo, level, &p),
        });
    }
    repo.set_boundaries(boundaries);
    pack_model(repo, &p);
    build_adjacency(repo);
    p
}

fn loop_areas(repo: &ModelRepository, level: usize) -> Vec<f64> {
    let mut areas: Vec<f64> = repo.boundaries()[level]
        .loops
        .iter()
        .map(|l| area(&l.outline))
        .collect();
    areas.sort_by(f64::total_cmp);
    areas
}

#[test]
fn test_single_rectangle_room() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0, 3.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0);
    let p = reconstruct(&mut repo);

    assert_eq!(repo.level_count(), 2);
    assert_relative_eq!(repo.levels()[1], 3.0, epsilon = 1e-9);
    let loops = &repo.boundaries()[0].loops;
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].outline.len(), 4);
    assert_relative_eq!(area(&loops[0].outline), 12.0, epsilon = 1e-6);

    let rooms = repo.rooms(&p);
    assert_eq!(rooms.len(), 1);
    let room = repo.space(rooms[0]).unwrap();
    assert_eq!(room.id, "sp0");
    assert_eq!(room.walls.len(), 4);
    for &w in &room.walls {
        assert_eq!(repo.wall(w).unwrap().spaces, vec![rooms[0]]);
    }
}

#[test]
fn test_partition_splits_room() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0, 3.0);
    wall(&mut repo, (2.0, 0.0), (2.0, 3.0), 0.0, 3.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0);
    let p = reconstruct(&mut repo);

    let areas = loop_areas(&repo, 0);
    assert_eq!(areas.len(), 2);
    assert_relative_eq!(areas.iter().sum::<f64>(), 12.0, epsilon = 1e-6);
    assert_relative_eq!(areas[0], 6.0, epsilon = 1e-6);

    let rooms = repo.rooms(&p);
    assert_eq!(rooms.len(), 2);
    let neighbors = &repo.space(rooms[0]).unwrap().neighbors;
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].space, rooms[1]);
    assert!(!neighbors[0].vertical);

    // The slabs were shared out between the two rooms.
    assert_eq!(repo.face_keys(0).len(), 2);
    assert_eq!(repo.face_keys(1).len(), 2);
}

#[test]
fn test_disjoint_rooms_trace_independently() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (3.0, 3.0), 0.0, 3.0);
    rectangle(&mut repo, (10.0, 0.0), (13.0, 3.0), 0.0, 3.0);
    slab(&mut repo, (0.0, 0.0), (13.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (13.0, 3.0), 3.0);
    let p = reconstruct(&mut repo);

    let areas = loop_areas(&repo, 0);
    assert_eq!(areas.len(), 2);
    for a in areas {
        assert_relative_eq!(a, 9.0, epsilon = 1e-6);
    }
    let rooms = repo.rooms(&p);
    assert_eq!(rooms.len(), 2);
    assert!(rooms
        .iter()
        .all(|&r| repo.space(r).unwrap().neighbors.is_empty()));
}

#[test]
fn test_stacked_rooms_are_vertical_neighbours() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0, 3.0);
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0, 6.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 6.0);
    let p = reconstruct(&mut repo);

    assert_eq!(repo.level_count(), 3);
    let rooms = repo.rooms(&p);
    assert_eq!(rooms.len(), 2);
    let lower = repo.spaces_on_level(0)[0];
    let upper = repo.spaces_on_level(1)[0];
    let neighbors = &repo.space(lower).unwrap().neighbors;
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].space, upper);
    assert!(neighbors[0].vertical);

    // The middle slab is shared, the ground slab and the roof are not.
    let shared = neighbors[0].elements[0];
    assert!(!repo.face(shared).unwrap().exterior);
    for level in [0, 2] {
        for key in repo.face_keys(level) {
            assert!(repo.face(key).unwrap().exterior);
        }
    }
}

#[test]
fn test_overlapping_duplicate_walls_cleansed() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0, 3.0);
    // A second skin along the south wall and a stray sliver.
    wall(&mut repo, (0.0, 0.0), (4.0, 0.0), 0.0, 3.0);
    wall(&mut repo, (1.0, 0.0), (3.0, 0.0), 0.0, 3.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0);
    let p = reconstruct(&mut repo);

    let areas = loop_areas(&repo, 0);
    assert_eq!(areas.len(), 1);
    assert_relative_eq!(areas[0], 12.0, epsilon = 1e-6);
    assert_eq!(repo.rooms(&p).len(), 1);
}

#[test]
fn test_reconstruction_is_repeatable() {
    let mut repo = ModelRepository::new();
    rectangle(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0, 3.0);
    wall(&mut repo, (2.0, 0.0), (2.0, 3.0), 0.0, 3.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 0.0);
    slab(&mut repo, (0.0, 0.0), (4.0, 3.0), 3.0);
    let p = reconstruct(&mut repo);
    let walls = repo.wall_keys(0).len();

    let report = cleanse_level(&mut repo, 0, &CleanseOptions::default(), &p);
    assert_eq!(report.total(), 0);
    assert_eq!(repo.wall_keys(0).len(), walls);
}
