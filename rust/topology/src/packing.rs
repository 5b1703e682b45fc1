// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Space packing.
//!
//! Every traced outline becomes a [`Space`]. Faces on its level that it
//! overlaps form the floor, faces on the level above form the ceiling. A
//! face that reaches beyond the outline is clipped: the part inside and the
//! parts outside are registered as new faces and the original goes away, so
//! a slab spanning several rooms ends up shared out between them.
//!
//! Voids are then attached to the smallest space enclosing them. After that
//! void stacks (a floored void under floorless voids under a ceiling) are
//! merged into one tall space. A floor counts as full against the area left
//! once enclosed voids are taken out.

use std::time::Instant;

use floorgraph_geometry::bool2d::{overlap_area, split_by};
use floorgraph_geometry::polygon::{centroid, contains, contains_properly};
use floorgraph_geometry::{Precision, Region};
use tracing::{debug, info, warn};

use crate::arena::ModelRepository;
use crate::element::Element;
use crate::error::{Result, TopologyError};
use crate::keys::{ElementKey, SpaceKey};
use crate::space::{Floor, Space};

/// What [`pack_model`] built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackReport {
    pub spaces: usize,
    pub split_faces: usize,
    pub stacks_merged: usize,
    pub voids_attached: usize,
}

/// Drops every space and the wall back-references to them.
pub fn reset_spaces(repo: &mut ModelRepository) {
    repo.spaces.clear();
    for element in repo.elements.values_mut() {
        if let Element::Wall(wall) = element {
            wall.spaces.clear();
        }
    }
}

/// Rebuilds all spaces from the recorded boundaries.
pub fn pack_model(repo: &mut ModelRepository, precision: &Precision) -> PackReport {
    let started = Instant::now();
    reset_spaces(repo);

    let mut report = PackReport::default();
    for level in 0..repo.level_count() {
        let (spaces, split) = pack_level(repo, level, precision);
        report.spaces += spaces;
        report.split_faces += split;
    }
    for level in 0..repo.level_count() {
        attach_voids(repo, level, precision);
    }
    report.stacks_merged = merge_void_stacks(repo, precision);
    report.voids_attached = repo.spaces.values().map(|s| s.voids.len()).sum();

    info!(
        spaces = repo.space_count(),
        rooms = repo.rooms(precision).len(),
        split_faces = report.split_faces,
        stacks_merged = report.stacks_merged,
        voids_attached = report.voids_attached,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "spaces packed"
    );
    report
}

/// Packs the boundaries of `level`. Returns the number of spaces created
/// and of faces split.
pub fn pack_level(repo: &mut ModelRepository, level: usize, precision: &Precision) -> (usize, usize) {
    let loops: Vec<_> = repo
        .boundaries
        .iter()
        .filter(|b| b.level == level)
        .flat_map(|b| b.loops.iter().cloned())
        .collect();
    let top = repo.level_count().saturating_sub(1);

    let mut created = 0;
    let mut split = 0;
    for boundary in loops {
        let region = Region::simple(boundary.outline.clone());
        let mut space = Space::new(level, boundary.walls.clone(), boundary.outline);
        space.top_level = (level + 1).min(top).max(level);
        space.floor = cap(repo, &region, level, precision, &mut split);
        if level < top {
            space.ceiling = cap(repo, &region, level + 1, precision, &mut split);
        }

        let key = repo.insert_space(space);
        for &wall in &boundary.walls {
            if let Some(w) = repo.wall_mut(wall) {
                if !w.spaces.contains(&key) {
                    w.spaces.push(key);
                }
            }
        }
        created += 1;
    }
    if created > 0 {
        debug!(level, spaces = created, split_faces = split, "level packed");
    }
    (created, split)
}

/// Faces of `level` under `region`, clipping the ones that stick out.
fn cap(
    repo: &mut ModelRepository,
    region: &Region,
    level: usize,
    precision: &Precision,
    split: &mut usize,
) -> Option<Floor> {
    let mut faces = Vec::new();
    let mut covered = 0.0;
    for key in repo.face_keys(level) {
        let Some(face) = repo.face(key) else { continue };
        let overlap = overlap_area(&face.region, region);
        if overlap <= precision.area {
            continue;
        }
        covered += overlap;
        if overlap < face.area() - precision.area {
            match split_face(repo, key, region, precision) {
                Ok(Some(inside)) => {
                    *split += 1;
                    faces.extend(inside);
                    continue;
                }
                Ok(None) => {}
                Err(e) => warn!(level, ?key, error = %e, "face kept whole"),
            }
        }
        faces.push(key);
    }
    (!faces.is_empty()).then_some(Floor {
        faces,
        area: covered,
    })
}

/// Replaces a face by its parts inside and outside `clip`.
///
/// Nothing happens unless both sides carry more than the area tolerance.
/// Skylights move to the part holding their centroid, and spaces already
/// capped by the face take the parts that overlap them. Returns the keys of
/// the inside parts.
fn split_face(
    repo: &mut ModelRepository,
    key: ElementKey,
    clip: &Region,
    precision: &Precision,
) -> Result<Option<Vec<ElementKey>>> {
    let face = repo.face(key).ok_or(TopologyError::ElementNotFound(key))?.clone();
    let (inside, outside) = split_by(&face.region, clip)?;
    let inside_area: f64 = inside.iter().map(Region::area).sum();
    let outside_area: f64 = outside.iter().map(Region::area).sum();
    if inside_area <= precision.area || outside_area <= precision.area {
        return Ok(None);
    }

    let mut parts = Vec::with_capacity(inside.len() + outside.len());
    let mut inner = Vec::with_capacity(inside.len());
    let pieces = inside.iter().map(|r| (r, true)).chain(outside.iter().map(|r| (r, false)));
    for (region, is_inside) in pieces {
        match repo.face_from_region(region, face.elevation, face.level, face.category) {
            Ok(k) => {
                parts.push(k);
                if is_inside {
                    inner.push(k);
                }
            }
            Err(e) => {
                for k in parts {
                    repo.remove_element(k);
                }
                return Err(e);
            }
        }
    }

    for &skylight in &face.apertures {
        let Some(c) = repo
            .element(skylight)
            .and_then(Element::as_face)
            .and_then(|s| centroid(&s.region.outer))
        else {
            continue;
        };
        let host = parts
            .iter()
            .copied()
            .find(|&k| repo.face(k).is_some_and(|f| f.region.contains_point(&c)));
        if let Some(Element::Face(f)) = host.and_then(|k| repo.element_mut(k)) {
            f.apertures.push(skylight);
        }
    }

    repo.remove_element(key);
    replace_in_caps(repo, key, &parts, precision);
    Ok(Some(inner))
}

/// Swaps `old` for the overlapping `parts` in every floor and ceiling.
fn replace_in_caps(repo: &mut ModelRepository, old: ElementKey, parts: &[ElementKey], precision: &Precision) {
    let regions: Vec<(ElementKey, Region)> = parts
        .iter()
        .filter_map(|&k| Some((k, repo.face(k)?.region.clone())))
        .collect();

    for space in repo.spaces.values_mut() {
        let outline = space.region();
        for cap in [space.floor.as_mut(), space.ceiling.as_mut()].into_iter().flatten() {
            let Some(pos) = cap.faces.iter().position(|&f| f == old) else { continue };
            cap.faces.remove(pos);
            for (k, r) in &regions {
                if overlap_area(r, &outline) > precision.area && !cap.faces.contains(k) {
                    cap.faces.push(*k);
                }
            }
        }
    }
}

/// Attaches every void on `level` to the smallest space that properly
/// contains it. Returns the number of voids attached.
pub fn attach_voids(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let keys = repo.spaces_on_level(level);
    let mut attached = 0;
    for &void in &keys {
        let Some(space) = repo.space(void) else { continue };
        if !space.is_void(precision) {
            continue;
        }
        let already = keys
            .iter()
            .any(|&h| repo.space(h).is_some_and(|s| s.voids.contains(&void)));
        if already {
            continue;
        }

        let area = space.outline_area();
        let host = keys
            .iter()
            .copied()
            .filter(|&h| h != void)
            .filter_map(|h| {
                let s = repo.space(h)?;
                contains_properly(&s.outline, &space.outline, precision.point)
                    .then(|| (s.outline_area(), h))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, h)| h);

        if let Some(host) = host.and_then(|h| repo.space_mut(h)) {
            host.voids.push(void);
            host.void_area += area;
            attached += 1;
        }
    }
    attached
}

/// Merges each floored void with the floorless voids stacked on top of it,
/// when the stack ends under a full ceiling. Returns the number of stacks
/// merged.
pub fn merge_void_stacks(repo: &mut ModelRepository, precision: &Precision) -> usize {
    let levels = repo.level_count();
    let mut merged = 0;
    for level in 0..levels {
        for key in repo.spaces_on_level(level) {
            let Some(space) = repo.space(key) else { continue };
            if !space.has_full_floor(precision) || space.has_full_ceiling(precision) {
                continue;
            }
            if let Some(stack) = find_stack(repo, key, levels, precision) {
                merge_stack(repo, &stack, precision);
                merged += 1;
            }
        }
    }
    if merged > 0 {
        debug!(merged, "void stacks merged");
    }
    merged
}

fn find_stack(
    repo: &ModelRepository,
    bottom: SpaceKey,
    levels: usize,
    precision: &Precision,
) -> Option<Vec<SpaceKey>> {
    let mut stack = vec![bottom];
    loop {
        let top = repo.space(*stack.last()?)?;
        if top.level + 1 >= levels {
            return None;
        }
        // The candidate closest in outline area wins.
        let area = top.outline_area();
        let above = repo
            .spaces_on_level(top.level + 1)
            .into_iter()
            .filter(|k| !stack.contains(k))
            .filter_map(|k| {
                let s = repo.space(k)?;
                let stacked = s.floor.is_none()
                    && (contains(&top.outline, &s.outline, precision.point)
                        || contains(&s.outline, &top.outline, precision.point));
                stacked.then(|| ((s.outline_area() - area).abs(), k))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, k)| k)?;
        stack.push(above);
        if repo.space(above)?.has_full_ceiling(precision) {
            return Some(stack);
        }
    }
}

/// Folds the spaces above `stack[0]` into it. Voids held by the upper
/// spaces move to the merged space, whose void area is the largest of the
/// stack. Spaces that stop being voids leave their hosts.
fn merge_stack(repo: &mut ModelRepository, stack: &[SpaceKey], precision: &Precision) {
    let Some((&bottom, upper)) = stack.split_first() else { return };
    for &key in upper {
        detach_void(repo, key);
    }

    let mut walls = Vec::new();
    let mut voids = Vec::new();
    let mut void_area: f64 = 0.0;
    let mut ceiling = None;
    let mut top_level = None;
    for &key in upper {
        let Some(space) = repo.remove_space(key) else { continue };
        for &w in &space.walls {
            if let Some(wall) = repo.wall_mut(w) {
                wall.spaces.retain(|&s| s != key);
                if !wall.spaces.contains(&bottom) {
                    wall.spaces.push(bottom);
                }
            }
        }
        walls.extend(space.walls);
        voids.extend(space.voids);
        void_area = void_area.max(space.void_area);
        ceiling = space.ceiling;
        top_level = Some(space.top_level);
    }

    if let Some(space) = repo.space_mut(bottom) {
        for w in walls {
            if !space.walls.contains(&w) {
                space.walls.push(w);
            }
        }
        for v in voids {
            if !space.voids.contains(&v) {
                space.voids.push(v);
            }
        }
        space.void_area = space.void_area.max(void_area);
        space.ceiling = ceiling;
        if let Some(top) = top_level {
            space.top_level = top;
        }
    }
    if repo.space(bottom).is_some_and(|s| !s.is_void(precision)) {
        detach_void(repo, bottom);
    }
}

/// Removes `void` from the void list of every space holding it.
fn detach_void(repo: &mut ModelRepository, void: SpaceKey) {
    let Some(area) = repo.space(void).map(Space::outline_area) else { return };
    for host in repo.spaces.values_mut() {
        if let Some(pos) = host.voids.iter().position(|&v| v == void) {
            host.voids.remove(pos);
            host.void_area = (host.void_area - area).max(0.0);
        }
    }
}
