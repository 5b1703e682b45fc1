// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building levels: classification of raw geometry into elements, storey
//! splitting of tall walls and aperture hosting.

use floorgraph_geometry::bool2d;
use floorgraph_geometry::polygon::{centroid, point_in_contour};
use floorgraph_geometry::segment::segment_contains;
use floorgraph_geometry::vector::parallel_2d;
use floorgraph_geometry::{Point2, Point3, Precision, Projection, Region, Vector3};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::arena::ModelRepository;
use crate::element::{Element, Face, FaceCategory, Wall};
use crate::error::{Result, TopologyError};
use crate::keys::{ElementKey, GeometryKey};

/// Counts of elements produced by [`classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub levels: usize,
    pub faces: usize,
    pub walls: usize,
    pub glazings: usize,
    pub skylights: usize,
}

/// Horizontal faces have a normal within the threshold cone around z.
#[inline]
pub fn is_horizontal(normal_z: f64, precision: &Precision) -> bool {
    normal_z.abs() >= precision.horizontal_threshold
}

/// Turns every unclassified geometry record into an element.
///
/// On the first call the level elevations are derived from the horizontal
/// records: sorted by elevation, a new level opens whenever a face sits more
/// than `level_max_offset` above the current one, and levels carrying less
/// than `level_min_area` fold into the level below. Later calls reuse the
/// existing levels.
pub fn classify(repo: &mut ModelRepository, precision: &Precision) -> Result<ClassifyReport> {
    let pending: Vec<GeometryKey> = repo
        .geometries
        .iter()
        .filter(|(_, r)| !r.classified)
        .map(|(k, _)| k)
        .collect();

    if repo.levels.is_empty() {
        repo.levels = detect_levels(repo, &pending, precision);
    }
    if repo.levels.is_empty() {
        return Err(TopologyError::NoLevels);
    }

    let mut report = ClassifyReport {
        levels: repo.levels.len(),
        ..Default::default()
    };

    for key in pending {
        let record = &repo.geometries[key];
        let element = if is_horizontal(record.normal.z, precision) {
            let elevation = mean_z(&record.outer);
            let level = nearest_level(&repo.levels, elevation);
            let face = Face::new(key, &record.outer, &record.holes, record.category, level);
            if record.category == FaceCategory::Glazing {
                report.skylights += 1;
                Element::Skylight(face)
            } else {
                report.faces += 1;
                Element::Face(face)
            }
        } else {
            let wall = Wall::new(
                key,
                record.outer.clone(),
                record.area(),
                record.normal,
                record.category,
                &repo.levels,
                precision,
            );
            if record.category == FaceCategory::Glazing {
                report.glazings += 1;
                Element::Glazing(wall)
            } else {
                report.walls += 1;
                Element::Wall(wall)
            }
        };
        repo.geometries[key].classified = true;
        repo.insert_element(element);
    }

    debug!(
        levels = report.levels,
        faces = report.faces,
        walls = report.walls,
        glazings = report.glazings,
        skylights = report.skylights,
        "classified geometry"
    );
    Ok(report)
}

fn mean_z(ring: &[Point3<f64>]) -> f64 {
    if ring.is_empty() {
        return 0.0;
    }
    ring.iter().map(|p| p.z).sum::<f64>() / ring.len() as f64
}

fn detect_levels(repo: &ModelRepository, pending: &[GeometryKey], precision: &Precision) -> Vec<f64> {
    let mut horizontal: Vec<(f64, f64)> = pending
        .iter()
        .map(|&k| &repo.geometries[k])
        .filter(|r| is_horizontal(r.normal.z, precision))
        .map(|r| (mean_z(&r.outer), r.area()))
        .collect();
    horizontal.sort_by(|a, b| a.0.total_cmp(&b.0));

    // (minimum elevation, accumulated area)
    let mut clusters: Vec<(f64, f64)> = Vec::new();
    for (elevation, area) in horizontal {
        match clusters.last_mut() {
            Some((start, total)) if elevation - *start <= precision.level_max_offset => {
                *total += area;
            }
            _ => clusters.push((elevation, area)),
        }
    }

    let mut levels: Vec<f64> = Vec::with_capacity(clusters.len());
    for (i, (elevation, area)) in clusters.into_iter().enumerate() {
        if i > 0 && area < precision.level_min_area {
            debug!(elevation, area, "level below minimum area merged downwards");
            continue;
        }
        levels.push(precision.snap(elevation));
    }
    levels
}

/// Index of the level elevation nearest to `z`.
pub fn nearest_level(levels: &[f64], z: f64) -> usize {
    levels
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - z).abs().total_cmp(&(b.1 - z).abs()))
        .map_or(0, |(i, _)| i)
}

/// Bottom and top level of a vertical extent.
///
/// The bottom level is the highest level at or below `bottom`. When the
/// extent crosses the next level up, the nearer of the two is taken instead.
pub(crate) fn level_span(
    bottom: f64,
    top: f64,
    levels: &[f64],
    precision: &Precision,
) -> (usize, usize) {
    if levels.is_empty() {
        return (0, 0);
    }
    let at_or_below = |z: f64| levels.iter().rposition(|&l| l <= z + precision.point);

    let mut level = at_or_below(bottom).unwrap_or(0);
    if level + 1 < levels.len() && top > levels[level + 1] + precision.point {
        let here = (bottom - levels[level]).abs();
        let next = (bottom - levels[level + 1]).abs();
        if next < here {
            level += 1;
        }
    }
    let top_level = at_or_below(top).unwrap_or(0).max(level);
    (level, top_level)
}

/// Cuts walls that pass through intermediate levels into one wall per
/// storey. Returns the number of walls replaced.
pub fn split_walls_by_level(repo: &mut ModelRepository, precision: &Precision) -> usize {
    let candidates: Vec<ElementKey> = repo
        .elements
        .iter()
        .filter_map(|(k, e)| match e {
            Element::Wall(w) if w.normal.z.abs() < precision.angle_tolerance => Some(k),
            _ => None,
        })
        .collect();

    let mut replaced = 0;
    for key in candidates {
        let Some(wall) = repo.wall(key) else { continue };
        let cuts: Vec<f64> = repo
            .levels
            .iter()
            .copied()
            .filter(|&l| l > wall.bottom + precision.point && l < wall.top - precision.point)
            .collect();
        if cuts.is_empty() {
            continue;
        }
        let mut bands = Vec::with_capacity(cuts.len() + 1);
        bands.push(wall.bottom);
        bands.extend(cuts);
        bands.push(wall.top);
        let (normal, category) = (wall.normal, wall.category);

        let split = split_wall(repo, key, &bands)
            .and_then(|pieces| replace_wall(repo, key, pieces, normal, category, precision));
        match split {
            Ok(pieces) => {
                debug!(pieces, "wall split across levels");
                replaced += 1;
            }
            Err(e) => warn!(error = %e, "storey split failed, wall kept whole"),
        }
    }
    replaced
}

/// Outer ring and holes of one storey piece, in world coordinates.
type WallPiece = (Vec<Point3<f64>>, Vec<Vec<Point3<f64>>>);

/// Cuts every geometry of a wall into the horizontal bands between
/// consecutive elevations of `bands`.
fn split_wall(repo: &ModelRepository, key: ElementKey, bands: &[f64]) -> Result<Vec<WallPiece>> {
    let wall = repo.wall(key).ok_or(TopologyError::ElementNotFound(key))?;
    let normal = wall.normal;
    let sources: Vec<(Vec<_>, Vec<Vec<_>>)> = wall
        .geometries
        .iter()
        .filter_map(|&g| repo.geometry(g))
        .map(|r| (r.outer.clone(), r.holes.clone()))
        .collect();

    let mut pieces = Vec::new();
    for (outer, holes) in sources {
        let Some(&origin) = outer.first() else { continue };
        let projection = Projection::new(origin, &normal, None)?;
        let region = Region::new(
            projection.ring_to_uv(&outer),
            holes.iter().map(|h| projection.ring_to_uv(h)).collect(),
        );
        let Some((min, max)) = floorgraph_geometry::polygon::contour_bounds(&region.outer) else {
            continue;
        };
        for pair in bands.windows(2) {
            let (v0, v1) = (pair[0] - origin.z, pair[1] - origin.z);
            let band = Region::simple(vec![
                Point2::new(min.x - 1.0, v0),
                Point2::new(max.x + 1.0, v0),
                Point2::new(max.x + 1.0, v1),
                Point2::new(min.x - 1.0, v1),
            ]);
            for piece in bool2d::intersection(&region, &band) {
                let ring = projection.ring_to_world(&piece.outer);
                let holes = piece.holes.iter().map(|h| projection.ring_to_world(h)).collect();
                pieces.push((ring, holes));
            }
        }
    }
    Ok(pieces)
}

/// Registers all `pieces` as walls and removes `key`. When a piece is
/// rejected the pieces already registered are removed again and `key`
/// stays.
fn replace_wall(
    repo: &mut ModelRepository,
    key: ElementKey,
    pieces: Vec<WallPiece>,
    normal: Vector3<f64>,
    category: FaceCategory,
    precision: &Precision,
) -> Result<usize> {
    let mut inserted = Vec::with_capacity(pieces.len());
    for (ring, holes) in pieces {
        match repo.wall_from_ring(ring, holes, normal, category, precision) {
            Ok(k) => inserted.push(k),
            Err(e) => {
                for k in inserted {
                    repo.remove_element(k);
                }
                return Err(e);
            }
        }
    }
    repo.remove_element(key);
    Ok(inserted.len())
}

/// Hosts every glazing on a parallel wall of its level whose footprint
/// covers it, and every skylight on the face containing its centroid.
/// Apertures that already have a host are left alone. Returns the number
/// of apertures attached.
pub fn attach_apertures(repo: &mut ModelRepository, precision: &Precision) -> usize {
    let hosted: FxHashSet<ElementKey> = repo
        .elements
        .values()
        .filter_map(|e| match e {
            Element::Wall(w) => Some(&w.apertures),
            Element::Face(f) => Some(&f.apertures),
            _ => None,
        })
        .flatten()
        .copied()
        .collect();

    let mut links: Vec<(ElementKey, ElementKey)> = Vec::new();
    for (key, element) in repo.elements.iter() {
        if hosted.contains(&key) {
            continue;
        }
        let host = match element {
            Element::Glazing(glazing) => find_wall_host(repo, glazing, precision),
            Element::Skylight(skylight) => find_face_host(repo, skylight),
            _ => continue,
        };
        match host {
            Some(host) => links.push((host, key)),
            None => debug!(?key, "aperture without host"),
        }
    }

    let mut attached = 0;
    for (host, aperture) in links {
        let list = match repo.element_mut(host) {
            Some(Element::Wall(w)) => &mut w.apertures,
            Some(Element::Face(f)) => &mut f.apertures,
            _ => continue,
        };
        if !list.contains(&aperture) {
            list.push(aperture);
            attached += 1;
        }
    }
    attached
}

pub(crate) fn find_wall_host(
    repo: &ModelRepository,
    glazing: &Wall,
    precision: &Precision,
) -> Option<ElementKey> {
    let (ga, gb) = glazing.segment()?;
    let direction = gb - ga;
    let tolerance = precision.equality_radius();
    repo.elements.iter().find_map(|(k, e)| match e {
        Element::Wall(w) if w.level == glazing.level => {
            let (wa, wb) = w.segment()?;
            let covers = parallel_2d(&(wb - wa), &direction, precision.angle_tolerance)
                && segment_contains(&wa, &wb, &ga, tolerance)
                && segment_contains(&wa, &wb, &gb, tolerance);
            covers.then_some(k)
        }
        _ => None,
    })
}

fn find_face_host(repo: &ModelRepository, skylight: &Face) -> Option<ElementKey> {
    let c = centroid(&skylight.region.outer)?;
    repo.elements.iter().find_map(|(k, e)| match e {
        Element::Face(f) if f.level == skylight.level && point_in_contour(&c, &f.region.outer) => {
            Some(k)
        }
        _ => None,
    })
}
