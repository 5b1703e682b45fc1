// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on Regions
//!
//! Thin layer over the i_overlay crate. Used to measure how much of a slab
//! lies under a room boundary, to clip slabs that straddle several rooms and
//! to cut vertical walls into per-storey bands.

use crate::error::{GeometryError, Result};
use crate::polygon::{area, signed_area, Region};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - pieces smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Intersection of two regions as a list of regions.
pub fn intersection(subject: &Region, clip: &Region) -> Vec<Region> {
    run(subject, clip, OverlayRule::Intersect)
}

/// `subject` minus `clip`.
pub fn difference(subject: &Region, clip: &Region) -> Vec<Region> {
    run(subject, clip, OverlayRule::Difference)
}

/// Area shared by two regions.
pub fn overlap_area(a: &Region, b: &Region) -> f64 {
    if !bounds_intersect(a, b) {
        return 0.0;
    }
    intersection(a, b).iter().map(Region::area).sum()
}

/// Splits `subject` into the part inside `clip` and the parts outside it.
///
/// Fails when the operation leaves nothing inside, which callers treat as
/// "no split".
pub fn split_by(subject: &Region, clip: &Region) -> Result<(Vec<Region>, Vec<Region>)> {
    let inside = intersection(subject, clip);
    if inside.is_empty() {
        return Err(GeometryError::EmptyResult(
            "clip does not overlap subject".to_string(),
        ));
    }
    Ok((inside, difference(subject, clip)))
}

fn run(subject: &Region, clip: &Region, rule: OverlayRule) -> Vec<Region> {
    if subject.outer.len() < 3 || clip.outer.len() < 3 {
        return match rule {
            OverlayRule::Difference if subject.outer.len() >= 3 => vec![subject.clone()],
            _ => Vec::new(),
        };
    }
    let subject_paths = region_to_paths(subject);
    let clip_paths = region_to_paths(clip);

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject_paths.overlay(&clip_paths, rule, FillRule::EvenOdd);
    shapes_to_regions(&result)
}

fn bounds_intersect(a: &Region, b: &Region) -> bool {
    match (
        crate::polygon::contour_bounds(&a.outer),
        crate::polygon::contour_bounds(&b.outer),
    ) {
        (Some((amin, amax)), Some((bmin, bmax))) => {
            amin.x <= bmax.x && amax.x >= bmin.x && amin.y <= bmax.y && amax.y >= bmin.y
        }
        _ => false,
    }
}

/// Outer ring counter-clockwise, holes clockwise.
fn region_to_paths(region: &Region) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + region.holes.len());
    let mut outer = contour_to_path(&region.outer);
    if signed_area(&region.outer) < 0.0 {
        outer.reverse();
    }
    paths.push(outer);
    for hole in region.holes.iter().filter(|h| h.len() >= 3) {
        let mut path = contour_to_path(hole);
        if signed_area(hole) > 0.0 {
            path.reverse();
        }
        paths.push(path);
    }
    paths
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// i_overlay shapes: first contour is the outer boundary, the rest are holes.
fn shapes_to_regions(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Region> {
    shapes
        .iter()
        .filter_map(|shape| {
            let (outer, holes) = shape.split_first()?;
            let outer = path_to_contour(outer);
            if area(&outer) <= MIN_AREA_THRESHOLD {
                return None;
            }
            let holes = holes
                .iter()
                .map(|h| path_to_contour(h))
                .filter(|h| area(h) > MIN_AREA_THRESHOLD)
                .collect();
            Some(Region::new(outer, holes))
        })
        .collect()
}
