// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorgraph_geometry::polygon::{open_ring, validate_contour};
use floorgraph_geometry::{Point2, Precision};
use tracing::warn;

use crate::arena::ModelRepository;
use crate::element::Element;

/// Vertices closer than this are one vertex.
const VERTEX_EPSILON: f64 = 1e-9;

/// Drops faces on `level` whose projection is not a valid polygon.
///
/// Repeated vertices left behind by snapping are squeezed out first; what
/// still has fewer than three vertices, crossing edges or no area goes.
/// Returns the number of faces removed.
pub fn remove_invalid_faces(repo: &mut ModelRepository, level: usize, precision: &Precision) -> usize {
    let mut removed = 0;
    for key in repo.face_keys(level) {
        let Some(Element::Face(face)) = repo.element_mut(key) else { continue };
        face.region.outer = squeeze(&face.region.outer);
        for hole in &mut face.region.holes {
            *hole = squeeze(hole);
        }
        face.region.holes.retain(|h| h.len() >= 3);

        let verdict = validate_contour(&face.region.outer, VERTEX_EPSILON);
        let reason = match verdict {
            Err(e) => e.to_string(),
            Ok(()) if face.area() <= precision.point * precision.point => "no area".to_string(),
            Ok(()) => continue,
        };
        warn!(level, ?key, reason = %reason, "invalid horizontal face dropped");
        repo.remove_element(key);
        removed += 1;
    }
    removed
}

/// Removes consecutive duplicates and the closing vertex.
fn squeeze(ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(ring.len());
    for p in open_ring(ring) {
        if out.last().map_or(true, |q| (p - q).norm() > VERTEX_EPSILON) {
            out.push(*p);
        }
    }
    while out.len() > 1 && out.first().zip(out.last()).is_some_and(|(a, b)| (a - b).norm() <= VERTEX_EPSILON) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanse::tests::repo;
    use crate::element::FaceCategory;
    use floorgraph_geometry::Region;

    #[test]
    fn test_squeeze_repeated_vertices() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 0.0),
        ];
        assert_eq!(squeeze(&ring).len(), 3);
    }

    #[test]
    fn test_invalid_faces_removed() {
        let mut repo = repo();
        let p = Precision::default();
        let good = Region::simple(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        // Bow tie: edges cross.
        let bow = Region::simple(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ]);
        let kept = repo.face_from_region(&good, 0.0, 0, FaceCategory::Opaque).unwrap();
        repo.face_from_region(&bow, 0.0, 0, FaceCategory::Opaque).unwrap();

        assert_eq!(remove_invalid_faces(&mut repo, 0, &p), 1);
        assert_eq!(repo.face_keys(0), vec![kept]);
        assert_eq!(remove_invalid_faces(&mut repo, 0, &p), 0);
    }
}
