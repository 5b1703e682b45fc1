// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the building model.
//!
//! The [`ModelRepository`] is the single owner of every raw polygon,
//! classified element and reconstructed space. Everything else refers to
//! them through generational keys, so stages can drop, merge and re-tag
//! elements without invalidating references held elsewhere.
//!
//! ## Append-only geometry
//!
//! Raw polygons are never removed. Operations that derive new shapes (wall
//! re-partitioning, slab clipping, storey splitting) insert fresh records,
//! each receiving a new id. Inserts go through `&mut self`, which serializes
//! them.

use floorgraph_geometry::vector::{newell_normal, unit};
use floorgraph_geometry::{round_polygons, GeometryError, Point2, Point3, Precision, Region, Vector3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::element::{net_area_3d, Element, ElementGeometry, Face, FaceCategory, Wall};
use crate::error::{Result, TopologyError};
use crate::keys::*;
use crate::space::Space;
use crate::tracer::BoundaryLoop;

/// A raw polygon as delivered by a model reader.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub id: String,
    pub category: FaceCategory,
    pub outer: Vec<Point3<f64>>,
    pub holes: Vec<Vec<Point3<f64>>>,
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Set once an element has been built from this record.
    pub(crate) classified: bool,
}

impl GeometryRecord {
    /// Net surface area (holes subtracted).
    pub fn area(&self) -> f64 {
        net_area_3d(&self.outer, &self.holes)
    }
}

/// Traced loops of one level, as wall sequences.
#[derive(Debug, Clone, Default)]
pub struct LevelBoundaries {
    pub level: usize,
    pub loops: Vec<BoundaryLoop>,
}

/// The central arena that owns geometry, elements and spaces.
///
/// # Example
///
/// ```
/// use floorgraph_topology::{FaceCategory, ModelRepository};
/// use floorgraph_geometry::{Point3, Vector3};
///
/// let mut repo = ModelRepository::new();
/// let slab = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
///     Point3::new(4.0, 3.0, 0.0),
///     Point3::new(0.0, 3.0, 0.0),
/// ];
/// let key = repo
///     .include_geometry(None, FaceCategory::Opaque, slab, Vec::new(), Vector3::z())
///     .unwrap();
///
/// assert_eq!(repo.geometry_count(), 1);
/// assert_eq!(repo.geometry(key).unwrap().id, "geo0");
/// ```
#[derive(Debug, Default)]
pub struct ModelRepository {
    pub(crate) geometries: SlotMap<GeometryKey, GeometryRecord>,
    pub(crate) elements: SlotMap<ElementKey, Element>,
    pub(crate) spaces: SlotMap<SpaceKey, Space>,
    pub(crate) levels: Vec<f64>,
    pub(crate) boundaries: Vec<LevelBoundaries>,
    ids: FxHashMap<String, GeometryKey>,
    next_id: usize,
    next_space_id: usize,
}

impl ModelRepository {
    /// Creates a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Geometry records
    // ========================================================================

    /// Adds a raw polygon.
    ///
    /// A zero `normal` is replaced by the Newell normal of `outer`. When `id`
    /// is `None` (or already taken) a fresh `geo{n}` id is assigned.
    pub fn include_geometry(
        &mut self,
        id: Option<&str>,
        category: FaceCategory,
        outer: Vec<Point3<f64>>,
        holes: Vec<Vec<Point3<f64>>>,
        normal: Vector3<f64>,
    ) -> std::result::Result<GeometryKey, GeometryError> {
        if outer.len() < 3 {
            return Err(GeometryError::TooFewVertices(outer.len()));
        }
        let normal = match unit(&normal) {
            Ok(n) => n,
            Err(_) => newell_normal(&outer)?,
        };

        let counter = self.next_id;
        self.next_id += 1;
        let id = match id {
            Some(id) if !self.ids.contains_key(id) => id.to_string(),
            _ => format!("geo{}", counter),
        };

        let key = self.geometries.insert(GeometryRecord {
            id: id.clone(),
            category,
            outer,
            holes,
            normal,
            classified: false,
        });
        self.ids.insert(id, key);
        Ok(key)
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&GeometryRecord> {
        self.geometries.get(key)
    }

    pub fn geometry_by_id(&self, id: &str) -> Option<GeometryKey> {
        self.ids.get(id).copied()
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryKey, &GeometryRecord)> {
        self.geometries.iter()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Snaps the coordinates of every record not yet turned into an element.
    pub fn snap_geometries(&mut self, precision: &Precision) {
        let keys: Vec<GeometryKey> = self
            .geometries
            .iter()
            .filter(|(_, r)| !r.classified)
            .map(|(k, _)| k)
            .collect();

        let mut rings: Vec<Vec<Point3<f64>>> = Vec::new();
        let mut owners: Vec<(GeometryKey, Option<usize>)> = Vec::new();
        for &key in &keys {
            let record = &self.geometries[key];
            rings.push(record.outer.clone());
            owners.push((key, None));
            for (h, hole) in record.holes.iter().enumerate() {
                rings.push(hole.clone());
                owners.push((key, Some(h)));
            }
        }

        round_polygons(&mut rings, precision);

        for ((key, hole), ring) in owners.into_iter().zip(rings) {
            if let Some(record) = self.geometries.get_mut(key) {
                match hole {
                    None => record.outer = ring,
                    Some(h) => record.holes[h] = ring,
                }
            }
        }
    }

    // ========================================================================
    // Levels
    // ========================================================================

    /// Level elevations, ascending.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    // ========================================================================
    // Elements
    // ========================================================================

    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn element_mut(&mut self, key: ElementKey) -> Option<&mut Element> {
        self.elements.get_mut(key)
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementKey, &Element)> {
        self.elements.iter()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// An opaque or air-boundary wall (not a glazing).
    pub fn wall(&self, key: ElementKey) -> Option<&Wall> {
        match self.elements.get(key)? {
            Element::Wall(w) => Some(w),
            _ => None,
        }
    }

    pub(crate) fn wall_mut(&mut self, key: ElementKey) -> Option<&mut Wall> {
        match self.elements.get_mut(key)? {
            Element::Wall(w) => Some(w),
            _ => None,
        }
    }

    /// A floor/ceiling face (not a skylight).
    pub fn face(&self, key: ElementKey) -> Option<&Face> {
        match self.elements.get(key)? {
            Element::Face(f) => Some(f),
            _ => None,
        }
    }

    /// Walls on `level`, in arena order.
    pub fn wall_keys(&self, level: usize) -> Vec<ElementKey> {
        self.keys_of(level, ElementKind::Wall)
    }

    /// Faces on `level`, in arena order.
    pub fn face_keys(&self, level: usize) -> Vec<ElementKey> {
        self.keys_of(level, ElementKind::Face)
    }

    pub fn keys_of(&self, level: usize, kind: ElementKind) -> Vec<ElementKey> {
        self.elements
            .iter()
            .filter(|(_, e)| e.kind() == kind && e.level() == level)
            .map(|(k, _)| k)
            .collect()
    }

    pub(crate) fn insert_element(&mut self, element: Element) -> ElementKey {
        self.elements.insert(element)
    }

    pub(crate) fn remove_element(&mut self, key: ElementKey) -> Option<Element> {
        self.elements.remove(key)
    }

    /// Builds a rectangular wall between two footprint points and registers
    /// its polygon as a new geometry record.
    pub(crate) fn wall_from_segment(
        &mut self,
        start: Point2<f64>,
        end: Point2<f64>,
        bottom: f64,
        top: f64,
        normal: Vector3<f64>,
        category: FaceCategory,
        precision: &Precision,
    ) -> Result<ElementKey> {
        let ring = vec![
            Point3::new(start.x, start.y, bottom),
            Point3::new(end.x, end.y, bottom),
            Point3::new(end.x, end.y, top),
            Point3::new(start.x, start.y, top),
        ];
        self.wall_from_ring(ring, Vec::new(), normal, category, precision)
    }

    /// Registers an arbitrary vertical ring (with holes) as a new wall.
    pub(crate) fn wall_from_ring(
        &mut self,
        ring: Vec<Point3<f64>>,
        holes: Vec<Vec<Point3<f64>>>,
        normal: Vector3<f64>,
        category: FaceCategory,
        precision: &Precision,
    ) -> Result<ElementKey> {
        let geometry = self.include_geometry(None, category, ring, holes, normal)?;
        let record = &mut self.geometries[geometry];
        record.classified = true;
        let wall = Wall::new(
            geometry,
            record.outer.clone(),
            record.area(),
            record.normal,
            category,
            &self.levels,
            precision,
        );
        Ok(self.insert_element(Element::Wall(wall)))
    }

    /// Registers a planar region at `elevation` as a new face on `level`.
    pub(crate) fn face_from_region(
        &mut self,
        region: &Region,
        elevation: f64,
        level: usize,
        category: FaceCategory,
    ) -> Result<ElementKey> {
        let lift = |ring: &[Point2<f64>]| -> Vec<Point3<f64>> {
            ring.iter().map(|p| Point3::new(p.x, p.y, elevation)).collect()
        };
        let outer = lift(&region.outer);
        let holes: Vec<Vec<Point3<f64>>> = region.holes.iter().map(|h| lift(h)).collect();
        let geometry = self.include_geometry(
            None,
            category,
            outer.clone(),
            holes.clone(),
            Vector3::z(),
        )?;
        self.geometries[geometry].classified = true;
        let face = Face::new(geometry, &outer, &holes, category, level);
        Ok(self.insert_element(Element::Face(face)))
    }

    /// Merges wall `absorbed` into wall `target` and drops `absorbed`.
    pub(crate) fn dissolve_wall(
        &mut self,
        target: ElementKey,
        absorbed: ElementKey,
        precision: &Precision,
    ) -> Result<()> {
        if target == absorbed || self.wall(target).is_none() {
            return Err(TopologyError::ElementNotFound(target));
        }
        let other = match self.elements.remove(absorbed) {
            Some(Element::Wall(w)) => w,
            Some(element) => {
                self.elements.insert(element);
                return Err(TopologyError::ElementNotFound(absorbed));
            }
            None => return Err(TopologyError::ElementNotFound(absorbed)),
        };
        let wall = self
            .wall_mut(target)
            .ok_or(TopologyError::ElementNotFound(target))?;
        wall.dissolve(other, precision);
        Ok(())
    }

    // ========================================================================
    // Spaces
    // ========================================================================

    pub fn space(&self, key: SpaceKey) -> Option<&Space> {
        self.spaces.get(key)
    }

    pub fn space_mut(&mut self, key: SpaceKey) -> Option<&mut Space> {
        self.spaces.get_mut(key)
    }

    pub fn spaces(&self) -> impl Iterator<Item = (SpaceKey, &Space)> {
        self.spaces.iter()
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Spaces with a complete floor and ceiling.
    pub fn rooms(&self, precision: &Precision) -> Vec<SpaceKey> {
        self.spaces
            .iter()
            .filter(|(_, s)| !s.is_void(precision))
            .map(|(k, _)| k)
            .collect()
    }

    /// Spaces missing a floor or ceiling.
    pub fn voids(&self, precision: &Precision) -> Vec<SpaceKey> {
        self.spaces
            .iter()
            .filter(|(_, s)| s.is_void(precision))
            .map(|(k, _)| k)
            .collect()
    }

    /// Spaces whose storey range starts at `level`.
    pub fn spaces_on_level(&self, level: usize) -> Vec<SpaceKey> {
        self.spaces
            .iter()
            .filter(|(_, s)| s.level == level)
            .map(|(k, _)| k)
            .collect()
    }

    /// Stores a space under a fresh `sp{n}` id.
    pub(crate) fn insert_space(&mut self, mut space: Space) -> SpaceKey {
        space.id = format!("sp{}", self.next_space_id);
        self.next_space_id += 1;
        space.init_settings();
        self.spaces.insert(space)
    }

    pub(crate) fn remove_space(&mut self, key: SpaceKey) -> Option<Space> {
        self.spaces.remove(key)
    }

    // ========================================================================
    // Traced boundaries
    // ========================================================================

    /// Wall loops per level, as recorded by the last transform.
    pub fn boundaries(&self) -> &[LevelBoundaries] {
        &self.boundaries
    }

    pub fn set_boundaries(&mut self, boundaries: Vec<LevelBoundaries>) {
        self.boundaries = boundaries;
    }
}
