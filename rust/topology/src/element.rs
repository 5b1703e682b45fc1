// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building elements derived from raw geometry.
//!
//! Vertical polygons become [`Wall`]s (opaque or air boundary) or glazings,
//! horizontal polygons become [`Face`]s or skylights. All four live in one
//! arena as variants of [`Element`]; the shared operations are exposed
//! through the [`ElementGeometry`] capability trait.

use floorgraph_geometry::polygon::area_3d;
use floorgraph_geometry::{Point2, Point3, Precision, Region, Vector2, Vector3};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::keys::{ElementKey, ElementKind, GeometryKey, SpaceKey};

/// Quantized 3D vertex, hashed for exact edge matching.
pub type GridPoint = (i64, i64, i64);

/// Unordered pair of quantized vertices.
pub type GridEdge = (GridPoint, GridPoint);

/// What a raw polygon represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceCategory {
    Opaque,
    Glazing,
    AirBoundary,
}

/// Planar shadow of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Point(Point2<f64>),
    Segment(Point2<f64>, Point2<f64>),
    Area(Region),
}

impl Footprint {
    pub fn segment(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        match self {
            Footprint::Segment(a, b) => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Why a wall cannot take part in topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// Footprint collapsed to a point.
    ZeroDimension,
    /// Footprint shorter than the point tolerance.
    ShortLength,
    /// Surface area below the squared point tolerance.
    TinyArea,
    /// Top and bottom coincide.
    ZeroHeight,
}

impl Validity {
    /// Degenerate walls that may still be absorbed by a neighbour.
    pub fn dissolvable(self) -> bool {
        matches!(
            self,
            Validity::ZeroDimension | Validity::ShortLength | Validity::TinyArea
        )
    }
}

/// Shared operations of every element variant.
pub trait ElementGeometry {
    /// Planar projection used by the topology stages.
    fn force_2d(&self) -> Footprint;

    /// 3D rings of the element, outer rings before holes.
    fn representation(&self) -> Vec<Vec<Point3<f64>>>;

    /// Quantized ring edges of the representation, each listed once.
    fn grid_edges(&self, precision: &Precision) -> FxHashSet<GridEdge> {
        let mut edges = FxHashSet::default();
        for ring in self.representation() {
            let n = ring.len();
            for i in 0..n {
                let a = precision.grid_key3(&ring[i]);
                let b = precision.grid_key3(&ring[(i + 1) % n]);
                if a != b {
                    edges.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        edges
    }

    /// Absorbs `other`: geometry, apertures and vertical bounds.
    fn dissolve(&mut self, other: Self, precision: &Precision)
    where
        Self: Sized;
}

/// A vertical element. Glazings reuse this type.
#[derive(Debug, Clone)]
pub struct Wall {
    pub geometries: SmallVec<[GeometryKey; 2]>,
    /// Outer ring of every geometry merged into this wall.
    pub outlines: Vec<Vec<Point3<f64>>>,
    pub normal: Vector3<f64>,
    pub category: FaceCategory,
    pub level: usize,
    pub top_level: usize,
    pub bottom: f64,
    pub top: f64,
    pub area: f64,
    pub footprint: Footprint,
    pub apertures: Vec<ElementKey>,
    pub spaces: Vec<SpaceKey>,
    /// Cleared once two spaces share the wall.
    pub exterior: bool,
    /// Elements sharing a ring edge with this one.
    pub edge_neighbors: Vec<ElementKey>,
}

impl Wall {
    /// `area` is the net surface area (holes already subtracted).
    pub fn new(
        geometry: GeometryKey,
        outline: Vec<Point3<f64>>,
        area: f64,
        normal: Vector3<f64>,
        category: FaceCategory,
        levels: &[f64],
        precision: &Precision,
    ) -> Self {
        let mut wall = Self {
            geometries: smallvec![geometry],
            outlines: vec![outline],
            normal,
            category,
            level: 0,
            top_level: 0,
            bottom: 0.0,
            top: 0.0,
            area,
            footprint: Footprint::Point(Point2::origin()),
            apertures: Vec::new(),
            spaces: Vec::new(),
            exterior: true,
            edge_neighbors: Vec::new(),
        };
        wall.refresh(precision);
        wall.assign_levels(levels, precision);
        wall
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn segment(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        self.footprint.segment()
    }

    pub fn length(&self) -> f64 {
        self.segment().map_or(0.0, |(a, b)| (b - a).norm())
    }

    /// Direction of the footprint, if it is a segment.
    pub fn direction(&self) -> Option<Vector2<f64>> {
        self.segment().map(|(a, b)| b - a)
    }

    pub fn is_air_boundary(&self) -> bool {
        self.category == FaceCategory::AirBoundary
    }

    /// Recomputes vertical bounds and footprint from the outlines.
    pub(crate) fn refresh(&mut self, precision: &Precision) {
        let zs = self.outlines.iter().flatten().map(|p| p.z);
        self.bottom = zs.clone().fold(f64::INFINITY, f64::min);
        self.top = zs.fold(f64::NEG_INFINITY, f64::max);
        self.footprint = wall_footprint(&self.outlines, &self.normal, precision);
    }

    /// Re-derives `level`/`top_level` from the elevations in `levels`.
    pub(crate) fn assign_levels(&mut self, levels: &[f64], precision: &Precision) {
        let (level, top_level) = crate::levels::level_span(self.bottom, self.top, levels, precision);
        self.level = level;
        self.top_level = top_level;
    }

    pub fn validity(&self, precision: &Precision) -> Validity {
        match self.footprint {
            Footprint::Point(_) | Footprint::Area(_) => return Validity::ZeroDimension,
            Footprint::Segment(a, b) if (b - a).norm() < precision.point => {
                return Validity::ShortLength
            }
            _ => {}
        }
        if self.height() < precision.point {
            return Validity::ZeroHeight;
        }
        if self.area < precision.point * precision.point {
            return Validity::TinyArea;
        }
        Validity::Valid
    }

    /// Quantized vertices of all outlines.
    pub fn grid_points(&self, precision: &Precision) -> FxHashSet<GridPoint> {
        self.outlines
            .iter()
            .flatten()
            .map(|p| precision.grid_key3(p))
            .collect()
    }

    /// Two walls share an edge when at least two snapped vertices coincide.
    pub fn shares_edge(&self, other: &Wall, precision: &Precision) -> bool {
        let mine = self.grid_points(precision);
        other
            .grid_points(precision)
            .iter()
            .filter(|p| mine.contains(p))
            .take(2)
            .count()
            >= 2
    }
}

impl ElementGeometry for Wall {
    fn force_2d(&self) -> Footprint {
        self.footprint.clone()
    }

    fn representation(&self) -> Vec<Vec<Point3<f64>>> {
        self.outlines.clone()
    }

    fn dissolve(&mut self, other: Self, precision: &Precision) {
        if other.bottom < self.bottom {
            self.level = other.level;
        }
        if other.top > self.top {
            self.top_level = other.top_level;
        }
        self.geometries.extend(other.geometries);
        self.outlines.extend(other.outlines);
        self.area += other.area;
        for key in other.apertures {
            if !self.apertures.contains(&key) {
                self.apertures.push(key);
            }
        }
        if other.category == FaceCategory::Opaque {
            self.category = FaceCategory::Opaque;
        }
        self.refresh(precision);
    }
}

/// Extreme points of the outlines along the wall's horizontal direction.
fn wall_footprint(
    outlines: &[Vec<Point3<f64>>],
    normal: &Vector3<f64>,
    precision: &Precision,
) -> Footprint {
    let mut along = Vector2::new(-normal.y, normal.x);
    if along.norm() < 1e-9 {
        along = Vector2::x();
    }
    let along = along.normalize();

    let mut lo: Option<(f64, Point2<f64>)> = None;
    let mut hi: Option<(f64, Point2<f64>)> = None;
    for p in outlines.iter().flatten() {
        let q = Point2::new(p.x, p.y);
        let t = q.coords.dot(&along);
        if lo.map_or(true, |(lt, _)| t < lt) {
            lo = Some((t, q));
        }
        if hi.map_or(true, |(ht, _)| t > ht) {
            hi = Some((t, q));
        }
    }
    match (lo, hi) {
        (Some((_, a)), Some((_, b))) => {
            let (a, b) = (precision.snap_point2(&a), precision.snap_point2(&b));
            if (b - a).norm() < 1e-9 {
                Footprint::Point(a)
            } else {
                Footprint::Segment(a, b)
            }
        }
        _ => Footprint::Point(Point2::origin()),
    }
}

/// A horizontal element. Skylights reuse this type.
#[derive(Debug, Clone)]
pub struct Face {
    pub geometry: GeometryKey,
    pub category: FaceCategory,
    /// XY projection, outer ring counter-clockwise.
    pub region: Region,
    pub elevation: f64,
    pub level: usize,
    pub apertures: Vec<ElementKey>,
    /// Cleared once the face is both a ceiling and a floor.
    pub exterior: bool,
    pub edge_neighbors: Vec<ElementKey>,
}

impl Face {
    pub fn new(
        geometry: GeometryKey,
        outer: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        category: FaceCategory,
        level: usize,
    ) -> Self {
        let flat = |ring: &[Point3<f64>]| -> Vec<Point2<f64>> {
            ring.iter().map(|p| Point2::new(p.x, p.y)).collect()
        };
        let mut outer_2d = flat(outer);
        if floorgraph_geometry::polygon::signed_area(&outer_2d) < 0.0 {
            outer_2d.reverse();
        }
        let elevation = if outer.is_empty() {
            0.0
        } else {
            outer.iter().map(|p| p.z).sum::<f64>() / outer.len() as f64
        };
        Self {
            geometry,
            category,
            region: Region::new(outer_2d, holes.iter().map(|h| flat(h)).collect()),
            elevation,
            level,
            apertures: Vec::new(),
            exterior: true,
            edge_neighbors: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.region.area()
    }
}

impl ElementGeometry for Face {
    fn force_2d(&self) -> Footprint {
        Footprint::Area(self.region.clone())
    }

    fn representation(&self) -> Vec<Vec<Point3<f64>>> {
        let lift = |ring: &Vec<Point2<f64>>| -> Vec<Point3<f64>> {
            ring.iter().map(|p| Point3::new(p.x, p.y, self.elevation)).collect()
        };
        std::iter::once(&self.region.outer)
            .chain(&self.region.holes)
            .map(lift)
            .collect()
    }

    fn dissolve(&mut self, other: Self, _precision: &Precision) {
        self.elevation = self.elevation.max(other.elevation);
        for key in other.apertures {
            if !self.apertures.contains(&key) {
                self.apertures.push(key);
            }
        }
    }
}

/// A classified building element.
#[derive(Debug, Clone)]
pub enum Element {
    Face(Face),
    Wall(Wall),
    Glazing(Wall),
    Skylight(Face),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Face(_) => ElementKind::Face,
            Element::Wall(_) => ElementKind::Wall,
            Element::Glazing(_) => ElementKind::Glazing,
            Element::Skylight(_) => ElementKind::Skylight,
        }
    }

    pub fn level(&self) -> usize {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.level,
            Element::Wall(w) | Element::Glazing(w) => w.level,
        }
    }

    /// Wall data of a wall or glazing.
    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Element::Wall(w) | Element::Glazing(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_wall_mut(&mut self) -> Option<&mut Wall> {
        match self {
            Element::Wall(w) | Element::Glazing(w) => Some(w),
            _ => None,
        }
    }

    /// Face data of a face or skylight.
    pub fn as_face(&self) -> Option<&Face> {
        match self {
            Element::Face(f) | Element::Skylight(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_face_mut(&mut self) -> Option<&mut Face> {
        match self {
            Element::Face(f) | Element::Skylight(f) => Some(f),
            _ => None,
        }
    }

    pub fn geometries(&self) -> SmallVec<[GeometryKey; 2]> {
        match self {
            Element::Face(f) | Element::Skylight(f) => smallvec![f.geometry],
            Element::Wall(w) | Element::Glazing(w) => w.geometries.clone(),
        }
    }

    pub fn force_2d(&self) -> Footprint {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.force_2d(),
            Element::Wall(w) | Element::Glazing(w) => w.force_2d(),
        }
    }

    pub fn grid_edges(&self, precision: &Precision) -> FxHashSet<GridEdge> {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.grid_edges(precision),
            Element::Wall(w) | Element::Glazing(w) => w.grid_edges(precision),
        }
    }

    pub fn exterior(&self) -> bool {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.exterior,
            Element::Wall(w) | Element::Glazing(w) => w.exterior,
        }
    }

    pub fn edge_neighbors(&self) -> &[ElementKey] {
        match self {
            Element::Face(f) | Element::Skylight(f) => &f.edge_neighbors,
            Element::Wall(w) | Element::Glazing(w) => &w.edge_neighbors,
        }
    }

    pub(crate) fn set_exterior(&mut self, exterior: bool) {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.exterior = exterior,
            Element::Wall(w) | Element::Glazing(w) => w.exterior = exterior,
        }
    }

    pub(crate) fn set_edge_neighbors(&mut self, keys: Vec<ElementKey>) {
        match self {
            Element::Face(f) | Element::Skylight(f) => f.edge_neighbors = keys,
            Element::Wall(w) | Element::Glazing(w) => w.edge_neighbors = keys,
        }
    }

    /// Hosted glazings or skylights.
    pub fn apertures(&self) -> &[ElementKey] {
        match self {
            Element::Face(f) | Element::Skylight(f) => &f.apertures,
            Element::Wall(w) | Element::Glazing(w) => &w.apertures,
        }
    }
}

/// Net area of a polygon with holes in 3D.
pub(crate) fn net_area_3d(outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> f64 {
    let holes: f64 = holes.iter().map(|h| area_3d(h)).sum();
    (area_3d(outer) - holes).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn key() -> GeometryKey {
        let mut map: SlotMap<GeometryKey, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn rect_wall(x0: f64, x1: f64, y: f64, z0: f64, z1: f64) -> Wall {
        let ring = vec![
            Point3::new(x0, y, z0),
            Point3::new(x1, y, z0),
            Point3::new(x1, y, z1),
            Point3::new(x0, y, z1),
        ];
        let area = area_3d(&ring);
        Wall::new(
            key(),
            ring,
            area,
            Vector3::new(0.0, -1.0, 0.0),
            FaceCategory::Opaque,
            &[0.0, 3.0],
            &Precision::default(),
        )
    }

    #[test]
    fn test_wall_footprint_and_bounds() {
        let wall = rect_wall(0.0, 4.0, 1.0, 0.0, 3.0);
        let (a, b) = wall.segment().unwrap();
        assert_relative_eq!(a, Point2::new(0.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(b, Point2::new(4.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(wall.height(), 3.0);
        assert_eq!((wall.level, wall.top_level), (0, 1));
        assert_eq!(wall.validity(&Precision::default()), Validity::Valid);
    }

    #[test]
    fn test_wall_validity_codes() {
        let p = Precision::default();
        // Snapping collapses a 2 cm wall onto a single grid point.
        assert_eq!(rect_wall(0.0, 0.02, 0.0, 0.0, 3.0).validity(&p), Validity::ZeroDimension);
        assert!(Validity::TinyArea.dissolvable());
        assert!(!Validity::ZeroHeight.dissolvable());
    }

    #[test]
    fn test_flat_wall_has_zero_height() {
        let p = Precision::default();
        let flat = rect_wall(0.0, 4.0, 0.0, 1.0, 1.0);
        assert_eq!(flat.validity(&p), Validity::ZeroHeight);
        // Below the point tolerance counts as flat too.
        assert_eq!(rect_wall(0.0, 4.0, 0.0, 1.0, 1.02).validity(&p), Validity::ZeroHeight);
        assert_eq!(rect_wall(0.0, 4.0, 0.0, 1.0, 1.5).validity(&p), Validity::Valid);
    }

    #[test]
    fn test_tiny_area_wall() {
        let p = Precision::default();
        let mut wall = rect_wall(0.0, 4.0, 0.0, 0.0, 3.0);
        wall.area = 1e-4;
        assert_eq!(wall.validity(&p), Validity::TinyArea);
    }

    #[test]
    fn test_wall_dissolve_extends_bounds() {
        let p = Precision::default();
        let mut low = rect_wall(0.0, 2.0, 0.0, 0.0, 1.5);
        let high = rect_wall(0.0, 2.0, 0.0, 1.5, 3.0);
        assert!(low.shares_edge(&high, &p));
        low.dissolve(high, &p);
        assert_relative_eq!(low.height(), 3.0);
        assert_eq!(low.geometries.len(), 2);
        assert_relative_eq!(low.area, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_edges_deduplicate_orientation() {
        let p = Precision::default();
        let wall = rect_wall(0.0, 2.0, 0.0, 0.0, 3.0);
        assert_eq!(wall.grid_edges(&p).len(), 4);
    }

    #[test]
    fn test_face_representation_includes_holes() {
        let p = Precision::default();
        let outer = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(4.0, 0.0, 3.0),
            Point3::new(4.0, 4.0, 3.0),
            Point3::new(0.0, 4.0, 3.0),
        ];
        let hole = vec![
            Point3::new(1.0, 1.0, 3.0),
            Point3::new(2.0, 1.0, 3.0),
            Point3::new(2.0, 2.0, 3.0),
            Point3::new(1.0, 2.0, 3.0),
        ];
        let face = Face::new(key(), &outer, &[hole], FaceCategory::Opaque, 1);
        let rings = face.representation();
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().flatten().all(|q| (q.z - 3.0).abs() < 1e-9));
        assert_eq!(face.grid_edges(&p).len(), 8);
    }

    #[test]
    fn test_face_orients_region() {
        let outer = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 2.0, 3.0),
            Point3::new(2.0, 2.0, 3.0),
            Point3::new(2.0, 0.0, 3.0),
        ];
        let face = Face::new(key(), &outer, &[], FaceCategory::Opaque, 1);
        assert!(floorgraph_geometry::polygon::is_ccw(&face.region.outer));
        assert_relative_eq!(face.area(), 4.0);
        assert_relative_eq!(face.elevation, 3.0);
        assert!(matches!(face.force_2d(), Footprint::Area(_)));
    }
}
