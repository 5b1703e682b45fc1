// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rooms and voids.
//!
//! A [`Space`] is one traced outline with the horizontal faces found under
//! it (floor) and over it (ceiling). A space whose floor or ceiling is
//! missing, or covers less than its net area, is a void.

use floorgraph_geometry::polygon::area;
use floorgraph_geometry::{Point2, Precision, Region};
use serde_json::{Map, Value};

use crate::keys::{ElementKey, SpaceKey};

/// Horizontal faces capping a space, and how much of the outline they cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Floor {
    pub faces: Vec<ElementKey>,
    pub area: f64,
}

impl Floor {
    /// Covers the net area of `space` up to the area tolerance.
    pub fn covers(&self, space: &Space, precision: &Precision) -> bool {
        self.area >= space.area() - precision.area
    }
}

/// Another space reached through shared elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceNeighbor {
    pub space: SpaceKey,
    /// Walls (horizontal neighbours) or faces (vertical neighbours) between
    /// the two spaces.
    pub elements: Vec<ElementKey>,
    pub vertical: bool,
}

#[derive(Debug, Clone)]
pub struct Space {
    pub id: String,
    pub level: usize,
    /// Level of the ceiling; above `level` for stacked voids.
    pub top_level: usize,
    /// Bounding walls, counter-clockwise.
    pub walls: Vec<ElementKey>,
    /// Open ring, counter-clockwise.
    pub outline: Vec<Point2<f64>>,
    pub floor: Option<Floor>,
    pub ceiling: Option<Floor>,
    pub voids: Vec<SpaceKey>,
    /// Outline area of the attached voids.
    pub void_area: f64,
    pub neighbors: Vec<SpaceNeighbor>,
    /// Free-form data written by downstream consumers.
    pub settings: Map<String, Value>,
}

impl Space {
    pub fn new(level: usize, walls: Vec<ElementKey>, outline: Vec<Point2<f64>>) -> Self {
        Self {
            id: String::new(),
            level,
            top_level: level + 1,
            walls,
            outline,
            floor: None,
            ceiling: None,
            voids: Vec::new(),
            void_area: 0.0,
            neighbors: Vec::new(),
            settings: Map::new(),
        }
    }

    /// Area enclosed by the outline.
    pub fn outline_area(&self) -> f64 {
        area(&self.outline)
    }

    /// Outline area minus the attached voids.
    pub fn area(&self) -> f64 {
        (self.outline_area() - self.void_area).max(0.0)
    }

    pub fn region(&self) -> Region {
        Region::simple(self.outline.clone())
    }

    /// Missing or short floor or ceiling.
    pub fn is_void(&self, precision: &Precision) -> bool {
        match (&self.floor, &self.ceiling) {
            (Some(floor), Some(ceiling)) => {
                !floor.covers(self, precision) || !ceiling.covers(self, precision)
            }
            _ => true,
        }
    }

    /// Floor covering the outline, whatever happens above.
    pub fn has_full_floor(&self, precision: &Precision) -> bool {
        self.floor.as_ref().is_some_and(|f| f.covers(self, precision))
    }

    pub fn has_full_ceiling(&self, precision: &Precision) -> bool {
        self.ceiling.as_ref().is_some_and(|c| c.covers(self, precision))
    }

    /// Records `element` as shared with `other`.
    pub fn add_neighbor(&mut self, other: SpaceKey, element: ElementKey, vertical: bool) {
        match self
            .neighbors
            .iter_mut()
            .find(|n| n.space == other && n.vertical == vertical)
        {
            Some(n) => {
                if !n.elements.contains(&element) {
                    n.elements.push(element);
                }
            }
            None => self.neighbors.push(SpaceNeighbor {
                space: other,
                elements: vec![element],
                vertical,
            }),
        }
    }

    /// Seeds the settings map with the zone entries every consumer expects.
    pub(crate) fn init_settings(&mut self) {
        self.settings
            .insert("zone_name".to_string(), Value::String(self.id.clone()));
        for key in ["zone_summerrad", "zone_winterrad", "zone_template"] {
            self.settings.insert(key.to_string(), Value::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    fn cap(area: f64) -> Option<Floor> {
        Some(Floor {
            faces: Vec::new(),
            area,
        })
    }

    #[test]
    fn test_void_rules() {
        let p = Precision::default();
        let mut space = Space::new(0, Vec::new(), square(10.0));
        assert!(space.is_void(&p));

        space.floor = cap(100.0);
        space.ceiling = cap(99.5);
        assert!(!space.is_void(&p));

        space.ceiling = cap(96.0);
        assert!(space.is_void(&p));

        // A 2 x 2 void inside brings the net area down to the ceiling.
        space.void_area = 4.0;
        assert_relative_eq!(space.area(), 96.0);
        assert!(!space.is_void(&p));
    }

    #[test]
    fn test_neighbors_accumulate() {
        let mut keys: slotmap::SlotMap<SpaceKey, ()> = slotmap::SlotMap::with_key();
        let other = keys.insert(());
        let walls = crate::network::tests::keys(2);

        let mut space = Space::new(0, Vec::new(), square(3.0));
        space.add_neighbor(other, walls[0], false);
        space.add_neighbor(other, walls[1], false);
        space.add_neighbor(other, walls[1], false);
        space.add_neighbor(other, walls[0], true);
        assert_eq!(space.neighbors.len(), 2);
        assert_eq!(space.neighbors[0].elements.len(), 2);
    }

    #[test]
    fn test_settings_seeded() {
        let mut space = Space::new(0, Vec::new(), square(3.0));
        space.id = "sp0".to_string();
        space.init_settings();
        assert_eq!(space.settings["zone_name"], Value::String("sp0".into()));
        assert!(space.settings["zone_template"].is_null());
    }
}
