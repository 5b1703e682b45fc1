// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serializable snapshot of a reconstructed model.
//!
//! Exporters read levels, wall loops, elements and spaces from here instead
//! of walking the repository. Elements are named by the id of their first geometry
//! record and spaces by their `sp{n}` id.

use floorgraph_geometry::polygon::area;
use floorgraph_geometry::{Point2, Precision};
use floorgraph_topology::{
    Element, ElementKey, ElementKind, Floor, ModelRepository, Space, SpaceKey,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Level elevations, ascending.
    pub levels: Vec<f64>,
    pub boundaries: Vec<LoopSummary>,
    pub elements: Vec<ElementSummary>,
    pub spaces: Vec<SpaceSummary>,
}

/// One classified element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub id: String,
    pub kind: ElementKind,
    pub level: usize,
    /// Not shared by two spaces.
    pub exterior: bool,
    pub edge_neighbors: Vec<String>,
}

/// One traced wall loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSummary {
    pub level: usize,
    pub walls: Vec<String>,
    pub outline: Vec<[f64; 2]>,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborSummary {
    pub space: String,
    pub elements: Vec<String>,
    pub vertical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub id: String,
    pub level: usize,
    pub top_level: usize,
    pub is_void: bool,
    /// Net area (outline minus voids).
    pub area: f64,
    pub outline: Vec<[f64; 2]>,
    pub walls: Vec<String>,
    pub floor: Vec<String>,
    pub ceiling: Vec<String>,
    pub voids: Vec<String>,
    pub neighbors: Vec<NeighborSummary>,
    pub settings: Map<String, Value>,
}

impl ModelSummary {
    pub fn from_repository(repo: &ModelRepository, precision: &Precision) -> Self {
        let space_ids: FxHashMap<SpaceKey, String> =
            repo.spaces().map(|(k, s)| (k, s.id.clone())).collect();
        let names = Names { repo, space_ids };

        let boundaries = repo
            .boundaries()
            .iter()
            .flat_map(|b| b.loops.iter())
            .map(|l| LoopSummary {
                level: l.level,
                walls: names.elements(&l.walls),
                outline: coordinates(&l.outline),
                area: area(&l.outline),
            })
            .collect();

        let mut elements: Vec<ElementSummary> = repo
            .elements()
            .filter_map(|(k, e)| names.summarize(k, e))
            .collect();
        elements.sort_by(|a, b| (a.level, a.id.len(), &a.id).cmp(&(b.level, b.id.len(), &b.id)));

        let mut spaces: Vec<SpaceSummary> = repo
            .spaces()
            .map(|(_, s)| names.space(s, precision))
            .collect();
        spaces.sort_by(|a, b| (a.level, a.id.len(), &a.id).cmp(&(b.level, b.id.len(), &b.id)));

        Self {
            levels: repo.levels().to_vec(),
            boundaries,
            elements,
            spaces,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct Names<'a> {
    repo: &'a ModelRepository,
    space_ids: FxHashMap<SpaceKey, String>,
}

impl Names<'_> {
    fn element(&self, key: ElementKey) -> Option<String> {
        let element = self.repo.element(key)?;
        let geometry = *element.geometries().first()?;
        Some(self.repo.geometry(geometry)?.id.clone())
    }

    fn elements(&self, keys: &[ElementKey]) -> Vec<String> {
        keys.iter().filter_map(|&k| self.element(k)).collect()
    }

    fn summarize(&self, key: ElementKey, element: &Element) -> Option<ElementSummary> {
        Some(ElementSummary {
            id: self.element(key)?,
            kind: element.kind(),
            level: element.level(),
            exterior: element.exterior(),
            edge_neighbors: self.elements(element.edge_neighbors()),
        })
    }

    fn spaces(&self, keys: &[SpaceKey]) -> Vec<String> {
        keys.iter().filter_map(|k| self.space_ids.get(k).cloned()).collect()
    }

    fn space(&self, space: &Space, precision: &Precision) -> SpaceSummary {
        let faces = |cap: &Option<Floor>| {
            cap.as_ref().map(|c| self.elements(&c.faces)).unwrap_or_default()
        };
        SpaceSummary {
            id: space.id.clone(),
            level: space.level,
            top_level: space.top_level,
            is_void: space.is_void(precision),
            area: space.area(),
            outline: coordinates(&space.outline),
            walls: self.elements(&space.walls),
            floor: faces(&space.floor),
            ceiling: faces(&space.ceiling),
            voids: self.spaces(&space.voids),
            neighbors: space
                .neighbors
                .iter()
                .filter_map(|n| {
                    Some(NeighborSummary {
                        space: self.space_ids.get(&n.space)?.clone(),
                        elements: self.elements(&n.elements),
                        vertical: n.vertical,
                    })
                })
                .collect(),
            settings: space.settings.clone(),
        }
    }
}

fn coordinates(ring: &[Point2<f64>]) -> Vec<[f64; 2]> {
    ring.iter().map(|p| [p.x, p.y]).collect()
}
