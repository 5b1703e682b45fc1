// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar wall graph of one level.
//!
//! Every qualifying wall contributes one edge between its footprint
//! endpoints. Endpoints within the merge radius become the same node, and
//! dangling stubs are pruned until every node has at least two neighbours.
//! Each node keeps its neighbours sorted by quick angle, which is the order
//! the boundary walk scans them in.

use std::collections::VecDeque;

use floorgraph_geometry::{quick_angle, Point2, Precision};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::arena::ModelRepository;
use crate::element::Element;
use crate::keys::ElementKey;
use crate::spatial::NodeGrid;

/// An adjacent node and the edge leading to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node: usize,
    pub edge: usize,
    /// Quick angle of `neighbour - node`.
    pub angle: f64,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub point: Point2<f64>,
    /// Sorted by ascending angle.
    pub neighbors: SmallVec<[Neighbor; 4]>,
}

impl Node {
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// One wall segment between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEdge {
    pub wall: ElementKey,
    pub nodes: [usize; 2],
}

impl NetworkEdge {
    pub fn other(&self, node: usize) -> usize {
        if self.nodes[0] == node {
            self.nodes[1]
        } else {
            self.nodes[0]
        }
    }
}

/// The node/edge graph of a level.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub level: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<NetworkEdge>,
}

/// A connected component of a [`Network`], as global node and edge indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subnetwork {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
}

impl Network {
    /// Builds the graph from the walls on `level` that are taller than
    /// `min_wall_height` and project to a segment.
    pub fn from_level(repo: &ModelRepository, level: usize, precision: &Precision) -> Self {
        let segments: Vec<(ElementKey, Point2<f64>, Point2<f64>)> = repo
            .elements()
            .filter_map(|(key, element)| match element {
                Element::Wall(w) if w.level == level && w.height() > precision.min_wall_height => {
                    w.segment().map(|(a, b)| (key, a, b))
                }
                _ => None,
            })
            .collect();
        Self::from_segments(level, &segments, precision)
    }

    /// Builds the graph from raw wall segments.
    pub fn from_segments(
        level: usize,
        segments: &[(ElementKey, Point2<f64>, Point2<f64>)],
        precision: &Precision,
    ) -> Self {
        let radius = precision.merge_radius();
        let mut grid = NodeGrid::new(radius);
        let mut edges: Vec<NetworkEdge> = Vec::with_capacity(segments.len());
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();

        for &(wall, a, b) in segments {
            if (b - a).norm() < precision.point {
                continue;
            }
            let na = grid.find_or_insert(a, radius);
            let nb = grid.find_or_insert(b, radius);
            if na == nb {
                continue;
            }
            if !seen.insert((na.min(nb), na.max(nb))) {
                continue;
            }
            edges.push(NetworkEdge {
                wall,
                nodes: [na, nb],
            });
        }

        prune_dangling(&mut edges, grid.len());

        // Compact node indices in order of first use.
        let points = grid.into_points();
        let mut remap: Vec<Option<usize>> = vec![None; points.len()];
        let mut nodes: Vec<Node> = Vec::new();
        for edge in &mut edges {
            for n in edge.nodes.iter_mut() {
                let old = *n;
                *n = *remap[old].get_or_insert_with(|| {
                    nodes.push(Node {
                        point: points[old],
                        neighbors: SmallVec::new(),
                    });
                    nodes.len() - 1
                });
            }
        }

        for (e, edge) in edges.iter().enumerate() {
            let [a, b] = edge.nodes;
            let (pa, pb) = (nodes[a].point, nodes[b].point);
            nodes[a].neighbors.push(Neighbor {
                node: b,
                edge: e,
                angle: quick_angle(&(pb - pa)).unwrap_or_default(),
            });
            nodes[b].neighbors.push(Neighbor {
                node: a,
                edge: e,
                angle: quick_angle(&(pa - pb)).unwrap_or_default(),
            });
        }
        for node in &mut nodes {
            node.neighbors.sort_by(|x, y| x.angle.total_cmp(&y.angle));
        }

        Self {
            level,
            nodes,
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn point(&self, node: usize) -> Point2<f64> {
        self.nodes[node].point
    }

    /// Edge joining two adjacent nodes.
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.nodes
            .get(a)?
            .neighbors
            .iter()
            .find(|n| n.node == b)
            .map(|n| n.edge)
    }

    /// Midpoint of an edge.
    pub fn midpoint(&self, edge: usize) -> Point2<f64> {
        let [a, b] = self.edges[edge].nodes;
        Point2::from((self.point(a).coords + self.point(b).coords) * 0.5)
    }

    /// Breadth-first connected components over nodes with more than one
    /// neighbour.
    pub fn split(&self) -> Vec<Subnetwork> {
        let mut visited = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if visited[start] || self.nodes[start].degree() < 2 {
                continue;
            }
            let mut nodes = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(n) = queue.pop_front() {
                nodes.push(n);
                for nb in &self.nodes[n].neighbors {
                    if !visited[nb.node] && self.nodes[nb.node].degree() > 1 {
                        visited[nb.node] = true;
                        queue.push_back(nb.node);
                    }
                }
            }
            nodes.sort_unstable();

            let members: FxHashSet<usize> = nodes.iter().copied().collect();
            let edges = self
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| members.contains(&e.nodes[0]) && members.contains(&e.nodes[1]))
                .map(|(i, _)| i)
                .collect();
            components.push(Subnetwork { nodes, edges });
        }
        components
    }
}

/// Removes edges touching a node of degree < 2 until none are left.
fn prune_dangling(edges: &mut Vec<NetworkEdge>, node_count: usize) {
    loop {
        let mut degree = vec![0usize; node_count];
        for edge in edges.iter() {
            degree[edge.nodes[0]] += 1;
            degree[edge.nodes[1]] += 1;
        }
        let before = edges.len();
        edges.retain(|e| degree[e.nodes[0]] >= 2 && degree[e.nodes[1]] >= 2);
        if edges.len() == before {
            break;
        }
    }
}
