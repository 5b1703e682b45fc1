// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outer boundary tracing.
//!
//! The walk starts at the right-most (then lowest) node and keeps turning to
//! the first neighbour whose quick angle exceeds that of the reversed
//! incoming edge. Neighbour lists are sorted by ascending quick angle, which
//! sweeps clockwise, so the walk hugs the outside of the component.

use std::time::Instant;

use floorgraph_geometry::{quick_angle, Point2, Precision};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::arena::ModelRepository;
use crate::boundary::Boundary;
use crate::error::{Result, TopologyError};
use crate::keys::ElementKey;
use crate::network::{Network, Subnetwork};
use crate::subdivide::subdivide;

/// A traced room outline on one level, as the walls along it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoop {
    pub level: usize,
    /// One wall per outline edge, in counter-clockwise order.
    pub walls: Vec<ElementKey>,
    /// Open ring, counter-clockwise.
    pub outline: Vec<Point2<f64>>,
}

impl BoundaryLoop {
    pub fn area(&self) -> f64 {
        floorgraph_geometry::polygon::area(&self.outline)
    }
}

/// Walks the outside of a connected component.
///
/// Self-intersecting walks come back as several simple loops; the piece
/// holding the start node is last. Components with fewer than three nodes
/// have no outline.
pub fn outer_boundary(
    network: &Network,
    sub: &Subnetwork,
    precision: &Precision,
) -> Result<Vec<Boundary>> {
    if sub.nodes.len() < 3 {
        return Ok(Vec::new());
    }
    let start = sub
        .nodes
        .iter()
        .copied()
        .max_by(|&a, &b| {
            let (pa, pb) = (network.point(a), network.point(b));
            pa.x.total_cmp(&pb.x).then(pb.y.total_cmp(&pa.y))
        })
        .ok_or(TopologyError::DegenerateBoundary(0))?;

    let first = network.nodes[start]
        .neighbors
        .first()
        .ok_or(TopologyError::DegenerateBoundary(1))?
        .node;
    let mut bound = vec![start, first];
    // Last choice made at each node, so a revisit tries another exit.
    let mut memo: FxHashMap<usize, usize> = FxHashMap::default();

    while bound[bound.len() - 1] != start {
        let cur = bound[bound.len() - 1];
        let prev = bound[bound.len() - 2];
        let neighbors = &network.nodes[cur].neighbors;
        let incoming = quick_angle(&(network.point(prev) - network.point(cur))).unwrap_or_default();

        let mut next = match neighbors.as_slice() {
            [a, b, ..] if a.node == prev => b.node,
            [a, ..] => a.node,
            [] => return Err(TopologyError::DisconnectedPath(prev, cur)),
        };
        for nb in neighbors.iter().filter(|nb| nb.node != prev) {
            if nb.angle > incoming {
                if memo.get(&cur) == Some(&nb.node) {
                    continue;
                }
                next = nb.node;
                memo.insert(cur, next);
                break;
            }
        }

        bound.push(next);
        if bound.len() > precision.walk_iteration_cap {
            return Err(TopologyError::WalkDiverged(precision.walk_iteration_cap));
        }
    }

    Ok(Boundary::new(bound).self_intersect())
}

/// Outer boundary of a component, subdivided until no edge of the component
/// is left inside a loop.
pub fn trace_subnetwork(
    network: &Network,
    sub: &Subnetwork,
    precision: &Precision,
) -> Result<Vec<Boundary>> {
    let outer = outer_boundary(network, sub, precision)?;
    Ok(subdivide(network, sub, outer, precision))
}

/// Traces every room outline on `level`.
///
/// Components whose walk fails are dropped with a warning; so are loops
/// that do not map back onto at least three walls.
pub fn trace_level(repo: &ModelRepository, level: usize, precision: &Precision) -> Vec<BoundaryLoop> {
    let started = Instant::now();
    let network = Network::from_level(repo, level, precision);
    if network.is_empty() {
        debug!(level, "no walls to trace");
        return Vec::new();
    }

    let components = network.split();
    let mut loops = Vec::new();
    for sub in &components {
        let boundaries = match trace_subnetwork(&network, sub, precision) {
            Ok(b) => b,
            Err(e) => {
                warn!(level, nodes = sub.nodes.len(), error = %e, "subnetwork abandoned");
                continue;
            }
        };
        for boundary in boundaries {
            match to_loop(&network, &boundary) {
                Ok(l) => loops.push(l),
                Err(e) => warn!(level, error = %e, "boundary skipped"),
            }
        }
    }

    debug!(
        level,
        nodes = network.nodes.len(),
        edges = network.edges.len(),
        components = components.len(),
        boundaries = loops.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "level traced"
    );
    loops
}

fn to_loop(network: &Network, boundary: &Boundary) -> Result<BoundaryLoop> {
    let edges = boundary.edges(network)?;
    if edges.len() < 3 {
        return Err(TopologyError::DegenerateBoundary(edges.len()));
    }
    Ok(BoundaryLoop {
        level: network.level,
        walls: edges.iter().map(|&e| network.edges[e].wall).collect(),
        outline: boundary.polygon(network),
    })
}
