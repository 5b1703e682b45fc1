// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive subdivision of traced outlines.
//!
//! An outer outline may still enclose partitions of its component. Each pass
//! picks, per loop, one component edge whose midpoint lies inside it, finds
//! paths from both ends of that edge back to the loop, and cuts the loop
//! along the resulting chord. Passes repeat while they consume edges.

use std::collections::VecDeque;

use floorgraph_geometry::Precision;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::boundary::Boundary;
use crate::error::{Result, TopologyError};
use crate::network::{Network, Subnetwork};

/// Cuts `boundaries` until none of them encloses an edge of `sub`.
///
/// Returned loops are closed, simple and counter-clockwise. A loop that
/// cannot be cut is kept whole with a warning.
pub fn subdivide(
    network: &Network,
    sub: &Subnetwork,
    mut boundaries: Vec<Boundary>,
    precision: &Precision,
) -> Vec<Boundary> {
    let mut candidates: Vec<usize> = sub.edges.clone();
    let inside_tolerance = precision.point * 0.5;

    loop {
        candidates.retain(|&e| {
            let [a, b] = network.edges[e].nodes;
            !boundaries.iter().any(|bound| bound.covers(a, b))
        });
        if candidates.is_empty() {
            break;
        }
        let before = candidates.len();

        let mut next = Vec::with_capacity(boundaries.len() + 1);
        for bound in boundaries {
            let target = candidates.iter().position(|&e| {
                bound.contains_point(network, &network.midpoint(e), inside_tolerance)
            });
            let Some(index) = target else {
                next.push(bound);
                continue;
            };
            let edge = candidates.remove(index);
            match cut(network, &bound, edge, precision) {
                Ok(pieces) => next.extend(pieces),
                Err(e) => {
                    warn!(level = network.level, edge, error = %e, "boundary kept unsplit");
                    next.push(bound);
                }
            }
        }
        boundaries = next;

        if candidates.len() == before {
            break;
        }
    }

    finish(network, boundaries)
}

/// Splits `bound` along a chord through `edge`.
fn cut(network: &Network, bound: &Boundary, edge: usize, precision: &Precision) -> Result<Vec<Boundary>> {
    let [a, b] = network.edges[edge].nodes;
    let exits: FxHashSet<usize> = bound.open_nodes().iter().copied().collect();

    let path1 = find_path(network, a, &exits, &[], edge, precision.path_max_depth)?;
    let path2 = find_path(network, b, &exits, &path1, edge, precision.path_max_depth)?;

    if path1.is_empty() || path2.is_empty() {
        // The edge sits on a ring that never reaches the loop.
        let mut out = vec![bound.clone()];
        out.extend(shortest_cycle(network, a, b, edge));
        return Ok(out);
    }

    let chord: Vec<usize> = path1.iter().rev().chain(path2.iter()).copied().collect();
    let mut pieces = Boundary::new(chord).self_intersect();
    let main = pieces.pop().ok_or(TopologyError::IncompleteSplitter)?;

    let (left, right) = Boundary::split(bound, &main)?;
    let mut out = pieces;
    out.extend(left.self_intersect());
    out.extend(right.self_intersect());
    Ok(out)
}

/// Depth-first search from `start` to any node in `exits`.
///
/// The path never revisits a node, never enters `avoid` and never uses
/// `avoid_edge`. Returns the nodes from `start` to the exit, `[start]` when
/// `start` already is an exit, or an empty path when no exit is reachable.
/// Reaching `max_depth` nodes without an exit aborts the whole search.
pub fn find_path(
    network: &Network,
    start: usize,
    exits: &FxHashSet<usize>,
    avoid: &[usize],
    avoid_edge: usize,
    max_depth: usize,
) -> Result<Vec<usize>> {
    if exits.contains(&start) {
        return Ok(vec![start]);
    }
    if max_depth == 0 {
        return Err(TopologyError::DepthExceeded(max_depth));
    }

    // (node, next neighbour to try)
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    while let Some(top) = stack.last_mut() {
        let (node, cursor) = *top;
        let neighbors = &network.nodes[node].neighbors;
        if cursor >= neighbors.len() {
            stack.pop();
            continue;
        }
        top.1 += 1;

        let nb = neighbors[cursor];
        if nb.edge == avoid_edge
            || avoid.contains(&nb.node)
            || stack.iter().any(|&(n, _)| n == nb.node)
        {
            continue;
        }
        if exits.contains(&nb.node) {
            let mut path: Vec<usize> = stack.iter().map(|&(n, _)| n).collect();
            path.push(nb.node);
            return Ok(path);
        }
        if stack.len() >= max_depth {
            return Err(TopologyError::DepthExceeded(max_depth));
        }
        stack.push((nb.node, 0));
    }
    Ok(Vec::new())
}

/// Shortest closed loop through `edge`, found by a breadth-first search
/// from `a` to `b` that does not use the edge itself.
fn shortest_cycle(network: &Network, a: usize, b: usize, edge: usize) -> Option<Boundary> {
    let mut parent: FxHashMap<usize, usize> = FxHashMap::default();
    let mut queue = VecDeque::from([a]);
    parent.insert(a, a);

    while let Some(n) = queue.pop_front() {
        if n == b {
            break;
        }
        for nb in &network.nodes[n].neighbors {
            if nb.edge == edge || parent.contains_key(&nb.node) {
                continue;
            }
            parent.insert(nb.node, n);
            queue.push_back(nb.node);
        }
    }

    let mut path = vec![b];
    let mut n = b;
    while n != a {
        n = *parent.get(&n)?;
        path.push(n);
    }
    // b .. a, closed through the edge back to b.
    path.push(b);
    let ring = Boundary::new(path);
    (ring.distinct_count() >= 3).then_some(ring)
}

/// Keeps closed simple loops once, oriented counter-clockwise.
fn finish(network: &Network, boundaries: Vec<Boundary>) -> Vec<Boundary> {
    let mut seen: FxHashSet<Vec<usize>> = FxHashSet::default();
    let mut out = Vec::with_capacity(boundaries.len());
    for mut bound in boundaries {
        if !bound.is_closed() || !bound.is_simple() || bound.distinct_count() < 3 {
            continue;
        }
        let mut key = bound.open_nodes().to_vec();
        key.sort_unstable();
        if !seen.insert(key) {
            continue;
        }
        bound.orient_ccw(network);
        out.push(bound);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::{network, rectangle};
    use crate::tracer::outer_boundary;
    use approx::assert_relative_eq;

    fn trace(lines: &[((f64, f64), (f64, f64))]) -> (Network, Vec<Boundary>) {
        let net = network(lines);
        let p = Precision::default();
        let mut all = Vec::new();
        for sub in net.split() {
            let outer = outer_boundary(&net, &sub, &p).unwrap();
            all.extend(subdivide(&net, &sub, outer, &p));
        }
        (net, all)
    }

    /// 4 x 3 rectangle cut by a wall at x = 2.
    fn partitioned() -> Vec<((f64, f64), (f64, f64))> {
        vec![
            ((0.0, 0.0), (2.0, 0.0)),
            ((2.0, 0.0), (4.0, 0.0)),
            ((4.0, 0.0), (4.0, 3.0)),
            ((4.0, 3.0), (2.0, 3.0)),
            ((2.0, 3.0), (0.0, 3.0)),
            ((0.0, 3.0), (0.0, 0.0)),
            ((2.0, 0.0), (2.0, 3.0)),
        ]
    }

    #[test]
    fn test_partition_splits_rectangle() {
        let (net, loops) = trace(&partitioned());
        assert_eq!(loops.len(), 2);
        let total: f64 = loops.iter().map(|b| b.area(&net)).sum();
        assert_relative_eq!(total, 12.0, epsilon = 1e-9);
        for b in &loops {
            assert!(b.is_closed() && b.is_simple());
            assert!(b.signed_area(&net) > 0.0);
            assert_relative_eq!(b.area(&net), 6.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_plain_rectangle_is_left_alone() {
        let (net, loops) = trace(&rectangle(4.0, 3.0));
        assert_eq!(loops.len(), 1);
        assert_relative_eq!(loops[0].area(&net), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interior_path_with_bend() {
        // A wall from the bottom edge turning to meet the right edge.
        let lines = vec![
            ((0.0, 0.0), (2.0, 0.0)),
            ((2.0, 0.0), (6.0, 0.0)),
            ((6.0, 0.0), (6.0, 2.0)),
            ((6.0, 2.0), (6.0, 4.0)),
            ((6.0, 4.0), (0.0, 4.0)),
            ((0.0, 4.0), (0.0, 0.0)),
            ((2.0, 0.0), (2.0, 2.0)),
            ((2.0, 2.0), (6.0, 2.0)),
        ];
        let (net, loops) = trace(&lines);
        assert_eq!(loops.len(), 2);
        let mut areas: Vec<f64> = loops.iter().map(|b| b.area(&net)).collect();
        areas.sort_by(f64::total_cmp);
        assert_relative_eq!(areas[0], 8.0, epsilon = 1e-9);
        assert_relative_eq!(areas[1], 16.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inner_ring_is_extracted() {
        // 2 x 2 box hanging off the right wall of a 10 x 10 room by a
        // single wall.
        let lines = vec![
            ((0.0, 0.0), (10.0, 0.0)),
            ((10.0, 0.0), (10.0, 5.0)),
            ((10.0, 5.0), (10.0, 10.0)),
            ((10.0, 10.0), (0.0, 10.0)),
            ((0.0, 10.0), (0.0, 0.0)),
            ((10.0, 5.0), (6.0, 5.0)),
            ((4.0, 4.0), (6.0, 4.0)),
            ((6.0, 4.0), (6.0, 5.0)),
            ((6.0, 5.0), (6.0, 6.0)),
            ((6.0, 6.0), (4.0, 6.0)),
            ((4.0, 6.0), (4.0, 4.0)),
        ];
        let (net, loops) = trace(&lines);
        assert_eq!(net.split().len(), 1);
        assert_eq!(loops.len(), 2);
        let mut areas: Vec<f64> = loops.iter().map(|b| b.area(&net)).collect();
        areas.sort_by(f64::total_cmp);
        assert_relative_eq!(areas[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(areas[1], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_find_path_depth_limit() {
        let net = network(&partitioned());
        let exits: FxHashSet<usize> = [net.nodes.len() + 10].into_iter().collect();
        let err = find_path(&net, 0, &exits, &[], usize::MAX, 3).unwrap_err();
        assert!(matches!(err, TopologyError::DepthExceeded(3)));
    }

    #[test]
    fn test_find_path_start_is_exit() {
        let net = network(&partitioned());
        let exits: FxHashSet<usize> = [0].into_iter().collect();
        assert_eq!(find_path(&net, 0, &exits, &[], 0, 5).unwrap(), vec![0]);
    }
}
