// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node loops over a [`Network`].
//!
//! A [`Boundary`] is a sequence of network node indices. It is closed when
//! the first and last node are the same, and simple when no other node
//! repeats. Open boundaries appear as splitting chords.

use floorgraph_geometry::polygon::{point_strictly_inside, signed_area};
use floorgraph_geometry::Point2;
use rustc_hash::FxHashSet;

use crate::error::{Result, TopologyError};
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Boundary {
    pub nodes: Vec<usize>,
}

impl Boundary {
    pub fn new(nodes: Vec<usize>) -> Self {
        Self { nodes }
    }

    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }

    /// Nodes without the repeated closing node.
    pub fn open_nodes(&self) -> &[usize] {
        if self.is_closed() {
            &self.nodes[..self.nodes.len() - 1]
        } else {
            &self.nodes
        }
    }

    pub fn distinct_count(&self) -> usize {
        self.nodes.iter().collect::<FxHashSet<_>>().len()
    }

    /// No node appears twice, apart from the closing node.
    pub fn is_simple(&self) -> bool {
        let open = self.open_nodes();
        self.distinct_count() == open.len()
    }

    pub fn reverse(&mut self) {
        self.nodes.reverse();
    }

    /// Whether `a` and `b` follow each other somewhere in the loop.
    pub fn covers(&self, a: usize, b: usize) -> bool {
        self.nodes
            .windows(2)
            .any(|w| (w[0] == a && w[1] == b) || (w[0] == b && w[1] == a))
    }

    /// Network edges between consecutive nodes.
    pub fn edges(&self, network: &Network) -> Result<Vec<usize>> {
        self.nodes
            .windows(2)
            .map(|w| {
                network
                    .edge_between(w[0], w[1])
                    .ok_or(TopologyError::DisconnectedPath(w[0], w[1]))
            })
            .collect()
    }

    /// Open polygon ring of node positions.
    pub fn polygon(&self, network: &Network) -> Vec<Point2<f64>> {
        self.open_nodes().iter().map(|&n| network.point(n)).collect()
    }

    pub fn signed_area(&self, network: &Network) -> f64 {
        signed_area(&self.polygon(network))
    }

    pub fn area(&self, network: &Network) -> f64 {
        self.signed_area(network).abs()
    }

    /// `p` lies in the interior, farther than `tolerance` from the outline.
    pub fn contains_point(&self, network: &Network, p: &Point2<f64>, tolerance: f64) -> bool {
        self.is_closed() && point_strictly_inside(p, &self.polygon(network), tolerance)
    }

    /// Reverses clockwise loops.
    pub fn orient_ccw(&mut self, network: &Network) {
        if self.signed_area(network) < 0.0 {
            self.reverse();
        }
    }

    /// Breaks the loop at repeated nodes.
    ///
    /// Each pass finds the first node that repeats, peels the stretch
    /// between its two occurrences off as a sub-loop, and splices the rest
    /// back together. The part containing the start node comes last. Works
    /// on open chords as well as closed loops. Closed pieces with fewer than
    /// three distinct nodes enclose nothing and are dropped.
    pub fn self_intersect(self) -> Vec<Boundary> {
        let mut pieces = Vec::new();
        let mut bound = self.nodes;

        while !bound.is_empty() {
            let repeat = (1..bound.len()).find_map(|i| {
                bound[..i]
                    .iter()
                    .position(|&n| n == bound[i])
                    .map(|start| (start, i))
            });
            let Some((start, end)) = repeat else {
                pieces.push(Boundary::new(bound));
                break;
            };

            let sub = &bound[start..=end];
            if sub.len() > 2 {
                pieces.push(Boundary::new(sub.to_vec()));
            }
            if end == bound.len() - 1 {
                break;
            }
            bound = [&bound[..start], &bound[end..]].concat();
        }

        pieces.retain(|b| !b.is_closed() || b.distinct_count() >= 3);
        pieces
    }

    /// Cuts the closed loop `ori` along an open `chord` whose end nodes lie
    /// on it. Returns the two loops on either side of the chord; both
    /// contain the chord.
    ///
    /// A closed chord is returned unchanged next to `ori`.
    pub fn split(ori: &Boundary, chord: &Boundary) -> Result<(Boundary, Boundary)> {
        if chord.is_closed() {
            return Ok((ori.clone(), chord.clone()));
        }
        let ring = ori.open_nodes();
        let (Some(&first), Some(&last)) = (chord.nodes.first(), chord.nodes.last()) else {
            return Err(TopologyError::IncompleteSplitter);
        };
        let bp1 = ring
            .iter()
            .position(|&n| n == first)
            .ok_or(TopologyError::IncompleteSplitter)?;
        let bp2 = ring
            .iter()
            .position(|&n| n == last)
            .ok_or(TopologyError::IncompleteSplitter)?;

        let forward: &[usize] = &chord.nodes;
        let backward: Vec<usize> = chord.nodes.iter().rev().copied().collect();

        let (ring1, ring2) = if bp2 > bp1 {
            (
                [forward, &ring[bp2 + 1..], &ring[..=bp1]].concat(),
                [&backward[..], &ring[bp1 + 1..=bp2]].concat(),
            )
        } else {
            (
                [forward, &ring[bp2 + 1..=bp1]].concat(),
                [&backward[..], &ring[bp1 + 1..], &ring[..=bp2]].concat(),
            )
        };
        Ok((Boundary::new(ring1), Boundary::new(ring2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::{network, rectangle};
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_and_simple() {
        let b = Boundary::new(vec![0, 1, 2, 3, 0]);
        assert!(b.is_closed());
        assert!(b.is_simple());
        assert_eq!(b.open_nodes(), &[0, 1, 2, 3]);
        assert!(!Boundary::new(vec![0, 1, 2, 1, 3, 0]).is_simple());
        assert!(!Boundary::new(vec![0, 1, 2]).is_closed());
    }

    #[test]
    fn test_figure_eight_splits_in_two() {
        // 0-1-2 loop and 2-3-4 loop joined at node 2.
        let walk = Boundary::new(vec![0, 1, 2, 3, 4, 2, 5, 0]);
        let pieces = walk.self_intersect();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].nodes, vec![2, 3, 4, 2]);
        assert_eq!(pieces[1].nodes, vec![0, 1, 2, 5, 0]);
        assert!(pieces.iter().all(|p| p.is_closed() && p.is_simple()));
    }

    #[test]
    fn test_self_intersect_drops_backtracks() {
        // Out and back along a single edge encloses nothing.
        let walk = Boundary::new(vec![0, 1, 2, 7, 2, 3, 0]);
        let pieces = walk.self_intersect();
        assert_eq!(pieces, vec![Boundary::new(vec![0, 1, 2, 3, 0])]);
    }

    #[test]
    fn test_self_intersect_open_chord() {
        let chord = Boundary::new(vec![9, 4, 5, 6, 4, 8]);
        let pieces = chord.self_intersect();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].nodes, vec![4, 5, 6, 4]);
        assert_eq!(pieces[1].nodes, vec![9, 4, 8]);
    }

    #[test]
    fn test_split_by_chord() {
        let ori = Boundary::new(vec![0, 1, 2, 3, 4, 5, 0]);
        let chord = Boundary::new(vec![1, 9, 4]);
        let (a, b) = Boundary::split(&ori, &chord).unwrap();
        assert_eq!(a.nodes, vec![1, 9, 4, 5, 0, 1]);
        assert_eq!(b.nodes, vec![4, 9, 1, 2, 3, 4]);

        let reversed = Boundary::new(vec![4, 9, 1]);
        let (a, b) = Boundary::split(&ori, &reversed).unwrap();
        assert_eq!(a.nodes, vec![4, 9, 1, 2, 3, 4]);
        assert_eq!(b.nodes, vec![1, 9, 4, 5, 0, 1]);
    }

    #[test]
    fn test_split_rejects_foreign_chord() {
        let ori = Boundary::new(vec![0, 1, 2, 3, 0]);
        let chord = Boundary::new(vec![1, 8, 9]);
        assert!(matches!(
            Boundary::split(&ori, &chord),
            Err(TopologyError::IncompleteSplitter)
        ));
    }

    #[test]
    fn test_geometry_on_network() {
        let net = network(&rectangle(4.0, 3.0));
        let mut b = Boundary::new(vec![0, 3, 2, 1, 0]);
        assert_relative_eq!(b.area(&net), 12.0, epsilon = 1e-9);
        b.orient_ccw(&net);
        assert!(b.signed_area(&net) > 0.0);
        assert_eq!(b.edges(&net).unwrap().len(), 4);
        assert!(b.contains_point(&net, &Point2::new(2.0, 1.5), 0.01));
        assert!(b.covers(1, 2));
        assert!(Boundary::new(vec![0, 2]).edges(&net).is_err());
    }
}
