// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.

use floorgraph_geometry::GeometryError;

use crate::keys::{ElementKey, SpaceKey};

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// A graph-level operation could not complete.
///
/// Everything except [`TopologyError::NoLevels`] is recoverable: callers drop
/// the offending boundary or subnetwork and continue.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// No horizontal face exists, so there is no level reference frame.
    #[error("no horizontal faces found: building levels cannot be established")]
    NoLevels,

    /// The path search went deeper than the configured limit.
    #[error("path search exceeded maximum depth {0}")]
    DepthExceeded(usize),

    /// The boundary walk did not return to its start node.
    #[error("boundary walk did not close within {0} steps")]
    WalkDiverged(usize),

    /// A splitting chord does not start and end on the boundary it cuts.
    #[error("incomplete splitter: chord endpoints are not on the boundary")]
    IncompleteSplitter,

    /// A loop needs at least 3 edges to enclose an area.
    #[error("boundary has {0} edges, at least 3 required")]
    DegenerateBoundary(usize),

    /// Two consecutive nodes of a loop share no edge.
    #[error("nodes {0} and {1} are not connected")]
    DisconnectedPath(usize, usize),

    /// A referenced element is no longer in the repository.
    #[error("element not found: {0:?}")]
    ElementNotFound(ElementKey),

    /// A referenced space is no longer in the repository.
    #[error("space not found: {0:?}")]
    SpaceNotFound(SpaceKey),

    /// A polygon involved in the operation is malformed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
