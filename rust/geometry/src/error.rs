// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;

/// A specific polygon or face is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Zero-length vector has no direction")]
    ZeroVector,

    #[error("Degenerate normal: polygon has no measurable plane")]
    DegenerateNormal,

    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Zero-length edge at vertex {0}")]
    ZeroLengthEdge(usize),

    #[error("Polygon is self-intersecting")]
    SelfIntersecting,

    #[error("Boolean operation produced no geometry: {0}")]
    EmptyResult(String),
}
