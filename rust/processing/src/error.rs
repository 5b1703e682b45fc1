// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the processing pipeline.

use floorgraph_geometry::GeometryError;
use floorgraph_topology::TopologyError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Summary serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
