// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorgraph Processing
//!
//! Drives a [`ModelRepository`](floorgraph_topology::ModelRepository) from
//! raw polygons to packed, linked spaces, and summarizes the result for
//! exporters.
//!
//! ```no_run
//! use floorgraph_processing::{transform, ModelSummary, TransformConfig};
//! use floorgraph_topology::ModelRepository;
//!
//! let mut repo = ModelRepository::new();
//! // ... include_geometry() for every polygon of the model ...
//! let config = TransformConfig::from_env();
//! let report = transform(&mut repo, &config)?;
//! let summary = ModelSummary::from_repository(&repo, &config.precision);
//! println!("{} rooms\n{}", report.rooms, summary.to_json()?);
//! # Ok::<(), floorgraph_processing::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod summary;

pub use config::TransformConfig;
pub use error::{Error, Result};
pub use pipeline::{transform, TransformReport};
pub use summary::{LoopSummary, ModelSummary, NeighborSummary, SpaceSummary};
