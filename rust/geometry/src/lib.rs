// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorgraph Geometry
//!
//! Tolerance-aware planar geometry for rebuilding room topology from loose
//! building faces: nalgebra vectors, plane projections, polygon predicates,
//! i_overlay Booleans and coordinate snapping.

pub mod bool2d;
pub mod error;
pub mod polygon;
pub mod precision;
pub mod projection;
pub mod segment;
pub mod snapping;
pub mod vector;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use error::{GeometryError, Result};
pub use polygon::Region;
pub use precision::Precision;
pub use projection::Projection;
pub use snapping::round_polygons;
pub use vector::{parallel, quick_angle};
