// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorgraph Topology
//!
//! Room topology reconstruction from loose building geometry.
//!
//! Raw planar polygons go into a [`ModelRepository`], which classifies them
//! into walls, glazings, floor faces and skylights and detects the building
//! levels. Per level, walls are cleansed into a planar wall graph
//! ([`cleanse`]), turned into a node/edge [`Network`], and traced into
//! closed boundary loops ([`tracer`]). Each loop is then packed with the
//! faces below and above it into a [`Space`] ([`packing`]), and spaces are
//! linked to their neighbours ([`adjacency`]).
//!
//! All element and space references are stable slotmap keys, so wall
//! replacement during cleansing never leaves a dangling pointer behind.

pub mod adjacency;
pub mod arena;
pub mod boundary;
pub mod cleanse;
pub mod element;
pub mod error;
pub mod keys;
pub mod levels;
pub mod network;
pub mod packing;
pub mod space;
pub mod spatial;
pub mod subdivide;
pub mod tracer;

pub use adjacency::{build_adjacency, build_edge_adjacency};
pub use arena::{GeometryRecord, LevelBoundaries, ModelRepository};
pub use boundary::Boundary;
pub use cleanse::{cleanse_level, CleanseOptions, CleanseReport};
pub use element::{Element, Face, FaceCategory, Footprint, Validity, Wall};
pub use error::{Result, TopologyError};
pub use keys::{ElementKey, ElementKind, GeometryKey, SpaceKey};
pub use levels::{attach_apertures, classify, split_walls_by_level, ClassifyReport};
pub use network::Network;
pub use packing::{pack_model, PackReport};
pub use space::{Floor, Space, SpaceNeighbor};
pub use tracer::{trace_level, BoundaryLoop};
