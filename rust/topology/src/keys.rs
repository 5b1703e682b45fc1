// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage.
//!
//! Geometry records, building elements and spaces each get a type-safe key
//! created by `slotmap::SlotMap`. Keys stay valid when other entries are
//! removed (generational indices), so edges, boundaries and spaces can hold
//! them across every stage of the pipeline.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Key for a raw polygon in the geometry repository.
    pub struct GeometryKey;

    /// Key for a classified building element (face, wall, glazing, skylight).
    pub struct ElementKey;

    /// Key for a room or void.
    pub struct SpaceKey;
}

/// Variant tag of an [`Element`](crate::element::Element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Face,
    Wall,
    Glazing,
    Skylight,
}

impl ElementKind {
    /// Apertures are hosted by another element.
    pub fn is_aperture(self) -> bool {
        matches!(self, ElementKind::Glazing | ElementKind::Skylight)
    }
}
