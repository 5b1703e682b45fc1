// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transform configuration, optionally loaded from environment variables.

use std::str::FromStr;

use floorgraph_geometry::Precision;
use floorgraph_topology::CleanseOptions;
use serde::{Deserialize, Serialize};

/// Tolerances and stage switches for [`transform`](crate::transform).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub precision: Precision,
    /// Cleansing passes run on every level.
    pub cleanse: CleanseOptions,
    /// Cut walls spanning several storeys into one wall per storey.
    pub split_walls: bool,
    /// Trace levels on the rayon thread pool.
    pub parallel_tracing: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            cleanse: CleanseOptions::default(),
            split_walls: true,
            parallel_tracing: true,
        }
    }
}

impl TransformConfig {
    /// Load configuration from `FLOORGRAPH_*` environment variables.
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let p = d.precision;
        let c = d.cleanse;
        Self {
            precision: Precision {
                point: number(&lookup, "FLOORGRAPH_POINT_PRECISION", p.point),
                area: number(&lookup, "FLOORGRAPH_AREA_PRECISION", p.area),
                angle_tolerance: number(&lookup, "FLOORGRAPH_ANGLE_TOLERANCE", p.angle_tolerance),
                horizontal_threshold: number(
                    &lookup,
                    "FLOORGRAPH_HORIZONTAL_THRESHOLD",
                    p.horizontal_threshold,
                ),
                level_max_offset: number(&lookup, "FLOORGRAPH_LEVEL_MAX_OFFSET", p.level_max_offset),
                level_min_area: number(&lookup, "FLOORGRAPH_LEVEL_MIN_AREA", p.level_min_area),
                min_wall_height: number(&lookup, "FLOORGRAPH_MIN_WALL_HEIGHT", p.min_wall_height),
                path_max_depth: number(&lookup, "FLOORGRAPH_PATH_MAX_DEPTH", p.path_max_depth),
                walk_iteration_cap: number(
                    &lookup,
                    "FLOORGRAPH_WALK_ITERATION_CAP",
                    p.walk_iteration_cap,
                ),
            },
            cleanse: CleanseOptions {
                invalid_faces: flag(&lookup, "FLOORGRAPH_REMOVE_INVALID_FACES", c.invalid_faces),
                duplicates: flag(&lookup, "FLOORGRAPH_REMOVE_DUPLICATES", c.duplicates),
                invalid_walls: flag(&lookup, "FLOORGRAPH_REMOVE_INVALID_WALLS", c.invalid_walls),
                overlaps: flag(&lookup, "FLOORGRAPH_RESOLVE_OVERLAPS", c.overlaps),
                coplanar: flag(&lookup, "FLOORGRAPH_MERGE_COPLANAR", c.coplanar),
                intersections: flag(&lookup, "FLOORGRAPH_BREAK_INTERSECTIONS", c.intersections),
            },
            split_walls: flag(&lookup, "FLOORGRAPH_SPLIT_WALLS", d.split_walls),
            parallel_tracing: flag(&lookup, "FLOORGRAPH_PARALLEL_TRACING", d.parallel_tracing),
        }
    }
}

fn number<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(TransformConfig::from_lookup(|_| None), TransformConfig::default());
    }

    #[test]
    fn test_values_override_defaults() {
        let config = TransformConfig::from_lookup(lookup(&[
            ("FLOORGRAPH_POINT_PRECISION", "0.01"),
            ("FLOORGRAPH_PATH_MAX_DEPTH", " 80 "),
            ("FLOORGRAPH_MERGE_COPLANAR", "off"),
            ("FLOORGRAPH_PARALLEL_TRACING", "FALSE"),
        ]));
        assert_eq!(config.precision.point, 0.01);
        assert_eq!(config.precision.path_max_depth, 80);
        assert!(!config.cleanse.coplanar);
        assert!(config.cleanse.duplicates);
        assert!(!config.parallel_tracing);
    }

    #[test]
    fn test_unparsable_values_ignored() {
        let config = TransformConfig::from_lookup(lookup(&[
            ("FLOORGRAPH_AREA_PRECISION", "large"),
            ("FLOORGRAPH_SPLIT_WALLS", "maybe"),
        ]));
        assert_eq!(config.precision.area, 1.0);
        assert!(config.split_walls);
    }
}
