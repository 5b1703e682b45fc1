// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-model transform with per-level parallel tracing.

use std::time::Instant;

use floorgraph_topology::{
    attach_apertures, build_adjacency, build_edge_adjacency, classify, cleanse_level, pack_model,
    split_walls_by_level, trace_level, ClassifyReport, CleanseReport, LevelBoundaries,
    ModelRepository, PackReport,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::TransformConfig;
use crate::error::Result;

/// Counts gathered while transforming a model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformReport {
    pub levels: usize,
    pub walls: usize,
    pub faces: usize,
    pub glazings: usize,
    pub skylights: usize,
    pub walls_split: usize,
    pub apertures_attached: usize,
    pub cleanse: CleanseReport,
    pub boundaries: usize,
    pub spaces: usize,
    pub rooms: usize,
    pub voids: usize,
    pub split_faces: usize,
    pub stacks_merged: usize,
    pub neighbor_links: usize,
    /// Element pairs sharing a ring edge.
    pub edge_links: usize,
    pub elapsed_ms: u64,
}

impl TransformReport {
    fn absorb_classify(&mut self, report: &ClassifyReport) {
        self.levels = report.levels;
        self.walls = report.walls;
        self.faces = report.faces;
        self.glazings = report.glazings;
        self.skylights = report.skylights;
    }

    fn absorb_pack(&mut self, report: &PackReport) {
        self.split_faces = report.split_faces;
        self.stacks_merged = report.stacks_merged;
    }
}

/// Reconstructs the spaces of every level.
///
/// New geometry is classified into elements, storey-spanning walls are cut,
/// apertures are hosted and walls cleansed level by level. Levels are then
/// traced (in parallel unless disabled), packed into spaces and linked,
/// which also settles which elements are exterior.
///
/// Failures inside a stage drop the element, loop or component concerned
/// and are logged. The only error returned is a model without any level.
/// Running the transform again on the same repository rebuilds the spaces
/// from the already cleansed walls.
pub fn transform(repo: &mut ModelRepository, config: &TransformConfig) -> Result<TransformReport> {
    let total_start = Instant::now();
    let precision = &config.precision;
    let mut report = TransformReport::default();

    tracing::info!(geometries = repo.geometry_count(), "Starting room reconstruction");

    repo.snap_geometries(precision);
    let classified = classify(repo, precision)?;
    report.absorb_classify(&classified);
    if config.split_walls {
        report.walls_split = split_walls_by_level(repo, precision);
    }
    report.apertures_attached = attach_apertures(repo, precision);

    let cleanse_start = Instant::now();
    for level in 0..repo.level_count() {
        let level_report = cleanse_level(repo, level, &config.cleanse, precision);
        report.cleanse.merge(&level_report);
    }
    // Cleansing replaces walls; glazings left without a host look again.
    report.apertures_attached += attach_apertures(repo, precision);
    tracing::info!(
        levels = repo.level_count(),
        changed = report.cleanse.total(),
        cleanse_time_ms = cleanse_start.elapsed().as_millis() as u64,
        "Cleansing complete"
    );

    let trace_start = Instant::now();
    let boundaries = trace_levels(repo, config);
    report.boundaries = boundaries.iter().map(|b| b.loops.len()).sum();
    repo.set_boundaries(boundaries);
    tracing::info!(
        boundaries = report.boundaries,
        parallel = config.parallel_tracing,
        trace_time_ms = trace_start.elapsed().as_millis() as u64,
        "Tracing complete"
    );

    let packed = pack_model(repo, precision);
    report.absorb_pack(&packed);
    report.neighbor_links = build_adjacency(repo);
    report.edge_links = build_edge_adjacency(repo, precision);
    report.spaces = repo.space_count();
    report.rooms = repo.rooms(precision).len();
    report.voids = repo.voids(precision).len();
    report.elapsed_ms = total_start.elapsed().as_millis() as u64;

    tracing::info!(
        spaces = report.spaces,
        rooms = report.rooms,
        voids = report.voids,
        total_time_ms = report.elapsed_ms,
        "Room reconstruction complete"
    );
    Ok(report)
}

fn trace_levels(repo: &ModelRepository, config: &TransformConfig) -> Vec<LevelBoundaries> {
    let precision = &config.precision;
    let trace = |level: usize| LevelBoundaries {
        level,
        loops: trace_level(repo, level, precision),
    };
    let levels: Vec<usize> = (0..repo.level_count()).collect();
    if config.parallel_tracing {
        levels.into_par_iter().map(trace).collect()
    } else {
        levels.into_iter().map(trace).collect()
    }
}
