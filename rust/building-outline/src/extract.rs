// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decode a solved model into the outline

use crate::backend::{OptimizationBackend, SolveStatus, VarRole};
use crate::config::ReconstructionConfig;
use crate::region::Region;
use crate::types::{ActiveRegion, Reconstruction, ReconstructionInput};
use rustc_hash::FxHashMap;

/// Values at or above this count as "on"
pub const ACTIVE_THRESHOLD: f64 = 0.5;

/// Read the active junctions, edges and regions off a solved backend
pub fn extract(
    backend: &dyn OptimizationBackend,
    input: &ReconstructionInput,
    config: &ReconstructionConfig,
    regions: Vec<Region>,
    status: SolveStatus,
) -> Reconstruction {
    let mut junctions = Vec::new();
    let mut edges = Vec::new();
    let mut region_indices = Vec::new();

    for var in backend.variables() {
        let on = backend
            .value(var.id)
            .map_or(false, |v| v >= ACTIVE_THRESHOLD);
        if !on {
            continue;
        }
        match var.role {
            VarRole::Junction(j) => junctions.push(j),
            VarRole::Edge(edge) => edges.push(edge),
            VarRole::Region(i) => region_indices.push(i),
            VarRole::DirectionClaim { .. }
            | VarRole::UnmatchedSlack { .. }
            | VarRole::RaySlack { .. } => {}
        }
    }

    edges.sort();
    edges.dedup();

    let active_junctions = if config.with_corner_variables {
        junctions.sort_unstable();
        junctions
    } else {
        let mut endpoints: Vec<usize> = edges.iter().flat_map(|e| [e.k, e.l]).collect();
        endpoints.sort_unstable();
        endpoints.dedup();
        endpoints
    };

    let active_regions = config.use_regions.then(|| {
        let mut by_index: FxHashMap<usize, Region> =
            regions.into_iter().map(|r| (r.index, r)).collect();
        region_indices.sort_unstable();
        region_indices
            .into_iter()
            .filter_map(|i| by_index.remove(&i))
            .map(|r| ActiveRegion {
                index: r.index,
                eroded_mask: r.eroded,
            })
            .collect()
    });

    Reconstruction {
        junctions: input.junctions.clone(),
        active_junctions,
        active_edges: edges,
        active_regions,
        objective: backend.objective_value().unwrap_or_default(),
        status,
    }
}
