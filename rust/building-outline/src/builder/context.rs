// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared state threaded through the builder stages

use crate::backend::{OptimizationBackend, VarId};
use crate::config::ReconstructionConfig;
use crate::raster::line_weight;
use crate::region::Region;
use crate::types::{EdgeKey, Junction, Point2D, ReconstructionInput};
use rustc_hash::FxHashMap;

/// Everything a stage may read or extend while the model is assembled
pub struct ModelContext<'a> {
    pub backend: &'a mut dyn OptimizationBackend,
    pub config: &'a ReconstructionConfig,
    pub input: &'a ReconstructionInput,
    /// Per-junction records, indexed like the input junctions
    pub junctions: Vec<Junction>,
    /// Junctions that survived corner filtering, ascending
    pub active: Vec<usize>,
    /// Candidate edges, ascending by `(k, l)`
    pub candidates: Vec<EdgeKey>,
    pub junction_vars: FxHashMap<usize, VarId>,
    pub edge_vars: FxHashMap<EdgeKey, VarId>,
    /// Regions with a non-empty eroded core and their variables
    pub regions: Vec<(Region, VarId)>,
    edge_weights: FxHashMap<EdgeKey, f64>,
}

impl<'a> ModelContext<'a> {
    pub fn new(
        backend: &'a mut dyn OptimizationBackend,
        config: &'a ReconstructionConfig,
        input: &'a ReconstructionInput,
    ) -> Self {
        let junctions = input.junction_records();
        let active = (0..junctions.len()).collect();
        Self {
            backend,
            config,
            input,
            junctions,
            active,
            candidates: Vec::new(),
            junction_vars: FxHashMap::default(),
            edge_vars: FxHashMap::default(),
            regions: Vec::new(),
            edge_weights: FxHashMap::default(),
        }
    }

    pub fn position(&self, junction: usize) -> Point2D {
        self.junctions[junction].position
    }

    /// Mean edge confidence under the edge, sampled once per call
    pub fn edgeness(&mut self, edge: EdgeKey) -> f64 {
        if let Some(&w) = self.edge_weights.get(&edge) {
            return w;
        }
        let w = line_weight(
            &self.input.edge_map,
            &self.junctions[edge.k].position,
            &self.junctions[edge.l].position,
        );
        self.edge_weights.insert(edge, w);
        w
    }

    /// Variable of a candidate edge
    pub fn edge_var(&self, edge: EdgeKey) -> Option<VarId> {
        self.edge_vars.get(&edge).copied()
    }

    pub fn junction_var(&self, junction: usize) -> Option<VarId> {
        self.junction_vars.get(&junction).copied()
    }

    /// Candidate edges with `junction` as an endpoint
    pub fn incident(&self, junction: usize) -> impl Iterator<Item = EdgeKey> + '_ {
        self.candidates
            .iter()
            .copied()
            .filter(move |e| e.touches(junction))
    }

    /// Release the prepared regions once the model is complete
    pub fn into_regions(self) -> Vec<Region> {
        self.regions.into_iter().map(|(region, _)| region).collect()
    }
}
