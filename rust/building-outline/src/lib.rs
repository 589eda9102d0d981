// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building outline reconstruction from noisy corner, edge and region detections
//!
//! This crate turns low-level detector output into a polygonal outline:
//! 1. Candidate corners ("junctions") and every pair between them become
//!    binary decision variables
//! 2. Geometric consistency rules (endpoints, crossings, direction
//!    hypotheses, region closure, suppression, degree) become constraints
//! 3. An optimization backend selects the best consistent subset
//!
//! The solver sits behind [`OptimizationBackend`]; [`BranchAndBound`] is a
//! small exact implementation suited to single buildings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use building_outline::{
//!     reconstruct_outline, BranchAndBound, BranchAndBoundConfig, ReconstructionConfig,
//!     ReconstructionInput,
//! };
//!
//! let input = ReconstructionInput::new(junctions, edge_map)
//!     .with_directions(directions);
//!
//! let config = ReconstructionConfig {
//!     intersection_constraint: true,
//!     use_junctions: true,
//!     angle_thresh: Some(10.0),
//!     ..Default::default()
//! };
//!
//! let backend = BranchAndBound::new(BranchAndBoundConfig::from_env());
//! let outline = reconstruct_outline(&input, &config, backend)?;
//! for edge in &outline.active_edges {
//!     println!("{} -> {}", edge.k, edge.l);
//! }
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod raster;
pub mod ray;
pub mod region;
pub mod types;

// Re-export commonly used types and functions
pub use backend::{
    BackendError, BranchAndBound, BranchAndBoundConfig, OptimizationBackend, SolveLimit,
    SolveStatus,
};
pub use config::{EdgeWeighting, ReconstructionConfig};
pub use error::{Error, Result};
pub use types::{
    ActiveRegion, EdgeKey, EdgeMap, Junction, Point2D, Reconstruction, ReconstructionInput,
};

use builder::ModelContext;

/// Reconstruct the building outline from one set of detections
///
/// This runs the full pipeline:
/// 1. Validate the inputs against the enabled constraint families
/// 2. Build the model on `backend` stage by stage
/// 3. Solve and decode the active junctions, edges and regions
///
/// The backend is consumed; nothing persists between calls.
///
/// # Errors
///
/// Configuration and input problems are reported before any variable is
/// declared. [`Error::Infeasible`] means no outline satisfies the enabled
/// constraints. A search that stops at a limit with an incumbent is not an
/// error; check [`Reconstruction::certified_optimal`].
pub fn reconstruct_outline<B: OptimizationBackend>(
    input: &ReconstructionInput,
    config: &ReconstructionConfig,
    mut backend: B,
) -> Result<Reconstruction> {
    config.validate(input)?;

    let regions = {
        let mut ctx = ModelContext::new(&mut backend, config, input);
        builder::build_model(&mut ctx)?;
        ctx.into_regions()
    };

    tracing::info!(
        junctions = input.junctions.len(),
        variables = backend.variables().len(),
        "Solving outline model"
    );
    let status = backend.solve()?;

    let outline = extract::extract(&backend, input, config, regions, status);
    match status {
        SolveStatus::Optimal => tracing::info!(
            edges = outline.active_edges.len(),
            objective = outline.objective,
            "Outline reconstructed"
        ),
        SolveStatus::Feasible { limit } => tracing::warn!(
            %limit,
            edges = outline.active_edges.len(),
            objective = outline.objective,
            "Outline is the best found before the search limit, not proven optimal"
        ),
    }

    Ok(outline)
}
