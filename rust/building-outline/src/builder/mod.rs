// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model builder
//!
//! The model is assembled by an ordered list of [`Stage`]s over a shared
//! [`ModelContext`]. Each stage declares its variables and constraints on the
//! backend and returns its contribution to the objective; the contributions
//! are summed into the single maximized objective.
//!
//! Order matters: candidates and variables exist before any constraint
//! family refers to them.

pub mod angular;
pub mod context;
pub mod crossing;
pub mod edges;
pub mod junctions;
pub mod objective;
pub mod regions;

pub use context::ModelContext;

use crate::backend::LinExpr;
use crate::config::ReconstructionConfig;
use crate::error::Result;

/// One togglable step of model assembly
pub struct Stage {
    pub name: &'static str,
    pub enabled: fn(&ReconstructionConfig) -> bool,
    pub run: fn(&mut ModelContext) -> Result<LinExpr>,
}

fn always(_: &ReconstructionConfig) -> bool {
    true
}

fn corner_variables(c: &ReconstructionConfig) -> bool {
    c.with_corner_variables
}

fn regions_enabled(c: &ReconstructionConfig) -> bool {
    c.use_regions
}

fn crossing_enabled(c: &ReconstructionConfig) -> bool {
    c.intersection_constraint
}

fn suppression_enabled(c: &ReconstructionConfig) -> bool {
    c.corner_suppression
}

fn min_degree_enabled(c: &ReconstructionConfig) -> bool {
    c.corner_min_degree_constraint
}

/// Assembly order of the outline model
pub const STAGES: &[Stage] = &[
    Stage {
        name: "candidates",
        enabled: always,
        run: edges::select_candidates,
    },
    Stage {
        name: "variables",
        enabled: always,
        run: edges::declare_variables,
    },
    Stage {
        name: "edge weighting",
        enabled: always,
        run: edges::edge_rewards,
    },
    Stage {
        name: "junction consistency",
        enabled: corner_variables,
        run: junctions::consistency,
    },
    Stage {
        name: "regions",
        enabled: regions_enabled,
        run: regions::region_reasoning,
    },
    Stage {
        name: "crossing avoidance",
        enabled: crossing_enabled,
        run: crossing::crossing_avoidance,
    },
    Stage {
        name: "angular consistency",
        enabled: ReconstructionConfig::angular_consistency,
        run: angular::angular_consistency,
    },
    Stage {
        name: "corner suppression",
        enabled: suppression_enabled,
        run: junctions::suppression,
    },
    Stage {
        name: "minimum degree",
        enabled: min_degree_enabled,
        run: junctions::min_degree,
    },
];

/// Run every enabled stage and install the summed objective
pub fn build_model(ctx: &mut ModelContext) -> Result<LinExpr> {
    let config = ctx.config;
    let objective = STAGES
        .iter()
        .filter(|stage| (stage.enabled)(config))
        .try_fold(LinExpr::zero(), |acc, stage| {
            let contribution = (stage.run)(ctx)?;
            tracing::debug!(
                stage = stage.name,
                objective_terms = contribution.terms.len(),
                variables = ctx.backend.variables().len(),
                "Stage complete"
            );
            Ok::<_, crate::error::Error>(acc + contribution)
        })?;

    ctx.backend.set_objective(objective.clone());
    Ok(objective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BranchAndBound, ConstraintTag, OptimizationBackend, VarRole};
    use crate::types::{EdgeMap, Point2D, ReconstructionInput};

    fn triangle() -> ReconstructionInput {
        ReconstructionInput::new(
            vec![
                Point2D::new(5.0, 5.0),
                Point2D::new(25.0, 5.0),
                Point2D::new(15.0, 25.0),
            ],
            EdgeMap::new(32, 32),
        )
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = STAGES.iter().map(|s| s.name).collect();
        assert_eq!(names[0], "candidates");
        assert_eq!(names[1], "variables");
        assert_eq!(names.last(), Some(&"minimum degree"));
    }

    #[test]
    fn test_default_model_is_complete_graph() {
        let input = triangle();
        let config = ReconstructionConfig::default();
        let mut backend = BranchAndBound::default();
        let objective = {
            let mut ctx = ModelContext::new(&mut backend, &config, &input);
            build_model(&mut ctx).unwrap()
        };

        let model = backend.model();
        assert_eq!(model.variables.len(), 3);
        assert!(model.constraints.is_empty());
        assert!(model
            .variables
            .iter()
            .all(|v| matches!(v.role, VarRole::Edge(_))));
        assert_eq!(objective.evaluate(|_| 1.0), 3.0);
        assert_eq!(backend.model().objective, objective);
    }

    #[test]
    fn test_junction_variables_add_consistency() {
        let input = triangle();
        let config = ReconstructionConfig {
            with_corner_variables: true,
            corner_min_degree_constraint: true,
            ..Default::default()
        };
        let mut backend = BranchAndBound::default();
        {
            let mut ctx = ModelContext::new(&mut backend, &config, &input);
            build_model(&mut ctx).unwrap();
        }

        let model = backend.model();
        assert_eq!(model.variables.len(), 6);
        let consistency = model
            .constraints_tagged(|t| matches!(t, ConstraintTag::JunctionEdge(_)))
            .count();
        let degree = model
            .constraints_tagged(|t| matches!(t, ConstraintTag::MinDegree { .. }))
            .count();
        assert_eq!(consistency, 3);
        assert_eq!(degree, 3);
        assert_eq!(
            backend
                .variables()
                .iter()
                .filter(|v| matches!(v.role, VarRole::Junction(_)))
                .count(),
            3
        );
    }
}
