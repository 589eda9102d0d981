// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Angular consistency between candidate edges and direction hypotheses
//!
//! Incident edges are binned by the hypotheses they point along. A bin holds
//! at most one active edge; edges matching no hypothesis are allowed but pay
//! a per-edge penalty through an integer slack.

use super::context::ModelContext;
use super::objective::UNMATCHED_DIRECTION_PENALTY;
use crate::backend::{Constraint, ConstraintTag, LinExpr, VarDomain, VarRole};
use crate::error::{Error, Result};
use crate::geometry::{direction_degrees, within_tolerance};
use crate::types::EdgeKey;
use smallvec::SmallVec;

/// Incident edges of one junction grouped by hypothesis
struct DirectionBins {
    bins: Vec<SmallVec<[EdgeKey; 4]>>,
    unmatched: Vec<EdgeKey>,
}

fn bin_incident_edges(ctx: &ModelContext, junction: usize, tolerance: f64) -> DirectionBins {
    let record = &ctx.junctions[junction];
    let mut bins = vec![SmallVec::new(); record.directions.len()];
    let mut unmatched = Vec::new();

    for edge in ctx.incident(junction) {
        let Some(other) = edge.other(junction) else {
            continue;
        };
        // Coincident endpoints have no direction and stay out of every bin
        let Some(angle) = direction_degrees(&record.position, &ctx.position(other)) else {
            continue;
        };
        let mut matched = false;
        for (i, &theta) in record.directions.iter().enumerate() {
            if within_tolerance(angle, theta, tolerance) {
                bins[i].push(edge);
                matched = true;
            }
        }
        if !matched {
            unmatched.push(edge);
        }
    }

    DirectionBins { bins, unmatched }
}

/// Per-junction direction bins, unmatched slack and optional direction claims
pub fn angular_consistency(ctx: &mut ModelContext) -> Result<LinExpr> {
    let config = ctx.config;
    let tolerance = config.angle_thresh.ok_or(Error::MissingThreshold {
        feature: "angular consistency",
        threshold: "angle_thresh",
    })?;
    let with_claims = config.use_junctions_with_var;

    let mut objective = LinExpr::zero();
    for j in ctx.active.clone() {
        let DirectionBins { bins, unmatched } = bin_incident_edges(ctx, j, tolerance);

        for (direction, edges) in bins.iter().enumerate() {
            if edges.is_empty() {
                continue;
            }
            let vars: Vec<_> = edges.iter().filter_map(|&e| ctx.edge_var(e)).collect();
            ctx.backend.add_constraint(Constraint::le(
                ConstraintTag::DirectionBin {
                    junction: j,
                    direction,
                },
                LinExpr::sum_of(vars.iter().copied()),
                LinExpr::constant(1.0),
            ));

            if with_claims {
                let confidence = ctx.junctions[j]
                    .direction_confidences
                    .get(direction)
                    .copied()
                    .ok_or(Error::MissingInput {
                        feature: "direction variables",
                        missing: "direction confidences",
                    })?;
                let strongest = edges
                    .iter()
                    .map(|&e| ctx.edgeness(e))
                    .fold(0.0_f64, f64::max);

                let claim = ctx.backend.add_variable(
                    VarRole::DirectionClaim {
                        junction: j,
                        direction,
                    },
                    VarDomain::Binary,
                );
                ctx.backend.add_constraint(Constraint::le(
                    ConstraintTag::DirectionClaim {
                        junction: j,
                        direction,
                    },
                    LinExpr::sum_of(vars),
                    LinExpr::var(claim),
                ));
                objective.add_term(strongest * confidence - config.theta_threshold, claim);
            }
        }

        if !unmatched.is_empty() {
            let vars: Vec<_> = unmatched.iter().filter_map(|&e| ctx.edge_var(e)).collect();
            let slack = ctx.backend.add_variable(
                VarRole::UnmatchedSlack { junction: j },
                VarDomain::Integer {
                    upper: vars.len() as u32,
                },
            );
            ctx.backend.add_constraint(Constraint::eq(
                ConstraintTag::UnmatchedBin { junction: j },
                LinExpr::sum_of(vars) - LinExpr::var(slack),
                LinExpr::zero(),
            ));
            objective.add_term(-UNMATCHED_DIRECTION_PENALTY, slack);
        }
    }

    Ok(objective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BranchAndBound, OptimizationBackend};
    use crate::builder::edges::{declare_variables, select_candidates};
    use crate::config::ReconstructionConfig;
    use crate::types::{EdgeMap, Point2D, ReconstructionInput};

    fn star() -> ReconstructionInput {
        // Junction 0 in the middle, 1 and 2 both to its right, 3 below
        ReconstructionInput::new(
            vec![
                Point2D::new(30.0, 30.0),
                Point2D::new(50.0, 30.0),
                Point2D::new(50.0, 32.0),
                Point2D::new(30.0, 50.0),
            ],
            EdgeMap::new(64, 64),
        )
        .with_directions(vec![vec![0.0], vec![180.0], vec![180.0], vec![270.0]])
    }

    #[test]
    fn test_bins_and_unmatched() {
        let input = star();
        let config = ReconstructionConfig {
            use_junctions: true,
            angle_thresh: Some(10.0),
            ..Default::default()
        };
        let mut backend = BranchAndBound::default();
        {
            let mut ctx = ModelContext::new(&mut backend, &config, &input);
            select_candidates(&mut ctx).unwrap();
            let bins = bin_incident_edges(&ctx, 0, 10.0);
            assert_eq!(bins.bins[0].len(), 2);
            assert_eq!(bins.unmatched, vec![EdgeKey::new(0, 3).unwrap()]);
            declare_variables(&mut ctx).unwrap();
            let objective = angular_consistency(&mut ctx).unwrap();
            ctx.backend.set_objective(objective);
        }

        let slack = backend
            .variables()
            .iter()
            .find(|v| v.role == VarRole::UnmatchedSlack { junction: 0 })
            .unwrap();
        assert_eq!(slack.domain, VarDomain::Integer { upper: 1 });
    }

    #[test]
    fn test_one_edge_per_direction() {
        let input = star();
        let config = ReconstructionConfig {
            use_junctions: true,
            angle_thresh: Some(10.0),
            ..Default::default()
        };
        let mut backend = BranchAndBound::default();
        let edge_objective = {
            let mut ctx = ModelContext::new(&mut backend, &config, &input);
            select_candidates(&mut ctx).unwrap();
            declare_variables(&mut ctx).unwrap();
            let rewards = crate::builder::edges::edge_rewards(&mut ctx).unwrap();
            rewards + angular_consistency(&mut ctx).unwrap()
        };
        backend.set_objective(edge_objective);
        backend.solve().unwrap();

        let e01 = backend.variables()[0].id;
        let e02 = backend.variables()[1].id;
        let picked = backend.value(e01).unwrap() + backend.value(e02).unwrap();
        assert_eq!(picked, 1.0);
    }

    #[test]
    fn test_direction_claims_need_confidences() {
        let input = star();
        let config = ReconstructionConfig {
            use_junctions_with_var: true,
            angle_thresh: Some(10.0),
            ..Default::default()
        };
        let mut backend = BranchAndBound::default();
        let mut ctx = ModelContext::new(&mut backend, &config, &input);
        select_candidates(&mut ctx).unwrap();
        declare_variables(&mut ctx).unwrap();
        assert!(matches!(
            angular_consistency(&mut ctx),
            Err(Error::MissingInput { .. })
        ));
    }
}
