// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Junction-level constraint families

use super::context::ModelContext;
use crate::backend::{Constraint, ConstraintTag, LinExpr};
use crate::error::{Error, Result};
use rustc_hash::FxHashSet;

/// An edge is active only if both of its endpoints are
///
/// `(J_k + J_l - 2) * E_kl = 0`
pub fn consistency(ctx: &mut ModelContext) -> Result<LinExpr> {
    for edge in ctx.candidates.clone() {
        let (Some(jk), Some(jl), Some(e)) = (
            ctx.junction_var(edge.k),
            ctx.junction_var(edge.l),
            ctx.edge_var(edge),
        ) else {
            return Err(Error::RequiresJunctionVariables {
                feature: "junction consistency",
            });
        };
        let lhs = (LinExpr::var(jk) + LinExpr::var(jl) - LinExpr::constant(2.0)) * LinExpr::var(e);
        ctx.backend.add_constraint(Constraint::eq(
            ConstraintTag::JunctionEdge(edge),
            lhs,
            LinExpr::zero(),
        ));
    }
    Ok(LinExpr::zero())
}

/// Neighborhoods closer than `dist_thresh` hold at most one active junction
pub fn suppression(ctx: &mut ModelContext) -> Result<LinExpr> {
    let radius = ctx.config.dist_thresh.ok_or(Error::MissingThreshold {
        feature: "corner suppression",
        threshold: "dist_thresh",
    })?;

    let mut seen: FxHashSet<Vec<usize>> = FxHashSet::default();
    let mut clusters = Vec::new();
    for &j in &ctx.active {
        let here = ctx.position(j);
        let neighborhood: Vec<usize> = ctx
            .active
            .iter()
            .copied()
            .filter(|&other| here.distance_to(&ctx.position(other)) < radius)
            .collect();
        if neighborhood.len() >= 2 && seen.insert(neighborhood.clone()) {
            clusters.push(neighborhood);
        }
    }

    for (cluster, members) in clusters.iter().enumerate() {
        let mut vars = Vec::with_capacity(members.len());
        for &j in members {
            vars.push(ctx.junction_var(j).ok_or(Error::RequiresJunctionVariables {
                feature: "corner suppression",
            })?);
        }
        ctx.backend.add_constraint(Constraint::le(
            ConstraintTag::Suppression { cluster },
            LinExpr::sum_of(vars),
            LinExpr::constant(1.0),
        ));
    }

    tracing::debug!(clusters = clusters.len(), "Added corner suppression");
    Ok(LinExpr::zero())
}

/// An active junction carries at least two active edges
///
/// `(Σ incident E) * J >= 2 * J`
pub fn min_degree(ctx: &mut ModelContext) -> Result<LinExpr> {
    for j in ctx.active.clone() {
        let jv = ctx.junction_var(j).ok_or(Error::RequiresJunctionVariables {
            feature: "minimum degree",
        })?;
        let incident: Vec<_> = ctx.incident(j).filter_map(|e| ctx.edge_var(e)).collect();
        let degree = LinExpr::sum_of(incident) * LinExpr::var(jv);
        ctx.backend.add_constraint(Constraint::ge(
            ConstraintTag::MinDegree { junction: j },
            degree,
            LinExpr::term(2.0, jv),
        ));
    }
    Ok(LinExpr::zero())
}
