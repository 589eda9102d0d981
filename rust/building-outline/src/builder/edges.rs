// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate graph, decision variables and edge rewards

use super::context::ModelContext;
use crate::backend::{LinExpr, VarDomain, VarRole};
use crate::config::EdgeWeighting;
use crate::error::{Error, Result};
use crate::geometry::{direction_degrees, within_tolerance};
use crate::types::{EdgeKey, Junction};

/// Drop invalid corners, then enumerate candidate pairs among the survivors
pub fn select_candidates(ctx: &mut ModelContext) -> Result<LinExpr> {
    if ctx.config.ignore_invalid_corners {
        let before = ctx.active.len();
        let junctions = &ctx.junctions;
        ctx.active.retain(|&j| junctions[j].directions.len() >= 2);
        tracing::debug!(
            dropped = before - ctx.active.len(),
            kept = ctx.active.len(),
            "Filtered corners without two direction hypotheses"
        );
    }

    let mut candidates = Vec::new();
    for (i, &k) in ctx.active.iter().enumerate() {
        for &l in &ctx.active[i + 1..] {
            if let Some(edge) = EdgeKey::new(k, l) {
                candidates.push(edge);
            }
        }
    }

    if ctx.config.prune_unsupported_edges {
        let tolerance = ctx.config.angle_thresh.ok_or(Error::MissingThreshold {
            feature: "candidate pruning",
            threshold: "angle_thresh",
        })?;
        let before = candidates.len();
        let junctions = &ctx.junctions;
        candidates.retain(|e| {
            supports(&junctions[e.k], &junctions[e.l], tolerance)
                && supports(&junctions[e.l], &junctions[e.k], tolerance)
        });
        tracing::debug!(
            pruned = before - candidates.len(),
            "Pruned candidate edges without direction support"
        );
    }

    ctx.candidates = candidates;
    Ok(LinExpr::zero())
}

/// Whether some hypothesis at `from` points toward `to`
fn supports(from: &Junction, to: &Junction, tolerance: f64) -> bool {
    let Some(angle) = direction_degrees(&from.position, &to.position) else {
        return false;
    };
    from.directions
        .iter()
        .any(|&theta| within_tolerance(angle, theta, tolerance))
}

/// Junction variables (when enabled) and one binary per candidate edge
pub fn declare_variables(ctx: &mut ModelContext) -> Result<LinExpr> {
    if ctx.config.with_corner_variables {
        for &j in &ctx.active {
            let var = ctx.backend.add_variable(VarRole::Junction(j), VarDomain::Binary);
            ctx.junction_vars.insert(j, var);
        }
    }

    for &edge in &ctx.candidates {
        let var = ctx.backend.add_variable(VarRole::Edge(edge), VarDomain::Binary);
        ctx.edge_vars.insert(edge, var);
    }

    tracing::debug!(
        junctions = ctx.junction_vars.len(),
        edges = ctx.edge_vars.len(),
        "Declared junction and edge variables"
    );
    Ok(LinExpr::zero())
}

/// Objective reward of every candidate edge
pub fn edge_rewards(ctx: &mut ModelContext) -> Result<LinExpr> {
    let weighting = ctx.config.edge_weighting()?;
    let confidences = ctx.input.corner_confidences.clone();

    let mut objective = LinExpr::zero();
    for edge in ctx.candidates.clone() {
        let Some(var) = ctx.edge_var(edge) else {
            continue;
        };
        let weight = match weighting {
            EdgeWeighting::Uniform => 1.0,
            EdgeWeighting::Edgeness { threshold } => ctx.edgeness(edge) - threshold,
            EdgeWeighting::CornerEdgeness { threshold } => {
                let conf = confidences.as_deref().ok_or(Error::MissingInput {
                    feature: "corner-edge confidence weighting",
                    missing: "corner confidences",
                })?;
                conf[edge.k] * conf[edge.l] * ctx.edgeness(edge) - threshold
            }
        };
        objective.add_term(weight, var);
    }
    Ok(objective)
}
