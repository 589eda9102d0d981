// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Region reasoning: active regions must be enclosed, never cut

use super::context::ModelContext;
use super::objective::RAY_SLACK_PENALTY;
use crate::backend::{Constraint, ConstraintTag, LinExpr, VarDomain, VarId, VarRole};
use crate::error::{Error, Result};
use crate::raster::{overlap_fraction, union_masks};
use crate::ray::{cast_ray, ray_angles};
use crate::region::prepare_regions;
use crate::types::Point2D;
use image::GrayImage;

/// Region variables, overlap exclusion and ray closure
pub fn region_reasoning(ctx: &mut ModelContext) -> Result<LinExpr> {
    let input = ctx.input;
    let config = ctx.config;
    let masks = input.regions.as_deref().ok_or(Error::MissingInput {
        feature: "region reasoning",
        missing: "region masks",
    })?;
    let hit_threshold = config.region_hit_threshold.ok_or(Error::MissingThreshold {
        feature: "region reasoning",
        threshold: "region_hit_threshold",
    })?;

    let (width, height) = input.edge_map.dimensions();
    let positions: Vec<Point2D> = ctx.junctions.iter().map(|j| j.position).collect();
    let candidates = ctx.candidates.clone();
    let mut objective = LinExpr::zero();

    let prepared = prepare_regions(masks, config.filter_size);
    // Rays only stop at regions that survived erosion
    let others: Vec<Option<GrayImage>> = prepared
        .iter()
        .map(|region| {
            (prepared.len() > 1).then(|| {
                union_masks(
                    prepared
                        .iter()
                        .filter(|o| o.index != region.index)
                        .map(|o| &o.mask),
                    width,
                    height,
                )
            })
        })
        .collect();

    for (region, others) in prepared.into_iter().zip(others) {
        let r = ctx
            .backend
            .add_variable(VarRole::Region(region.index), VarDomain::Binary);
        objective.add_term(config.region_weight, r);

        // Edges running through the core may not coexist with the region
        let mut cut = 0usize;
        for &edge in &candidates {
            let fraction = overlap_fraction(&region.eroded, &positions[edge.k], &positions[edge.l]);
            if fraction >= hit_threshold {
                if let Some(e) = ctx.edge_var(edge) {
                    ctx.backend.add_constraint(Constraint::eq(
                        ConstraintTag::RegionOverlap {
                            region: region.index,
                            edge,
                        },
                        LinExpr::var(e) * LinExpr::var(r),
                        LinExpr::zero(),
                    ));
                    cut += 1;
                }
            }
        }

        let mut closures = 0usize;
        for (probe, origin) in region.probes.iter().enumerate() {
            for angle in ray_angles() {
                let hit = cast_ray(
                    origin,
                    angle,
                    &candidates,
                    &positions,
                    &region.eroded,
                    others.as_ref(),
                );
                let tag = ConstraintTag::RayClosure {
                    region: region.index,
                    probe,
                    angle: angle as u16,
                };
                let crossed: Vec<VarId> = hit
                    .crossed_edges
                    .iter()
                    .filter_map(|&e| ctx.edge_var(e))
                    .collect();

                if hit.reaches_outside {
                    ctx.backend.add_constraint(Constraint::ge(
                        tag,
                        LinExpr::sum_of(crossed),
                        LinExpr::var(r),
                    ));
                    closures += 1;
                } else if !crossed.is_empty() {
                    let slack = ctx.backend.add_variable(
                        VarRole::RaySlack {
                            region: region.index,
                            probe,
                            angle: angle as u16,
                        },
                        VarDomain::Integer {
                            upper: crossed.len() as u32,
                        },
                    );
                    ctx.backend.add_constraint(Constraint::le(
                        tag,
                        LinExpr::sum_of(crossed) - LinExpr::var(slack),
                        LinExpr::var(r),
                    ));
                    objective.add_term(-RAY_SLACK_PENALTY, slack);
                }
            }
        }

        tracing::debug!(
            region = region.index,
            probes = region.probes.len(),
            cut_edges = cut,
            hard_closures = closures,
            "Added region constraints"
        );
        ctx.regions.push((region, r));
    }

    Ok(objective)
}
