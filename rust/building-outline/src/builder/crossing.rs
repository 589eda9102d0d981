// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::context::ModelContext;
use crate::backend::{Constraint, ConstraintTag, LinExpr};
use crate::error::Result;
use crate::geometry::segments_cross;

/// No two crossing candidate edges may both be active
pub fn crossing_avoidance(ctx: &mut ModelContext) -> Result<LinExpr> {
    let candidates = ctx.candidates.clone();
    let mut pairs = 0usize;

    for (i, a) in candidates.iter().enumerate() {
        let (pa, qa) = (ctx.position(a.k), ctx.position(a.l));
        for b in &candidates[i + 1..] {
            if !segments_cross(&pa, &qa, &ctx.position(b.k), &ctx.position(b.l)) {
                continue;
            }
            let (Some(ea), Some(eb)) = (ctx.edge_var(*a), ctx.edge_var(*b)) else {
                continue;
            };
            ctx.backend.add_constraint(Constraint::le(
                ConstraintTag::Crossing(*a, *b),
                LinExpr::var(ea) + LinExpr::var(eb),
                LinExpr::constant(1.0),
            ));
            pairs += 1;
        }
    }

    tracing::debug!(pairs, "Added crossing constraints");
    Ok(LinExpr::zero())
}
