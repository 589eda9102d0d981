// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray casting from region boundaries
//!
//! A ray leaves a boundary probe of a region and runs far past the raster.
//! The candidate edges it crosses are the edges that could close the region
//! in that direction; whether it runs into another region (or back across
//! its own core) decides whether closure there is mandatory.

use crate::geometry::{ray_end, segments_touch};
use crate::raster::{lit_pixels, stroke_footprint};
use crate::types::{EdgeKey, Point2D};
use image::GrayImage;

/// Probe length in pixels; far enough to leave any raster the detectors emit
pub const RAY_LENGTH: f64 = 1000.0;

/// Stroke width of the rasterized probe
pub const RAY_STROKE: u32 = 8;

/// Angular spacing of rays around each probe point
pub const RAY_STEP_DEGREES: usize = 10;

/// Share of the probe footprint allowed inside the originating region before
/// the ray counts as re-entering it
pub const SELF_OVERLAP_LIMIT: f64 = 0.05;

/// What a single probe ray ran into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayHit {
    /// Candidate edges the ray touches, endpoints included
    pub crossed_edges: Vec<EdgeKey>,
    /// Whether the ray reaches another region or folds back into its own
    pub reaches_outside: bool,
}

/// Angles, in degrees, at which rays are cast from every probe
pub fn ray_angles() -> impl Iterator<Item = f64> {
    (0..360).step_by(RAY_STEP_DEGREES).map(|a| a as f64)
}

/// Cast a probe ray from `origin` at `angle` degrees
///
/// `others` is the union of the other live regions' masks, if any.
pub fn cast_ray(
    origin: &Point2D,
    angle: f64,
    candidates: &[EdgeKey],
    junctions: &[Point2D],
    own_eroded: &GrayImage,
    others: Option<&GrayImage>,
) -> RayHit {
    let start = Point2D::new(origin.x.trunc(), origin.y.trunc());
    let end = ray_end(&start, angle, RAY_LENGTH);

    let crossed_edges = candidates
        .iter()
        .filter(|e| segments_touch(&start, &end, &junctions[e.k], &junctions[e.l]))
        .copied()
        .collect();

    let footprint = stroke_footprint(
        own_eroded.width(),
        own_eroded.height(),
        &start,
        &end,
        RAY_STROKE,
    );

    let mut total = 0usize;
    let mut own = 0usize;
    let mut hits_other = false;
    for (x, y) in lit_pixels(&footprint) {
        total += 1;
        if own_eroded.get_pixel(x, y).0[0] > 0 {
            own += 1;
        }
        if let Some(union) = others {
            if x < union.width() && y < union.height() && union.get_pixel(x, y).0[0] > 0 {
                hits_other = true;
            }
        }
    }

    let self_overlap = if total == 0 {
        0.0
    } else {
        own as f64 / total as f64
    };

    RayHit {
        crossed_edges,
        reaches_outside: hits_other || self_overlap > SELF_OVERLAP_LIMIT,
    }
}
