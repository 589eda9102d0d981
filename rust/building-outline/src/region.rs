// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Region masks prepared for closure reasoning

use crate::raster::{binarize, contour_probes, erode_mask, is_empty_mask};
use crate::types::Point2D;
use image::GrayImage;

/// A segmentation mask with its derived eroded core and boundary probes
#[derive(Debug, Clone)]
pub struct Region {
    /// Index into the caller's region sequence
    pub index: usize,
    /// Binarized input mask
    pub mask: GrayImage,
    /// Min-filtered mask used for robust containment
    pub eroded: GrayImage,
    /// Contour points of the eroded mask that rays are cast from
    pub probes: Vec<Point2D>,
}

impl Region {
    /// Erode and probe a mask; `None` when nothing survives erosion
    pub fn prepare(index: usize, mask: &GrayImage, filter_size: u32) -> Option<Self> {
        let eroded = erode_mask(mask, filter_size);
        if is_empty_mask(&eroded) {
            tracing::debug!(region = index, "Region vanished under erosion, skipping");
            return None;
        }

        let probes = contour_probes(&eroded);

        Some(Self {
            index,
            mask: binarize(mask),
            eroded,
            probes,
        })
    }
}

/// Prepare every region, keeping only those with a non-empty eroded core
pub fn prepare_regions(masks: &[GrayImage], filter_size: u32) -> Vec<Region> {
    masks
        .iter()
        .enumerate()
        .filter_map(|(i, mask)| Region::prepare(i, mask, filter_size))
        .collect()
}
