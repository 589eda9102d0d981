// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raster sampling for the reconstruction model
//!
//! Segments are rasterized the way the detectors draw them: a Bresenham
//! centerline, stamped with a filled disc of radius `stroke / 2` when the
//! stroke is wider than a pixel. Widths 0 and 1 give a one-pixel line, width
//! 2 a three-pixel band. Sampling then reduces the edge map or a mask over
//! that footprint.

use crate::types::{EdgeMap, Point2D};
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, BresenhamLineIter};

/// Stroke width used when sampling edgeness along a candidate edge
pub const EDGE_STROKE: u32 = 2;

/// Stroke width used when measuring how much of an edge lies inside a region
pub const OVERLAP_STROKE: u32 = 1;

/// Maximum number of contour points probed per region
pub const MAX_PROBES: usize = 10;

/// Rasterize `from → to` onto a blank canvas of the given size
///
/// Lit pixels are 255. Parts of the stroke outside the canvas are clipped.
pub fn stroke_footprint(
    width: u32,
    height: u32,
    from: &Point2D,
    to: &Point2D,
    stroke: u32,
) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    let (x0, y0) = from.to_pixel();
    let (x1, y1) = to.to_pixel();
    let start = (x0 as f32, y0 as f32);
    let end = (x1 as f32, y1 as f32);

    let radius = (stroke / 2) as i32;
    if radius == 0 {
        draw_line_segment_mut(&mut canvas, start, end, Luma([255]));
    } else {
        for center in BresenhamLineIter::new(start, end) {
            draw_filled_circle_mut(&mut canvas, center, radius, Luma([255]));
        }
    }
    canvas
}

/// Pixel coordinates lit on a footprint canvas
pub fn lit_pixels(canvas: &GrayImage) -> impl Iterator<Item = (u32, u32)> + '_ {
    canvas
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| (x, y))
}

/// Mean edge confidence under the edge stroke of `from → to`
///
/// Zero-length segments and footprints that fall entirely outside the
/// raster weigh `0.0`.
pub fn line_weight(edge_map: &EdgeMap, from: &Point2D, to: &Point2D) -> f64 {
    if from.distance_to(to) < f64::EPSILON {
        return 0.0;
    }
    let canvas = stroke_footprint(edge_map.width(), edge_map.height(), from, to, EDGE_STROKE);

    let mut sum = 0.0;
    let mut count = 0usize;
    for (x, y) in lit_pixels(&canvas) {
        sum += edge_map.get_pixel(x, y).0[0] as f64;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Fraction of the unit-width footprint of `from → to` inside `mask`
pub fn overlap_fraction(mask: &GrayImage, from: &Point2D, to: &Point2D) -> f64 {
    let canvas = stroke_footprint(mask.width(), mask.height(), from, to, OVERLAP_STROKE);

    let mut inside = 0usize;
    let mut total = 0usize;
    for (x, y) in lit_pixels(&canvas) {
        total += 1;
        if mask.get_pixel(x, y).0[0] > 0 {
            inside += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        inside as f64 / total as f64
    }
}

/// Square min-filter of side `filter_size` (binary erosion, L∞ norm)
pub fn erode_mask(mask: &GrayImage, filter_size: u32) -> GrayImage {
    let radius = (filter_size / 2).min(u8::MAX as u32) as u8;
    if radius == 0 {
        return binarize(mask);
    }
    imageproc::morphology::erode(&binarize(mask), Norm::LInf, radius)
}

/// Map any non-zero pixel to 255
pub fn binarize(mask: &GrayImage) -> GrayImage {
    let mut result = mask.clone();
    for pixel in result.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > 0 { 255 } else { 0 };
    }
    result
}

pub fn is_empty_mask(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == 0)
}

/// Pixelwise union of masks on a canvas of the given size
pub fn union_masks<'a>(
    masks: impl IntoIterator<Item = &'a GrayImage>,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut union = GrayImage::new(width, height);
    for mask in masks {
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel.0[0] > 0 && x < width && y < height {
                union.put_pixel(x, y, Luma([255]));
            }
        }
    }
    union
}

/// Boundary points of every contour in the mask, concatenated
pub fn contour_points(mask: &GrayImage) -> Vec<Point2D> {
    find_contours::<i32>(mask)
        .into_iter()
        .flat_map(|contour| contour.points)
        .map(|p| Point2D::new(p.x as f64, p.y as f64))
        .collect()
}

/// At most [`MAX_PROBES`] evenly spaced boundary points of a mask
pub fn contour_probes(mask: &GrayImage) -> Vec<Point2D> {
    sample_evenly(&contour_points(mask), MAX_PROBES)
}

/// Evenly spaced subset of at most `max` points, starting at the first
pub fn sample_evenly(points: &[Point2D], max: usize) -> Vec<Point2D> {
    let n = points.len();
    let m = n.min(max);
    (0..m).map(|i| points[i * n / m]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filled_square(size: u32, lo: u32, hi: u32) -> GrayImage {
        let mut mask = GrayImage::new(size, size);
        for y in lo..hi {
            for x in lo..hi {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn test_footprint_width() {
        let a = Point2D::new(5.0, 10.0);
        let b = Point2D::new(25.0, 10.0);
        let thin: Vec<_> = lit_pixels(&stroke_footprint(40, 40, &a, &b, 1)).collect();
        let thick: Vec<_> = lit_pixels(&stroke_footprint(40, 40, &a, &b, 8)).collect();
        assert_eq!(thin.len(), 21);
        assert!(thick.len() > thin.len() * 5);
    }

    #[test]
    fn test_footprint_band_widths() {
        let a = Point2D::new(5.0, 10.0);
        let b = Point2D::new(25.0, 10.0);
        let rows = |stroke| {
            let mut ys: Vec<u32> = lit_pixels(&stroke_footprint(40, 40, &a, &b, stroke))
                .filter(|&(x, _)| x == 15)
                .map(|(_, y)| y)
                .collect();
            ys.dedup();
            ys
        };
        assert_eq!(rows(1), vec![10]);
        assert_eq!(rows(EDGE_STROKE), vec![9, 10, 11]);
        assert_eq!(rows(8), (6..=14).collect::<Vec<_>>());
    }

    #[test]
    fn test_footprint_clipped() {
        let a = Point2D::new(-50.0, -50.0);
        let b = Point2D::new(-10.0, -10.0);
        assert_eq!(lit_pixels(&stroke_footprint(16, 16, &a, &b, 2)).count(), 0);
    }

    #[test]
    fn test_line_weight_saturated() {
        let edge_map = EdgeMap::from_pixel(32, 32, Luma([1.0]));
        let w = line_weight(&edge_map, &Point2D::new(2.0, 2.0), &Point2D::new(20.0, 25.0));
        assert_relative_eq!(w, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_line_weight_degenerate() {
        let edge_map = EdgeMap::from_pixel(32, 32, Luma([1.0]));
        let p = Point2D::new(4.0, 4.0);
        assert_eq!(line_weight(&edge_map, &p, &p), 0.0);
    }

    #[test]
    fn test_line_weight_monotone() {
        let a = Point2D::new(4.0, 16.0);
        let b = Point2D::new(28.0, 16.0);
        let mut edge_map = EdgeMap::from_pixel(32, 32, Luma([0.2]));
        let before = line_weight(&edge_map, &a, &b);

        let footprint = stroke_footprint(32, 32, &a, &b, EDGE_STROKE);
        for (i, (x, y)) in lit_pixels(&footprint).enumerate() {
            if i % 3 == 0 {
                edge_map.put_pixel(x, y, Luma([0.9]));
            }
        }
        let after = line_weight(&edge_map, &a, &b);
        assert!(after > before);
    }

    #[test]
    fn test_overlap_fraction() {
        let mask = filled_square(32, 0, 16);
        let inside = overlap_fraction(&mask, &Point2D::new(2.0, 5.0), &Point2D::new(12.0, 5.0));
        let half = overlap_fraction(&mask, &Point2D::new(0.0, 5.0), &Point2D::new(31.0, 5.0));
        let outside = overlap_fraction(&mask, &Point2D::new(20.0, 20.0), &Point2D::new(30.0, 30.0));
        assert_relative_eq!(inside, 1.0);
        assert_relative_eq!(half, 0.5);
        assert_relative_eq!(outside, 0.0);
    }

    #[test]
    fn test_erode_shrinks_square() {
        let mask = filled_square(64, 10, 40);
        let eroded = erode_mask(&mask, 11);
        assert!(eroded.get_pixel(25, 25).0[0] > 0);
        assert_eq!(eroded.get_pixel(12, 25).0[0], 0);
        assert!(eroded.get_pixel(15, 15).0[0] > 0);
        assert_eq!(eroded.get_pixel(14, 25).0[0], 0);
        // Input untouched
        assert!(mask.get_pixel(12, 25).0[0] > 0);
    }

    #[test]
    fn test_erode_removes_thin_region() {
        let mask = filled_square(64, 10, 16);
        assert!(is_empty_mask(&erode_mask(&mask, 11)));
    }

    #[test]
    fn test_contour_points_on_boundary() {
        let mask = filled_square(32, 8, 20);
        let points = contour_points(&mask);
        assert!(!points.is_empty());
        for p in &points {
            let on_edge = p.x == 8.0 || p.x == 19.0 || p.y == 8.0 || p.y == 19.0;
            assert!(on_edge, "{:?} not on boundary", p);
        }
    }

    #[test]
    fn test_sample_evenly() {
        let points: Vec<_> = (0..25).map(|i| Point2D::new(i as f64, 0.0)).collect();
        let sampled = sample_evenly(&points, MAX_PROBES);
        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled[0].x, 0.0);
        assert_eq!(sampled[1].x, 2.0);
        assert_eq!(sampled[9].x, 22.0);
        assert_eq!(sample_evenly(&points[..3], MAX_PROBES).len(), 3);
        assert!(sample_evenly(&[], MAX_PROBES).is_empty());
    }

    #[test]
    fn test_union_masks() {
        let a = filled_square(16, 0, 4);
        let b = filled_square(16, 10, 14);
        let union = union_masks([&a, &b], 16, 16);
        assert!(union.get_pixel(1, 1).0[0] > 0);
        assert!(union.get_pixel(12, 12).0[0] > 0);
        assert_eq!(union.get_pixel(7, 7).0[0], 0);
    }
}
