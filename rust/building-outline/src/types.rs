// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for outline reconstruction

use crate::backend::SolveStatus;
use image::{GrayImage, ImageBuffer, Luma};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Per-pixel edge confidence raster, values in `[0, 1]`
pub type EdgeMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A junction position in raster coordinates; y grows down the image
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        nalgebra::distance(&Point2::from(*self), &Point2::from(*other))
    }

    /// Nearest integer pixel, as used when stamping strokes
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    /// Whether both coordinates lie within `margin` pixels of a
    /// `width` x `height` raster
    pub fn near_raster(&self, width: u32, height: u32, margin: f64) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (-margin..=width as f64 + margin).contains(&self.x)
            && (-margin..=height as f64 + margin).contains(&self.y)
    }
}

impl From<Point2D> for Point2<f64> {
    fn from(p: Point2D) -> Self {
        Point2::new(p.x, p.y)
    }
}

/// Canonical unordered junction pair with `k < l`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub k: usize,
    pub l: usize,
}

impl EdgeKey {
    /// Canonicalize a pair; `None` for a self-loop
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { k: a, l: b }),
            std::cmp::Ordering::Greater => Some(Self { k: b, l: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn touches(&self, junction: usize) -> bool {
        self.k == junction || self.l == junction
    }

    /// The endpoint opposite `junction`, if `junction` is an endpoint
    pub fn other(&self, junction: usize) -> Option<usize> {
        if self.k == junction {
            Some(self.l)
        } else if self.l == junction {
            Some(self.k)
        } else {
            None
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.k, self.l)
    }
}

/// Candidate corner of the building outline
#[derive(Debug, Clone)]
pub struct Junction {
    pub index: usize,
    pub position: Point2D,
    /// Hypothesized incident-edge directions in degrees (clockwise, circular)
    pub directions: SmallVec<[f64; 4]>,
    pub confidence: Option<f64>,
    /// One confidence per entry of `directions`
    pub direction_confidences: SmallVec<[f64; 4]>,
}

/// Everything the detectors produced for one reconstruction call
#[derive(Debug, Clone)]
pub struct ReconstructionInput {
    pub junctions: Vec<Point2D>,
    pub edge_map: EdgeMap,
    pub regions: Option<Vec<GrayImage>>,
    pub directions: Option<Vec<Vec<f64>>>,
    pub corner_confidences: Option<Vec<f64>>,
    pub direction_confidences: Option<Vec<Vec<f64>>>,
}

impl ReconstructionInput {
    pub fn new(junctions: Vec<Point2D>, edge_map: EdgeMap) -> Self {
        Self {
            junctions,
            edge_map,
            regions: None,
            directions: None,
            corner_confidences: None,
            direction_confidences: None,
        }
    }

    pub fn with_regions(mut self, regions: Vec<GrayImage>) -> Self {
        self.regions = Some(regions);
        self
    }

    pub fn with_directions(mut self, directions: Vec<Vec<f64>>) -> Self {
        self.directions = Some(directions);
        self
    }

    pub fn with_corner_confidences(mut self, confidences: Vec<f64>) -> Self {
        self.corner_confidences = Some(confidences);
        self
    }

    pub fn with_direction_confidences(mut self, confidences: Vec<Vec<f64>>) -> Self {
        self.direction_confidences = Some(confidences);
        self
    }

    /// Assemble per-junction records from the parallel input sequences
    pub fn junction_records(&self) -> Vec<Junction> {
        self.junctions
            .iter()
            .enumerate()
            .map(|(index, &position)| Junction {
                index,
                position,
                directions: self
                    .directions
                    .as_ref()
                    .and_then(|d| d.get(index))
                    .map(|d| d.iter().copied().collect())
                    .unwrap_or_default(),
                confidence: self
                    .corner_confidences
                    .as_ref()
                    .and_then(|c| c.get(index))
                    .copied(),
                direction_confidences: self
                    .direction_confidences
                    .as_ref()
                    .and_then(|c| c.get(index))
                    .map(|c| c.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// A region the solver claimed as enclosed area
#[derive(Debug, Clone)]
pub struct ActiveRegion {
    /// Index into the input region sequence
    pub index: usize,
    pub eroded_mask: GrayImage,
}

/// Decoded reconstruction
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub junctions: Vec<Point2D>,
    pub active_junctions: Vec<usize>,
    pub active_edges: Vec<EdgeKey>,
    /// Present only when region reasoning was enabled
    pub active_regions: Option<Vec<ActiveRegion>>,
    pub objective: f64,
    pub status: SolveStatus,
}

impl Reconstruction {
    /// Whether the backend proved the returned assignment optimal
    pub fn certified_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Number of active edges incident to `junction`
    pub fn degree(&self, junction: usize) -> usize {
        self.active_edges
            .iter()
            .filter(|e| e.touches(junction))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_canonical() {
        assert_eq!(EdgeKey::new(3, 1), Some(EdgeKey { k: 1, l: 3 }));
        assert_eq!(EdgeKey::new(1, 3), EdgeKey::new(3, 1));
        assert_eq!(EdgeKey::new(2, 2), None);
    }

    #[test]
    fn test_edge_key_other() {
        let e = EdgeKey::new(4, 7).unwrap();
        assert_eq!(e.other(4), Some(7));
        assert_eq!(e.other(7), Some(4));
        assert_eq!(e.other(5), None);
        assert_eq!(e.to_string(), "4_7");
    }

    #[test]
    fn test_junction_records() {
        let input = ReconstructionInput::new(
            vec![Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0)],
            EdgeMap::new(8, 8),
        )
        .with_directions(vec![vec![0.0, 90.0], vec![180.0]])
        .with_corner_confidences(vec![0.9, 0.4]);

        let records = input.junction_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].directions.as_slice(), &[0.0, 90.0]);
        assert_eq!(records[1].confidence, Some(0.4));
        assert!(records[1].direction_confidences.is_empty());
    }

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(Point2D::new(2.6, -0.4).to_pixel(), (3, 0));
    }

    #[test]
    fn test_point_near_raster() {
        assert!(Point2D::new(-10.0, 70.0).near_raster(64, 64, 64.0));
        assert!(!Point2D::new(1e9, 10.0).near_raster(64, 64, 64.0));
        assert!(!Point2D::new(f64::NAN, 10.0).near_raster(64, 64, 64.0));
        assert!(!Point2D::new(10.0, f64::NEG_INFINITY).near_raster(64, 64, 64.0));
    }
}
