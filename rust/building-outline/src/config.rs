// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconstruction configuration and fail-fast input validation

use crate::error::{Error, Result};
use crate::types::ReconstructionInput;
use serde::{Deserialize, Serialize};

/// Feature flags and thresholds of the outline model
///
/// Every family of constraints is off by default; thresholds a family needs
/// must be set when the family is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Declare a binary per junction and tie edges to their endpoints
    pub with_corner_variables: bool,
    /// Weight edges by `edgeness - edge_threshold`
    pub with_edge_confidence: bool,
    /// Weight edges by `conf_k * conf_l * edgeness - corner_edge_thresh`
    pub with_corner_edge_confidence: bool,
    /// Active junctions need at least two active edges
    pub corner_min_degree_constraint: bool,
    /// Drop junctions with fewer than two direction hypotheses
    pub ignore_invalid_corners: bool,
    /// Region variables, overlap exclusion and ray closure
    pub use_regions: bool,
    /// Near-duplicate junctions are mutually exclusive
    pub corner_suppression: bool,
    /// Crossing candidate edges are mutually exclusive
    pub intersection_constraint: bool,
    /// At most one active edge per direction hypothesis
    pub use_junctions: bool,
    /// Direction hypotheses as rewarded variables
    pub use_junctions_with_var: bool,
    /// Keep only candidate edges supported by a direction hypothesis at both ends
    pub prune_unsupported_edges: bool,

    /// Suppression radius in pixels
    pub dist_thresh: Option<f64>,
    /// Half-width of a direction bin in degrees
    pub angle_thresh: Option<f64>,
    /// Edgeness offset for `with_edge_confidence`
    pub edge_threshold: Option<f64>,
    /// Offset for `with_corner_edge_confidence`
    pub corner_edge_thresh: Option<f64>,
    /// Overlap fraction above which an edge may not cut through a region
    pub region_hit_threshold: Option<f64>,
    /// Offset on direction-claim rewards
    pub theta_threshold: f64,
    /// Erosion window of region masks (pixels)
    pub filter_size: u32,
    /// Reward per active region
    pub region_weight: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            with_corner_variables: false,
            with_edge_confidence: false,
            with_corner_edge_confidence: false,
            corner_min_degree_constraint: false,
            ignore_invalid_corners: false,
            use_regions: false,
            corner_suppression: false,
            intersection_constraint: false,
            use_junctions: false,
            use_junctions_with_var: false,
            prune_unsupported_edges: false,
            dist_thresh: None,
            angle_thresh: None,
            edge_threshold: None,
            corner_edge_thresh: None,
            region_hit_threshold: None,
            theta_threshold: 0.2,
            filter_size: 11,
            region_weight: 1000.0,
        }
    }
}

/// How candidate edges are rewarded in the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeWeighting {
    Uniform,
    Edgeness { threshold: f64 },
    CornerEdgeness { threshold: f64 },
}

impl ReconstructionConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Angular consistency in either form
    pub fn angular_consistency(&self) -> bool {
        self.use_junctions || self.use_junctions_with_var
    }

    /// Selected edge weighting; edgeness wins when both flags are set
    pub fn edge_weighting(&self) -> Result<EdgeWeighting> {
        if self.with_edge_confidence {
            let threshold = require(self.edge_threshold, "edge confidence weighting", "edge_threshold")?;
            Ok(EdgeWeighting::Edgeness { threshold })
        } else if self.with_corner_edge_confidence {
            let threshold = require(
                self.corner_edge_thresh,
                "corner-edge confidence weighting",
                "corner_edge_thresh",
            )?;
            Ok(EdgeWeighting::CornerEdgeness { threshold })
        } else {
            Ok(EdgeWeighting::Uniform)
        }
    }

    /// Check every enabled family against the supplied inputs
    ///
    /// Runs before any variable is declared so a bad call never reaches the
    /// backend.
    pub fn validate(&self, input: &ReconstructionInput) -> Result<()> {
        if self.filter_size == 0 {
            return Err(Error::InvalidConfig("filter_size must be positive".into()));
        }
        if !self.region_weight.is_finite() || !self.theta_threshold.is_finite() {
            return Err(Error::InvalidConfig(
                "region_weight and theta_threshold must be finite".into(),
            ));
        }
        let thresholds = [
            self.dist_thresh,
            self.angle_thresh,
            self.edge_threshold,
            self.corner_edge_thresh,
            self.region_hit_threshold,
        ];
        if thresholds.iter().flatten().any(|t| !t.is_finite()) {
            return Err(Error::InvalidConfig("thresholds must be finite".into()));
        }

        self.validate_lengths(input)?;
        Self::validate_positions(input)?;

        if let EdgeWeighting::CornerEdgeness { .. } = self.edge_weighting()? {
            if input.corner_confidences.is_none() {
                return Err(Error::MissingInput {
                    feature: "corner-edge confidence weighting",
                    missing: "corner confidences",
                });
            }
        }

        let needs_directions = [
            (self.use_junctions, "angular consistency"),
            (self.use_junctions_with_var, "direction variables"),
            (self.prune_unsupported_edges, "candidate pruning"),
        ];
        for (enabled, feature) in needs_directions {
            if !enabled {
                continue;
            }
            if input.directions.is_none() {
                return Err(Error::MissingInput {
                    feature,
                    missing: "junction directions",
                });
            }
            require(self.angle_thresh, feature, "angle_thresh")?;
        }
        if self.ignore_invalid_corners && input.directions.is_none() {
            return Err(Error::MissingInput {
                feature: "corner filtering",
                missing: "junction directions",
            });
        }
        if self.use_junctions_with_var && input.direction_confidences.is_none() {
            return Err(Error::MissingInput {
                feature: "direction variables",
                missing: "direction confidences",
            });
        }

        if self.use_regions {
            let regions = input.regions.as_ref().ok_or(Error::MissingInput {
                feature: "region reasoning",
                missing: "region masks",
            })?;
            require(self.region_hit_threshold, "region reasoning", "region_hit_threshold")?;
            let (width, height) = input.edge_map.dimensions();
            for (i, region) in regions.iter().enumerate() {
                if region.dimensions() != (width, height) {
                    return Err(Error::ShapeMismatch {
                        what: format!("Region {}", i),
                        expected_width: width,
                        expected_height: height,
                        actual_width: region.width(),
                        actual_height: region.height(),
                    });
                }
            }
        }

        if self.corner_suppression {
            if !self.with_corner_variables {
                return Err(Error::RequiresJunctionVariables {
                    feature: "corner suppression",
                });
            }
            require(self.dist_thresh, "corner suppression", "dist_thresh")?;
        }
        if self.corner_min_degree_constraint && !self.with_corner_variables {
            return Err(Error::RequiresJunctionVariables {
                feature: "minimum degree",
            });
        }

        Ok(())
    }

    /// Junctions must be finite and no further than one raster extent
    /// outside the edge map
    fn validate_positions(input: &ReconstructionInput) -> Result<()> {
        let (width, height) = input.edge_map.dimensions();
        let margin = width.max(height) as f64;
        match input
            .junctions
            .iter()
            .position(|p| !p.near_raster(width, height, margin))
        {
            Some(i) => Err(Error::InvalidConfig(format!(
                "junction {} at ({}, {}) lies far outside the {}x{} edge map",
                i, input.junctions[i].x, input.junctions[i].y, width, height
            ))),
            None => Ok(()),
        }
    }

    fn validate_lengths(&self, input: &ReconstructionInput) -> Result<()> {
        let expected = input.junctions.len();
        let check = |what: &'static str, actual: Option<usize>| match actual {
            Some(actual) if actual != expected => Err(Error::LengthMismatch {
                what,
                expected,
                actual,
            }),
            _ => Ok(()),
        };
        check("direction lists", input.directions.as_ref().map(Vec::len))?;
        check("corner confidences", input.corner_confidences.as_ref().map(Vec::len))?;
        check(
            "direction confidence lists",
            input.direction_confidences.as_ref().map(Vec::len),
        )?;

        if let (Some(directions), Some(confidences)) =
            (&input.directions, &input.direction_confidences)
        {
            for (dirs, confs) in directions.iter().zip(confidences) {
                if dirs.len() != confs.len() {
                    return Err(Error::LengthMismatch {
                        what: "direction confidences at a junction",
                        expected: dirs.len(),
                        actual: confs.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn require(value: Option<f64>, feature: &'static str, threshold: &'static str) -> Result<f64> {
    value.ok_or(Error::MissingThreshold { feature, threshold })
}
