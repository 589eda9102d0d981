// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Objective coefficients shared across stages
//!
//! Stage contributions are summed by [`super::build_model`]; these are the
//! fixed penalties that are not exposed through the configuration.

/// Cost per incident edge that matches none of a junction's directions
pub const UNMATCHED_DIRECTION_PENALTY: f64 = 0.1;

/// Cost per unit of closure violation along a ray that stays outside
pub const RAY_SLACK_PENALTY: f64 = 0.05;
