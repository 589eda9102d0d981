// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::backend::BackendError;
use thiserror::Error;

/// Result type for reconstruction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or solving an outline model
#[derive(Error, Debug)]
pub enum Error {
    #[error("{feature} is enabled but no {missing} were provided")]
    MissingInput {
        feature: &'static str,
        missing: &'static str,
    },

    #[error("{feature} is enabled but `{threshold}` is not set")]
    MissingThreshold {
        feature: &'static str,
        threshold: &'static str,
    },

    #[error("{feature} requires `with_corner_variables`")]
    RequiresJunctionVariables { feature: &'static str },

    #[error("Expected {expected} {what} (one per junction), got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} is {actual_width}x{actual_height}, edge map is {expected_width}x{expected_height}")]
    ShapeMismatch {
        what: String,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("No outline satisfies the enabled constraints")]
    Infeasible,

    #[error("Backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Infeasible => Error::Infeasible,
            other => Error::Backend(other),
        }
    }
}
