// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optimization backend contract
//!
//! The reconstruction model is handed to a backend through
//! [`OptimizationBackend`]: declare variables, add labeled constraints, set
//! a maximization objective, solve, read values back. Nothing in the model
//! builder depends on a particular solver; any implementation of the trait is
//! interchangeable. [`BranchAndBound`] is an exact backend for small
//! instances.

pub mod branch_bound;
pub mod model;

pub use branch_bound::{BranchAndBound, BranchAndBoundConfig, DEFAULT_TIME_LIMIT_MS};
pub use model::{
    Constraint, ConstraintTag, LinExpr, Model, QuadExpr, Sense, VarDomain, VarId, VarRole,
    Variable,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which backend-side limit stopped the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveLimit {
    Nodes,
    Time,
}

impl fmt::Display for SolveLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveLimit::Nodes => write!(f, "node limit"),
            SolveLimit::Time => write!(f, "time limit"),
        }
    }
}

/// How a solve that produced an assignment terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// The assignment is proven optimal
    Optimal,
    /// Best incumbent when a limit stopped the search; not certified
    Feasible { limit: SolveLimit },
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Failures reported by an optimization backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Model is infeasible")]
    Infeasible,

    #[error("Search stopped at the {limit} before finding a feasible assignment")]
    NoIncumbent { limit: SolveLimit },

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Narrow contract between the model builder and a solver
pub trait OptimizationBackend {
    /// Declare a decision variable carrying its role
    fn add_variable(&mut self, role: VarRole, domain: VarDomain) -> VarId;

    /// Add a labeled (in)equality; may be linear, bilinear or quadratic
    fn add_constraint(&mut self, constraint: Constraint);

    /// Set the expression to maximize
    fn set_objective(&mut self, objective: LinExpr);

    /// Maximize the objective subject to all constraints
    fn solve(&mut self) -> BackendResult<SolveStatus>;

    /// Every declared variable, in declaration order
    fn variables(&self) -> &[Variable];

    /// Resolved value of a variable after a successful solve
    fn value(&self, var: VarId) -> Option<f64>;

    /// Objective value of the returned assignment
    fn objective_value(&self) -> Option<f64>;
}
