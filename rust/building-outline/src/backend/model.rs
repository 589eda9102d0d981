// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backend-neutral model vocabulary: tagged variables, expressions, constraints

use crate::types::EdgeKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Handle to a declared decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a decision variable stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarRole {
    Junction(usize),
    Edge(EdgeKey),
    Region(usize),
    /// Direction hypothesis `direction` at `junction` is claimed by an edge
    DirectionClaim { junction: usize, direction: usize },
    /// Count of edges at `junction` matching none of its directions
    UnmatchedSlack { junction: usize },
    /// Closure violations along one probe ray of a region
    RaySlack { region: usize, probe: usize, angle: u16 },
}

impl fmt::Display for VarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarRole::Junction(j) => write!(f, "junc_{}", j),
            VarRole::Edge(e) => write!(f, "line_{}", e),
            VarRole::Region(i) => write!(f, "reg_{}", i),
            VarRole::DirectionClaim { junction, direction } => {
                write!(f, "angle_{}_{}", junction, direction)
            }
            VarRole::UnmatchedSlack { junction } => write!(f, "slack_unmatched_{}", junction),
            VarRole::RaySlack {
                region,
                probe,
                angle,
            } => write!(f, "slack_ray_{}_{}_{}", region, probe, angle),
        }
    }
}

/// Admissible values of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarDomain {
    Binary,
    /// Non-negative integer in `0..=upper`
    Integer { upper: u32 },
}

impl VarDomain {
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            VarDomain::Binary => (0, 1),
            VarDomain::Integer { upper } => (0, *upper as i64),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, VarDomain::Binary)
    }
}

/// A declared decision variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VarId,
    pub role: VarRole,
    pub domain: VarDomain,
}

/// Affine expression `constant + Σ coef · var`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    pub constant: f64,
    pub terms: Vec<(f64, VarId)>,
}

impl LinExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    pub fn var(var: VarId) -> Self {
        Self::term(1.0, var)
    }

    pub fn term(coef: f64, var: VarId) -> Self {
        Self {
            constant: 0.0,
            terms: vec![(coef, var)],
        }
    }

    /// Unit-coefficient sum of the given variables
    pub fn sum_of(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            constant: 0.0,
            terms: vars.into_iter().map(|v| (1.0, v)).collect(),
        }
    }

    pub fn add_term(&mut self, coef: f64, var: VarId) {
        self.terms.push((coef, var));
    }

    pub fn evaluate(&self, value: impl Fn(VarId) -> f64) -> f64 {
        self.constant + self.terms.iter().map(|(c, v)| c * value(*v)).sum::<f64>()
    }
}

impl Add for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self += rhs;
        self
    }
}

impl AddAssign for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.constant += rhs.constant;
        self.terms.extend(rhs.terms);
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: LinExpr) -> LinExpr {
        self + (-rhs)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, factor: f64) -> LinExpr {
        self.constant *= factor;
        for term in &mut self.terms {
            term.0 *= factor;
        }
        self
    }
}

impl Mul for LinExpr {
    type Output = QuadExpr;

    fn mul(self, rhs: LinExpr) -> QuadExpr {
        let mut linear = LinExpr::constant(self.constant * rhs.constant);
        for &(c, v) in &rhs.terms {
            if self.constant != 0.0 {
                linear.add_term(self.constant * c, v);
            }
        }
        for &(c, v) in &self.terms {
            if rhs.constant != 0.0 {
                linear.add_term(rhs.constant * c, v);
            }
        }

        let mut products = Vec::with_capacity(self.terms.len() * rhs.terms.len());
        for &(a, x) in &self.terms {
            for &(b, y) in &rhs.terms {
                products.push((a * b, x, y));
            }
        }

        QuadExpr { linear, products }
    }
}

impl std::iter::Sum for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::zero(), |acc, e| acc + e)
    }
}

/// Expression with bilinear terms: `linear + Σ coef · a · b`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadExpr {
    pub linear: LinExpr,
    pub products: Vec<(f64, VarId, VarId)>,
}

impl QuadExpr {
    pub fn evaluate(&self, value: impl Fn(VarId) -> f64) -> f64 {
        self.linear.evaluate(&value)
            + self
                .products
                .iter()
                .map(|(c, a, b)| c * value(*a) * value(*b))
                .sum::<f64>()
    }

    /// Every variable the expression mentions
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.linear
            .terms
            .iter()
            .map(|(_, v)| *v)
            .chain(self.products.iter().flat_map(|(_, a, b)| [*a, *b]))
    }
}

impl From<LinExpr> for QuadExpr {
    fn from(linear: LinExpr) -> Self {
        Self {
            linear,
            products: Vec::new(),
        }
    }
}

impl Add for QuadExpr {
    type Output = QuadExpr;

    fn add(mut self, rhs: QuadExpr) -> QuadExpr {
        self.linear += rhs.linear;
        self.products.extend(rhs.products);
        self
    }
}

impl Sub for QuadExpr {
    type Output = QuadExpr;

    fn sub(mut self, rhs: QuadExpr) -> QuadExpr {
        self.linear += -rhs.linear;
        self.products
            .extend(rhs.products.into_iter().map(|(c, a, b)| (-c, a, b)));
        self
    }
}

/// Comparison of a constraint expression against zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// Structured constraint label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintTag {
    JunctionEdge(EdgeKey),
    RegionOverlap { region: usize, edge: EdgeKey },
    RayClosure { region: usize, probe: usize, angle: u16 },
    Crossing(EdgeKey, EdgeKey),
    DirectionBin { junction: usize, direction: usize },
    DirectionClaim { junction: usize, direction: usize },
    UnmatchedBin { junction: usize },
    Suppression { cluster: usize },
    MinDegree { junction: usize },
}

impl fmt::Display for ConstraintTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintTag::JunctionEdge(e) => write!(f, "c_{}", e),
            ConstraintTag::RegionOverlap { region, edge } => write!(f, "r1_{}_{}", region, edge),
            ConstraintTag::RayClosure {
                region,
                probe,
                angle,
            } => write!(f, "r2_{}_{}_{}", region, probe, angle),
            ConstraintTag::Crossing(a, b) => write!(f, "i_{}_{}", a, b),
            ConstraintTag::DirectionBin {
                junction,
                direction,
            } => write!(f, "a_{}_{}", direction, junction),
            ConstraintTag::DirectionClaim {
                junction,
                direction,
            } => write!(f, "ac_{}_{}", direction, junction),
            ConstraintTag::UnmatchedBin { junction } => write!(f, "a_-1_{}", junction),
            ConstraintTag::Suppression { cluster } => write!(f, "s_{}", cluster),
            ConstraintTag::MinDegree { junction } => write!(f, "d_1_{}", junction),
        }
    }
}

/// `expr (sense) 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub tag: ConstraintTag,
    pub expr: QuadExpr,
    pub sense: Sense,
}

impl Constraint {
    pub fn new(
        tag: ConstraintTag,
        lhs: impl Into<QuadExpr>,
        sense: Sense,
        rhs: impl Into<QuadExpr>,
    ) -> Self {
        Self {
            tag,
            expr: lhs.into() - rhs.into(),
            sense,
        }
    }

    pub fn le(tag: ConstraintTag, lhs: impl Into<QuadExpr>, rhs: impl Into<QuadExpr>) -> Self {
        Self::new(tag, lhs, Sense::LessEqual, rhs)
    }

    pub fn ge(tag: ConstraintTag, lhs: impl Into<QuadExpr>, rhs: impl Into<QuadExpr>) -> Self {
        Self::new(tag, lhs, Sense::GreaterEqual, rhs)
    }

    pub fn eq(tag: ConstraintTag, lhs: impl Into<QuadExpr>, rhs: impl Into<QuadExpr>) -> Self {
        Self::new(tag, lhs, Sense::Equal, rhs)
    }

    pub fn is_satisfied(&self, value: impl Fn(VarId) -> f64, tolerance: f64) -> bool {
        let v = self.expr.evaluate(value);
        match self.sense {
            Sense::LessEqual => v <= tolerance,
            Sense::GreaterEqual => v >= -tolerance,
            Sense::Equal => v.abs() <= tolerance,
        }
    }
}

/// A complete model: what every backend receives
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: LinExpr,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, role: VarRole, domain: VarDomain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable { id, role, domain });
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn constraints_tagged(
        &self,
        pred: impl Fn(&ConstraintTag) -> bool,
    ) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| pred(&c.tag))
    }
}
