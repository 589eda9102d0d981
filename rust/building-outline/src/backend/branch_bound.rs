// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exact depth-first branch-and-bound over bounded integer variables
//!
//! Every node carries an integer interval per variable. Constraints are
//! propagated with interval arithmetic (bilinear terms become linear once one
//! factor is fixed), and a node is pruned when its optimistic objective bound
//! cannot beat the incumbent. Rows of the form `Σ x <= 1` over binaries
//! (crossing pairs, direction bins) are grouped so that each group adds at
//! most its best reward to the bound.
//!
//! # Size envelope
//!
//! The search is exponential in the worst case. With every constraint family
//! enabled, around ten junctions (45 candidate edges) solve to proven
//! optimality in well under a second on a release build; at a dozen junctions
//! and beyond the proof can take tens of seconds. The default configuration
//! therefore stops after [`DEFAULT_TIME_LIMIT_MS`] and returns the best
//! outline found as [`SolveStatus::Feasible`]. Larger inputs should use a
//! dedicated solver behind the same trait.

use super::model::{Constraint, LinExpr, Model, Sense, VarDomain, VarId, VarRole, Variable};
use super::{BackendError, BackendResult, OptimizationBackend, SolveLimit, SolveStatus};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const FEAS_TOL: f64 = 1e-6;
const BOUND_TOL: f64 = 1e-9;

/// How often (in nodes) the wall clock is consulted
const TIME_CHECK_INTERVAL: u64 = 256;

/// Wall-clock budget of the default configuration
pub const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

/// Search limits for [`BranchAndBound`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchAndBoundConfig {
    /// Maximum number of search nodes; `None` leaves the node count unbounded
    pub max_nodes: Option<u64>,
    /// Wall-clock budget in milliseconds; `None` searches to proven optimality
    pub time_limit_ms: Option<u64>,
}

impl Default for BranchAndBoundConfig {
    fn default() -> Self {
        Self {
            max_nodes: None,
            time_limit_ms: Some(DEFAULT_TIME_LIMIT_MS),
        }
    }
}

impl BranchAndBoundConfig {
    /// Load limits from `OUTLINE_BNB_MAX_NODES` and `OUTLINE_BNB_TIME_LIMIT_MS`
    ///
    /// Unset or unparsable variables keep the default for that limit.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_nodes: std::env::var("OUTLINE_BNB_MAX_NODES")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.max_nodes),
            time_limit_ms: std::env::var("OUTLINE_BNB_TIME_LIMIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.time_limit_ms),
        }
    }

    fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

type Domain = (i64, i64);

/// A constraint compiled to dense variable indices
#[derive(Debug, Clone)]
struct Row {
    constant: f64,
    linear: Vec<(f64, usize)>,
    products: Vec<(f64, usize, usize)>,
    sense: Sense,
}

impl Row {
    fn compile(constraint: &Constraint) -> Self {
        let mut merged: FxHashMap<usize, f64> = FxHashMap::default();
        for &(coef, var) in &constraint.expr.linear.terms {
            *merged.entry(var.index()).or_insert(0.0) += coef;
        }
        let mut linear: Vec<(f64, usize)> = merged
            .into_iter()
            .filter(|(_, c)| *c != 0.0)
            .map(|(v, c)| (c, v))
            .collect();
        linear.sort_by_key(|&(_, v)| v);

        let products = constraint
            .expr
            .products
            .iter()
            .filter(|(c, _, _)| *c != 0.0)
            .map(|&(c, a, b)| (c, a.index(), b.index()))
            .collect();

        Self {
            constant: constraint.expr.linear.constant,
            linear,
            products,
            sense: constraint.sense,
        }
    }

    fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.linear
            .iter()
            .map(|&(_, v)| v)
            .chain(self.products.iter().flat_map(|&(_, a, b)| [a, b]))
    }

    fn bounds_upper(&self) -> bool {
        matches!(self.sense, Sense::LessEqual | Sense::Equal)
    }

    fn bounds_lower(&self) -> bool {
        matches!(self.sense, Sense::GreaterEqual | Sense::Equal)
    }

    /// `Σ x <= 1` with unit coefficients and no products
    fn is_packing(&self) -> bool {
        self.sense == Sense::LessEqual
            && self.products.is_empty()
            && self.constant == -1.0
            && self.linear.len() > 1
            && self.linear.iter().all(|&(c, _)| c == 1.0)
    }

    /// Range of the expression over the current domains
    fn activity(&self, dom: &[Domain]) -> (f64, f64) {
        let mut min = self.constant;
        let mut max = self.constant;
        for &(coef, v) in &self.linear {
            let (lo, hi) = linear_range(coef, dom[v]);
            min += lo;
            max += hi;
        }
        for &(coef, a, b) in &self.products {
            let (lo, hi) = product_range(coef, dom[a], dom[b]);
            min += lo;
            max += hi;
        }
        (min, max)
    }

    fn satisfied(&self, values: &[i64]) -> bool {
        let v = self.constant
            + self
                .linear
                .iter()
                .map(|&(c, v)| c * values[v] as f64)
                .sum::<f64>()
            + self
                .products
                .iter()
                .map(|&(c, a, b)| c * values[a] as f64 * values[b] as f64)
                .sum::<f64>();
        match self.sense {
            Sense::LessEqual => v <= FEAS_TOL,
            Sense::GreaterEqual => v >= -FEAS_TOL,
            Sense::Equal => v.abs() <= FEAS_TOL,
        }
    }

    /// Tighten domains against this row; `false` when the row cannot hold
    fn propagate(&self, dom: &mut [Domain], changed: &mut Vec<usize>) -> bool {
        let (min, max) = self.activity(dom);
        let upper = self.bounds_upper();
        let lower = self.bounds_lower();

        if upper && min > FEAS_TOL {
            return false;
        }
        if lower && max < -FEAS_TOL {
            return false;
        }

        for &(coef, v) in &self.linear {
            let (tmin, tmax) = linear_range(coef, dom[v]);
            if upper && !tighten(&mut dom[v], coef, -(min - tmin), v, changed) {
                return false;
            }
            if lower && !tighten(&mut dom[v], -coef, max - tmax, v, changed) {
                return false;
            }
        }

        for &(coef, a, b) in &self.products {
            if a == b {
                continue;
            }
            let (tmin, tmax) = product_range(coef, dom[a], dom[b]);
            let (effective, target) = if dom[a].0 == dom[a].1 {
                (coef * dom[a].0 as f64, b)
            } else if dom[b].0 == dom[b].1 {
                (coef * dom[b].0 as f64, a)
            } else {
                continue;
            };
            if effective == 0.0 {
                continue;
            }
            if upper && !tighten(&mut dom[target], effective, -(min - tmin), target, changed) {
                return false;
            }
            if lower && !tighten(&mut dom[target], -effective, max - tmax, target, changed) {
                return false;
            }
        }

        true
    }
}

fn linear_range(coef: f64, (lo, hi): Domain) -> (f64, f64) {
    let a = coef * lo as f64;
    let b = coef * hi as f64;
    (a.min(b), a.max(b))
}

/// Range of `coef · a · b` for non-negative domains
fn product_range(coef: f64, a: Domain, b: Domain) -> (f64, f64) {
    linear_range(coef, (a.0.saturating_mul(b.0), a.1.saturating_mul(b.1)))
}

/// Enforce `coef · x <= cap` on `dom`; `false` when the domain empties
fn tighten(dom: &mut Domain, coef: f64, cap: f64, var: usize, changed: &mut Vec<usize>) -> bool {
    if coef > 0.0 {
        let bound = (cap / coef + FEAS_TOL).floor();
        if bound < dom.1 as f64 {
            if bound < dom.0 as f64 {
                return false;
            }
            dom.1 = bound as i64;
            changed.push(var);
        }
    } else if coef < 0.0 {
        let bound = (cap / coef - FEAS_TOL).ceil();
        if bound > dom.0 as f64 {
            if bound > dom.1 as f64 {
                return false;
            }
            dom.0 = bound as i64;
            changed.push(var);
        }
    }
    true
}

/// The model lowered to dense arrays for search
struct Search<'a> {
    rows: Vec<Row>,
    var_rows: Vec<Vec<usize>>,
    objective: Vec<f64>,
    objective_constant: f64,
    /// Disjoint sets of rewarded binaries of which at most one can be set
    groups: Vec<Vec<usize>>,
    grouped: Vec<bool>,
    branch_order: Vec<usize>,
    config: &'a BranchAndBoundConfig,
}

struct SearchOutcome {
    incumbent: Option<(f64, Vec<i64>)>,
    stopped_by: Option<SolveLimit>,
    nodes: u64,
}

impl<'a> Search<'a> {
    fn new(model: &Model, config: &'a BranchAndBoundConfig) -> Self {
        let n = model.variables.len();
        let rows: Vec<Row> = model.constraints.iter().map(Row::compile).collect();

        let mut var_rows = vec![Vec::new(); n];
        for (r, row) in rows.iter().enumerate() {
            let mut seen: Vec<usize> = row.vars().collect();
            seen.sort_unstable();
            seen.dedup();
            for v in seen {
                var_rows[v].push(r);
            }
        }

        let mut objective = vec![0.0; n];
        for &(coef, var) in &model.objective.terms {
            objective[var.index()] += coef;
        }

        // Heavily weighted binaries first so the bound bites early; integer
        // slacks last, by then propagation has usually pinned them
        let mut binaries: Vec<usize> = model
            .variables
            .iter()
            .filter(|v| v.domain.is_binary())
            .map(|v| v.id.index())
            .collect();
        binaries.sort_by(|&a, &b| objective[b].abs().total_cmp(&objective[a].abs()));
        let integers = model
            .variables
            .iter()
            .filter(|v| !v.domain.is_binary())
            .map(|v| v.id.index());
        let branch_order = binaries.into_iter().chain(integers).collect();

        let binary: Vec<bool> = model.variables.iter().map(|v| v.domain.is_binary()).collect();
        let (groups, grouped) = exclusive_groups(&rows, &objective, &binary);

        Self {
            rows,
            var_rows,
            objective,
            objective_constant: model.objective.constant,
            groups,
            grouped,
            branch_order,
            config,
        }
    }

    fn propagate(&self, dom: &mut [Domain], seeds: impl IntoIterator<Item = usize>) -> bool {
        let mut queued = vec![false; self.rows.len()];
        let mut queue = VecDeque::new();
        for r in seeds {
            if !queued[r] {
                queued[r] = true;
                queue.push_back(r);
            }
        }

        let mut changed = Vec::new();
        while let Some(r) = queue.pop_front() {
            queued[r] = false;
            changed.clear();
            if !self.rows[r].propagate(dom, &mut changed) {
                return false;
            }
            for &v in &changed {
                for &r2 in &self.var_rows[v] {
                    if !queued[r2] {
                        queued[r2] = true;
                        queue.push_back(r2);
                    }
                }
            }
        }
        true
    }

    fn objective_bound(&self, dom: &[Domain]) -> f64 {
        let free: f64 = self
            .objective
            .iter()
            .zip(dom)
            .zip(&self.grouped)
            .filter(|(_, &grouped)| !grouped)
            .map(|((&c, &(lo, hi)), _)| if c > 0.0 { c * hi as f64 } else { c * lo as f64 })
            .sum();
        let grouped: f64 = self
            .groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|&v| self.objective[v] * dom[v].1 as f64)
                    .fold(0.0, f64::max)
            })
            .sum();
        self.objective_constant + free + grouped
    }

    fn objective_at(&self, values: &[i64]) -> f64 {
        self.objective_constant
            + self
                .objective
                .iter()
                .zip(values)
                .map(|(&c, &v)| c * v as f64)
                .sum::<f64>()
    }

    fn run(&self, root: Vec<Domain>) -> SearchOutcome {
        let started = Instant::now();
        let time_limit = self.config.time_limit();

        let mut root = root;
        let mut outcome = SearchOutcome {
            incumbent: None,
            stopped_by: None,
            nodes: 0,
        };
        if !self.propagate(&mut root, 0..self.rows.len()) {
            return outcome;
        }

        let mut stack = vec![root];
        while let Some(dom) = stack.pop() {
            outcome.nodes += 1;
            if let Some(max_nodes) = self.config.max_nodes {
                if outcome.nodes > max_nodes {
                    outcome.stopped_by = Some(SolveLimit::Nodes);
                    break;
                }
            }
            if let Some(limit) = time_limit {
                if outcome.nodes % TIME_CHECK_INTERVAL == 0 && started.elapsed() > limit {
                    outcome.stopped_by = Some(SolveLimit::Time);
                    break;
                }
            }

            let bound = self.objective_bound(&dom);
            if let Some((best, _)) = &outcome.incumbent {
                if bound <= best + BOUND_TOL {
                    continue;
                }
            }

            let Some(var) = self
                .branch_order
                .iter()
                .copied()
                .find(|&v| dom[v].0 != dom[v].1)
            else {
                let values: Vec<i64> = dom.iter().map(|d| d.0).collect();
                if self.rows.iter().all(|r| r.satisfied(&values)) {
                    outcome.incumbent = Some((self.objective_at(&values), values));
                }
                continue;
            };

            let (lo, hi) = dom[var];
            // Unrewarded variables lean to zero; propagation raises them when needed
            let prefer_high = self.objective[var] > 0.0;
            let (preferred, rest) = if prefer_high {
                ((hi, hi), (lo, hi - 1))
            } else {
                ((lo, lo), (lo + 1, hi))
            };

            // Push the fallback first so the preferred child is explored next
            for child_domain in [rest, preferred] {
                let mut child = dom.clone();
                child[var] = child_domain;
                if self.propagate(&mut child, self.var_rows[var].iter().copied()) {
                    stack.push(child);
                }
            }
        }

        outcome
    }
}

/// Greedily partition rewarded binaries along packing rows, largest first
fn exclusive_groups(
    rows: &[Row],
    objective: &[f64],
    binary: &[bool],
) -> (Vec<Vec<usize>>, Vec<bool>) {
    let mut packing: Vec<&Row> = rows.iter().filter(|r| r.is_packing()).collect();
    packing.sort_by_key(|r| std::cmp::Reverse(r.linear.len()));

    let mut grouped = vec![false; objective.len()];
    let mut groups = Vec::new();
    for row in packing {
        let group: Vec<usize> = row
            .linear
            .iter()
            .map(|&(_, v)| v)
            .filter(|&v| binary[v] && objective[v] > 0.0 && !grouped[v])
            .collect();
        if group.len() < 2 {
            continue;
        }
        for &v in &group {
            grouped[v] = true;
        }
        groups.push(group);
    }
    (groups, grouped)
}

/// Exact branch-and-bound backend
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    model: Model,
    config: BranchAndBoundConfig,
    solution: Option<Vec<f64>>,
    objective_value: Option<f64>,
    nodes_explored: u64,
}

impl BranchAndBound {
    pub fn new(config: BranchAndBoundConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The model as built so far
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn nodes_explored(&self) -> u64 {
        self.nodes_explored
    }

    fn validate(&self) -> BackendResult<()> {
        let n = self.model.variables.len();
        let check = |var: VarId, what: &str| {
            if var.index() >= n {
                Err(BackendError::InvalidModel(format!(
                    "{} references undeclared variable {}",
                    what,
                    var.index()
                )))
            } else {
                Ok(())
            }
        };

        for constraint in &self.model.constraints {
            for var in constraint.expr.vars() {
                check(var, &constraint.tag.to_string())?;
            }
            let finite = constraint.expr.linear.constant.is_finite()
                && constraint.expr.linear.terms.iter().all(|(c, _)| c.is_finite())
                && constraint.expr.products.iter().all(|(c, _, _)| c.is_finite());
            if !finite {
                return Err(BackendError::InvalidModel(format!(
                    "{} has a non-finite coefficient",
                    constraint.tag
                )));
            }
        }
        for &(coef, var) in &self.model.objective.terms {
            check(var, "objective")?;
            if !coef.is_finite() {
                return Err(BackendError::InvalidModel(
                    "objective has a non-finite coefficient".into(),
                ));
            }
        }
        Ok(())
    }
}

impl OptimizationBackend for BranchAndBound {
    fn add_variable(&mut self, role: VarRole, domain: VarDomain) -> VarId {
        self.model.add_variable(role, domain)
    }

    fn add_constraint(&mut self, constraint: Constraint) {
        self.model.add_constraint(constraint);
    }

    fn set_objective(&mut self, objective: LinExpr) {
        self.model.set_objective(objective);
    }

    fn solve(&mut self) -> BackendResult<SolveStatus> {
        self.validate()?;
        self.solution = None;
        self.objective_value = None;

        tracing::debug!(
            variables = self.model.variables.len(),
            constraints = self.model.constraints.len(),
            "Starting branch-and-bound"
        );

        let search = Search::new(&self.model, &self.config);
        let root = self
            .model
            .variables
            .iter()
            .map(|v| v.domain.bounds())
            .collect();
        let outcome = search.run(root);
        self.nodes_explored = outcome.nodes;

        tracing::debug!(
            nodes = outcome.nodes,
            found = outcome.incumbent.is_some(),
            "Branch-and-bound finished"
        );

        match (outcome.incumbent, outcome.stopped_by) {
            (Some((objective, values)), stopped_by) => {
                self.solution = Some(values.into_iter().map(|v| v as f64).collect());
                self.objective_value = Some(objective);
                Ok(match stopped_by {
                    None => SolveStatus::Optimal,
                    Some(limit) => SolveStatus::Feasible { limit },
                })
            }
            (None, Some(limit)) => Err(BackendError::NoIncumbent { limit }),
            (None, None) => Err(BackendError::Infeasible),
        }
    }

    fn variables(&self) -> &[Variable] {
        &self.model.variables
    }

    fn value(&self, var: VarId) -> Option<f64> {
        self.solution.as_ref()?.get(var.index()).copied()
    }

    fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::model::ConstraintTag;
    use crate::types::EdgeKey;

    fn edge(k: usize, l: usize) -> VarRole {
        VarRole::Edge(EdgeKey::new(k, l).unwrap())
    }

    fn crossing(a: (usize, usize), b: (usize, usize)) -> ConstraintTag {
        ConstraintTag::Crossing(
            EdgeKey::new(a.0, a.1).unwrap(),
            EdgeKey::new(b.0, b.1).unwrap(),
        )
    }

    #[test]
    fn test_unconstrained_picks_positive_terms() {
        let mut bb = BranchAndBound::default();
        let a = bb.add_variable(edge(0, 1), VarDomain::Binary);
        let b = bb.add_variable(edge(0, 2), VarDomain::Binary);
        bb.set_objective(LinExpr::term(1.0, a) + LinExpr::term(-0.5, b));

        assert_eq!(bb.solve(), Ok(SolveStatus::Optimal));
        assert_eq!(bb.value(a), Some(1.0));
        assert_eq!(bb.value(b), Some(0.0));
        assert_eq!(bb.objective_value(), Some(1.0));
    }

    #[test]
    fn test_pairwise_exclusion() {
        let mut bb = BranchAndBound::default();
        let a = bb.add_variable(edge(0, 1), VarDomain::Binary);
        let b = bb.add_variable(edge(2, 3), VarDomain::Binary);
        bb.add_constraint(Constraint::le(
            crossing((0, 1), (2, 3)),
            LinExpr::var(a) + LinExpr::var(b),
            LinExpr::constant(1.0),
        ));
        bb.set_objective(LinExpr::term(2.0, a) + LinExpr::term(3.0, b));

        assert!(bb.solve().unwrap().is_optimal());
        assert_eq!(bb.value(a), Some(0.0));
        assert_eq!(bb.value(b), Some(1.0));
    }

    #[test]
    fn test_bilinear_equality_propagates() {
        // (j0 + j1 - 2) * e = 0 with e rewarded: both junctions must switch on
        let mut bb = BranchAndBound::default();
        let j0 = bb.add_variable(VarRole::Junction(0), VarDomain::Binary);
        let j1 = bb.add_variable(VarRole::Junction(1), VarDomain::Binary);
        let e = bb.add_variable(edge(0, 1), VarDomain::Binary);
        let lhs = (LinExpr::var(j0) + LinExpr::var(j1) - LinExpr::constant(2.0)) * LinExpr::var(e);
        bb.add_constraint(Constraint::eq(
            ConstraintTag::JunctionEdge(EdgeKey::new(0, 1).unwrap()),
            lhs,
            LinExpr::zero(),
        ));
        bb.set_objective(LinExpr::var(e) + LinExpr::term(-0.25, j0));

        assert!(bb.solve().unwrap().is_optimal());
        assert_eq!(bb.value(e), Some(1.0));
        assert_eq!(bb.value(j0), Some(1.0));
        assert_eq!(bb.value(j1), Some(1.0));
        assert_eq!(bb.objective_value(), Some(0.75));
    }

    #[test]
    fn test_integer_slack_takes_minimum() {
        // a + b + c - s = 0, s penalized: the slack equals the count
        let mut bb = BranchAndBound::default();
        let vars: Vec<_> = (1..4)
            .map(|l| bb.add_variable(edge(0, l), VarDomain::Binary))
            .collect();
        let s = bb.add_variable(
            VarRole::UnmatchedSlack { junction: 0 },
            VarDomain::Integer { upper: 3 },
        );
        bb.add_constraint(Constraint::eq(
            ConstraintTag::UnmatchedBin { junction: 0 },
            LinExpr::sum_of(vars.iter().copied()) - LinExpr::var(s),
            LinExpr::zero(),
        ));
        let reward = LinExpr::sum_of(vars.iter().copied());
        bb.set_objective(reward + LinExpr::term(-0.1, s));

        assert!(bb.solve().unwrap().is_optimal());
        assert_eq!(bb.value(s), Some(3.0));
        let objective = bb.objective_value().unwrap();
        assert!((objective - 2.7).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_model() {
        let mut bb = BranchAndBound::default();
        let a = bb.add_variable(VarRole::Region(0), VarDomain::Binary);
        bb.add_constraint(Constraint::ge(
            ConstraintTag::RayClosure {
                region: 0,
                probe: 0,
                angle: 0,
            },
            LinExpr::var(a),
            LinExpr::constant(2.0),
        ));
        assert_eq!(bb.solve(), Err(BackendError::Infeasible));
        assert_eq!(bb.value(a), None);
    }

    #[test]
    fn test_empty_selection_is_not_infeasible() {
        let mut bb = BranchAndBound::default();
        let a = bb.add_variable(edge(0, 1), VarDomain::Binary);
        bb.set_objective(LinExpr::term(-1.0, a));
        assert_eq!(bb.solve(), Ok(SolveStatus::Optimal));
        assert_eq!(bb.value(a), Some(0.0));
    }

    #[test]
    fn test_node_limit_reports_feasible() {
        let config = BranchAndBoundConfig {
            max_nodes: Some(3),
            time_limit_ms: None,
        };
        let mut bb = BranchAndBound::new(config);
        let vars: Vec<_> = (1..8)
            .map(|l| bb.add_variable(edge(0, l), VarDomain::Binary))
            .collect();
        // Pairwise exclusion among all: optimum picks exactly one
        for i in 0..vars.len() {
            for j in (i + 1)..vars.len() {
                bb.add_constraint(Constraint::le(
                    crossing((0, i + 1), (0, j + 1)),
                    LinExpr::var(vars[i]) + LinExpr::var(vars[j]),
                    LinExpr::constant(1.0),
                ));
            }
        }
        let objective: LinExpr = vars
            .iter()
            .enumerate()
            .map(|(i, &v)| LinExpr::term(1.0 + i as f64, v))
            .sum();
        bb.set_objective(objective);

        match bb.solve() {
            Ok(SolveStatus::Feasible { limit }) => assert_eq!(limit, SolveLimit::Nodes),
            Err(BackendError::NoIncumbent { limit }) => assert_eq!(limit, SolveLimit::Nodes),
            other => panic!("expected a limit, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_time_limited() {
        let config = BranchAndBoundConfig::default();
        assert_eq!(config.time_limit_ms, Some(DEFAULT_TIME_LIMIT_MS));
        assert_eq!(config.max_nodes, None);
        assert!(BranchAndBound::default().config.time_limit_ms.is_some());
    }

    #[test]
    fn test_exclusive_group_tightens_bound() {
        let mut bb = BranchAndBound::default();
        let vars: Vec<_> = (1..13)
            .map(|l| bb.add_variable(edge(0, l), VarDomain::Binary))
            .collect();
        bb.add_constraint(Constraint::le(
            ConstraintTag::DirectionBin {
                junction: 0,
                direction: 0,
            },
            LinExpr::sum_of(vars.iter().copied()),
            LinExpr::constant(1.0),
        ));
        let objective: LinExpr = vars
            .iter()
            .enumerate()
            .map(|(i, &v)| LinExpr::term(1.0 + i as f64, v))
            .sum();
        bb.set_objective(objective);

        assert!(bb.solve().unwrap().is_optimal());
        assert_eq!(bb.value(vars[11]), Some(1.0));
        assert_eq!(bb.objective_value(), Some(12.0));
        // Root, the best pick, then the fallback pruned by the group bound
        assert_eq!(bb.nodes_explored(), 3);
    }

    #[test]
    fn test_invalid_model_rejected() {
        let mut bb = BranchAndBound::default();
        bb.set_objective(LinExpr::var(VarId(3)));
        assert!(matches!(bb.solve(), Err(BackendError::InvalidModel(_))));
    }
}
