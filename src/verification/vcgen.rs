//! Verification condition generator
//!
//! Turns a basic path into logical obligations by weakest-precondition
//! propagation: a partial-correctness condition for every path, plus
//! well-foundedness and lexicographic-decrease conditions when the path
//! carries ranking functions.

use super::path::{BasicPath, PathStatement};
use crate::error::VerifierError;
use crate::ir::{BlockId, Expr, Variable};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of obligation a condition discharges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcKind {
    /// Head annotations imply the weakest precondition of the tail
    Partial,

    /// Every component of the head measure is non-negative
    WellFounded,

    /// The tail measure is lexicographically below the head measure
    Decrease,
}

impl fmt::Display for VcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcKind::Partial => write!(f, "partial correctness"),
            VcKind::WellFounded => write!(f, "well-foundedness"),
            VcKind::Decrease => write!(f, "lexicographic decrease"),
        }
    }
}

/// A verification condition ready for the oracle
#[derive(Debug, Clone)]
pub struct Vc {
    pub name: String,
    pub kind: VcKind,
    pub function: String,
    pub head_block: BlockId,
    pub tail_block: BlockId,
    pub formula: Expr,
}

impl fmt::Display for Vc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, '{}' blocks {} -> {}): {}",
            self.name, self.kind, self.function, self.head_block, self.tail_block, self.formula
        )
    }
}

/// Weakest precondition of one statement
pub fn wp(statement: &PathStatement, post: Expr) -> Expr {
    match statement {
        PathStatement::Assume(condition) => Expr::implies(condition.clone(), post),
        PathStatement::Assign { variable, value } => post.subst(variable, value),
        PathStatement::SubscriptAssign {
            array,
            index,
            value,
        } => {
            // a[i] := e rewrites a to an update term that keeps the array's
            // length, so the theory sees length as invariant under stores
            let array_term = Expr::Var(array.clone());
            let updated = Expr::store(
                array_term.clone(),
                index.clone(),
                value.clone(),
                Expr::length(array_term),
            );
            post.subst(array, &updated)
        }
    }
}

/// Weakest precondition of a statement sequence, folded right-to-left
pub fn wp_path(statements: &[PathStatement], post: Expr) -> Expr {
    statements
        .iter()
        .rev()
        .fold(post, |condition, statement| wp(statement, condition))
}

/// Strict lexicographic comparison of two equal-length tuples
pub fn lex_gt(head: &[Expr], tail: &[Expr]) -> Expr {
    match (head.split_first(), tail.split_first()) {
        (Some((a, rest_a)), Some((b, rest_b))) => {
            let strict = Expr::gt(a.clone(), b.clone());
            if rest_a.is_empty() {
                strict
            } else {
                Expr::or(
                    strict,
                    Expr::and(Expr::eq(a.clone(), b.clone()), lex_gt(rest_a, rest_b)),
                )
            }
        }
        _ => Expr::boolean(false),
    }
}

/// Builds verification conditions, numbering them across one run
pub struct VcGenerator {
    counter: usize,
}

impl VcGenerator {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Generate the obligations of one basic path
    pub fn generate(&mut self, path: &BasicPath) -> Result<Vec<Vc>, VerifierError> {
        let mut vcs = Vec::new();
        let head = Expr::big_and(path.head_conditions.iter().cloned());

        let post = Expr::big_and(path.tail_conditions.iter().cloned());
        let partial = Expr::implies(head.clone(), wp_path(&path.statements, post));
        vcs.push(self.vc(path, VcKind::Partial, partial));

        if !path.head_ranking.is_empty() {
            let bounded = Expr::big_and(
                path.head_ranking
                    .iter()
                    .map(|rank| Expr::ge(rank.clone(), Expr::int(0))),
            );
            vcs.push(self.vc(path, VcKind::WellFounded, Expr::implies(head.clone(), bounded)));

            // Paths ending at an assertion or at a measureless tail close no
            // loop, so only measured tails get a decrease obligation.
            if !path.tail_ranking.is_empty() {
                if path.tail_ranking.len() != path.head_ranking.len() {
                    return Err(VerifierError::RankingArityMismatch {
                        function: path.function.clone(),
                        head_block: path.head_block,
                        tail_block: path.tail_block,
                        head_arity: path.head_ranking.len(),
                        tail_arity: path.tail_ranking.len(),
                    });
                }
                vcs.push(self.vc(path, VcKind::Decrease, decrease_formula(path, head)));
            }
        }

        Ok(vcs)
    }

    fn vc(&mut self, path: &BasicPath, kind: VcKind, formula: Expr) -> Vc {
        self.counter += 1;
        Vc {
            name: format!("vc_{}", self.counter),
            kind,
            function: path.function.clone(),
            head_block: path.head_block,
            tail_block: path.tail_block,
            formula,
        }
    }
}

impl Default for VcGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// The decrease condition snapshots the head measure in fresh variables,
/// freezes them with pre-state equalities, and asks that the tail measure,
/// rewritten into pre-state terms by wp, sits strictly below the snapshot.
fn decrease_formula(path: &BasicPath, head: Expr) -> Expr {
    let mut measured: BTreeSet<Variable> = BTreeSet::new();
    for rank in &path.head_ranking {
        measured.extend(rank.free_vars());
    }

    // one rename map for the whole tuple, avoiding every name on the path
    let mut used = path.free_names();
    let mut snapshot: BTreeMap<Variable, Expr> = BTreeMap::new();
    let mut equalities = Vec::new();
    for variable in &measured {
        let copy = Variable::new(fresh_copy(&variable.name, &mut used), variable.sort);
        equalities.push(Expr::eq(Expr::Var(variable.clone()), Expr::Var(copy.clone())));
        snapshot.insert(variable.clone(), Expr::Var(copy));
    }

    let fresh_head: Vec<Expr> = path
        .head_ranking
        .iter()
        .map(|rank| rank.subst_all(&snapshot))
        .collect();
    let goal = lex_gt(&fresh_head, &path.tail_ranking);
    let transformed = wp_path(&path.statements, goal);

    let antecedent = Expr::and(Expr::big_and(equalities), head);
    Expr::implies(antecedent, transformed)
}

fn fresh_copy(name: &str, used: &mut BTreeSet<String>) -> String {
    let base = format!("{name}_copy");
    let mut candidate = base.clone();
    let mut suffix = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}{suffix}");
        suffix += 1;
    }
    used.insert(candidate.clone());
    candidate
}
