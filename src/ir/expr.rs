// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression algebra for annotations and verification conditions
//!
//! Terms are quantifier-free and range over integers, booleans and integer
//! arrays. There are no binders, so substitution is purely structural.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sort (type) of a logical term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sort {
    Int,
    Bool,
    IntArray,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Int => write!(f, "Int"),
            Sort::Bool => write!(f, "Bool"),
            Sort::IntArray => write!(f, "IntArray"),
        }
    }
}

/// A sorted program variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub sort: Sort,
}

impl Variable {
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Sort::Int)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, Sort::Bool)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, Sort::IntArray)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logic
    And,
    Or,
    Implies,
}

impl BinOp {
    /// Sort of a term built from this operator
    pub fn result_sort(self) -> Sort {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => Sort::Int,
            _ => Sort::Bool,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Implies => "=>",
        }
    }
}

/// Logical term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Integer constant
    IntLit(i64),

    /// Boolean constant
    BoolLit(bool),

    /// Variable reference
    Var(Variable),

    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation
    Not(Box<Expr>),

    /// Array read
    Select { array: Box<Expr>, index: Box<Expr> },

    /// Array update carrying the array's length expression, so that
    /// `length(store(a, i, v, n)) = n` is part of the term itself
    Store {
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        length: Box<Expr>,
    },

    /// Array length
    Length(Box<Expr>),

    /// Application of a user-defined predicate
    Apply { predicate: String, args: Vec<Expr> },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::IntLit(value)
    }

    pub fn boolean(value: bool) -> Self {
        Expr::BoolLit(value)
    }

    pub fn var(variable: Variable) -> Self {
        Expr::Var(variable)
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Add, left, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Sub, left, right)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Eq, left, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Lt, left, right)
    }

    pub fn le(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Le, left, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Gt, left, right)
    }

    pub fn ge(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Ge, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::And, left, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Or, left, right)
    }

    pub fn implies(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Implies, left, right)
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn select(array: Expr, index: Expr) -> Self {
        Expr::Select {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn store(array: Expr, index: Expr, value: Expr, length: Expr) -> Self {
        Expr::Store {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
            length: Box::new(length),
        }
    }

    pub fn length(array: Expr) -> Self {
        Expr::Length(Box::new(array))
    }

    pub fn apply(predicate: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Apply {
            predicate: predicate.into(),
            args,
        }
    }

    /// Fold a list of conjuncts from a `true` seed. The result is always a
    /// boolean term, even for an empty list, and `big_and([e])` is `true && e`.
    pub fn big_and<I: IntoIterator<Item = Expr>>(conjuncts: I) -> Expr {
        conjuncts
            .into_iter()
            .fold(Expr::BoolLit(true), |acc, conjunct| Expr::and(acc, conjunct))
    }

    /// Declared sort of this term
    pub fn sort(&self) -> Sort {
        match self {
            Expr::IntLit(_) => Sort::Int,
            Expr::BoolLit(_) => Sort::Bool,
            Expr::Var(variable) => variable.sort,
            Expr::Binary { op, .. } => op.result_sort(),
            Expr::Not(_) => Sort::Bool,
            Expr::Select { .. } => Sort::Int,
            Expr::Store { .. } => Sort::IntArray,
            Expr::Length(_) => Sort::Int,
            Expr::Apply { .. } => Sort::Bool,
        }
    }

    /// Free variables of this term
    pub fn free_vars(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut BTreeSet<Variable>) {
        match self {
            Expr::IntLit(_) | Expr::BoolLit(_) => {}
            Expr::Var(variable) => {
                vars.insert(variable.clone());
            }
            Expr::Binary { left, right, .. } => {
                left.collect_vars(vars);
                right.collect_vars(vars);
            }
            Expr::Not(inner) => inner.collect_vars(vars),
            Expr::Select { array, index } => {
                array.collect_vars(vars);
                index.collect_vars(vars);
            }
            Expr::Store {
                array,
                index,
                value,
                length,
            } => {
                array.collect_vars(vars);
                index.collect_vars(vars);
                value.collect_vars(vars);
                length.collect_vars(vars);
            }
            Expr::Length(array) => array.collect_vars(vars),
            Expr::Apply { args, .. } => {
                for arg in args {
                    arg.collect_vars(vars);
                }
            }
        }
    }

    /// Substitute one variable by a term
    pub fn subst(&self, variable: &Variable, replacement: &Expr) -> Expr {
        let mut map = BTreeMap::new();
        map.insert(variable.clone(), replacement.clone());
        self.subst_all(&map)
    }

    /// Simultaneous substitution of several variables. All replacements see
    /// the original term, so entries never rewrite each other's results.
    pub fn subst_all(&self, map: &BTreeMap<Variable, Expr>) -> Expr {
        match self {
            Expr::IntLit(_) | Expr::BoolLit(_) => self.clone(),
            Expr::Var(variable) => map.get(variable).cloned().unwrap_or_else(|| self.clone()),
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: Box::new(left.subst_all(map)),
                right: Box::new(right.subst_all(map)),
            },
            Expr::Not(inner) => Expr::Not(Box::new(inner.subst_all(map))),
            Expr::Select { array, index } => Expr::Select {
                array: Box::new(array.subst_all(map)),
                index: Box::new(index.subst_all(map)),
            },
            Expr::Store {
                array,
                index,
                value,
                length,
            } => Expr::Store {
                array: Box::new(array.subst_all(map)),
                index: Box::new(index.subst_all(map)),
                value: Box::new(value.subst_all(map)),
                length: Box::new(length.subst_all(map)),
            },
            Expr::Length(array) => Expr::Length(Box::new(array.subst_all(map))),
            Expr::Apply { predicate, args } => Expr::Apply {
                predicate: predicate.clone(),
                args: args.iter().map(|arg| arg.subst_all(map)).collect(),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(value) => write!(f, "{value}"),
            Expr::BoolLit(value) => write!(f, "{value}"),
            Expr::Var(variable) => write!(f, "{variable}"),
            Expr::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Select { array, index } => write!(f, "select({array}, {index})"),
            Expr::Store {
                array,
                index,
                value,
                length,
            } => write!(f, "store({array}, {index}, {value}, {length})"),
            Expr::Length(array) => write!(f, "length({array})"),
            Expr::Apply { predicate, args } => {
                write!(f, "{predicate}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
