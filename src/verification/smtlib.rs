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

//! SMT-LIB 2 emission
//!
//! Renders terms and predicate definitions for the external oracle. Arrays
//! are encoded as an `IntArr` datatype pairing an `(Array Int Int)` with its
//! length, so a store term keeps the length it carries.

use crate::ir::{BinOp, Expr, Predicate, Sort, Variable};

/// Datatype declaration shared by every query
pub const PREAMBLE: &str =
    "(declare-datatypes ((IntArr 0)) (((mk-arr (elts (Array Int Int)) (len Int)))))\n";

pub fn sort_name(sort: Sort) -> &'static str {
    match sort {
        Sort::Int => "Int",
        Sort::Bool => "Bool",
        Sort::IntArray => "IntArr",
    }
}

/// Quote a name unless it is a plain SMT-LIB simple symbol
fn symbol(name: &str) -> String {
    let mut chars = name.chars();
    let simple = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if simple {
        name.to_string()
    } else {
        format!("|{name}|")
    }
}

/// Render one term
pub fn term(expr: &Expr) -> String {
    match expr {
        Expr::IntLit(value) => {
            if *value < 0 {
                format!("(- {})", value.unsigned_abs())
            } else {
                value.to_string()
            }
        }
        Expr::BoolLit(value) => value.to_string(),
        Expr::Var(variable) => symbol(&variable.name),
        Expr::Binary { op, left, right } => {
            let left = term(left);
            let right = term(right);
            match op {
                BinOp::Add => format!("(+ {left} {right})"),
                BinOp::Sub => format!("(- {left} {right})"),
                BinOp::Mul => format!("(* {left} {right})"),
                BinOp::Div => format!("(div {left} {right})"),
                BinOp::Mod => format!("(mod {left} {right})"),
                BinOp::Eq => format!("(= {left} {right})"),
                BinOp::Ne => format!("(not (= {left} {right}))"),
                BinOp::Lt => format!("(< {left} {right})"),
                BinOp::Le => format!("(<= {left} {right})"),
                BinOp::Gt => format!("(> {left} {right})"),
                BinOp::Ge => format!("(>= {left} {right})"),
                BinOp::And => format!("(and {left} {right})"),
                BinOp::Or => format!("(or {left} {right})"),
                BinOp::Implies => format!("(=> {left} {right})"),
            }
        }
        Expr::Not(inner) => format!("(not {})", term(inner)),
        Expr::Select { array, index } => {
            format!("(select (elts {}) {})", term(array), term(index))
        }
        Expr::Store {
            array,
            index,
            value,
            length,
        } => format!(
            "(mk-arr (store (elts {}) {} {}) {})",
            term(array),
            term(index),
            term(value),
            term(length)
        ),
        Expr::Length(array) => format!("(len {})", term(array)),
        Expr::Apply { predicate, args } => {
            if args.is_empty() {
                symbol(predicate)
            } else {
                let rendered: Vec<String> = args.iter().map(term).collect();
                format!("({} {})", symbol(predicate), rendered.join(" "))
            }
        }
    }
}

pub fn declare_const(variable: &Variable) -> String {
    format!(
        "(declare-const {} {})\n",
        symbol(&variable.name),
        sort_name(variable.sort)
    )
}

pub fn define_predicate(predicate: &Predicate) -> String {
    let parameters: Vec<String> = predicate
        .parameters
        .iter()
        .map(|parameter| format!("({} {})", symbol(&parameter.name), sort_name(parameter.sort)))
        .collect();
    format!(
        "(define-fun {} ({}) Bool {})\n",
        symbol(&predicate.name),
        parameters.join(" "),
        term(&predicate.body)
    )
}

/// Assemble the one-shot script asking whether a formula is valid: the
/// negation is asserted, so `unsat` means valid.
pub fn validity_script(definitions: &str, formula: &Expr) -> String {
    let mut script = String::new();
    script.push_str("(set-logic ALL)\n");
    script.push_str(PREAMBLE);
    script.push_str(definitions);
    for variable in formula.free_vars() {
        script.push_str(&declare_const(&variable));
    }
    script.push_str(&format!("(assert (not {}))\n", term(formula)));
    script.push_str("(check-sat)\n(get-model)\n");
    script
}
