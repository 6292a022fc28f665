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

//! IR validation pass
//!
//! Ensures the IR is well-formed before verification starts. Validation
//! fails on the first violation; malformed IR is never partially verified.

use super::{BinOp, Block, BlockId, BlockKind, Expr, Function, Program, Sort, Statement};
use crate::error::VerifierError;
use std::collections::HashMap;

/// Validate a whole program
pub fn validate(program: &Program) -> Result<(), VerifierError> {
    for predicate in &program.predicates {
        validate_predicate(program, predicate)?;
    }
    for function in &program.functions {
        validate_function(program, function)?;
    }
    Ok(())
}

fn validate_predicate(
    program: &Program,
    predicate: &super::Predicate,
) -> Result<(), VerifierError> {
    let context = format!("body of predicate '{}'", predicate.name);
    expect_sort(program, &predicate.body, Sort::Bool, &context)?;

    for variable in predicate.body.free_vars() {
        if !predicate.parameters.contains(&variable) {
            return Err(VerifierError::UnboundPredicateVariable {
                predicate: predicate.name.clone(),
                variable: variable.name,
            });
        }
    }
    Ok(())
}

fn validate_function(program: &Program, function: &Function) -> Result<(), VerifierError> {
    let entry = function.block(function.precondition)?;
    if !matches!(entry.kind, BlockKind::Precondition { .. }) {
        return Err(VerifierError::EntryNotPrecondition {
            function: function.name.clone(),
            block: function.precondition,
        });
    }

    let exit = function.block(function.postcondition)?;
    if !matches!(exit.kind, BlockKind::Postcondition { .. }) {
        return Err(VerifierError::ExitNotPostcondition {
            function: function.name.clone(),
            block: function.postcondition,
        });
    }

    for block in function.blocks.values() {
        for &successor in &block.successors {
            function.block(successor)?;
            if successor == function.precondition {
                return Err(VerifierError::EntryHasPredecessors {
                    function: function.name.clone(),
                    block: function.precondition,
                });
            }
        }

        validate_annotations(program, function, block)?;
        for statement in &block.statements {
            validate_statement(program, function, block, statement)?;
        }
    }

    check_cut_cycles(function)
}

fn validate_annotations(
    program: &Program,
    function: &Function,
    block: &Block,
) -> Result<(), VerifierError> {
    for condition in block.kind.conditions() {
        let context = format!("annotation on block {} of '{}'", block.id, function.name);
        expect_sort(program, condition, Sort::Bool, &context)?;
    }
    for rank in block.kind.ranking() {
        let context = format!(
            "ranking function on block {} of '{}'",
            block.id, function.name
        );
        expect_sort(program, rank, Sort::Int, &context)?;
    }
    Ok(())
}

fn validate_statement(
    program: &Program,
    function: &Function,
    block: &Block,
    statement: &Statement,
) -> Result<(), VerifierError> {
    let context = format!("block {} of '{}'", block.id, function.name);
    match statement {
        Statement::Assume { condition } | Statement::Assert { condition } => {
            expect_sort(program, condition, Sort::Bool, &context)
        }
        Statement::Assign { variable, value } => {
            expect_sort(program, value, variable.sort, &context)
        }
        Statement::SubscriptAssign {
            array,
            index,
            value,
        } => {
            if array.sort != Sort::IntArray {
                return Err(VerifierError::SortMismatch {
                    expected: Sort::IntArray,
                    found: array.sort,
                    context,
                });
            }
            expect_sort(program, index, Sort::Int, &context)?;
            expect_sort(program, value, Sort::Int, &context)
        }
        Statement::Call {
            destinations,
            callee,
            arguments,
        } => {
            let callee_fn =
                program
                    .function(callee)
                    .ok_or_else(|| VerifierError::UnknownCallee {
                        function: function.name.clone(),
                        callee: callee.clone(),
                    })?;
            if callee_fn.parameters.len() != arguments.len() {
                return Err(VerifierError::CallArityMismatch {
                    function: function.name.clone(),
                    callee: callee.clone(),
                    expected: callee_fn.parameters.len(),
                    found: arguments.len(),
                });
            }
            if callee_fn.returns.len() != destinations.len() {
                return Err(VerifierError::ResultArityMismatch {
                    function: function.name.clone(),
                    callee: callee.clone(),
                    expected: callee_fn.returns.len(),
                    found: destinations.len(),
                });
            }
            for (formal, actual) in callee_fn.parameters.iter().zip(arguments) {
                if formal.sort != actual.sort {
                    return Err(VerifierError::SortMismatch {
                        expected: formal.sort,
                        found: actual.sort,
                        context,
                    });
                }
            }
            for (result, destination) in callee_fn.returns.iter().zip(destinations) {
                if result.sort != destination.sort {
                    return Err(VerifierError::SortMismatch {
                        expected: result.sort,
                        found: destination.sort,
                        context,
                    });
                }
            }
            Ok(())
        }
    }
}

fn expect_sort(
    program: &Program,
    expr: &Expr,
    expected: Sort,
    context: &str,
) -> Result<(), VerifierError> {
    let found = sort_of(program, expr, context)?;
    if found == expected {
        Ok(())
    } else {
        Err(VerifierError::SortMismatch {
            expected,
            found,
            context: context.to_string(),
        })
    }
}

/// Compute the sort of a term, checking operand sorts along the way
fn sort_of(program: &Program, expr: &Expr, context: &str) -> Result<Sort, VerifierError> {
    match expr {
        Expr::IntLit(_) => Ok(Sort::Int),
        Expr::BoolLit(_) => Ok(Sort::Bool),
        Expr::Var(variable) => Ok(variable.sort),
        Expr::Binary { op, left, right } => {
            let left_sort = sort_of(program, left, context)?;
            let right_sort = sort_of(program, right, context)?;
            match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                    require(Sort::Int, left_sort, context)?;
                    require(Sort::Int, right_sort, context)?;
                    Ok(Sort::Int)
                }
                BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    require(Sort::Int, left_sort, context)?;
                    require(Sort::Int, right_sort, context)?;
                    Ok(Sort::Bool)
                }
                BinOp::Eq | BinOp::Ne => {
                    // equality is polymorphic but both sides must agree
                    require(left_sort, right_sort, context)?;
                    Ok(Sort::Bool)
                }
                BinOp::And | BinOp::Or | BinOp::Implies => {
                    require(Sort::Bool, left_sort, context)?;
                    require(Sort::Bool, right_sort, context)?;
                    Ok(Sort::Bool)
                }
            }
        }
        Expr::Not(inner) => {
            require(Sort::Bool, sort_of(program, inner, context)?, context)?;
            Ok(Sort::Bool)
        }
        Expr::Select { array, index } => {
            require(Sort::IntArray, sort_of(program, array, context)?, context)?;
            require(Sort::Int, sort_of(program, index, context)?, context)?;
            Ok(Sort::Int)
        }
        Expr::Store {
            array,
            index,
            value,
            length,
        } => {
            require(Sort::IntArray, sort_of(program, array, context)?, context)?;
            require(Sort::Int, sort_of(program, index, context)?, context)?;
            require(Sort::Int, sort_of(program, value, context)?, context)?;
            require(Sort::Int, sort_of(program, length, context)?, context)?;
            Ok(Sort::IntArray)
        }
        Expr::Length(array) => {
            require(Sort::IntArray, sort_of(program, array, context)?, context)?;
            Ok(Sort::Int)
        }
        Expr::Apply { predicate, args } => {
            let definition =
                program
                    .predicate(predicate)
                    .ok_or_else(|| VerifierError::UnknownPredicate {
                        predicate: predicate.clone(),
                        context: context.to_string(),
                    })?;
            if definition.parameters.len() != args.len() {
                return Err(VerifierError::PredicateArityMismatch {
                    predicate: predicate.clone(),
                    expected: definition.parameters.len(),
                    found: args.len(),
                    context: context.to_string(),
                });
            }
            for (parameter, arg) in definition.parameters.iter().zip(args) {
                require(parameter.sort, sort_of(program, arg, context)?, context)?;
            }
            Ok(Sort::Bool)
        }
    }
}

fn require(expected: Sort, found: Sort, context: &str) -> Result<(), VerifierError> {
    if expected == found {
        Ok(())
    } else {
        Err(VerifierError::SortMismatch {
            expected,
            found,
            context: context.to_string(),
        })
    }
}

/// Detect cycles that do not pass through a cut-point. Path enumeration
/// stops at cut-points, so any such cycle would make it diverge.
fn check_cut_cycles(function: &Function) -> Result<(), VerifierError> {
    // marks: absent = unvisited, false = on the current walk, true = finished
    fn visit(
        function: &Function,
        id: BlockId,
        marks: &mut HashMap<BlockId, bool>,
    ) -> Result<(), VerifierError> {
        marks.insert(id, false);
        let block = function.block(id)?;
        if !block.is_cut_point() {
            for &successor in &block.successors {
                match marks.get(&successor) {
                    Some(false) => {
                        return Err(VerifierError::UncutCycle {
                            function: function.name.clone(),
                            block: successor,
                        })
                    }
                    None => visit(function, successor, marks)?,
                    Some(true) => {}
                }
            }
        }
        marks.insert(id, true);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut ids: Vec<BlockId> = function.blocks.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        if !marks.contains_key(&id) {
            visit(function, id, &mut marks)?;
        }
    }
    Ok(())
}
