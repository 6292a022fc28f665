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

//! Error handling for the verifier
//!
//! Malformed IR is fatal and reported through these types. An unmet user
//! specification is not an error: it flows through the verdict instead.

use crate::ir::{BlockId, Sort};
use std::io;
use thiserror::Error;

/// Fatal verification errors
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("function '{function}' references unknown block {block}")]
    UnknownBlock { function: String, block: BlockId },

    #[error("entry block {block} of function '{function}' is not a precondition block")]
    EntryNotPrecondition { function: String, block: BlockId },

    #[error("exit block {block} of function '{function}' is not a postcondition block")]
    ExitNotPostcondition { function: String, block: BlockId },

    #[error("precondition block {block} of function '{function}' has incoming edges")]
    EntryHasPredecessors { function: String, block: BlockId },

    #[error("block {block} of function '{function}' cannot head a basic path")]
    NotAHeadBlock { function: String, block: BlockId },

    #[error("cycle through block {block} of function '{function}' does not pass a cut-point")]
    UncutCycle { function: String, block: BlockId },

    #[error("function '{function}' calls undefined function '{callee}'")]
    UnknownCallee { function: String, callee: String },

    #[error(
        "call to '{callee}' in function '{function}' passes {found} arguments, expected {expected}"
    )]
    CallArityMismatch {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "call to '{callee}' in function '{function}' binds {found} results, expected {expected}"
    )]
    ResultArityMismatch {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "ranking functions on blocks {head_block} and {tail_block} of function '{function}' \
         have arities {head_arity} and {tail_arity}"
    )]
    RankingArityMismatch {
        function: String,
        head_block: BlockId,
        tail_block: BlockId,
        head_arity: usize,
        tail_arity: usize,
    },

    #[error("expected {expected} term, found {found} in {context}")]
    SortMismatch {
        expected: Sort,
        found: Sort,
        context: String,
    },

    #[error("unknown predicate '{predicate}' applied in {context}")]
    UnknownPredicate { predicate: String, context: String },

    #[error(
        "predicate '{predicate}' applied to {found} arguments in {context}, expected {expected}"
    )]
    PredicateArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
        context: String,
    },

    #[error("predicate '{predicate}' mentions '{variable}' which is not one of its parameters")]
    UnboundPredicateVariable { predicate: String, variable: String },

    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("failed to write diagnostics: {0}")]
    Diagnostics(#[from] io::Error),
}

/// SMT oracle errors
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("failed to launch solver '{binary}': {source}")]
    Launch { binary: String, source: io::Error },

    #[error("failed to exchange query with solver: {0}")]
    Io(#[from] io::Error),

    #[error("solver produced unexpected verdict {0:?}")]
    UnexpectedVerdict(String),
}
