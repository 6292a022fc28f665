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

//! Annotated intermediate representation
//!
//! The IR is produced by a front end and is read-only during verification.
//! Control flow is a graph of blocks; blocks carrying annotations
//! (pre-condition, post-condition, loop invariant) are the cut-points that
//! bound basic paths.

pub mod expr;
pub mod validation;

pub use expr::{BinOp, Expr, Sort, Variable};

use crate::error::VerifierError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a block within a function
pub type BlockId = usize;

/// A program is a set of functions plus the user predicate definitions they
/// may apply in annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    pub predicates: Vec<Predicate>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn predicate(&self, name: &str) -> Option<&Predicate> {
        self.predicates.iter().find(|predicate| predicate.name == name)
    }
}

/// A named, sorted, defined predicate usable in annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub body: Expr,
}

/// An annotated function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    /// Ordered formal parameters
    pub parameters: Vec<Variable>,

    /// Ordered return variables
    pub returns: Vec<Variable>,

    /// Entry cut-point
    pub precondition: BlockId,

    /// Exit cut-point
    pub postcondition: BlockId,

    pub blocks: HashMap<BlockId, Block>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Result<&Block, VerifierError> {
        self.blocks.get(&id).ok_or_else(|| VerifierError::UnknownBlock {
            function: self.name.clone(),
            block: id,
        })
    }

    /// Loop-head block ids in ascending order
    pub fn loop_heads(&self) -> Vec<BlockId> {
        let mut heads: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|block| matches!(block.kind, BlockKind::LoopHead { .. }))
            .map(|block| block.id)
            .collect();
        heads.sort_unstable();
        heads
    }
}

/// One node of the control-flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub statements: Vec<Statement>,
    pub successors: Vec<BlockId>,
}

impl Block {
    pub fn is_cut_point(&self) -> bool {
        !matches!(self.kind, BlockKind::Basic)
    }
}

/// Block annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Entry cut-point
    Precondition {
        conditions: Vec<Expr>,
        ranking: Vec<Expr>,
    },

    /// Exit cut-point (carries no ranking functions)
    Postcondition { conditions: Vec<Expr> },

    /// Interior cut-point
    LoopHead {
        invariants: Vec<Expr>,
        ranking: Vec<Expr>,
    },

    /// Pass-through block without annotations
    Basic,
}

impl BlockKind {
    /// Boolean annotations carried by the block
    pub fn conditions(&self) -> &[Expr] {
        match self {
            BlockKind::Precondition { conditions, .. } => conditions,
            BlockKind::Postcondition { conditions } => conditions,
            BlockKind::LoopHead { invariants, .. } => invariants,
            BlockKind::Basic => &[],
        }
    }

    /// Lexicographic measure carried by the block
    pub fn ranking(&self) -> &[Expr] {
        match self {
            BlockKind::Precondition { ranking, .. } => ranking,
            BlockKind::LoopHead { ranking, .. } => ranking,
            _ => &[],
        }
    }
}

/// Non-branching statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Restrict the path condition
    Assume { condition: Expr },

    /// Check a predicate at this point
    Assert { condition: Expr },

    /// `variable := value`
    Assign { variable: Variable, value: Expr },

    /// `array[index] := value`
    SubscriptAssign {
        array: Variable,
        index: Expr,
        value: Expr,
    },

    /// `destinations := callee(arguments)`; arguments are variables
    Call {
        destinations: Vec<Variable>,
        callee: String,
        arguments: Vec<Variable>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_lookup() {
        let function = Function {
            name: "f".to_string(),
            parameters: vec![],
            returns: vec![],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    Block {
                        id: 0,
                        kind: BlockKind::Precondition {
                            conditions: vec![],
                            ranking: vec![],
                        },
                        statements: vec![],
                        successors: vec![1],
                    },
                ),
                (
                    1,
                    Block {
                        id: 1,
                        kind: BlockKind::Postcondition { conditions: vec![] },
                        statements: vec![],
                        successors: vec![],
                    },
                ),
            ]),
        };

        assert!(function.block(0).is_ok());
        assert!(matches!(
            function.block(7),
            Err(VerifierError::UnknownBlock { block: 7, .. })
        ));
        assert!(function.loop_heads().is_empty());
    }
}
