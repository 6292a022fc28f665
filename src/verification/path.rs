//! Basic paths and their enumeration
//!
//! A basic path is a maximal cut-free fragment of a function: it starts at a
//! cut-point (pre-condition or loop head), ends at the next cut-point or at
//! an assertion / function call, and carries only non-branching statements
//! in between.

use crate::error::VerifierError;
use crate::ir::{BlockId, BlockKind, Expr, Function, Program, Statement, Variable};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Interior statement of a basic path. Assertions and calls never appear
/// here; they end a path instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStatement {
    Assume(Expr),
    Assign {
        variable: Variable,
        value: Expr,
    },
    SubscriptAssign {
        array: Variable,
        index: Expr,
        value: Expr,
    },
}

impl fmt::Display for PathStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStatement::Assume(condition) => write!(f, "assume {condition}"),
            PathStatement::Assign { variable, value } => write!(f, "{variable} := {value}"),
            PathStatement::SubscriptAssign {
                array,
                index,
                value,
            } => write!(f, "{array}[{index}] := {value}"),
        }
    }
}

/// One cut-free fragment of a function, with defensive copies of the
/// surrounding annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicPath {
    pub function: String,
    pub head_block: BlockId,
    pub tail_block: BlockId,
    pub head_conditions: Vec<Expr>,
    pub tail_conditions: Vec<Expr>,
    pub head_ranking: Vec<Expr>,
    pub tail_ranking: Vec<Expr>,
    pub statements: Vec<PathStatement>,
}

impl BasicPath {
    /// Names of every variable mentioned anywhere on the path
    pub fn free_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let add_expr = |expr: &Expr, names: &mut BTreeSet<String>| {
            for variable in expr.free_vars() {
                names.insert(variable.name);
            }
        };
        for expr in self
            .head_conditions
            .iter()
            .chain(&self.tail_conditions)
            .chain(&self.head_ranking)
            .chain(&self.tail_ranking)
        {
            add_expr(expr, &mut names);
        }
        for statement in &self.statements {
            match statement {
                PathStatement::Assume(condition) => add_expr(condition, &mut names),
                PathStatement::Assign { variable, value } => {
                    names.insert(variable.name.clone());
                    add_expr(value, &mut names);
                }
                PathStatement::SubscriptAssign {
                    array,
                    index,
                    value,
                } => {
                    names.insert(array.name.clone());
                    add_expr(index, &mut names);
                    add_expr(value, &mut names);
                }
            }
        }
        names
    }
}

impl fmt::Display for BasicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "basic path in '{}': block {} -> block {}",
            self.function, self.head_block, self.tail_block
        )?;
        for condition in &self.head_conditions {
            writeln!(f, "  head: {condition}")?;
        }
        if !self.head_ranking.is_empty() {
            writeln!(f, "  head ranking: {}", render_tuple(&self.head_ranking))?;
        }
        for statement in &self.statements {
            writeln!(f, "  {statement}")?;
        }
        for condition in &self.tail_conditions {
            writeln!(f, "  tail: {condition}")?;
        }
        if !self.tail_ranking.is_empty() {
            writeln!(f, "  tail ranking: {}", render_tuple(&self.tail_ranking))?;
        }
        Ok(())
    }
}

fn render_tuple(exprs: &[Expr]) -> String {
    let parts: Vec<String> = exprs.iter().map(|expr| expr.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Enumerate every basic path of a function.
///
/// One depth-first walk starts at the pre-condition block and one at each
/// loop head. Cut-points terminate a walk, so enumeration is finite on any
/// CFG whose cycles all pass through a loop head.
pub fn enumerate_function(
    program: &Program,
    function: &Function,
) -> Result<Vec<BasicPath>, VerifierError> {
    let mut heads = vec![function.precondition];
    heads.extend(function.loop_heads());

    let mut paths = Vec::new();
    for head in heads {
        let block = function.block(head)?;
        let (head_conditions, head_ranking) = match &block.kind {
            BlockKind::Precondition {
                conditions,
                ranking,
            } => (conditions.clone(), ranking.clone()),
            BlockKind::LoopHead {
                invariants,
                ranking,
            } => (invariants.clone(), ranking.clone()),
            _ => {
                return Err(VerifierError::NotAHeadBlock {
                    function: function.name.clone(),
                    block: head,
                })
            }
        };

        let mut enumerator = PathEnumerator {
            program,
            function,
            head_block: head,
            head_conditions,
            head_ranking,
            statements: Vec::new(),
            paths: Vec::new(),
        };
        enumerator.walk(head, 0)?;
        paths.append(&mut enumerator.paths);
    }
    Ok(paths)
}

struct PathEnumerator<'a> {
    program: &'a Program,
    function: &'a Function,
    head_block: BlockId,
    head_conditions: Vec<Expr>,
    head_ranking: Vec<Expr>,

    /// Working list of accumulated statements. Each visit appends its own
    /// entries and truncates them before returning, so sibling successors
    /// share the same prefix.
    statements: Vec<PathStatement>,
    paths: Vec<BasicPath>,
}

impl<'a> PathEnumerator<'a> {
    fn walk(&mut self, id: BlockId, step: usize) -> Result<(), VerifierError> {
        let block = self.function.block(id)?;

        if step > 0 {
            match &block.kind {
                BlockKind::Postcondition { conditions } => {
                    self.emit(id, conditions.clone(), Vec::new());
                    return Ok(());
                }
                BlockKind::LoopHead {
                    invariants,
                    ranking,
                } => {
                    self.emit(id, invariants.clone(), ranking.clone());
                    return Ok(());
                }
                BlockKind::Precondition { .. } => {
                    return Err(VerifierError::EntryHasPredecessors {
                        function: self.function.name.clone(),
                        block: id,
                    });
                }
                BlockKind::Basic => {}
            }
        }

        let mark = self.statements.len();
        for statement in &block.statements {
            match statement {
                Statement::Assume { condition } => {
                    self.statements.push(PathStatement::Assume(condition.clone()));
                }
                Statement::Assign { variable, value } => {
                    self.statements.push(PathStatement::Assign {
                        variable: variable.clone(),
                        value: value.clone(),
                    });
                }
                Statement::SubscriptAssign {
                    array,
                    index,
                    value,
                } => {
                    self.statements.push(PathStatement::SubscriptAssign {
                        array: array.clone(),
                        index: index.clone(),
                        value: value.clone(),
                    });
                }
                Statement::Assert { condition } => {
                    // An assertion is checked at this point but imposes no
                    // termination obligation, and is not assumed for the
                    // rest of the block.
                    self.emit(id, vec![condition.clone()], Vec::new());
                }
                Statement::Call {
                    destinations,
                    callee,
                    arguments,
                } => {
                    self.expand_call(id, destinations, callee, arguments)?;
                }
            }
        }

        for &successor in &block.successors {
            self.walk(successor, step + 1)?;
        }
        self.statements.truncate(mark);
        Ok(())
    }

    /// A call ends a path on the callee's pre-conditions (with formals
    /// substituted by the actual argument variables) and then continues
    /// under the callee's post-condition summary.
    fn expand_call(
        &mut self,
        id: BlockId,
        destinations: &[Variable],
        callee: &str,
        arguments: &[Variable],
    ) -> Result<(), VerifierError> {
        let callee_fn =
            self.program
                .function(callee)
                .ok_or_else(|| VerifierError::UnknownCallee {
                    function: self.function.name.clone(),
                    callee: callee.to_string(),
                })?;
        if callee_fn.parameters.len() != arguments.len() {
            return Err(VerifierError::CallArityMismatch {
                function: self.function.name.clone(),
                callee: callee.to_string(),
                expected: callee_fn.parameters.len(),
                found: arguments.len(),
            });
        }
        if callee_fn.returns.len() != destinations.len() {
            return Err(VerifierError::ResultArityMismatch {
                function: self.function.name.clone(),
                callee: callee.to_string(),
                expected: callee_fn.returns.len(),
                found: destinations.len(),
            });
        }

        let mut binding: BTreeMap<Variable, Expr> = BTreeMap::new();
        for (formal, actual) in callee_fn.parameters.iter().zip(arguments) {
            binding.insert(formal.clone(), Expr::Var(actual.clone()));
        }

        let entry = callee_fn.block(callee_fn.precondition)?;
        let (pre_conditions, pre_ranking) = match &entry.kind {
            BlockKind::Precondition {
                conditions,
                ranking,
            } => (conditions, ranking),
            _ => {
                return Err(VerifierError::EntryNotPrecondition {
                    function: callee.to_string(),
                    block: callee_fn.precondition,
                })
            }
        };
        let tail_conditions = pre_conditions
            .iter()
            .map(|condition| condition.subst_all(&binding))
            .collect();
        let tail_ranking = pre_ranking
            .iter()
            .map(|rank| rank.subst_all(&binding))
            .collect();
        self.emit(id, tail_conditions, tail_ranking);

        let exit = callee_fn.block(callee_fn.postcondition)?;
        let post_conditions = match &exit.kind {
            BlockKind::Postcondition { conditions } => conditions,
            _ => {
                return Err(VerifierError::ExitNotPostcondition {
                    function: callee.to_string(),
                    block: callee_fn.postcondition,
                })
            }
        };

        // One simultaneous map: formals to actuals, returns to destinations.
        let mut summary_binding = binding;
        for (result, destination) in callee_fn.returns.iter().zip(destinations) {
            summary_binding.insert(result.clone(), Expr::Var(destination.clone()));
        }
        let summary = Expr::big_and(
            post_conditions
                .iter()
                .map(|condition| condition.subst_all(&summary_binding)),
        );
        self.statements.push(PathStatement::Assume(summary));
        Ok(())
    }

    fn emit(&mut self, tail_block: BlockId, tail_conditions: Vec<Expr>, tail_ranking: Vec<Expr>) {
        self.paths.push(BasicPath {
            function: self.function.name.clone(),
            head_block: self.head_block,
            tail_block,
            head_conditions: self.head_conditions.clone(),
            tail_conditions,
            head_ranking: self.head_ranking.clone(),
            tail_ranking,
            statements: self.statements.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Block;
    use std::collections::HashMap;

    fn x() -> Variable {
        Variable::int("x")
    }

    fn block(id: BlockId, kind: BlockKind, statements: Vec<Statement>, successors: Vec<BlockId>) -> Block {
        Block {
            id,
            kind,
            statements,
            successors,
        }
    }

    fn single_function_program(function: Function) -> Program {
        Program {
            functions: vec![function],
            predicates: vec![],
        }
    }

    #[test]
    fn test_straight_line_path() {
        let function = Function {
            name: "f".to_string(),
            parameters: vec![],
            returns: vec![x()],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![],
                            ranking: vec![],
                        },
                        vec![Statement::Assign {
                            variable: x(),
                            value: Expr::int(1),
                        }],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(
                        1,
                        BlockKind::Postcondition {
                            conditions: vec![Expr::eq(Expr::var(x()), Expr::int(1))],
                        },
                        vec![],
                        vec![],
                    ),
                ),
            ]),
        };
        let program = single_function_program(function);
        let paths = enumerate_function(&program, &program.functions[0]).unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].head_block, 0);
        assert_eq!(paths[0].tail_block, 1);
        assert_eq!(
            paths[0].statements,
            vec![PathStatement::Assign {
                variable: x(),
                value: Expr::int(1),
            }]
        );
        assert!(paths[0].tail_ranking.is_empty());
    }

    #[test]
    fn test_branches_share_prefix() {
        // pre(0) -> basic(1) -> {basic(2), basic(3)} -> post(4)
        let prefix = Statement::Assign {
            variable: x(),
            value: Expr::int(0),
        };
        let left = Statement::Assume {
            condition: Expr::var(Variable::boolean("b")),
        };
        let right = Statement::Assume {
            condition: Expr::not(Expr::var(Variable::boolean("b"))),
        };
        let function = Function {
            name: "f".to_string(),
            parameters: vec![],
            returns: vec![],
            precondition: 0,
            postcondition: 4,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![],
                            ranking: vec![],
                        },
                        vec![],
                        vec![1],
                    ),
                ),
                (1, block(1, BlockKind::Basic, vec![prefix.clone()], vec![2, 3])),
                (2, block(2, BlockKind::Basic, vec![left.clone()], vec![4])),
                (3, block(3, BlockKind::Basic, vec![right.clone()], vec![4])),
                (
                    4,
                    block(4, BlockKind::Postcondition { conditions: vec![] }, vec![], vec![]),
                ),
            ]),
        };
        let program = single_function_program(function);
        let paths = enumerate_function(&program, &program.functions[0]).unwrap();

        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path.statements.len(), 2);
            assert_eq!(
                path.statements[0],
                PathStatement::Assign {
                    variable: x(),
                    value: Expr::int(0),
                }
            );
        }
        // back-tracking must not leak one branch's statements into the other
        assert_ne!(paths[0].statements[1], paths[1].statements[1]);
    }

    #[test]
    fn test_loop_produces_three_paths() {
        let n = Variable::int("n");
        let i = Variable::int("i");
        let function = Function {
            name: "count".to_string(),
            parameters: vec![n.clone()],
            returns: vec![i.clone()],
            precondition: 0,
            postcondition: 4,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![Expr::ge(Expr::var(n.clone()), Expr::int(0))],
                            ranking: vec![],
                        },
                        vec![Statement::Assign {
                            variable: i.clone(),
                            value: Expr::int(0),
                        }],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(
                        1,
                        BlockKind::LoopHead {
                            invariants: vec![Expr::le(Expr::var(i.clone()), Expr::var(n.clone()))],
                            ranking: vec![Expr::sub(Expr::var(n.clone()), Expr::var(i.clone()))],
                        },
                        vec![],
                        vec![2, 3],
                    ),
                ),
                (
                    2,
                    block(
                        2,
                        BlockKind::Basic,
                        vec![
                            Statement::Assume {
                                condition: Expr::lt(Expr::var(i.clone()), Expr::var(n.clone())),
                            },
                            Statement::Assign {
                                variable: i.clone(),
                                value: Expr::add(Expr::var(i.clone()), Expr::int(1)),
                            },
                        ],
                        vec![1],
                    ),
                ),
                (
                    3,
                    block(
                        3,
                        BlockKind::Basic,
                        vec![Statement::Assume {
                            condition: Expr::not(Expr::lt(Expr::var(i.clone()), Expr::var(n.clone()))),
                        }],
                        vec![4],
                    ),
                ),
                (
                    4,
                    block(
                        4,
                        BlockKind::Postcondition {
                            conditions: vec![Expr::eq(Expr::var(i.clone()), Expr::var(n.clone()))],
                        },
                        vec![],
                        vec![],
                    ),
                ),
            ]),
        };
        let program = single_function_program(function);
        let paths = enumerate_function(&program, &program.functions[0]).unwrap();

        let mut ends: Vec<(BlockId, BlockId)> = paths
            .iter()
            .map(|path| (path.head_block, path.tail_block))
            .collect();
        ends.sort_unstable();
        assert_eq!(ends, vec![(0, 1), (1, 1), (1, 4)]);

        let back_edge = paths
            .iter()
            .find(|path| path.head_block == 1 && path.tail_block == 1)
            .unwrap();
        assert_eq!(back_edge.head_ranking.len(), 1);
        assert_eq!(back_edge.tail_ranking.len(), 1);

        let exit = paths
            .iter()
            .find(|path| path.head_block == 1 && path.tail_block == 4)
            .unwrap();
        assert!(exit.tail_ranking.is_empty());
    }

    #[test]
    fn test_assert_splits_but_does_not_join() {
        // assert ends a path mid-block and the scan continues without it
        let p = Expr::gt(Expr::var(x()), Expr::int(0));
        let function = Function {
            name: "f".to_string(),
            parameters: vec![],
            returns: vec![],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![],
                            ranking: vec![],
                        },
                        vec![
                            Statement::Assign {
                                variable: x(),
                                value: Expr::int(1),
                            },
                            Statement::Assert {
                                condition: p.clone(),
                            },
                            Statement::Assign {
                                variable: x(),
                                value: Expr::int(2),
                            },
                        ],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(1, BlockKind::Postcondition { conditions: vec![] }, vec![], vec![]),
                ),
            ]),
        };
        let program = single_function_program(function);
        let paths = enumerate_function(&program, &program.functions[0]).unwrap();

        assert_eq!(paths.len(), 2);

        let assertion = paths.iter().find(|path| path.tail_block == 0).unwrap();
        assert_eq!(assertion.tail_conditions, vec![p]);
        assert!(assertion.tail_ranking.is_empty());
        assert_eq!(assertion.statements.len(), 1);

        let through = paths.iter().find(|path| path.tail_block == 1).unwrap();
        assert_eq!(through.statements.len(), 2);
        for statement in &through.statements {
            assert!(matches!(statement, PathStatement::Assign { .. }));
        }
    }

    #[test]
    fn test_call_emits_obligation_and_summary() {
        let a = Variable::int("a");
        let r = Variable::int("r");
        let y = Variable::int("y");
        let callee = Function {
            name: "incr".to_string(),
            parameters: vec![a.clone()],
            returns: vec![r.clone()],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![Expr::ge(Expr::var(a.clone()), Expr::int(0))],
                            ranking: vec![Expr::var(a.clone())],
                        },
                        vec![Statement::Assign {
                            variable: r.clone(),
                            value: Expr::add(Expr::var(a.clone()), Expr::int(1)),
                        }],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(
                        1,
                        BlockKind::Postcondition {
                            conditions: vec![Expr::eq(
                                Expr::var(r.clone()),
                                Expr::add(Expr::var(a.clone()), Expr::int(1)),
                            )],
                        },
                        vec![],
                        vec![],
                    ),
                ),
            ]),
        };
        let caller = Function {
            name: "main".to_string(),
            parameters: vec![x()],
            returns: vec![],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![Expr::ge(Expr::var(x()), Expr::int(0))],
                            ranking: vec![],
                        },
                        vec![Statement::Call {
                            destinations: vec![y.clone()],
                            callee: "incr".to_string(),
                            arguments: vec![x()],
                        }],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(1, BlockKind::Postcondition { conditions: vec![] }, vec![], vec![]),
                ),
            ]),
        };
        let program = Program {
            functions: vec![callee, caller],
            predicates: vec![],
        };
        let caller = program.function("main").unwrap();
        let paths = enumerate_function(&program, caller).unwrap();

        assert_eq!(paths.len(), 2);

        // obligation: callee pre-conditions and entry measure over actuals
        let obligation = paths.iter().find(|path| path.tail_block == 0).unwrap();
        assert_eq!(
            obligation.tail_conditions,
            vec![Expr::ge(Expr::var(x()), Expr::int(0))]
        );
        assert_eq!(obligation.tail_ranking, vec![Expr::var(x())]);

        // continuation: summary assume over actuals and destinations
        let continuation = paths.iter().find(|path| path.tail_block == 1).unwrap();
        assert_eq!(
            continuation.statements,
            vec![PathStatement::Assume(Expr::big_and([Expr::eq(
                Expr::var(y.clone()),
                Expr::add(Expr::var(x()), Expr::int(1)),
            )]))]
        );
    }

    #[test]
    fn test_statement_restriction() {
        // every emitted path only contains assume and assignment statements,
        // by construction of PathStatement
        let program = single_function_program(Function {
            name: "f".to_string(),
            parameters: vec![],
            returns: vec![],
            precondition: 0,
            postcondition: 1,
            blocks: HashMap::from([
                (
                    0,
                    block(
                        0,
                        BlockKind::Precondition {
                            conditions: vec![],
                            ranking: vec![],
                        },
                        vec![Statement::Assert {
                            condition: Expr::boolean(true),
                        }],
                        vec![1],
                    ),
                ),
                (
                    1,
                    block(1, BlockKind::Postcondition { conditions: vec![] }, vec![], vec![]),
                ),
            ]),
        });
        let paths = enumerate_function(&program, &program.functions[0]).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|path| path.statements.is_empty()));
    }
}
