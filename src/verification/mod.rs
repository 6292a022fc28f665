//! Deductive verification engine
//!
//! Cuts every function into basic paths, builds verification conditions per
//! path, and discharges them through the SMT oracle. The outcome is a
//! three-valued verdict over the whole program.

pub mod path;
pub mod smtlib;
pub mod solver;
pub mod vcgen;

use self::path::enumerate_function;
use self::solver::{CheckResult, SmtSolver, SolverConfig};
use self::vcgen::VcGenerator;
use crate::error::VerifierError;
use crate::ir::{validation, Program};
use std::fmt;
use std::io::{self, Write};

/// Overall verification verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every verification condition is valid
    Verified,

    /// At least one verification condition has a counterexample
    Refuted,

    /// No counterexample, but the oracle could not decide everything
    Unknown,
}

impl Verdict {
    /// Signed convention: positive when all specifications hold, negative
    /// when at least one fails, zero when undecided
    pub fn code(self) -> i32 {
        match self {
            Verdict::Verified => 1,
            Verdict::Refuted => -1,
            Verdict::Unknown => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Verified => write!(f, "verified"),
            Verdict::Refuted => write!(f, "refuted"),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

/// Main verification engine
pub struct Verifier {
    solver: SolverConfig,
    verbose: bool,
}

impl Verifier {
    /// Create a verifier talking to the default oracle
    pub fn new() -> Self {
        Self {
            solver: SolverConfig::default(),
            verbose: false,
        }
    }

    /// Use a different oracle
    pub fn solver(mut self, config: SolverConfig) -> Self {
        self.solver = config;
        self
    }

    /// Pretty-print basic paths and conditions while solving
    pub fn verbose(mut self, enable: bool) -> Self {
        self.verbose = enable;
        self
    }

    /// Verify a whole program
    pub fn apply(&self, program: &Program) -> Result<Verdict, VerifierError> {
        self.apply_with_diagnostics(program, &mut io::sink())
    }

    /// Verify a whole program, writing diagnostics to the given sink when
    /// verbose is enabled
    pub fn apply_with_diagnostics(
        &self,
        program: &Program,
        sink: &mut dyn Write,
    ) -> Result<Verdict, VerifierError> {
        validation::validate(program)?;

        let mut solver = SmtSolver::new(self.solver.clone());
        for predicate in &program.predicates {
            solver.define_predicate(predicate);
        }

        let mut generator = VcGenerator::new();
        let mut refuted = false;
        let mut undecided = false;
        for function in &program.functions {
            for basic_path in enumerate_function(program, function)? {
                if self.verbose {
                    writeln!(sink, "{basic_path}")?;
                }
                for vc in generator.generate(&basic_path)? {
                    if self.verbose {
                        writeln!(sink, "{vc}")?;
                    }
                    match solver.check_valid(&vc.formula)? {
                        CheckResult::Valid => {}
                        CheckResult::Invalid(_) => {
                            refuted = true;
                            if self.verbose {
                                writeln!(sink, "  refuted")?;
                            }
                        }
                        CheckResult::Unknown => {
                            undecided = true;
                            if self.verbose {
                                writeln!(sink, "  undecided")?;
                            }
                        }
                    }
                }
            }
        }

        // a definite counterexample outweighs an undecided condition
        Ok(if refuted {
            Verdict::Refuted
        } else if undecided {
            Verdict::Unknown
        } else {
            Verdict::Verified
        })
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_codes() {
        assert!(Verdict::Verified.code() > 0);
        assert!(Verdict::Refuted.code() < 0);
        assert_eq!(Verdict::Unknown.code(), 0);
    }

    #[test]
    fn test_empty_program_is_verified() {
        let program = Program {
            functions: vec![],
            predicates: vec![],
        };
        // no paths, no conditions, no oracle calls
        let verdict = Verifier::new().apply(&program).unwrap();
        assert_eq!(verdict, Verdict::Verified);
    }
}
