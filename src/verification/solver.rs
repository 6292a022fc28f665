//! SMT solver adapter
//!
//! Owns one oracle session per verification run. User predicates are
//! registered once and shipped with every query; each validity check is a
//! one-shot exchange with an external SMT-LIB 2 process.

use super::smtlib;
use crate::error::SolverError;
use crate::ir::{Expr, Predicate};
use std::io::Write;
use std::process::{Command, Stdio};

/// External oracle configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Solver binary on the search path
    pub binary: String,

    /// Arguments putting the solver into SMT-LIB-on-stdin mode
    pub args: Vec<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary: "z3".to_string(),
            args: vec!["-in".to_string()],
        }
    }
}

/// Raw counterexample text reported by the oracle
#[derive(Debug, Clone)]
pub struct Model {
    pub raw: String,
}

/// Outcome of one validity check
#[derive(Debug, Clone)]
pub enum CheckResult {
    /// The negation is unsatisfiable
    Valid,

    /// The negation is satisfiable
    Invalid(Model),

    /// The oracle could not decide
    Unknown,
}

/// One oracle session
#[derive(Debug)]
pub struct SmtSolver {
    config: SolverConfig,

    /// Predicate definitions accumulated for this run
    definitions: String,
}

impl SmtSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            definitions: String::new(),
        }
    }

    /// Register a user predicate for the rest of the session
    pub fn define_predicate(&mut self, predicate: &Predicate) {
        self.definitions.push_str(&smtlib::define_predicate(predicate));
    }

    /// Check whether a boolean formula is valid by asking the oracle for the
    /// satisfiability of its negation
    pub fn check_valid(&self, formula: &Expr) -> Result<CheckResult, SolverError> {
        let script = smtlib::validity_script(&self.definitions, formula);
        let output = self.run(&script)?;

        let mut lines = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());
        match lines.next() {
            Some("unsat") => Ok(CheckResult::Valid),
            Some("sat") => {
                let raw = lines.collect::<Vec<&str>>().join("\n");
                Ok(CheckResult::Invalid(Model { raw }))
            }
            Some("unknown") => Ok(CheckResult::Unknown),
            _ => Err(SolverError::UnexpectedVerdict(output)),
        }
    }

    fn run(&self, script: &str) -> Result<String, SolverError> {
        let mut child = Command::new(&self.config.binary)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SolverError::Launch {
                binary: self.config.binary.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Variable;

    /// A scripted oracle that swallows the query and prints a fixed verdict
    fn scripted(verdict: &str) -> SmtSolver {
        SmtSolver::new(SolverConfig {
            binary: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                format!("cat >/dev/null; echo {verdict}"),
            ],
        })
    }

    fn tautology() -> Expr {
        Expr::eq(Expr::var(Variable::int("x")), Expr::var(Variable::int("x")))
    }

    #[test]
    fn test_unsat_means_valid() {
        let result = scripted("unsat").check_valid(&tautology()).unwrap();
        assert!(matches!(result, CheckResult::Valid));
    }

    #[test]
    fn test_sat_means_invalid() {
        let result = scripted("sat").check_valid(&tautology()).unwrap();
        assert!(matches!(result, CheckResult::Invalid(_)));
    }

    #[test]
    fn test_unknown_is_reported() {
        let result = scripted("unknown").check_valid(&tautology()).unwrap();
        assert!(matches!(result, CheckResult::Unknown));
    }

    #[test]
    fn test_garbage_output_is_an_error() {
        let result = scripted("wat").check_valid(&tautology());
        assert!(matches!(result, Err(SolverError::UnexpectedVerdict(_))));
    }

    #[test]
    fn test_missing_binary_is_a_launch_error() {
        let solver = SmtSolver::new(SolverConfig {
            binary: "definitely-not-an-smt-solver".to_string(),
            args: vec![],
        });
        assert!(matches!(
            solver.check_valid(&tautology()),
            Err(SolverError::Launch { .. })
        ));
    }
}
