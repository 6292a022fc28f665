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

//! Floyd verifier library
//!
//! A deductive verifier for annotated control-flow programs. The front end
//! supplies an IR whose blocks carry pre-conditions, post-conditions, loop
//! invariants and ranking functions; the verifier decomposes each function
//! into basic paths between cut-points, builds verification conditions by
//! weakest-precondition propagation (including the termination obligations
//! of the lexicographic measures), and discharges them through an external
//! SMT oracle.

pub mod error;
pub mod ir;
pub mod verification;

pub use error::{SolverError, VerifierError};
pub use verification::solver::SolverConfig;
pub use verification::{Verdict, Verifier};
