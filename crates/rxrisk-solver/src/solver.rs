use log::{debug, warn};
use thiserror::Error;

use crate::anneal::SimulatedAnnealing;
use crate::exact::ExactSearch;
use crate::problem::{QuboMatrix, Sense};
use crate::solution::{Candidate, Solution, SolutionStatus};

/// Failure of a single search strategy. The [`Solver`] recovers from all of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Problem has {variables} variables, strategy limit is {limit}")]
    TooManyVariables { variables: usize, limit: usize },
    #[error("Objective matrix contains non-finite entries")]
    NonFiniteMatrix,
    #[error("Strategy unavailable: {0}")]
    Unavailable(String),
}

/// A way of searching binary assignments of a QUBO matrix.
///
/// Implementations return their best assignment; the caller re-evaluates its
/// energy from the matrix before reporting it.
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, q: &QuboMatrix, sense: Sense) -> Result<Candidate, SolveError>;
}

/// QUBO solver that chains exact search, heuristic search and a fixed fallback
pub struct Solver {
    /// Problems with at most this many variables go to the exact strategy first
    exact_threshold: usize,
    exact: Box<dyn SearchStrategy>,
    heuristic: Box<dyn SearchStrategy>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            exact_threshold: 10,
            exact: Box::new(ExactSearch::default()),
            heuristic: Box::new(SimulatedAnnealing::default()),
        }
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("exact_threshold", &self.exact_threshold)
            .field("exact", &self.exact.name())
            .field("heuristic", &self.heuristic.name())
            .finish()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact_threshold(mut self, threshold: usize) -> Self {
        self.exact_threshold = threshold;
        self
    }

    pub fn with_exact_strategy(mut self, strategy: impl SearchStrategy + 'static) -> Self {
        self.exact = Box::new(strategy);
        self
    }

    pub fn with_heuristic_strategy(mut self, strategy: impl SearchStrategy + 'static) -> Self {
        self.heuristic = Box::new(strategy);
        self
    }

    pub fn exact_threshold(&self) -> usize {
        self.exact_threshold
    }

    /// Solve `q` whose variables are named by `variables` (index order).
    ///
    /// Never fails: the returned status records which stage of the
    /// exact → heuristic → fallback chain produced the assignment.
    pub fn solve(&self, q: &QuboMatrix, variables: &[String], sense: Sense) -> Solution {
        debug_assert_eq!(q.size(), variables.len());
        let n = q.size();

        if n <= self.exact_threshold {
            match self.exact.search(q, sense) {
                Ok(best) => {
                    debug!("{} strategy solved {} variables", self.exact.name(), n);
                    return Solution::evaluate(q, variables, best.values, SolutionStatus::Exact, sense);
                }
                Err(e) => warn!("{} strategy failed, trying {}: {}", self.exact.name(), self.heuristic.name(), e),
            }
        }

        match self.heuristic.search(q, sense) {
            Ok(best) => {
                debug!("{} strategy solved {} variables", self.heuristic.name(), n);
                Solution::evaluate(q, variables, best.values, SolutionStatus::Approximate, sense)
            }
            Err(e) => {
                warn!("{} strategy failed, using fallback assignment: {}", self.heuristic.name(), e);
                self.fallback(q, variables, sense)
            }
        }
    }

    /// Every variable active, regardless of sense: the full regimen is the
    /// conservative assumption when no search result is available.
    fn fallback(&self, q: &QuboMatrix, variables: &[String], sense: Sense) -> Solution {
        Solution::evaluate(q, variables, vec![true; q.size()], SolutionStatus::Fallback, sense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Outage;

    impl SearchStrategy for Outage {
        fn name(&self) -> &str {
            "outage"
        }

        fn search(&self, _q: &QuboMatrix, _sense: Sense) -> Result<Candidate, SolveError> {
            Err(SolveError::Unavailable("simulated outage".to_string()))
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{}", i)).collect()
    }

    fn chain_matrix(n: usize) -> QuboMatrix {
        let mut q = QuboMatrix::new(n);
        for i in 0..n {
            q.add_linear(i, -1.0);
            if i + 1 < n {
                q.add_coupling(i, i + 1, 1.5);
            }
        }
        q
    }

    #[test]
    fn test_small_problem_is_exact() {
        let _ = env_logger::builder().is_test(true).try_init();

        let q = chain_matrix(6);
        let solution = Solver::new().solve(&q, &names(6), Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Exact);
        assert_eq!(solution.objective_value, q.energy(&solution.values));
        // Alternating pattern avoids every coupling
        assert_eq!(solution.values, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn test_large_problem_is_approximate() {
        let q = chain_matrix(12);
        let solution = Solver::new().solve(&q, &names(12), Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Approximate);
        assert_eq!(solution.objective_value, q.energy(&solution.values));
        assert!((solution.objective_value + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_matrix_falls_back() {
        let mut q = chain_matrix(3);
        q.add_coupling(0, 2, f64::INFINITY);
        let solver = Solver::new();
        assert_eq!(solver.exact_threshold(), 10);

        let solution = solver.solve(&q, &names(3), Sense::Minimize);
        assert_eq!(solution.status, SolutionStatus::Fallback);
        assert_eq!(solution.values, vec![true, true, true]);
    }

    #[test]
    fn test_exact_failure_falls_through_to_heuristic() {
        let q = chain_matrix(4);
        let solution = Solver::new()
            .with_exact_strategy(Outage)
            .solve(&q, &names(4), Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Approximate);
    }

    #[test]
    fn test_exact_resource_limit_falls_through_to_heuristic() {
        let q = chain_matrix(8);
        let solution = Solver::new()
            .with_exact_strategy(ExactSearch::new().with_max_variables(4))
            .solve(&q, &names(8), Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Approximate);
    }

    #[test]
    fn test_total_outage_returns_fallback() {
        let q = chain_matrix(3);
        let solution = Solver::new()
            .with_exact_strategy(Outage)
            .with_heuristic_strategy(Outage)
            .solve(&q, &names(3), Sense::Maximize);

        assert_eq!(solution.status, SolutionStatus::Fallback);
        assert_eq!(solution.values, vec![true, true, true]);
        assert!(solution.objective_value.is_finite());
        assert_eq!(solution.objective_value, q.energy(&[true, true, true]));
    }

    #[test]
    fn test_empty_problem() {
        let q = QuboMatrix::new(0);
        let solution = Solver::new().solve(&q, &[], Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Exact);
        assert!(solution.is_empty());
        assert_eq!(solution.objective_value, 0.0);
    }

    #[test]
    fn test_threshold_zero_forces_heuristic() {
        let q = chain_matrix(2);
        let solution = Solver::new()
            .with_exact_threshold(0)
            .solve(&q, &names(2), Sense::Minimize);

        assert_eq!(solution.status, SolutionStatus::Approximate);
    }
}
