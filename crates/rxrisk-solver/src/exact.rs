use log::debug;

use crate::problem::{QuboMatrix, Sense};
use crate::solution::Candidate;
use crate::solver::{SearchStrategy, SolveError};

/// Exhaustive search over all `2^n` assignments.
///
/// Assignments are visited in Gray-code order so consecutive states differ in
/// one bit, which makes each energy update `O(n)` instead of `O(n^2)`.
#[derive(Debug, Clone)]
pub struct ExactSearch {
    /// Refuse problems larger than this
    max_variables: usize,
    /// Energies closer than this are treated as ties
    tolerance: f64,
}

impl Default for ExactSearch {
    fn default() -> Self {
        Self {
            max_variables: 24,
            tolerance: 1e-9,
        }
    }
}

impl ExactSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_variables(mut self, max: usize) -> Self {
        // Enumeration counter is a u64
        self.max_variables = max.min(63);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_variables(&self) -> usize {
        self.max_variables
    }
}

impl SearchStrategy for ExactSearch {
    fn name(&self) -> &str {
        "exact"
    }

    fn search(&self, q: &QuboMatrix, sense: Sense) -> Result<Candidate, SolveError> {
        let n = q.size();
        if n > self.max_variables {
            return Err(SolveError::TooManyVariables {
                variables: n,
                limit: self.max_variables,
            });
        }
        if !q.is_finite() {
            return Err(SolveError::NonFiniteMatrix);
        }

        let mut x = vec![false; n];
        let mut fields = vec![0.0; n];
        let mut energy = 0.0;
        let mut best = Candidate::new(x.clone(), energy);

        let total: u64 = 1 << n;
        for step in 1..total {
            // Gray code g(step) differs from g(step - 1) in the lowest set bit of step
            let bit = step.trailing_zeros() as usize;
            energy += q.flip_delta(&x, &fields, bit);
            x[bit] = !x[bit];
            q.apply_flip(&x, &mut fields, bit);

            if best.is_beaten_by(&x, energy, sense, self.tolerance) {
                best = Candidate::new(x.clone(), energy);
            }
        }

        // Drift from incremental updates stays out of the reported value
        best.energy = q.energy(&best.values);
        if !best.energy.is_finite() {
            return Err(SolveError::NonFiniteMatrix);
        }
        debug!("exact search visited {} assignments, best energy {}", total, best.energy);
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(q: &QuboMatrix, sense: Sense) -> f64 {
        let n = q.size();
        let mut best: Option<f64> = None;
        for mask in 0u64..(1 << n) {
            let x: Vec<bool> = (0..n).map(|i| mask & (1 << i) != 0).collect();
            let e = q.energy(&x);
            best = Some(match best {
                None => e,
                Some(b) => if sense.orient(e) < sense.orient(b) { e } else { b },
            });
        }
        best.unwrap_or(0.0)
    }

    fn sample_matrix() -> QuboMatrix {
        let mut q = QuboMatrix::new(4);
        q.add_linear(0, -1.0);
        q.add_linear(1, 2.0);
        q.add_linear(2, -0.5);
        q.add_linear(3, 0.3);
        q.add_coupling(0, 2, 1.2);
        q.add_coupling(1, 3, -3.0);
        q.add_coupling(0, 3, 0.7);
        q
    }

    #[test]
    fn test_matches_brute_force() {
        let q = sample_matrix();
        for sense in [Sense::Minimize, Sense::Maximize] {
            let best = ExactSearch::new().search(&q, sense).unwrap();
            assert!((best.energy - brute_force(&q, sense)).abs() < 1e-9, "{:?}", sense);
            assert_eq!(best.energy, q.energy(&best.values));
        }
    }

    #[test]
    fn test_all_zero_matrix_prefers_empty_assignment() {
        let q = QuboMatrix::new(3);
        let best = ExactSearch::new().search(&q, Sense::Minimize).unwrap();
        assert_eq!(best.values, vec![false, false, false]);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // Two single-variable optima with identical energy
        let mut q = QuboMatrix::new(2);
        q.add_linear(0, -1.0);
        q.add_linear(1, -1.0);
        q.add_coupling(0, 1, 5.0);

        let best = ExactSearch::new().search(&q, Sense::Minimize).unwrap();
        assert_eq!(best.values, vec![false, true]);
    }

    #[test]
    fn test_rejects_oversized_problem() {
        let q = QuboMatrix::new(5);
        let result = ExactSearch::new().with_max_variables(4).search(&q, Sense::Minimize);
        assert!(matches!(result, Err(SolveError::TooManyVariables { variables: 5, limit: 4 })));
    }

    #[test]
    fn test_rejects_non_finite_matrix() {
        let mut q = sample_matrix();
        q.add_coupling(1, 2, f64::INFINITY);
        let result = ExactSearch::new().search(&q, Sense::Minimize);
        assert!(matches!(result, Err(SolveError::NonFiniteMatrix)));

        let mut q = QuboMatrix::new(3);
        q.add_linear(0, f64::NAN);
        let result = ExactSearch::new().search(&q, Sense::Maximize);
        assert!(matches!(result, Err(SolveError::NonFiniteMatrix)));
    }

    #[test]
    fn test_rejects_overflowing_energy() {
        let mut q = QuboMatrix::new(2);
        q.add_linear(0, f64::MAX);
        q.add_linear(1, f64::MAX);
        assert!(q.is_finite());
        let result = ExactSearch::new().search(&q, Sense::Maximize);
        assert!(matches!(result, Err(SolveError::NonFiniteMatrix)));
    }

    #[test]
    fn test_builder_settings() {
        let exact = ExactSearch::new().with_max_variables(100);
        assert_eq!(exact.max_variables(), 63);
        assert_eq!(ExactSearch::new().max_variables(), 24);

        // A coarse tolerance turns near-equal energies into a tie
        let mut q = QuboMatrix::new(2);
        q.add_linear(0, -1.0);
        q.add_linear(1, -1.001);
        q.add_coupling(0, 1, 5.0);
        let strict = ExactSearch::new().search(&q, Sense::Minimize).unwrap();
        assert_eq!(strict.values, vec![false, true]);
        let coarse = ExactSearch::new().with_tolerance(0.01).search(&q, Sense::Minimize).unwrap();
        assert_eq!(coarse.values, vec![false, true]);

        let mut q = QuboMatrix::new(2);
        q.add_linear(0, -1.001);
        q.add_linear(1, -1.0);
        q.add_coupling(0, 1, 5.0);
        let strict = ExactSearch::new().search(&q, Sense::Minimize).unwrap();
        assert_eq!(strict.values, vec![true, false]);
        let coarse = ExactSearch::new().with_tolerance(0.01).search(&q, Sense::Minimize).unwrap();
        assert_eq!(coarse.values, vec![false, true]);
    }

    #[test]
    fn test_empty_problem() {
        let q = QuboMatrix::new(0);
        let best = ExactSearch::new().search(&q, Sense::Minimize).unwrap();
        assert!(best.values.is_empty());
        assert_eq!(best.energy, 0.0);
    }
}
