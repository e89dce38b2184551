use crate::problem::{QuboMatrix, Sense};

/// Provenance of a solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Proven optimal by exhaustive search
    Exact,
    /// Best effort from a heuristic search
    Approximate,
    /// Fixed assignment returned after every search strategy failed
    Fallback,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Exact => "exact",
            SolutionStatus::Approximate => "approximate",
            SolutionStatus::Fallback => "fallback",
        }
    }
}

/// The result of solving a QUBO problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// How the assignment was obtained
    pub status: SolutionStatus,
    /// Direction the search optimized in
    pub sense: Sense,
    /// Variable names, in matrix index order
    pub variables: Vec<String>,
    /// Binary value for each variable
    pub values: Vec<bool>,
    /// `x^T Q x` for `values`, recomputed from the matrix
    pub objective_value: f64,
}

impl Solution {
    /// Build a solution, evaluating its objective directly from `q`
    pub(crate) fn evaluate(
        q: &QuboMatrix,
        variables: &[String],
        values: Vec<bool>,
        status: SolutionStatus,
        sense: Sense,
    ) -> Self {
        let objective_value = q.energy(&values);
        Self {
            status,
            sense,
            variables: variables.to_vec(),
            values,
            objective_value,
        }
    }

    /// Value assigned to a named variable
    pub fn get(&self, name: &str) -> Option<bool> {
        self.variables
            .iter()
            .position(|v| v == name)
            .map(|i| self.values[i])
    }

    /// Names of variables set to 1, in index order
    pub fn active(&self) -> Vec<&str> {
        self.variables
            .iter()
            .zip(&self.values)
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|on| **on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// An assignment under consideration by a search strategy
#[derive(Debug, Clone)]
pub struct Candidate {
    pub values: Vec<bool>,
    pub energy: f64,
}

impl Candidate {
    pub fn new(values: Vec<bool>, energy: f64) -> Self {
        Self { values, energy }
    }

    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|on| **on).count()
    }

    /// Whether this candidate should replace `other` as the incumbent.
    ///
    /// Energies closer than `tolerance` tie; ties go to fewer active
    /// variables, then to the lexicographically smaller value vector.
    pub fn beats(&self, other: &Candidate, sense: Sense, tolerance: f64) -> bool {
        other.is_beaten_by(&self.values, self.energy, sense, tolerance)
    }

    /// Same comparison as [`Candidate::beats`] without materializing a challenger
    pub fn is_beaten_by(&self, values: &[bool], energy: f64, sense: Sense, tolerance: f64) -> bool {
        let challenger = sense.orient(energy);
        let incumbent = sense.orient(self.energy);
        if challenger.is_nan() || incumbent.is_nan() {
            // A finite energy always replaces NaN, never the other way round
            return incumbent.is_nan() && !challenger.is_nan();
        }
        if challenger < incumbent - tolerance {
            return true;
        }
        if challenger > incumbent + tolerance {
            return false;
        }
        let active = values.iter().filter(|on| **on).count();
        match active.cmp(&self.active_count()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => values < self.values.as_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_energy_never_wins() {
        let finite = Candidate::new(vec![true, false], 3.0);
        let nan = Candidate::new(vec![false, false], f64::NAN);
        assert!(!nan.beats(&finite, Sense::Minimize, 1e-9));
        assert!(!nan.beats(&finite, Sense::Maximize, 1e-9));
        assert!(finite.beats(&nan, Sense::Minimize, 1e-9));
        assert!(!nan.beats(&nan, Sense::Minimize, 1e-9));
    }

    #[test]
    fn test_tie_break_prefers_fewer_active() {
        let a = Candidate::new(vec![true, true], 1.0);
        let b = Candidate::new(vec![true, false], 1.0);
        assert!(b.beats(&a, Sense::Minimize, 1e-9));
        assert!(!a.beats(&b, Sense::Minimize, 1e-9));
    }

    #[test]
    fn test_tie_break_lexicographic() {
        let a = Candidate::new(vec![false, true], 1.0);
        let b = Candidate::new(vec![true, false], 1.0);
        assert!(a.beats(&b, Sense::Maximize, 1e-9));
    }

    #[test]
    fn test_sense_respected() {
        let low = Candidate::new(vec![true], -1.0);
        let high = Candidate::new(vec![false], 2.0);
        assert!(low.beats(&high, Sense::Minimize, 1e-9));
        assert!(high.beats(&low, Sense::Maximize, 1e-9));
    }

    #[test]
    fn test_solution_accessors() {
        let mut q = QuboMatrix::new(2);
        q.add_linear(0, 0.25);
        q.add_linear(1, 0.5);
        let names = vec!["a".to_string(), "b".to_string()];
        let solution = Solution::evaluate(&q, &names, vec![false, true], SolutionStatus::Exact, Sense::Minimize);

        assert_eq!(solution.objective_value, 0.5);
        assert_eq!(solution.active(), vec!["b"]);
        assert_eq!(solution.get("a"), Some(false));
        assert_eq!(solution.get("c"), None);
        assert_eq!(solution.status.as_str(), "exact");
    }
}
