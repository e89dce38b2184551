use rxrisk_solver::QuboMatrix;

use crate::instance::ProblemInstance;

/// Builds the QUBO objective of a [`ProblemInstance`].
///
/// The objective is
///
/// ```text
/// m * (sum_i d_i t_i x_i + sum_(i,j) w_ij x_i x_j) + P * (sum_i x_i - K)^2
/// ```
///
/// with the constant `P * K^2` left out of the matrix (see
/// [`QuboBuilder::penalty_offset`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuboBuilder;

impl QuboBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Risk terms plus the cardinality penalty
    pub fn build(&self, instance: &ProblemInstance) -> QuboMatrix {
        let mut q = self.build_risk(instance);
        self.add_cardinality_penalty(&mut q, instance);
        q
    }

    /// Self-risk diagonal and interaction couplings, scaled by the patient modifier
    pub fn build_risk(&self, instance: &ProblemInstance) -> QuboMatrix {
        let modifier = instance.params().patient_modifier;
        let mut q = QuboMatrix::new(instance.num_drugs());

        for (i, drug) in instance.drugs().iter().enumerate() {
            q.add_linear(i, drug.self_risk() * modifier);
        }

        for interaction in instance.interactions() {
            // Names were checked when the instance was constructed
            if let (Some(i), Some(j)) = (
                instance.index_of(&interaction.first),
                instance.index_of(&interaction.second),
            ) {
                q.add_coupling(i, j, interaction.weight * modifier);
            }
        }

        q
    }

    /// Constant dropped from the matrix by the penalty expansion
    pub fn penalty_offset(&self, instance: &ProblemInstance) -> f64 {
        let params = instance.params();
        let k = params.target_count as f64;
        params.penalty_strength * k * k
    }

    /// Expand `P * (sum x - K)^2` using `x_i^2 = x_i`
    fn add_cardinality_penalty(&self, q: &mut QuboMatrix, instance: &ProblemInstance) {
        let params = instance.params();
        let p = params.penalty_strength;
        let k = params.target_count as f64;
        let n = q.size();

        for i in 0..n {
            q.add_linear(i, p * (1.0 - 2.0 * k));
            for j in (i + 1)..n {
                q.add_coupling(i, j, 2.0 * p);
            }
        }
    }
}
