/// Optimization direction for a QUBO objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    /// Find the assignment with the lowest objective
    #[default]
    Minimize,
    /// Find the assignment with the highest objective
    Maximize,
}

impl Sense {
    /// Map an objective value onto a scale where smaller is always better
    pub fn orient(self, value: f64) -> f64 {
        match self {
            Sense::Minimize => value,
            Sense::Maximize => -value,
        }
    }
}

/// Dense symmetric QUBO matrix. The objective of a binary vector `x` is `x^T Q x`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    size: usize,
    /// Row-major entries, length `size * size`
    data: Vec<f64>,
}

impl QuboMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Add to the diagonal entry of variable `i`
    pub fn add_linear(&mut self, i: usize, value: f64) {
        self.data[i * self.size + i] += value;
    }

    /// Add a pairwise coefficient, split evenly over `Q[i][j]` and `Q[j][i]`.
    ///
    /// The quadratic form gains exactly `value * x_i * x_j`. When `i == j`
    /// this degenerates to [`QuboMatrix::add_linear`].
    pub fn add_coupling(&mut self, i: usize, j: usize, value: f64) {
        if i == j {
            self.add_linear(i, value);
            return;
        }
        let half = value / 2.0;
        self.data[i * self.size + j] += half;
        self.data[j * self.size + i] += half;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Rows as nested vectors (for display and serialization by callers)
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }

    /// Evaluate `x^T Q x` for a binary assignment
    pub fn energy(&self, x: &[bool]) -> f64 {
        debug_assert_eq!(x.len(), self.size);
        let mut total = 0.0;
        for i in 0..self.size {
            if !x[i] {
                continue;
            }
            let row = self.row(i);
            for j in 0..self.size {
                if x[j] {
                    total += row[j];
                }
            }
        }
        total
    }

    /// Sum of `Q[i][j] * x_j` over `j != i` for every `i`.
    ///
    /// Flipping bit `i` changes the energy by `±(Q[i][i] + 2 * field[i])`.
    pub(crate) fn local_fields(&self, x: &[bool]) -> Vec<f64> {
        (0..self.size)
            .map(|i| {
                let row = self.row(i);
                (0..self.size)
                    .filter(|&j| j != i && x[j])
                    .map(|j| row[j])
                    .sum()
            })
            .collect()
    }

    /// Energy change caused by flipping bit `i` given the current local fields
    pub(crate) fn flip_delta(&self, x: &[bool], fields: &[f64], i: usize) -> f64 {
        let delta = self.get(i, i) + 2.0 * fields[i];
        if x[i] { -delta } else { delta }
    }

    /// Update local fields after bit `k` has been flipped in `x`
    pub(crate) fn apply_flip(&self, x: &[bool], fields: &mut [f64], k: usize) {
        let sign = if x[k] { 1.0 } else { -1.0 };
        for (i, field) in fields.iter_mut().enumerate() {
            if i != k {
                *field += sign * self.get(i, k);
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..self.size).all(|i| ((i + 1)..self.size).all(|j| (self.get(i, j) - self.get(j, i)).abs() <= tolerance))
    }

    /// Largest absolute entry, used to scale annealing temperatures
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }
}
