use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::problem::{QuboMatrix, Sense};
use crate::solution::Candidate;
use crate::solver::{SearchStrategy, SolveError};

/// Simulated annealing over single bit flips.
///
/// Each restart begins from a random assignment and cools geometrically from
/// `start_temperature` to `end_temperature`, both expressed as multiples of the
/// largest absolute matrix entry. The total work is bounded by
/// `restarts * sweeps * n` flip proposals. The best state found is polished
/// with greedy descent before it is returned.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    sweeps: usize,
    restarts: usize,
    start_temperature: f64,
    end_temperature: f64,
    seed: u64,
    tolerance: f64,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            sweeps: 500,
            restarts: 8,
            start_temperature: 2.0,
            end_temperature: 1e-3,
            seed: 0x5eed,
            tolerance: 1e-9,
        }
    }
}

impl SimulatedAnnealing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps.max(1);
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    pub fn with_temperatures(mut self, start: f64, end: f64) -> Self {
        self.start_temperature = start;
        self.end_temperature = end;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Upper bound on the number of flip proposals for an `n`-variable problem
    pub fn budget(&self, n: usize) -> usize {
        self.restarts.saturating_mul(self.sweeps).saturating_mul(n)
    }

    fn temperature_schedule(&self, scale: f64) -> (f64, f64) {
        let start = (self.start_temperature * scale).max(f64::MIN_POSITIVE);
        let end = (self.end_temperature * scale).clamp(f64::MIN_POSITIVE, start);
        let ratio = if self.sweeps > 1 {
            (end / start).powf(1.0 / (self.sweeps - 1) as f64)
        } else {
            1.0
        };
        (start, ratio)
    }

    /// Flip single bits while any flip strictly improves the oriented energy
    fn polish(&self, q: &QuboMatrix, sense: Sense, candidate: &mut Candidate) {
        let n = q.size();
        let mut fields = q.local_fields(&candidate.values);
        // Strict improvement only; capped at n * n + 1 passes
        for _ in 0..n * n + 1 {
            let mut best_move: Option<(usize, f64)> = None;
            for i in 0..n {
                let delta = sense.orient(q.flip_delta(&candidate.values, &fields, i));
                if delta < -self.tolerance && best_move.is_none_or(|(_, d)| delta < d) {
                    best_move = Some((i, delta));
                }
            }
            let Some((i, _)) = best_move else {
                break;
            };
            candidate.values[i] = !candidate.values[i];
            q.apply_flip(&candidate.values, &mut fields, i);
        }
        candidate.energy = q.energy(&candidate.values);
    }
}

impl SearchStrategy for SimulatedAnnealing {
    fn name(&self) -> &str {
        "annealing"
    }

    fn search(&self, q: &QuboMatrix, sense: Sense) -> Result<Candidate, SolveError> {
        if !q.is_finite() {
            return Err(SolveError::NonFiniteMatrix);
        }

        let n = q.size();
        let mut best = Candidate::new(vec![false; n], 0.0);
        if n == 0 {
            return Ok(best);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let (start, ratio) = self.temperature_schedule(q.max_abs());

        for _ in 0..self.restarts {
            let mut x: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();
            let mut fields = q.local_fields(&x);
            let mut energy = q.energy(&x);
            let mut temperature = start;

            if best.is_beaten_by(&x, energy, sense, self.tolerance) {
                best = Candidate::new(x.clone(), energy);
            }

            for _ in 0..self.sweeps {
                for _ in 0..n {
                    let i = rng.gen_range(0..n);
                    let delta = q.flip_delta(&x, &fields, i);
                    let oriented = sense.orient(delta);
                    let accept = oriented <= 0.0 || rng.gen_range(0.0..1.0) < (-oriented / temperature).exp();
                    if !accept {
                        continue;
                    }
                    x[i] = !x[i];
                    q.apply_flip(&x, &mut fields, i);
                    energy += delta;

                    if best.is_beaten_by(&x, energy, sense, self.tolerance) {
                        best = Candidate::new(x.clone(), energy);
                    }
                }
                temperature *= ratio;
            }
        }

        self.polish(q, sense, &mut best);
        if !best.energy.is_finite() {
            return Err(SolveError::NonFiniteMatrix);
        }
        debug!(
            "annealing finished after at most {} proposals, best energy {}",
            self.budget(n),
            best.energy
        );
        Ok(best)
    }
}
