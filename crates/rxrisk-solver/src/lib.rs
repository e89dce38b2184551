mod anneal;
mod exact;
mod problem;
mod solution;
mod solver;

pub use anneal::SimulatedAnnealing;
pub use exact::ExactSearch;
pub use problem::{QuboMatrix, Sense};
pub use solution::{Candidate, Solution, SolutionStatus};
pub use solver::{SearchStrategy, SolveError, Solver};
