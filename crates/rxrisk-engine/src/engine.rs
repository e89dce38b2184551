use log::{debug, info};
use rxrisk_solver::{ExactSearch, QuboMatrix, Sense, SimulatedAnnealing, Solution, SolutionStatus, Solver};

use crate::builder::QuboBuilder;
use crate::encoder::FeatureEncoder;
use crate::instance::{DrugEntry, InstanceError, InteractionWeight, ProblemInstance, RiskParams};
use crate::interpret::{Interpreter, RiskLevel, RiskThresholds};

/// Structured input of one analysis, as produced by an upstream parser
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisRequest {
    pub drugs: Vec<DrugEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interactions: Vec<InteractionWeight>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub params: RiskParams,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sense: Sense,
}

/// Decision for a single drug in the reported combination
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DrugDecision {
    pub name: String,
    pub active: bool,
}

/// Result of one analysis
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    pub assignment: Vec<DrugDecision>,
    pub active_drugs: Vec<String>,
    /// Penalized objective `x^T Q x` of the assignment
    pub objective_value: f64,
    /// Unpenalized interaction risk of the assignment
    pub risk: f64,
    /// `risk + P * (active - K)^2`, the value the risk band is read from
    pub penalized_risk: f64,
    pub status: SolutionStatus,
    pub sense: Sense,
    pub risk_level: RiskLevel,
    pub safety_score: u8,
}

/// Configuration for every stage of the pipeline
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub encoder: FeatureEncoder,
    pub thresholds: RiskThresholds,
    pub exact_threshold: usize,
    pub exact: ExactSearch,
    pub annealing: SimulatedAnnealing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encoder: FeatureEncoder::default(),
            thresholds: RiskThresholds::default(),
            exact_threshold: 10,
            exact: ExactSearch::default(),
            annealing: SimulatedAnnealing::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_encoder(mut self, encoder: FeatureEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_exact_threshold(mut self, threshold: usize) -> Self {
        self.exact_threshold = threshold;
        self
    }

    pub fn with_exact(mut self, exact: ExactSearch) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_annealing(mut self, annealing: SimulatedAnnealing) -> Self {
        self.annealing = annealing;
        self
    }
}

/// Encoder → builder → solver → interpreter pipeline
#[derive(Debug)]
pub struct RiskEngine {
    encoder: FeatureEncoder,
    builder: QuboBuilder,
    solver: Solver,
    interpreter: Interpreter,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RiskEngine {
    pub fn new(config: EngineConfig) -> Self {
        let solver = Solver::new()
            .with_exact_threshold(config.exact_threshold)
            .with_exact_strategy(config.exact)
            .with_heuristic_strategy(config.annealing);
        Self {
            encoder: config.encoder,
            builder: QuboBuilder::new(),
            solver,
            interpreter: Interpreter::new(config.thresholds),
        }
    }

    /// Replace the solver, e.g. to plug in a different heuristic backend
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Encode and validate a request
    pub fn instance(&self, request: &AnalysisRequest) -> Result<ProblemInstance, InstanceError> {
        let encoded = self.encoder.encode_all(&request.drugs);
        ProblemInstance::new(encoded, request.interactions.clone(), request.params)
    }

    /// Objective matrix of a request
    pub fn qubo(&self, request: &AnalysisRequest) -> Result<QuboMatrix, InstanceError> {
        Ok(self.builder.build(&self.instance(request)?))
    }

    /// Run the request in its own sense
    pub fn run(&self, request: &AnalysisRequest) -> Result<RiskReport, InstanceError> {
        let instance = self.instance(request)?;
        Ok(self.solve(&instance, request.sense))
    }

    /// Safest combination
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<RiskReport, InstanceError> {
        let instance = self.instance(request)?;
        Ok(self.solve(&instance, Sense::Minimize))
    }

    /// Most dangerous combination
    pub fn worst_case(&self, request: &AnalysisRequest) -> Result<RiskReport, InstanceError> {
        let instance = self.instance(request)?;
        Ok(self.solve(&instance, Sense::Maximize))
    }

    pub fn solve(&self, instance: &ProblemInstance, sense: Sense) -> RiskReport {
        let q = self.builder.build(instance);
        let names = instance.drug_names();
        debug!("solving {} drug instance ({:?})", names.len(), sense);

        let solution = self.solver.solve(&q, &names, sense);
        let report = self.report(instance, &solution);
        info!(
            "{} solution: {} active, objective {:.4}, {} risk, safety score {}",
            report.status.as_str(),
            report.active_drugs.len(),
            report.objective_value,
            report.risk_level,
            report.safety_score
        );
        report
    }

    /// Penalized objective of an arbitrary combination, named by its active drugs
    pub fn evaluate(&self, instance: &ProblemInstance, active: &[&str]) -> Result<f64, InstanceError> {
        let mut x = vec![false; instance.num_drugs()];
        for name in active {
            let i = instance
                .index_of(name)
                .ok_or_else(|| InstanceError::MissingDrug(name.to_string()))?;
            x[i] = true;
        }
        Ok(self.builder.build(instance).energy(&x))
    }

    fn report(&self, instance: &ProblemInstance, solution: &Solution) -> RiskReport {
        let offset = self.builder.penalty_offset(instance);
        let (risk_level, safety_score) = self.interpreter.interpret_with_constant(solution, offset);
        let risk = self.builder.build_risk(instance).energy(&solution.values);

        RiskReport {
            assignment: solution
                .variables
                .iter()
                .zip(&solution.values)
                .map(|(name, active)| DrugDecision {
                    name: name.clone(),
                    active: *active,
                })
                .collect(),
            active_drugs: solution.active().into_iter().map(String::from).collect(),
            objective_value: solution.objective_value,
            risk,
            penalized_risk: solution.objective_value + offset,
            status: solution.status,
            sense: solution.sense,
            risk_level,
            safety_score,
        }
    }
}

impl AnalysisRequest {
    pub fn new(drugs: Vec<DrugEntry>) -> Self {
        Self {
            drugs,
            ..Self::default()
        }
    }

    pub fn with_interaction(mut self, first: &str, second: &str, weight: f64) -> Self {
        self.interactions.push(InteractionWeight::new(first, second, weight));
        self
    }

    pub fn with_params(mut self, params: RiskParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.sense = sense;
        self
    }
}
