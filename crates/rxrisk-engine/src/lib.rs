pub mod builder;
pub mod encoder;
pub mod engine;
pub mod instance;
pub mod interpret;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use builder::QuboBuilder;
pub use encoder::{FeatureEncoder, TimeTable, parse_dose_mg};
pub use engine::{AnalysisRequest, DrugDecision, EngineConfig, RiskEngine, RiskReport};
pub use instance::{DrugEntry, EncodedDrug, InstanceError, InteractionWeight, ProblemInstance, RiskParams};
pub use interpret::{ConfigError, Interpreter, RiskLevel, RiskThresholds};
pub use rxrisk_solver::{Sense, Solution, SolutionStatus};
