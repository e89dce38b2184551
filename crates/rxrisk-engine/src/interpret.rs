use std::fmt;

use rxrisk_solver::Solution;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Risk thresholds must satisfy 0 <= safe <= low < medium < saturation, got {safe}, {low}, {medium}, {saturation}")]
    InvalidThresholds {
        safe: f64,
        low: f64,
        medium: f64,
        saturation: f64,
    },
}

/// Qualitative risk band
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Inclusive safety score range of the band
    pub fn score_range(self) -> (u8, u8) {
        match self {
            RiskLevel::Low => (67, 100),
            RiskLevel::Medium => (34, 66),
            RiskLevel::High => (0, 33),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objective boundaries of the risk bands
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ThresholdValues"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    /// At or below this the safety score is 100
    safe: f64,
    /// Upper bound (inclusive) of the low band
    low: f64,
    /// Upper bound (inclusive) of the medium band
    medium: f64,
    /// At or above this the safety score is 0
    saturation: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            safe: 0.0,
            low: 0.5,
            medium: 1.5,
            saturation: 3.0,
        }
    }
}

impl RiskThresholds {
    pub fn new(safe: f64, low: f64, medium: f64, saturation: f64) -> Result<Self, ConfigError> {
        let ordered = 0.0 <= safe && safe <= low && low < medium && medium < saturation;
        if !ordered || !saturation.is_finite() {
            return Err(ConfigError::InvalidThresholds {
                safe,
                low,
                medium,
                saturation,
            });
        }
        Ok(Self {
            safe,
            low,
            medium,
            saturation,
        })
    }

    pub fn level(&self, objective: f64) -> RiskLevel {
        if objective.is_nan() || objective > self.medium {
            RiskLevel::High
        } else if objective > self.low {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Safety score in `0..=100`, linear within each band
    pub fn score(&self, objective: f64) -> u8 {
        let (lo, hi) = self.level(objective).score_range();
        let fraction = if objective.is_nan() || objective >= self.saturation {
            0.0
        } else if objective <= self.safe {
            1.0
        } else if objective <= self.low {
            remaining(objective, self.safe, self.low)
        } else if objective <= self.medium {
            remaining(objective, self.low, self.medium)
        } else {
            remaining(objective, self.medium, self.saturation)
        };
        let span = f64::from(hi - lo);
        lo + (span * fraction).round() as u8
    }
}

/// Unchecked wire form of [`RiskThresholds`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ThresholdValues {
    safe: f64,
    low: f64,
    medium: f64,
    saturation: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<ThresholdValues> for RiskThresholds {
    type Error = ConfigError;

    fn try_from(v: ThresholdValues) -> Result<Self, Self::Error> {
        RiskThresholds::new(v.safe, v.low, v.medium, v.saturation)
    }
}

/// Share of `[from, to]` still ahead of `value`
fn remaining(value: f64, from: f64, to: f64) -> f64 {
    if to <= from {
        return 0.0;
    }
    ((to - value) / (to - from)).clamp(0.0, 1.0)
}

/// Maps a solution's objective to a risk band and a safety score
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    thresholds: RiskThresholds,
}

impl Interpreter {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn interpret(&self, solution: &Solution) -> (RiskLevel, u8) {
        self.interpret_with_constant(solution, 0.0)
    }

    /// Interpret `objective_value + constant`, for objectives whose matrix
    /// left out a constant term
    pub fn interpret_with_constant(&self, solution: &Solution, constant: f64) -> (RiskLevel, u8) {
        if solution.is_empty() {
            return (RiskLevel::Low, 100);
        }
        self.interpret_value(solution.objective_value + constant)
    }

    pub fn interpret_value(&self, objective: f64) -> (RiskLevel, u8) {
        (self.thresholds.level(objective), self.thresholds.score(objective))
    }
}
