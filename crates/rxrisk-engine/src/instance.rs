use std::collections::{HashMap, HashSet};

use log::warn;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Drug name must not be empty")]
    EmptyDrugName,
    #[error("Duplicate drug: {0}")]
    DuplicateDrug(String),
    #[error("Unknown drug: {0}")]
    MissingDrug(String),
    #[error("Unknown drug in interaction {0} - {1}: {2}")]
    UnknownDrug(String, String, String),
    #[error("Drug {0} cannot interact with itself")]
    SelfInteraction(String),
    #[error("Interaction {0} - {1} is listed more than once")]
    DuplicateInteraction(String, String),
    #[error("Interaction weight for {0} - {1} must be finite and non-negative, got {2}")]
    InvalidWeight(String, String, f64),
    #[error("Feature {feature} of drug {drug} must be within [0, 1], got {value}")]
    InvalidFeature {
        drug: String,
        feature: &'static str,
        value: f64,
    },
    #[error("Patient modifier must be finite and non-negative, got {0}")]
    InvalidModifier(f64),
    #[error("Penalty strength must be finite and positive, got {0}")]
    InvalidPenalty(f64),
    #[error("Objective magnitude overflows for patient modifier {modifier} and penalty strength {penalty}")]
    ObjectiveOverflow { modifier: f64, penalty: f64 },
}

/// One drug as supplied by the caller
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DrugEntry {
    pub name: String,
    /// Free-form dose, e.g. "500mg"
    pub dose: String,
    /// Time-of-day label, e.g. "morning"
    pub time: String,
}

impl DrugEntry {
    pub fn new(name: impl Into<String>, dose: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dose: dose.into(),
            time: time.into(),
        }
    }
}

/// Normalized features of a drug
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDrug {
    pub name: String,
    pub dose_level: f64,
    pub time_level: f64,
}

impl EncodedDrug {
    pub fn new(name: impl Into<String>, dose_level: f64, time_level: f64) -> Self {
        Self {
            name: name.into(),
            dose_level,
            time_level,
        }
    }

    /// Unscaled self-risk: `dose_level * time_level`
    pub fn self_risk(&self) -> f64 {
        self.dose_level * self.time_level
    }
}

/// Excess risk when both drugs of an unordered pair are active
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionWeight {
    pub first: String,
    pub second: String,
    pub weight: f64,
}

impl InteractionWeight {
    pub fn new(first: impl Into<String>, second: impl Into<String>, weight: f64) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            weight,
        }
    }

    /// Pair key independent of orientation
    fn key(&self) -> (&str, &str) {
        if self.first <= self.second {
            (self.first.as_str(), self.second.as_str())
        } else {
            (self.second.as_str(), self.first.as_str())
        }
    }
}

/// Scalar parameters of a risk problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    /// Severity multiplier applied to every risk term
    pub patient_modifier: f64,
    /// Desired number of simultaneously active drugs
    pub target_count: usize,
    /// Weight of the cardinality penalty
    pub penalty_strength: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            patient_modifier: 1.0,
            target_count: 1,
            penalty_strength: 5.0,
        }
    }
}

/// Validated input to one optimization run. Drug order fixes variable indices.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    drugs: Vec<EncodedDrug>,
    index: HashMap<String, usize>,
    interactions: Vec<InteractionWeight>,
    params: RiskParams,
}

impl ProblemInstance {
    pub fn new(
        drugs: Vec<EncodedDrug>,
        interactions: Vec<InteractionWeight>,
        params: RiskParams,
    ) -> Result<Self, InstanceError> {
        if !params.patient_modifier.is_finite() || params.patient_modifier < 0.0 {
            return Err(InstanceError::InvalidModifier(params.patient_modifier));
        }
        if !params.penalty_strength.is_finite() || params.penalty_strength <= 0.0 {
            return Err(InstanceError::InvalidPenalty(params.penalty_strength));
        }

        let mut index = HashMap::new();
        for (i, drug) in drugs.iter().enumerate() {
            if drug.name.trim().is_empty() {
                return Err(InstanceError::EmptyDrugName);
            }
            for (feature, value) in [("dose_level", drug.dose_level), ("time_level", drug.time_level)] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(InstanceError::InvalidFeature {
                        drug: drug.name.clone(),
                        feature,
                        value,
                    });
                }
            }
            if index.insert(drug.name.clone(), i).is_some() {
                return Err(InstanceError::DuplicateDrug(drug.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for interaction in &interactions {
            let (a, b) = (&interaction.first, &interaction.second);
            for name in [a, b] {
                if !index.contains_key(name) {
                    return Err(InstanceError::UnknownDrug(a.clone(), b.clone(), name.clone()));
                }
            }
            if a == b {
                return Err(InstanceError::SelfInteraction(a.clone()));
            }
            if !interaction.weight.is_finite() || interaction.weight < 0.0 {
                return Err(InstanceError::InvalidWeight(a.clone(), b.clone(), interaction.weight));
            }
            if !seen.insert(interaction.key()) {
                return Err(InstanceError::DuplicateInteraction(a.clone(), b.clone()));
            }
        }

        // Bound on |x^T Q x| plus the dropped penalty constant
        let n = drugs.len() as f64;
        let k = params.target_count as f64;
        let total_weight: f64 = interactions.iter().map(|i| i.weight).sum();
        let bound = params.patient_modifier * (n + total_weight) + params.penalty_strength * ((n + k).powi(2) + k * k);
        if !bound.is_finite() {
            return Err(InstanceError::ObjectiveOverflow {
                modifier: params.patient_modifier,
                penalty: params.penalty_strength,
            });
        }

        if params.target_count > drugs.len() {
            warn!(
                "target count {} exceeds the {} drugs available",
                params.target_count,
                drugs.len()
            );
        }

        Ok(Self {
            drugs,
            index,
            interactions,
            params,
        })
    }

    pub fn drugs(&self) -> &[EncodedDrug] {
        &self.drugs
    }

    pub fn drug_names(&self) -> Vec<String> {
        self.drugs.iter().map(|d| d.name.clone()).collect()
    }

    pub fn num_drugs(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Variable index of a drug
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn drug(&self, name: &str) -> Option<&EncodedDrug> {
        self.index_of(name).map(|i| &self.drugs[i])
    }

    pub fn interactions(&self) -> &[InteractionWeight] {
        &self.interactions
    }

    pub fn params(&self) -> RiskParams {
        self.params
    }

    /// Copy of this instance with different scalar parameters
    pub fn with_params(&self, params: RiskParams) -> Result<Self, InstanceError> {
        Self::new(self.drugs.clone(), self.interactions.clone(), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drugs() -> Vec<EncodedDrug> {
        vec![
            EncodedDrug::new("warfarin", 0.005, 0.8),
            EncodedDrug::new("aspirin", 0.1, 0.2),
            EncodedDrug::new("omeprazole", 0.02, 0.2),
        ]
    }

    #[test]
    fn test_valid_instance() {
        let instance = ProblemInstance::new(
            drugs(),
            vec![InteractionWeight::new("warfarin", "aspirin", 0.9)],
            RiskParams::default(),
        )
        .unwrap();

        assert_eq!(instance.num_drugs(), 3);
        assert_eq!(instance.index_of("aspirin"), Some(1));
        assert_eq!(instance.drug("omeprazole").map(|d| d.dose_level), Some(0.02));
        assert_eq!(instance.drug_names(), vec!["warfarin", "aspirin", "omeprazole"]);
    }

    #[test]
    fn test_unknown_drug_in_interaction() {
        let err = ProblemInstance::new(
            drugs(),
            vec![InteractionWeight::new("warfarin", "ibuprofen", 0.9)],
            RiskParams::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            InstanceError::UnknownDrug("warfarin".into(), "ibuprofen".into(), "ibuprofen".into())
        );
    }

    #[test]
    fn test_duplicate_interaction_either_orientation() {
        let err = ProblemInstance::new(
            drugs(),
            vec![
                InteractionWeight::new("warfarin", "aspirin", 0.9),
                InteractionWeight::new("aspirin", "warfarin", 0.4),
            ],
            RiskParams::default(),
        )
        .unwrap_err();

        assert!(matches!(err, InstanceError::DuplicateInteraction(_, _)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut dup = drugs();
        dup.push(EncodedDrug::new("aspirin", 0.1, 0.2));
        assert_eq!(
            ProblemInstance::new(dup, vec![], RiskParams::default()).unwrap_err(),
            InstanceError::DuplicateDrug("aspirin".into())
        );

        let err = ProblemInstance::new(
            drugs(),
            vec![InteractionWeight::new("aspirin", "aspirin", 0.5)],
            RiskParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::SelfInteraction("aspirin".into()));

        let err = ProblemInstance::new(
            drugs(),
            vec![InteractionWeight::new("aspirin", "warfarin", -0.5)],
            RiskParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidWeight(_, _, _)));

        let params = RiskParams {
            penalty_strength: 0.0,
            ..RiskParams::default()
        };
        assert_eq!(
            ProblemInstance::new(drugs(), vec![], params).unwrap_err(),
            InstanceError::InvalidPenalty(0.0)
        );

        let params = RiskParams {
            patient_modifier: -1.0,
            ..RiskParams::default()
        };
        assert_eq!(
            ProblemInstance::new(drugs(), vec![], params).unwrap_err(),
            InstanceError::InvalidModifier(-1.0)
        );

        let err = ProblemInstance::new(vec![EncodedDrug::new("x", 1.5, 0.2)], vec![], RiskParams::default())
            .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidFeature { feature: "dose_level", .. }));
    }

    #[test]
    fn test_rejects_overflowing_objective() {
        let params = RiskParams {
            penalty_strength: 1e308,
            ..RiskParams::default()
        };
        let err = ProblemInstance::new(drugs(), vec![], params).unwrap_err();
        assert!(matches!(err, InstanceError::ObjectiveOverflow { .. }));

        let params = RiskParams {
            patient_modifier: 1e308,
            ..RiskParams::default()
        };
        let err = ProblemInstance::new(
            drugs(),
            vec![InteractionWeight::new("warfarin", "aspirin", 10.0)],
            params,
        )
        .unwrap_err();
        assert!(matches!(err, InstanceError::ObjectiveOverflow { .. }));

        let params = RiskParams {
            penalty_strength: 1e6,
            ..RiskParams::default()
        };
        assert!(ProblemInstance::new(drugs(), vec![], params).is_ok());
    }

    #[test]
    fn test_empty_instance_is_valid() {
        let instance = ProblemInstance::new(vec![], vec![], RiskParams::default()).unwrap();
        assert!(instance.is_empty());
    }
}
