//! WASM bindings for rxrisk
//!
//! JavaScript-friendly wrappers around [`RiskEngine`] for the web frontend.
//! Requests and reports cross the boundary as plain JS objects shaped like
//! [`AnalysisRequest`] and [`RiskReport`].

use wasm_bindgen::prelude::*;

use crate::engine::{AnalysisRequest, RiskEngine, RiskReport};
use crate::interpret::RiskLevel;

fn to_request(request: JsValue) -> Result<AnalysisRequest, JsValue> {
    serde_wasm_bindgen::from_value(request).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js(report: &RiskReport) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(report).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Solve a request in the sense it names (safest combination by default)
#[wasm_bindgen]
pub fn analyze(request: JsValue) -> Result<JsValue, JsValue> {
    let request = to_request(request)?;
    let report = RiskEngine::default()
        .run(&request)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&report)
}

/// Most dangerous combination of a request
#[wasm_bindgen]
pub fn worst_case(request: JsValue) -> Result<JsValue, JsValue> {
    let request = to_request(request)?;
    let report = RiskEngine::default()
        .worst_case(&request)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&report)
}

/// Validation problems of a request, empty when it is consistent
#[wasm_bindgen]
pub fn validate(request: JsValue) -> JsValue {
    let diagnostics = match to_request(request) {
        Err(e) => vec![Diagnostic {
            severity: "error".to_string(),
            message: e.as_string().unwrap_or_else(|| "Invalid request".to_string()),
        }],
        Ok(request) => get_diagnostics(&request),
    };
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Encoded `(dose_level, time_level)` for a single dose and time label
#[wasm_bindgen]
pub fn encode(dose: &str, time: &str) -> Vec<f64> {
    let (dose_level, time_level) = RiskEngine::default().encoder().encode(dose, time);
    vec![dose_level, time_level]
}

/// Band name for a raw objective value
#[wasm_bindgen]
pub fn risk_level(objective: f64) -> String {
    let (level, _) = crate::interpret::Interpreter::default().interpret_value(objective);
    level.as_str().to_string()
}

/// Inclusive safety score range of a band name
#[wasm_bindgen]
pub fn score_range(level: &str) -> Result<Vec<u8>, JsValue> {
    let level = match level {
        "low" => RiskLevel::Low,
        "medium" => RiskLevel::Medium,
        "high" => RiskLevel::High,
        other => return Err(JsValue::from_str(&format!("Unknown risk level: {}", other))),
    };
    let (lo, hi) = level.score_range();
    Ok(vec![lo, hi])
}

#[derive(serde::Serialize)]
struct Diagnostic {
    severity: String,
    message: String,
}

fn get_diagnostics(request: &AnalysisRequest) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let engine = RiskEngine::default();

    if let Err(e) = engine.instance(request) {
        diagnostics.push(Diagnostic {
            severity: "error".to_string(),
            message: e.to_string(),
        });
        return diagnostics;
    }

    let encoder = engine.encoder();
    for drug in &request.drugs {
        if crate::encoder::parse_dose_mg(&drug.dose).is_none() {
            diagnostics.push(Diagnostic {
                severity: "warning".to_string(),
                message: format!("No numeric dose for '{}', assuming a low dose", drug.name),
            });
        }
        if encoder.time_table().get(&drug.time).is_none() {
            diagnostics.push(Diagnostic {
                severity: "warning".to_string(),
                message: format!("Unrecognized time '{}' for '{}', using the neutral level", drug.time, drug.name),
            });
        }
    }

    if request.params.target_count > request.drugs.len() {
        diagnostics.push(Diagnostic {
            severity: "warning".to_string(),
            message: format!(
                "Target of {} active drugs exceeds the {} listed",
                request.params.target_count,
                request.drugs.len()
            ),
        });
    }

    diagnostics
}
