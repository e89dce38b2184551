use log::warn;

use crate::instance::{DrugEntry, EncodedDrug};

/// Time-of-day label to risk level lookup.
///
/// The canonical table is the four-bucket [`TimeTable::default`]; the
/// three-bucket variant without "evening" is [`TimeTable::three_bucket`].
/// Labels are matched case-insensitively after trimming whitespace.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable {
    entries: Vec<(String, f64)>,
    /// Level for labels not in the table
    default_level: f64,
}

impl Default for TimeTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("morning".to_string(), 0.2),
                ("afternoon".to_string(), 0.5),
                ("evening".to_string(), 0.7),
                ("night".to_string(), 0.8),
            ],
            default_level: 0.5,
        }
    }
}

impl TimeTable {
    pub fn three_bucket() -> Self {
        Self {
            entries: vec![
                ("morning".to_string(), 0.2),
                ("afternoon".to_string(), 0.5),
                ("night".to_string(), 0.8),
            ],
            default_level: 0.5,
        }
    }

    /// Add or replace a label. Levels are clamped to `[0, 1]`.
    pub fn with_entry(mut self, label: &str, level: f64) -> Self {
        let label = label.trim().to_lowercase();
        let level = level.clamp(0.0, 1.0);
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = level,
            None => self.entries.push((label, level)),
        }
        self
    }

    pub fn with_default_level(mut self, level: f64) -> Self {
        self.default_level = level.clamp(0.0, 1.0);
        self
    }

    /// Level for a known label, `None` if unrecognized
    pub fn get(&self, label: &str) -> Option<f64> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|(_, level)| *level)
    }

    pub fn level(&self, label: &str) -> f64 {
        self.get(label).unwrap_or(self.default_level)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }
}

/// Turns raw dose strings and time labels into `[0, 1]` features
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    time_table: TimeTable,
    /// Dose in mg that maps to level 1.0
    full_scale_mg: f64,
    /// Level used when a dose string has no numeral
    missing_dose_level: f64,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            time_table: TimeTable::default(),
            full_scale_mg: 1000.0,
            missing_dose_level: 0.1,
        }
    }
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_table(mut self, table: TimeTable) -> Self {
        self.time_table = table;
        self
    }

    pub fn with_full_scale_mg(mut self, mg: f64) -> Self {
        if mg.is_finite() && mg > 0.0 {
            self.full_scale_mg = mg;
        }
        self
    }

    pub fn with_missing_dose_level(mut self, level: f64) -> Self {
        self.missing_dose_level = level.clamp(0.0, 1.0);
        self
    }

    pub fn time_table(&self) -> &TimeTable {
        &self.time_table
    }

    /// Encode a dose string and a time label as `(dose_level, time_level)`
    pub fn encode(&self, dose: &str, time: &str) -> (f64, f64) {
        (self.dose_level(dose), self.time_level(time))
    }

    pub fn dose_level(&self, dose: &str) -> f64 {
        match parse_dose_mg(dose) {
            Some(mg) => (mg / self.full_scale_mg).min(1.0),
            None => {
                warn!("no numeric dose in {:?}, using level {}", dose, self.missing_dose_level);
                self.missing_dose_level
            }
        }
    }

    pub fn time_level(&self, time: &str) -> f64 {
        match self.time_table.get(time) {
            Some(level) => level,
            None => {
                let level = self.time_table.level(time);
                warn!("unrecognized time of day {:?}, using level {}", time, level);
                level
            }
        }
    }

    pub fn encode_drug(&self, drug: &DrugEntry) -> EncodedDrug {
        let (dose_level, time_level) = self.encode(&drug.dose, &drug.time);
        EncodedDrug {
            name: drug.name.clone(),
            dose_level,
            time_level,
        }
    }

    pub fn encode_all(&self, drugs: &[DrugEntry]) -> Vec<EncodedDrug> {
        drugs.iter().map(|d| self.encode_drug(d)).collect()
    }
}

/// First contiguous decimal numeral in `text`, e.g. `"Take 12.5 mg"` -> `12.5`
pub fn parse_dose_mg(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    // Fractional part only counts when a digit follows the dot
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    text[start..end].parse().ok()
}
