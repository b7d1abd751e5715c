use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Number of features the classifier consumes
pub const FEATURE_COUNT: usize = 13;

/// Fixed-order numeric encoding of a `PatientFeatures` instance
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Generational cohort of the patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Generation {
    /// Age 12-27
    GenZ,
    /// Age 28-43
    Millennials,
    /// Age 44-59
    GenX,
    /// Age 60-78
    BabyBoomer,
}

impl Generation {
    pub const ALL: [Generation; 4] = [
        Generation::GenZ,
        Generation::Millennials,
        Generation::GenX,
        Generation::BabyBoomer,
    ];

    /// Canonical label as shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Generation::GenZ => "gen Z",
            Generation::Millennials => "millennials",
            Generation::GenX => "gen X",
            Generation::BabyBoomer => "baby boomer",
        }
    }

    /// Parse a label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "gen z" => Some(Generation::GenZ),
            // "millenials" is the spelling used by the original form
            "millennials" | "millenials" | "gen y" => Some(Generation::Millennials),
            "gen x" => Some(Generation::GenX),
            "baby boomer" => Some(Generation::BabyBoomer),
            _ => None,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Generation> for String {
    fn from(value: Generation) -> Self {
        value.label().to_string()
    }
}

impl TryFrom<String> for Generation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Generation::from_label(&value).ok_or_else(|| format!("unknown generation: {}", value))
    }
}

/// Clinical measurements for a single prediction request
///
/// Integer codes are kept as `i64` so out-of-range values survive parsing
/// and are reported as domain errors rather than type errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PatientFeatures {
    pub generation: Generation,
    #[validate(range(min = 0, max = 1))]
    pub gender: i64,
    #[validate(range(min = 0, max = 3))]
    pub chest_pain_type: i64,
    #[validate(range(min = 0, max = 3))]
    pub resting_bp_category: i64,
    #[validate(range(min = 0, max = 2))]
    pub cholesterol_category: i64,
    #[validate(range(min = 0, max = 1))]
    pub fasting_blood_sugar: i64,
    #[validate(range(min = 0, max = 2))]
    pub resting_ecg: i64,
    #[validate(range(min = 0.0, max = 500.0))]
    pub max_heart_rate: f64,
    #[validate(range(min = 0, max = 1))]
    pub exercise_angina: i64,
    pub st_depression: f64,
    #[validate(range(min = 0, max = 2))]
    pub st_slope: i64,
    #[validate(range(min = 0, max = 4))]
    pub vessels_count: i64,
    #[validate(range(min = 0, max = 3))]
    pub thalassemia_type: i64,
}

/// Human-readable prediction outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "risk present")]
    RiskPresent,
    #[serde(rename = "risk absent")]
    RiskAbsent,
}

impl Verdict {
    /// Interpret a raw classifier output; `None` for anything outside {0, 1}
    pub fn from_output(output: i64) -> Option<Self> {
        match output {
            1 => Some(Verdict::RiskPresent),
            0 => Some(Verdict::RiskAbsent),
            _ => None,
        }
    }

    pub fn output(&self) -> u8 {
        match self {
            Verdict::RiskPresent => 1,
            Verdict::RiskAbsent => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::RiskPresent => "risk present",
            Verdict::RiskAbsent => "risk absent",
        }
    }

    /// Patient-facing sentence for the verdict
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::RiskPresent => "The patient is at risk of heart disease",
            Verdict::RiskAbsent => "The patient is not at risk of heart disease",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single classifier invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub output: u8,
    pub verdict: Verdict,
}

impl From<Verdict> for PredictionResult {
    fn from(verdict: Verdict) -> Self {
        Self {
            output: verdict.output(),
            verdict,
        }
    }
}

/// Identity of the loaded classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_labels_round_trip() {
        for generation in Generation::ALL {
            assert_eq!(Generation::from_label(generation.label()), Some(generation));
        }
    }

    #[test]
    fn test_generation_accepts_original_spelling() {
        assert_eq!(Generation::from_label("millenials"), Some(Generation::Millennials));
        assert_eq!(Generation::from_label("  Gen X "), Some(Generation::GenX));
        assert_eq!(Generation::from_label("gen alpha"), None);
    }

    #[test]
    fn test_verdict_from_output() {
        assert_eq!(Verdict::from_output(1), Some(Verdict::RiskPresent));
        assert_eq!(Verdict::from_output(0), Some(Verdict::RiskAbsent));
        assert_eq!(Verdict::from_output(2), None);
        assert_eq!(Verdict::from_output(-1), None);
    }

    #[test]
    fn test_verdict_serializes_as_label() {
        let json = serde_json::to_string(&Verdict::RiskPresent).unwrap();
        assert_eq!(json, "\"risk present\"");
    }
}
