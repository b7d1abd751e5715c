use crate::models::{FeatureVector, Generation, PatientFeatures};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("unknown generation label in encoding: {0}")]
    UnknownLabel(String),

    #[error("generation encoding has no value for {0}")]
    MissingLabel(&'static str),

    #[error("generation encoding for {0} is not a finite number")]
    NonFinite(&'static str),

    #[error("generation encoding has more than one value for {0}")]
    DuplicateLabel(&'static str),
}

/// Numeric codes for each generation, as seen by the trained classifier
///
/// Shipped alongside the artifact; there is no built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationEncoding {
    gen_z: f64,
    millennials: f64,
    gen_x: f64,
    baby_boomer: f64,
}

impl GenerationEncoding {
    /// Build from a label -> code map; every generation must be covered
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, EncodingError> {
        let mut codes: [Option<f64>; 4] = [None; 4];

        for (label, code) in map {
            let generation = Generation::from_label(label)
                .ok_or_else(|| EncodingError::UnknownLabel(label.clone()))?;
            if !code.is_finite() {
                return Err(EncodingError::NonFinite(generation.label()));
            }
            // "millennials" and "millenials" share a slot
            if codes[slot(generation)].replace(*code).is_some() {
                return Err(EncodingError::DuplicateLabel(generation.label()));
            }
        }

        let code = |generation: Generation| {
            codes[slot(generation)].ok_or(EncodingError::MissingLabel(generation.label()))
        };

        Ok(Self {
            gen_z: code(Generation::GenZ)?,
            millennials: code(Generation::Millennials)?,
            gen_x: code(Generation::GenX)?,
            baby_boomer: code(Generation::BabyBoomer)?,
        })
    }

    pub fn code(&self, generation: Generation) -> f64 {
        match generation {
            Generation::GenZ => self.gen_z,
            Generation::Millennials => self.millennials,
            Generation::GenX => self.gen_x,
            Generation::BabyBoomer => self.baby_boomer,
        }
    }

    /// Assemble the feature vector in schema order
    pub fn encode(&self, features: &PatientFeatures) -> FeatureVector {
        [
            self.code(features.generation),
            features.gender as f64,
            features.chest_pain_type as f64,
            features.resting_bp_category as f64,
            features.cholesterol_category as f64,
            features.fasting_blood_sugar as f64,
            features.resting_ecg as f64,
            features.max_heart_rate,
            features.exercise_angina as f64,
            features.st_depression,
            features.st_slope as f64,
            features.vessels_count as f64,
            features.thalassemia_type as f64,
        ]
    }
}

fn slot(generation: Generation) -> usize {
    match generation {
        Generation::GenZ => 0,
        Generation::Millennials => 1,
        Generation::GenX => 2,
        Generation::BabyBoomer => 3,
    }
}
