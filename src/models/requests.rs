use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single unvalidated field value
///
/// JSON bodies carry numbers and strings; form fields and query strings
/// always arrive as `Text`. Arrays and objects land in `Other` so the
/// offending field is reported by the schema instead of failing the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    /// `Null` and blank text count as absent
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

/// Prediction request as received from a form, query string or JSON body
///
/// POST /api/v1/predict
///
/// ```json
/// {
///   "generation": "gen X",
///   "gender": 1,
///   "chest_pain_type": 2,
///   "resting_bp_category": 1,
///   "cholesterol_category": 2,
///   "fasting_blood_sugar": 0,
///   "resting_ecg": 1,
///   "max_heart_rate": 150.0,
///   "exercise_angina": 0,
///   "st_depression": 1.2,
///   "st_slope": 1,
///   "vessels_count": 0,
///   "thalassemia_type": 2
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFields {
    fields: HashMap<String, RawValue>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawFields
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
