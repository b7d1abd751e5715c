use crate::models::{FieldInfo, Generation, PatientFeatures, RawFields, RawValue};
use thiserror::Error;
use validator::Validate;

/// Errors raised while turning raw input into `PatientFeatures`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: must be in {allowed}")]
    InvalidDomain { field: &'static str, allowed: String },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field } => field,
            ValidationError::InvalidDomain { field, .. } => field,
        }
    }
}

/// Legal values of an input field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// One of a fixed set of labels
    Labels(&'static [&'static str]),
    /// Integer code in `0..=max`
    Codes { max: i64 },
    /// Closed real interval
    Range { min: f64, max: f64 },
    /// Any finite real
    AnyReal,
}

impl Domain {
    /// Human-readable rendering used in error messages
    pub fn describe(&self) -> String {
        match self {
            Domain::Labels(labels) => format!("{{{}}}", labels.join(", ")),
            Domain::Codes { max } => {
                let codes: Vec<String> = (0..=*max).map(|c| c.to_string()).collect();
                format!("{{{}}}", codes.join(", "))
            }
            Domain::Range { min, max } => format!("[{}, {}]", min, max),
            Domain::AnyReal => "any finite number".to_string(),
        }
    }
}

/// Declaration of a single input field
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Field name used by the original form
    pub alias: Option<&'static str>,
    pub domain: Domain,
    pub description: &'static str,
}

impl FieldDescriptor {
    fn missing(&self) -> ValidationError {
        ValidationError::MissingField { field: self.name }
    }

    fn invalid(&self) -> ValidationError {
        ValidationError::InvalidDomain {
            field: self.name,
            allowed: self.domain.describe(),
        }
    }

    /// Look up the field, preferring the canonical name over the alias
    fn lookup<'a>(&self, raw: &'a RawFields) -> Option<&'a RawValue> {
        let present = |name: &str| raw.get(name).filter(|v| !v.is_blank());
        present(self.name).or_else(|| self.alias.and_then(present))
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name.to_string(),
            alias: self.alias.map(str::to_string),
            allowed: self.domain.describe(),
            description: self.description.to_string(),
        }
    }
}

const GENERATION_LABELS: [&str; 4] = ["gen Z", "millennials", "gen X", "baby boomer"];

pub const GENERATION: FieldDescriptor = FieldDescriptor {
    name: "generation",
    alias: Some("generasi"),
    domain: Domain::Labels(&GENERATION_LABELS),
    description: "Generational cohort: gen Z (age 12-27), millennials (28-43), gen X (44-59), baby boomer (60-78)",
};

pub const GENDER: FieldDescriptor = FieldDescriptor {
    name: "gender",
    alias: None,
    domain: Domain::Codes { max: 1 },
    description: "Sex (0 = female, 1 = male)",
};

pub const CHEST_PAIN_TYPE: FieldDescriptor = FieldDescriptor {
    name: "chest_pain_type",
    alias: Some("cp"),
    domain: Domain::Codes { max: 3 },
    description: "Chest pain type (0 = typical angina, 1 = atypical angina, 2 = non-anginal pain, 3 = asymptomatic)",
};

pub const RESTING_BP_CATEGORY: FieldDescriptor = FieldDescriptor {
    name: "resting_bp_category",
    alias: Some("trestbps"),
    domain: Domain::Codes { max: 3 },
    description: "Resting blood pressure (0 = normal, 1 = hypertension stage 1, 2 = stage 2, 3 = stage 3)",
};

pub const CHOLESTEROL_CATEGORY: FieldDescriptor = FieldDescriptor {
    name: "cholesterol_category",
    alias: Some("chol"),
    domain: Domain::Codes { max: 2 },
    description: "Cholesterol level (0 = normal, 1 = at risk, 2 = high)",
};

pub const FASTING_BLOOD_SUGAR: FieldDescriptor = FieldDescriptor {
    name: "fasting_blood_sugar",
    alias: Some("fbs"),
    domain: Domain::Codes { max: 1 },
    description: "Fasting blood sugar (0 = at most 120 mg/dl, 1 = above 120 mg/dl)",
};

pub const RESTING_ECG: FieldDescriptor = FieldDescriptor {
    name: "resting_ecg",
    alias: Some("restecg"),
    domain: Domain::Codes { max: 2 },
    description: "Resting ECG (0 = normal, 1 = left ventricular hypertrophy, 2 = ST-T wave abnormality)",
};

pub const MAX_HEART_RATE: FieldDescriptor = FieldDescriptor {
    name: "max_heart_rate",
    alias: Some("thalach"),
    domain: Domain::Range { min: 0.0, max: 500.0 },
    description: "Maximum heart rate achieved",
};

pub const EXERCISE_ANGINA: FieldDescriptor = FieldDescriptor {
    name: "exercise_angina",
    alias: Some("exang"),
    domain: Domain::Codes { max: 1 },
    description: "Chest pain during exercise (0 = no, 1 = yes)",
};

pub const ST_DEPRESSION: FieldDescriptor = FieldDescriptor {
    name: "st_depression",
    alias: Some("oldpeak"),
    domain: Domain::AnyReal,
    description: "ST depression induced by exercise relative to rest",
};

pub const ST_SLOPE: FieldDescriptor = FieldDescriptor {
    name: "st_slope",
    alias: Some("slope"),
    domain: Domain::Codes { max: 2 },
    description: "Slope of the peak exercise ST segment (0 = upsloping, 1 = flat, 2 = downsloping)",
};

pub const VESSELS_COUNT: FieldDescriptor = FieldDescriptor {
    name: "vessels_count",
    alias: Some("ca"),
    domain: Domain::Codes { max: 4 },
    description: "Number of major vessels detected by fluoroscopy",
};

pub const THALASSEMIA_TYPE: FieldDescriptor = FieldDescriptor {
    name: "thalassemia_type",
    alias: Some("thal"),
    domain: Domain::Codes { max: 3 },
    description: "Thalassemia (0 = normal, 1 = fixed defect, 2 and 3 = reversible defect)",
};

/// All input fields, in feature-vector order
pub const FIELD_SCHEMA: [FieldDescriptor; 13] = [
    GENERATION,
    GENDER,
    CHEST_PAIN_TYPE,
    RESTING_BP_CATEGORY,
    CHOLESTEROL_CATEGORY,
    FASTING_BLOOD_SUGAR,
    RESTING_ECG,
    MAX_HEART_RATE,
    EXERCISE_ANGINA,
    ST_DEPRESSION,
    ST_SLOPE,
    VESSELS_COUNT,
    THALASSEMIA_TYPE,
];

pub fn field_schema() -> &'static [FieldDescriptor] {
    &FIELD_SCHEMA
}

/// Validate raw input into `PatientFeatures`
///
/// Presence of every field is checked before any domain check, so a request
/// missing a field always reports `MissingField` for the first absent one.
pub fn validate(raw: &RawFields) -> Result<PatientFeatures, ValidationError> {
    for descriptor in FIELD_SCHEMA.iter() {
        descriptor.lookup(raw).ok_or_else(|| descriptor.missing())?;
    }

    let features = PatientFeatures {
        generation: read_generation(raw, &GENERATION)?,
        gender: read_code(raw, &GENDER)?,
        chest_pain_type: read_code(raw, &CHEST_PAIN_TYPE)?,
        resting_bp_category: read_code(raw, &RESTING_BP_CATEGORY)?,
        cholesterol_category: read_code(raw, &CHOLESTEROL_CATEGORY)?,
        fasting_blood_sugar: read_code(raw, &FASTING_BLOOD_SUGAR)?,
        resting_ecg: read_code(raw, &RESTING_ECG)?,
        max_heart_rate: read_real(raw, &MAX_HEART_RATE)?,
        exercise_angina: read_code(raw, &EXERCISE_ANGINA)?,
        st_depression: read_real(raw, &ST_DEPRESSION)?,
        st_slope: read_code(raw, &ST_SLOPE)?,
        vessels_count: read_code(raw, &VESSELS_COUNT)?,
        thalassemia_type: read_code(raw, &THALASSEMIA_TYPE)?,
    };

    check_domains(&features)?;
    Ok(features)
}

/// Check every field of an already-typed `PatientFeatures` against its domain
pub fn check_domains(features: &PatientFeatures) -> Result<(), ValidationError> {
    // NaN slips through range checks
    if !features.max_heart_rate.is_finite() {
        return Err(MAX_HEART_RATE.invalid());
    }
    if !features.st_depression.is_finite() {
        return Err(ST_DEPRESSION.invalid());
    }

    if let Err(errors) = features.validate() {
        let field_errors = errors.field_errors();
        let error = FIELD_SCHEMA
            .iter()
            .find(|d| field_errors.contains_key(d.name))
            .map(|d| d.invalid())
            .unwrap_or_else(|| ValidationError::InvalidDomain {
                field: "features",
                allowed: errors.to_string(),
            });
        return Err(error);
    }

    Ok(())
}

fn read<'a>(raw: &'a RawFields, descriptor: &FieldDescriptor) -> Result<&'a RawValue, ValidationError> {
    descriptor.lookup(raw).ok_or_else(|| descriptor.missing())
}

fn read_generation(raw: &RawFields, descriptor: &FieldDescriptor) -> Result<Generation, ValidationError> {
    read(raw, descriptor)?
        .as_text()
        .and_then(Generation::from_label)
        .ok_or_else(|| descriptor.invalid())
}

fn read_code(raw: &RawFields, descriptor: &FieldDescriptor) -> Result<i64, ValidationError> {
    match read(raw, descriptor)?.as_number() {
        Some(n) if n.is_finite() && n.fract() == 0.0 => Ok(n as i64),
        _ => Err(descriptor.invalid()),
    }
}

fn read_real(raw: &RawFields, descriptor: &FieldDescriptor) -> Result<f64, ValidationError> {
    match read(raw, descriptor)?.as_number() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(descriptor.invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> RawFields {
        let mut raw = RawFields::new();
        raw.insert("generation", "gen X");
        raw.insert("gender", 1i64);
        raw.insert("chest_pain_type", 2i64);
        raw.insert("resting_bp_category", 1i64);
        raw.insert("cholesterol_category", 2i64);
        raw.insert("fasting_blood_sugar", 0i64);
        raw.insert("resting_ecg", 1i64);
        raw.insert("max_heart_rate", 150.0);
        raw.insert("exercise_angina", 0i64);
        raw.insert("st_depression", 1.2);
        raw.insert("st_slope", 1i64);
        raw.insert("vessels_count", 0i64);
        raw.insert("thalassemia_type", 2i64);
        raw
    }

    #[test]
    fn test_validate_sample() {
        let features = validate(&sample_fields()).unwrap();

        assert_eq!(features.generation, Generation::GenX);
        assert_eq!(features.gender, 1);
        assert_eq!(features.max_heart_rate, 150.0);
        assert_eq!(features.st_depression, 1.2);
        assert_eq!(features.thalassemia_type, 2);
    }

    #[test]
    fn test_missing_field_named() {
        let mut raw = sample_fields();
        raw.remove("st_slope");

        assert_eq!(
            validate(&raw),
            Err(ValidationError::MissingField { field: "st_slope" })
        );
    }

    #[test]
    fn test_missing_reported_before_invalid() {
        let mut raw = sample_fields();
        raw.insert("gender", 7i64);
        raw.remove("thalassemia_type");

        let err = validate(&raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "thalassemia_type" });
    }

    #[test]
    fn test_blank_text_is_missing() {
        let mut raw = sample_fields();
        raw.insert("generation", "  ");

        assert_eq!(validate(&raw).unwrap_err().field(), "generation");
        assert!(matches!(validate(&raw), Err(ValidationError::MissingField { .. })));
    }

    #[test]
    fn test_out_of_domain_code() {
        let mut raw = sample_fields();
        raw.insert("gender", 2i64);

        assert_eq!(
            validate(&raw),
            Err(ValidationError::InvalidDomain {
                field: "gender",
                allowed: "{0, 1}".to_string(),
            })
        );
    }

    #[test]
    fn test_fractional_code_rejected() {
        let mut raw = sample_fields();
        raw.insert("chest_pain_type", 1.5);

        assert_eq!(validate(&raw).unwrap_err().field(), "chest_pain_type");
    }

    #[test]
    fn test_heart_rate_bounds() {
        let mut raw = sample_fields();
        raw.insert("max_heart_rate", 500.0);
        assert!(validate(&raw).is_ok());

        raw.insert("max_heart_rate", 500.1);
        assert_eq!(
            validate(&raw),
            Err(ValidationError::InvalidDomain {
                field: "max_heart_rate",
                allowed: "[0, 500]".to_string(),
            })
        );
    }

    #[test]
    fn test_st_depression_unrestricted() {
        let mut raw = sample_fields();
        raw.insert("st_depression", -3.5);
        assert!(validate(&raw).is_ok());

        raw.insert("st_depression", "NaN");
        assert_eq!(validate(&raw).unwrap_err().field(), "st_depression");
    }

    #[test]
    fn test_unknown_generation() {
        let mut raw = sample_fields();
        raw.insert("generation", "gen alpha");

        let err = validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDomain {
                field: "generation",
                allowed: "{gen Z, millennials, gen X, baby boomer}".to_string(),
            }
        );
    }

    #[test]
    fn test_generation_must_be_text() {
        let mut raw = sample_fields();
        raw.insert("generation", 2i64);

        assert_eq!(validate(&raw).unwrap_err().field(), "generation");
    }

    #[test]
    fn test_aliases_accepted() {
        let mut raw = sample_fields();
        let cp = raw.remove("chest_pain_type").unwrap();
        raw.insert("cp", cp);
        let generation = raw.remove("generation").unwrap();
        raw.insert("generasi", generation);

        assert_eq!(validate(&raw), validate(&sample_fields()));
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let mut raw = sample_fields();
        raw.insert("cp", 9i64);

        assert_eq!(validate(&raw).unwrap().chest_pain_type, 2);
    }

    #[test]
    fn test_form_strings_coerce() {
        let raw: RawFields = FIELD_SCHEMA
            .iter()
            .zip([
                "baby boomer", "0", "3", "0", "1", "1", "2", "98.5", "1", "0", "2", "4", "3",
            ])
            .map(|(d, v)| (d.name, v))
            .collect();

        let features = validate(&raw).unwrap();
        assert_eq!(features.generation, Generation::BabyBoomer);
        assert_eq!(features.vessels_count, 4);
        assert_eq!(features.max_heart_rate, 98.5);
    }

    #[test]
    fn test_check_domains_on_built_features() {
        let mut features = validate(&sample_fields()).unwrap();
        assert!(check_domains(&features).is_ok());

        features.vessels_count = 5;
        assert_eq!(check_domains(&features).unwrap_err().field(), "vessels_count");

        features.vessels_count = 0;
        features.max_heart_rate = f64::NAN;
        assert_eq!(check_domains(&features).unwrap_err().field(), "max_heart_rate");
    }

    #[test]
    fn test_domain_descriptions() {
        assert_eq!(Domain::Codes { max: 4 }.describe(), "{0, 1, 2, 3, 4}");
        assert_eq!(Domain::AnyReal.describe(), "any finite number");
    }
}
