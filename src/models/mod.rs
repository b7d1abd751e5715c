// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    FeatureVector, Generation, ModelInfo, PatientFeatures, PredictionResult, Verdict,
    FEATURE_COUNT,
};
pub use requests::{RawFields, RawValue};
pub use responses::{ErrorResponse, FieldInfo, HealthResponse, PredictResponse, SchemaResponse};
