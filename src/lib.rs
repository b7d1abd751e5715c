//! Heart Risk - heart disease risk classification service
//!
//! This library validates clinical measurements against a strict schema,
//! encodes them into the feature vector the trained classifier expects and
//! renders its binary output as a verdict.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{validate, PredictionError, Predictor, ValidationError};
pub use models::{PatientFeatures, PredictionResult, RawFields, Verdict};
pub use services::{ArtifactError, ArtifactLoader, Classifier, LoadedArtifact};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // An empty request is rejected on the first field
        let err = validate(&RawFields::new()).unwrap_err();
        assert_eq!(err.field(), "generation");
    }
}
