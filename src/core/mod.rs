// Core pipeline exports
pub mod encoding;
pub mod pipeline;
pub mod schema;

pub use encoding::{EncodingError, GenerationEncoding};
pub use pipeline::{PredictionError, Predictor, DEFAULT_MAX_IN_FLIGHT, DEFAULT_PREDICTION_TIMEOUT};
pub use schema::{check_domains, field_schema, validate, Domain, FieldDescriptor, ValidationError};
