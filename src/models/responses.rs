use serde::{Deserialize, Serialize};
use crate::models::domain::{ModelInfo, Verdict};

/// Response for the predict endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub verdict: Verdict,
    pub message: String,
    pub request_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub model: ModelInfo,
}

/// One input field as published by the schema endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub alias: Option<String>,
    pub allowed: String,
    pub description: String,
}

/// Schema endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub fields: Vec<FieldInfo>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
            field: None,
            allowed: None,
        }
    }
}
