use crate::core::encoding::{EncodingError, GenerationEncoding};
use crate::models::ModelInfo;
use crate::services::classifier::{Classifier, ClassifierModel};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading the classifier artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Artifact server returned {status} for {url}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("Invalid artifact format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    Shape(String),

    #[error("Invalid generation encoding: {0}")]
    Encoding(#[from] EncodingError),
}

/// On-disk artifact document
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub generation_encoding: HashMap<String, f64>,
    pub classifier: ClassifierModel,
}

/// Classifier ready to serve, plus the encoding it was trained with
#[derive(Clone)]
pub struct LoadedArtifact {
    pub info: ModelInfo,
    pub encoding: GenerationEncoding,
    pub classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for LoadedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifact")
            .field("info", &self.info)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl LoadedArtifact {
    /// Parse and shape-check an artifact document
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.classifier.check_shape().map_err(ArtifactError::Shape)?;
        let encoding = GenerationEncoding::from_map(&artifact.generation_encoding)?;

        Ok(Self {
            info: ModelInfo {
                name: artifact.name,
                version: artifact.version,
                kind: artifact.classifier.kind().to_string(),
            },
            encoding,
            classifier: Arc::new(artifact.classifier),
        })
    }

    /// Replace the artifact's generation encoding with a configured one
    pub fn with_encoding(mut self, map: &HashMap<String, f64>) -> Result<Self, ArtifactError> {
        self.encoding = GenerationEncoding::from_map(map)?;
        Ok(self)
    }
}

/// Where the artifact lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Local(PathBuf),
    Remote(String),
}

impl ArtifactLocation {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            ArtifactLocation::Remote(raw_github_url(location))
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            ArtifactLocation::Local(PathBuf::from(path))
        }
    }
}

/// GitHub `blob` links point at an HTML page; fetch the raw file instead
fn raw_github_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("https://github.com/") else {
        return url.to_string();
    };
    let parts: Vec<&str> = rest.splitn(4, '/').collect();
    match parts.as_slice() {
        [owner, repo, "blob", tail] => {
            format!("https://raw.githubusercontent.com/{}/{}/{}", owner, repo, tail)
        }
        _ => url.to_string(),
    }
}

/// Fetches the classifier artifact once at startup
pub struct ArtifactLoader {
    client: Client,
}

impl ArtifactLoader {
    pub fn new(fetch_timeout: Duration) -> Result<Self, ArtifactError> {
        let client = Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self { client })
    }

    /// Load and parse the artifact at `location`
    pub async fn load(&self, location: &str) -> Result<LoadedArtifact, ArtifactError> {
        let bytes = match ArtifactLocation::parse(location) {
            ArtifactLocation::Local(path) => {
                tracing::debug!("Reading model artifact from {}", path.display());
                tokio::fs::read(&path).await.map_err(|source| ArtifactError::Io {
                    path: path.display().to_string(),
                    source,
                })?
            }
            ArtifactLocation::Remote(url) => self.fetch(&url).await?,
        };

        let artifact = LoadedArtifact::from_slice(&bytes)?;
        tracing::info!(
            "Loaded {} model {} (version {:?}, {} bytes)",
            artifact.info.kind,
            artifact.info.name,
            artifact.info.version,
            bytes.len()
        );
        Ok(artifact)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
        tracing::debug!("Fetching model artifact from {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ArtifactError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
