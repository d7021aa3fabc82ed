//! Label Source Loading
//!
//! Reads the desired label document from a local file or an HTTP(S) URL and
//! parses it as JSON or YAML

use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::LabelSpec;
use crate::error::{Error, Result};

/// Label Document
///
/// Top-level shape of a label source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelDocument {
    /// Desired labels, in order
    pub labels: Vec<LabelSpec>,
}

/// Structured-text format of a label source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Select the format from a file extension
    ///
    /// `yml` and `yaml` select YAML; any other extension, or none, is JSON.
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension {
            Some("yml") | Some("yaml") => SourceFormat::Yaml,
            _ => SourceFormat::Json,
        }
    }
}

/// Where the label document lives
#[derive(Debug, Clone, PartialEq)]
pub enum LabelSource {
    /// Fetched over HTTP(S)
    Url(Url),

    /// Read from local storage
    Path(PathBuf),
}

impl LabelSource {
    /// Classify a source string
    ///
    /// Only `http` and `https` URLs are fetched; anything else, including
    /// strings that parse as other URL schemes, is treated as a path.
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => LabelSource::Url(url),
            _ => LabelSource::Path(PathBuf::from(source)),
        }
    }

    /// Format implied by the source's extension
    ///
    /// For URLs the extension comes from the path, ignoring query and fragment.
    pub fn format(&self) -> SourceFormat {
        match self {
            LabelSource::Url(url) => {
                let path = Path::new(url.path());
                SourceFormat::from_extension(path.extension().and_then(|e| e.to_str()))
            }
            LabelSource::Path(path) => {
                SourceFormat::from_extension(path.extension().and_then(|e| e.to_str()))
            }
        }
    }

    /// Read the raw source text
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the URL cannot be reached,
    /// or the server answers with a non-success status
    pub async fn read(&self) -> Result<String> {
        match self {
            LabelSource::Url(url) => {
                debug!("Fetching label source from {}", url);
                let response = reqwest::get(url.clone()).await?.error_for_status()?;
                Ok(response.text().await?)
            }
            LabelSource::Path(path) => {
                debug!("Reading label source from {}", path.display());
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    std::io::Error::new(
                        e.kind(),
                        format!("Failed to read label source {}: {}", path.display(), e),
                    )
                    .into()
                })
            }
        }
    }
}

/// JSON Schema every label document must satisfy
fn label_document_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["labels"],
        "properties": {
            "labels": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "color"],
                    "properties": {
                        "name": { "type": "string" },
                        "color": { "type": "string" },
                        "description": { "type": ["string", "null"] },
                        "previousName": { "type": ["string", "null"] }
                    }
                }
            }
        }
    })
}

/// Check a parsed document against [`label_document_schema`]
fn validate_document_shape(document: &serde_json::Value) -> Result<()> {
    let schema = label_document_schema();
    let compiled = JSONSchema::compile(&schema).map_err(|e| {
        Error::invalid_source(format!("Invalid label document schema: {}", e))
    })?;

    if let Err(errors) = compiled.validate(document) {
        let messages: Vec<String> = errors
            .map(|e| format!("{} (at '{}')", e, e.instance_path))
            .collect();
        return Err(Error::invalid_source(format!(
            "Label document does not match the expected shape: {}",
            messages.join("; ")
        )));
    }

    Ok(())
}

/// Parse a label document
///
/// # Arguments
/// - `content`: Raw document text
/// - `format`: Structured-text format of `content`
///
/// # Returns
/// Desired labels in document order
///
/// # Errors
/// If the text is empty or malformed, the document lacks a `labels` list,
/// or a label fails validation
pub fn parse_labels(content: &str, format: SourceFormat) -> Result<Vec<LabelSpec>> {
    if content.trim().is_empty() {
        return Err(Error::invalid_source("Label source is empty"));
    }

    let document: serde_json::Value = match format {
        SourceFormat::Json => serde_json::from_str(content)?,
        SourceFormat::Yaml => serde_yaml::from_str(content)?,
    };
    validate_document_shape(&document)?;

    let document: LabelDocument = serde_json::from_value(document)?;
    for label in &document.labels {
        label.validate()?;
    }

    Ok(document.labels)
}

/// Load the desired labels from a path or URL
///
/// # Errors
/// If the source cannot be read or parsed
pub async fn load_desired_labels(source: &str) -> Result<Vec<LabelSpec>> {
    let source = LabelSource::parse(source);
    let content = source.read().await?;
    let labels = parse_labels(&content, source.format())?;
    debug!("Loaded {} desired labels", labels.len());
    Ok(labels)
}
