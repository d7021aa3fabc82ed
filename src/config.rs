//! Configuration Management
//!
//! Desired label definitions and run settings

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Value that enables a string-valued switch input
pub const ENABLED_INPUT: &str = "true";

/// Label Specification
///
/// The desired end state of one label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelSpec {
    /// Label name
    pub name: String,

    /// Label color (6-digit hex code, `#` prefix optional)
    pub color: String,

    /// Label description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current name of an existing label that should be renamed to `name`
    #[serde(
        rename = "previousName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_name: Option<String>,
}

impl LabelSpec {
    /// Create a new label specification
    ///
    /// # Arguments
    /// - `name`: Label name
    /// - `color`: Label color
    pub fn new<N: Into<String>, C: Into<String>>(name: N, color: C) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: None,
            previous_name: None,
        }
    }

    /// Set the description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark this label as the rename target of `previous_name`
    pub fn renamed_from<S: Into<String>>(mut self, previous_name: S) -> Self {
        self.previous_name = Some(previous_name.into());
        self
    }

    /// Validate label specification
    ///
    /// Colors are checked separately by [`LabelSpec::validate_color`], only
    /// for labels that are about to be sent to the repository.
    ///
    /// # Errors
    /// - If the name is empty
    /// - If `previousName` is present but empty
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::label_validation("Label name cannot be empty"));
        }

        if let Some(previous) = &self.previous_name {
            if previous.trim().is_empty() {
                return Err(Error::label_validation(format!(
                    "previousName of label '{}' cannot be empty",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Validate label color
    ///
    /// # Errors
    /// If the color is not a 6-digit hex code
    pub fn validate_color(&self) -> Result<()> {
        validate_color(&self.color)
    }

    /// Normalize color (remove # and convert to lowercase)
    pub fn normalize_color(color: &str) -> String {
        color.trim_start_matches('#').to_lowercase()
    }
}

/// Run Configuration
///
/// Everything one reconciliation run needs besides the label source content
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// GitHub access token
    pub access_token: String,

    /// Repository owner; derived from `repository` when absent
    pub owner: Option<String>,

    /// Repository full name (owner/repo format)
    pub repository: String,

    /// Label source (file path or HTTP(S) URL)
    pub source: String,

    /// Dry-run mode (don't make actual changes)
    pub dry_run: bool,

    /// Delete repository labels missing from the source
    pub remove_missing: bool,

    /// GitHub API base URL (GitHub Enterprise)
    pub api_url: Option<String>,
}

impl RunConfig {
    /// Validate configuration
    ///
    /// # Errors
    /// - If access token is empty
    /// - If source is empty
    /// - If repository format is invalid
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::config_validation("Access token is required"));
        }

        if self.source.trim().is_empty() {
            return Err(Error::config_validation("A label source is required"));
        }

        self.repository_target()?;
        Ok(())
    }

    /// Get repository owner and name
    ///
    /// The owner comes from the explicit setting when present, otherwise from
    /// the repository full name.
    pub fn repository_target(&self) -> Result<(String, String)> {
        repository_target(self.owner.as_deref(), &self.repository)
    }
}

/// Resolve the repository owner and name
///
/// # Arguments
/// - `owner`: Explicit owner; blank values are ignored
/// - `repository`: Repository full name in "owner/repo" format
///
/// # Errors
/// Returns an error if the repository format is invalid
pub fn repository_target(owner: Option<&str>, repository: &str) -> Result<(String, String)> {
    let (full_owner, repo) = parse_repository(repository)?;
    let owner = match owner.map(str::trim) {
        Some(owner) if !owner.is_empty() => owner.to_string(),
        _ => full_owner,
    };
    Ok((owner, repo))
}

/// Interpret a string-valued switch input
///
/// Only the exact value `"true"` enables the switch; anything else, including
/// absence, leaves it off.
pub fn flag_enabled(input: Option<&str>) -> bool {
    input == Some(ENABLED_INPUT)
}

/// Parse repository string into owner and name
///
/// # Arguments
/// - `repo`: Repository string in "owner/repo" format
///
/// # Errors
/// Returns an error if the format is invalid
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::InvalidRepositoryFormat(repo.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Validate a label color (6-digit hex, `#` prefix optional)
///
/// # Errors
/// Returns [`Error::InvalidLabelColor`] if the color is malformed
pub fn validate_color(color: &str) -> Result<()> {
    if is_valid_hex_color(&LabelSpec::normalize_color(color)) {
        Ok(())
    } else {
        Err(Error::InvalidLabelColor(color.to_string()))
    }
}

/// Validate hex color code
///
/// # Arguments
/// - `color`: Color code (6-digit hex without #)
///
/// # Returns
/// True if valid
fn is_valid_hex_color(color: &str) -> bool {
    if color.len() != 6 {
        return false;
    }

    color.chars().all(|c| c.is_ascii_hexdigit())
}
