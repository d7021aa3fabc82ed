//! GitHub API Client
//!
//! Module for managing interactions with the GitHub API

use async_trait::async_trait;
use octocrab::{models, Octocrab};
use serde::{Deserialize, Serialize};

use crate::config::LabelSpec;
use crate::error::{Error, Result};
use crate::plan::RenameOp;

/// Labels requested per listing page
const LABELS_PER_PAGE: u8 = 100;

/// Encode a string for use in URL path segments (RFC 3986 with UTF-8 support)
///
/// Only unreserved characters (A-Z, a-z, 0-9, -, ., _, ~) are left unencoded.
///
/// # Arguments
/// - `input`: The string to encode
///
/// # Returns
/// URL-encoded string safe for use in path segments
fn encode_path_segment(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            // RFC 3986 unreserved characters
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => c.to_string(),
            // Everything else gets percent-encoded as UTF-8 bytes
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect::<String>(),
        })
        .collect()
}

/// Existing Label
///
/// A label currently present on the repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExistingLabel {
    /// Label name
    pub name: String,

    /// Label color (6-digit hexadecimal, without #)
    pub color: String,

    /// Label description
    pub description: Option<String>,
}

impl From<models::Label> for ExistingLabel {
    fn from(label: models::Label) -> Self {
        ExistingLabel {
            name: label.name,
            color: label.color,
            description: label.description,
        }
    }
}

impl From<ExistingLabel> for LabelSpec {
    fn from(label: ExistingLabel) -> Self {
        LabelSpec {
            name: label.name,
            color: label.color,
            description: label.description,
            previous_name: None,
        }
    }
}

/// Body of the label update endpoint
#[derive(Debug, Clone, Serialize)]
struct UpdateLabelRequest<'a> {
    new_name: &'a str,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Remote label operations
///
/// Every call targets one repository and is awaited on its own; the applier
/// never has two calls in flight.
#[async_trait]
pub trait LabelService: Send + Sync {
    /// List every label of the repository
    async fn list_labels(&self) -> Result<Vec<ExistingLabel>>;

    /// Rename `rename.old_name` and set its color and description
    async fn update_label(&self, rename: &RenameOp) -> Result<()>;

    /// Create a new label
    async fn create_label(&self, label: &LabelSpec) -> Result<()>;

    /// Delete a label by name
    async fn delete_label(&self, name: &str) -> Result<()>;
}

/// GitHub API Client
///
/// Client responsible for interactions with the GitHub API
pub struct GitHubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// - `access_token`: GitHub access token
    /// - `owner`: Repository owner
    /// - `repo`: Repository name
    /// - `api_url`: API base URL, for GitHub Enterprise
    ///
    /// # Errors
    /// Returns an error if client initialization fails
    pub fn new(access_token: &str, owner: &str, repo: &str, api_url: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(access_token.to_string());
        if let Some(api_url) = api_url {
            builder = builder.base_uri(api_url)?;
        }
        let octocrab = builder.build()?;

        Ok(Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn label_route(&self, name: &str) -> String {
        format!(
            "/repos/{}/{}/labels/{}",
            self.owner,
            self.repo,
            encode_path_segment(name)
        )
    }
}

#[async_trait]
impl LabelService for GitHubClient {
    async fn list_labels(&self) -> Result<Vec<ExistingLabel>> {
        let mut labels = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .octocrab
                .issues(&self.owner, &self.repo)
                .list_labels_for_repo()
                .page(page)
                .per_page(LABELS_PER_PAGE)
                .send()
                .await
                .map_err(|e| {
                    if e.to_string().contains("Not Found") {
                        Error::RepositoryNotFound(format!("{}/{}", self.owner, self.repo))
                    } else {
                        Error::GitHubApi(e)
                    }
                })?;

            if response.items.is_empty() {
                break;
            }

            let count = response.items.len();
            labels.extend(response.items.into_iter().map(ExistingLabel::from));

            if count < usize::from(LABELS_PER_PAGE) {
                break;
            }
            page += 1;
        }

        Ok(labels)
    }

    async fn update_label(&self, rename: &RenameOp) -> Result<()> {
        // octocrab v0.38 has no typed label update, so go through the raw route
        let body = UpdateLabelRequest {
            new_name: &rename.new_name,
            color: LabelSpec::normalize_color(&rename.color),
            description: rename.description.as_deref(),
        };
        let _updated: models::Label = self
            .octocrab
            .patch(self.label_route(&rename.old_name), Some(&body))
            .await?;

        Ok(())
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<()> {
        let normalized_color = LabelSpec::normalize_color(&label.color);
        self.octocrab
            .issues(&self.owner, &self.repo)
            .create_label(
                &label.name,
                &normalized_color,
                label.description.as_deref().unwrap_or(""),
            )
            .await?;

        Ok(())
    }

    async fn delete_label(&self, name: &str) -> Result<()> {
        // Spaces, special characters and UTF-8 names must be encoded
        let encoded_name = encode_path_segment(name);
        self.octocrab
            .issues(&self.owner, &self.repo)
            .delete_label(&encoded_name)
            .await?;

        Ok(())
    }
}
