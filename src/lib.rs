//! # gh-label-reconciler
//!
//! Reconciles a GitHub repository's labels against a declared label set
//!
//! ## Features
//! - Label sources from local files or HTTP(S) URLs, in JSON or YAML
//! - Rename detection through `previousName`
//! - Dry-run mode
//! - Optional removal of labels missing from the source

pub mod config;
pub mod error;
pub mod github;
pub mod loader;
pub mod plan;
pub mod sync;

pub use config::{LabelSpec, RunConfig};
pub use error::{Error, ErrorKind, Result};
pub use github::{ExistingLabel, GitHubClient, LabelService};
pub use plan::{compute_plan, Plan, RenameOp};
pub use sync::{apply_plan, ApplyOptions, LabelSyncer, SyncSummary};

/// Reconcile a repository's labels with a label source
///
/// Loads the source, then reads the repository's labels and applies the
/// resulting plan.
///
/// # Examples
///
/// ```rust,no_run
/// use gh_label_reconciler::RunConfig;
///
/// #[tokio::main]
/// async fn main() -> gh_label_reconciler::Result<()> {
///     let config = RunConfig {
///         access_token: "your_github_token".to_string(),
///         owner: None,
///         repository: "owner/repo".to_string(),
///         source: ".github/labels.yml".to_string(),
///         dry_run: true,
///         remove_missing: false,
///         api_url: None,
///     };
///
///     let summary = gh_label_reconciler::reconcile_repository_labels(&config).await?;
///     println!("Reconciled: {:?}", summary);
///     Ok(())
/// }
/// ```
pub async fn reconcile_repository_labels(config: &RunConfig) -> Result<SyncSummary> {
    config.validate()?;

    let desired = loader::load_desired_labels(&config.source).await?;

    let (owner, repo) = config.repository_target()?;
    let client = GitHubClient::new(
        &config.access_token,
        &owner,
        &repo,
        config.api_url.as_deref(),
    )?;

    let syncer = LabelSyncer::new(
        client,
        ApplyOptions {
            dry_run: config.dry_run,
            remove_missing: config.remove_missing,
        },
    );
    syncer.sync_labels(&desired).await
}
