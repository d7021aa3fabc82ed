//! Label Synchronization Functionality
//!
//! Applies a reconciliation plan to a repository, or describes it in dry-run
//! mode

use std::fmt;

use tracing::{debug, info};

use crate::config::LabelSpec;
use crate::error::Result;
use crate::github::LabelService;
use crate::plan::{check_duplicate_previous_names, compute_plan, Plan, RenameOp};

/// How planned operations are carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Issue the remote mutation
    Execute,

    /// Only report what would happen
    Describe,
}

/// Applier options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Dry-run mode (don't make actual changes)
    pub dry_run: bool,

    /// Delete repository labels missing from the source
    pub remove_missing: bool,
}

impl ApplyOptions {
    /// Mode the plan is applied in
    pub fn mode(&self) -> ApplyMode {
        if self.dry_run {
            ApplyMode::Describe
        } else {
            ApplyMode::Execute
        }
    }
}

/// A single planned label operation
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation<'a> {
    /// Rename an existing label
    Rename(&'a RenameOp),

    /// Create a label
    Create(&'a LabelSpec),

    /// Delete a label by name
    Delete(&'a str),
}

impl SyncOperation<'_> {
    /// Progress line written before the mutation is issued
    fn progress(&self) -> String {
        match self {
            SyncOperation::Rename(rename) => {
                format!("Renaming {} to {}...", rename.old_name, rename.new_name)
            }
            SyncOperation::Create(label) => format!("Creating {}...", label.name),
            SyncOperation::Delete(name) => format!("Deleting {}...", name),
        }
    }
}

impl fmt::Display for SyncOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::Rename(rename) => {
                write!(f, "rename {} to {}", rename.old_name, rename.new_name)
            }
            SyncOperation::Create(label) => write!(f, "create {}", label.name),
            SyncOperation::Delete(name) => write!(f, "delete {}", name),
        }
    }
}

/// Operation groups, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationGroup {
    Rename,
    Create,
    Delete,
}

impl OperationGroup {
    fn verb(self) -> &'static str {
        match self {
            OperationGroup::Rename => "rename",
            OperationGroup::Create => "create",
            OperationGroup::Delete => "delete",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            OperationGroup::Rename => "renamed",
            OperationGroup::Create => "created",
            OperationGroup::Delete => "deleted",
        }
    }
}

/// Synchronization summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    /// Number of labels renamed (or that would be, in dry-run mode)
    pub renamed: usize,

    /// Number of labels created (or that would be, in dry-run mode)
    pub created: usize,

    /// Number of labels deleted (or that would be, in dry-run mode)
    pub deleted: usize,

    /// Labels missing from the source that were left in place
    pub retained: Vec<String>,

    /// Whether this is a dry run
    pub dry_run: bool,
}

impl SyncSummary {
    /// Create a new empty summary
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Whether changes were (or would be) made
    pub fn has_changes(&self) -> bool {
        self.renamed > 0 || self.created > 0 || self.deleted > 0
    }

    /// Total number of applied (or described) operations
    pub fn total_operations(&self) -> usize {
        self.renamed + self.created + self.deleted
    }
}

/// Carry out one operation in the given mode
async fn dispatch<S: LabelService + ?Sized>(
    service: &S,
    mode: ApplyMode,
    operation: &SyncOperation<'_>,
) -> Result<()> {
    match mode {
        ApplyMode::Describe => {
            info!("Dry Run: Would {}", operation);
            Ok(())
        }
        ApplyMode::Execute => {
            debug!("{}", operation.progress());
            match operation {
                SyncOperation::Rename(rename) => service.update_label(rename).await,
                SyncOperation::Create(label) => service.create_label(label).await,
                SyncOperation::Delete(name) => service.delete_label(name).await,
            }
        }
    }
}

/// Apply one group sequentially, stopping at the first failure
async fn apply_group<S: LabelService + ?Sized>(
    service: &S,
    mode: ApplyMode,
    group: OperationGroup,
    operations: &[SyncOperation<'_>],
) -> Result<usize> {
    let count = operations.len();

    if mode == ApplyMode::Describe && count > 0 {
        info!("Dry Run: {} labels to {}", count, group.verb());
    }

    for operation in operations {
        dispatch(service, mode, operation).await?;
    }

    if count > 0 {
        match mode {
            ApplyMode::Describe => {
                info!("Dry Run: {} labels would be {}.", count, group.past_tense())
            }
            ApplyMode::Execute => info!("{} labels {}.", count, group.past_tense()),
        }
    }

    Ok(count)
}

/// Apply a reconciliation plan
///
/// Renames run first, then creations, then deletions. Deletions only happen
/// when `remove_missing` is set; otherwise the labels are reported and kept.
///
/// # Arguments
/// - `service`: Remote label operations
/// - `plan`: Plan to apply
/// - `options`: Dry-run and deletion switches
///
/// # Errors
/// Returns an error before any mutation if a label to rename or create has a
/// malformed color. Otherwise returns the first remote failure; operations
/// already applied are not rolled back and the remaining ones are skipped
pub async fn apply_plan<S: LabelService + ?Sized>(
    service: &S,
    plan: &Plan,
    options: ApplyOptions,
) -> Result<SyncSummary> {
    plan.validate_colors()?;

    let mode = options.mode();
    let mut summary = SyncSummary::new(options.dry_run);

    let renames: Vec<SyncOperation<'_>> = plan.renames.iter().map(SyncOperation::Rename).collect();
    summary.renamed = apply_group(service, mode, OperationGroup::Rename, &renames).await?;

    let creates: Vec<SyncOperation<'_>> = plan.creates.iter().map(SyncOperation::Create).collect();
    summary.created = apply_group(service, mode, OperationGroup::Create, &creates).await?;

    if options.remove_missing {
        let deletes: Vec<SyncOperation<'_>> = plan
            .deletes
            .iter()
            .map(|name| SyncOperation::Delete(name.as_str()))
            .collect();
        summary.deleted = apply_group(service, mode, OperationGroup::Delete, &deletes).await?;
    } else {
        info!(
            "{} labels are not included in the source data. To delete them from the repository, enable 'remove_missing' ({}).",
            plan.deletes.len(),
            plan.deletes.join(", ")
        );
        summary.retained = plan.deletes.clone();
    }

    Ok(summary)
}

/// Label Synchronization Engine
///
/// Reconciles a repository's labels with a desired label set
pub struct LabelSyncer<S> {
    service: S,
    options: ApplyOptions,
}

impl<S: LabelService> LabelSyncer<S> {
    /// Create a new label synchronization engine
    ///
    /// # Arguments
    /// - `service`: Remote label operations for the target repository
    /// - `options`: Dry-run and deletion switches
    pub fn new(service: S, options: ApplyOptions) -> Self {
        Self { service, options }
    }

    /// Remote label operations this engine uses
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Compute the plan for `desired` against the repository's current labels
    ///
    /// The `previousName` check runs before the repository is read.
    ///
    /// # Errors
    /// Returns an error if the desired set is invalid or listing fails
    pub async fn plan(&self, desired: &[LabelSpec]) -> Result<Plan> {
        check_duplicate_previous_names(desired)?;

        let existing = self.service.list_labels().await?;
        info!("Found {} labels on the repository", existing.len());

        compute_plan(desired, &existing)
    }

    /// Synchronize labels
    ///
    /// # Returns
    /// Synchronization summary
    ///
    /// # Errors
    /// Returns an error if planning fails or any remote mutation fails
    pub async fn sync_labels(&self, desired: &[LabelSpec]) -> Result<SyncSummary> {
        let plan = self.plan(desired).await?;
        if plan.is_empty() {
            info!("Repository labels already match the source");
        }
        apply_plan(&self.service, &plan, self.options).await
    }
}
