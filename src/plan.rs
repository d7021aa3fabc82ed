//! Label Reconciliation
//!
//! Pure classification of desired and existing labels into renames,
//! creations and deletions

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{validate_color, LabelSpec};
use crate::error::{Error, Result};
use crate::github::ExistingLabel;

/// Rename of an existing label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameOp {
    /// Current name on the repository
    pub old_name: String,

    /// Desired name
    pub new_name: String,

    /// Desired color
    pub color: String,

    /// Desired description
    pub description: Option<String>,
}

/// Reconciliation plan
///
/// Each repository label name appears in at most one of the three groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Existing labels to rename, in desired order
    pub renames: Vec<RenameOp>,

    /// Labels to create, in desired order
    pub creates: Vec<LabelSpec>,

    /// Names of existing labels absent from the desired set, in existing order
    pub deletes: Vec<String>,
}

impl Plan {
    /// Whether the plan contains no operation at all
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.creates.is_empty() && self.deletes.is_empty()
    }

    /// Check the color of every label the plan sends to the repository
    ///
    /// Labels that are kept as they are never need a valid color.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLabelColor`] for the first malformed color
    pub fn validate_colors(&self) -> Result<()> {
        for rename in &self.renames {
            validate_color(&rename.color)?;
        }
        for label in &self.creates {
            label.validate_color()?;
        }
        Ok(())
    }
}

/// Reject desired sets in which a `previousName` is claimed more than once
///
/// Runs before any remote state is read so that no mutation is attempted
/// against an unreconcilable label set.
///
/// # Errors
/// Returns [`Error::DuplicatePreviousName`] listing every repeated name once,
/// in the order the repeats were found
pub fn check_duplicate_previous_names(desired: &[LabelSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for previous in desired.iter().filter_map(|label| label.previous_name.as_deref()) {
        if !seen.insert(previous) && !duplicates.iter().any(|d| d == previous) {
            duplicates.push(previous.to_string());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicatePreviousName(duplicates))
    }
}

/// Compute the reconciliation plan
///
/// # Arguments
/// - `desired`: Desired labels, in source order
/// - `existing`: Labels currently on the repository
///
/// # Returns
/// The renames, creations and deletions that turn `existing` into `desired`
///
/// # Errors
/// Returns an error if two desired labels share a `previousName`; no partial
/// plan is produced
pub fn compute_plan(desired: &[LabelSpec], existing: &[ExistingLabel]) -> Result<Plan> {
    check_duplicate_previous_names(desired)?;

    // First occurrence wins if the listing ever repeats a name
    let mut existing_by_name: HashMap<&str, &ExistingLabel> = HashMap::new();
    for label in existing {
        existing_by_name.entry(label.name.as_str()).or_insert(label);
    }

    let renames: Vec<RenameOp> = desired
        .iter()
        .filter_map(|label| {
            let previous = label.previous_name.as_deref()?;
            let current = existing_by_name.get(previous)?;
            Some(RenameOp {
                old_name: current.name.clone(),
                new_name: label.name.clone(),
                color: label.color.clone(),
                description: label.description.clone(),
            })
        })
        .collect();

    let rename_sources: HashSet<&str> = renames.iter().map(|r| r.old_name.as_str()).collect();
    let rename_targets: HashSet<&str> = renames.iter().map(|r| r.new_name.as_str()).collect();
    let desired_names: HashSet<&str> = desired.iter().map(|l| l.name.as_str()).collect();

    let creates: Vec<LabelSpec> = desired
        .iter()
        .filter(|label| {
            !existing_by_name.contains_key(label.name.as_str())
                && !rename_targets.contains(label.name.as_str())
        })
        .cloned()
        .collect();

    let deletes: Vec<String> = existing
        .iter()
        .filter(|label| {
            !desired_names.contains(label.name.as_str())
                && !rename_sources.contains(label.name.as_str())
        })
        .map(|label| label.name.clone())
        .collect();

    Ok(Plan {
        renames,
        creates,
        deletes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_label(name: &str, color: &str) -> ExistingLabel {
        ExistingLabel {
            name: name.to_string(),
            color: color.to_string(),
            description: None,
        }
    }

    /// Existing names partition into kept, renamed-from and deleted; desired
    /// names partition into already present, created and rename targets.
    fn assert_partitions(desired: &[LabelSpec], existing: &[ExistingLabel], plan: &Plan) {
        let existing_names: HashSet<&str> = existing.iter().map(|l| l.name.as_str()).collect();
        let desired_names: HashSet<&str> = desired.iter().map(|l| l.name.as_str()).collect();
        let renamed_from: Vec<&str> = plan.renames.iter().map(|r| r.old_name.as_str()).collect();
        let renamed_to: Vec<&str> = plan.renames.iter().map(|r| r.new_name.as_str()).collect();

        let kept: Vec<&str> = existing
            .iter()
            .map(|l| l.name.as_str())
            .filter(|n| desired_names.contains(n) && !renamed_from.contains(n))
            .collect();
        let mut from_existing = kept;
        from_existing.extend(&renamed_from);
        from_existing.extend(plan.deletes.iter().map(String::as_str));
        let mut expected: Vec<&str> = existing.iter().map(|l| l.name.as_str()).collect();
        from_existing.sort_unstable();
        expected.sort_unstable();
        assert_eq!(from_existing, expected, "existing names must be covered once");

        let present: Vec<&str> = desired
            .iter()
            .map(|l| l.name.as_str())
            .filter(|n| existing_names.contains(n) && !renamed_to.contains(n))
            .collect();
        let mut from_desired: Vec<&str> = present;
        from_desired.extend(&renamed_to);
        from_desired.extend(plan.creates.iter().map(|l| l.name.as_str()));
        let mut expected: Vec<&str> = desired.iter().map(|l| l.name.as_str()).collect();
        from_desired.sort_unstable();
        expected.sort_unstable();
        assert_eq!(from_desired, expected, "desired names must be covered once");
    }

    #[test]
    fn test_plain_create_and_delete() {
        let desired = vec![LabelSpec::new("bug", "f00")];
        let existing = vec![remote_label("defect", "000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert!(plan.renames.is_empty());
        assert_eq!(plan.creates, desired);
        assert_eq!(plan.deletes, vec!["defect".to_string()]);
        assert_partitions(&desired, &existing, &plan);
    }

    #[test]
    fn test_rename_from_previous_name() {
        let desired = vec![LabelSpec::new("bug", "f00").renamed_from("defect")];
        let existing = vec![remote_label("defect", "000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert_eq!(
            plan.renames,
            vec![RenameOp {
                old_name: "defect".to_string(),
                new_name: "bug".to_string(),
                color: "f00".to_string(),
                description: None,
            }]
        );
        assert!(plan.creates.is_empty());
        assert!(plan.deletes.is_empty());
        assert_partitions(&desired, &existing, &plan);
    }

    #[test]
    fn test_rename_carries_description() {
        let desired = vec![LabelSpec::new("bug", "d73a4a")
            .with_description("Something isn't working")
            .renamed_from("defect")];
        let existing = vec![remote_label("defect", "000000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert_eq!(
            plan.renames[0].description.as_deref(),
            Some("Something isn't working")
        );
    }

    #[test]
    fn test_duplicate_previous_name_is_rejected() {
        let desired = vec![
            LabelSpec::new("bug", "f00").renamed_from("defect"),
            LabelSpec::new("issue", "0f0").renamed_from("defect"),
        ];

        let err = compute_plan(&desired, &[]).unwrap_err();
        assert!(matches!(&err, Error::DuplicatePreviousName(names) if names == &["defect"]));
        assert!(err.to_string().contains("defect"));

        // Regardless of what the repository holds
        let err = compute_plan(&desired, &[remote_label("defect", "000")]).unwrap_err();
        assert!(matches!(err, Error::DuplicatePreviousName(_)));
    }

    #[test]
    fn test_duplicates_are_listed_once_each() {
        let desired = vec![
            LabelSpec::new("a", "f00").renamed_from("x"),
            LabelSpec::new("b", "f00").renamed_from("y"),
            LabelSpec::new("c", "f00").renamed_from("x"),
            LabelSpec::new("d", "f00").renamed_from("x"),
            LabelSpec::new("e", "f00").renamed_from("y"),
            LabelSpec::new("f", "f00").renamed_from("z"),
        ];

        let err = check_duplicate_previous_names(&desired).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple labels share the same previousName: x, y"
        );
    }

    #[test]
    fn test_unmatched_previous_name_becomes_create() {
        let desired = vec![LabelSpec::new("bug", "f00").renamed_from("ghost")];
        let existing = vec![remote_label("wontfix", "fff")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert!(plan.renames.is_empty());
        assert_eq!(plan.creates, desired);
        assert_eq!(plan.deletes, vec!["wontfix".to_string()]);
        assert_partitions(&desired, &existing, &plan);
    }

    #[test]
    fn test_unmatched_previous_name_with_existing_target_is_kept() {
        let desired = vec![LabelSpec::new("bug", "f00").renamed_from("ghost")];
        let existing = vec![remote_label("bug", "000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert!(plan.is_empty());
    }

    #[test]
    fn test_matching_names_are_left_alone() {
        let desired = vec![
            LabelSpec::new("bug", "f00"),
            LabelSpec::new("enhancement", "0f0"),
        ];
        let existing = vec![remote_label("bug", "000"), remote_label("enhancement", "000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert!(plan.is_empty());
        assert_partitions(&desired, &existing, &plan);
    }

    #[test]
    fn test_rename_onto_existing_name_neither_creates_nor_deletes() {
        // Both labels exist; collision handling is left to the remote side
        let desired = vec![LabelSpec::new("bug", "f00").renamed_from("defect")];
        let existing = vec![remote_label("bug", "000"), remote_label("defect", "000")];

        let plan = compute_plan(&desired, &existing).unwrap();

        assert_eq!(plan.renames.len(), 1);
        assert!(plan.creates.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_output_order_follows_inputs() {
        let desired = vec![
            LabelSpec::new("zeta", "f00"),
            LabelSpec::new("alpha", "f00"),
            LabelSpec::new("triage", "f00").renamed_from("needs-triage"),
            LabelSpec::new("mid", "f00"),
            LabelSpec::new("docs", "f00").renamed_from("documentation"),
        ];
        let existing = vec![
            remote_label("wontfix", "fff"),
            remote_label("documentation", "fff"),
            remote_label("question", "fff"),
            remote_label("needs-triage", "fff"),
            remote_label("duplicate", "fff"),
        ];

        let plan = compute_plan(&desired, &existing).unwrap();

        let renames: Vec<(&str, &str)> = plan
            .renames
            .iter()
            .map(|r| (r.old_name.as_str(), r.new_name.as_str()))
            .collect();
        assert_eq!(
            renames,
            vec![("needs-triage", "triage"), ("documentation", "docs")]
        );
        let creates: Vec<&str> = plan.creates.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(creates, vec!["zeta", "alpha", "mid"]);
        assert_eq!(plan.deletes, vec!["wontfix", "question", "duplicate"]);
        assert_partitions(&desired, &existing, &plan);
    }

    #[test]
    fn test_colors_checked_only_for_mutated_labels() {
        let desired = vec![
            LabelSpec::new("bug", "f00"),
            LabelSpec::new("enhancement", "#A2EEEF"),
        ];
        let existing = vec![remote_label("bug", "000000")];
        let plan = compute_plan(&desired, &existing).unwrap();
        assert!(plan.validate_colors().is_ok());

        let desired = vec![LabelSpec::new("question", "f00")];
        let plan = compute_plan(&desired, &existing).unwrap();
        assert!(matches!(
            plan.validate_colors(),
            Err(Error::InvalidLabelColor(color)) if color == "f00"
        ));

        let desired = vec![LabelSpec::new("defect", "red").renamed_from("bug")];
        let plan = compute_plan(&desired, &existing).unwrap();
        assert!(matches!(
            plan.validate_colors(),
            Err(Error::InvalidLabelColor(_))
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let plan = compute_plan(&[], &[]).unwrap();
        assert!(plan.is_empty());

        let existing = vec![remote_label("bug", "000")];
        let plan = compute_plan(&[], &existing).unwrap();
        assert_eq!(plan.deletes, vec!["bug".to_string()]);

        let desired = vec![LabelSpec::new("bug", "f00")];
        let plan = compute_plan(&desired, &[]).unwrap();
        assert_eq!(plan.creates, desired);
    }

    #[test]
    fn test_partitions_on_mixed_inputs() {
        let cases: Vec<(Vec<LabelSpec>, Vec<ExistingLabel>)> = vec![
            (
                vec![
                    LabelSpec::new("bug", "f00").renamed_from("defect"),
                    LabelSpec::new("feature", "0f0").renamed_from("enhancement"),
                    LabelSpec::new("docs", "00f").renamed_from("missing"),
                    LabelSpec::new("question", "ff0"),
                ],
                vec![
                    remote_label("defect", "000"),
                    remote_label("question", "000"),
                    remote_label("wontfix", "000"),
                ],
            ),
            (
                vec![
                    LabelSpec::new("a", "f00"),
                    LabelSpec::new("b", "f00").renamed_from("a"),
                ],
                vec![remote_label("a", "000")],
            ),
            (
                vec![LabelSpec::new("same", "f00").renamed_from("same")],
                vec![remote_label("same", "000"), remote_label("other", "000")],
            ),
        ];

        for (desired, existing) in cases {
            let plan = compute_plan(&desired, &existing).unwrap();
            assert_partitions(&desired, &existing, &plan);
        }
    }
}
