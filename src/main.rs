//! gh-label-reconciler CLI
//!
//! Command line tool and GitHub Action entry point for reconciling repository labels

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gh_label_reconciler::{
    config::{flag_enabled, repository_target},
    loader::LabelDocument,
    Error, GitHubClient, LabelService, LabelSpec, Result, RunConfig, SyncSummary,
};

/// gh-label-reconciler CLI
///
/// Every option can also be supplied through the GitHub Actions environment
#[derive(Parser)]
#[command(
    name = "gh-label-reconciler",
    version,
    about = "Reconcile GitHub repository labels against a JSON or YAML label set",
    long_about = "Reconciles the labels of a GitHub repository against a declared label set. \
    Labels are renamed through `previousName`, created when missing, and optionally deleted \
    when absent from the source."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Label source: file path or HTTP(S) URL (JSON or YAML)
    #[arg(short = 's', long, env = "INPUT_SOURCE", global = true)]
    source: Option<String>,

    /// Dry run mode; enabled only by the value "true"
    #[arg(
        long,
        env = "INPUT_DRY",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    dry: Option<String>,

    /// Delete labels missing from the source; enabled only by the value "true"
    #[arg(
        long,
        env = "INPUT_REMOVE_MISSING",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    remove_missing: Option<String>,

    /// GitHub access token
    #[arg(short = 't', long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Repository owner (defaults to the owner part of --repository)
    #[arg(long, env = "GITHUB_REPOSITORY_OWNER", global = true)]
    owner: Option<String>,

    /// Target repository (owner/repo format)
    #[arg(short = 'r', long, env = "GITHUB_REPOSITORY", global = true)]
    repository: Option<String>,

    /// GitHub API base URL (GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", global = true)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile repository labels with the source (default)
    Sync,

    /// Print the repository's current labels as a label source document
    List {
        /// Output format
        #[arg(long, default_value = "yaml", value_parser = ["json", "yaml"])]
        format: String,

        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        // Fails the workflow step when running as a GitHub Action
        println!("::error::{}", escape_workflow_data(&format!("{:#}", err)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::List {
            ref format,
            ref output,
        }) => {
            let token = require_token(cli.token.clone())?;
            let repository = require_repository(cli.repository.clone())?;
            run_list(&cli, token, repository, format, output.as_ref()).await
        }
        Some(Commands::Sync) | None => {
            let config = build_run_config(&cli)?;
            run_sync(config).await
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins; otherwise `--verbose` or a GitHub Actions debug run
/// (`RUNNER_DEBUG=1`) enables debug output for this crate.
fn init_tracing(verbose: bool) {
    let runner_debug = std::env::var("RUNNER_DEBUG").as_deref() == Ok("1");
    let level = if verbose || runner_debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,gh_label_reconciler={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Execute synchronization
async fn run_sync(config: RunConfig) -> anyhow::Result<()> {
    info!("Reconciling labels of {} from {}", config.repository, config.source);
    if config.dry_run {
        info!("Running in dry-run mode (no changes will be made)");
    }

    let summary = gh_label_reconciler::reconcile_repository_labels(&config).await?;
    display_summary(&summary);

    Ok(())
}

/// Execute list command
async fn run_list(
    cli: &Cli,
    access_token: String,
    repository: String,
    format: &str,
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let (owner, repo) = repository_target(cli.owner.as_deref(), &repository)?;
    let client = GitHubClient::new(&access_token, &owner, &repo, cli.api_url.as_deref())?;
    let labels = client
        .list_labels()
        .await
        .with_context(|| format!("Failed to list labels of {}/{}", owner, repo))?;

    let document = LabelDocument {
        labels: labels.into_iter().map(LabelSpec::from).collect(),
    };
    let content = render_document(&document, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Label source written to: {}",
                "✓".green(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", content),
    }

    Ok(())
}

/// Serialize a label document
fn render_document(document: &LabelDocument, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(document)?),
        "yaml" => Ok(serde_yaml::to_string(document)?),
        _ => Err(Error::config_validation("Unsupported format")),
    }
}

/// Display the synchronization summary
fn display_summary(summary: &SyncSummary) {
    if summary.dry_run && summary.has_changes() {
        println!("\n{} Reconciliation preview (dry-run mode):", "•".blue());
    } else if summary.has_changes() {
        println!("\n{} Reconciliation completed:", "✓".green());
    } else {
        println!("\n{} No changes required", "✓".green());
    }

    println!("  Renamed: {}", summary.renamed.to_string().blue());
    println!("  Created: {}", summary.created.to_string().green());
    println!("  Deleted: {}", summary.deleted.to_string().red());
    if !summary.retained.is_empty() {
        println!(
            "  Kept (not in source): {}",
            summary.retained.len().to_string().yellow()
        );
    }
}

/// Assemble the run configuration from flags and environment
fn build_run_config(cli: &Cli) -> Result<RunConfig> {
    let source = cli.source.clone().ok_or_else(|| {
        Error::config_validation("A label source is required. Use --source or INPUT_SOURCE")
    })?;

    let config = RunConfig {
        access_token: require_token(cli.token.clone())?,
        owner: cli.owner.clone(),
        repository: require_repository(cli.repository.clone())?,
        source,
        dry_run: flag_enabled(cli.dry.as_deref()),
        remove_missing: flag_enabled(cli.remove_missing.as_deref()),
        api_url: cli.api_url.clone(),
    };
    config.validate()?;

    Ok(config)
}

/// Require a repository argument
fn require_repository(repo: Option<String>) -> Result<String> {
    repo.ok_or_else(|| {
        Error::config_validation("Repository is required. Use --repository or GITHUB_REPOSITORY")
    })
}

/// Require an access token
fn require_token(token: Option<String>) -> Result<String> {
    token.ok_or_else(|| {
        Error::config_validation("GitHub access token is required. Use --token or GITHUB_TOKEN")
    })
}

/// Escape a message for a workflow command
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gh-label-reconciler"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_run_config_from_flags() {
        let cli = parse(&[
            "--source",
            "labels.yml",
            "--token",
            "my-token",
            "--repository",
            "octo-org/labels",
            "--dry",
            "--remove-missing=true",
        ]);

        let config = build_run_config(&cli).unwrap();
        assert_eq!(config.source, "labels.yml");
        assert_eq!(config.access_token, "my-token");
        assert!(config.dry_run);
        assert!(config.remove_missing);
    }

    #[test]
    fn test_switches_need_exact_true() {
        let cli = parse(&["--dry=yes", "--remove-missing=false"]);
        assert!(!flag_enabled(cli.dry.as_deref()));
        assert!(!flag_enabled(cli.remove_missing.as_deref()));

        let cli = parse(&["--dry=true"]);
        assert!(flag_enabled(cli.dry.as_deref()));
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let cli = parse(&["--dry", "sync"]);
        assert!(matches!(cli.command, Some(Commands::Sync)));
        assert_eq!(cli.dry.as_deref(), Some("true"));

        let cli = parse(&["list", "--format", "json"]);
        assert!(matches!(cli.command, Some(Commands::List { ref format, .. }) if format == "json"));
    }

    #[test]
    fn test_build_run_config_rejects_bad_repository() {
        let cli = parse(&[
            "--source",
            "labels.json",
            "--token",
            "my-token",
            "--repository",
            "not-a-full-name",
        ]);
        assert!(build_run_config(&cli).is_err());
    }

    #[test]
    fn test_require_repository() {
        assert_eq!(
            require_repository(Some("owner/repo".to_string())).unwrap(),
            "owner/repo"
        );
        assert!(require_repository(None).is_err());
    }

    #[test]
    fn test_require_token() {
        assert_eq!(require_token(Some("my-token".to_string())).unwrap(), "my-token");
        assert!(require_token(None).is_err());
    }

    #[test]
    fn test_render_document() {
        let document = LabelDocument {
            labels: vec![
                LabelSpec::new("bug", "d73a4a").with_description("Something isn't working")
            ],
        };

        let yaml = render_document(&document, "yaml").unwrap();
        assert!(yaml.starts_with("labels:"));
        assert!(!yaml.contains("previousName"));

        let json = render_document(&document, "json").unwrap();
        let parsed: LabelDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document);

        assert!(render_document(&document, "toml").is_err());
    }

    #[test]
    fn test_escape_workflow_data() {
        assert_eq!(
            escape_workflow_data("100% broken\nsecond line\r"),
            "100%25 broken%0Asecond line%0D"
        );
    }

    #[test]
    fn test_display_summary_variants() {
        let mut summary = SyncSummary::new(true);
        summary.created = 2;
        summary.retained = vec!["wontfix".to_string()];
        // Should not panic
        display_summary(&summary);

        display_summary(&SyncSummary::new(false));
    }
}
