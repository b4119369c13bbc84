// src/cli.rs

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use git_churn::churn::{summarize_by_file, summarize_by_owner, AggregationPolicy, SortOrder};
use git_churn::codeowners::OwnershipRules;
use git_churn::extractor::{extract_commit_stats, ExtractOptions};
use git_churn::history::GitCli;
use git_churn::index::FileCreationIndex;
use git_churn::model::{DateWindow, LineCounting};
use git_churn::origin::{build_index, IndexOptions};
use git_churn::repo::GitRepository;
use git_churn::report::{format_table, write_summaries};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Date every file tracked at a branch tip and save the index
    BuildIndex(BuildIndexArgs),
    /// Report churn of recently added files using a saved index
    Check(CheckArgs),
    /// Report malformed lines of an ownership rules file
    ValidateOwners(ValidateOwnersArgs),
}

#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    /// Path to the git repository to index
    #[arg(short, long = "repo", env = "GIT_CHURN_REPO")]
    pub repository_path: PathBuf,

    /// Where to write the file creation index
    #[arg(short, long, env = "GIT_CHURN_INDEX_OUTPUT")]
    pub output_path: PathBuf,

    /// Branch whose tip defines the indexed files
    #[arg(short, long, default_value = "main", env = "GIT_CHURN_BRANCH")]
    pub branch: String,

    /// Concurrent history queries (defaults to available parallelism)
    #[arg(short, long, env = "GIT_CHURN_JOBS")]
    pub jobs: Option<NonZeroUsize>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the git repository to analyze
    #[arg(short, long, env = "GIT_CHURN_REPO")]
    pub repository_path: PathBuf,

    #[arg(short, long, default_value = "main", env = "GIT_CHURN_BRANCH")]
    pub branch: String,

    /// File creation index written by `build-index`
    #[arg(short, long, env = "GIT_CHURN_CACHE")]
    pub cache_path: PathBuf,

    /// Where to write the file-level churn report
    #[arg(short, long, env = "GIT_CHURN_OUTPUT")]
    pub output_path: PathBuf,

    /// Lookback window, and the maximum age of a file to count as new, in days
    #[arg(short, long, default_value_t = 30, env = "GIT_CHURN_DAYS_AGO")]
    pub days_ago: u32,

    /// Include merge commits in the walk
    #[arg(long)]
    pub with_merges: bool,

    /// Window start (RFC 3339 or YYYY-MM-DD); defaults to now minus --days-ago
    #[arg(long, value_parser = parse_date)]
    pub since: Option<DateTime<Utc>>,

    /// Window end (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long, value_parser = parse_date)]
    pub until: Option<DateTime<Utc>>,

    /// Ownership rules file; defaults to CODEOWNERS or CODEOWNERS.md at the branch tip
    #[arg(long, env = "GIT_CHURN_CODEOWNERS")]
    pub codeowners: Option<PathBuf>,

    /// Where to write the owner-level churn report
    #[arg(long, env = "GIT_CHURN_OWNERS_OUTPUT")]
    pub owners_output: Option<PathBuf>,

    /// Keep file rows touched more than this many times
    #[arg(long, default_value_t = 0)]
    pub min_churn_count: u64,

    #[arg(long, value_enum, default_value_t = SortOrder::Descending)]
    pub sort: SortOrder,

    /// Keep owner rows touched more than this many times
    #[arg(long, default_value_t = 1)]
    pub owner_min_churn_count: u64,

    #[arg(long, value_enum, default_value_t = SortOrder::Ascending)]
    pub owner_sort: SortOrder,

    /// How modified lines are counted
    #[arg(long, value_enum, default_value_t = LineCounting::Paired)]
    pub line_counting: LineCounting,

    /// Rows shown in the console table
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

#[derive(Args, Debug)]
pub struct ValidateOwnersArgs {
    pub path: PathBuf,
}

fn parse_date(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got '{value}'"))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::BuildIndex(args) => run_build_index(args),
        Command::Check(args) => run_check(args),
        Command::ValidateOwners(args) => run_validate_owners(args),
    }
}

fn run_build_index(args: BuildIndexArgs) -> Result<()> {
    let repo = GitRepository::open(&args.repository_path)?;
    let log = Arc::new(GitCli::new(repo.git_dir()));
    let options = IndexOptions {
        branch: args.branch,
        jobs: args.jobs,
        show_progress: !args.no_progress,
    };

    let (index, summary) = build_index(&repo, log, &options)
        .with_context(|| format!("Failed to index {}", args.repository_path.display()))?;
    index.save(&args.output_path)?;

    println!(
        "Indexed {} files ({} undated, {} failed) into {}",
        index.len(),
        summary.not_found,
        summary.failed,
        args.output_path.display()
    );
    Ok(())
}

fn load_rules(repo: &GitRepository, args: &CheckArgs) -> Result<OwnershipRules> {
    let content = match &args.codeowners {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => repo.ownership_document(&args.branch)?,
    };

    let Some(content) = content else {
        info!("No ownership rules found; owners will be empty");
        return Ok(OwnershipRules::default());
    };
    if !OwnershipRules::is_valid_syntax(&content) {
        warn!("Ownership rules contain malformed lines; they are ignored");
    }
    Ok(OwnershipRules::parse(&content))
}

fn run_check(args: CheckArgs) -> Result<()> {
    let repo = GitRepository::open(&args.repository_path)?;
    let index = FileCreationIndex::load(&args.cache_path)?;
    let rules = load_rules(&repo, &args)?;

    let window = DateWindow::resolve(args.since, args.until, args.days_ago, Utc::now())?;
    if window.start > window.end {
        bail!("window start {} is after its end {}", window.start, window.end);
    }
    let options = ExtractOptions {
        branch: args.branch.clone(),
        window,
        with_merges: args.with_merges,
        line_counting: args.line_counting,
    };

    let owners = (!rules.is_empty()).then_some(&rules);
    let records = extract_commit_stats(&repo, &options, &index, owners)
        .with_context(|| format!("Failed to walk {}", args.branch))?;

    let file_policy = AggregationPolicy {
        min_churn_count: args.min_churn_count,
        order: args.sort,
        limit: None,
    };
    let files = summarize_by_file(&records, args.days_ago, &file_policy);
    write_summaries(&args.output_path, &files)?;
    print!("{}", format_table("file", &files, args.top));

    if let Some(owners_output) = &args.owners_output {
        let owner_policy = AggregationPolicy {
            min_churn_count: args.owner_min_churn_count,
            order: args.owner_sort,
            limit: None,
        };
        let by_owner = summarize_by_owner(&records, args.days_ago, &owner_policy);
        write_summaries(owners_output, &by_owner)?;
        println!();
        print!("{}", format_table("owner", &by_owner, args.top));
    }

    Ok(())
}

fn run_validate_owners(args: ValidateOwnersArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let issues = OwnershipRules::syntax_issues(&content);
    if issues.is_empty() {
        println!("{}: ok", args.path.display());
        return Ok(());
    }
    for issue in &issues {
        println!(
            "{}:{}: expected a pattern and at least one owner: {}",
            args.path.display(),
            issue.line_number,
            issue.text
        );
    }
    bail!("{} malformed line(s)", issues.len())
}
