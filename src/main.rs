//! orpull - OpenReview venue extraction tool
//!
//! A CLI tool that pulls accepted-paper lists, review decisions, and
//! author submission histories for a workshop venue into CSV/JSON files.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, credentials, I/O)
//!   2 - Venue-configuration error (no submission invitation found)

mod analysis;
mod cli;
mod client;
mod config;
mod models;
mod report;

use analysis::{aggregate_submission, count_submissions, resolve_profile_ids, DecisionPolicy};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, Command};
use client::{ClientError, NoteQuery, OpenReviewClient};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AcceptedPaper, DecisionRow, PresentationType};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        match handle_init_config() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("\n❌ Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    init_logging(&args);

    info!("orpull v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Extraction failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            let code = if is_venue_config_error(&e) { 2 } else { 1 };
            std::process::exit(code);
        }
    }
}

/// Whether the error chain contains the fatal venue-configuration error.
fn is_venue_config_error(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ClientError>(),
            Some(ClientError::VenueConfig(_))
        )
    })
}

/// Handle init-config: generate a default orpull.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new("orpull.toml");

    if path.exists() {
        eprintln!("⚠️  orpull.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write orpull.toml")?;

    println!("✅ Created orpull.toml with default settings.");
    println!("   Edit it to set credentials, the venue id, and author groups.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected pipeline. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command {
        Command::Accepted { ref output } => run_accepted(&config, output.clone(), &args).await,
        Command::Decisions {
            ref output,
            ref flagged,
        } => run_decisions(&config, output.clone(), flagged.clone(), &args).await,
        Command::Authors { ref output } => run_authors(&config, output.clone()).await,
        Command::InitConfig => unreachable!("handled before logging init"),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from orpull.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Log in with the configured credentials.
async fn connect(config: &Config) -> Result<OpenReviewClient> {
    if config.api.username.is_empty() || config.api.password.is_empty() {
        bail!(
            "OpenReview credentials are not configured. Set [api] username/password \
             in orpull.toml or the ORPULL_USERNAME/ORPULL_PASSWORD env vars."
        );
    }

    let client = OpenReviewClient::connect(
        &config.api.base_url,
        &config.api.username,
        &config.api.password,
        config.api.timeout_seconds,
    )
    .await
    .context("Failed to log in to OpenReview")?;

    Ok(client)
}

/// Fail early when no venue id is configured.
fn require_venue(config: &Config) -> Result<&str> {
    if config.venue.id.is_empty() {
        bail!("No venue id configured. Set [venue] id in orpull.toml or pass --venue.");
    }
    Ok(&config.venue.id)
}

/// A progress bar over submission threads, hidden in quiet mode.
fn thread_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Extract accepted papers and their presentation types.
async fn run_accepted(config: &Config, output: Option<PathBuf>, args: &Args) -> Result<i32> {
    let venue_id = require_venue(config)?;
    let client = connect(config).await?;

    if !args.quiet {
        println!("📥 Fetching accepted papers for {}", venue_id);
    }

    let notes = client
        .get_all_notes(&NoteQuery::by_content("venueid", venue_id))
        .await?;
    info!("Found {} notes with venueid={}", notes.len(), venue_id);

    if notes.is_empty() {
        println!("No accepted papers found.");
        return Ok(0);
    }

    let mut papers: Vec<AcceptedPaper> = notes.iter().map(AcceptedPaper::from_note).collect();
    papers.sort_by_key(|p| p.paper_number);

    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.accepted));
    report::write_accepted_csv(&path, &papers)?;

    let oral = papers
        .iter()
        .filter(|p| p.presentation_type == PresentationType::Oral)
        .count();
    let poster = papers
        .iter()
        .filter(|p| p.presentation_type == PresentationType::Poster)
        .count();

    println!("\n📊 Accepted papers: {}", papers.len());
    println!("   - Oral: {}", oral);
    println!("   - Poster: {}", poster);
    println!(
        "   Extracted: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("\n✅ Wrote {}", path.display());

    Ok(0)
}

/// Extract decisions and flag accepted papers with a low average score.
async fn run_decisions(
    config: &Config,
    output: Option<PathBuf>,
    flagged_output: Option<PathBuf>,
    args: &Args,
) -> Result<i32> {
    let venue_id = require_venue(config)?;
    let client = connect(config).await?;

    // Fatal when no candidate resolves: mapped to exit code 2 in main.
    let invitation = client
        .find_submission_invitation(venue_id, &config.venue.submission_invitations)
        .await?;

    if !args.quiet {
        println!("📥 Fetching submissions via {}", invitation);
    }

    let submissions = client
        .get_all_notes(&NoteQuery::by_invitation(&invitation))
        .await?;

    if submissions.is_empty() {
        println!("No submissions found.");
        return Ok(0);
    }
    info!("Found {} submissions", submissions.len());

    let policy = DecisionPolicy {
        accept_prefix: config.venue.accept_prefix.clone(),
        low_score_threshold: config.venue.low_score_threshold,
    };

    if !args.quiet {
        println!("🔬 Aggregating {} submission threads...", submissions.len());
    }

    let pb = thread_progress_bar(submissions.len() as u64, args.quiet);
    let mut rows: Vec<DecisionRow> = Vec::with_capacity(submissions.len());
    let mut flagged: BTreeSet<i64> = BTreeSet::new();

    for submission in &submissions {
        let replies = client
            .get_all_notes(&NoteQuery::by_forum(submission.thread_id()))
            .await?;

        let result = aggregate_submission(&replies, &policy);
        let paper_number = submission.paper_number();
        debug!(
            "Paper {}: decision='{}' avg={:?}",
            paper_number, result.decision, result.average_score
        );

        if result.low_score_accept {
            flagged.insert(paper_number);
        }
        rows.push(DecisionRow {
            paper_number,
            decision: result.decision,
            comment: String::new(),
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    rows.sort_by_key(|r| r.paper_number);
    let flagged: Vec<i64> = flagged.into_iter().collect();

    let decisions_path = output.unwrap_or_else(|| PathBuf::from(&config.output.decisions));
    report::write_decisions_csv(&decisions_path, &rows)?;

    let flagged_path = flagged_output.unwrap_or_else(|| PathBuf::from(&config.output.flagged));
    report::write_flagged_csv(&flagged_path, &flagged)?;

    println!("\n📊 Decisions: {}", rows.len());
    println!("✅ Wrote {}", decisions_path.display());
    if flagged.is_empty() {
        println!(
            "No accepted papers with average score < {} were found (or no scores available).",
            config.venue.low_score_threshold
        );
    } else {
        println!(
            "✅ Wrote {} with {} flagged low-score accepts",
            flagged_path.display(),
            flagged.len()
        );
    }

    Ok(0)
}

/// Resolve author groups to profile ids and count prior submissions.
async fn run_authors(config: &Config, output: Option<PathBuf>) -> Result<i32> {
    if config.authors.groups.is_empty() {
        bail!("No author groups configured. Set [authors] groups in orpull.toml.");
    }

    let client = connect(config).await?;

    let mut all_ids: HashSet<String> = HashSet::new();
    let mut skipped: Vec<String> = Vec::new();

    for group_id in &config.authors.groups {
        match client.get_group(group_id).await {
            Ok(group) => {
                info!("Group {} has {} members", group_id, group.members.len());
                let resolved = resolve_profile_ids(&client, &group.members).await?;
                all_ids.extend(resolved);
            }
            Err(e) => {
                // Nonexistent groups are a per-group skip, not a run failure.
                warn!("Skipping group {}: {}", group_id, e);
                skipped.push(group_id.clone());
            }
        }
    }

    let mut profile_ids: Vec<String> = all_ids.into_iter().collect();
    profile_ids.sort();
    info!("Resolved {} distinct profile ids", profile_ids.len());

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for profile_id in profile_ids {
        let n = count_submissions(&client, &profile_id).await?;
        debug!("{}: {} submissions", profile_id, n);
        counts.insert(profile_id, n);
    }

    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.author_counts));
    report::write_author_counts_json(&path, &counts)?;

    println!("\n📊 Author profiles: {}", counts.len());
    if !skipped.is_empty() {
        println!("   Skipped {} missing group(s): {}", skipped.len(), skipped.join(", "));
    }
    println!("\n✅ Wrote {}", path.display());

    Ok(0)
}
