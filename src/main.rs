//! vouch - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use vouch::config::{DEFAULT_EVIDENCE_DIR, DEFAULT_ISSUES_DIR, DEFAULT_JOBS, DEFAULT_PATTERNS_FILE};
use vouch::runner::check_shell_available;
use vouch::verification::report::{format_lane_line, format_report, format_summary};
use vouch::{
    BatchStats, Depth, PatternCatalog, VerificationReport, Verifier, VerifierConfig, VerifyOptions,
    verify_batch,
};

/// Verify claimed issue fixes by running their verification checks.
#[derive(Parser, Debug)]
#[command(name = "vouch")]
#[command(about = "Verify claimed issue fixes by running their verification checks")]
#[command(version)]
struct Cli {
    /// Issue identifiers to verify (e.g. G-01 B-03)
    issue_ids: Vec<String>,

    /// Verify every issue in a lane
    #[arg(short, long)]
    lane: Option<String>,

    /// Verify every issue in every lane
    #[arg(short, long)]
    all: bool,

    /// Record date_verified and confidence in issues that pass
    #[arg(short, long)]
    update: bool,

    /// Run only QUICK depth checks
    #[arg(short, long, conflicts_with = "deep")]
    quick: bool,

    /// Run DEEP depth checks
    #[arg(short, long)]
    deep: bool,

    /// Show commands and their output
    #[arg(short, long)]
    verbose: bool,

    /// Number of issues verified concurrently
    #[arg(short = 'j', long, default_value_t = DEFAULT_JOBS)]
    jobs: usize,

    /// Per-command timeout in seconds (overrides VOUCH_COMMAND_TIMEOUT)
    #[arg(long)]
    timeout: Option<u64>,

    /// Repository root that checks run in
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Issue records directory
    #[arg(long, default_value = DEFAULT_ISSUES_DIR)]
    issues_dir: PathBuf,

    /// Verification pattern catalog
    #[arg(long, default_value = DEFAULT_PATTERNS_FILE)]
    patterns: PathBuf,

    /// Evidence output directory
    #[arg(long, default_value = DEFAULT_EVIDENCE_DIR)]
    evidence_dir: PathBuf,
}

impl Cli {
    fn depth(&self) -> Option<Depth> {
        if self.quick {
            Some(Depth::Quick)
        } else if self.deep {
            Some(Depth::Deep)
        } else {
            None
        }
    }

    fn config(&self) -> VerifierConfig {
        let mut config = VerifierConfig::new(&self.root)
            .with_issues_dir(&self.issues_dir)
            .with_patterns_file(&self.patterns)
            .with_evidence_dir(&self.evidence_dir)
            .with_jobs(self.jobs);
        if let Some(secs) = self.timeout {
            config = config.with_command_timeout(Duration::from_secs(secs.max(1)));
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "warn,vouch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.issue_ids.is_empty() && cli.lane.is_none() && !cli.all {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    }

    // Step 1: Check prerequisites
    check_shell_available().context("Cannot run verification commands")?;

    // Step 2: Load configuration and the pattern catalog
    let config = cli.config();
    let catalog = match PatternCatalog::load(&config.patterns_path()) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("{}; pattern-based checks are skipped", e);
            PatternCatalog::default()
        }
    };
    let verifier = Arc::new(Verifier::new(&config, Arc::new(catalog)));

    let options = VerifyOptions {
        depth: cli.depth(),
        update_status: cli.update,
    };

    // Step 3: Verify
    let all_passed = if cli.all {
        let lanes = verifier.store().lanes();
        if lanes.is_empty() {
            println!("No lanes found in {}", config.issues_path().display());
            return Ok(ExitCode::FAILURE);
        }

        let mut overall = BatchStats::default();
        for lane in lanes {
            overall = overall.merge(verify_lane(&verifier, &lane, options, config.jobs).await);
        }
        println!();
        print!("{}", format_summary("All lanes", &overall));
        overall.all_passed()
    } else if let Some(lane) = &cli.lane {
        verify_lane(&verifier, lane, options, config.jobs)
            .await
            .all_passed()
    } else {
        let reports = verify_batch(Arc::clone(&verifier), &cli.issue_ids, options, config.jobs).await;
        for report in &reports {
            print!("{}", format_report(report, cli.verbose));
            println!();
        }
        reports.iter().all(VerificationReport::passed)
    };

    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify and print every issue in one lane.
async fn verify_lane(
    verifier: &Arc<Verifier>,
    lane: &str,
    options: VerifyOptions,
    jobs: usize,
) -> BatchStats {
    let lane = lane.to_uppercase();
    let ids = verifier.store().lane_issue_ids(&lane);

    println!("Lane {} ({} issues)", lane, ids.len());
    let reports = verify_batch(Arc::clone(verifier), &ids, options, jobs).await;
    for report in &reports {
        println!("{}", format_lane_line(report));
    }

    let stats = BatchStats::from_reports(&reports);
    print!("{}", format_summary(&format!("Lane {} summary", lane), &stats));
    stats
}
