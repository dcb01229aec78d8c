//! agreement-md — parse, check and canonicalize AGREEMENT.md files.
//!
//! Supports two modes:
//!
//! - **stdin mode**: `agreement-md < AGREEMENT.md` prints the canonical form
//!   (or JSON with `-f json`) on stdout.
//! - **file mode**: `agreement-md --write evals/*/AGREEMENT.md` checks every
//!   file and optionally rewrites it in canonical form.

use agreement_md::render;
use agreement_md::{parse_agreement, serialize_agreement, validate, AgreementDocument};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "agreement-md",
    about = "Parse, check and canonicalize AGREEMENT.md evaluation files"
)]
struct Cli {
    /// Input files (glob patterns and directories supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Output format for stdin mode: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Rewrite each file in canonical form
    #[arg(short = 'w', long)]
    write: bool,

    /// Treat consistency issues (e.g. summary counts) as failures
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.files.is_empty() {
        return stdin_mode(&cli);
    }

    file_mode(&cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// stdin mode: parse stdin, render to stdout.
fn stdin_mode(cli: &Cli) -> Result<()> {
    let renderer = render::create_renderer(&cli.format)?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let doc = parse_agreement(&input).context("failed to parse agreement from stdin")?;
    if !report_issues("<stdin>", &doc) && cli.strict {
        anyhow::bail!("<stdin>: consistency check failed");
    }
    print!("{}", renderer.render(&doc)?);
    Ok(())
}

/// file mode: check every file, optionally rewriting it in canonical form.
fn file_mode(cli: &Cli) -> Result<()> {
    let input_files = expand_globs(&cli.files)?;
    if input_files.is_empty() {
        anyhow::bail!("no AGREEMENT.md files found");
    }

    let mut failed = 0;
    for path in &input_files {
        match check_file(path, cli) {
            Ok(true) => {}
            Ok(false) => failed += 1,
            Err(e) => {
                eprintln!("error: {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, input_files.len());
    }
    Ok(())
}

/// Check one file. Returns `Ok(false)` when the file parsed but failed the
/// strict consistency check.
fn check_file(path: &Path, cli: &Cli) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = parse_agreement(&content)?;
    let label = path.display().to_string();
    let consistent = report_issues(&label, &doc);

    if cli.write {
        let canonical = serialize_agreement(&doc);
        if canonical != content {
            fs::write(path, &canonical)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(file = %label, "rewrote in canonical form");
        }
    }

    Ok(consistent || !cli.strict)
}

/// Print consistency issues as warnings. Returns true when there are none.
fn report_issues(label: &str, doc: &AgreementDocument) -> bool {
    let issues = validate(doc);
    for issue in &issues {
        eprintln!("warning: {}: {}", label, issue);
    }
    issues.is_empty()
}

/// File name looked for when a directory is given.
const AGREEMENT_FILE: &str = "AGREEMENT.md";

/// Expand glob patterns into a list of real file paths.
/// Bare directories are scanned (non-recursively) for AGREEMENT.md and for
/// sub-directories containing one.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let own = path.join(AGREEMENT_FILE);
            if own.is_file() {
                files.push(own);
            }
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let candidate = entry.path().join(AGREEMENT_FILE);
                if candidate.is_file() {
                    files.push(candidate);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}
