use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use dirhound_core::report::{ReportFormat, generate_summary, save_report};
use dirhound_core::scan::{ScanOptions, execute_scan};
use dirhound_core::wordlist::{load_user_agents, load_wordlist, parse_lines};
use dirhound_scanner::policy::{parse_cookies, parse_header, parse_match_codes};
use dirhound_scanner::{CancelSignal, HttpMethod, RequestPolicy};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/dirhound/";
pub const BUNDLED_WORDLIST: &str = include_str!("../wordlists/default.txt");
pub const BUNDLED_USER_AGENTS: &str = include_str!("../wordlists/user-agents.txt");

const WORDLIST_FILE: &str = "default.txt";
const USER_AGENTS_FILE: &str = "user-agents.txt";

/// Expand `~` in a configuration directory argument.
pub fn expand_config_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn wordlist_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("wordlists")
}

/// Explicit file, then the installed wordlist, then the bundled one.
pub fn load_candidates(explicit: Option<&PathBuf>, config_dir: &Path) -> Result<Vec<String>> {
    if let Some(path) = explicit {
        return load_wordlist(path);
    }

    let installed = wordlist_dir(config_dir).join(WORDLIST_FILE);
    if installed.exists() {
        debug!("Using installed wordlist {}", installed.display());
        return load_wordlist(&installed);
    }

    debug!("No installed wordlist, using the bundled list");
    Ok(parse_lines(BUNDLED_WORDLIST))
}

/// Explicit file, then the installed pool. Empty means the scanner default.
pub fn load_agents(explicit: Option<&PathBuf>, config_dir: &Path) -> Result<Vec<String>> {
    if let Some(path) = explicit {
        return load_user_agents(path);
    }

    let installed = wordlist_dir(config_dir).join(USER_AGENTS_FILE);
    if installed.exists() {
        return load_user_agents(&installed);
    }

    Ok(Vec::new())
}

/// Map `scan` arguments onto a validated request policy.
pub fn build_policy(args: &ArgMatches) -> Result<RequestPolicy> {
    let url = args
        .get_one::<String>("url")
        .context("--url is required")?;

    let mut builder = RequestPolicy::builder(url.as_str())
        .follow_redirects(args.get_flag("follow-redirects"))
        .crawl(args.get_flag("crawl"));

    if let Some(method) = args.get_one::<String>("method") {
        builder = builder.method(method.parse::<HttpMethod>()?);
    }
    if let Some(&timeout) = args.get_one::<f64>("timeout") {
        builder = builder.timeout_secs(timeout);
    }
    if let Some(cookies) = args.get_one::<String>("cookies") {
        builder = builder.cookies(parse_cookies(cookies)?);
    }
    if let Some(headers) = args.get_many::<String>("header") {
        for raw in headers {
            let (name, value) = parse_header(raw)?;
            builder = builder.header(name, value);
        }
    }
    if let Some(codes) = args.get_one::<String>("match-codes") {
        builder = builder.match_codes(parse_match_codes(codes)?);
    }
    if let Some(&concurrency) = args.get_one::<usize>("concurrency") {
        builder = builder.concurrency(concurrency);
    }
    if let Some(&retries) = args.get_one::<usize>("retries") {
        builder = builder.retries(retries);
    }
    if let Some(&depth) = args.get_one::<usize>("crawl-depth") {
        builder = builder.crawl_depth(depth);
    }

    builder
        .proxy(args.get_one::<String>("proxy").cloned())
        .rate_limit(args.get_one::<f64>("rate-limit").copied())
        .build()
        .context("Invalid scan configuration")
}

/// Explicit `--format` wins, otherwise guess from the output extension.
pub fn resolve_report_format(format: Option<&String>, output: &Path) -> Result<ReportFormat> {
    match format {
        Some(raw) => raw.parse(),
        None => Ok(ReportFormat::from_path(output)),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

/// Write the bundled wordlists into `<config>/wordlists/`.
pub fn install_wordlists(config_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = wordlist_dir(config_dir);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, content) in [
        (WORDLIST_FILE, BUNDLED_WORDLIST),
        (USER_AGENTS_FILE, BUNDLED_USER_AGENTS),
    ] {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  DIRHOUND INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let config_dir = expand_config_dir(raw_dir);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    let existing: Vec<PathBuf> = [WORDLIST_FILE, USER_AGENTS_FILE]
        .iter()
        .map(|name| wordlist_dir(&config_dir).join(name))
        .filter(|path| path.exists())
        .collect();

    if !existing.is_empty() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Wordlists already installed:");
        for path in &existing {
            println!(
                "  {} {}",
                "•".yellow(),
                path.display().to_string().bright_white()
            );
        }
        println!();

        let response = print_prompt("Overwrite them? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    println!("{} Installing wordlists...", "→".blue());
    for path in install_wordlists(&config_dir)? {
        println!(
            "  {} {}",
            "✓".green(),
            path.display().to_string().bright_white()
        );
    }

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    Ok(())
}

pub async fn handle_scan(args: &ArgMatches, quiet: bool) -> Result<()> {
    let policy = build_policy(args)?;
    let config_dir = expand_config_dir(DEFAULT_CONFIG_DIR);
    let wordlist = load_candidates(args.get_one::<PathBuf>("wordlist"), &config_dir)?;
    let user_agents = load_agents(args.get_one::<PathBuf>("user-agents"), &config_dir)?;

    let output = args.get_one::<PathBuf>("output");
    let format = output
        .map(|path| resolve_report_format(args.get_one::<String>("format"), path))
        .transpose()?;

    let target = policy.base_url().to_string();
    if !quiet {
        print_divider();
        println!("{} {}", "Target:".blue(), target.bright_white());
        println!(
            "{} {} candidates, {} workers, {} {}",
            "Scan:".blue(),
            wordlist.len(),
            policy.concurrency(),
            policy.method(),
            if policy.crawl() {
                format!("(crawl depth {})", policy.crawl_depth())
            } else {
                String::new()
            }
        );
        print_divider();
    }

    let cancel = CancelSignal::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt.cancel() {
                eprintln!(
                    "\n{} Interrupted, waiting for in-flight requests...",
                    "⚠".yellow().bold()
                );
            }
        }
    });

    info!("Starting scan of {}", target);
    let report = execute_scan(
        ScanOptions {
            policy,
            wordlist,
            user_agents,
            show_progress: !quiet,
        },
        cancel,
    )
    .await?;

    if !quiet {
        println!();
        print!("{}", generate_summary(&report));
    }

    if let (Some(path), Some(format)) = (output, format) {
        let content = format.render(&report, &target)?;
        save_report(&content, path)?;
        println!(
            "{} Report saved to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }

    Ok(())
}
