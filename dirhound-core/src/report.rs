// Report generation from a finished scan

use anyhow::{Context, Result, anyhow};
use dirhound_scanner::{ProbeResult, ScanReport};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "log" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(anyhow!(
                "unsupported report format '{}' (expected text, json or csv)",
                other
            )),
        }
    }
}

impl ReportFormat {
    /// Guess the format from a file extension, defaulting to text.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or(ReportFormat::Text)
    }

    pub fn render(&self, report: &ScanReport, target: &str) -> Result<String> {
        match self {
            ReportFormat::Text => Ok(generate_text_report(report, target)),
            ReportFormat::Json => generate_json_report(report, target),
            ReportFormat::Csv => generate_csv_report(report),
        }
    }
}

/// Totals broken down by status class, plus failures and timing.
pub fn generate_summary(report: &ScanReport) -> String {
    let results = &report.results;
    let mut summary = String::new();

    let _ = writeln!(summary, "Scan {} in {:.2}s", report.phase, report.elapsed.as_secs_f64());
    let rows = [
        ("Total paths discovered:", results.len()),
        ("2xx Success responses:", results.count_in(200..=299)),
        ("3xx Redirection:", results.count_in(300..=399)),
        ("4xx Client errors:", results.count_in(400..=499)),
        ("5xx Server errors:", results.count_in(500..=599)),
        ("Requests sent:", report.probed),
        ("Failed tasks:", report.failed),
    ];
    for (label, count) in rows {
        let _ = writeln!(summary, "  {:<25}{}", label, count);
    }

    summary
}

pub fn generate_text_report(report: &ScanReport, target: &str) -> String {
    let mut text = String::new();
    let rule = "═".repeat(79);

    let _ = writeln!(text, "{}", rule);
    let _ = writeln!(text, "  dirhound results for {}", target);
    let _ = writeln!(text, "{}\n", rule);
    text.push_str(&generate_summary(report));
    text.push('\n');

    for result in report.results.sorted() {
        let _ = write!(
            text,
            "{}  {:>9}B  {:>7.3}s  {}",
            result.status_code,
            result.content_length,
            result.elapsed.as_secs_f64(),
            result.url
        );
        if let Some(ref ct) = result.content_type {
            let short_ct = ct.split(';').next().unwrap_or(ct);
            let _ = write!(text, "  [{}]", short_ct.trim());
        }
        text.push('\n');
    }

    text
}

pub fn generate_json_report(report: &ScanReport, target: &str) -> Result<String> {
    let json_report = serde_json::json!({
        "target": target,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "outcome": report.phase.to_string(),
        "elapsed_seconds": report.elapsed.as_secs_f64(),
        "requests": report.probed,
        "failed": report.failed,
        "total": report.results.len(),
        "results": report.results.sorted(),
    });

    serde_json::to_string_pretty(&json_report).context("Failed to serialize JSON report")
}

const CSV_HEADER: [&str; 5] = ["url", "status", "content_length", "response_time", "content_type"];

#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    status: u16,
    content_length: u64,
    response_time: String,
    content_type: &'a str,
}

impl<'a> From<&'a ProbeResult> for CsvRow<'a> {
    fn from(result: &'a ProbeResult) -> Self {
        Self {
            url: &result.url,
            status: result.status_code,
            content_length: result.content_length,
            response_time: format!("{:.3}", result.elapsed.as_secs_f64()),
            content_type: result.content_type.as_deref().unwrap_or(""),
        }
    }
}

pub fn generate_csv_report(report: &ScanReport) -> Result<String> {
    // header written by hand so an empty scan still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;
    for result in report.results.sorted() {
        writer
            .serialize(CsvRow::from(result))
            .context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV report: {}", e))?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write report {}", path.display()))
}
