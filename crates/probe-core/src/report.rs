use crate::config::ProbeConfig;
use crate::outcome::RequestOutcome;
use crate::phase::PhaseRun;
use crate::stats::{OutcomeCounts, PhaseSummary};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

/// Everything one probe run produced, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub timestamp: String,
    pub api_url: String,
    pub configuration: ReportConfiguration,
    pub summary: ReportSummary,
    /// Burst outcomes in submission order, then steady outcomes
    pub requests: Vec<RequestOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfiguration {
    pub burst_requests: usize,
    pub steady_requests: usize,
    /// Seconds; an integer when the wait is whole seconds
    pub refill_wait_time: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_requests: usize,
    pub total_successful: usize,
    pub total_throttled: usize,
    pub total_errors: usize,
    pub burst_phase: PhaseSummary,
    pub steady_phase: PhaseSummary,
}

impl TestReport {
    pub fn new(
        api_url: &str,
        config: &ProbeConfig,
        burst: &PhaseRun,
        steady: &PhaseRun,
        totals: &OutcomeCounts,
    ) -> Self {
        let requests = burst
            .outcomes
            .iter()
            .chain(steady.outcomes.iter())
            .cloned()
            .collect();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            api_url: api_url.to_string(),
            configuration: ReportConfiguration {
                burst_requests: config.burst_requests,
                steady_requests: config.steady_requests,
                refill_wait_time: wait_seconds(config.refill_wait),
            },
            summary: ReportSummary {
                total_requests: totals.total,
                total_successful: totals.successful,
                total_throttled: totals.throttled,
                total_errors: totals.errors,
                burst_phase: burst.summary.clone(),
                steady_phase: steady.summary.clone(),
            },
            requests,
        }
    }

    /// Write as 2-space indented JSON, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        let report = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse report {}", path.display()))?;
        Ok(report)
    }
}

fn wait_seconds(wait: Duration) -> Number {
    if wait.subsec_nanos() == 0 {
        Number::from(wait.as_secs())
    } else {
        Number::from_f64(wait.as_secs_f64()).unwrap_or_else(|| Number::from(wait.as_secs()))
    }
}

/// Fail early if the report could not be written at the end of the run.
///
/// Creates and removes a scratch file in the output directory, and opens an
/// existing report for writing without truncating it. No report file is
/// left behind.
pub fn ensure_writable(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let dir_meta = std::fs::metadata(dir)
        .with_context(|| format!("Output directory {} is not accessible", dir.display()))?;
    if !dir_meta.is_dir() {
        anyhow::bail!("Output directory {} is not a directory", dir.display());
    }

    tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Output directory {} is not writable", dir.display()))?;

    if let Ok(meta) = std::fs::metadata(path) {
        if meta.is_dir() {
            anyhow::bail!("Output path {} is a directory", path.display());
        }
        OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("Output file {} is not writable", path.display()))?;
    }

    Ok(())
}
