use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BURST_REQUESTS: usize = 200;
pub const DEFAULT_STEADY_REQUESTS: usize = 100;
pub const DEFAULT_REFILL_WAIT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 50;
/// Total per-request budget, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
pub const RESULTS_FILE: &str = "python-test-results.json";

/// Tunables for one probe run.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Requests sent in the burst phase
    pub burst_requests: usize,
    /// Requests sent in the steady phase
    pub steady_requests: usize,
    /// Pause between phases so a token bucket can refill
    pub refill_wait: Duration,
    /// Maximum concurrent in-flight requests within a phase
    pub max_in_flight: usize,
    /// Per-request timeout; expiry is recorded as a transport failure
    pub request_timeout: Duration,
    /// Where the JSON report is written (overwritten if present)
    pub output_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            burst_requests: DEFAULT_BURST_REQUESTS,
            steady_requests: DEFAULT_STEADY_REQUESTS,
            refill_wait: DEFAULT_REFILL_WAIT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            output_path: PathBuf::from(RESULTS_FILE),
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            anyhow::bail!("max_in_flight must be at least 1");
        }
        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be non-zero");
        }
        Ok(())
    }
}

/// Parse the probe target; only absolute http(s) URLs are accepted.
pub fn parse_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("Target URL must be http:// or https:// (got scheme {other})"),
    }
    if url.host_str().is_none() {
        anyhow::bail!("Target URL must include a host (got {raw})");
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_probe_schedule() {
        let config = ProbeConfig::default();
        assert_eq!(config.burst_requests, 200);
        assert_eq!(config.steady_requests, 100);
        assert_eq!(config.refill_wait, Duration::from_secs(3));
        assert_eq!(config.max_in_flight, 50);
        assert_eq!(config.output_path, PathBuf::from("python-test-results.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_in_flight_rejected() {
        let config = ProbeConfig {
            max_in_flight: 0,
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_target_url() {
        let url = parse_target_url("https://abc123.execute-api.us-east-1.amazonaws.com/prod/test")
            .unwrap();
        assert_eq!(url.path(), "/prod/test");

        assert!(parse_target_url("http://127.0.0.1:3000/test").is_ok());
        assert!(parse_target_url("ftp://example.com/file").is_err());
        assert!(parse_target_url("not a url").is_err());
        assert!(parse_target_url("/relative/path").is_err());
    }
}
