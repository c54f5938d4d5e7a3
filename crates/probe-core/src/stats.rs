use crate::outcome::{Phase, RequestOutcome};
use serde::{Deserialize, Serialize};

/// `count / total`, or 0 for an empty population.
pub fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Success / throttled / other-error tallies over any set of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub total: usize,
    pub successful: usize,
    pub throttled: usize,
    pub errors: usize,
}

impl OutcomeCounts {
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a RequestOutcome>) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            counts.total += 1;
            if outcome.success {
                counts.successful += 1;
            }
            if outcome.throttled {
                counts.throttled += 1;
            }
        }
        counts.errors = counts.total - counts.successful - counts.throttled;
        counts
    }

    pub fn success_rate(&self) -> f64 {
        rate(self.successful, self.total)
    }

    pub fn throttle_rate(&self) -> f64 {
        rate(self.throttled, self.total)
    }

    pub fn error_rate(&self) -> f64 {
        rate(self.errors, self.total)
    }
}

/// Per-phase summary as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub total: usize,
    pub successful: usize,
    pub throttled: usize,
    pub errors: usize,
    pub success_rate: f64,
    pub throttle_rate: f64,
    pub error_rate: f64,
}

impl PhaseSummary {
    pub fn from_outcomes(phase: Phase, outcomes: &[RequestOutcome]) -> Self {
        let counts = OutcomeCounts::tally(outcomes);
        Self {
            phase,
            total: counts.total,
            successful: counts.successful,
            throttled: counts.throttled,
            errors: counts.errors,
            success_rate: counts.success_rate(),
            throttle_rate: counts.throttle_rate(),
            error_rate: counts.error_rate(),
        }
    }
}

/// Occurrences of one exact status code within a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusCount {
    pub status: u16,
    pub count: usize,
    pub rate: f64,
}

impl StatusCount {
    pub fn of(outcomes: &[RequestOutcome], status: u16) -> Self {
        let count = outcomes.iter().filter(|o| o.status == status).count();
        Self {
            status,
            count,
            rate: rate(count, outcomes.len()),
        }
    }
}

/// Latency of successful requests, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl LatencyStats {
    /// `None` when no request in the set succeeded.
    pub fn of_successful(outcomes: &[RequestOutcome]) -> Option<Self> {
        let times: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| o.elapsed_time)
            .collect();

        if times.is_empty() {
            return None;
        }

        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = times.iter().sum::<f64>() / times.len() as f64;

        Some(Self { min, avg, max })
    }
}

/// First `limit` responses that were neither successes nor 429s.
/// Transport failures (status 0) are skipped.
pub fn error_samples(outcomes: &[RequestOutcome], limit: usize) -> Vec<&RequestOutcome> {
    outcomes
        .iter()
        .filter(|o| o.status != 0 && o.is_error())
        .take(limit)
        .collect()
}
