use crate::outcome::STATUS_INTERNAL_SERVER_ERROR;
use crate::phase::PhaseRun;
use crate::stats::{OutcomeCounts, StatusCount};
use std::fmt;

/// Informational judgement of whether the target enforces a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Working,
    NotClearlyWorking,
}

impl Verdict {
    /// Any 429 at all, proportionally more 500s under burst than steady, or
    /// fewer burst successes than steady successes counts as a limiter at
    /// work. Gateways that shed load with 500s instead of 429s pass via the
    /// second clause.
    pub fn judge(
        total_throttled: usize,
        burst_500_rate: f64,
        steady_500_rate: f64,
        burst_successful: usize,
        steady_successful: usize,
    ) -> Self {
        if total_throttled > 0
            || burst_500_rate > steady_500_rate
            || burst_successful < steady_successful
        {
            Verdict::Working
        } else {
            Verdict::NotClearlyWorking
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, Verdict::Working)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Working => f.write_str("working"),
            Verdict::NotClearlyWorking => f.write_str("not clearly working"),
        }
    }
}

/// Cross-phase aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeAnalysis {
    pub totals: OutcomeCounts,
    pub burst_500: StatusCount,
    pub steady_500: StatusCount,
    pub verdict: Verdict,
}

impl ProbeAnalysis {
    pub fn new(burst: &PhaseRun, steady: &PhaseRun) -> Self {
        let totals = OutcomeCounts::tally(burst.outcomes.iter().chain(steady.outcomes.iter()));
        let burst_500 = StatusCount::of(&burst.outcomes, STATUS_INTERNAL_SERVER_ERROR);
        let steady_500 = StatusCount::of(&steady.outcomes, STATUS_INTERNAL_SERVER_ERROR);

        let verdict = Verdict::judge(
            totals.throttled,
            burst_500.rate,
            steady_500.rate,
            burst.summary.successful,
            steady.summary.successful,
        );

        Self {
            totals,
            burst_500,
            steady_500,
            verdict,
        }
    }
}
