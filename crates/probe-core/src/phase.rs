use crate::dispatcher::dispatch_phase;
use crate::outcome::{Phase, RequestOutcome};
use crate::stats::{LatencyStats, PhaseSummary};
use crate::transport::Transport;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Outcomes of one phase plus what was derived from them.
#[derive(Debug, Clone)]
pub struct PhaseRun {
    pub phase: Phase,
    pub outcomes: Vec<RequestOutcome>,
    pub summary: PhaseSummary,
    pub latency: Option<LatencyStats>,
}

impl PhaseRun {
    pub fn from_outcomes(phase: Phase, outcomes: Vec<RequestOutcome>) -> Self {
        let summary = PhaseSummary::from_outcomes(phase, &outcomes);
        let latency = LatencyStats::of_successful(&outcomes);
        Self {
            phase,
            outcomes,
            summary,
            latency,
        }
    }
}

/// Run one labeled batch of `count` requests on a freshly connected
/// transport. The transport is dropped when the phase ends.
pub async fn run_phase<C>(
    connect: &C,
    url: &str,
    count: usize,
    phase: Phase,
    max_in_flight: usize,
) -> Result<PhaseRun>
where
    C: Fn() -> Result<Arc<dyn Transport>>,
{
    let transport = connect().with_context(|| format!("Failed to open {phase} phase transport"))?;
    info!(
        "Sending {} requests in {} phase (transport={}, max_in_flight={})",
        count,
        phase,
        transport.name(),
        max_in_flight
    );

    let started = Instant::now();
    let outcomes = dispatch_phase(transport, url, count, phase, max_in_flight).await?;
    let run = PhaseRun::from_outcomes(phase, outcomes);

    info!(
        phase = %phase,
        total = run.summary.total,
        successful = run.summary.successful,
        throttled = run.summary.throttled,
        errors = run.summary.errors,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Phase complete"
    );

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_phase_summarizes() {
        let shared = Arc::new(ScriptedTransport::new(|call| {
            Ok(crate::test_support::json_response(if call % 4 == 0 { 429 } else { 200 }))
        }));
        let connect = {
            let shared = shared.clone();
            move || -> Result<Arc<dyn Transport>> { Ok(shared.clone()) }
        };

        let run = run_phase(&connect, "http://gateway/test", 40, Phase::Burst, 8)
            .await
            .unwrap();

        assert_eq!(run.phase, Phase::Burst);
        assert_eq!(run.outcomes.len(), 40);
        assert_eq!(run.summary.total, 40);
        assert_eq!(run.summary.throttled, 10);
        assert_eq!(run.summary.successful, 30);
        assert_eq!(run.summary.errors, 0);
        assert!(run.latency.is_some());
    }

    #[tokio::test]
    async fn test_each_phase_connects_once() {
        let connects = Arc::new(AtomicUsize::new(0));
        let connect = {
            let connects = connects.clone();
            move || -> Result<Arc<dyn Transport>> {
                connects.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(ScriptedTransport::status(200)))
            }
        };

        run_phase(&connect, "http://gateway/test", 5, Phase::Burst, 2)
            .await
            .unwrap();
        run_phase(&connect, "http://gateway/test", 5, Phase::Steady, 2)
            .await
            .unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let connect = || -> Result<Arc<dyn Transport>> { anyhow::bail!("no client") };
        let result = run_phase(&connect, "http://gateway/test", 5, Phase::Burst, 2).await;
        assert!(result.is_err());
    }
}
