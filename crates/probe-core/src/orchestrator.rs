use crate::analysis::ProbeAnalysis;
use crate::config::ProbeConfig;
use crate::outcome::Phase;
use crate::phase::{run_phase, PhaseRun};
use crate::report::{ensure_writable, TestReport};
use crate::transport::Transport;
use anyhow::Result;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::info;

/// A finished probe: both phases, the aggregation and the persisted report.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub burst: PhaseRun,
    pub steady: PhaseRun,
    pub analysis: ProbeAnalysis,
    pub report: TestReport,
}

/// Burst, cooldown, steady, aggregate, write.
///
/// `connect` is called once per phase; each phase gets its own transport.
/// The report is only written after both phases finished, so an interrupted
/// run leaves no file behind.
pub async fn run_probe<C>(url: &str, config: &ProbeConfig, connect: C) -> Result<ProbeRun>
where
    C: Fn() -> Result<Arc<dyn Transport>>,
{
    config.validate()?;
    ensure_writable(&config.output_path)?;

    info!("Starting rate limit test against {}", url);
    info!(
        "Burst phase: {} requests, steady phase: {} requests, refill wait: {:?}",
        config.burst_requests, config.steady_requests, config.refill_wait
    );

    let burst = run_phase(
        &connect,
        url,
        config.burst_requests,
        Phase::Burst,
        config.max_in_flight,
    )
    .await?;

    info!(
        "Waiting {:?} for token bucket to refill...",
        config.refill_wait
    );
    sleep(config.refill_wait).await;

    let steady = run_phase(
        &connect,
        url,
        config.steady_requests,
        Phase::Steady,
        config.max_in_flight,
    )
    .await?;

    let analysis = ProbeAnalysis::new(&burst, &steady);
    info!(
        total = analysis.totals.total,
        throttled = analysis.totals.throttled,
        burst_500 = analysis.burst_500.count,
        steady_500 = analysis.steady_500.count,
        verdict = %analysis.verdict,
        "Probe complete"
    );

    let report = TestReport::new(url, config, &burst, &steady, &analysis.totals);
    report.write_to(&config.output_path)?;
    info!("Results saved to {}", config.output_path.display());

    Ok(ProbeRun {
        burst,
        steady,
        analysis,
        report,
    })
}
