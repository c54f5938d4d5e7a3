use anyhow::Result;
use clap::Parser;
use probe_core::{
    error_samples, parse_target_url, run_probe, HttpTransport, PhaseRun, ProbeConfig, ProbeRun,
    RequestOutcome, Transport,
};
use std::sync::Arc;
use tracing::info;

const ERROR_SAMPLE_LIMIT: usize = 3;
const SAMPLE_BODY_CHARS: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "rate-probe")]
#[command(version)]
#[command(about = "Test an HTTP endpoint's rate limiting with a burst phase and a steady phase")]
struct Args {
    /// API Gateway URL to test
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    parse_target_url(&args.url)?;

    let config = ProbeConfig::default();
    print_configuration(&args.url, &config);

    let timeout = config.request_timeout;
    let connect = move || -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(timeout)?))
    };

    let run = run_probe(&args.url, &config, connect).await?;

    print_phase(&run.burst);
    print_phase(&run.steady);
    print_overall(&run);
    print_error_samples(&run.burst.outcomes);

    println!("\nResults saved to {}", config.output_path.display());
    info!("Done");

    Ok(())
}

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn print_configuration(url: &str, config: &ProbeConfig) {
    println!("Starting rate limit test against {url}");
    println!("Test configuration:");
    println!("- Burst phase: {} requests", config.burst_requests);
    println!("- Steady phase: {} requests", config.steady_requests);
    println!(
        "- Refill wait time: {} seconds",
        config.refill_wait.as_secs_f64()
    );
    println!("- Max concurrent requests: {}", config.max_in_flight);
}

fn print_phase(run: &PhaseRun) {
    let s = &run.summary;
    println!("\n{} Phase Results:", run.phase.title());
    println!("Total Requests: {}", s.total);
    println!(
        "Successful Requests: {} ({})",
        s.successful,
        pct(s.success_rate)
    );
    println!(
        "Throttled Requests (429): {} ({})",
        s.throttled,
        pct(s.throttle_rate)
    );
    println!("Other Errors: {} ({})", s.errors, pct(s.error_rate));

    if let Some(latency) = run.latency {
        println!(
            "Response Times (successful requests): min={:.3}s, avg={:.3}s, max={:.3}s",
            latency.min, latency.avg, latency.max
        );
    }
}

fn print_overall(run: &ProbeRun) {
    let totals = &run.analysis.totals;
    let burst = &run.burst.summary;
    let steady = &run.steady.summary;

    println!("\nOverall Test Results:");
    println!("Total Requests: {}", totals.total);
    println!(
        "Total Successful: {} ({})",
        totals.successful,
        pct(totals.success_rate())
    );
    println!(
        "Total Throttled: {} ({})",
        totals.throttled,
        pct(totals.throttle_rate())
    );
    println!(
        "Total Errors: {} ({})",
        totals.errors,
        pct(totals.error_rate())
    );

    let burst_500 = &run.analysis.burst_500;
    let steady_500 = &run.analysis.steady_500;
    println!(
        "\nBurst phase 500 errors: {} ({})",
        burst_500.count,
        pct(burst_500.rate)
    );
    println!(
        "Steady phase 500 errors: {} ({})",
        steady_500.count,
        pct(steady_500.rate)
    );

    if run.analysis.verdict.is_working() {
        println!("\nRate limiting is working! The endpoint is enforcing the configured limits.");
        println!(
            "Burst phase error rate: {}, Steady phase error rate: {}",
            pct(burst.error_rate),
            pct(steady.error_rate)
        );
        println!(
            "Burst phase success rate: {}, Steady phase success rate: {}",
            pct(burst.success_rate),
            pct(steady.success_rate)
        );
        if burst_500.rate > steady_500.rate {
            println!("\nThe endpoint is returning 500 errors instead of 429 throttling responses.");
            println!("This is a common behavior when an API gateway is under high load.");
        }
    } else {
        println!(
            "\nRate limiting may not be working as expected. No clear evidence of throttling."
        );
    }
}

fn print_error_samples(burst: &[RequestOutcome]) {
    let samples = error_samples(burst, ERROR_SAMPLE_LIMIT);
    if samples.is_empty() {
        return;
    }

    println!("\nError Response Samples:");
    for (i, sample) in samples.iter().enumerate() {
        let body = match (&sample.response, &sample.error) {
            (Some(response), _) => response.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        println!("Sample {}:", i + 1);
        println!("  Request: {}", sample.request_id);
        println!("  Status Code: {}", sample.status);
        println!("  Data: {}", truncate(&body, SAMPLE_BODY_CHARS));
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
