use crate::executor::execute_request;
use crate::outcome::{Phase, RequestOutcome};
use crate::transport::Transport;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Send `count` GETs with ids `0..count`, at most `max_in_flight` at a time.
///
/// Every request is spawned up front and waits on the semaphore before
/// touching the transport. Handles are awaited in id order, so the returned
/// outcomes are in submission order whatever order they completed in.
pub async fn dispatch_phase(
    transport: Arc<dyn Transport>,
    url: &str,
    count: usize,
    phase: Phase,
    max_in_flight: usize,
) -> Result<Vec<RequestOutcome>> {
    anyhow::ensure!(max_in_flight > 0, "max_in_flight must be at least 1");

    let semaphore = Arc::new(Semaphore::new(max_in_flight));
    let url: Arc<str> = Arc::from(url);

    let handles: Vec<JoinHandle<Result<RequestOutcome>>> = (0..count)
        .map(|request_id| {
            let semaphore = semaphore.clone();
            let transport = transport.clone();
            let url = url.clone();

            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let outcome = execute_request(transport.as_ref(), &url, request_id, phase).await;
                Ok::<_, anyhow::Error>(outcome)
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(count);
    for handle in handles {
        let outcome = handle
            .await
            .with_context(|| format!("{phase} request task aborted"))??;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
