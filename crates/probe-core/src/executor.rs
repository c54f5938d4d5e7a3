use crate::outcome::{decode_body, Phase, RequestOutcome};
use crate::transport::Transport;
use std::time::Instant;
use tracing::debug;

/// Issue one GET and record what happened. Never fails: every transport
/// error becomes an outcome.
///
/// Elapsed time runs until the response headers arrived, if the transport
/// reports that instant. The timestamp is taken after the body was read.
pub async fn execute_request(
    transport: &dyn Transport,
    url: &str,
    request_id: usize,
    phase: Phase,
) -> RequestOutcome {
    let start = Instant::now();

    match transport.get(url).await {
        Ok(response) => {
            let elapsed = response.time_to_headers.unwrap_or_else(|| start.elapsed());
            let body = decode_body(response.content_type.as_deref(), &response.body);
            RequestOutcome::from_response(request_id, phase, response.status, elapsed, body)
        }
        Err(err) => {
            let elapsed = err.time_to_headers.unwrap_or_else(|| start.elapsed());
            debug!(
                request_id,
                %phase,
                status = ?err.status,
                "request failed: {}",
                err.message
            );
            RequestOutcome::from_failure(request_id, phase, err.status, elapsed, err.to_string())
        }
    }
}
