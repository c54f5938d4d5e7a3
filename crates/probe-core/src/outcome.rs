use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Burst,
    Steady,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Burst => "burst",
            Phase::Steady => "steady",
        }
    }

    /// Capitalized label for console headings.
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Burst => "Burst",
            Phase::Steady => "Steady",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single GET. Exactly one of success, throttled or
/// "other error" holds for every outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub request_id: usize,
    pub phase: Phase,
    /// HTTP status, or 0 when no response was received
    pub status: u16,
    /// Seconds from call start until the response headers arrived
    pub elapsed_time: f64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
    pub throttled: bool,
}

impl RequestOutcome {
    /// Outcome for a response that arrived with a readable body.
    pub fn from_response(
        request_id: usize,
        phase: Phase,
        status: u16,
        elapsed: Duration,
        body: Value,
    ) -> Self {
        Self {
            request_id,
            phase,
            status,
            elapsed_time: elapsed.as_secs_f64(),
            timestamp: timestamp_now(),
            response: Some(body),
            error: None,
            success: status != 0 && status < 400,
            throttled: status == STATUS_TOO_MANY_REQUESTS,
        }
    }

    /// Outcome for a failed call. `status` is kept when the failure still
    /// carried one, otherwise recorded as 0.
    pub fn from_failure(
        request_id: usize,
        phase: Phase,
        status: Option<u16>,
        elapsed: Duration,
        error: String,
    ) -> Self {
        let status = status.unwrap_or(0);
        Self {
            request_id,
            phase,
            status,
            elapsed_time: elapsed.as_secs_f64(),
            timestamp: timestamp_now(),
            response: None,
            error: Some(error),
            success: false,
            throttled: status == STATUS_TOO_MANY_REQUESTS,
        }
    }

    /// Neither a success nor a 429.
    pub fn is_error(&self) -> bool {
        !self.success && !self.throttled
    }
}

fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Turn a response body into the stored JSON value.
///
/// Bodies are only parsed when the response declares a JSON media type. A
/// JSON object is kept as-is; anything else (other JSON values, undecodable
/// or non-JSON bodies) is wrapped as `{"text": ...}`.
pub fn decode_body(content_type: Option<&str>, body: &str) -> Value {
    let parsed = if content_type.is_some_and(is_json_media_type) {
        if body.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str::<Value>(body).ok()
        }
    } else {
        None
    };

    match parsed {
        Some(Value::Object(map)) => Value::Object(map),
        Some(other) => json!({ "text": other }),
        None => json!({ "text": body }),
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
