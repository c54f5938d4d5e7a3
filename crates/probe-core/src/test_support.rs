//! In-memory transports for exercising dispatch and orchestration.

use crate::transport::{Transport, TransportError, TransportFuture, TransportResponse};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

type Responder = Box<dyn Fn(usize) -> Result<TransportResponse, TransportError> + Send + Sync>;
type DelayFn = Box<dyn Fn(usize) -> Duration + Send + Sync>;

/// Answers each call with `respond(call_index)`, where the index counts
/// calls entering the transport across its whole lifetime. Tracks how many
/// calls are inside `get` at once.
pub(crate) struct ScriptedTransport {
    respond: Responder,
    delay: DelayFn,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    started: Mutex<Vec<Instant>>,
    finished: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(usize) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            delay: Box::new(|_| Duration::ZERO),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    /// Every call answers `status` with a small JSON body.
    pub(crate) fn status(status: u16) -> Self {
        Self::new(move |_| Ok(json_response(status)))
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_fn(move |_| delay)
    }

    /// Per-call latency, keyed by call index.
    pub(crate) fn with_delay_fn<F>(mut self, delay: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn call_starts(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }

    /// Completion instants, in completion order.
    pub(crate) fn call_ends(&self) -> Vec<Instant> {
        self.finished.lock().unwrap().clone()
    }
}

pub(crate) fn json_response(status: u16) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: format!(r#"{{"status": {status}}}"#),
        time_to_headers: None,
    }
}

/// One-shot HTTP server that sends a 200 status line and headers at once,
/// then waits `body_delay` before sending the `{}` body.
pub(crate) fn slow_body_server(body_delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }

        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\n\r\n",
            )
            .unwrap();
        stream.flush().unwrap();
        std::thread::sleep(body_delay);
        stream.write_all(b"{}").unwrap();
        stream.flush().unwrap();
    });

    addr
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn get<'a>(&'a self, _url: &'a str) -> TransportFuture<'a> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.lock().unwrap().push(Instant::now());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = (self.delay)(call);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().push(Instant::now());
            (self.respond)(call)
        })
    }
}
