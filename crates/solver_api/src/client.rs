use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;

use crate::config::SolverApiConfig;
use crate::error::{parse_error_message, SolverApiError};
use crate::ndjson::{NdjsonStreamParser, StreamEvent};
use crate::payload::{FeedbackAck, FeedbackRequest, HealthStatus, SolveRequest, SolveResponse};
use crate::url::{feedback_url, health_url, solve_stream_url, solve_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct SolverApiClient {
    http: Client,
    config: SolverApiConfig,
}

/// Collected outcome of one streaming solve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub events: Vec<StreamEvent>,
    /// True when the service emitted its `done` frame before closing.
    pub done: bool,
}

impl SolverApiClient {
    pub fn new(config: SolverApiConfig) -> Result<Self, SolverApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config.user_agent.as_deref() {
            builder = builder.user_agent(user_agent.to_string());
        }

        let http = builder.build().map_err(SolverApiError::from)?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &SolverApiConfig {
        &self.config
    }

    /// Submits one question and awaits the whole structured response.
    ///
    /// Single request per call; failures surface immediately because a
    /// re-asked question is not assumed safe without server-side
    /// idempotency.
    pub async fn solve(
        &self,
        question: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<SolveResponse, SolverApiError> {
        let request = self
            .http
            .post(solve_url(&self.config.base_url))
            .json(&SolveRequest::new(question));
        let response = self.send_checked(request, cancellation).await?;

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .map_err(SolverApiError::from)?;
        serde_json::from_str::<SolveResponse>(&body)
            .map_err(|error| SolverApiError::MalformedResponse(error.to_string()))
    }

    /// Streams one question as newline-delimited JSON events.
    ///
    /// Returns true when the service emitted its `done` frame before the
    /// stream closed. An `error` frame aborts the call with
    /// `SolverApiError::Stream`.
    pub async fn solve_stream_with_handler<F>(
        &self,
        question: &str,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<bool, SolverApiError>
    where
        F: FnMut(StreamEvent),
    {
        let request = self
            .http
            .post(solve_stream_url(&self.config.base_url))
            .json(&SolveRequest::streaming(question));
        let response = self.send_checked(request, cancellation).await?;

        let mut bytes = response.bytes_stream();
        let mut parser = NdjsonStreamParser::default();
        let mut done = false;

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(SolverApiError::Cancelled);
            }
            let chunk = chunk.map_err(SolverApiError::from)?;
            for event in parser.feed(&chunk) {
                if let StreamEvent::Error(message) = &event {
                    return Err(SolverApiError::Stream(message.clone()));
                }
                if matches!(event, StreamEvent::Done) {
                    done = true;
                }
                on_event(event);
            }
        }

        if is_cancelled(cancellation) {
            return Err(SolverApiError::Cancelled);
        }

        Ok(done)
    }

    pub async fn solve_stream(
        &self,
        question: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamOutcome, SolverApiError> {
        let mut events = Vec::new();
        let done = self
            .solve_stream_with_handler(question, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamOutcome { events, done })
    }

    /// Submits a rating for one answered question. The acknowledgement
    /// body is decoded leniently and never fails the call.
    pub async fn send_feedback(
        &self,
        feedback: &FeedbackRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<FeedbackAck, SolverApiError> {
        let request = self
            .http
            .post(feedback_url(&self.config.base_url))
            .json(feedback);
        let response = self.send_checked(request, cancellation).await?;

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .map_err(SolverApiError::from)?;
        Ok(serde_json::from_str::<FeedbackAck>(&body).unwrap_or_default())
    }

    /// Probes service liveness.
    pub async fn health(&self) -> Result<HealthStatus, SolverApiError> {
        let request = self.http.get(health_url(&self.config.base_url));
        let response = self.send_checked(request, None).await?;

        response
            .json::<HealthStatus>()
            .await
            .map_err(SolverApiError::from)
    }

    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<reqwest::Response, SolverApiError> {
        if is_cancelled(cancellation) {
            return Err(SolverApiError::Cancelled);
        }

        let response = await_or_cancel(request.send(), cancellation)
            .await?
            .map_err(SolverApiError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(SolverApiError::Status(
            status,
            parse_error_message(status, &body),
        ))
    }
}

fn is_cancelled(cancellation: Option<&CancellationSignal>) -> bool {
    cancellation.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, SolverApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(SolverApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(SolverApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
