//! HTTP transport client for the remote math solving service.
//!
//! Exposes the non-streaming `/solve` contract as the baseline, the
//! newline-delimited `/solve/stream` mode, the `/feedback` relay, and
//! the `/health` probe. Requests are single-shot: there is no retry
//! layer, and every await point honors an optional shared cancellation
//! flag.

mod client;
mod config;
mod error;
mod ndjson;
mod payload;
mod url;

pub use client::{CancellationSignal, SolverApiClient, StreamOutcome};
pub use config::SolverApiConfig;
pub use error::{parse_error_message, SolverApiError};
pub use ndjson::{NdjsonStreamParser, StreamEvent};
pub use payload::{
    FeedbackAck, FeedbackRequest, HealthStatus, SolveRequest, SolveResponse, WireSteps,
};
pub use url::{
    feedback_url, health_url, solve_stream_url, solve_url, DEFAULT_SOLVER_BASE_URL,
};
