use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use solver_api::{FeedbackRequest, SolverApiClient, SolverApiConfig};

use crate::reveal::CancelSignal;

/// Stable solver identifiers used by startup selection.
pub const DEFAULT_SOLVER_ID: &str = "http";
pub const MOCK_SOLVER_ID: &str = "mock";

pub const SOLVER_ENV_VAR: &str = "MATH_CHAT_SOLVER";
pub const BASE_URL_ENV_VAR: &str = "MATH_CHAT_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "MATH_CHAT_TIMEOUT_SEC";

/// Backend-neutral solve result with steps already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReply {
    pub answer: String,
    pub steps: Vec<String>,
    pub solution: Option<String>,
    pub confidence: Option<f64>,
}

/// Seam between the session runtime and the remote solving service.
pub trait SolverBackend: Send + Sync + 'static {
    /// Resolves one question to a structured reply.
    fn solve(&self, question: &str, cancel: CancelSignal) -> Result<SolveReply, String>;

    /// Relays one rating; callers treat failures as log-only.
    fn send_feedback(
        &self,
        question: &str,
        answer: &str,
        rating: u8,
        comment: &str,
    ) -> Result<(), String>;
}

/// `SolverBackend` over the HTTP transport client.
///
/// Each call bridges into the async client through a fresh
/// current-thread tokio runtime, keeping the engine side synchronous.
pub struct HttpSolver {
    client: SolverApiClient,
}

impl HttpSolver {
    pub fn new(config: SolverApiConfig) -> Result<Self, String> {
        let client = SolverApiClient::new(config)
            .map_err(|error| format!("Failed to initialize solver transport: {error}"))?;
        Ok(Self { client })
    }

    fn block_on<F>(&self, future: F) -> Result<F::Output, String>
    where
        F: std::future::Future,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| format!("failed to initialize tokio runtime: {error}"))?;

        Ok(runtime.block_on(future))
    }
}

impl SolverBackend for HttpSolver {
    fn solve(&self, question: &str, cancel: CancelSignal) -> Result<SolveReply, String> {
        let response = self
            .block_on(self.client.solve(question, Some(&cancel)))?
            .map_err(|error| error.to_string())?;

        Ok(SolveReply {
            answer: response.answer.clone(),
            steps: response.normalized_steps(),
            solution: response.normalized_solution(),
            confidence: response.confidence,
        })
    }

    fn send_feedback(
        &self,
        question: &str,
        answer: &str,
        rating: u8,
        comment: &str,
    ) -> Result<(), String> {
        let feedback = FeedbackRequest {
            question: question.to_string(),
            answer: answer.to_string(),
            rating,
            comment: comment.to_string(),
        };

        self.block_on(self.client.send_feedback(&feedback, None))?
            .map(|_| ())
            .map_err(|error| error.to_string())
    }
}

/// Deterministic offline backend for demos and flow tests.
#[derive(Debug, Clone)]
pub struct MockSolver {
    reply: SolveReply,
    delay: Duration,
}

impl MockSolver {
    #[must_use]
    pub fn with_reply(reply: SolveReply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::with_reply(SolveReply {
            answer: "✅ Final Answer: [4]".to_string(),
            steps: vec!["Add 2 and 2".to_string(), "Result is 4".to_string()],
            solution: Some("4".to_string()),
            confidence: Some(1.0),
        })
        .with_delay(Duration::from_millis(200))
    }
}

impl SolverBackend for MockSolver {
    fn solve(&self, _question: &str, cancel: CancelSignal) -> Result<SolveReply, String> {
        std::thread::sleep(self.delay);
        if cancel.load(Ordering::SeqCst) {
            return Err("solve cancelled".to_string());
        }

        Ok(self.reply.clone())
    }

    fn send_feedback(
        &self,
        _question: &str,
        _answer: &str,
        _rating: u8,
        _comment: &str,
    ) -> Result<(), String> {
        Ok(())
    }
}

pub fn solver_from_env() -> Result<Arc<dyn SolverBackend>, String> {
    let solver_id = std::env::var(SOLVER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    solver_for_id(solver_id.as_deref().unwrap_or(DEFAULT_SOLVER_ID))
}

pub fn solver_for_id(solver_id: &str) -> Result<Arc<dyn SolverBackend>, String> {
    match solver_id {
        DEFAULT_SOLVER_ID => Ok(Arc::new(HttpSolver::new(config_from_env()?)?)),
        MOCK_SOLVER_ID => Ok(Arc::new(MockSolver::default())),
        unknown => Err(format!(
            "Unsupported solver '{unknown}'. Available solvers: {DEFAULT_SOLVER_ID}, {MOCK_SOLVER_ID}"
        )),
    }
}

fn config_from_env() -> Result<SolverApiConfig, String> {
    let mut config = SolverApiConfig::default();

    if let Some(base_url) = std::env::var(BASE_URL_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        config = config.with_base_url(base_url);
    }

    if let Ok(raw) = std::env::var(TIMEOUT_ENV_VAR) {
        let seconds: u64 = raw
            .trim()
            .parse()
            .map_err(|_| format!("{TIMEOUT_ENV_VAR} must be a positive integer, got '{raw}'"))?;
        if seconds == 0 {
            return Err(format!("{TIMEOUT_ENV_VAR} must be greater than zero"));
        }
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use super::{solver_for_id, MockSolver, SolverBackend};

    #[test]
    fn solver_for_id_supports_mock() {
        let solver = solver_for_id("mock").expect("mock solver should resolve");
        let cancel = Arc::new(AtomicBool::new(false));
        let reply = solver.solve("2+2", cancel).expect("mock solve succeeds");

        assert_eq!(reply.answer, "✅ Final Answer: [4]");
    }

    #[test]
    fn solver_for_id_rejects_unknown_solver() {
        let error = match solver_for_id("custom") {
            Ok(_) => panic!("unknown solvers should fail"),
            Err(error) => error,
        };

        assert!(error.contains("Unsupported solver 'custom'"));
    }

    #[test]
    fn cancelled_mock_solve_reports_an_error() {
        let solver = MockSolver::default().with_delay(std::time::Duration::ZERO);
        let cancel = Arc::new(AtomicBool::new(true));

        assert!(solver.solve("2+2", cancel).is_err());
    }
}
