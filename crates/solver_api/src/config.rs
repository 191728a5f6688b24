use std::time::Duration;

use crate::url::DEFAULT_SOLVER_BASE_URL;

/// Transport configuration for solving-service requests.
#[derive(Debug, Clone)]
pub struct SolverApiConfig {
    /// Base URL for the service endpoints.
    pub base_url: String,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
}

impl Default for SolverApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOLVER_BASE_URL.to_string(),
            timeout: None,
            user_agent: None,
        }
    }
}

impl SolverApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
