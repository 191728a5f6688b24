use serde::{Deserialize, Serialize};

/// Request body for both solve endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub question: String,
    /// Default: false.
    #[serde(default)]
    pub stream: bool,
}

impl SolveRequest {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            stream: false,
        }
    }

    #[must_use]
    pub fn streaming(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            stream: true,
        }
    }
}

/// Steps as delivered by the service: either a list or one
/// newline-delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireSteps {
    List(Vec<String>),
    Text(String),
}

impl Default for WireSteps {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Response body for `POST /solve`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub question: Option<String>,
    pub answer: String,
    #[serde(default)]
    pub steps: WireSteps,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl SolveResponse {
    /// Steps as an ordered list: newline-delimited strings are split on
    /// one-or-more newlines, entries trimmed, empties dropped.
    #[must_use]
    pub fn normalized_steps(&self) -> Vec<String> {
        match &self.steps {
            WireSteps::List(steps) => steps
                .iter()
                .map(|step| step.trim().to_string())
                .filter(|step| !step.is_empty())
                .collect(),
            WireSteps::Text(text) => split_step_lines(text),
        }
    }

    /// Solution with empty and whitespace-only values treated as absent.
    #[must_use]
    pub fn normalized_solution(&self) -> Option<String> {
        self.solution
            .as_deref()
            .map(str::trim)
            .filter(|solution| !solution.is_empty())
            .map(ToString::to_string)
    }
}

#[must_use]
pub fn split_step_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Request body for `POST /feedback`. Ratings use the service's 1..=5
/// scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub answer: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Acknowledgement body for `POST /feedback`; not interpreted beyond
/// request success, so every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FeedbackAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
