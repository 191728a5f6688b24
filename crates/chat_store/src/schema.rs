use serde::{Deserialize, Serialize};

/// Structured agent answer committed into history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    /// Originating question, kept for feedback correlation.
    pub question: String,
    /// Cleaned natural-language/markup answer text.
    pub answer: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AnswerPayload {
    /// Constructs a payload carrying only answer text.
    #[must_use]
    pub fn text_only(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            steps: Vec::new(),
            solution: None,
            confidence: None,
        }
    }
}

/// One committed conversation message. Immutable once appended; the
/// message's position in the history sequence is its sequence index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case", deny_unknown_fields)]
pub enum Message {
    User { content: String },
    Agent { content: AnswerPayload },
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn agent(content: AnswerPayload) -> Self {
        Self::Agent { content }
    }

    #[must_use]
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }

    /// Returns the structured answer for agent messages.
    #[must_use]
    pub fn answer(&self) -> Option<&AnswerPayload> {
        match self {
            Self::Agent { content } => Some(content),
            Self::User { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnswerPayload, Message};

    #[test]
    fn user_message_serializes_with_role_tag() {
        let message = Message::user("2+2");
        let serialized = serde_json::to_string(&message).expect("user message serializes");

        assert_eq!(serialized, r#"{"role":"user","content":"2+2"}"#);
    }

    #[test]
    fn agent_message_round_trips_full_payload() {
        let message = Message::agent(AnswerPayload {
            question: "2+2".to_string(),
            answer: "4".to_string(),
            steps: vec!["Add 2 and 2".to_string(), "Result is 4".to_string()],
            solution: Some("4".to_string()),
            confidence: Some(0.9),
        });

        let serialized = serde_json::to_string(&message).expect("agent message serializes");
        let decoded: Message = serde_json::from_str(&serialized).expect("agent message decodes");

        assert_eq!(decoded, message);
    }

    #[test]
    fn agent_payload_tolerates_missing_optional_fields() {
        let decoded: Message = serde_json::from_str(
            r#"{"role":"agent","content":{"question":"2+2","answer":"4"}}"#,
        )
        .expect("minimal agent message decodes");

        let payload = decoded.answer().expect("agent message carries a payload");
        assert!(payload.steps.is_empty());
        assert_eq!(payload.solution, None);
        assert_eq!(payload.confidence, None);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }
}
