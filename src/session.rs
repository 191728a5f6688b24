use std::collections::BTreeMap;
use std::time::Instant;

use thiserror::Error;

use chat_store::{AnswerPayload, Message};

use crate::answer::{clean_answer_text, SERVICE_ERROR_TEXT};
use crate::solver::SolveReply;

/// Monotonic counter invalidating in-flight work on every new chat.
pub type Generation = u64;

/// Per-answer rating collected from the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    /// Service-facing score on the 1..=5 scale.
    #[must_use]
    pub fn score(self) -> u8 {
        match self {
            Self::Like => 5,
            Self::Dislike => 1,
        }
    }
}

/// Descriptor for the single in-flight question.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub question: String,
    pub started_at: Instant,
}

/// Submission rejected while an exchange is already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a question is already in flight")]
    Busy,
}

/// Feedback rejected because the index is not a committed agent answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("message {0} is not a committed agent answer")]
    UnknownMessage(usize),
}

/// Effects the session engine requests from its host.
pub trait EngineOps {
    /// Starts the asynchronous solve for the pending exchange.
    fn start_solve(&mut self, question: String, generation: Generation) -> Result<(), String>;

    /// Starts the incremental reveal over a cleaned answer text.
    fn start_reveal(&mut self, answer: String, generation: Generation) -> Result<(), String>;

    /// Cancels any in-flight solve or reveal work.
    fn cancel_exchange(&mut self);

    /// Relays one rating to the solving service, fire-and-forget.
    fn relay_feedback(&mut self, payload: AnswerPayload, rating: Rating);

    /// Snapshots committed history after a mutation.
    fn persist(&mut self, history: &[Message]);

    /// Signals observers that visible state changed.
    fn notify_changed(&mut self);
}

/// Conversational session state: the ordered history, the single
/// in-flight exchange, the transient reveal buffer, and collected
/// feedback.
///
/// History is append-only between resets; `start_new_chat` replaces it
/// wholesale. Asynchronous continuations re-enter through the `on_*`
/// appliers and are discarded when their generation no longer matches
/// or no exchange is pending.
#[derive(Debug)]
pub struct Session {
    history: Vec<Message>,
    pending: Option<PendingExchange>,
    pending_answer: Option<AnswerPayload>,
    reveal_buffer: String,
    feedback_map: BTreeMap<usize, Rating>,
    generation: Generation,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(Vec::new())
    }

    /// Creates a session over a restored history snapshot.
    #[must_use]
    pub fn with_history(history: Vec<Message>) -> Self {
        Self {
            history,
            pending: None,
            pending_answer: None,
            reveal_buffer: String::new(),
            feedback_map: BTreeMap::new(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn reveal_buffer(&self) -> &str {
        &self.reveal_buffer
    }

    #[must_use]
    pub fn feedback(&self) -> &BTreeMap<usize, Rating> {
        &self.feedback_map
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Submits a typed question.
    ///
    /// Whitespace-only input is dropped silently; a submission while an
    /// exchange is in flight is rejected without touching state.
    pub fn submit_question(
        &mut self,
        text: &str,
        ops: &mut dyn EngineOps,
    ) -> Result<(), SubmitError> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(());
        }

        self.begin_exchange(question.to_string(), ops)
    }

    /// Submits a file-derived question: the user-visible message is an
    /// extraction notice naming the file, the pipeline is unchanged.
    pub fn submit_extracted(
        &mut self,
        file_name: &str,
        ops: &mut dyn EngineOps,
    ) -> Result<(), SubmitError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Ok(());
        }

        self.begin_exchange(extraction_notice(file_name), ops)
    }

    /// Resets to an empty conversation, invalidating in-flight work.
    pub fn start_new_chat(&mut self, ops: &mut dyn EngineOps) {
        self.generation += 1;
        ops.cancel_exchange();

        self.history = Vec::new();
        self.pending = None;
        self.pending_answer = None;
        self.reveal_buffer.clear();
        self.feedback_map = BTreeMap::new();

        ops.persist(&self.history);
        ops.notify_changed();
    }

    /// Records a rating for a committed agent answer and relays it.
    pub fn record_feedback(
        &mut self,
        index: usize,
        rating: Rating,
        ops: &mut dyn EngineOps,
    ) -> Result<(), FeedbackError> {
        let payload = match self.history.get(index) {
            Some(Message::Agent { content }) => content.clone(),
            _ => return Err(FeedbackError::UnknownMessage(index)),
        };

        self.feedback_map.insert(index, rating);
        ops.relay_feedback(payload, rating);
        ops.notify_changed();
        Ok(())
    }

    /// Applies a successful solve: cleans the answer, stashes the
    /// payload, and starts the reveal.
    pub fn on_solve_succeeded(
        &mut self,
        generation: Generation,
        reply: SolveReply,
        ops: &mut dyn EngineOps,
    ) {
        if !self.accepts_event(generation) {
            return;
        }
        let Some(pending) = self.pending.as_ref() else {
            return;
        };

        let answer = clean_answer_text(&reply.answer);
        self.pending_answer = Some(AnswerPayload {
            question: pending.question.clone(),
            answer: answer.clone(),
            steps: reply.steps,
            solution: reply.solution,
            confidence: reply.confidence,
        });
        self.reveal_buffer.clear();

        if ops.start_reveal(answer, generation).is_err() {
            // Degraded path: skip the typing effect and commit at once.
            if let Some(payload) = self.pending_answer.take() {
                self.commit_agent_message(payload, ops);
            }
            return;
        }

        ops.notify_changed();
    }

    /// Applies one cumulative reveal emission.
    pub fn on_reveal_chunk(
        &mut self,
        generation: Generation,
        cumulative: &str,
        ops: &mut dyn EngineOps,
    ) {
        if !self.accepts_event(generation) || self.pending_answer.is_none() {
            return;
        }

        self.reveal_buffer.clear();
        self.reveal_buffer.push_str(cumulative);
        ops.notify_changed();
    }

    /// Commits the revealed answer as the exchange's agent message.
    pub fn on_reveal_completed(&mut self, generation: Generation, ops: &mut dyn EngineOps) {
        if !self.accepts_event(generation) {
            return;
        }
        let Some(payload) = self.pending_answer.take() else {
            return;
        };

        self.commit_agent_message(payload, ops);
    }

    /// Converts a failed solve into a terminal error answer.
    pub fn on_solve_failed(&mut self, generation: Generation, ops: &mut dyn EngineOps) {
        if !self.accepts_event(generation) {
            return;
        }
        let Some(pending) = self.pending.as_ref() else {
            return;
        };

        let payload = AnswerPayload::text_only(pending.question.clone(), SERVICE_ERROR_TEXT);
        self.pending_answer = None;
        self.commit_agent_message(payload, ops);
    }

    fn begin_exchange(
        &mut self,
        question: String,
        ops: &mut dyn EngineOps,
    ) -> Result<(), SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::Busy);
        }

        self.history.push(Message::user(question.clone()));
        self.pending = Some(PendingExchange {
            question: question.clone(),
            started_at: Instant::now(),
        });
        self.reveal_buffer.clear();
        ops.persist(&self.history);

        let generation = self.generation;
        if let Err(error) = ops.start_solve(question, generation) {
            log::warn!("failed to start solve: {error}");
            self.on_solve_failed(generation, ops);
            return Ok(());
        }

        ops.notify_changed();
        Ok(())
    }

    fn commit_agent_message(&mut self, payload: AnswerPayload, ops: &mut dyn EngineOps) {
        self.history.push(Message::agent(payload));
        self.pending = None;
        self.reveal_buffer.clear();
        ops.persist(&self.history);
        ops.notify_changed();
    }

    fn accepts_event(&self, generation: Generation) -> bool {
        generation == self.generation && self.pending.is_some()
    }
}

/// User-visible notice standing in for a file-derived question.
#[must_use]
pub fn extraction_notice(file_name: &str) -> String {
    format!("📄 Uploaded: {file_name}")
}
