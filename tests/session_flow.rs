use chat_store::{AnswerPayload, Message};
use math_chat::answer::SERVICE_ERROR_TEXT;
use math_chat::session::{
    extraction_notice, EngineOps, FeedbackError, Generation, Rating, Session, SubmitError,
};
use math_chat::solver::SolveReply;

#[derive(Default)]
struct OpsSpy {
    started_solves: Vec<(String, Generation)>,
    started_reveals: Vec<(String, Generation)>,
    cancel_requests: usize,
    relayed: Vec<(String, u8)>,
    persisted: Vec<Vec<Message>>,
    change_notifications: usize,
    fail_start_solve: Option<String>,
    fail_start_reveal: Option<String>,
}

impl EngineOps for OpsSpy {
    fn start_solve(&mut self, question: String, generation: Generation) -> Result<(), String> {
        if let Some(error) = self.fail_start_solve.clone() {
            return Err(error);
        }

        self.started_solves.push((question, generation));
        Ok(())
    }

    fn start_reveal(&mut self, answer: String, generation: Generation) -> Result<(), String> {
        if let Some(error) = self.fail_start_reveal.clone() {
            return Err(error);
        }

        self.started_reveals.push((answer, generation));
        Ok(())
    }

    fn cancel_exchange(&mut self) {
        self.cancel_requests += 1;
    }

    fn relay_feedback(&mut self, payload: AnswerPayload, rating: Rating) {
        self.relayed.push((payload.question, rating.score()));
    }

    fn persist(&mut self, history: &[Message]) {
        self.persisted.push(history.to_vec());
    }

    fn notify_changed(&mut self) {
        self.change_notifications += 1;
    }
}

fn scenario_reply() -> SolveReply {
    SolveReply {
        answer: "✅ Final Answer: [4]".to_string(),
        steps: vec!["Add 2 and 2".to_string(), "Result is 4".to_string()],
        solution: Some("4".to_string()),
        confidence: None,
    }
}

fn run_full_exchange(session: &mut Session, spy: &mut OpsSpy) {
    session
        .submit_question("2+2", spy)
        .expect("submission should start the exchange");
    session.on_solve_succeeded(0, scenario_reply(), spy);
    session.on_reveal_chunk(0, "4", spy);
    session.on_reveal_completed(0, spy);
}

#[test]
fn submit_appends_user_message_and_starts_solve() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("  2+2  ", &mut spy)
        .expect("submission should start the exchange");

    assert_eq!(session.history(), &[Message::user("2+2")]);
    assert_eq!(
        session.pending().map(|pending| pending.question.as_str()),
        Some("2+2")
    );
    assert_eq!(spy.started_solves, vec![("2+2".to_string(), 0)]);
    assert_eq!(spy.persisted.len(), 1);
    assert!(spy.change_notifications > 0);
}

#[test]
fn whitespace_submission_is_a_silent_noop() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("   \n\t", &mut spy)
        .expect("blank input is not an error");

    assert!(session.history().is_empty());
    assert!(session.pending().is_none());
    assert!(spy.started_solves.is_empty());
    assert!(spy.persisted.is_empty());
}

#[test]
fn submit_while_pending_is_rejected_without_mutation() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("first", &mut spy)
        .expect("first submission starts");
    let persisted_before = spy.persisted.len();

    let result = session.submit_question("second", &mut spy);

    assert_eq!(result, Err(SubmitError::Busy));
    assert_eq!(session.history(), &[Message::user("first")]);
    assert_eq!(spy.started_solves.len(), 1);
    assert_eq!(spy.persisted.len(), persisted_before);
}

#[test]
fn full_exchange_commits_cleaned_answer_after_reveal() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("2+2", &mut spy)
        .expect("submission should start the exchange");

    session.on_solve_succeeded(0, scenario_reply(), &mut spy);
    assert_eq!(spy.started_reveals, vec![("4".to_string(), 0)]);

    session.on_reveal_chunk(0, "4", &mut spy);
    assert_eq!(session.reveal_buffer(), "4");

    session.on_reveal_completed(0, &mut spy);

    assert_eq!(session.history().len(), 2);
    assert!(session.pending().is_none());
    assert_eq!(session.reveal_buffer(), "");

    let payload = session.history()[1]
        .answer()
        .expect("second message is the agent answer");
    assert_eq!(payload.question, "2+2");
    assert_eq!(payload.answer, "4");
    assert_eq!(
        payload.steps,
        vec!["Add 2 and 2".to_string(), "Result is 4".to_string()]
    );
    assert_eq!(payload.solution.as_deref(), Some("4"));
}

#[test]
fn user_message_always_precedes_the_agent_commit() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    run_full_exchange(&mut session, &mut spy);

    assert!(matches!(session.history()[0], Message::User { .. }));
    assert!(matches!(session.history()[1], Message::Agent { .. }));
}

#[test]
fn solve_failure_commits_fixed_error_text() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("2+2", &mut spy)
        .expect("submission should start the exchange");
    session.on_solve_failed(0, &mut spy);

    assert_eq!(session.history().len(), 2);
    assert!(session.pending().is_none());

    let payload = session.history()[1]
        .answer()
        .expect("second message is the agent answer");
    assert_eq!(payload.answer, SERVICE_ERROR_TEXT);
    assert!(payload.steps.is_empty());
    assert_eq!(payload.solution, None);
    assert!(spy.started_reveals.is_empty());
}

#[test]
fn start_solve_failure_converts_to_error_commit() {
    let mut session = Session::new();
    let mut spy = OpsSpy {
        fail_start_solve: Some("no worker".to_string()),
        ..OpsSpy::default()
    };

    session
        .submit_question("2+2", &mut spy)
        .expect("spawn failure is not a submission error");

    assert_eq!(session.history().len(), 2);
    assert!(session.pending().is_none());
    let payload = session.history()[1]
        .answer()
        .expect("second message is the agent answer");
    assert_eq!(payload.answer, SERVICE_ERROR_TEXT);
}

#[test]
fn reveal_spawn_failure_commits_without_the_typing_effect() {
    let mut session = Session::new();
    let mut spy = OpsSpy {
        fail_start_reveal: Some("no worker".to_string()),
        ..OpsSpy::default()
    };

    session
        .submit_question("2+2", &mut spy)
        .expect("submission should start the exchange");
    session.on_solve_succeeded(0, scenario_reply(), &mut spy);

    assert_eq!(session.history().len(), 2);
    assert!(session.pending().is_none());
    let payload = session.history()[1]
        .answer()
        .expect("second message is the agent answer");
    assert_eq!(payload.answer, "4");
}

#[test]
fn start_new_chat_resets_everything() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    run_full_exchange(&mut session, &mut spy);
    session
        .record_feedback(1, Rating::Like, &mut spy)
        .expect("feedback on the committed answer succeeds");
    session
        .submit_question("3+3", &mut spy)
        .expect("next submission starts");

    session.start_new_chat(&mut spy);

    assert!(session.history().is_empty());
    assert!(session.pending().is_none());
    assert_eq!(session.reveal_buffer(), "");
    assert!(session.feedback().is_empty());
    assert_eq!(session.generation(), 1);
    assert_eq!(spy.cancel_requests, 1);
    assert_eq!(
        spy.persisted.last().map(Vec::len),
        Some(0),
        "the empty history is persisted"
    );
}

#[test]
fn stale_generation_events_are_discarded_after_new_chat() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_question("2+2", &mut spy)
        .expect("submission should start the exchange");
    session.start_new_chat(&mut spy);

    session.on_solve_succeeded(0, scenario_reply(), &mut spy);
    session.on_reveal_chunk(0, "4", &mut spy);
    session.on_reveal_completed(0, &mut spy);
    session.on_solve_failed(0, &mut spy);

    assert!(session.history().is_empty());
    assert!(session.pending().is_none());
    assert_eq!(session.reveal_buffer(), "");
    assert!(spy.started_reveals.is_empty());
}

#[test]
fn reveal_events_without_a_pending_exchange_are_ignored() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session.on_reveal_chunk(0, "stray", &mut spy);
    session.on_reveal_completed(0, &mut spy);

    assert!(session.history().is_empty());
    assert_eq!(session.reveal_buffer(), "");
}

#[test]
fn feedback_requires_a_committed_agent_message() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    run_full_exchange(&mut session, &mut spy);

    assert_eq!(
        session.record_feedback(0, Rating::Like, &mut spy),
        Err(FeedbackError::UnknownMessage(0)),
        "user messages cannot be rated"
    );
    assert_eq!(
        session.record_feedback(9, Rating::Like, &mut spy),
        Err(FeedbackError::UnknownMessage(9)),
        "out-of-range indexes are rejected"
    );
    assert!(session.feedback().is_empty());
    assert!(spy.relayed.is_empty());
}

#[test]
fn feedback_on_an_agent_message_updates_map_and_relays() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    run_full_exchange(&mut session, &mut spy);
    session
        .record_feedback(1, Rating::Dislike, &mut spy)
        .expect("feedback on the committed answer succeeds");

    assert_eq!(session.feedback().get(&1), Some(&Rating::Dislike));
    assert_eq!(spy.relayed, vec![("2+2".to_string(), 1)]);
}

#[test]
fn extracted_submission_uses_the_notice_and_the_same_pipeline() {
    let mut session = Session::new();
    let mut spy = OpsSpy::default();

    session
        .submit_extracted("homework.png", &mut spy)
        .expect("file-derived submission starts");

    let notice = extraction_notice("homework.png");
    assert_eq!(session.history(), &[Message::user(notice.clone())]);
    assert_eq!(spy.started_solves, vec![(notice, 0)]);

    assert_eq!(
        session.submit_extracted("another.png", &mut spy),
        Err(SubmitError::Busy)
    );
    assert_eq!(session.submit_question("typed", &mut spy), Err(SubmitError::Busy));
}
