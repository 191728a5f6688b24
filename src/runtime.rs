use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_store::{AnswerPayload, ChatStore, Message};

use crate::reveal::{
    reveal, CancelSignal, Granularity, RevealEvent, RevealHandle, DEFAULT_REVEAL_INTERVAL,
};
use crate::session::{EngineOps, FeedbackError, Generation, Rating, Session, SubmitError};
use crate::solver::{SolveReply, SolverBackend};

/// Read-only view of the session for renderers.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub history: Vec<Message>,
    pub reveal_buffer: String,
    pub thinking: bool,
    pub feedback: BTreeMap<usize, Rating>,
}

/// Change-notification subscriber; invoked after every visible mutation.
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

struct ActiveExchange {
    generation: Generation,
    cancel: CancelSignal,
    reveal: Option<RevealHandle>,
}

/// Drives the session's asynchronous pipeline: solve workers, reveal
/// emissions, feedback relays, persistence snapshots, and change
/// notifications.
///
/// Every event is applied back into the session under its mutex, so
/// history mutation stays strictly sequential. The active-exchange
/// record is only touched while the session lock is held, which keeps
/// it in step with `pending`. Listeners run after the lock is released
/// and re-read the snapshot.
pub struct SessionController {
    session: Mutex<Session>,
    store: ChatStore,
    solver: Arc<dyn SolverBackend>,
    active: Mutex<Option<ActiveExchange>>,
    listeners: Mutex<Vec<ChangeListener>>,
    pending_notify: AtomicBool,
    reveal_granularity: Granularity,
    reveal_interval: Duration,
}

impl SessionController {
    pub fn new(session: Session, store: ChatStore, solver: Arc<dyn SolverBackend>) -> Arc<Self> {
        Self::with_reveal_cadence(
            session,
            store,
            solver,
            Granularity::Lines,
            DEFAULT_REVEAL_INTERVAL,
        )
    }

    /// Creates a controller with an explicit reveal cadence (fast-running
    /// tests shrink the interval).
    pub fn with_reveal_cadence(
        session: Session,
        store: ChatStore,
        solver: Arc<dyn SolverBackend>,
        granularity: Granularity,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            store,
            solver,
            active: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            pending_notify: AtomicBool::new(false),
            reveal_granularity: granularity,
            reveal_interval: interval,
        })
    }

    /// Registers a change listener invoked after every visible mutation.
    pub fn subscribe(&self, listener: ChangeListener) {
        lock_unpoisoned(&self.listeners).push(listener);
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = lock_unpoisoned(&self.session);
        SessionSnapshot {
            history: session.history().to_vec(),
            reveal_buffer: session.reveal_buffer().to_string(),
            thinking: session.is_busy(),
            feedback: session.feedback().clone(),
        }
    }

    pub fn submit(self: &Arc<Self>, text: &str) -> Result<(), SubmitError> {
        let result = {
            let mut session = lock_unpoisoned(&self.session);
            session.submit_question(text, &mut Arc::clone(self))
        };

        self.flush_notifications();
        result
    }

    pub fn submit_file(self: &Arc<Self>, file_name: &str) -> Result<(), SubmitError> {
        let result = {
            let mut session = lock_unpoisoned(&self.session);
            session.submit_extracted(file_name, &mut Arc::clone(self))
        };

        self.flush_notifications();
        result
    }

    pub fn new_chat(self: &Arc<Self>) {
        {
            let mut session = lock_unpoisoned(&self.session);
            session.start_new_chat(&mut Arc::clone(self));
        }

        self.flush_notifications();
    }

    pub fn feedback(self: &Arc<Self>, index: usize, rating: Rating) -> Result<(), FeedbackError> {
        let result = {
            let mut session = lock_unpoisoned(&self.session);
            session.record_feedback(index, rating, &mut Arc::clone(self))
        };

        self.flush_notifications();
        result
    }

    fn handle_solve_result(
        self: &Arc<Self>,
        generation: Generation,
        result: Result<SolveReply, String>,
    ) {
        {
            let mut session = lock_unpoisoned(&self.session);
            match result {
                Ok(reply) => session.on_solve_succeeded(generation, reply, &mut Arc::clone(self)),
                Err(error) => {
                    log::warn!("solve failed: {error}");
                    session.on_solve_failed(generation, &mut Arc::clone(self));
                    self.clear_active();
                }
            }
        }

        self.flush_notifications();
    }

    fn handle_reveal_event(self: &Arc<Self>, generation: Generation, event: RevealEvent) {
        {
            let mut session = lock_unpoisoned(&self.session);
            match event {
                RevealEvent::Chunk { text } => {
                    session.on_reveal_chunk(generation, &text, &mut Arc::clone(self));
                }
                RevealEvent::Completed { .. } => {
                    session.on_reveal_completed(generation, &mut Arc::clone(self));
                    self.clear_active();
                }
            }
        }

        self.flush_notifications();
    }

    fn clear_active(&self) {
        lock_unpoisoned(&self.active).take();
    }

    fn flush_notifications(&self) {
        if self.pending_notify.swap(false, Ordering::SeqCst) {
            for listener in lock_unpoisoned(&self.listeners).iter() {
                listener();
            }
        }
    }
}

impl EngineOps for Arc<SessionController> {
    fn start_solve(&mut self, question: String, generation: Generation) -> Result<(), String> {
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        let controller = Arc::clone(self);
        let worker_cancel = Arc::clone(&cancel);

        // The worker is detached; a hung request is never joined, its
        // late result is discarded by the generation gate.
        thread::Builder::new()
            .name(format!("math-chat-solve-{generation}"))
            .spawn(move || {
                let result = controller.solver.solve(&question, worker_cancel);
                controller.handle_solve_result(generation, result);
            })
            .map_err(|error| format!("Failed to spawn solve worker: {error}"))?;

        *lock_unpoisoned(&self.active) = Some(ActiveExchange {
            generation,
            cancel,
            reveal: None,
        });

        Ok(())
    }

    fn start_reveal(&mut self, answer: String, generation: Generation) -> Result<(), String> {
        let controller = Arc::clone(self);
        let handle = reveal(
            answer,
            self.reveal_granularity,
            self.reveal_interval,
            move |event| controller.handle_reveal_event(generation, event),
        )
        .map_err(|error| {
            log::warn!("failed to start reveal: {error}");
            error
        })?;

        let mut active = lock_unpoisoned(&self.active);
        match active.as_mut() {
            Some(active) if active.generation == generation => {
                active.reveal = Some(handle);
            }
            _ => handle.cancel(),
        }

        Ok(())
    }

    fn cancel_exchange(&mut self) {
        let mut active = lock_unpoisoned(&self.active);
        if let Some(active) = active.take() {
            active.cancel.store(true, Ordering::SeqCst);
            if let Some(reveal) = active.reveal {
                reveal.cancel();
            }
        }
    }

    fn relay_feedback(&mut self, payload: AnswerPayload, rating: Rating) {
        let solver = Arc::clone(&self.solver);
        let spawned = thread::Builder::new()
            .name("math-chat-feedback".to_string())
            .spawn(move || {
                if let Err(error) =
                    solver.send_feedback(&payload.question, &payload.answer, rating.score(), "")
                {
                    log::warn!("feedback relay failed: {error}");
                }
            });

        if let Err(error) = spawned {
            log::warn!("failed to spawn feedback relay: {error}");
        }
    }

    fn persist(&mut self, history: &[Message]) {
        if let Err(error) = self.store.save(history) {
            log::warn!("failed to persist history: {error}");
        }
    }

    fn notify_changed(&mut self) {
        self.pending_notify.store(true, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
