use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use chat_store::{history_path, ChatStore, Message};
use math_chat::commands::{parse_slash_command, SlashCommand};
use math_chat::runtime::{SessionController, SessionSnapshot};
use math_chat::session::{FeedbackError, Rating, Session, SubmitError};
use math_chat::solver::solver_from_env;
use math_chat::view::render_message;

const HELP_TEXT: &str =
    "Commands: /help, /new, /like INDEX, /dislike INDEX, /upload FILE, /quit";

fn main() -> io::Result<()> {
    env_logger::init();

    let cwd = std::env::current_dir()?;
    let store = ChatStore::open(history_path(&cwd));
    let session = Session::with_history(store.load());

    let solver = solver_from_env().map_err(io::Error::other)?;
    let controller = SessionController::new(session, store, solver);

    let printer = Arc::new(TranscriptPrinter::new(Arc::clone(&controller)));
    {
        let printer = Arc::clone(&printer);
        controller.subscribe(Box::new(move || printer.on_change()));
    }

    println!("math_chat — ask a question, or /help for commands.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_slash_command(&line) {
            Some(SlashCommand::Help) => println!("{HELP_TEXT}"),
            Some(SlashCommand::New) => controller.new_chat(),
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Like(index)) => {
                report_feedback(controller.feedback(index, Rating::Like));
            }
            Some(SlashCommand::Dislike(index)) => {
                report_feedback(controller.feedback(index, Rating::Dislike));
            }
            Some(SlashCommand::Upload(file_name)) => {
                report_submit(controller.submit_file(&file_name));
            }
            Some(SlashCommand::Unknown(command)) => println!("Unknown command: {command}"),
            None => report_submit(controller.submit(&line)),
        }
    }

    Ok(())
}

fn report_submit(result: Result<(), SubmitError>) {
    if let Err(SubmitError::Busy) = result {
        println!("An answer is still in flight; wait for it to finish.");
    }
}

fn report_feedback(result: Result<(), FeedbackError>) {
    if let Err(error) = result {
        println!("{error}");
    }
}

/// Prints reveal deltas as they arrive and committed answers on commit.
struct TranscriptPrinter {
    controller: Arc<SessionController>,
    cursor: Mutex<PrintCursor>,
}

#[derive(Default)]
struct PrintCursor {
    history_len: usize,
    reveal_len: usize,
}

impl TranscriptPrinter {
    fn new(controller: Arc<SessionController>) -> Self {
        let history_len = controller.snapshot().history.len();
        Self {
            controller,
            cursor: Mutex::new(PrintCursor {
                history_len,
                reveal_len: 0,
            }),
        }
    }

    fn on_change(&self) {
        let snapshot = self.controller.snapshot();
        let mut cursor = lock_unpoisoned(&self.cursor);
        print_reveal_delta(&snapshot, &mut cursor);
        print_new_messages(&snapshot, &mut cursor);
        let _ = io::stdout().flush();
    }
}

fn print_reveal_delta(snapshot: &SessionSnapshot, cursor: &mut PrintCursor) {
    let buffer = snapshot.reveal_buffer.as_str();
    if buffer.len() < cursor.reveal_len {
        cursor.reveal_len = 0;
    }
    if buffer.len() > cursor.reveal_len {
        print!("{}", &buffer[cursor.reveal_len..]);
        cursor.reveal_len = buffer.len();
    }
}

fn print_new_messages(snapshot: &SessionSnapshot, cursor: &mut PrintCursor) {
    if snapshot.history.len() < cursor.history_len {
        cursor.history_len = 0;
    }

    for message in &snapshot.history[cursor.history_len..] {
        if let Message::Agent { content } = message {
            let rendered = render_message(message);

            // When the answer streamed through the reveal buffer it is
            // already on screen; print only the lines after it.
            let mut skip = 0;
            if cursor.reveal_len > 0 {
                skip = if content.answer.is_empty() {
                    0
                } else {
                    content.answer.lines().count()
                };
                println!();
                cursor.reveal_len = 0;
            }

            for line in rendered.lines.iter().skip(skip) {
                println!("{line}");
            }
        }
    }

    cursor.history_len = snapshot.history.len();
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
