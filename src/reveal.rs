use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shared cancellation flag for a reveal run.
pub type CancelSignal = Arc<AtomicBool>;

/// Default spacing between chunk emissions.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Progress event for one reveal run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// Cumulative text revealed so far.
    Chunk { text: String },
    /// Terminal signal carrying the full text. Never emitted for a
    /// cancelled run.
    Completed { text: String },
}

/// Chunking strategy for a reveal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// Split after each line terminator; a single-line string is one
    /// chunk.
    #[default]
    Lines,
    /// Emit the whole text as one chunk.
    Whole,
}

/// Splits `text` into reveal chunks for `granularity`.
#[must_use]
pub fn split_chunks(text: &str, granularity: Granularity) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    match granularity {
        Granularity::Lines => text.split_inclusive('\n').map(ToString::to_string).collect(),
        Granularity::Whole => vec![text.to_string()],
    }
}

/// Handle for an in-flight reveal run. Dropping the handle detaches the
/// worker without cancelling it.
pub struct RevealHandle {
    cancel: CancelSignal,
    join: Option<JoinHandle<()>>,
}

impl RevealHandle {
    /// Stops the run. Once the worker observes the flag, no further
    /// chunk or completion events are emitted.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        Arc::clone(&self.cancel)
    }

    /// Waits for the worker to exit.
    pub fn join(mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Reveals `full_text` incrementally on a worker thread.
///
/// Each emission is the cumulative string up to and including the next
/// chunk, spaced by `interval`; a final `Completed` event carries the
/// full text. Empty input completes immediately with no chunks. The
/// cancel flag is checked before every sleep and every emission.
pub fn reveal<F>(
    full_text: String,
    granularity: Granularity,
    interval: Duration,
    mut emit: F,
) -> Result<RevealHandle, String>
where
    F: FnMut(RevealEvent) + Send + 'static,
{
    let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let join = thread::Builder::new()
        .name("reveal-scheduler".to_string())
        .spawn(move || {
            let chunks = split_chunks(&full_text, granularity);
            let mut revealed = String::new();

            for chunk in chunks {
                if worker_cancel.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(interval);
                if worker_cancel.load(Ordering::SeqCst) {
                    return;
                }

                revealed.push_str(&chunk);
                emit(RevealEvent::Chunk {
                    text: revealed.clone(),
                });
            }

            if worker_cancel.load(Ordering::SeqCst) {
                return;
            }
            emit(RevealEvent::Completed { text: full_text });
        })
        .map_err(|error| format!("Failed to spawn reveal worker: {error}"))?;

    Ok(RevealHandle {
        cancel,
        join: Some(join),
    })
}
