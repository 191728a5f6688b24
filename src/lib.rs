//! Conversational client engine for a remote math solving service.
//!
//! ## Solver bootstrap
//!
//! The binary selects its backend through `MATH_CHAT_SOLVER`:
//!
//! - `http` (default) talks to the remote service. `MATH_CHAT_BASE_URL`
//!   overrides the `http://localhost:8000` base and
//!   `MATH_CHAT_TIMEOUT_SEC` bounds each request.
//! - `mock` answers deterministically without a network.
//!
//! ## Session contract
//!
//! The engine owns the ordered message history and enforces at most one
//! in-flight question. Each exchange appends the user message, resolves
//! the question through the solver backend, replays the cleaned answer
//! through the incremental reveal scheduler, and commits the final agent
//! message. `start_new_chat` bumps a generation counter; asynchronous
//! results carrying a stale generation are discarded, never applied.
//! Committed history is snapshotted to the chat store after every
//! mutation; the transient reveal buffer and per-answer feedback stay
//! outside the committed sequence.

pub mod answer;
pub mod commands;
pub mod reveal;
pub mod runtime;
pub mod session;
pub mod solver;
pub mod view;
