//! Durable storage for a single conversation history.
//!
//! The store owns one well-known JSON file holding the committed message
//! sequence. Loads are tolerant: anything other than a well-formed array
//! of messages degrades to an empty history and the damaged file is
//! removed so the next load starts clean. Saves replace the whole
//! snapshot atomically.

mod error;
mod paths;
mod schema;
mod store;

pub use error::ChatStoreError;
pub use paths::{history_path, history_root, HISTORY_DIR, HISTORY_FILE};
pub use schema::{AnswerPayload, Message};
pub use store::ChatStore;
