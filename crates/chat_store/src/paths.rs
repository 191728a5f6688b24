use std::path::{Path, PathBuf};

pub const HISTORY_DIR: &str = ".math_chat";
pub const HISTORY_FILE: &str = "chat_history.json";

#[must_use]
pub fn history_root(cwd: &Path) -> PathBuf {
    cwd.join(HISTORY_DIR)
}

#[must_use]
pub fn history_path(cwd: &Path) -> PathBuf {
    history_root(cwd).join(HISTORY_FILE)
}
