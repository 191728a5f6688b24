use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed user-visible text committed when an exchange fails.
pub const SERVICE_ERROR_TEXT: &str = "⚠️ Error contacting backend.";

static ANSWER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:✅\s*)?final answer:\s*").expect("answer label pattern is valid")
});

/// Strips service boilerplate from an answer before reveal and commit.
///
/// Removes the case-insensitive `final answer:` label (with an optional
/// preceding ✅ glyph), stray square-bracket markdown artifacts, and
/// surrounding whitespace. Idempotent: cleaning a cleaned string is a
/// no-op.
#[must_use]
pub fn clean_answer_text(raw: &str) -> String {
    let without_label = ANSWER_LABEL.replace_all(raw, "");
    without_label
        .chars()
        .filter(|ch| !matches!(ch, '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}
