use chat_store::Message;

/// Display-ready form of one committed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub speaker: &'static str,
    pub lines: Vec<String>,
}

/// Maps a committed message to display lines.
///
/// Pure transformation: the answer text line by line, then numbered
/// `Step N:` lines, then a `Solution:` line when one exists. The
/// rendering surface decides styling.
#[must_use]
pub fn render_message(message: &Message) -> RenderedMessage {
    match message {
        Message::User { content } => RenderedMessage {
            speaker: "you",
            lines: vec![content.clone()],
        },
        Message::Agent { content } => {
            let mut lines = Vec::new();
            if !content.answer.is_empty() {
                lines.extend(content.answer.lines().map(ToString::to_string));
            }
            for (index, step) in content.steps.iter().enumerate() {
                lines.push(format!("Step {}: {step}", index + 1));
            }
            if let Some(solution) = content
                .solution
                .as_deref()
                .filter(|solution| !solution.is_empty())
            {
                lines.push(format!("Solution: {solution}"));
            }

            RenderedMessage {
                speaker: "agent",
                lines,
            }
        }
    }
}
