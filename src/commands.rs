/// Parsed REPL slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    New,
    Like(usize),
    Dislike(usize),
    Upload(String),
    Quit,
    Unknown(String),
}

/// Parses a slash command; returns `None` for plain input.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or(trimmed).to_string();
    let argument = parts.next();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/new" => SlashCommand::New,
        "/quit" => SlashCommand::Quit,
        "/like" => match argument.and_then(|raw| raw.parse().ok()) {
            Some(index) => SlashCommand::Like(index),
            None => SlashCommand::Unknown(command),
        },
        "/dislike" => match argument.and_then(|raw| raw.parse().ok()) {
            Some(index) => SlashCommand::Dislike(index),
            None => SlashCommand::Unknown(command),
        },
        "/upload" => match argument {
            Some(file_name) => SlashCommand::Upload(file_name.to_string()),
            None => SlashCommand::Unknown(command),
        },
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}
