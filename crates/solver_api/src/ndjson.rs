use serde_json::Value;

/// One event frame from the streaming solve endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Question(String),
    Status(String),
    Step { number: Option<u32>, text: String },
    Solution(String),
    Answer(String),
    Error(String),
    Done,
}

impl StreamEvent {
    /// Returns true when this event terminates the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}

/// Incremental parser for newline-delimited JSON event streams.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    buffer: String,
}

impl NdjsonStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find('\n') {
            let line = self.buffer[..split].trim().to_string();
            self.buffer.drain(0..=split);

            if line.is_empty() {
                continue;
            }

            if let Ok(value) = serde_json::from_str::<Value>(&line) {
                if let Some(event) = map_event(value) {
                    events.push(event);
                }
            }
        }

        events
    }

    /// Parse a complete stream payload in one shot.
    pub fn parse_lines(input: &str) -> Vec<StreamEvent> {
        let mut parser = Self::default();
        let mut events = parser.feed(input.as_bytes());
        if !parser.is_empty_buffer() {
            events.extend(parser.feed(b"\n"));
        }

        events
    }

    #[must_use]
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn map_event(value: Value) -> Option<StreamEvent> {
    let event_type = value.get("type")?.as_str()?;
    let data = value
        .get("data")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match event_type {
        "question" => Some(StreamEvent::Question(data)),
        "status" => Some(StreamEvent::Status(data)),
        "step" => {
            let number = value
                .get("number")
                .and_then(Value::as_u64)
                .and_then(|number| u32::try_from(number).ok());
            Some(StreamEvent::Step { number, text: data })
        }
        "solution" => Some(StreamEvent::Solution(data)),
        "answer" => Some(StreamEvent::Answer(data)),
        "error" => Some(StreamEvent::Error(data)),
        "done" => Some(StreamEvent::Done),
        _ => None,
    }
}
