//! Async multi-line input for the console chat.
//!
//! Wraps `rustyline_async::Readline`. A prompt ends at the first blank line
//! or at EOF (Ctrl+D); text typed before the EOF is still submitted.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a prompt.
    Message(String),
    /// End of input with nothing typed (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Lines collected for one prompt.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    lines: Vec<String>,
}

impl PromptBuffer {
    /// Add a line. Returns the finished prompt when the line is blank and
    /// something was typed before it.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            if self.lines.is_empty() {
                return None;
            }
            return Some(self.take());
        }
        self.lines.push(line.trim_end().to_string());
        None
    }

    /// End of input: whatever was typed, if anything.
    pub fn finish(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.lines).join("\n")
    }
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
    prompt: String,
    continuation: String,
}

impl ChatInput {
    /// Create a new input handler.
    ///
    /// Returns the handler and a `SharedWriter` for printing output without
    /// interfering with the readline prompt.
    pub fn new(prompt: String, continuation: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt.clone())?;
        Ok((
            Self {
                rl,
                prompt,
                continuation,
            },
            stdout,
        ))
    }

    /// Read one prompt of one or more lines.
    pub async fn read_prompt(&mut self) -> InputEvent {
        let mut buffer = PromptBuffer::default();
        let event = loop {
            let prompt = if buffer.is_empty() {
                &self.prompt
            } else {
                &self.continuation
            };
            let _ = self.rl.update_prompt(prompt);

            match self.rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => {
                    if let Some(text) = buffer.push_line(&line) {
                        break InputEvent::Message(text);
                    }
                }
                Ok(ReadlineEvent::Eof) | Err(_) => {
                    break match buffer.finish() {
                        Some(text) => InputEvent::Message(text),
                        None => InputEvent::Eof,
                    };
                }
                Ok(ReadlineEvent::Interrupted) => break InputEvent::Interrupted,
            }
        };

        if let InputEvent::Message(text) = &event {
            self.rl.add_history_entry(text.clone());
        }
        event
    }

    /// Write out everything queued on the shared writer.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}
