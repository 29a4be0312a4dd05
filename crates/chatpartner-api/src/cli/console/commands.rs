//! Slash command parsing for the console chat.
//!
//! A prompt that is exactly one of the known commands never reaches the
//! completion model.

/// Console controls.
#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    /// Forget the conversation and start over.
    Reset,
    /// Log the stop event and leave.
    Quit,
}

/// Parse a complete prompt as a console command.
///
/// Returns `None` for anything else, including unknown `/words`, which are
/// sent to the model like any other text.
pub fn parse(input: &str) -> Option<ConsoleCommand> {
    match input.trim().to_lowercase().as_str() {
        "/start" | "/restart" | "/reset" => Some(ConsoleCommand::Reset),
        "/quit" | "/exit" | "/stop" | "/bye" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}
