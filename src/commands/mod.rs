pub mod handler;

pub use handler::{CommandOutcome, execute};

const SET_PERSONALITY: &str = "set personality:";

/// Text commands recognised in the input channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    History,
    Memory,
    ClearHistory,
    ClearMemory,
    ClearAll,
    /// Trimmed text after the first colon; may be empty.
    SetPersonality(String),
}

impl Command {
    /// Exact match on the lowercased, trimmed input; `set personality:` is a prefix.
    pub fn parse(input: &str) -> Option<Command> {
        let trimmed = input.trim();
        let lower = trimmed.to_lowercase();
        let command = match lower.as_str() {
            "exit" => Command::Exit,
            "clear" => Command::Clear,
            "history" => Command::History,
            "memory" => Command::Memory,
            "clear history" => Command::ClearHistory,
            "clear memory" => Command::ClearMemory,
            "clear all" => Command::ClearAll,
            _ if lower.starts_with(SET_PERSONALITY) => {
                let text = trimmed
                    .split_once(':')
                    .map(|(_, rest)| rest.trim())
                    .unwrap_or_default();
                Command::SetPersonality(text.to_string())
            }
            _ => return None,
        };
        Some(command)
    }
}
