use super::Command;
use crate::display::ChatView;
use crate::store::{Artifact, Store};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// Runs a command against the store and view. Every branch except `exit`
/// clears the input field.
pub fn execute<V: ChatView + ?Sized>(
    command: Command,
    store: &Store,
    view: &mut V,
) -> CommandOutcome {
    match command {
        Command::Exit => return CommandOutcome::Exit,
        Command::Clear => view.clear(),
        Command::History => show(store, view, Artifact::History, "**History is empty.**"),
        Command::Memory => show(store, view, Artifact::Memory, "**Memory is empty.**"),
        Command::ClearHistory => {
            let message = match store.clear(Artifact::History) {
                Ok(()) => "**History cleared. ✅**".to_string(),
                Err(e) => failure("clearing history", e),
            };
            view.render_markdown(&message);
        }
        Command::ClearMemory => {
            let message = match store.clear(Artifact::Memory) {
                Ok(()) => "**Memory cleared. ✅**".to_string(),
                Err(e) => failure("clearing memory", e),
            };
            view.render_markdown(&message);
        }
        Command::ClearAll => {
            let result = store
                .clear(Artifact::History)
                .and_then(|()| store.clear(Artifact::Memory));
            view.clear();
            let message = match result {
                Ok(()) => "**All history and memory cleared. ✅**".to_string(),
                Err(e) => failure("clearing history and memory", e),
            };
            view.render_markdown(&message);
        }
        Command::SetPersonality(text) => {
            let message = if text.is_empty() {
                "**Error: No personality provided.**".to_string()
            } else {
                match store.write(Artifact::Personality, &text) {
                    Ok(()) => {
                        info!(chars = text.chars().count(), "Personality replaced");
                        "**Personality settings saved successfully!**".to_string()
                    }
                    Err(e) => failure("saving personality", e),
                }
            };
            view.render_markdown(&message);
        }
    }
    view.clear_input();
    CommandOutcome::Continue
}

fn show<V: ChatView + ?Sized>(store: &Store, view: &mut V, artifact: Artifact, empty: &str) {
    let message = match store.read(artifact) {
        Ok(text) if text.trim().is_empty() => empty.to_string(),
        Ok(text) => text,
        Err(e) => failure(&format!("reading {}", artifact.file_name()), e),
    };
    view.render_markdown(&message);
}

fn failure(doing: &str, err: impl std::fmt::Display) -> String {
    error!(error = %err, "Error {}", doing);
    format!("**Error {}:** {}", doing, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::RecordingView;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store, RecordingView) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("features"));
        (dir, store, RecordingView::default())
    }

    #[test]
    fn exit_leaves_input_alone() {
        let (_dir, store, mut view) = setup();
        assert_eq!(execute(Command::Exit, &store, &mut view), CommandOutcome::Exit);
        assert_eq!(view.input_clears, 0);
        assert!(view.renders.is_empty());
    }

    #[test]
    fn every_other_command_clears_input() {
        let commands = [
            Command::Clear,
            Command::History,
            Command::Memory,
            Command::ClearHistory,
            Command::ClearMemory,
            Command::ClearAll,
            Command::SetPersonality(String::new()),
            Command::SetPersonality("calm".to_string()),
        ];
        for command in commands {
            let (_dir, store, mut view) = setup();
            assert_eq!(
                execute(command.clone(), &store, &mut view),
                CommandOutcome::Continue
            );
            assert_eq!(view.input_clears, 1, "{:?}", command);
        }
    }

    #[test]
    fn empty_placeholders() {
        let (_dir, store, mut view) = setup();
        execute(Command::History, &store, &mut view);
        execute(Command::Memory, &store, &mut view);
        assert_eq!(
            view.renders,
            vec!["**History is empty.**", "**Memory is empty.**"]
        );
    }

    #[test]
    fn memory_is_shown_raw() {
        let (_dir, store, mut view) = setup();
        store.remember("User: Hello, World!").unwrap();
        execute(Command::Memory, &store, &mut view);
        assert_eq!(view.current(), "user hello world ");
    }

    #[test]
    fn clear_history_only_touches_history() {
        let (_dir, store, mut view) = setup();
        store.record_exchange("q", "a").unwrap();
        store.remember("kept").unwrap();
        execute(Command::ClearHistory, &store, &mut view);
        assert_eq!(store.read(Artifact::History).unwrap(), "");
        assert_eq!(store.read(Artifact::Memory).unwrap(), "kept ");
        assert_eq!(view.current(), "**History cleared. ✅**");
    }

    #[test]
    fn clear_memory_only_touches_memory() {
        let (_dir, store, mut view) = setup();
        store.record_exchange("q", "a").unwrap();
        store.remember("gone").unwrap();
        execute(Command::ClearMemory, &store, &mut view);
        assert_eq!(store.read(Artifact::Memory).unwrap(), "");
        assert!(!store.read(Artifact::History).unwrap().is_empty());
        assert_eq!(view.current(), "**Memory cleared. ✅**");
    }

    #[test]
    fn clear_all_wipes_both_and_display() {
        let (_dir, store, mut view) = setup();
        store.record_exchange("q", "a").unwrap();
        store.remember("gone").unwrap();
        view.render_markdown("old answer");

        execute(Command::ClearAll, &store, &mut view);
        assert_eq!(view.display_clears, 1);
        assert_eq!(view.current(), "**All history and memory cleared. ✅**");

        execute(Command::History, &store, &mut view);
        assert_eq!(view.current(), "**History is empty.**");
        execute(Command::Memory, &store, &mut view);
        assert_eq!(view.current(), "**Memory is empty.**");
    }

    #[test]
    fn set_personality_replaces_file() {
        let (_dir, store, mut view) = setup();
        store.write(Artifact::Personality, "old").unwrap();
        execute(
            Command::SetPersonality("Speak like a sailor".to_string()),
            &store,
            &mut view,
        );
        assert_eq!(store.personality(), "Speak like a sailor");
        assert_eq!(view.current(), "**Personality settings saved successfully!**");
    }

    #[test]
    fn empty_personality_is_rejected() {
        let (_dir, store, mut view) = setup();
        store.write(Artifact::Personality, "unchanged").unwrap();
        execute(Command::SetPersonality(String::new()), &store, &mut view);
        assert_eq!(store.personality(), "unchanged");
        assert_eq!(view.current(), "**Error: No personality provided.**");
    }

    #[test]
    fn clear_has_no_persistence_effect() {
        let (_dir, store, mut view) = setup();
        store.record_exchange("q", "a").unwrap();
        view.render_markdown("something");
        execute(Command::Clear, &store, &mut view);
        assert_eq!(view.current(), "");
        assert!(!store.read(Artifact::History).unwrap().is_empty());
    }

    #[test]
    fn write_failure_is_reported_inline() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("features");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = Store::new(&blocker);
        let mut view = RecordingView::default();

        execute(Command::SetPersonality("x".to_string()), &store, &mut view);
        assert!(view.current().starts_with("**Error saving personality:**"));
        assert_eq!(view.input_clears, 1);
    }
}
