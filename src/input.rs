use crate::config::Config;
use crate::core::error::MemchatError;
use crate::display::PromptPrinter;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, CompletionType, Config as EditorConfig, Context, EditMode, Editor, Helper, KeyCode,
    KeyEvent, Modifiers,
};
use std::borrow::Cow;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Words offered for completion: the text commands plus front-end controls.
const COMPLETIONS: &[&str] = &[
    "exit",
    "clear",
    "clear all",
    "clear history",
    "clear memory",
    "history",
    "memory",
    "set personality:",
    "/copy",
    "/model",
    "/personality",
];

/// Actions of the terminal front-end itself (the window's buttons).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Copy,
    OpenPersonality,
    /// `None` lists models, `Some` selects by index.
    Model(Option<usize>),
    /// `/model` with an argument that is not an index.
    BadModel(String),
}

impl Control {
    pub fn parse(input: &str) -> Option<Control> {
        let trimmed = input.trim();
        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (trimmed, ""),
        };
        match (name, arg) {
            ("/copy", "") => Some(Control::Copy),
            ("/personality", "") => Some(Control::OpenPersonality),
            ("/model", "") => Some(Control::Model(None)),
            ("/model", arg) => Some(
                arg.parse()
                    .map(|index| Control::Model(Some(index)))
                    .unwrap_or_else(|_| Control::BadModel(arg.to_string())),
            ),
            _ => None,
        }
    }
}

pub struct ChatHelper {
    hinter: HistoryHinter,
}

impl ChatHelper {
    pub fn new() -> Self {
        Self {
            hinter: HistoryHinter {},
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = line[..pos].to_lowercase();
        if typed.is_empty() {
            return Ok((0, Vec::new()));
        }
        let matches = COMPLETIONS
            .iter()
            .filter(|word| word.starts_with(&typed))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }
}

impl Validator for ChatHelper {}

fn history_path() -> PathBuf {
    Config::config_dir().join("input_history.txt")
}

/// Creates the line editor. Enter submits, Alt+Enter inserts a newline.
pub fn create_editor() -> Result<Editor<ChatHelper, FileHistory>, MemchatError> {
    let config = EditorConfig::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| MemchatError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(ChatHelper::new()));
    editor.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::Newline);

    if editor.load_history(&history_path()).is_err() {
        debug!("No input history loaded");
    }
    Ok(editor)
}

/// Reads one line. `Ok(None)` on Ctrl-C or Ctrl-D.
pub fn read_input(
    editor: &mut Editor<ChatHelper, FileHistory>,
) -> Result<Option<String>, MemchatError> {
    let prompt = if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
        "> ".to_string()
    } else {
        style("> ").bold().cyan().to_string()
    };
    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(line.as_str())
                    .map_err(|e| MemchatError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(MemchatError::Input(format!("Input error: {}", err))),
    }
}

pub fn save_history(editor: &mut Editor<ChatHelper, FileHistory>) -> Result<(), MemchatError> {
    let path = history_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    editor
        .save_history(&path)
        .map_err(|e| MemchatError::Input(format!("Failed to save history: {}", e)))
}

/// Handles returned by [`spawn_reader`].
pub struct Reader {
    /// Acknowledges one handled line; the next prompt is drawn after it.
    pub ack: std_mpsc::Sender<()>,
    /// Printer for output arriving while a prompt is shown (interactive only).
    pub printer: oneshot::Receiver<PromptPrinter>,
}

/// Blocking reader loop run on its own thread.
///
/// Each line is sent to the control loop, which acknowledges once it has
/// handled the line so command output is drawn before the next prompt.
pub fn spawn_reader(interactive: bool, lines: UnboundedSender<String>) -> Reader {
    let (ack_tx, ack_rx) = std_mpsc::channel::<()>();
    let (printer_tx, printer_rx) = oneshot::channel();
    std::thread::spawn(move || {
        let result = if interactive {
            read_interactive(&lines, &ack_rx, printer_tx)
        } else {
            drop(printer_tx);
            read_piped(&lines, &ack_rx)
        };
        if let Err(e) = result {
            warn!(error = %e, "Input reader stopped");
        }
    });
    Reader {
        ack: ack_tx,
        printer: printer_rx,
    }
}

fn read_interactive(
    lines: &UnboundedSender<String>,
    ack: &std_mpsc::Receiver<()>,
    printer: oneshot::Sender<PromptPrinter>,
) -> Result<(), MemchatError> {
    let mut editor = create_editor()?;
    match editor.create_external_printer() {
        Ok(external) => {
            let _ = printer.send(Box::new(external));
        }
        Err(e) => {
            debug!(error = %e, "No external printer; answers may overwrite the prompt");
            drop(printer);
        }
    }
    while let Some(line) = read_input(&mut editor)? {
        if let Err(e) = save_history(&mut editor) {
            debug!(error = %e, "Input history not saved");
        }
        if lines.send(line).is_err() || ack.recv().is_err() {
            break;
        }
    }
    Ok(())
}

fn read_piped(
    lines: &UnboundedSender<String>,
    ack: &std_mpsc::Receiver<()>,
) -> Result<(), MemchatError> {
    for line in io::stdin().lock().lines() {
        if lines.send(line?).is_err() || ack.recv().is_err() {
            break;
        }
    }
    Ok(())
}
