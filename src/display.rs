use console::Term;
use rustyline::ExternalPrinter;
use termimad::{MadSkin, rgb};
use tracing::debug;

/// Prints above a live line-editor prompt without disturbing it.
pub type PromptPrinter = Box<dyn ExternalPrinter + Send>;

/// Where rendered output goes.
///
/// Rendering replaces the current contents, the way a chat window does.
pub trait ChatView {
    fn render_markdown(&mut self, markdown: &str);

    /// Empties the display.
    fn clear(&mut self);

    /// Empties the input field; line editors already start each prompt empty.
    fn clear_input(&mut self) {}

    /// Whether an input prompt is currently drawn and waiting for a line.
    fn set_prompt_active(&mut self, _active: bool) {}

    /// Unstyled text of what is currently shown.
    fn plain_text(&self) -> String;
}

/// Markdown rendered to the terminal with termimad.
///
/// While a prompt is active, output goes through the editor's printer so the
/// prompt and any half-typed line are redrawn below it instead of wiped.
pub struct TerminalView {
    skin: MadSkin,
    term: Term,
    current: String,
    printer: Option<PromptPrinter>,
    prompt_active: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            skin: chat_skin(),
            term: Term::stdout(),
            current: String::new(),
            printer: None,
            prompt_active: false,
        }
    }

    pub fn attach_printer(&mut self, printer: PromptPrinter) {
        self.printer = Some(printer);
    }

    /// Prints above the prompt. `false` when there is no prompt to print above.
    fn print_above_prompt(&mut self, markdown: &str) -> bool {
        if !self.prompt_active {
            return false;
        }
        let Some(printer) = self.printer.as_mut() else {
            return false;
        };
        let text = self.skin.term_text(markdown).to_string();
        match printer.print(text) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "External printer failed");
                false
            }
        }
    }

    fn wipe(&self) {
        if self.term.is_term() {
            let _ = self.term.clear_screen();
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for TerminalView {
    fn render_markdown(&mut self, markdown: &str) {
        self.current = markdown.to_string();
        if self.print_above_prompt(markdown) {
            return;
        }
        self.wipe();
        self.skin.print_text(markdown);
        println!();
    }

    fn clear(&mut self) {
        self.current.clear();
        if !self.prompt_active {
            self.wipe();
        }
    }

    fn set_prompt_active(&mut self, active: bool) {
        self.prompt_active = active;
    }

    fn plain_text(&self) -> String {
        plain_text(&self.current)
    }
}

fn chat_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.inline_code.set_fg(rgb(248, 248, 242));
    skin.inline_code.set_bg(rgb(46, 46, 46));
    skin.code_block.set_bg(rgb(46, 46, 46));
    skin
}

/// Markdown laid out as text without any styling, for the clipboard.
pub fn plain_text(markdown: &str) -> String {
    let skin = MadSkin::no_style();
    skin.text(markdown, None).to_string()
}

/// Records everything shown, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingView {
    pub renders: Vec<String>,
    pub display_clears: usize,
    pub input_clears: usize,
    shown: String,
}

#[cfg(test)]
impl RecordingView {
    pub fn current(&self) -> &str {
        &self.shown
    }
}

#[cfg(test)]
impl ChatView for RecordingView {
    fn render_markdown(&mut self, markdown: &str) {
        self.renders.push(markdown.to_string());
        self.shown = markdown.to_string();
    }

    fn clear(&mut self) {
        self.display_clears += 1;
        self.shown.clear();
    }

    fn clear_input(&mut self) {
        self.input_clears += 1;
    }

    fn plain_text(&self) -> String {
        plain_text(&self.shown)
    }
}
