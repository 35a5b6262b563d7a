use crate::cli::Args;
use crate::core::error::MemchatError;
use crate::display::{ChatView, TerminalView};
use crate::input::{self, Control};
use crate::orchestrator::{Completion, Orchestrator, OrchestratorState, Submission};
use crate::providers::CompletionBackend;
use crate::store::{Artifact, Store};
use is_terminal::IsTerminal;
use std::io;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// Destination of `/copy`.
pub trait ClipboardSink {
    fn copy_text(&mut self, text: String) -> Result<(), String>;
}

impl ClipboardSink for arboard::Clipboard {
    fn copy_text(&mut self, text: String) -> Result<(), String> {
        self.set_text(text).map_err(|e| e.to_string())
    }
}

/// The clipboard opened at startup, or why it could not be.
///
/// On Linux the copied text is served by the clipboard owner, so it has to
/// live as long as the session.
pub type ClipboardSlot = Result<Box<dyn ClipboardSink>, String>;

pub struct Application {
    pub args: Args,
    pub store: Store,
    pub backend: Arc<dyn CompletionBackend>,
}

impl Application {
    pub fn new(args: Args, store: Store, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            args,
            store,
            backend,
        }
    }

    pub async fn run(self) -> Result<(), MemchatError> {
        self.store.ensure_dir()?;
        let interactive = io::stdin().is_terminal();

        let (mut orchestrator, completions) =
            Orchestrator::new(self.store, self.backend, TerminalView::new());
        orchestrator.select_model(self.args.model_index);
        if interactive {
            orchestrator.greet();
        }

        let clipboard: ClipboardSlot = match arboard::Clipboard::new() {
            Ok(clipboard) => Ok(Box::new(clipboard)),
            Err(e) => {
                warn!(error = %e, "Clipboard unavailable");
                Err(e.to_string())
            }
        };

        let (line_tx, lines) = mpsc::unbounded_channel::<String>();
        let reader = input::spawn_reader(interactive, line_tx);
        if interactive {
            if let Ok(printer) = reader.printer.await {
                orchestrator.view_mut().attach_printer(printer);
            }
        }
        info!(
            interactive,
            features_dir = %orchestrator.store().dir().display(),
            "Chat session started"
        );

        let mut session = Session::new(orchestrator, completions, clipboard, interactive);
        session.run(lines, reader.ack).await;

        info!("Chat session ended");
        Ok(())
    }
}

/// Control loop state: input lines and finished requests are handled here, one at a time.
pub struct Session<V: ChatView> {
    orchestrator: Orchestrator<V>,
    completions: UnboundedReceiver<Completion>,
    clipboard: ClipboardSlot,
    interactive: bool,
}

impl<V: ChatView> Session<V> {
    pub fn new(
        orchestrator: Orchestrator<V>,
        completions: UnboundedReceiver<Completion>,
        clipboard: ClipboardSlot,
        interactive: bool,
    ) -> Self {
        Self {
            orchestrator,
            completions,
            clipboard,
            interactive,
        }
    }

    /// Runs until input closes or `exit`. Each handled line is acknowledged on
    /// `ack` so the reader draws its next prompt after the output.
    ///
    /// Piped input waits for outstanding requests before returning. An
    /// interactive session returns at once, since requests cannot be cancelled.
    pub async fn run(&mut self, mut lines: UnboundedReceiver<String>, ack: std_mpsc::Sender<()>) {
        self.orchestrator
            .view_mut()
            .set_prompt_active(self.interactive);
        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        debug!("Input closed");
                        if !self.interactive {
                            self.drain().await;
                        }
                        break;
                    };
                    self.orchestrator.view_mut().set_prompt_active(false);
                    let submission = match Control::parse(&line) {
                        Some(control) => {
                            self.handle_control(control);
                            Submission::Command
                        }
                        None => self.orchestrator.submit(&line),
                    };
                    if submission == Submission::Exit {
                        if !self.interactive {
                            self.drain().await;
                        }
                        break;
                    }
                    if ack.send(()).is_err() {
                        break;
                    }
                    self.orchestrator
                        .view_mut()
                        .set_prompt_active(self.interactive);
                }
                Some(done) = self.completions.recv() => self.orchestrator.on_completion(done),
            }
        }
    }

    /// Waits for every outstanding request and applies it.
    async fn drain(&mut self) {
        while self.orchestrator.state() == OrchestratorState::AwaitingResponse {
            match self.completions.recv().await {
                Some(done) => self.orchestrator.on_completion(done),
                None => break,
            }
        }
    }

    fn handle_control(&mut self, control: Control) {
        let orchestrator = &mut self.orchestrator;
        match control {
            Control::Copy => {
                let text = orchestrator.view().plain_text();
                let copied = match self.clipboard.as_mut() {
                    Ok(clipboard) => clipboard.copy_text(text),
                    Err(e) => Err(e.clone()),
                };
                match copied {
                    Ok(()) => debug!("Display copied to clipboard"),
                    Err(e) => orchestrator
                        .view_mut()
                        .render_markdown(&format!("**Error copying output:** {}", e)),
                }
            }
            Control::OpenPersonality => {
                let path = orchestrator.store().path(Artifact::Personality);
                let created = match path.exists() {
                    true => Ok(()),
                    false => orchestrator.store().write(Artifact::Personality, ""),
                };
                let opened = created.and_then(|()| open::that(&path).map_err(MemchatError::from));
                if let Err(e) = opened {
                    orchestrator
                        .view_mut()
                        .render_markdown(&format!("**Error opening personality file:** {}", e));
                }
            }
            Control::Model(None) => {
                let listing = model_listing(orchestrator.models(), orchestrator.model_index());
                orchestrator.view_mut().render_markdown(&listing);
            }
            Control::Model(Some(index)) => {
                orchestrator.select_model(index);
                let listing = model_listing(orchestrator.models(), index);
                orchestrator.view_mut().render_markdown(&listing);
            }
            Control::BadModel(arg) => {
                orchestrator
                    .view_mut()
                    .render_markdown(&format!("**Error: '{}' is not a model index.**", arg));
            }
        }
        orchestrator.view_mut().clear_input();
    }
}

/// Markdown list of models, marking the one `selected` resolves to.
fn model_listing(models: &[String], selected: usize) -> String {
    let active = crate::providers::clamp_model_index(models, selected);
    let mut listing = String::from("**Models**\n\n");
    for (i, model) in models.iter().enumerate() {
        let marker = if i == active { " *(selected)*" } else { "" };
        listing.push_str(&format!("{}. `{}`{}\n", i, model, marker));
    }
    listing
}
