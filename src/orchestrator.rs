use crate::commands::{self, Command, CommandOutcome};
use crate::core::error::MemchatError;
use crate::display::ChatView;
use crate::providers::CompletionBackend;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

pub const GREETING: &str = "Hey, there! How can I help you today?";
pub const LOADING: &str = "**Loading response...**";

/// Result of one background request, posted back to the control loop.
#[derive(Debug)]
pub struct Completion {
    pub query: String,
    pub result: Result<String, MemchatError>,
}

impl Completion {
    /// Markdown to show and persist; failures become an inline error.
    pub fn output(&self) -> String {
        match &self.result {
            Ok(answer) => answer.clone(),
            Err(e) => format!("**Error:** {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank input, nothing happened.
    Ignored,
    Command,
    Dispatched,
    Exit,
}

/// Routes submissions to commands or the completion backend.
///
/// Completions are applied with [`Orchestrator::on_completion`] on the same
/// task that submits, so file writes and rendering never race each other.
pub struct Orchestrator<V: ChatView> {
    store: Store,
    backend: Arc<dyn CompletionBackend>,
    view: V,
    model_index: usize,
    outstanding: usize,
    completions: UnboundedSender<Completion>,
}

impl<V: ChatView> Orchestrator<V> {
    pub fn new(
        store: Store,
        backend: Arc<dyn CompletionBackend>,
        view: V,
    ) -> (Self, UnboundedReceiver<Completion>) {
        let (completions, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            store,
            backend,
            view,
            model_index: 0,
            outstanding: 0,
            completions,
        };
        (orchestrator, rx)
    }

    pub fn greet(&mut self) {
        self.view.render_markdown(&format!("**{}**", GREETING));
    }

    pub fn state(&self) -> OrchestratorState {
        if self.outstanding > 0 {
            OrchestratorState::AwaitingResponse
        } else {
            OrchestratorState::Idle
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn models(&self) -> &[String] {
        self.backend.models()
    }

    pub fn model_index(&self) -> usize {
        self.model_index
    }

    /// Index used for later submissions; the backend clamps bad values.
    pub fn select_model(&mut self, index: usize) {
        self.model_index = index;
    }

    /// Handles one submit event. Must run inside a tokio runtime.
    pub fn submit(&mut self, input: &str) -> Submission {
        let query = input.trim();
        if query.is_empty() {
            return Submission::Ignored;
        }

        if let Some(command) = Command::parse(query) {
            debug!(?command, "Running command");
            return match commands::execute(command, &self.store, &mut self.view) {
                CommandOutcome::Exit => Submission::Exit,
                CommandOutcome::Continue => Submission::Command,
            };
        }

        self.dispatch(query.to_string());
        Submission::Dispatched
    }

    fn dispatch(&mut self, query: String) {
        if let Err(e) = self.store.remember(&format!("User: {}", query)) {
            error!(error = %e, "Error saving query to memory");
        }
        self.view.render_markdown(LOADING);
        self.view.clear_input();

        self.outstanding += 1;
        let backend = Arc::clone(&self.backend);
        let completions = self.completions.clone();
        let model_index = self.model_index;
        debug!(model_index, outstanding = self.outstanding, "Dispatching query");

        tokio::spawn(async move {
            let result = backend.complete(&query, model_index).await;
            // The receiver only goes away when the application is shutting down.
            let _ = completions.send(Completion { query, result });
        });
    }

    /// Renders a finished request and records it in history and memory.
    pub fn on_completion(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let output = completion.output();
        self.view.render_markdown(&output);

        if let Err(e) = self.store.record_exchange(&completion.query, &output) {
            error!(error = %e, "Error saving history");
        }
        if let Err(e) = self.store.remember(&format!("AI: {}", output)) {
            error!(error = %e, "Error saving answer to memory");
        }
    }
}
