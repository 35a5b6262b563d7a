use crate::core::error::MemchatError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_MEMORY_TAIL_CHARS: usize = 10_000;

/// The three flat files kept under the features directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Personality,
    Memory,
    History,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Personality => "personality.txt",
            Artifact::Memory => "memory.txt",
            Artifact::History => "history.txt",
        }
    }
}

/// File-backed store for personality, memory and history text.
///
/// A missing file reads as an empty string. Writes create the features
/// directory on demand.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    memory_tail_chars: usize,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory_tail_chars: DEFAULT_MEMORY_TAIL_CHARS,
        }
    }

    pub fn with_memory_tail(mut self, chars: usize) -> Self {
        self.memory_tail_chars = chars;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    pub fn ensure_dir(&self) -> Result<(), MemchatError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Full contents of an artifact.
    pub fn read(&self, artifact: Artifact) -> Result<String, MemchatError> {
        match fs::read_to_string(self.path(artifact)) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`Store::read`], but any failure reads as empty.
    pub fn read_or_empty(&self, artifact: Artifact) -> String {
        self.read(artifact).unwrap_or_else(|e| {
            debug!(artifact = artifact.file_name(), error = %e, "Unreadable artifact treated as empty");
            String::new()
        })
    }

    /// Last `memory_tail_chars` characters of the memory file.
    pub fn memory_tail(&self) -> String {
        tail_chars(&self.read_or_empty(Artifact::Memory), self.memory_tail_chars).to_string()
    }

    pub fn personality(&self) -> String {
        self.read_or_empty(Artifact::Personality)
    }

    pub fn append(&self, artifact: Artifact, text: &str) -> Result<(), MemchatError> {
        self.ensure_dir()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(artifact))?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Appends `text` to memory after normalization.
    pub fn remember(&self, text: &str) -> Result<(), MemchatError> {
        self.append(Artifact::Memory, &normalize_memory(text))
    }

    /// Appends one exchange record to history.
    pub fn record_exchange(&self, query: &str, answer: &str) -> Result<(), MemchatError> {
        self.append(Artifact::History, &format!("User: {}\n\n#AI: {}\n\n", query, answer))
    }

    /// Whole-file replace.
    pub fn write(&self, artifact: Artifact, text: &str) -> Result<(), MemchatError> {
        self.ensure_dir()?;
        fs::write(self.path(artifact), text)?;
        Ok(())
    }

    pub fn clear(&self, artifact: Artifact) -> Result<(), MemchatError> {
        self.write(artifact, "")
    }
}

/// Lowercase, strip ASCII punctuation, collapse whitespace, add one trailing space.
pub fn normalize_memory(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    let mut normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized.push(' ');
    normalized
}

fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
