use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Terminal chat with persistent memory and personality", long_about = None)]
pub struct Args {
    /// Completion backend [possible values: nvidia, openrouter]
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Index into the candidate model list (out-of-range falls back to 0)
    #[arg(short, long, default_value_t = 0)]
    pub model_index: usize,

    /// Directory holding personality.txt, memory.txt and history.txt
    #[arg(short, long)]
    pub features_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
