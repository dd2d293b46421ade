use clap::Parser;
use std::path::PathBuf;

/// Reason with one model, answer with another.
#[derive(Parser, Debug, Clone)]
#[command(name = "rat", version, about = "Retrieval augmented thinking chat")]
pub struct Args {
    /// Profile layered over default.toml (claude, groq, local, ...)
    #[arg(long, env = "RAT_PROFILE")]
    pub profile: Option<String>,

    /// Directory holding default.toml and the profile files
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Start with the reasoning stream hidden
    #[arg(long)]
    pub hide_reasoning: bool,

    /// Answering model override
    #[arg(long)]
    pub model: Option<String>,
}
