use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CACHE_ROOT: &str = ".cache/absence-insight";
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

#[derive(Parser, Debug)]
#[command(
    name = "absence-insight",
    version,
    about = "Natural-language questions over an employee absenteeism dataset"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the semicolon-separated dataset into the local SQLite store.
    Ingest(IngestArgs),
    /// Answer one natural-language question.
    Query(QueryArgs),
    /// Report what the local store currently holds.
    Status(StatusArgs),
    /// Print sample questions.
    Suggest(SuggestArgs),
    /// Check the text generator server and whether the configured model is installed.
    LlmStatus(LlmStatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub csv_path: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Read the dataset straight from a CSV file instead of the store.
    #[arg(long, conflicts_with = "db_path")]
    pub csv_path: Option<PathBuf>,

    #[arg(long)]
    pub query: String,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "ABSENCE_LLM_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    #[arg(long, env = "ABSENCE_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    #[arg(long, env = "ABSENCE_LLM_TIMEOUT_SECS", default_value_t = DEFAULT_LLM_TIMEOUT_SECS)]
    pub llm_timeout_secs: u64,

    /// Skip the text generator and always answer general questions with the dataset overview.
    #[arg(long, default_value_t = false)]
    pub no_llm: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    /// List the example catalogue with descriptions and expected result types.
    #[arg(long, default_value_t = false)]
    pub examples: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LlmStatusArgs {
    #[arg(long, env = "ABSENCE_LLM_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    #[arg(long, env = "ABSENCE_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
