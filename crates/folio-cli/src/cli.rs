use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_sdk::ContentKind;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: keep a persistent list of folders",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the support directory
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Override the storage key
    #[arg(long, global = true)]
    pub key: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List saved folders
    List,
    /// Add folders as one drop batch
    Add(AddArgs),
    /// Remove a saved folder
    Remove(RemoveArgs),
    /// Choose a folder interactively
    Pick(PickArgs),
    /// Check that a saved folder is accessible
    Open(OpenArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct KindArgs {
    /// Accepted kinds: directory, file, symlink, item, or .ext
    #[arg(long, value_delimiter = ',', default_value = "directory")]
    pub kinds: Vec<ContentKind>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    #[command(flatten)]
    pub filter: KindArgs,
    /// Per-folder resolution deadline
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct PickArgs {
    #[command(flatten)]
    pub filter: KindArgs,
}

#[derive(Args)]
pub struct OpenArgs {
    pub path: PathBuf,
}
