use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quay",
    about = "Quay: a pack-backed, content-addressed object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Branch to read from or write to
    #[arg(short, long, global = true, default_value = "main")]
    pub branch: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init,
    /// Store one file, commit, and flush
    Put(PutArgs),
    /// Bulk-load a directory as one commit
    Import(ImportArgs),
    /// Remove paths, commit, and flush
    Rm(RmArgs),
    /// Print a file's content
    Cat(CatArgs),
    /// List files under a path
    Ls(LsArgs),
    /// Show paths changed since a commit
    Diff(DiffArgs),
    /// Show commit history
    Log(LogArgs),
    /// Print the branch head
    Head,
}

#[derive(Args)]
pub struct PutArgs {
    /// Path inside the store
    pub path: String,
    /// Source file; stdin when omitted
    pub file: Option<PathBuf>,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub dir: PathBuf,
    /// Store every file under this path prefix
    #[arg(long)]
    pub prefix: Option<String>,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub paths: Vec<String>,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    /// Read at this commit instead of the branch head
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "")]
    pub root: String,
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Baseline commit
    pub old: String,
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}
