use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed Gantt planner CLI.
/// Storage defaults to the most recent project under ~/.taskgantt/
/// or a path passed via --db.
#[derive(Parser)]
#[command(name = "tg", version, about = "Gantt planning CLI with sprint and dependency support")]
pub struct Cli {
    /// Path to the JSON project file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
