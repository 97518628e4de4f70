use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nway",
    about = "Multi-way line diff for up to four documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show files side by side with difference markers and filler lines
    Show(ShowArgs),
    /// Print the pairwise hunks between two files
    Hunks(HunksArgs),
    /// Copy difference blocks from one file into another and print the result
    Take(TakeArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Two to four files to compare
    #[arg(required = true, num_args = 2..=4)]
    pub files: Vec<PathBuf>,

    /// Comma-separated diff options (filler, icase, iwhite, context:N,
    /// algorithm:{myers|minimal|patience|histogram}, ...)
    #[arg(long, default_value = "internal,filler,closeoff")]
    pub diffopt: String,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct HunksArgs {
    pub a: PathBuf,
    pub b: PathBuf,

    #[arg(long, default_value = "internal,filler,closeoff")]
    pub diffopt: String,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct TakeArgs {
    pub a: PathBuf,
    pub b: PathBuf,

    /// Slot to copy block text from (0 = first file)
    #[arg(long, default_value = "0")]
    pub from_slot: usize,

    /// Slot to copy block text into
    #[arg(long, default_value = "1")]
    pub to_slot: usize,

    /// Line range L1:L2 in the target file; the whole file when omitted
    #[arg(long)]
    pub range: Option<String>,

    #[arg(long, default_value = "internal,filler,closeoff")]
    pub diffopt: String,
}
