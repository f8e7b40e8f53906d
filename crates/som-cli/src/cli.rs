use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "som",
    about = "Structured Object Model: schema, blob, diff, and merge tools",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a schema file and list its types
    Schema(SchemaArgs),
    /// Decode a blob and print the object tree with change markers
    Inspect(InspectArgs),
    /// Derive a delta blob from a target blob and a base blob
    Diff(DiffArgs),
    /// Apply a delta blob on top of a base blob
    Merge(MergeArgs),
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Schema file in the JSON source format
    pub file: String,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Blob file, plain or enveloped
    pub blob: String,
    /// Schema file the blob was encoded under
    #[arg(short, long)]
    pub schema: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Blob holding the edited state
    pub target: String,
    /// Blob holding the baseline state
    pub base: String,
    /// Schema file both blobs were encoded under
    #[arg(short, long)]
    pub schema: String,
    /// Where to write the delta blob
    #[arg(short, long)]
    pub output: String,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Blob the delta is applied to
    pub base: String,
    /// Delta blob, e.g. one produced by `som diff`
    pub delta: String,
    /// Schema file both blobs were encoded under
    #[arg(short, long)]
    pub schema: String,
    /// Where to write the merged blob
    #[arg(short, long)]
    pub output: String,
}
