use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill the missing features of a feature list.
    Fill(FillArgs),
    /// Write a template configuration file.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct FillArgs {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Feature list to fill (overrides the config).
    #[arg(short, long)]
    pub feature_list: Option<PathBuf>,

    /// Centroided raw files (override the config).
    #[arg(short, long, num_args = 1..)]
    pub raw_files: Option<Vec<PathBuf>>,

    /// Directory for the resulting feature lists (overrides the config).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Process raw files in parallel.
    #[arg(long, default_value_t = false)]
    pub parallel: bool,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The directory to write the template to.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
