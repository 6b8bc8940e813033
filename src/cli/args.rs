//! CLI argument parsing

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Render cross-referenced API docs from TypeScript metadata
#[derive(Parser, Debug)]
#[command(name = "tsdocgen")]
#[command(about = "Render cross-referenced API docs from TypeScript metadata")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Options shared by the lookup commands
#[derive(ClapArgs, Debug, Clone)]
pub struct LookupArgs {
    /// Identifier of the form package:Symbol
    pub identifier: String,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read pre-generated <package>.json metadata from this directory
    #[arg(long)]
    pub json_dir: Option<PathBuf>,

    /// Render option as key=value (can be repeated)
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,

    /// Heading level of the root object
    #[arg(long)]
    pub heading_level: Option<u64>,

    /// Show the heading of the root object
    #[arg(long)]
    pub show_root_heading: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve an identifier and print its node as JSON
    Collect(LookupArgs),

    /// Resolve an identifier and print the rendered fragment
    Render(LookupArgs),

    /// Show version information
    Version,
}
