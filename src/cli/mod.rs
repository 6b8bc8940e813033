//! CLI module for tsdocgen

mod args;

pub use args::{Args, Command, LookupArgs};

use crate::config::{parse_option, HandlerConfig, Options};
use crate::error::{Error, Result};
use crate::handler::Handler;
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

const DEFAULT_CONFIG: &str = "tsdocgen.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Collect(lookup) => {
            let (handler, options) = prepare(&lookup)?;
            match handler.collect(&lookup.identifier, &options)? {
                Some(node) => println!("{}", serde_json::to_string_pretty(&node)?),
                None => {
                    if lookup.verbose {
                        eprintln!("No documentation found for {}", lookup.identifier);
                    }
                }
            }
            Ok(())
        }

        Command::Render(lookup) => {
            let (handler, options) = prepare(&lookup)?;
            let html = handler.document(&lookup.identifier, &options)?;
            println!("{}", html);
            Ok(())
        }

        Command::Version => {
            println!("tsdocgen {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load config, apply CLI overrides and build the handler
fn prepare(lookup: &LookupArgs) -> Result<(Handler, Options)> {
    let mut cfg = match &lookup.config {
        Some(path) => {
            if !path.exists() {
                return Err(Error::other(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            HandlerConfig::load(path)?
        }
        None => HandlerConfig::load_or_default(Path::new(DEFAULT_CONFIG)),
    };

    let options = lookup
        .options
        .iter()
        .map(|pair| parse_option(pair))
        .collect::<Result<Vec<_>>>()?;

    // CLI takes precedence
    cfg.merge_cli(
        lookup.json_dir.clone(),
        options,
        lookup.heading_level,
        lookup.show_root_heading,
    );

    if lookup.verbose {
        eprintln!("Identifier: {}", lookup.identifier);
        match &cfg.extractor.json_dir {
            Some(dir) => eprintln!("Metadata: {}", dir.display()),
            None => eprintln!(
                "Extractor: {} {}",
                cfg.extractor.command,
                cfg.extractor.args.join(" ")
            ),
        }
        eprintln!("Options: {}", serde_json::Value::Object(cfg.options.clone()));
    }
    debug!(cache = cfg.extractor.cache, "configuration loaded");

    let handler = Handler::from_config(&cfg)?;
    Ok((handler, Options::new()))
}
