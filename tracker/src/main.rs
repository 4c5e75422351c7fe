use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use tracker::config::{TrackerConfig, load_config};
use tracker::printer::NullSink;
use tracker::replay::{load_events, replay};
use tracker::report::{ConsoleSink, Reporter, ReporterOptions};
use tracker::scope::RunScope;

#[derive(Parser)]
#[command(
    name = "tracker",
    version,
    about = "Replay recorded step logs through the call-tree tracker"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a recorded step log as the incremental tree view.
    Render {
        /// Replay log (one JSON event per line).
        file: PathBuf,
        /// Print steps (verbosity level 1).
        #[arg(long)]
        steps: bool,
        /// Debug output (verbosity level 2).
        #[arg(long)]
        debug: bool,
        /// Verbose output (verbosity level 3).
        #[arg(long)]
        verbose: bool,
        /// Disable cursor rewind before printing test results.
        #[arg(long)]
        noreverse: bool,
        /// Disable output truncation.
        #[arg(long)]
        notruncate: bool,
        /// Rendering mode ("tree" or "actor").
        #[arg(long)]
        output_style: Option<String>,
        /// Optional TOML config; flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Replay a log silently and print the merged call-tree history.
    History {
        /// Replay log (one JSON event per line).
        file: PathBuf,
    },
    /// Check a replay log against the schema without rendering.
    Validate {
        /// Replay log (one JSON event per line).
        file: PathBuf,
    },
}

fn main() {
    tracker::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            file,
            steps,
            debug,
            verbose,
            noreverse,
            notruncate,
            output_style,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => load_config(&path)?,
                None => TrackerConfig::default(),
            };
            cfg.steps |= steps;
            cfg.debug |= debug;
            cfg.verbose |= verbose;
            cfg.noreverse |= noreverse;
            cfg.notruncate |= notruncate;
            if let Some(style) = output_style {
                cfg.output_style = style;
            }
            cfg.validate()?;
            cmd_render(&file, &cfg.reporter_options())
        }
        Command::History { file } => cmd_history(&file),
        Command::Validate { file } => cmd_validate(&file),
    }
}

fn cmd_render(file: &Path, options: &ReporterOptions) -> Result<()> {
    let events = load_events(file)?;
    let sink = ConsoleSink::new(!options.notruncate, !options.noreverse);
    let mut reporter = Reporter::new(options, sink);
    reporter.run_started(&file.display().to_string(), None);
    let mut scope = RunScope::new();
    replay(&events, &mut scope, &mut reporter)?;
    Ok(())
}

fn cmd_history(file: &Path) -> Result<()> {
    let events = load_events(file)?;
    let mut scope = RunScope::new();
    let mut reporter = Reporter::new(&ReporterOptions::default(), NullSink);
    replay(&events, &mut scope, &mut reporter)?;
    for line in scope.history.tree_lines() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let events = load_events(file)?;
    println!("{}: {} events ok", file.display(), events.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_render_with_flags() {
        let cli = Cli::parse_from(["tracker", "render", "steps.jsonl", "--steps"]);
        match cli.command {
            Command::Render { file, steps, debug, .. } => {
                assert_eq!(file, PathBuf::from("steps.jsonl"));
                assert!(steps);
                assert!(!debug);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn parse_history() {
        let cli = Cli::parse_from(["tracker", "history", "steps.jsonl"]);
        assert!(matches!(cli.command, Command::History { .. }));
    }

    #[test]
    fn parse_validate() {
        let cli = Cli::parse_from(["tracker", "validate", "steps.jsonl"]);
        assert!(matches!(cli.command, Command::Validate { .. }));
    }
}
