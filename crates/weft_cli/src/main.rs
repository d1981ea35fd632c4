//! Weft CLI, the command-line driver of the fabric generator.
//!
//! `weft generate` builds the routing graph of a `weft.toml` device, appends
//! its clock network and writes the routing netlists and the fabric
//! bitstream. `weft stats` reports graph and configuration sizes without
//! writing anything.

#![warn(missing_docs)]

mod generate;
mod stats;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use weft_config::{load_config, FabricConfig, CONFIG_FILE_NAME};
use weft_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};

/// Weft, an FPGA routing fabric generator.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Weft FPGA fabric generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to the device description (defaults to `weft.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate routing netlists and the fabric bitstream.
    Generate(GenerateArgs),
    /// Report routing graph and configuration statistics.
    Stats(StatsArgs),
}

/// Arguments for `weft generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Output directory (overrides `output.directory`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit one module per unique block shape.
    #[arg(long)]
    pub compact: bool,

    /// Connect primitive ports by name instead of by position.
    #[arg(long)]
    pub explicit_port_mapping: bool,

    /// Routing result as a JSON map of node id to routed predecessor.
    #[arg(long)]
    pub routing: Option<PathBuf>,
}

/// Arguments for `weft stats`.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from the terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Device description path.
    pub config: PathBuf,
}

impl GlobalArgs {
    /// Loads and validates the device description.
    pub fn load_config(&self) -> Result<FabricConfig, Box<dyn std::error::Error>> {
        log::debug!("Loading {}", self.config.display());
        Ok(load_config(&self.config)?)
    }

    /// Prints the diagnostics collected in `sink` to stderr; only errors
    /// when quiet.
    pub fn render_diagnostics(&self, sink: &DiagnosticSink) {
        let renderer = TerminalRenderer::new(self.color);
        for diag in sink.diagnostics() {
            if self.quiet && !diag.severity.is_error() {
                continue;
            }
            eprintln!("{}", renderer.render(&diag));
        }
    }
}

fn init_logger(global: &GlobalArgs) {
    let level = if global.quiet {
        log::LevelFilter::Error
    } else if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
    };
    init_logger(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Stats(ref args) => stats::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_generate_default() {
        let cli = Cli::parse_from(["weft", "generate"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert!(args.out.is_none());
                assert!(!args.compact);
                assert!(!args.explicit_port_mapping);
                assert!(args.routing.is_none());
            }
            _ => panic!("expected Generate command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_generate_with_args() {
        let cli = Cli::parse_from([
            "weft",
            "--config",
            "fabrics/k4.toml",
            "generate",
            "--out",
            "build",
            "--compact",
            "--explicit-port-mapping",
            "--routing",
            "route.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("fabrics/k4.toml")));
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.out, Some(PathBuf::from("build")));
                assert!(args.compact);
                assert!(args.explicit_port_mapping);
                assert_eq!(args.routing, Some(PathBuf::from("route.json")));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_stats_json() {
        let cli = Cli::parse_from(["weft", "stats", "--format", "json"]);
        match cli.command {
            Command::Stats(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Stats command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["weft", "stats", "-q", "--color", "never"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn verbose_short_flag() {
        let cli = Cli::parse_from(["weft", "-v", "generate"]);
        assert!(cli.verbose);
        assert_eq!(cli.color, ColorChoice::Auto);
    }
}
