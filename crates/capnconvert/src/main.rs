//! capnconvert: Go declarations to Cap'n Proto schema.

mod config;

use anyhow::{Context, Result};
use capnconvert_local_deps::GoResolver;
use capnconvert_typegen::{ConvertError, extract_document, output};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use config::CapnconvertConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert Go struct and interface declarations to a Cap'n Proto schema.
#[derive(Parser)]
#[command(name = "capnconvert", author, version, about)]
struct Cli {
    /// Log more (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one Go source file
    ///
    /// Emits a schema for the file's structs and interfaces, plus every struct
    /// they reference from other packages.
    Convert {
        /// Go source file
        file: PathBuf,

        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Value for the `$Go.package` annotation
        #[arg(long)]
        go_package: Option<String>,

        /// Value for the `$Go.import` annotation
        #[arg(long)]
        go_import: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Capnp)]
        format: Format,

        /// Extra config file, applied after global and project config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Cap'n Proto schema text
    Capnp,
    /// The extracted declarations as JSON
    Json,
}

struct ConvertArgs {
    file: PathBuf,
    output: Option<PathBuf>,
    go_package: Option<String>,
    go_import: Option<String>,
    format: Format,
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            file,
            output,
            go_package,
            go_import,
            format,
            config,
        } => run_convert(ConvertArgs {
            file,
            output,
            go_package,
            go_import,
            format,
            config,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(convert_err) = err.downcast_ref::<ConvertError>() {
                println!("Error converting Go to Cap'n Proto: {convert_err}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Structured logging to stderr so stdout stays the schema.
fn init_logging(verbose: u8) {
    const CRATES: &[&str] = &["capnconvert", "capnconvert_typegen", "capnconvert_local_deps"];
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let allowlist: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
        EnvFilter::new(format!("warn,{}", allowlist.join(",")))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = CapnconvertConfig::load(&args.file, args.config.as_deref())?;

    let mut emit = config.emit_options();
    if let Some(go_package) = args.go_package {
        emit.go_package = go_package;
    }
    if let Some(go_import) = args.go_import {
        emit.go_import = go_import;
    }

    let resolver = GoResolver::for_file(&args.file, config.go_env().with_process_env());
    let doc = extract_document(&args.file, &resolver)?;
    let text = match args.format {
        Format::Capnp => output::render(&doc, &emit),
        Format::Json => serde_json::to_string_pretty(&doc)?,
    };

    write_output(args.output.as_deref(), &text)
}

/// Stdout output ends with one extra newline; files are written verbatim.
fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
