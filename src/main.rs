//! kspdoc: scan the text of the KSP reference manual into tables.
//!
//! The manual (already converted to plain text with page markers) is read
//! once for its table of contents, then once per item kind. Each pass
//! exports one table:
//!
//! - `kspdoc scan` runs every configured phase and writes the tables
//! - `kspdoc toc` prints the table of contents found in the manual
//! - `kspdoc names commands` lists the names of an exported table, patched

mod config;
mod error;
mod model;
mod parser;
mod reader;
mod render;
mod table;
mod toc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use model::ItemKind;
use parser::registry::Registry;
use parser::PassOptions;
use reader::RewindReader;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kspdoc",
    about = "Scan the KSP reference manual text into delimited tables"
)]
struct Cli {
    /// Configuration file (toml, yaml, json or ini)
    #[arg(short = 'c', long, default_value = "system.toml", global = true)]
    config: PathBuf,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the manual and export one table per item kind
    Scan {
        /// Item kinds to scan, in order. Overrides general.phases.
        #[arg(long = "phase")]
        phases: Vec<String>,

        /// Log every item after scanning
        #[arg(long)]
        dump: bool,

        /// Output format: delimited (default) or json
        #[arg(short = 'f', long, default_value = "delimited")]
        format: String,
    },
    /// Print the table of contents of the manual
    Toc,
    /// Print the item names of an exported table
    Names {
        /// Item kind, e.g. commands or variable
        kind: String,

        /// Ignore the patch table
        #[arg(long)]
        no_patch: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::Settings::load(&cli.config)?;
    init_tracing(cli.verbose, settings.general.verbose);

    match &cli.command {
        Command::Scan {
            phases,
            dump,
            format,
        } => scan(&settings, phases, *dump || settings.general.dump, format),
        Command::Toc => print_toc(&settings),
        Command::Names { kind, no_patch } => print_names(&settings, kind, !no_patch),
    }
}

fn init_tracing(verbosity: u8, verbose_setting: bool) {
    let level = match verbosity {
        0 if verbose_setting => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn open_manual(settings: &config::Settings) -> Result<RewindReader> {
    let path = settings.txt_file()?;
    RewindReader::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn scan(settings: &config::Settings, phases: &[String], dump: bool, format: &str) -> Result<()> {
    let phases = if phases.is_empty() {
        settings.phases()?
    } else {
        phases
            .iter()
            .map(|p| p.parse::<ItemKind>().context("invalid --phase"))
            .collect::<Result<Vec<_>>>()?
    };
    let version = settings.version()?;
    let renderer = render::create_renderer(format, settings.delimiter()?)?;
    let registry = Registry::builtin();

    let mut reader = open_manual(settings)?;
    let toc = toc::scan(&mut reader, &settings.toc_patterns()?)
        .with_context(|| format!("failed to scan the table of contents of {}", reader.path().display()))?;
    info!(
        "{} headlines and {} categories found",
        toc.headlines.len(),
        toc.category_count()
    );

    for kind in phases {
        let remediation = settings.remediation(kind);
        let options = PassOptions {
            version,
            zones: settings.zones(kind)?,
            remediation: &remediation,
        };
        let store = parser::scan_kind(&registry, kind, options, &mut reader, &toc)
            .with_context(|| format!("failed to scan {}", kind.plural()))?;
        if dump {
            store.dump(kind, true);
        }
        let items = store.into_items();
        let out = table_path(&settings.csv_file(kind), renderer.file_extension());
        let content = renderer.render(kind, &items)?;
        table::write_table(&out, &content)
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!("{} {} written to {}", items.len(), kind.plural(), out.display());
    }
    Ok(())
}

/// Table file with the renderer's extension.
fn table_path(csv_file: &Path, extension: &str) -> PathBuf {
    if csv_file.extension().is_some_and(|e| e == extension) {
        csv_file.to_path_buf()
    } else {
        csv_file.with_extension(extension)
    }
}

fn print_toc(settings: &config::Settings) -> Result<()> {
    let mut reader = open_manual(settings)?;
    let toc = toc::scan(&mut reader, &settings.toc_patterns()?)?;
    print!("{}", toc.render());
    Ok(())
}

fn print_names(settings: &config::Settings, kind: &str, apply_patch: bool) -> Result<()> {
    let kind: ItemKind = kind.parse()?;
    let path = settings.csv_file(kind);
    let items = table::load_patched(&path, kind, settings.delimiter()?, apply_patch)
        .with_context(|| format!("failed to load {}", path.display()))?;
    for name in items.keys() {
        println!("{}", name);
    }
    Ok(())
}
