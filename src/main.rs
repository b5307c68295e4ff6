//! tked - A small terminal text editor.
//!
//! # Usage
//!
//! ```bash
//! tked notes.txt
//! tked --watch --tab-width 8 notes.txt
//! tked --log-file tked.log
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tked::app::App;
use tked::config::{
    ConfigFlags, Settings, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};

/// A small terminal text editor
#[derive(Parser, Debug)]
#[command(name = "tked", version, about, long_about = None)]
struct Cli {
    /// File to edit (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Columns per tab stop
    #[arg(long, value_name = "N")]
    tab_width: Option<usize>,

    /// Watch file for changes and reload when there are no unsaved edits
    #[arg(short, long)]
    watch: bool,

    /// Append log output to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

/// Send logs to `path`. The terminal belongs to the editor, so without a
/// log file nothing is installed.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let log_path = effective
        .log_file
        .clone()
        .or_else(|| std::env::var_os("TKED_LOG").map(PathBuf::from));
    init_logging(log_path.as_deref())?;
    tracing::info!(file = ?cli.file, tab_width = ?effective.tab_width, watch = effective.watch, "starting");

    if cli.tab_width == Some(0) {
        eprintln!("[warn] --tab-width 0 ignored");
    }

    let mut app = App::new(cli.file)
        .with_watch(effective.watch)
        .with_settings(Settings::from_flags(&effective));

    app.run().context("Application error")
}
