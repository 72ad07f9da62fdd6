//! Scratch Title - preview the tab title an unsaved buffer would get.
//!
//! # Usage
//!
//! ```bash
//! scratch-title notes.txt
//! echo "  groceries  " | scratch-title --max-length 8
//! scratch-title --watch --scan-first-row notes.txt
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use scratch_title::config::{
    TitleSettings, clear_settings, global_config_path, load_settings, local_override_path,
    save_settings,
};
use scratch_title::prelude::*;
use scratch_title::watcher::FileWatcher;

/// Preview content-derived titles for unsaved editor buffers
#[derive(Parser, Debug)]
#[command(name = "scratch-title", version, about, long_about = None)]
struct Cli {
    /// File whose content fills the buffer (stdin when omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Label for buffers with nothing to show
    #[arg(long, value_name = "TEXT")]
    default_title: Option<String>,

    /// Longest title in characters, including the ellipsis
    #[arg(long, value_name = "N")]
    max_length: Option<usize>,

    /// Use the first non-blank row when the first row is blank
    #[arg(long, conflicts_with = "no_scan_first_row")]
    scan_first_row: bool,

    /// Only ever look at the first row
    #[arg(long)]
    no_scan_first_row: bool,

    /// Watch FILE and print the title again whenever it changes
    #[arg(short, long, requires = "file")]
    watch: bool,

    /// Save current command-line settings as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn settings(&self) -> TitleSettings {
        let scan_first_row = if self.scan_first_row {
            Some(true)
        } else if self.no_scan_first_row {
            Some(false)
        } else {
            None
        };
        TitleSettings {
            default_title: self.default_title.clone(),
            max_length: self.max_length,
            scan_first_row,
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => io::read_to_string(io::stdin()).context("Failed to read stdin"),
    }
}

fn print_title(title: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{title}");
    let _ = stdout.flush();
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_settings = cli.settings();

    if cli.clear {
        clear_settings(&global_path)?;
    }
    if cli.save {
        save_settings(&global_path, &cli_settings)?;
    }

    let file_settings = if cli.clear {
        TitleSettings::default()
    } else {
        let global = load_settings(&global_path)?;
        let local = load_settings(&local_path)?;
        global.union(&local)
    };
    let effective = file_settings.union(&cli_settings);
    tracing::debug!(?effective, "settings resolved");

    if (cli.save || cli.clear) && cli.file.is_none() {
        return Ok(());
    }

    let store = Rc::new(MemoryConfigStore::with_defaults());
    store.apply_settings(&effective);
    let workspace = Rc::new(MemoryWorkspace::new());
    let controller = FeatureController::new(
        Rc::clone(&workspace) as Rc<dyn Workspace>,
        Rc::clone(&store) as Rc<dyn ConfigStore>,
    );
    controller.activate();

    let editor = workspace.open_editor(&read_input(cli.file.as_ref())?);
    print_title(&editor.title());

    let Some(path) = cli.file.filter(|_| cli.watch) else {
        return Ok(());
    };

    let _printer = editor.on_did_change_title(Box::new(print_title));
    let mut watcher = FileWatcher::new(&path, Duration::from_millis(200))
        .with_context(|| format!("Failed to watch {}", path.display()))?;
    loop {
        if !watcher.wait(Duration::from_millis(250)) {
            continue;
        }
        match fs::read_to_string(watcher.target_path()) {
            Ok(text) => editor.set_text(&text),
            Err(err) => tracing::warn!(%err, path = %path.display(), "failed to reload"),
        }
    }
}
