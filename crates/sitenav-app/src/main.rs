//! sitenav desktop entry point.
//!
//! Serves a directory (first argument) at `file://local/`, or a demo site
//! at `mem://demo/`, and browses it from a line-oriented prompt. Type
//! `help` for commands. A TOML config is read from `SITENAV_CONFIG` when
//! set.

mod commands;
mod site_setup;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use commands::{Command, Outcome};
use sitenav_browser::{Browser, BrowserConfig, BrowserEvent};

fn load_config() -> Result<BrowserConfig> {
    match std::env::var_os("SITENAV_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = BrowserConfig::load(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        },
        None => Ok(BrowserConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = load_config()?;
    let dir = std::env::args().nth(1).map(PathBuf::from);
    let serving_dir = dir.is_some();
    let (fetcher, start) = site_setup::build_fetcher(dir)?;
    if serving_dir {
        config.home_url = start.to_string();
    }
    log::info!("Starting sitenav at {start}");

    let mut browser = Browser::new(config, Arc::new(fetcher));
    browser.subscribe(Box::new(|event: &BrowserEvent| {
        if let BrowserEvent::PageChanged { .. } | BrowserEvent::LoadingChanged(_) = event {
            println!("  ({event})");
        }
    }));

    let first = commands::execute(&mut browser, Command::Go(start.to_string()))?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Outcome::Print(text) = first {
        writeln!(stdout, "{text}")?;
    }

    loop {
        write!(stdout, "sitenav> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                writeln!(stdout, "{e}")?;
                continue;
            },
        };
        match commands::execute(&mut browser, cmd) {
            Ok(Outcome::Print(text)) => writeln!(stdout, "{text}")?,
            Ok(Outcome::Quit) => break,
            Err(e) => writeln!(stdout, "error: {e:#}")?,
        }
    }

    log::info!("sitenav exiting");
    Ok(())
}
