//! HELM console entry point.
//!
//! Reads lines from stdin and routes them through the command registry.
//! The first argument (or `HELM_CONFIG`) names a TOML config file; a
//! missing or invalid file falls back to defaults. Type `exit` to quit.

mod commands;

use std::io::{self, BufRead};

use anyhow::Result;

use helm_console::Registry;
use helm_types::{ConsoleConfig, ConsoleSink, StdoutSink};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HELM_CONFIG").ok())
        .unwrap_or_else(|| "helm.toml".to_string());
    let (config, load_error) = match ConsoleConfig::load(&path) {
        Ok(config) => (config, None),
        Err(e) => (ConsoleConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    if let Some(e) = load_error {
        log::warn!("Using default console config ({path}: {e})");
    }
    log::info!(
        "Starting HELM console (session access: {})",
        config.session_access
    );

    let mut registry = Registry::new();
    commands::register_all(&mut registry, &config)?;
    log::info!("Registered dispatchers: {}", registry.dispatcher_names().join(", "));

    let mut sink = StdoutSink;
    if let Some(banner) = &config.banner {
        sink.write_line(banner);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        sink.write(&config.prompt);
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        if let Err(e) = registry.execute_as(trimmed, config.session_access, &mut sink) {
            log::error!("{e}");
            sink.write_error(&format!("error: {e}"));
        }
    }

    log::info!("Console closed");
    Ok(())
}
