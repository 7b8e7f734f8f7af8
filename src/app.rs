//! Composition root for the live translation mode.
//!
//! Wires device selection, language selection, the ledger, the translation
//! client, and the connection supervisor together, and owns the Ctrl-C
//! handling.

use crate::audio::{self, AudioDevice};
use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::lang::{Language, SourceMode};
use crate::ledger::SessionLedger;
use crate::live::supervisor::{ConnectionSupervisor, SupervisorConfig};
use crate::translate::client::GeminiTranslator;
use anyhow::{Context, bail};
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write as _};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::info;

/// Run the live translation pipeline until the user cancels.
pub async fn run_live_command(
    mut config: Config,
    device: Option<String>,
    language: Option<String>,
) -> anyhow::Result<()> {
    audio::suppress_audio_warnings();

    // Zero enumerable devices is the one fatal startup condition
    let devices = audio::list_devices().context("Failed to enumerate audio devices")?;
    if devices.is_empty() {
        bail!("No audio input devices found");
    }

    eprintln!("Parley - live translator");
    eprintln!("{}", "=".repeat(40));

    // Resolution order: CLI flag, then config, then interactive menu
    if let Some(device) = device {
        config.audio.device = Some(device);
    }
    if config.audio.device.is_none() && std::io::stdin().is_terminal() {
        config.audio.device = Some(select_device(&devices)?);
    }

    let mode = if let Some(code) = language.as_deref() {
        parse_mode(code)?
    } else if std::io::stdin().is_terminal() {
        select_mode()?
    } else {
        parse_mode(&config.live.language)?
    };

    let direction = match mode {
        SourceMode::Bilingual(Language::Korean) => "Korean → English".to_string(),
        SourceMode::Bilingual(lang) => format!("{} → Korean", lang.name()),
        SourceMode::Mixed => "Any language → Korean".to_string(),
    };
    eprintln!("\nTranslation: {}", direction.green());

    let api_key = std::env::var(crate::defaults::API_KEY_ENV).with_context(|| {
        format!(
            "Set the {} environment variable",
            crate::defaults::API_KEY_ENV
        )
    })?;

    let translator = Arc::new(GeminiTranslator::new(
        GeminiClient::new(api_key.clone()),
        config.translate.model.clone(),
    ));
    let ledger = Arc::new(Mutex::new(SessionLedger::create(&config.ledger.dir)?));

    // Cancellation: a watch channel every task observes at its suspension
    // points; Ctrl-C flips it exactly once
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "[stopping...]".dimmed());
            let _ = shutdown_tx.send(true);
        }
    });

    let supervisor_config = SupervisorConfig::from_config(&config, mode);
    let supervisor =
        ConnectionSupervisor::new(supervisor_config, api_key, translator, ledger.clone());

    info!("starting live translation ({})", direction);
    supervisor.run(shutdown_rx).await?;

    let ledger = ledger.lock().await;
    eprintln!("\nSession saved: {}", ledger.path().display());
    eprintln!("[{} chunks translated]", ledger.len());

    Ok(())
}

/// Parse a language code or "mixed" into a source mode.
fn parse_mode(code: &str) -> anyhow::Result<SourceMode> {
    if code == "mixed" {
        return Ok(SourceMode::Mixed);
    }
    match Language::from_code(code) {
        Some(lang) => Ok(SourceMode::Bilingual(lang)),
        None => bail!("Unknown language: {} (use en, ja, ko, fr, or mixed)", code),
    }
}

/// Numbered device menu on stdin. Empty input picks the first entry.
fn select_device(devices: &[AudioDevice]) -> anyhow::Result<String> {
    eprintln!("\nAudio input:");
    for (idx, device) in devices.iter().enumerate() {
        if device.preferred {
            eprintln!("  [{}] {} {}", idx, device.name, "[recommended]".green());
        } else {
            eprintln!("  [{}] {}", idx, device.name);
        }
    }

    loop {
        eprint!("Select [0-{}]: ", devices.len() - 1);
        std::io::stderr().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            bail!("stdin closed during device selection");
        }
        let line = line.trim();

        let choice = if line.is_empty() {
            Some(0)
        } else {
            line.parse::<usize>().ok()
        };
        if let Some(idx) = choice
            && idx < devices.len()
        {
            eprintln!("- {}", devices[idx].name);
            return Ok(devices[idx].name.clone());
        }
    }
}

/// Numbered source-language menu on stdin.
fn select_mode() -> anyhow::Result<SourceMode> {
    eprintln!("\nSource language:");
    for (idx, lang) in Language::ALL.iter().enumerate() {
        eprintln!("  [{}] {}", idx, lang.name());
    }
    eprintln!("  [{}] Mixed (any language)", Language::ALL.len());

    loop {
        eprint!("Select [0-{}]: ", Language::ALL.len());
        std::io::stderr().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            bail!("stdin closed during language selection");
        }
        let line = line.trim();

        let choice = if line.is_empty() {
            Some(0)
        } else {
            line.parse::<usize>().ok()
        };
        match choice {
            Some(idx) if idx < Language::ALL.len() => {
                let lang = Language::ALL[idx];
                eprintln!("- {}", lang.name());
                return Ok(SourceMode::Bilingual(lang));
            }
            Some(idx) if idx == Language::ALL.len() => {
                eprintln!("- Mixed");
                return Ok(SourceMode::Mixed);
            }
            _ => {}
        }
    }
}
