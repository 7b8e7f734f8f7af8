use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use parley::app::run_live_command;
use parley::audio::list_devices;
use parley::cli::{Cli, Commands};
use parley::config::Config;
use parley::gemini::GeminiClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_live_command(config, cli.device, cli.language).await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Transcribe {
            file,
            output,
            no_preprocess,
        }) => {
            let client = GeminiClient::from_env()?;
            parley::transcribe::transcribe_file(&client, &file, output.as_deref(), no_preprocess)
                .await?;
        }
    }

    Ok(())
}

/// Route diagnostics to stderr so stdout stays a clean transcript stream.
///
/// Default level is warn; `-v` raises to info, `-vv` to debug. RUST_LOG
/// overrides everything.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "parley=info",
        _ => "parley=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/parley/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        if device.preferred {
            println!("  [{}] {} {}", idx, device.name, "[recommended]".green());
        } else {
            println!("  [{}] {}", idx, device.name);
        }
    }

    Ok(())
}
