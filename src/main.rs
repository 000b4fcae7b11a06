//! Voskpipe - managed recognition sessions and model provisioning
//!
//! Run `voskpipe listen` to stream recognition events, `voskpipe model
//! ensure` to download and install the configured model, and `voskpipe
//! devices` / `voskpipe version` to query the recognizer binary.

use clap::Parser;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use voskpipe::cli::{Cli, Commands, ModelAction};
use voskpipe::config::{self, Config};
use voskpipe::model;
use voskpipe::recognizer::Recognizer;
use voskpipe::session::{RecognitionEvent, SessionOptions, SessionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // First run: create the standard directories and drop the commented
    // template at the default config path. An explicit --config path is
    // used as given, never created.
    if cli.config.is_none() {
        Config::ensure_directories()?;
        if let Some(path) = Config::default_path() {
            config::write_default_config(&path)?;
        }
    }

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Listen {
        device: None,
        model: None,
        json: false,
    }) {
        Commands::Listen {
            device,
            model,
            json,
        } => run_listen(&config, device, model, json).await,
        Commands::Devices { json } => run_devices(&config, json),
        Commands::Version => run_version(&config),
        Commands::Model { action } => run_model(&config, action).await,
        Commands::Config => run_config(&config, cli.config.as_deref()),
    }
}

/// Stream recognition events until the process exits or Ctrl-C
async fn run_listen(
    config: &Config,
    device: Option<i32>,
    model: Option<std::path::PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let recognizer = Recognizer::resolve(config.recognizer.path.as_deref())?;

    // An explicit --model wins; otherwise use the configured model only
    // if it is actually installed, letting the recognizer fall back to
    // its built-in default.
    let model_path = model.or_else(|| {
        let path = config.model.model_path();
        if model::is_valid_model(&path) {
            Some(path)
        } else {
            tracing::warn!(
                "Configured model not installed at {:?}; recognizer will use its default",
                path
            );
            None
        }
    });

    let options = SessionOptions {
        device_index: device.unwrap_or(config.recognizer.device_index),
        model_path,
    };

    let handle = recognizer.start_session(options, move |event: RecognitionEvent| {
        print_event(&event, json)
    })?;

    let mut state = handle.state_watch();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, cancelling session");
            handle.cancel();
        }
        _ = state.wait_for(|s| *s == SessionState::Ended) => {}
    }

    let status = handle.wait().await?;
    if !status.success() {
        tracing::warn!("Recognizer exited with {}", status);
    }
    Ok(())
}

fn print_event(event: &RecognitionEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
        return;
    }

    if let Some(partial) = &event.partial {
        // Overwrite the partial hypothesis in place until it finalizes.
        eprint!("\r\x1b[K… {}", partial);
        let _ = std::io::stderr().flush();
    }
    if let Some(text) = &event.text {
        eprint!("\r\x1b[K");
        println!("{}", text);
    }
    if let Some(info) = &event.info {
        tracing::info!("recognizer: {}", info);
    }
    if let Some(error) = &event.error {
        tracing::error!("recognizer: {}", error);
    }
}

fn run_devices(config: &Config, json: bool) -> anyhow::Result<()> {
    let recognizer = Recognizer::resolve(config.recognizer.path.as_deref())?;
    let devices = recognizer.devices()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if devices.is_empty() {
        println!("No capture devices reported.");
    } else {
        for device in devices {
            println!("  [{}] {} ({})", device.index, device.name, device.id);
        }
    }
    Ok(())
}

fn run_version(config: &Config) -> anyhow::Result<()> {
    let recognizer = Recognizer::resolve(config.recognizer.path.as_deref())?;
    println!("{}", recognizer.version()?);
    Ok(())
}

async fn run_model(config: &Config, action: ModelAction) -> anyhow::Result<()> {
    let destination = config.model.model_path();

    match action {
        ModelAction::Ensure { url, force } => {
            let url = url
                .or_else(|| config.model.url.clone())
                .ok_or_else(|| anyhow::anyhow!(
                    "No archive URL: pass --url or set model.url in config"
                ))?;
            let temp_root = config.model.resolve_temp_root();

            model::ensure_model(url, &destination, temp_root, force).await?;
            println!("Model ready at {}", destination.display());
        }
        ModelAction::Status => {
            if model::is_valid_model(&destination) {
                println!("installed  {}", destination.display());
            } else {
                println!("missing    {}", destination.display());
                println!("\n  Run 'voskpipe model ensure' to download it.");
            }
        }
        ModelAction::Path => {
            println!("{}", destination.display());
        }
    }
    Ok(())
}

fn run_config(config: &Config, config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .or_else(Config::default_path);

    if let Some(path) = path {
        let status = if path.exists() { "" } else { " (not present, using defaults)" };
        println!("# Config file: {}{}", path.display(), status);
    }
    println!("# Models dir: {}", Config::models_dir().display());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
