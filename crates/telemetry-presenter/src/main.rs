//! Presenter binary: load config, set up logging, print incoming messages.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use telemetry_presenter::{logging, MqttListener, PresenterConfig};

/// MQTT presenter for the CAN telemetry pipeline.
#[derive(Debug, Parser)]
#[command(name = "telemetry-presenter", version, about)]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PresenterConfig::load(&args.config)?;

    // Keep the appender guard alive so file logs are flushed on exit.
    let _guard = logging::init(config.log_file.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        broker = %config.broker,
        "Starting MQTT listener"
    );

    let listener = MqttListener::new(&config)?;
    let client = listener.client();
    let mut messages = listener.start();

    loop {
        tokio::select! {
            received = messages.recv() => match received {
                Some(message) => {
                    tracing::info!("[{}] {}", message.topic, message.text());
                }
                None => {
                    tracing::info!("Listener stopped");
                    break;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                if let Err(err) = client.disconnect().await {
                    tracing::warn!(error = %err, "Error during disconnect");
                }
                break;
            }
        }
    }

    Ok(())
}
