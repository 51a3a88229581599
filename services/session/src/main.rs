use anyhow::{Context, Result};
use clap::Parser;
use convai_realtime::types::audio::Base64EncodedAudioBytes;
use echoes_core::broker::HttpSessionBroker;
use echoes_core::generic_types::TransportEvent;
use echoes_core::microphone::Microphone;
use echoes_core::topic::Topic;
use echoes_core::{Catalog, ConversationController, SessionUpdate};
use echoes_session::config::{Config, QUIET_WINDOW_MS};
use echoes_session::convai_adapter::ConvaiAdapter;
use echoes_session::microphone::KeyboardInput;
use echoes_session::presenter;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(name = "echoes-session", about = "Talk with a topic guide from the terminal")]
struct Cli {
    /// Id of the topic to talk about, e.g. "apollo-11"
    topic_id: String,

    /// Base URL of the session broker (overrides BROKER_URL)
    #[arg(long)]
    broker_url: Option<String>,

    /// Type your turns instead of speaking them
    #[arg(long)]
    text: bool,

    /// Input device name; the host default when omitted
    #[cfg(feature = "microphone")]
    #[arg(long)]
    device: Option<String>,

    /// List input devices and exit
    #[cfg(feature = "microphone")]
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();

    #[cfg(feature = "microphone")]
    if args.list_devices {
        println!("{}", echoes_native_utils::device::get_available_inputs()?);
        return Ok(());
    }

    let catalog = Catalog::builtin().context("Failed to load topics")?;
    let topic = catalog
        .get_by_id(&args.topic_id)
        .cloned()
        .with_context(|| {
            let ids: Vec<&str> = catalog.topics().iter().map(|t| t.id.as_str()).collect();
            format!(
                "Unknown topic '{}'. Available topics: {}",
                args.topic_id,
                ids.join(", ")
            )
        })?;

    let broker_url = args.broker_url.clone().unwrap_or(config.broker_url.clone());
    tracing::info!("Using session broker at {}", broker_url);

    // Audio chunks flow from the capture thread to the session loop.
    let (audio_tx, audio_rx) = mpsc::channel::<Base64EncodedAudioBytes>(64);

    if args.text {
        drop(audio_tx);
        return run(topic, KeyboardInput, &broker_url, audio_rx).await;
    }

    #[cfg(feature = "microphone")]
    let microphone =
        echoes_session::microphone::DeviceMicrophone::new(args.device.clone(), audio_tx);

    #[cfg(not(feature = "microphone"))]
    let microphone = {
        drop(audio_tx);
        echoes_session::microphone::Unavailable::new(
            "this build has no audio capture; rebuild with --features microphone or pass --text",
        )
    };

    run(topic, microphone, &broker_url, audio_rx).await
}

type Controller<M> =
    ConversationController<M, HttpSessionBroker, ConvaiAdapter<convai_realtime::Client>>;

/// Prints updates; a new image in focus is also shared with the agent.
async fn present<M: Microphone>(
    controller: &mut Controller<M>,
    agent_name: &str,
    updates: Vec<SessionUpdate>,
) {
    for update in &updates {
        println!("{}", presenter::render(update, controller.topic(), agent_name));
        if let SessionUpdate::ImageFocus(index) = update {
            if let Err(e) = controller.share_image_context(*index).await {
                tracing::warn!("failed to share image context: {}", e);
            }
        }
    }
}

async fn run<M: Microphone>(
    topic: Topic,
    microphone: M,
    broker_url: &str,
    mut audio_rx: mpsc::Receiver<Base64EncodedAudioBytes>,
) -> Result<()> {
    let broker = HttpSessionBroker::new(broker_url);
    let transport = ConvaiAdapter::new(Duration::from_millis(QUIET_WINDOW_MS));
    let mut controller: Controller<M> =
        ConversationController::new(topic, microphone, broker, transport);

    println!("Connecting to \"{}\"...", controller.topic().title);
    let mut events = match controller.start().await {
        Ok(events) => events,
        Err(e) => {
            println!("[{}]", controller.orb_state());
            return Err(e).context("Failed to start the conversation");
        }
    };

    let agent_name = controller
        .persona()
        .map(|persona| persona.name.clone())
        .unwrap_or_else(|| "Guide".to_string());
    println!(
        "Connected. You are talking with {}. Type a message, or /quit to leave.",
        agent_name
    );
    println!("[{}]", controller.orb_state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut audio_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let closed = event == TransportEvent::Closed;
                let updates = controller.handle_event(event);
                present(&mut controller, &agent_name, updates).await;
                if closed {
                    println!("The conversation has ended.");
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line == "/quit" {
                        break;
                    }
                    if line.is_empty() {
                        continue;
                    }
                    match controller.send_text(line).await {
                        Ok(updates) => present(&mut controller, &agent_name, updates).await,
                        Err(e) => println!("Error: {}", e),
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!("Failed to read from stdin: {}", e);
                    stdin_open = false;
                }
            },
            chunk = audio_rx.recv(), if audio_open => match chunk {
                Some(chunk) => {
                    if let Err(e) = controller.send_audio(chunk).await {
                        tracing::warn!("Failed to send microphone audio: {}", e);
                    }
                }
                None => audio_open = false,
            },
            _ = &mut ctrl_c => {
                println!();
                break;
            }
        }
    }

    controller.stop().await;
    println!("[{}]", controller.orb_state());
    Ok(())
}
