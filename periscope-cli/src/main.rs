use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use colored::*;
use periscope_client::{Session, SessionConfig, SessionError, SessionState};
use periscope_core::utils::DEFAULT_STUN_ADDR;
use periscope_core::{CallOptions, IceServerConfig, VideoFormat};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "periscope", version, about = "Watch a remote WebRTC peer")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, env = "PERISCOPE_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a call and stay connected until Ctrl-C or the peer hangs up.
    Call(CallArgs),
    /// List the video presets the peer understands.
    Formats,
}

#[derive(Args)]
struct CallArgs {
    /// Signaling endpoint, e.g. ws://raspberrypi.local:8080/stream/webrtc
    #[arg(short, long, env = "PERISCOPE_ENDPOINT")]
    endpoint: String,

    /// Preset code ("35") or geometry ("800x480@30").
    #[arg(short, long, env = "PERISCOPE_FORMAT", default_value_t = VideoFormat::default())]
    format: VideoFormat,

    /// Let the peer pick a software encoder.
    #[arg(long, env = "PERISCOPE_NO_HW_CODEC")]
    no_hw_codec: bool,

    /// STUN/TURN url, repeatable. Pass `none` for host candidates only.
    #[arg(
        long = "ice-server",
        env = "PERISCOPE_ICE_SERVERS",
        value_delimiter = ',',
        default_value = DEFAULT_STUN_ADDR
    )]
    ice_servers: Vec<String>,

    /// Seconds to wait for the signaling endpoint.
    #[arg(long, env = "PERISCOPE_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,
}

impl CallArgs {
    fn into_config(self) -> SessionConfig {
        let options = CallOptions::new(self.format).with_hardware_codec(!self.no_hw_codec);
        let ice_servers = self
            .ice_servers
            .into_iter()
            .filter(|url| !url.is_empty() && !url.eq_ignore_ascii_case("none"))
            .map(IceServerConfig::new)
            .collect();

        SessionConfig::new(self.endpoint)
            .with_options(options)
            .with_ice_servers(ice_servers)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Formats => {
            print_formats();
            Ok(())
        }
        Commands::Call(args) => run_call(args.into_config()).await,
    }
}

fn print_formats() {
    println!("{}", "Video presets".green().bold());
    for format in VideoFormat::ALL {
        let marker = if format == VideoFormat::default() {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {:>4}  {}{}", format.code().cyan(), format, marker);
    }
}

async fn run_call(config: SessionConfig) -> Result<()> {
    println!(
        "{} {} ({})",
        "📡 Calling".green().bold(),
        config.endpoint,
        config.options.video_format()
    );

    let session = Arc::new(Session::new(config));
    let received = Arc::new(AtomicUsize::new(0));

    let counter = received.clone();
    session.on_remote_stream(move |stream| {
        println!("{} {} track '{}'", "🎥 Remote".cyan(), stream.kind, stream.track_id);
        let Some(track) = stream.track else { return };
        let counter = counter.clone();
        tokio::spawn(async move {
            while let Ok((packet, _)) = track.read_rtp().await {
                counter.fetch_add(packet.payload.len(), Ordering::Relaxed);
            }
        });
    });
    session.on_reliable_channel(|channel| {
        println!(
            "{} '{}', type lines to forward them",
            "⌨️  Input channel open".cyan(),
            channel.label()
        );
    });
    session.on_message(|text| println!("{} {}", "💬".cyan(), text));
    session.on_close(|event| match &event.error {
        None => println!("{} {}", "👋 Closed".yellow().bold(), event.reason),
        Some(err) => println!("{} {}", "💥 Closed with error:".red().bold(), err),
    });

    session.call().await.context("Call failed")?;
    info!("Call placed as session {}", session.id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    let mut stats = tokio::time::interval(Duration::from_secs(5));

    let end = loop {
        tokio::select! {
            state = session.wait_closed() => break state,
            _ = &mut ctrl_c => {
                println!("{}", "Hanging up...".yellow());
                if let Err(e) = session.hangup() {
                    warn!("Hangup rejected: {}", e);
                }
                break session.wait_closed().await;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => forward_input(&session, line).await,
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = stats.tick() => {
                if session.state() == SessionState::Connected {
                    info!("Received {} bytes of media", received.load(Ordering::Relaxed));
                }
            }
        }
    };

    println!(
        "Session ended {} after {} bytes of media",
        end.to_string().bold(),
        received.load(Ordering::Relaxed)
    );
    if end == SessionState::Failed {
        bail!("session failed");
    }
    Ok(())
}

async fn forward_input(session: &Session, line: String) {
    match session.send_input(Bytes::from(line)).await {
        Ok(()) => {}
        Err(SessionError::ChannelNotOpen(_)) => {
            println!("{}", "Input channel is not open yet".yellow());
        }
        Err(e) => warn!("Failed to forward input: {}", e),
    }
}
