mod loader;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use plaza_assets::QueuedLoader;
use plaza_client::{Client, ClientConfig, Event, SessionState};
use plaza_input::InputEvent;
use plaza_net::{LinkEvent, Outbox, RecordingOutbox, TransportConfig, spawn_ws_transport};
use plaza_render::{DebugTextRenderer, Frame, Renderer};
use plaza_tools::{StoreInspector, TranscriptWriter, read_transcript};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use crate::loader::{BlockingPoolLoader, serve_queue};

#[derive(Parser)]
#[command(name = "plaza-cli", about = "Terminal client for a shared plaza world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective defaults
    Info {
        /// YAML config file to show merged with defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Join a server and drive the player from stdin (+up, -up, fast, blur, resize W H, status, quit)
    Connect {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Server WebSocket URL
        #[arg(short, long)]
        url: Option<String>,
        /// Display name to join with
        #[arg(short, long)]
        name: Option<String>,
        /// Directory sprite references resolve against
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Record inbound frames to a JSONL transcript
        #[arg(long)]
        record: Option<PathBuf>,
        /// Print every composed frame
        #[arg(long)]
        frames: bool,
    },
    /// Feed a recorded transcript through the client and print the final frame
    Replay {
        /// Transcript written by `connect --record`
        file: PathBuf,
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory sprite references resolve against
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { config } => {
            let config = load_config(config)?;
            println!("plaza-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("server: {}", config.server_url);
            println!("username: {}", config.username);
            println!("assets: {}", config.asset_root.display());
            println!(
                "background: {}",
                config.background.as_deref().unwrap_or("(none)")
            );
            println!("world: {}x{}", config.world_width, config.world_height);
            println!("surface: {}x{}", config.surface_width, config.surface_height);
            println!("tick: {:?} retry: {:?}", config.tick(), config.retry_delay());
        }
        Commands::Connect {
            config,
            url,
            name,
            assets,
            record,
            frames,
        } => {
            let mut config = load_config(config)?;
            if let Some(url) = url {
                config.server_url = url;
            }
            if let Some(name) = name {
                config.username = name;
            }
            if let Some(assets) = assets {
                config.asset_root = assets;
            }
            config.validate()?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(connect(config, record, frames))?;
        }
        Commands::Replay {
            file,
            config,
            assets,
        } => {
            let mut config = load_config(config)?;
            if let Some(assets) = assets {
                config.asset_root = assets;
            }
            replay(&config, &file)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

/// One line typed on stdin.
#[derive(Debug, PartialEq)]
enum Command {
    Input(InputEvent),
    Blur,
    Resize(f32, f32),
    Status,
    Quit,
}

fn parse_command(line: &str) -> anyhow::Result<Command> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("quit") | Some("exit") => Ok(Command::Quit),
        Some("status") => Ok(Command::Status),
        Some("blur") => Ok(Command::Blur),
        Some("resize") => {
            let width = words.next().context("resize needs a width")?.parse()?;
            let height = words.next().context("resize needs a height")?.parse()?;
            Ok(Command::Resize(width, height))
        }
        Some(_) => Ok(Command::Input(line.parse()?)),
        None => anyhow::bail!("empty command"),
    }
}

fn print_status<O: Outbox>(client: &Client<O>) {
    let ctx = client.context();
    println!("{}", StoreInspector::summary(&ctx.world, ctx.session.local()));
    let badge = ctx.status_badge();
    let viewport = ctx.camera.viewport();
    println!(
        "Link: {} viewport=({:.0}, {:.0}) redraws={} sprites ready={} pending={} failed={}",
        badge.text,
        viewport.x,
        viewport.y,
        ctx.redraws,
        ctx.catalog.ready_count(),
        ctx.catalog.pending_count(),
        ctx.catalog.failed_count()
    );
    if let Some(local) = ctx.session.local() {
        if let Some(info) = StoreInspector::inspect_player(&ctx.world, local) {
            println!("{info}");
        }
    }
}

async fn connect(
    config: ClientConfig,
    record: Option<PathBuf>,
    print_frames: bool,
) -> anyhow::Result<()> {
    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let outbox = spawn_ws_transport(
        TransportConfig {
            url: config.server_url.clone(),
            retry_delay: config.retry_delay(),
        },
        link_tx,
    );
    let (sprite_tx, mut sprite_rx) = mpsc::unbounded_channel();
    let loader = BlockingPoolLoader::new(config.asset_root.clone(), sprite_tx);
    let mut client = Client::from_config(&config, loader, outbox);

    let mut transcript = match record {
        Some(path) => Some(
            TranscriptWriter::create(&path)
                .with_context(|| format!("creating transcript {}", path.display()))?,
        ),
        None => None,
    };
    let started = Instant::now();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(config.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut renderer = DebugTextRenderer::new();

    tracing::info!(url = %config.server_url, username = %config.username, "starting session");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        let event = tokio::select! {
            Some(link) = link_rx.recv() => {
                if let (Some(writer), LinkEvent::Message(text)) = (transcript.as_mut(), &link) {
                    writer.record(started.elapsed(), text)?;
                }
                Event::Link(link)
            }
            Some((key, result)) = sprite_rx.recv() => Event::SpriteResolved { key, result },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => match parse_command(&line) {
                    Ok(Command::Input(input)) => Event::Input(input),
                    Ok(Command::Blur) => Event::Blur,
                    Ok(Command::Resize(width, height)) => Event::Resize { width, height },
                    Ok(Command::Status) => {
                        print_status(&client);
                        continue;
                    }
                    Ok(Command::Quit) => break Ok(()),
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                },
                None => {
                    tracing::debug!("stdin closed; running until interrupted");
                    stdin_open = false;
                    continue;
                }
            },
            _ = ticker.tick() => Event::Tick,
            _ = &mut ctrl_c => break Ok(()),
        };

        if let Some(frame) = client.handle(event) {
            present(&mut renderer, &frame, print_frames);
        }
        if let SessionState::Rejected { reason } = client.session() {
            break Err(anyhow::anyhow!("join rejected: {reason}"));
        }
    };

    if let Some(mut writer) = transcript {
        writer.flush()?;
        tracing::info!(frames = writer.written(), "transcript saved");
    }
    print_status(&client);
    outcome
}

fn present(renderer: &mut DebugTextRenderer, frame: &Frame, print_frames: bool) {
    let text = renderer.render(frame);
    if print_frames {
        print!("{text}");
    } else {
        tracing::trace!(
            drawn = frame.stats.drawn,
            culled = frame.stats.culled,
            missing = frame.stats.missing,
            "frame"
        );
    }
}

fn replay(config: &ClientConfig, file: &Path) -> anyhow::Result<()> {
    let entries = read_transcript(file)
        .with_context(|| format!("reading transcript {}", file.display()))?;
    println!("Replaying {} frames from {}", entries.len(), file.display());

    let loader = QueuedLoader::new();
    let queue = loader.queue();
    let mut client = Client::from_config(config, loader, RecordingOutbox::new());
    client.handle(Event::Link(LinkEvent::Opened));
    for entry in &entries {
        client.handle(Event::Link(LinkEvent::Message(entry.frame.clone())));
    }

    // Compose, load what the frame asked for, and repeat until nothing new is requested.
    let mut last = client.handle(Event::Tick);
    while serve_queue(&queue, &config.asset_root, &mut client) > 0 {
        if let Some(frame) = client.handle(Event::Tick) {
            last = Some(frame);
        }
    }

    if let Some(frame) = last {
        print!("{}", DebugTextRenderer::new().render(&frame));
    }
    print_status(&client);

    if let SessionState::Rejected { reason } = client.session() {
        anyhow::bail!("join rejected: {reason}");
    }
    if let Some(span) = entries.last().map(|e| Duration::from_millis(e.at_ms)) {
        println!("Recorded span: {span:?}");
    }
    Ok(())
}
