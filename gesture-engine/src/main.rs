//! gesture-engine - replay recorded landmark frames through the engine.
//!
//! Reads one JSON tracking frame per line and prints every command and
//! recording event as a JSON line on stdout.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use gesture_engine::events::CommandEvent;
use gesture_engine::recognition::landmarks::{Hand, RawTrackingFrame, TrackingFrame};
use gesture_engine::recognition::recorder::{RecordingEvent, RecordingRequest};
use gesture_engine::store::{GestureCatalog, JsonFileStore, MemoryStore, TemplateKind, TemplateStore};
use gesture_engine::{Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "gesture-engine", about = "Replay hand-landmark frames through the gesture engine")]
struct Cli {
    /// JSON-lines file of tracking frames
    #[arg(long)]
    frames: PathBuf,

    /// Engine config (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gesture catalog (JSON); created on first write, in-memory when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Record a new gesture with this id, starting at the first frame
    #[arg(long)]
    record: Option<String>,

    /// Recorded gesture kind: static or dynamic
    #[arg(long, default_value = "static")]
    kind: String,

    /// Display label for the recorded gesture
    #[arg(long)]
    label: Option<String>,

    /// Hand to record: left or right
    #[arg(long, default_value = "right")]
    hand: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_engine=info".into()),
        )
        .init();

    info!("gesture-engine v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let store: Arc<dyn TemplateStore> = match &cli.catalog {
        Some(path) => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("opening catalog {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new(GestureCatalog::default())),
    };

    let request = match &cli.record {
        Some(id) => Some(recording_request(&cli, id)?),
        None => None,
    };

    let file = std::fs::File::open(&cli.frames)
        .with_context(|| format!("opening frames {}", cli.frames.display()))?;

    let mut engine = Engine::new(config, store);
    let mut commands: Vec<CommandEvent> = Vec::new();
    let mut notes: Vec<RecordingEvent> = Vec::new();
    let mut pending = request;
    let mut frame_count = 0usize;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", cli.frames.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawTrackingFrame = match serde_json::from_str(&line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no + 1, e);
                continue;
            }
        };
        let frame = TrackingFrame::from_raw(raw);

        if let Some(request) = pending.take() {
            engine.start_recording(request, frame.timestamp_s, &mut notes);
        }
        engine.process_frame(&frame, &mut commands, &mut notes);
        frame_count += 1;

        for event in notes.drain(..) {
            writeln!(out, "{}", json!({ "type": "recording", "event": event }))?;
        }
        for event in commands.drain(..) {
            writeln!(out, "{}", json!({ "type": "command", "event": event }))?;
        }
    }

    if engine.is_recording() {
        warn!("Frames ended before the recording finished");
    }
    info!("Replayed {} frames", frame_count);
    Ok(())
}

fn recording_request(cli: &Cli, id: &str) -> anyhow::Result<RecordingRequest> {
    let Some(kind) = TemplateKind::from_str(&cli.kind) else {
        bail!("unknown gesture kind: {} (use static or dynamic)", cli.kind);
    };
    let Some(hand) = Hand::from_str(&cli.hand) else {
        bail!("unknown hand: {} (use left or right)", cli.hand);
    };
    let mut request = RecordingRequest::new(id, kind);
    request.hand = hand;
    if let Some(label) = &cli.label {
        request.label = label.clone();
    }
    Ok(request)
}
