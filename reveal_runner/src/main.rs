mod wire;

use anyhow::{Context, Result, bail};
use motion_reveal::{ChannelSink, FrameBuffer, MotionRevealSession, SessionConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: reveal_runner <reference_image> <frames_dir> [config.json]");
        return Ok(());
    }
    let reference_path = Path::new(&args[1]);
    let frames_dir = Path::new(&args[2]);
    let config = match args.get(3) {
        Some(path) => load_config(Path::new(path))?,
        None => SessionConfig::installation(),
    };

    // --- 2. Frame Discovery ---
    let frame_paths = list_frames(frames_dir)?;
    let Some(first) = frame_paths.first() else {
        bail!("no frames found in {}", frames_dir.display());
    };
    let (width, height) = image::image_dimensions(first)
        .with_context(|| format!("failed to read dimensions of {}", first.display()))?;

    // --- 3. Session Initialization ---
    let mut session = MotionRevealSession::new(config)?;
    let (sink, mut events) = ChannelSink::channel();
    session.subscribe(sink);
    session.configure(width, height)?;

    let reference = image::open(reference_path)
        .with_context(|| format!("failed to open reference image {}", reference_path.display()))?;
    session.set_reference_image(FrameBuffer::from(reference));

    // --- 4. Event Transport ---
    let writer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        let mut written = 0usize;
        while let Some(event) = events.recv().await {
            match wire::encode(&event) {
                Ok(line) => {
                    if writeln!(stdout, "{line}").is_err() {
                        break;
                    }
                    written += 1;
                }
                Err(err) => warn!(%err, "failed to encode reveal event"),
            }
        }
        written
    });

    // --- 5. Main Processing Loop ---
    for path in &frame_paths {
        let frame = match image::open(path) {
            Ok(image) => FrameBuffer::from(image),
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable frame");
                continue;
            }
        };
        session.tick(frame);
        tokio::task::yield_now().await;
    }

    let progress = session.close();
    let written = writer.await.context("event writer task failed")?;
    info!(
        frames = frame_paths.len(),
        events = written,
        revealed = progress.revealed,
        total = progress.total,
        status = ?progress.status,
        "replay complete"
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    frames.sort();
    Ok(frames)
}
