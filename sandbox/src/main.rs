// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use terra_sdk::prelude::*;
use walkdir::WalkDir;

/// Preloads a globe asset directory and simulates a render loop that
/// slows down part way through, to show quality adaptation.
#[derive(Parser, Debug)]
#[command(name = "sandbox", about = "Terra asset cache and adaptive quality demo")]
struct Args {
    /// Asset directory (overrides `cache.asset_root` from the config).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// RON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Frame time before the slowdown, in milliseconds.
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f32,

    /// Frame time after the slowdown, in milliseconds.
    #[arg(long, default_value_t = 28.0)]
    slow_ms: f32,

    /// Frame at which the slowdown starts.
    #[arg(long, default_value_t = 200)]
    slow_after: usize,

    /// Texture quality to start with (high, medium, low).
    #[arg(long)]
    quality: Option<String>,
}

/// Logs pixel-ratio changes instead of resizing a real canvas.
struct LoggingSurface;

impl RenderSurface for LoggingSurface {
    fn set_pixel_ratio(&self, ratio: f32) {
        log::info!("Surface pixel ratio set to {ratio}");
    }
}

fn kind_for(path: &Path) -> Option<AssetKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" | "png" | "webp" => Some(AssetKind::Texture),
        "glb" | "gltf" | "obj" => Some(AssetKind::Model),
        _ => None,
    }
}

/// Builds load requests for every recognised file under `root`.
/// Textures load before models.
fn scan_assets(root: &Path) -> Vec<LoadRequest> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let kind = kind_for(entry.path())?;
            let relative = entry.path().strip_prefix(root).ok()?;
            let url = relative.to_string_lossy().replace('\\', "/");
            let priority = if kind == AssetKind::Texture { 1 } else { 0 };
            Some(LoadRequest::new(url, kind).with_priority(priority))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TerraConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TerraConfig::default(),
    };
    if let Some(name) = &args.quality {
        config.quality.initial_level = QualityLevel::from_name_or_medium(name);
    }
    let root = args.assets.clone().unwrap_or_else(|| config.cache.asset_root.clone());

    let fetcher = Arc::new(FsFetcher::new(&root));
    let mut context = AppContext::new(config, fetcher).with_surface(Arc::new(LoggingSurface));

    let requests = scan_assets(&root);
    log::info!("Found {} asset(s) under {}", requests.len(), root.display());

    let events = context.cache().subscribe();
    let summary = context.cache().preload(requests).await;
    for event in events.try_iter() {
        match event {
            LoadEvent::Progress { key, settled, submitted } => {
                log::debug!("[{settled}/{submitted}] {key}");
            }
            LoadEvent::Failed { key, reason } => log::warn!("Could not load {key}: {reason}"),
            _ => {}
        }
    }
    log::info!(
        "Preload finished: {} loaded, {} failed, progress {:.0}%",
        summary.loaded,
        summary.failed.len(),
        context.cache().progress() * 100.0
    );

    let mut clock = Instant::now();
    let mut skipped = 0;
    for frame in 0..args.frames {
        let delta = if frame < args.slow_after {
            args.frame_ms
        } else {
            args.slow_ms
        };
        let (render_extras, change) = context.frame_at(delta, clock);
        if !render_extras {
            skipped += 1;
        }
        if let Some(change) = change {
            log::info!(
                "Frame {frame}: {} -> {} at {:.1} fps",
                change.previous,
                change.current,
                change.fps
            );
        }
        clock += Duration::from_secs_f32((delta / 1000.0).max(0.0).min(3600.0));
    }

    let metrics = context.metrics();
    log::info!(
        "Simulated {} frames: {:.1} fps ({:.2} ms, worst {:.2} ms), quality {}, {} frame(s) without optional passes",
        args.frames,
        metrics.fps,
        metrics.frame_time_ms,
        metrics.worst_frame_ms,
        metrics.level,
        skipped
    );

    context.shutdown();
    Ok(())
}
