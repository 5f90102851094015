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

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use terra_sdk::prelude::*;

#[derive(Default)]
struct EchoFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl AssetFetcher for EchoFetcher {
    async fn fetch(&self, key: &AssetKey, _kind: AssetKind) -> anyhow::Result<terra_core::asset::AssetPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(terra_core::asset::AssetPayload::Image(key.as_str().as_bytes().to_vec()))
    }
}

#[derive(Default)]
struct RecordingSurface {
    ratios: Mutex<Vec<f32>>,
}

impl RenderSurface for RecordingSurface {
    fn set_pixel_ratio(&self, ratio: f32) {
        self.ratios.lock().unwrap().push(ratio);
    }
}

fn drive(context: &mut AppContext, frames: usize, frame_ms: u64) -> Vec<QualityChange> {
    let mut clock = Instant::now();
    let mut changes = Vec::new();
    for _ in 0..frames {
        if let (_, Some(change)) = context.frame_at(frame_ms as f32, clock) {
            changes.push(change);
        }
        clock += Duration::from_millis(frame_ms);
    }
    changes
}

#[tokio::test]
async fn slow_frames_lower_texture_and_surface_quality() {
    let fetcher = Arc::new(EchoFetcher::default());
    let surface = Arc::new(RecordingSurface::default());
    let mut context =
        AppContext::new(TerraConfig::default(), fetcher.clone()).with_surface(surface.clone());

    let day = context
        .cache()
        .load_texture("earth/day.jpg", LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(day.anisotropy(), 16);
    assert_eq!(*surface.ratios.lock().unwrap(), vec![2.0]);

    let changes = drive(&mut context, 81, 25);
    assert_eq!(changes.len(), 1);
    assert_eq!(context.metrics().level, QualityLevel::Medium);
    assert_eq!(day.anisotropy(), 8);
    assert_eq!(*surface.ratios.lock().unwrap(), vec![2.0, 1.5]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn initial_level_comes_from_config() {
    let config = TerraConfig::from_ron_str("(quality: (initial_level: low))").unwrap();
    let context = AppContext::new(config, Arc::new(EchoFetcher::default()));

    assert_eq!(context.quality().level(), QualityLevel::Low);
    assert_eq!(context.cache().quality_level(), QualityLevel::Low);
    let texture = context
        .cache()
        .load_texture("stars.jpg", LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(texture.anisotropy(), 4);
}

#[tokio::test]
async fn frame_reports_render_advice() {
    let mut context = AppContext::new(TerraConfig::default(), Arc::new(EchoFetcher::default()));
    assert!(context.frame(16.0));

    let mut clock = Instant::now();
    let mut render = true;
    for _ in 0..60 {
        render = context.frame_at(40.0, clock).0;
        clock += Duration::from_millis(40);
    }
    assert!(!render);
}

#[tokio::test]
async fn shutdown_disposes_everything() {
    let fetcher = Arc::new(EchoFetcher::default());
    let mut context = AppContext::new(TerraConfig::default(), fetcher.clone());
    let handle = context
        .cache()
        .load_texture("day.jpg", LoadOptions::default())
        .await
        .unwrap();

    context.shutdown();
    context.shutdown();

    assert!(handle.is_released());
    assert!(context.cache().is_disposed());
    assert!(context.quality().is_disposed());
    assert!(matches!(
        context.cache().load_texture("day.jpg", LoadOptions::default()).await,
        Err(AssetError::Disposed)
    ));
    assert!(drive(&mut context, 200, 50).is_empty());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn context_loads_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terra.ron");
    std::fs::write(&path, "(cache: (max_concurrent_loads: 2))").unwrap();

    let context = AppContext::from_config_file(&path, Arc::new(EchoFetcher::default())).unwrap();
    assert_eq!(context.cache().max_concurrent_loads(), 2);

    let missing = AppContext::from_config_file(&dir.path().join("nope.ron"), Arc::new(EchoFetcher::default()));
    assert!(missing.is_err());
}
