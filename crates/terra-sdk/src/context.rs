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

use crate::surface::{RenderSurface, SurfaceConsumer};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use terra_control::{AdaptiveQualityController, QualityMetrics};
use terra_core::asset::AssetFetcher;
use terra_core::{QualityChange, TerraConfig};
use terra_io::ResourceCache;

/// Owns the resource cache and the quality controller for one application.
///
/// The cache is registered as a quality consumer at construction, so every
/// level change re-applies texture settings. A [`RenderSurface`] can be added
/// with [`with_surface`](Self::with_surface) to follow pixel-ratio changes.
pub struct AppContext {
    config: TerraConfig,
    cache: ResourceCache,
    quality: AdaptiveQualityController,
    surface: Option<Arc<dyn RenderSurface>>,
    shut_down: bool,
}

impl AppContext {
    /// Builds the context from a configuration and the fetcher assets load through.
    pub fn new(config: TerraConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        let initial_level = config.quality.initial_level;
        let cache = ResourceCache::with_level(fetcher, &config.cache, initial_level);
        let mut quality = AdaptiveQualityController::new(config.quality.clone());
        quality.attach(Arc::new(cache.clone()));

        log::info!(
            "Application context ready (quality {}, target {} fps)",
            initial_level,
            quality.config().target_fps
        );
        Self {
            config,
            cache,
            quality,
            surface: None,
            shut_down: false,
        }
    }

    /// Builds the context from a RON configuration file.
    pub fn from_config_file(path: &Path, fetcher: Arc<dyn AssetFetcher>) -> Result<Self> {
        let config = TerraConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        Ok(Self::new(config, fetcher))
    }

    /// Attaches the render surface. Its pixel ratio is set right away.
    pub fn with_surface(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.quality.attach(Arc::new(SurfaceConsumer(surface.clone())));
        self.surface = Some(surface);
        self
    }

    /// The configuration the context was built from.
    pub fn config(&self) -> &TerraConfig {
        &self.config
    }

    /// The shared resource cache.
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The adaptive quality controller.
    pub fn quality(&self) -> &AdaptiveQualityController {
        &self.quality
    }

    /// Mutable access to the controller, e.g. for manual overrides.
    pub fn quality_mut(&mut self) -> &mut AdaptiveQualityController {
        &mut self.quality
    }

    /// The attached render surface, if any.
    pub fn surface(&self) -> Option<&Arc<dyn RenderSurface>> {
        self.surface.as_ref()
    }

    /// Records a frame and tells whether optional passes should run.
    pub fn frame(&mut self, delta_ms: f32) -> bool {
        self.frame_at(delta_ms, Instant::now()).0
    }

    /// Like [`frame`](Self::frame) with an explicit timestamp; also returns the
    /// level change the frame caused.
    pub fn frame_at(&mut self, delta_ms: f32, now: Instant) -> (bool, Option<QualityChange>) {
        let change = self.quality.record_frame_at(delta_ms, now);
        (self.quality.should_render_frame(), change)
    }

    /// Current quality measurements.
    pub fn metrics(&self) -> QualityMetrics {
        self.quality.metrics()
    }

    /// Disposes the controller and the cache. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.quality.dispose();
        self.cache.dispose();
        log::info!("Application context shut down");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
