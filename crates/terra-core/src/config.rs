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

//! Configuration structs with defaults and RON loading.

use crate::error::ConfigError;
use crate::quality::QualityLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for an application context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraConfig {
    /// Resource cache settings.
    pub cache: CacheConfig,
    /// Adaptive quality settings.
    pub quality: QualityConfig,
}

/// Resource cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on preload fetches running at the same time.
    /// A value of 0 is treated as 1.
    pub max_concurrent_loads: usize,
    /// Directory asset URLs are resolved against by the filesystem fetcher.
    pub asset_root: PathBuf,
}

/// Adaptive quality controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Frame rate the controller tries to hold.
    pub target_fps: f32,
    /// Level in effect before any measurement.
    pub initial_level: QualityLevel,
    /// Wall-clock time between two quality evaluations, in milliseconds.
    pub monitoring_interval_ms: u64,
    /// Samples required before FPS statistics are computed.
    pub min_frames_for_stats: usize,
    /// Frames that must be recorded since the last evaluation before another
    /// one may change the level.
    pub min_frames_for_quality_change: u32,
    /// Downgrade when `fps / target_fps` falls below this ratio.
    pub quality_change_threshold: f32,
    /// Upgrade when `fps / target_fps` rises above this ratio.
    pub upgrade_threshold: f32,
    /// Optional passes may be skipped while `fps < target_fps * frame_skip_ratio`.
    pub frame_skip_ratio: f32,
    /// Weight of the previous average in the exponential smoothing.
    pub smoothing: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: 4,
            asset_root: PathBuf::from("assets"),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            initial_level: QualityLevel::High,
            monitoring_interval_ms: 1000,
            min_frames_for_stats: 30,
            min_frames_for_quality_change: 60,
            quality_change_threshold: 0.8,
            upgrade_threshold: 1.1,
            frame_skip_ratio: 0.7,
            smoothing: 0.8,
        }
    }
}

impl CacheConfig {
    /// The effective concurrency bound (never zero).
    pub fn effective_max_concurrent_loads(&self) -> usize {
        self.max_concurrent_loads.max(1)
    }
}

impl QualityConfig {
    /// The evaluation interval as a [`Duration`].
    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring_interval_ms)
    }

    /// Target frame time in milliseconds.
    pub fn target_frame_time_ms(&self) -> f32 {
        1000.0 / self.target_fps
    }

    /// Returns a copy with values the controller cannot work with replaced.
    ///
    /// A `target_fps` that is not a positive number and a `smoothing` outside
    /// `[0, 1)` fall back to their defaults. `min_frames_for_stats` is clamped
    /// to `1..=window`, `window` being the number of samples the controller
    /// keeps. Each replacement is logged as a warning.
    pub fn sanitized(&self, window: usize) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        if !(config.target_fps.is_finite() && config.target_fps > 0.0) {
            log::warn!(
                "Invalid target_fps {}; using {}",
                config.target_fps,
                defaults.target_fps
            );
            config.target_fps = defaults.target_fps;
        }

        let window = window.max(1);
        let min_frames = config.min_frames_for_stats.clamp(1, window);
        if min_frames != config.min_frames_for_stats {
            log::warn!(
                "min_frames_for_stats {} is outside 1..={}; using {}",
                config.min_frames_for_stats,
                window,
                min_frames
            );
            config.min_frames_for_stats = min_frames;
        }

        if !(0.0..1.0).contains(&config.smoothing) {
            log::warn!(
                "Invalid smoothing {}; using {}",
                config.smoothing,
                defaults.smoothing
            );
            config.smoothing = defaults.smoothing;
        }
        config
    }
}

impl TerraConfig {
    /// Parses a configuration from RON. Missing sections and fields keep their defaults.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config = Self::from_ron_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TerraConfig::default();
        assert_eq!(config.cache.max_concurrent_loads, 4);
        assert_eq!(config.quality.target_fps, 60.0);
        assert_eq!(config.quality.min_frames_for_stats, 30);
        assert_eq!(config.quality.min_frames_for_quality_change, 60);
        assert_eq!(config.quality.monitoring_interval(), Duration::from_secs(1));
        assert_eq!(config.quality.initial_level, QualityLevel::High);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = TerraConfig::from_ron_str("(quality: (target_fps: 30.0))").unwrap();
        assert_eq!(config.quality.target_fps, 30.0);
        assert_eq!(config.quality.quality_change_threshold, 0.8);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_quality_level_by_name() {
        let config = TerraConfig::from_ron_str("(quality: (initial_level: low))").unwrap();
        assert_eq!(config.quality.initial_level, QualityLevel::Low);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = CacheConfig {
            max_concurrent_loads: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_max_concurrent_loads(), 1);
    }

    #[test]
    fn test_sanitized_replaces_unusable_values() {
        let config = QualityConfig {
            target_fps: 0.0,
            min_frames_for_stats: 500,
            smoothing: f32::NAN,
            ..Default::default()
        };
        let sanitized = config.sanitized(60);
        assert_eq!(sanitized.target_fps, 60.0);
        assert_eq!(sanitized.min_frames_for_stats, 60);
        assert_eq!(sanitized.smoothing, 0.8);

        let config = QualityConfig {
            target_fps: -30.0,
            min_frames_for_stats: 0,
            ..Default::default()
        };
        let sanitized = config.sanitized(60);
        assert_eq!(sanitized.target_fps, 60.0);
        assert_eq!(sanitized.min_frames_for_stats, 1);
    }

    #[test]
    fn test_sanitized_keeps_valid_values() {
        let config = TerraConfig::from_ron_str("(quality: (target_fps: 30.0, min_frames_for_stats: 10))")
            .unwrap()
            .quality;
        assert_eq!(config.sanitized(60), config);
        assert_eq!(QualityConfig::default().sanitized(60), QualityConfig::default());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result = TerraConfig::from_ron_str("{{not valid}}");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terra.ron");
        std::fs::write(
            &path,
            "// globe viewer\n(cache: (max_concurrent_loads: 2, asset_root: \"textures\"))",
        )
        .unwrap();

        let config = TerraConfig::load(&path).unwrap();
        assert_eq!(config.cache.max_concurrent_loads, 2);
        assert_eq!(config.cache.asset_root, PathBuf::from("textures"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TerraConfig::load(&dir.path().join("absent.ron"));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
