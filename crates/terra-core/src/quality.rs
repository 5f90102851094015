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

//! Discrete render-quality tiers and the settings they map to.
//!
//! The quality controller decides *which* level is active; consumers such as
//! the resource cache and the render surface decide what a level means for
//! them by implementing [`QualityConsumer`].

use crate::error::QualityParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fidelity tier. Ordering follows the ordinal: `High < Medium < Low`,
/// so a larger value means a cheaper, lower-quality frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Full pixel ratio and 16x anisotropy.
    #[default]
    High,
    /// Reduced pixel ratio and 8x anisotropy.
    Medium,
    /// Native pixel ratio and 4x anisotropy.
    Low,
}

impl QualityLevel {
    /// All levels, best first.
    pub const ALL: [QualityLevel; 3] = [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low];

    /// Position in [`QualityLevel::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Looks a level up by ordinal.
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    /// The next cheaper level, or `None` at [`QualityLevel::Low`].
    pub fn degraded(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// The next better level, or `None` at [`QualityLevel::High`].
    pub fn improved(self) -> Option<Self> {
        self.ordinal().checked_sub(1).and_then(Self::from_ordinal)
    }

    /// Lowercase name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            QualityLevel::High => "high",
            QualityLevel::Medium => "medium",
            QualityLevel::Low => "low",
        }
    }

    /// The fixed settings record for this level.
    pub fn settings(self) -> QualitySettings {
        match self {
            QualityLevel::High => QualitySettings {
                pixel_ratio: 2.0,
                texture_quality: 1.0,
                anisotropy: 16,
            },
            QualityLevel::Medium => QualitySettings {
                pixel_ratio: 1.5,
                texture_quality: 0.75,
                anisotropy: 8,
            },
            QualityLevel::Low => QualitySettings {
                pixel_ratio: 1.0,
                texture_quality: 0.5,
                anisotropy: 4,
            },
        }
    }

    /// Parses a level name, falling back to [`QualityLevel::Medium`] with a
    /// warning when the name is unknown.
    pub fn from_name_or_medium(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: QualityParseError| {
            log::warn!("{err}. Using 'medium' instead.");
            QualityLevel::Medium
        })
    }
}

impl FromStr for QualityLevel {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityLevel::High),
            "medium" => Ok(QualityLevel::Medium),
            "low" => Ok(QualityLevel::Low),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a quality level means in concrete rendering terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Device pixel ratio the renderer should draw at.
    pub pixel_ratio: f32,
    /// Texture resolution scale (1.0 = full size).
    pub texture_quality: f32,
    /// Anisotropic filtering level for textures.
    pub anisotropy: u16,
}

/// Payload broadcast whenever the active quality level changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityChange {
    /// Level before the change.
    pub previous: QualityLevel,
    /// Level now in effect.
    pub current: QualityLevel,
    /// Settings of the new level.
    pub settings: QualitySettings,
    /// Smoothed FPS that triggered the change (0 for manual overrides before
    /// any frame was measured).
    pub fps: f32,
}

/// Anything that reacts to quality changes: the asset cache re-applies
/// anisotropy, a renderer adjusts its pixel ratio.
///
/// Consumers are called synchronously on the thread that recorded the frame
/// and must not block.
pub trait QualityConsumer: Send + Sync {
    /// Applies the settings of `level`.
    fn apply_quality(&self, level: QualityLevel, settings: &QualitySettings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_cost() {
        assert!(QualityLevel::High < QualityLevel::Medium);
        assert!(QualityLevel::Medium < QualityLevel::Low);
        assert_eq!(QualityLevel::Low.ordinal(), 2);
    }

    #[test]
    fn test_stepping_never_skips() {
        assert_eq!(QualityLevel::High.degraded(), Some(QualityLevel::Medium));
        assert_eq!(QualityLevel::Medium.degraded(), Some(QualityLevel::Low));
        assert_eq!(QualityLevel::Low.degraded(), None);

        assert_eq!(QualityLevel::Low.improved(), Some(QualityLevel::Medium));
        assert_eq!(QualityLevel::Medium.improved(), Some(QualityLevel::High));
        assert_eq!(QualityLevel::High.improved(), None);
    }

    #[test]
    fn test_settings_table() {
        let high = QualityLevel::High.settings();
        assert_eq!(high.pixel_ratio, 2.0);
        assert_eq!(high.anisotropy, 16);

        let medium = QualityLevel::Medium.settings();
        assert_eq!(medium.pixel_ratio, 1.5);
        assert_eq!(medium.texture_quality, 0.75);
        assert_eq!(medium.anisotropy, 8);

        let low = QualityLevel::Low.settings();
        assert_eq!(low.pixel_ratio, 1.0);
        assert_eq!(low.anisotropy, 4);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("High".parse::<QualityLevel>(), Ok(QualityLevel::High));
        assert_eq!(" low ".parse::<QualityLevel>(), Ok(QualityLevel::Low));
        assert!("ultra".parse::<QualityLevel>().is_err());
    }

    #[test]
    fn test_unknown_name_falls_back_to_medium() {
        assert_eq!(QualityLevel::from_name_or_medium("ultra"), QualityLevel::Medium);
        assert_eq!(QualityLevel::from_name_or_medium("low"), QualityLevel::Low);
    }
}
