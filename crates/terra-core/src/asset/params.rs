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

use crate::quality::QualitySettings;
use serde::{Deserialize, Serialize};

/// Texture filtering mode, matching the usual GPU sampler choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Nearest texel, no mipmaps.
    Nearest,
    /// Bilinear, no mipmaps.
    #[default]
    Linear,
    /// Nearest texel from the nearest mip level.
    NearestMipmapNearest,
    /// Bilinear within the nearest mip level.
    LinearMipmapNearest,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

/// Color space the texture data is encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Gamma-encoded color data (albedo, emissive, city lights).
    #[default]
    Srgb,
    /// Linear data (normals, roughness, bump maps).
    Linear,
}

/// Caller overrides for how a texture should be sampled.
///
/// Every field is optional; unset fields fall back to the defaults of
/// [`SamplerParams::from_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Minification filter.
    pub min_filter: Option<FilterMode>,
    /// Magnification filter.
    pub mag_filter: Option<FilterMode>,
    /// Encoding of the texel data.
    pub color_space: Option<ColorSpace>,
    /// Flip the image vertically on upload.
    pub flip_y: Option<bool>,
    /// Build a mip chain on upload.
    pub generate_mipmaps: Option<bool>,
    /// Upper bound on anisotropic filtering for this texture. The active
    /// quality level still applies when it asks for less.
    pub anisotropy: Option<u16>,
}

/// The rendering parameters attached to a loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerParams {
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Anisotropic filtering level, driven by the active quality level.
    pub anisotropy: u16,
    /// Per-texture cap on [`anisotropy`](Self::anisotropy), from [`LoadOptions::anisotropy`].
    pub max_anisotropy: Option<u16>,
    /// Encoding of the texel data.
    pub color_space: ColorSpace,
    /// Flip the image vertically on upload.
    pub flip_y: bool,
    /// Build a mip chain on upload.
    pub generate_mipmaps: bool,
    /// Incremented on every in-place change; renderers compare it to know
    /// when their sampler is stale.
    pub revision: u64,
}

impl SamplerParams {
    /// Resolves caller options against the defaults and the active quality.
    pub fn from_options(options: &LoadOptions, settings: &QualitySettings) -> Self {
        Self {
            min_filter: options.min_filter.unwrap_or(FilterMode::LinearMipmapLinear),
            mag_filter: options.mag_filter.unwrap_or(FilterMode::Linear),
            anisotropy: capped(settings.anisotropy, options.anisotropy),
            max_anisotropy: options.anisotropy,
            color_space: options.color_space.unwrap_or_default(),
            flip_y: options.flip_y.unwrap_or(true),
            generate_mipmaps: options.generate_mipmaps.unwrap_or(true),
            revision: 0,
        }
    }

    /// The anisotropy these parameters should use under `settings`.
    pub fn anisotropy_for(&self, settings: &QualitySettings) -> u16 {
        capped(settings.anisotropy, self.max_anisotropy)
    }
}

fn capped(anisotropy: u16, max: Option<u16>) -> u16 {
    max.map_or(anisotropy, |max| anisotropy.min(max.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityLevel;

    #[test]
    fn test_defaults_are_trilinear_srgb() {
        let params =
            SamplerParams::from_options(&LoadOptions::default(), &QualityLevel::Medium.settings());
        assert_eq!(params.min_filter, FilterMode::LinearMipmapLinear);
        assert_eq!(params.mag_filter, FilterMode::Linear);
        assert_eq!(params.color_space, ColorSpace::Srgb);
        assert_eq!(params.anisotropy, 8);
        assert!(params.flip_y);
        assert!(params.generate_mipmaps);
    }

    #[test]
    fn test_overrides_win() {
        let options = LoadOptions {
            min_filter: Some(FilterMode::Nearest),
            color_space: Some(ColorSpace::Linear),
            flip_y: Some(false),
            ..Default::default()
        };
        let params = SamplerParams::from_options(&options, &QualityLevel::Low.settings());
        assert_eq!(params.min_filter, FilterMode::Nearest);
        assert_eq!(params.color_space, ColorSpace::Linear);
        assert!(!params.flip_y);
        assert_eq!(params.anisotropy, 4);
    }

    #[test]
    fn test_anisotropy_override_caps_quality() {
        let options = LoadOptions {
            anisotropy: Some(8),
            ..Default::default()
        };
        let params = SamplerParams::from_options(&options, &QualityLevel::High.settings());
        assert_eq!(params.anisotropy, 8);
        assert_eq!(params.anisotropy_for(&QualityLevel::Medium.settings()), 8);
        assert_eq!(params.anisotropy_for(&QualityLevel::Low.settings()), 4);
    }

    #[test]
    fn test_anisotropy_option_from_ron() {
        let options: LoadOptions = ron::from_str("(anisotropy: Some(8), flip_y: Some(false))").unwrap();
        assert_eq!(options.anisotropy, Some(8));
        assert_eq!(options.flip_y, Some(false));
    }
}
