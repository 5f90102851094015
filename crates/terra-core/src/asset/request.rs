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

use super::{AssetKey, AssetKind, LoadOptions};
use serde::{Deserialize, Serialize};

/// A request to load one asset, as submitted to the cache's preload queue.
///
/// Requests with a higher `priority` start first. Requests with equal
/// priority start in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Normalized key of the asset.
    #[serde(alias = "url")]
    pub key: AssetKey,
    /// What kind of asset the key points to.
    pub kind: AssetKind,
    /// Sampler overrides applied once loaded.
    #[serde(default)]
    pub options: LoadOptions,
    /// Scheduling priority; higher loads earlier.
    #[serde(default)]
    pub priority: i32,
}

impl LoadRequest {
    /// Creates a request with default options and priority `0`.
    pub fn new(url: impl Into<AssetKey>, kind: AssetKind) -> Self {
        Self {
            key: url.into(),
            kind,
            options: LoadOptions::default(),
            priority: 0,
        }
    }

    /// Shorthand for a texture request.
    pub fn texture(url: impl Into<AssetKey>) -> Self {
        Self::new(url, AssetKind::Texture)
    }

    /// Shorthand for a cube-texture request built from its face URLs.
    pub fn cube_texture<S: AsRef<str>>(faces: &[S]) -> Self {
        Self::new(AssetKey::cube(faces), AssetKind::CubeTexture)
    }

    /// Shorthand for a model request.
    pub fn model(url: impl Into<AssetKey>) -> Self {
        Self::new(url, AssetKind::Model)
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the sampler overrides.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }
}

/// One entry of a named texture set: a single image, or the six faces of a
/// cube map.
///
/// Deserializes from either a string or a list of strings, so a RON map like
/// `{"day": "earth/day.jpg", "sky": ["px.jpg", "nx.jpg", ...]}` reads directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextureSource {
    /// A 2D texture URL.
    Single(String),
    /// Cube-map face URLs, in `+x, -x, +y, -y, +z, -z` order.
    Cube(Vec<String>),
}

impl TextureSource {
    /// Turns the entry into a load request with the given options.
    pub fn into_request(self, options: LoadOptions) -> LoadRequest {
        match self {
            TextureSource::Single(url) => LoadRequest::texture(url),
            TextureSource::Cube(faces) => LoadRequest::cube_texture(faces.as_slice()),
        }
        .with_options(options)
    }
}

impl From<&str> for TextureSource {
    fn from(url: &str) -> Self {
        TextureSource::Single(url.to_owned())
    }
}

impl From<String> for TextureSource {
    fn from(url: String) -> Self {
        TextureSource::Single(url)
    }
}

impl<S: Into<String>> From<Vec<S>> for TextureSource {
    fn from(faces: Vec<S>) -> Self {
        TextureSource::Cube(faces.into_iter().map(Into::into).collect())
    }
}
