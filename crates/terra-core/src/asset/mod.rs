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

//! Provides the foundational types for Terra's asset system.
//!
//! This module defines the "common language" for asset-related operations. It
//! contains the contracts the cache implements or consumes, but it has no
//! knowledge of how assets are fetched or where they are stored.
//!
//! The key components are:
//! - [`AssetKey`]: the normalized URL every asset is identified by.
//! - [`Asset`] and [`AssetHandle`]: a loaded payload with mutable sampler state,
//!   and the shared pointer handed out to consumers.
//! - [`LoadRequest`] and [`LoadOptions`]: what the host asks for.
//! - [`AssetFetcher`]: the async seam to the network or filesystem.

mod fetch;
mod handle;
mod key;
mod params;
mod request;

pub use fetch::*;
pub use handle::*;
pub use key::*;
pub use params::*;
pub use request::*;

use crate::quality::QualitySettings;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// The category of a loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// A single 2D image.
    Texture,
    /// Six images forming an environment cube.
    CubeTexture,
    /// A geometry/scene file.
    Model,
}

impl AssetKind {
    /// Returns `true` for kinds that carry sampler state affected by quality changes.
    pub fn is_texture(self) -> bool {
        matches!(self, AssetKind::Texture | AssetKind::CubeTexture)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetKind::Texture => "texture",
            AssetKind::CubeTexture => "cube_texture",
            AssetKind::Model => "model",
        };
        f.write_str(name)
    }
}

/// Decoded data for an asset. The cache never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPayload {
    /// Bytes of a single image.
    Image(Vec<u8>),
    /// Bytes of each cube face, in the order the faces were requested.
    Cube(Vec<Vec<u8>>),
    /// Bytes of a model file.
    Model(Vec<u8>),
}

impl AssetPayload {
    /// Total number of payload bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            AssetPayload::Image(bytes) | AssetPayload::Model(bytes) => bytes.len(),
            AssetPayload::Cube(faces) => faces.iter().map(Vec::len).sum(),
        }
    }
}

/// A loaded asset.
///
/// The payload is immutable once loaded. Sampler parameters sit behind a lock
/// so a quality change can update every cached asset in place, without
/// fetching anything again.
#[derive(Debug)]
pub struct Asset {
    key: AssetKey,
    kind: AssetKind,
    payload: AssetPayload,
    params: RwLock<SamplerParams>,
    released: AtomicBool,
}

impl Asset {
    /// Creates a new asset from a freshly fetched payload.
    pub fn new(key: AssetKey, kind: AssetKind, payload: AssetPayload, params: SamplerParams) -> Self {
        Self {
            key,
            kind,
            payload,
            params: RwLock::new(params),
            released: AtomicBool::new(false),
        }
    }

    /// The normalized key this asset was loaded from.
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// The asset category.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// The decoded payload.
    pub fn payload(&self) -> &AssetPayload {
        &self.payload
    }

    /// A snapshot of the current sampler parameters.
    pub fn params(&self) -> SamplerParams {
        *self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current anisotropic filtering level.
    pub fn anisotropy(&self) -> u16 {
        self.params().anisotropy
    }

    /// Applies quality settings to the sampler state.
    ///
    /// Only textures and cube textures are affected. Returns `true` when the
    /// parameters actually changed, in which case the revision is bumped so
    /// the renderer knows to re-upload its sampler.
    pub fn apply_quality(&self, settings: &QualitySettings) -> bool {
        if !self.kind.is_texture() {
            return false;
        }
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        let anisotropy = params.anisotropy_for(settings);
        if params.anisotropy == anisotropy {
            return false;
        }
        params.anisotropy = anisotropy;
        params.revision += 1;
        true
    }

    /// Marks the asset as released. Renderers must stop using released assets.
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    /// Returns `true` once the owning cache has dropped this asset.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
