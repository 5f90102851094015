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

//! Filesystem-backed asset fetching.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use terra_core::asset::{AssetFetcher, AssetKey, AssetKind, AssetPayload};

/// Reads asset bytes from a directory on disk.
///
/// Keys are resolved relative to the root; a leading `/` is ignored, so
/// `/earth/day.jpg` and `earth/day.jpg` name the same file. Keys that climb
/// out of the root with `..` or carry a URL scheme are rejected.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Creates a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory keys are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps one URL to a path under the root.
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        if url.contains("://") {
            bail!("remote URL '{url}' cannot be read from the filesystem");
        }
        let relative = url.trim_start_matches('/');
        if relative.is_empty() {
            bail!("empty asset path");
        }
        if relative.split('/').any(|segment| segment == "..") {
            bail!("asset path '{url}' escapes the asset root");
        }
        Ok(self.root.join(relative))
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        log::trace!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }
}

#[async_trait]
impl AssetFetcher for FsFetcher {
    async fn fetch(&self, key: &AssetKey, kind: AssetKind) -> Result<AssetPayload> {
        match kind {
            AssetKind::Texture => Ok(AssetPayload::Image(self.read(key.as_str()).await?)),
            AssetKind::Model => Ok(AssetPayload::Model(self.read(key.as_str()).await?)),
            AssetKind::CubeTexture => {
                let mut faces = Vec::new();
                for (index, face) in key.faces().enumerate() {
                    let bytes = self
                        .read(face)
                        .await
                        .with_context(|| format!("cube face {index}"))?;
                    faces.push(bytes);
                }
                Ok(AssetPayload::Cube(faces))
            }
        }
    }
}
