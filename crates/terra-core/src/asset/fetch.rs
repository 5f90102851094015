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

use super::{AssetKey, AssetKind, AssetPayload};
use async_trait::async_trait;

/// The I/O seam between the cache and wherever asset bytes live.
///
/// Implementations perform the actual network or filesystem work for one key.
/// They must not cache: de-duplication and caching are the resource cache's
/// job, so a fetcher is expected to hit its backing store on every call.
///
/// For [`AssetKind::CubeTexture`] the key holds several face URLs; use
/// [`AssetKey::faces`] to iterate them and return [`AssetPayload::Cube`].
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetches and decodes the asset identified by `key`.
    async fn fetch(&self, key: &AssetKey, kind: AssetKind) -> anyhow::Result<AssetPayload>;
}
