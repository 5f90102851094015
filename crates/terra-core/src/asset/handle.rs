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

use super::Asset;
use std::{ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded asset.
///
/// Cloning a handle only increments the reference count. Every caller that
/// asked the cache for the same key receives a handle to the same allocation,
/// which [`AssetHandle::ptr_eq`] can verify.
#[derive(Debug)]
pub struct AssetHandle(Arc<Asset>);

impl AssetHandle {
    /// Creates a new `AssetHandle` that takes ownership of the asset.
    ///
    /// This is called by the resource cache once a payload has been fetched.
    pub fn new(asset: Asset) -> Self {
        Self(Arc::new(asset))
    }

    /// Returns `true` if both handles point to the same loaded asset.
    pub fn ptr_eq(&self, other: &AssetHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this asset, the cache's own included.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Clone for AssetHandle {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl Deref for AssetHandle {
    type Target = Asset;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
