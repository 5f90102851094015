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

use terra_core::asset::{AssetKey, LoadRequest};

/// Pending preload requests, kept sorted by descending priority.
///
/// Requests of equal priority keep their submission order. A key that is
/// already waiting is not queued a second time.
#[derive(Debug, Default)]
pub(crate) struct LoadQueue {
    entries: Vec<LoadRequest>,
}

impl LoadQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts `request` behind every entry of equal or higher priority.
    ///
    /// Returns `false` if the key was already queued.
    pub(crate) fn push(&mut self, request: LoadRequest) -> bool {
        if self.contains(&request.key) {
            return false;
        }
        let index = self
            .entries
            .partition_point(|entry| entry.priority >= request.priority);
        self.entries.insert(index, request);
        true
    }

    /// Removes up to `count` entries from the front.
    pub(crate) fn take(&mut self, count: usize) -> Vec<LoadRequest> {
        let count = count.min(self.entries.len());
        self.entries.drain(..count).collect()
    }

    pub(crate) fn contains(&self, key: &AssetKey) -> bool {
        self.entries.iter().any(|entry| &entry.key == key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
