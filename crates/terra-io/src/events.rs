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

//! Load notifications and preload results.

use terra_core::asset::{AssetKey, AssetKind};
use terra_core::AssetError;

/// A notification published by the [`ResourceCache`](crate::ResourceCache)
/// to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A fetch for `key` was issued.
    Started {
        /// The key being fetched.
        key: AssetKey,
        /// Its asset kind.
        kind: AssetKind,
    },
    /// A tracked load settled, successfully or not.
    Progress {
        /// The key that settled.
        key: AssetKey,
        /// Loads settled so far.
        settled: usize,
        /// Loads submitted so far.
        submitted: usize,
    },
    /// A fetch failed. The key stays uncached and may be retried.
    Failed {
        /// The key that failed.
        key: AssetKey,
        /// What went wrong.
        reason: AssetError,
    },
    /// The preload queue ran empty.
    Drained {
        /// Entries that loaded during this drain.
        loaded: usize,
        /// Entries that failed during this drain.
        failed: usize,
    },
}

/// Outcome of one [`ResourceCache::preload`](crate::ResourceCache::preload) call.
///
/// Covers every queue entry the call drained, which includes entries queued by
/// concurrent callers while it held the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadSummary {
    /// Entries that ended with a usable asset.
    pub loaded: usize,
    /// Errors of entries that failed.
    pub failed: Vec<AssetError>,
}

impl PreloadSummary {
    /// Total number of entries drained.
    pub fn total(&self) -> usize {
        self.loaded + self.failed.len()
    }

    /// Returns `true` when no entry failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
