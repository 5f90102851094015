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

//! Error types shared across the Terra crates.

use crate::asset::AssetKey;

/// Errors returned by asset loading.
///
/// The type is `Clone` because a single failed fetch is reported to every
/// caller that was waiting on the same key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// The fetch or decode of an asset failed. The key stays retriable.
    #[error("failed to load asset '{url}': {cause}")]
    Load {
        /// The normalized key that failed.
        url: String,
        /// Rendered cause chain of the underlying error.
        cause: String,
    },

    /// The cache was disposed; the call did nothing.
    #[error("resource cache has been disposed")]
    Disposed,
}

impl AssetError {
    /// Builds a [`AssetError::Load`] from a fetcher error, keeping its context chain.
    pub fn load(key: &AssetKey, cause: &anyhow::Error) -> Self {
        AssetError::Load {
            url: key.to_string(),
            cause: format!("{cause:#}"),
        }
    }
}

/// An unknown quality level name was requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quality setting: '{0}'")]
pub struct QualityParseError(pub String);

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),
}
