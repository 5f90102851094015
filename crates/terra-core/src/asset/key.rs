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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between face URLs in a cube-texture key.
pub const CUBE_FACE_SEPARATOR: &str = "|";

/// The normalized URL an asset is identified by.
///
/// Two requests that differ only in slash style, doubled separators, or `./`
/// segments resolve to the same key, so the cache never holds two entries for
/// the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AssetKey(String);

impl AssetKey {
    /// Creates a key from a raw URL, normalizing it.
    ///
    /// A raw cube key (faces joined with `|`) is normalized face by face.
    pub fn new(url: impl AsRef<str>) -> Self {
        let normalized = url
            .as_ref()
            .split(CUBE_FACE_SEPARATOR)
            .map(normalize)
            .collect::<Vec<_>>()
            .join(CUBE_FACE_SEPARATOR);
        Self(normalized)
    }

    /// Creates a cube-texture key from its face URLs.
    pub fn cube<S: AsRef<str>>(faces: &[S]) -> Self {
        let joined = faces
            .iter()
            .map(|face| face.as_ref())
            .collect::<Vec<_>>()
            .join(CUBE_FACE_SEPARATOR);
        Self::new(joined)
    }

    /// The normalized key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The individual URLs this key refers to. Plain keys yield themselves.
    pub fn faces(&self) -> impl Iterator<Item = &str> {
        self.0.split(CUBE_FACE_SEPARATOR)
    }
}

impl From<&str> for AssetKey {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for AssetKey {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<AssetKey> for String {
    fn from(key: AssetKey) -> Self {
        key.0
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let (prefix, path) = match unified.find("://") {
        Some(idx) => unified.split_at(idx + 3),
        None => ("", unified.as_str()),
    };

    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    let mut normalized = String::with_capacity(unified.len());
    normalized.push_str(prefix);
    if path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    normalized
}
