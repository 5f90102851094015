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

//! The public-facing API of Terra.
//!
//! An [`AppContext`] owns the resource cache and the adaptive quality
//! controller, wires them together, and is the one place a host application
//! talks to. Create it once, feed it frame times, and shut it down on exit.

#![warn(missing_docs)]

mod context;
mod surface;

pub use context::AppContext;
pub use surface::RenderSurface;

/// Everything a host application typically needs.
pub mod prelude {
    pub use crate::{AppContext, RenderSurface};
    pub use terra_control::QualityMetrics;
    pub use terra_core::asset::{
        AssetFetcher, AssetHandle, AssetKey, AssetKind, LoadOptions, LoadRequest, TextureSource,
    };
    pub use terra_core::{AssetError, QualityChange, QualityLevel, QualitySettings, TerraConfig};
    pub use terra_io::{FsFetcher, LoadEvent, PreloadSummary, ResourceCache};
}
