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

//! # Terra Core
//!
//! Foundational crate containing the plain types and interface contracts shared
//! by the asset cache, the quality controller, and the application context.
//!
//! Nothing in here performs I/O. Fetching lives behind [`asset::AssetFetcher`],
//! caching lives in `terra-io`, and frame-time analysis lives in `terra-control`.

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod error;
pub mod event;
pub mod quality;

pub use config::{CacheConfig, QualityConfig, TerraConfig};
pub use error::{AssetError, ConfigError, QualityParseError};
pub use event::EventBus;
pub use quality::{QualityChange, QualityConsumer, QualityLevel, QualitySettings};
