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

//! # Terra IO
//!
//! Asset loading services: the [`ResourceCache`] that de-duplicates,
//! schedules, and tracks asset loads, and [`FsFetcher`], an
//! [`AssetFetcher`](terra_core::asset::AssetFetcher) reading from a local
//! asset directory.

#![warn(missing_docs)]

pub mod cache;
pub mod events;
pub mod fetch;

pub use cache::{LoadCounters, ResourceCache};
pub use events::{LoadEvent, PreloadSummary};
pub use fetch::FsFetcher;
