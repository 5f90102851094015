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

//! Frame-time monitoring and adaptive quality control.
//!
//! The host render loop feeds one frame duration per rendered frame into the
//! [`AdaptiveQualityController`]. The controller smooths the measurements and,
//! when the frame rate stays off target, steps the active
//! [`terra_core::QualityLevel`] one tier at a time and pushes the new settings
//! to every attached [`terra_core::QualityConsumer`].

#![warn(missing_docs)]

pub mod controller;
pub mod ring_buffer;

pub use controller::{AdaptiveQualityController, QualityMetrics, FRAME_WINDOW};
pub use ring_buffer::RingBuffer;
