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

//! Provides the subscription primitive used for typed notifications.
//!
//! Components that used to expose ad hoc progress/error callbacks instead own
//! an [`EventBus`] and hand out receivers. Payload types are defined next to
//! the component that emits them (`LoadEvent` in `terra-io`,
//! [`crate::quality::QualityChange`] for the quality controller).

mod bus;

pub use self::bus::EventBus;
