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

use std::sync::Arc;
use terra_core::{QualityConsumer, QualityLevel, QualitySettings};

/// The renderer's drawing surface, as far as quality control is concerned.
pub trait RenderSurface: Send + Sync {
    /// Sets the device pixel ratio the renderer draws at.
    fn set_pixel_ratio(&self, ratio: f32);
}

/// Forwards quality changes to a [`RenderSurface`].
pub(crate) struct SurfaceConsumer(pub(crate) Arc<dyn RenderSurface>);

impl QualityConsumer for SurfaceConsumer {
    fn apply_quality(&self, level: QualityLevel, settings: &QualitySettings) {
        log::debug!("Surface pixel ratio {} for {} quality", settings.pixel_ratio, level);
        self.0.set_pixel_ratio(settings.pixel_ratio);
    }
}
