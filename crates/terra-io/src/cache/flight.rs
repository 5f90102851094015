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

//! Single-flight registrations.

use super::CacheInner;
use std::sync::Arc;
use terra_core::asset::{AssetHandle, AssetKey};
use terra_core::AssetError;
use tokio::sync::watch;

/// The value a flight resolves to; `None` while the fetch is running.
pub(super) type FlightResult = Option<Result<AssetHandle, AssetError>>;

/// A registered in-flight fetch that other callers can wait on.
pub(super) struct InFlight {
    pub(super) id: u64,
    pub(super) receiver: watch::Receiver<FlightResult>,
}

/// Held by the caller that performs the fetch for a key.
///
/// Dropping a flight that never completed (the leader's future was cancelled)
/// unregisters it and wakes every follower with an error, so nobody waits on a
/// fetch that will never finish.
pub(super) struct Flight {
    inner: Arc<CacheInner>,
    key: AssetKey,
    id: u64,
    sender: Option<watch::Sender<FlightResult>>,
}

impl Flight {
    /// Opens a flight and returns it with the registration for the in-flight map.
    pub(super) fn open(inner: Arc<CacheInner>, key: AssetKey, id: u64) -> (Self, InFlight) {
        let (sender, receiver) = watch::channel(None);
        let flight = Self {
            inner,
            key,
            id,
            sender: Some(sender),
        };
        (flight, InFlight { id, receiver })
    }

    pub(super) fn id(&self) -> u64 {
        self.id
    }

    /// Delivers the result to every follower.
    ///
    /// The caller must already have removed the registration, in the same
    /// critical section that cached the asset.
    pub(super) fn complete(mut self, result: Result<AssetHandle, AssetError>) {
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(result));
        }
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        self.inner.lock_state().remove_flight(&self.key, self.id);
        log::debug!("Load of '{}' abandoned before completion", self.key);
        sender.send_replace(Some(Err(AssetError::Load {
            url: self.key.to_string(),
            cause: "load abandoned before completion".to_string(),
        })));
    }
}

/// Waits for a leader's result.
pub(super) async fn follow(
    key: &AssetKey,
    mut receiver: watch::Receiver<FlightResult>,
) -> Result<AssetHandle, AssetError> {
    let outcome = match receiver.wait_for(Option::is_some).await {
        Ok(value) => (*value).clone(),
        Err(_) => None,
    };
    outcome.unwrap_or_else(|| {
        Err(AssetError::Load {
            url: key.to_string(),
            cause: "load abandoned before completion".to_string(),
        })
    })
}
