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

use std::sync::{Mutex, PoisonError};

/// A thread-safe fan-out channel: every subscriber receives every event.
///
/// Each call to [`EventBus::subscribe`] opens an unbounded flume channel.
/// Subscribers that drop their receiver are pruned on the next publish.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Opens a new subscription.
    ///
    /// ## Returns
    /// The receiving end; events published after this call are delivered to it.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.lock().push(sender);
        receiver
    }

    /// Delivers `event` to every live subscriber.
    ///
    /// ## Returns
    /// The number of subscribers that received the event.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        log::trace!("Published event to {} subscriber(s).", subscribers.len());
        subscribers.len()
    }

    /// Number of subscribers still attached as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Drops every subscription. Receivers see a disconnected channel.
    pub fn close(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<flume::Sender<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Progress { loaded: u32, total: u32 },
        Finished,
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.publish(TestEvent::Finished), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn every_subscriber_gets_every_event() {
        let bus = EventBus::<TestEvent>::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        let event = TestEvent::Progress { loaded: 1, total: 4 };
        assert_eq!(bus.publish(event.clone()), 2);
        bus.publish(TestEvent::Finished);

        for receiver in [&first, &second] {
            assert_eq!(receiver.try_recv(), Ok(event.clone()));
            assert_eq!(receiver.try_recv(), Ok(TestEvent::Finished));
            assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::<TestEvent>::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        assert_eq!(bus.publish(TestEvent::Finished), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(TestEvent::Finished));
    }

    #[test]
    fn close_disconnects_receivers() {
        let bus = EventBus::<TestEvent>::new();
        let receiver = bus.subscribe();
        bus.close();
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn publish_from_thread() {
        let bus = std::sync::Arc::new(EventBus::<TestEvent>::new());
        let receiver = bus.subscribe();
        let publisher = bus.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish(TestEvent::Finished);
        });

        match receiver.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => assert_eq!(event, TestEvent::Finished),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }

        handle.join().expect("Thread join failed");
    }
}
