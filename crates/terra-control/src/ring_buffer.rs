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

//! Fixed-capacity storage for rolling frame-time samples.

/// A fixed-size circular buffer for storing numerical samples.
///
/// Pushing into a full buffer evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    data: [T; N],
    index: usize,
    count: usize,
}

impl<T: Default + Copy, const N: usize> RingBuffer<T, N> {
    /// Creates a new, empty ring buffer.
    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new value into the buffer, overwriting the oldest if full.
    pub fn push(&mut self, value: T) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Returns the number of elements currently in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` once the buffer has wrapped at least once.
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Returns `true` if nothing was pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }

    /// Returns an iterator over the values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = self.data.split_at(self.index);
        // Until the first wrap, the slots after `index` hold no samples.
        let older = if self.is_full() { older } else { &older[..0] };
        older.iter().chain(newer.iter())
    }
}

impl<T: Default + Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Calculates the arithmetic mean of the values in the buffer.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f32>() / self.count as f32
    }

    /// Returns the maximum value in the buffer, or `f32::MIN` if empty.
    pub fn max(&self) -> f32 {
        self.iter().copied().fold(f32::MIN, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buffer = RingBuffer::<f32, 4>::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.average(), 0.0);
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn test_partial_fill_keeps_order() {
        let mut buffer = RingBuffer::<f32, 4>::new();
        buffer.push(1.0);
        buffer.push(2.0);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(buffer.average(), 1.5);
        assert_eq!(buffer.max(), 2.0);
    }

    #[test]
    fn test_wrap_evicts_oldest() {
        let mut buffer = RingBuffer::<f32, 3>::new();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(value);
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.count(), 3);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
        assert_eq!(buffer.average(), 4.0);
        assert_eq!(buffer.max(), 5.0);
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::<f32, 3>::new();
        buffer.push(7.0);
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.push(1.0);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![1.0]);
    }
}
