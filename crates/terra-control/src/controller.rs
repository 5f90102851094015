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

//! Adaptive quality control driven by measured frame times.

use crate::ring_buffer::RingBuffer;
use std::sync::Arc;
use std::time::Instant;
use terra_core::{EventBus, QualityChange, QualityConfig, QualityConsumer, QualityLevel, QualitySettings};

/// Number of frame samples kept in the rolling window.
pub const FRAME_WINDOW: usize = 60;

/// A snapshot of the controller's measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    /// Smoothed frames per second.
    pub fps: f32,
    /// Smoothed frame time in milliseconds.
    pub frame_time_ms: f32,
    /// Slowest frame in the sample window, in milliseconds. 0 when empty.
    pub worst_frame_ms: f32,
    /// Active quality level.
    pub level: QualityLevel,
}

/// Keeps rendering within a frame budget by trading visual fidelity for speed.
///
/// States are the three [`QualityLevel`]s, starting at the configured initial
/// level. Each evaluation moves at most one step, so going from `High` to
/// `Low` always passes through `Medium` and takes at least two monitoring
/// intervals.
///
/// None of the operations fail. After [`dispose`](Self::dispose) every call
/// is a no-op.
pub struct AdaptiveQualityController {
    config: QualityConfig,
    window: RingBuffer<f32, FRAME_WINDOW>,
    average_frame_time_ms: f32,
    current_fps: f32,
    stats_ready: bool,
    frames_since_check: u32,
    last_check: Option<Instant>,
    level: QualityLevel,
    monitoring: bool,
    disposed: bool,
    consumers: Vec<Arc<dyn QualityConsumer>>,
    events: EventBus<QualityChange>,
}

impl AdaptiveQualityController {
    /// Creates a controller that starts monitoring immediately.
    ///
    /// Configuration values it cannot use are replaced, see
    /// [`QualityConfig::sanitized`].
    pub fn new(config: QualityConfig) -> Self {
        let config = config.sanitized(FRAME_WINDOW);
        let level = config.initial_level;
        let mut controller = Self {
            config,
            window: RingBuffer::new(),
            average_frame_time_ms: 0.0,
            current_fps: 0.0,
            stats_ready: false,
            frames_since_check: 0,
            last_check: None,
            level,
            monitoring: true,
            disposed: false,
            consumers: Vec::new(),
            events: EventBus::new(),
        };
        controller.reset_metrics();
        controller
    }

    /// Registers a consumer and immediately pushes the active settings to it.
    pub fn attach(&mut self, consumer: Arc<dyn QualityConsumer>) {
        if self.disposed {
            return;
        }
        consumer.apply_quality(self.level, &self.level.settings());
        self.consumers.push(consumer);
    }

    /// Removes every consumer.
    pub fn detach_all(&mut self) {
        self.consumers.clear();
    }

    /// Number of attached consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Opens a subscription to level changes.
    pub fn subscribe(&self) -> flume::Receiver<QualityChange> {
        self.events.subscribe()
    }

    /// Records one rendered frame, timed with the wall clock.
    ///
    /// Returns the level change this frame triggered, if any.
    pub fn record_frame(&mut self, delta_ms: f32) -> Option<QualityChange> {
        self.record_frame_at(delta_ms, Instant::now())
    }

    /// Records one rendered frame that finished at `now`.
    pub fn record_frame_at(&mut self, delta_ms: f32, now: Instant) -> Option<QualityChange> {
        if self.disposed || !self.monitoring {
            return None;
        }
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            log::trace!("Ignoring invalid frame time {delta_ms}");
            return None;
        }

        self.frames_since_check = self.frames_since_check.saturating_add(1);
        self.window.push(delta_ms);

        if self.window.count() >= self.config.min_frames_for_stats {
            let smoothing = self.config.smoothing;
            self.average_frame_time_ms =
                self.average_frame_time_ms * smoothing + self.window.average() * (1.0 - smoothing);
            self.current_fps = 1000.0 / self.average_frame_time_ms.max(f32::EPSILON);
            self.stats_ready = true;
        }

        let last_check = *self.last_check.get_or_insert(now);
        if now.saturating_duration_since(last_check) < self.config.monitoring_interval() {
            return None;
        }
        self.last_check = Some(now);

        if self.stats_ready {
            self.check_performance()
        } else {
            None
        }
    }

    /// Compares the smoothed FPS with the target and steps one level if needed.
    fn check_performance(&mut self) -> Option<QualityChange> {
        if self.frames_since_check < self.config.min_frames_for_quality_change {
            return None;
        }

        let ratio = self.current_fps / self.config.target_fps;
        let next = if ratio < self.config.quality_change_threshold {
            self.level.degraded()
        } else if ratio > self.config.upgrade_threshold {
            self.level.improved()
        } else {
            None
        };

        self.frames_since_check = 0;
        next.map(|level| self.transition(level))
    }

    fn transition(&mut self, level: QualityLevel) -> QualityChange {
        let change = QualityChange {
            previous: self.level,
            current: level,
            settings: level.settings(),
            fps: self.current_fps,
        };
        self.level = level;

        log::info!(
            "Quality level changed to: {} ({:.1} fps, target {:.0})",
            level,
            self.current_fps,
            self.config.target_fps
        );

        if self.consumers.is_empty() {
            log::warn!("Quality changed to {level} but no consumer is attached");
        }
        for consumer in &self.consumers {
            consumer.apply_quality(level, &change.settings);
        }
        self.events.publish(change);
        change
    }

    /// Forces a level, bypassing measurement. Consumers are notified if it differs.
    pub fn set_level(&mut self, level: QualityLevel) -> Option<QualityChange> {
        if self.disposed || level == self.level {
            return None;
        }
        Some(self.transition(level))
    }

    /// Whether optional rendering work should run this tick.
    ///
    /// Always `true` until enough samples exist; afterwards `true` while the
    /// smoothed FPS stays at or above `target_fps * frame_skip_ratio`. This is
    /// advisory only.
    pub fn should_render_frame(&self) -> bool {
        if !self.stats_ready || self.window.count() < self.config.min_frames_for_stats {
            return true;
        }
        self.current_fps >= self.config.target_fps * self.config.frame_skip_ratio
    }

    /// Clears measurements and resumes sampling.
    pub fn start_monitoring(&mut self) {
        if self.disposed {
            return;
        }
        self.monitoring = true;
        self.reset_metrics();
    }

    /// Pauses sampling; recorded frames are ignored until monitoring restarts.
    pub fn stop_monitoring(&mut self) {
        self.monitoring = false;
    }

    /// Returns `true` while frames are being sampled.
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    fn reset_metrics(&mut self) {
        self.window.clear();
        self.average_frame_time_ms = self.config.target_frame_time_ms();
        self.current_fps = 0.0;
        self.stats_ready = false;
        self.frames_since_check = 0;
        self.last_check = None;
    }

    /// Active quality level.
    pub fn level(&self) -> QualityLevel {
        self.level
    }

    /// Settings of the active level.
    pub fn settings(&self) -> QualitySettings {
        self.level.settings()
    }

    /// Smoothed FPS, or 0 before statistics are available.
    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    /// Current measurements.
    pub fn metrics(&self) -> QualityMetrics {
        QualityMetrics {
            fps: self.current_fps,
            frame_time_ms: self.average_frame_time_ms,
            worst_frame_ms: if self.window.is_empty() { 0.0 } else { self.window.max() },
            level: self.level,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Stops monitoring, resets counters, and detaches every consumer and subscriber.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_monitoring();
        self.reset_metrics();
        self.detach_all();
        self.events.close();
        self.disposed = true;
        log::debug!("Adaptive quality controller disposed");
    }

    /// Returns `true` after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for AdaptiveQualityController {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingConsumer {
        applied: Mutex<Vec<QualityLevel>>,
    }

    impl QualityConsumer for RecordingConsumer {
        fn apply_quality(&self, level: QualityLevel, _settings: &QualitySettings) {
            self.applied.lock().unwrap().push(level);
        }
    }

    /// Feeds `count` frames of `frame_ms`, advancing the clock by the frame time.
    fn feed(
        controller: &mut AdaptiveQualityController,
        clock: &mut Instant,
        count: usize,
        frame_ms: u64,
    ) -> Vec<(usize, QualityChange)> {
        let mut changes = Vec::new();
        for i in 0..count {
            if let Some(change) = controller.record_frame_at(frame_ms as f32, *clock) {
                changes.push((i, change));
            }
            *clock += Duration::from_millis(frame_ms);
        }
        changes
    }

    #[test]
    fn test_initial_state() {
        let controller = AdaptiveQualityController::default();
        assert_eq!(controller.level(), QualityLevel::High);
        assert!(controller.is_monitoring());
        assert!(controller.should_render_frame());
        assert_eq!(controller.current_fps(), 0.0);
    }

    #[test]
    fn test_no_stats_before_min_frames() {
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();
        feed(&mut controller, &mut clock, 29, 50);
        assert_eq!(controller.current_fps(), 0.0);
        assert!(controller.should_render_frame());

        feed(&mut controller, &mut clock, 1, 50);
        assert!(controller.current_fps() > 0.0);
    }

    #[test]
    fn test_twenty_ms_frames_hold_quality() {
        // 50 fps against a 60 fps target is a 0.83 ratio, above the 0.8 threshold.
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();
        let changes = feed(&mut controller, &mut clock, 300, 20);
        assert!(changes.is_empty());
        assert_eq!(controller.level(), QualityLevel::High);
        assert!((controller.current_fps() - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_twenty_five_ms_frames_downgrade_one_step() {
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();

        // First interval elapses at frame 40 with only 41 frames counted; the
        // second at frame 80 is the first eligible evaluation.
        let changes = feed(&mut controller, &mut clock, 81, 25);
        assert_eq!(changes.len(), 1);
        let (frame, change) = changes[0];
        assert_eq!(frame, 80);
        assert_eq!(change.previous, QualityLevel::High);
        assert_eq!(change.current, QualityLevel::Medium);
        assert!((change.fps - 40.0).abs() < 0.5);
        assert_eq!(controller.level(), QualityLevel::Medium);
    }

    #[test]
    fn test_sustained_overload_steps_through_medium() {
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();
        let changes = feed(&mut controller, &mut clock, 400, 25);

        let levels: Vec<_> = changes.iter().map(|(_, c)| c.current).collect();
        assert_eq!(levels, vec![QualityLevel::Medium, QualityLevel::Low]);

        // Evaluations are at least one monitoring interval apart.
        let gap_frames = changes[1].0 - changes[0].0;
        assert!(gap_frames as u64 * 25 >= 1000);
    }

    #[test]
    fn test_headroom_upgrades_one_step() {
        let mut controller = AdaptiveQualityController::new(QualityConfig {
            initial_level: QualityLevel::Low,
            ..Default::default()
        });
        let mut clock = Instant::now();
        let changes = feed(&mut controller, &mut clock, 101, 10);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1.current, QualityLevel::Medium);
    }

    #[test]
    fn test_fast_frames_stay_at_high() {
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();
        assert!(feed(&mut controller, &mut clock, 300, 5).is_empty());
        assert_eq!(controller.level(), QualityLevel::High);
    }

    #[test]
    fn test_should_render_frame_under_load() {
        let mut controller = AdaptiveQualityController::default();
        let mut clock = Instant::now();
        feed(&mut controller, &mut clock, 60, 30);
        // ~33 fps is below 60 * 0.7.
        assert!(!controller.should_render_frame());
    }

    #[test]
    fn test_consumers_receive_changes() {
        let mut controller = AdaptiveQualityController::default();
        let consumer = Arc::new(RecordingConsumer::default());
        controller.attach(consumer.clone());
        // Attaching pushes the current level right away.
        assert_eq!(*consumer.applied.lock().unwrap(), vec![QualityLevel::High]);

        let events = controller.subscribe();
        let mut clock = Instant::now();
        feed(&mut controller, &mut clock, 81, 25);

        assert_eq!(
            *consumer.applied.lock().unwrap(),
            vec![QualityLevel::High, QualityLevel::Medium]
        );
        let event = events.try_recv().unwrap();
        assert_eq!(event.current, QualityLevel::Medium);
        assert_eq!(event.settings.anisotropy, 8);
    }

    #[test]
    fn test_manual_override() {
        let mut controller = AdaptiveQualityController::default();
        let change = controller.set_level(QualityLevel::Low).unwrap();
        assert_eq!(change.previous, QualityLevel::High);
        assert_eq!(controller.settings().pixel_ratio, 1.0);
        assert!(controller.set_level(QualityLevel::Low).is_none());
    }

    #[test]
    fn test_stop_monitoring_ignores_frames() {
        let mut controller = AdaptiveQualityController::default();
        controller.stop_monitoring();
        let mut clock = Instant::now();
        assert!(feed(&mut controller, &mut clock, 200, 50).is_empty());
        assert_eq!(controller.current_fps(), 0.0);

        controller.start_monitoring();
        assert!(controller.is_monitoring());
        feed(&mut controller, &mut clock, 30, 50);
        assert!(controller.current_fps() > 0.0);
    }

    #[test]
    fn test_invalid_frame_times_are_ignored() {
        let mut controller = AdaptiveQualityController::default();
        let now = Instant::now();
        assert!(controller.record_frame_at(f32::NAN, now).is_none());
        assert!(controller.record_frame_at(-1.0, now).is_none());
        assert_eq!(controller.metrics().fps, 0.0);
    }

    #[test]
    fn test_unusable_config_still_adapts() {
        let mut controller = AdaptiveQualityController::new(QualityConfig {
            target_fps: 0.0,
            min_frames_for_stats: 500,
            ..Default::default()
        });
        assert_eq!(controller.config().target_fps, 60.0);
        assert_eq!(controller.config().min_frames_for_stats, FRAME_WINDOW);

        let mut clock = Instant::now();
        let changes = feed(&mut controller, &mut clock, 81, 25);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1.current, QualityLevel::Medium);
    }

    #[test]
    fn test_metrics_report_worst_frame() {
        let mut controller = AdaptiveQualityController::default();
        assert_eq!(controller.metrics().worst_frame_ms, 0.0);

        let now = Instant::now();
        for frame_ms in [16.0, 16.0, 41.5, 17.0] {
            controller.record_frame_at(frame_ms, now);
        }
        assert_eq!(controller.metrics().worst_frame_ms, 41.5);

        controller.start_monitoring();
        assert_eq!(controller.metrics().worst_frame_ms, 0.0);
    }

    #[test]
    fn test_dispose_is_idempotent_and_inert() {
        let mut controller = AdaptiveQualityController::default();
        let consumer = Arc::new(RecordingConsumer::default());
        controller.attach(consumer.clone());
        let events = controller.subscribe();

        controller.dispose();
        controller.dispose();
        assert!(controller.is_disposed());
        assert_eq!(controller.consumer_count(), 0);
        assert!(events.try_recv().is_err());

        let mut clock = Instant::now();
        assert!(feed(&mut controller, &mut clock, 200, 50).is_empty());
        assert!(controller.set_level(QualityLevel::Low).is_none());
        assert_eq!(controller.level(), QualityLevel::High);
        assert_eq!(consumer.applied.lock().unwrap().len(), 1);
    }
}
