//! Frame statistics
//!
//! Logs the average frame time once per reporting interval.

use std::time::{Duration, Instant};

use crate::display::StatsWidget;

/// Stats widget that writes frame timings to the log
pub struct FrameStatsLogger {
    interval: Duration,
    attached: bool,
    frame_start: Option<Instant>,
    window_start: Option<Instant>,
    frames: u32,
    busy: Duration,
}

impl FrameStatsLogger {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            attached: false,
            frame_start: None,
            window_start: None,
            frames: 0,
            busy: Duration::ZERO,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Frames timed in the current interval
    pub fn frames(&self) -> u32 {
        self.frames
    }

    fn report(&mut self, elapsed: Duration) {
        if self.frames == 0 {
            return;
        }
        let fps = self.frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        let frame_ms = self.busy.as_secs_f64() * 1000.0 / self.frames as f64;
        log::info!("{:.1} fps, {:.2} ms/frame", fps, frame_ms);
        self.frames = 0;
        self.busy = Duration::ZERO;
    }
}

impl Default for FrameStatsLogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl StatsWidget for FrameStatsLogger {
    fn attach(&mut self) {
        self.attached = true;
        self.window_start = Some(Instant::now());
    }

    fn begin(&mut self) {
        if self.attached {
            self.frame_start = Some(Instant::now());
        }
    }

    fn end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        self.busy += start.elapsed();
        self.frames += 1;

        let window_start = *self.window_start.get_or_insert(start);
        let elapsed = window_start.elapsed();
        if elapsed >= self.interval {
            self.report(elapsed);
            self.window_start = Some(Instant::now());
        }
    }

    fn detach(&mut self) {
        self.attached = false;
        self.frame_start = None;
        self.window_start = None;
        self.frames = 0;
        self.busy = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_counted_only_when_attached() {
        let mut stats = FrameStatsLogger::new(Duration::from_secs(3600));
        stats.begin();
        stats.end();
        assert_eq!(stats.frames(), 0);

        stats.attach();
        for _ in 0..3 {
            stats.begin();
            stats.end();
        }
        assert_eq!(stats.frames(), 3);
    }

    #[test]
    fn test_report_resets_interval() {
        let mut stats = FrameStatsLogger::new(Duration::ZERO);
        stats.attach();
        stats.begin();
        stats.end();
        assert_eq!(stats.frames(), 0);
    }

    #[test]
    fn test_detach() {
        let mut stats = FrameStatsLogger::default();
        stats.attach();
        stats.begin();
        stats.detach();
        stats.end();
        assert!(!stats.is_attached());
        assert_eq!(stats.frames(), 0);
    }
}
