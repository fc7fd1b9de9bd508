/// Frame time and FPS averaging
use std::time::Duration;

/// How often the averages are refreshed, in seconds
pub const UPDATE_INTERVAL: f32 = 0.5;

/// Averages frame times over short windows for display
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    total_time: f32,
    frame_count: u32,
    average_frame_time: Option<f32>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame. Returns true when the averages were refreshed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.total_time += dt;
        self.frame_count += 1;
        if self.total_time > UPDATE_INTERVAL {
            self.average_frame_time = Some(self.total_time / self.frame_count as f32);
            self.total_time = 0.0;
            self.frame_count = 0;
            true
        } else {
            false
        }
    }

    pub fn tick_duration(&mut self, elapsed: Duration) -> bool {
        self.tick(elapsed.as_secs_f32())
    }

    /// Average frame time in milliseconds over the last window
    pub fn frame_time_ms(&self) -> Option<f32> {
        self.average_frame_time.map(|t| t * 1000.0)
    }

    /// Frames per second, rounded to the nearest whole frame
    pub fn fps(&self) -> Option<u32> {
        self.average_frame_time
            .filter(|t| *t > 0.0)
            .map(|t| (1.0 / t + 0.5) as u32)
    }

    /// "12.34ms, FPS: 81" style summary, or a placeholder before the first window
    pub fn summary(&self) -> String {
        match (self.frame_time_ms(), self.fps()) {
            (Some(ms), Some(fps)) => format!("Frame Time: {ms:.2}ms, FPS: {fps}"),
            _ => "Frame Time: --, FPS: --".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_average_before_window() {
        let mut stats = FrameStats::new();
        assert!(!stats.tick(0.1));
        assert_eq!(stats.fps(), None);
        assert_eq!(stats.summary(), "Frame Time: --, FPS: --");
    }

    #[test]
    fn test_average_over_window() {
        let mut stats = FrameStats::new();
        let mut refreshed = false;
        // 16 frames stay under the window, the 17th crosses it
        for _ in 0..17 {
            refreshed = stats.tick(0.03);
        }
        assert!(refreshed);
        assert_eq!(stats.fps(), Some(33));
        assert!((stats.frame_time_ms().unwrap() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_window_resets() {
        let mut stats = FrameStats::new();
        assert!(stats.tick_duration(Duration::from_millis(600)));
        assert!(!stats.tick(0.1));
        assert_eq!(stats.fps(), Some(2));
    }
}
