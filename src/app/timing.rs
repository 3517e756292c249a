use std::time::{Duration, Instant};

use super::input::InteractionMode;

/// Stereo frame cadence, reported through the window title.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_report_time: Instant,
    frames_since_report: u32,
    pub frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String, now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_report_time: now,
            frames_since_report: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Records one presented stereo frame. Returns a fresh title roughly
    /// twice a second.
    pub fn update(&mut self, now: Instant, mode: InteractionMode) -> Option<String> {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32();

        self.frames_since_report = self.frames_since_report.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_report_time);
        if elapsed.as_secs_f32() < 0.5 {
            return None;
        }
        let fps = self.frames_since_report as f32 / elapsed.as_secs_f32();
        self.frames_since_report = 0;
        self.last_report_time = now;
        Some(format!(
            "{} - {:.1} fps ({:.2} ms) - {}",
            self.base_title,
            fps,
            self.frame_dt * 1000.0,
            mode_label(mode)
        ))
    }
}

fn mode_label(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Navigation => "navigate",
        InteractionMode::SelectDrag => "select / drag",
    }
}
