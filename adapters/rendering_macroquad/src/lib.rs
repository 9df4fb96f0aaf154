#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Firewall Defence.
//!
//! Only windowing, input and shape drawing are used, so macroquad is built
//! without its `audio` feature.
//!
//! The adapter never interprets the scene: it captures input, hands it to the
//! [`SceneDriver`] and draws whatever the retained graph contains through the
//! returned camera.

mod draw;
mod input;

use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

use anyhow::Result;
use firewall_defence_core::Color;
use firewall_defence_scene::{Presentation, RenderingBackend, SceneDriver};
use glam::Vec2;
use log::{debug, info};
use macroquad::input::{is_key_pressed, KeyCode};

#[doc(hidden)]
pub use input::{MouseTouch, MOUSE_TOUCH_ID};

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame rate, timing and primitive counts once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Timing and scene load of one presented frame.
#[derive(Clone, Copy, Debug, Default)]
struct FrameSample {
    dt: Duration,
    update: Duration,
    draw: Duration,
    primitives: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct WindowTotals {
    elapsed: Duration,
    frames: u32,
    update: Duration,
    draw: Duration,
    primitives: usize,
}

/// Averages logged at the end of a reporting window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct StatsLine {
    fps: f32,
    trailing_fps: f32,
    update_ms: f64,
    draw_ms: f64,
    primitives_per_frame: usize,
}

impl fmt::Display for StatsLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} fps (trailing {:.1}) | update {:.2} ms, draw {:.2} ms, {} primitives/frame",
            self.fps, self.trailing_fps, self.update_ms, self.draw_ms, self.primitives_per_frame
        )
    }
}

/// Frame statistics of the window loop, reported once per `window`.
///
/// The trailing rate counts the frames presented during the last `history`.
#[derive(Debug)]
struct FrameStats {
    window: Duration,
    history: Duration,
    totals: WindowTotals,
    recent: VecDeque<Duration>,
    recent_span: Duration,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10))
    }
}

impl FrameStats {
    fn new(window: Duration, history: Duration) -> Self {
        Self {
            window,
            history,
            totals: WindowTotals::default(),
            recent: VecDeque::new(),
            recent_span: Duration::ZERO,
        }
    }

    fn record(&mut self, sample: FrameSample) -> Option<StatsLine> {
        let totals = &mut self.totals;
        totals.elapsed += sample.dt;
        totals.frames = totals.frames.saturating_add(1);
        totals.update += sample.update;
        totals.draw += sample.draw;
        totals.primitives = totals.primitives.saturating_add(sample.primitives);

        self.recent.push_back(sample.dt);
        self.recent_span += sample.dt;
        while self.recent_span > self.history {
            let Some(oldest) = self.recent.pop_front() else {
                break;
            };
            self.recent_span = self.recent_span.saturating_sub(oldest);
        }

        if self.totals.elapsed.is_zero() || self.totals.elapsed < self.window {
            return None;
        }

        let WindowTotals {
            elapsed,
            frames,
            update,
            draw,
            primitives,
        } = std::mem::take(&mut self.totals);
        let fps = frames as f32 / elapsed.as_secs_f32();
        let span = self.recent_span.as_secs_f32();
        Some(StatsLine {
            fps,
            trailing_fps: if span > 0.0 {
                self.recent.len() as f32 / span
            } else {
                fps
            },
            update_ms: (update / frames).as_secs_f64() * 1_000.0,
            draw_ms: (draw / frames).as_secs_f64() * 1_000.0,
            primitives_per_frame: primitives / frames as usize,
        })
    }
}

fn quit_requested() -> bool {
    is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q)
}

impl RenderingBackend for MacroquadBackend {
    fn run<D>(self, presentation: Presentation, mut driver: D) -> Result<()>
    where
        D: SceneDriver + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 960,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }
        debug!("opening macroquad window with swap interval {swap_interval:?}");

        macroquad::Window::from_config(config, async move {
            let background = to_macroquad_color(clear_color);
            let mut stats = FrameStats::default();
            let mut mouse = MouseTouch::default();
            let mut primitives = Vec::new();

            loop {
                if quit_requested() {
                    debug!("quit requested from keyboard");
                    break;
                }

                macroquad::window::clear_background(background);

                let viewport = Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let frame_dt = Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                let frame_input = input::capture(&mut mouse, viewport);

                let update_start = Instant::now();
                let view = driver.update(frame_dt, frame_input);
                let update_duration = update_start.elapsed();

                let draw_start = Instant::now();
                let mut drawn = 0;
                for item in driver.scene().draw_list() {
                    primitives.clear();
                    draw::primitives(&item, &view, viewport, &mut primitives);
                    drawn += primitives.len();
                    for primitive in &primitives {
                        draw::emit(primitive);
                    }
                }

                let line = stats.record(FrameSample {
                    dt: frame_dt,
                    update: update_duration,
                    draw: draw_start.elapsed(),
                    primitives: drawn,
                });
                if let Some(line) = line.filter(|_| show_fps) {
                    info!("{line}");
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_toggles_swap_interval() {
        let backend = MacroquadBackend::new().with_vsync(false).with_show_fps(true);

        assert_eq!(backend.swap_interval, Some(0));
        assert!(backend.show_fps);
        assert_eq!(MacroquadBackend::new().with_vsync(true).swap_interval, Some(1));
    }

    #[test]
    fn colors_keep_their_channels() {
        let color = to_macroquad_color(Color::new(0.1, 0.2, 0.3, 0.4));

        assert_eq!((color.r, color.g, color.b, color.a), (0.1, 0.2, 0.3, 0.4));
    }

    fn sample(dt_micros: u64, primitives: usize) -> FrameSample {
        FrameSample {
            dt: Duration::from_micros(dt_micros),
            update: Duration::from_millis(3),
            draw: Duration::from_millis(1),
            primitives,
        }
    }

    #[test]
    fn stats_report_once_a_second_with_scene_load() {
        let mut stats = FrameStats::default();

        for _ in 0..59 {
            assert!(stats.record(sample(16_667, 120)).is_none());
        }
        let line = stats
            .record(sample(16_667, 120))
            .expect("sixty frames at 60 Hz fill a window");

        assert!((line.fps - 60.0).abs() < 0.01);
        assert!((line.update_ms - 3.0).abs() < 1e-9);
        assert!((line.draw_ms - 1.0).abs() < 1e-9);
        assert_eq!(line.primitives_per_frame, 120);
        assert!(stats.record(sample(16_667, 120)).is_none());
    }

    #[test]
    fn zero_length_frames_never_report() {
        let mut stats = FrameStats::default();

        for _ in 0..1_000 {
            assert!(stats.record(sample(0, 8)).is_none());
        }
    }

    #[test]
    fn trailing_rate_spans_the_configured_history() {
        let mut stats = FrameStats::new(Duration::from_secs(1), Duration::from_secs(2));

        for _ in 0..5 {
            for _ in 0..50 {
                let _ = stats.record(sample(20_000, 40));
            }
        }
        let mut slow = None;
        for _ in 0..25 {
            slow = stats.record(sample(40_000, 40));
        }

        let slow = slow.expect("slow window reports");
        assert!((slow.fps - 25.0).abs() < 1e-3);
        assert!((slow.trailing_fps - 37.5).abs() < 1e-3);
    }

    #[test]
    fn stats_line_reads_as_one_log_entry() {
        let line = StatsLine {
            fps: 59.94,
            trailing_fps: 58.0,
            update_ms: 2.5,
            draw_ms: 0.75,
            primitives_per_frame: 312,
        };

        assert_eq!(
            line.to_string(),
            "59.9 fps (trailing 58.0) | update 2.50 ms, draw 0.75 ms, 312 primitives/frame"
        );
    }
}
