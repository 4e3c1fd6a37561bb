//! Timeline scrubbing and playback
//!
//! Holds the steps of the current run plus a cursor. The cursor is an
//! `isize`; -1 means "no steps loaded", and once a run is loaded every
//! mutation clamps it into `0..steps.len()-1`, so a fresh run always lands
//! on the first step. Playback is pull-based: the caller ticks the
//! controller from its event loop and the controller advances once per
//! elapsed interval, pausing itself at the last step.

use crate::step::ExecutionStep;
use std::time::{Duration, Instant};

/// Interval between automatic steps: 200ms at speed 1, floored at 20ms.
/// Non-positive speeds fall back to 1.
pub fn interval_for_speed(speed: f64) -> Duration {
    let speed = if speed > 0.0 { speed } else { 1.0 };
    let ms = (200.0 / speed).round().max(20.0);
    Duration::from_millis(ms as u64)
}

struct Playback {
    interval: Duration,
    last_tick: Instant,
}

pub struct TimelineController {
    steps: Vec<ExecutionStep>,
    current_index: isize,
    playback: Option<Playback>,
}

impl Default for TimelineController {
    fn default() -> Self {
        TimelineController::new()
    }
}

impl TimelineController {
    pub fn new() -> Self {
        TimelineController {
            steps: Vec::new(),
            current_index: -1,
            playback: None,
        }
    }

    /// Install a fresh run; the cursor starts on the first step, or -1 when
    /// there are none.
    pub fn load(&mut self, steps: Vec<ExecutionStep>) {
        self.steps = steps;
        self.current_index = self.min_index();
        self.playback = None;
    }

    pub fn reset(&mut self) {
        self.load(Vec::new());
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_index(&self) -> isize {
        self.current_index
    }

    /// The step under the cursor, if the cursor is on one.
    pub fn current_step(&self) -> Option<&ExecutionStep> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|i| self.steps.get(i))
    }

    fn min_index(&self) -> isize {
        if self.steps.is_empty() {
            -1
        } else {
            0
        }
    }

    fn max_index(&self) -> isize {
        self.steps.len() as isize - 1
    }

    /// Move the cursor, clamping into the valid range.
    pub fn set_index(&mut self, index: isize) {
        self.current_index = index.clamp(self.min_index(), self.max_index());
    }

    pub fn step_forward(&mut self) {
        self.set_index(self.current_index + 1);
    }

    pub fn step_backward(&mut self) {
        self.set_index(self.current_index - 1);
    }

    pub fn jump_to_start(&mut self) {
        self.set_index(0);
    }

    pub fn jump_to_end(&mut self) {
        self.set_index(self.max_index());
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn play(&mut self, speed: f64) {
        self.play_from(speed, Instant::now());
    }

    pub fn pause(&mut self) {
        self.playback = None;
    }

    pub fn toggle_play(&mut self, speed: f64) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(speed);
        }
    }

    /// Advance playback if enough time has passed. Returns true when the
    /// cursor moved.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    // Instant-parameterized variants keep playback testable without sleeping.

    pub fn play_from(&mut self, speed: f64, now: Instant) {
        if self.steps.is_empty() {
            return;
        }
        // Replaying from the end restarts at the first step.
        if self.current_index >= self.max_index() {
            self.current_index = self.min_index();
        }
        self.playback = Some(Playback {
            interval: interval_for_speed(speed),
            last_tick: now,
        });
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        let Some(playback) = &mut self.playback else {
            return false;
        };
        if now.duration_since(playback.last_tick) < playback.interval {
            return false;
        }
        playback.last_tick = now;
        self.step_forward();
        if self.current_index >= self.max_index() {
            self.playback = None;
        }
        true
    }

    /// Smallest duration the event loop may sleep without missing a tick.
    pub fn tick_deadline(&self) -> Option<Duration> {
        self.playback.as_ref().map(|p| p.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{LineStep, Scope};

    fn steps(n: usize) -> Vec<ExecutionStep> {
        (0..n)
            .map(|i| {
                ExecutionStep::Line(LineStep {
                    step: i,
                    line: i + 1,
                    scope: Scope::default(),
                    issues: Vec::new(),
                })
            })
            .collect()
    }

    #[test]
    fn interval_formula() {
        assert_eq!(interval_for_speed(1.0), Duration::from_millis(200));
        assert_eq!(interval_for_speed(2.0), Duration::from_millis(100));
        assert_eq!(interval_for_speed(100.0), Duration::from_millis(20));
        // Degenerate speeds behave like speed 1.
        assert_eq!(interval_for_speed(0.0), Duration::from_millis(200));
        assert_eq!(interval_for_speed(-3.0), Duration::from_millis(200));
    }

    #[test]
    fn fresh_load_starts_on_the_first_step() {
        let mut tl = TimelineController::new();
        assert_eq!(tl.current_index(), -1);
        tl.load(steps(3));
        assert_eq!(tl.current_index(), 0);
        assert!(tl.current_step().is_some());
        // An empty run has no step to stand on.
        tl.load(Vec::new());
        assert_eq!(tl.current_index(), -1);
        assert!(tl.current_step().is_none());
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut tl = TimelineController::new();
        tl.load(steps(3));
        tl.step_backward();
        assert_eq!(tl.current_index(), 0);
        tl.set_index(-5);
        assert_eq!(tl.current_index(), 0);
        tl.set_index(99);
        assert_eq!(tl.current_index(), 2);
        tl.step_forward();
        assert_eq!(tl.current_index(), 2);
        tl.jump_to_start();
        assert_eq!(tl.current_index(), 0);
    }

    #[test]
    fn empty_timeline_never_plays() {
        let mut tl = TimelineController::new();
        tl.play(1.0);
        assert!(!tl.is_playing());
    }

    #[test]
    fn playback_advances_and_stops_at_end() {
        let mut tl = TimelineController::new();
        tl.load(steps(3));
        let t0 = Instant::now();
        tl.play_from(1.0, t0);
        assert!(tl.is_playing());

        // Before the interval elapses nothing moves.
        assert!(!tl.tick_at(t0 + Duration::from_millis(50)));
        assert_eq!(tl.current_index(), 0);

        assert!(tl.tick_at(t0 + Duration::from_millis(200)));
        assert_eq!(tl.current_index(), 1);

        assert!(tl.tick_at(t0 + Duration::from_millis(400)));
        assert_eq!(tl.current_index(), 2);
        // Reaching the last step pauses playback.
        assert!(!tl.is_playing());
        assert!(!tl.tick_at(t0 + Duration::from_millis(600)));
    }

    #[test]
    fn play_at_end_restarts() {
        let mut tl = TimelineController::new();
        tl.load(steps(2));
        tl.jump_to_end();
        let t0 = Instant::now();
        tl.play_from(1.0, t0);
        assert_eq!(tl.current_index(), 0);
        assert!(tl.is_playing());
    }

    #[test]
    fn load_resets_cursor_and_playback() {
        let mut tl = TimelineController::new();
        tl.load(steps(3));
        tl.set_index(2);
        tl.play(1.0);
        tl.load(steps(1));
        assert_eq!(tl.current_index(), 0);
        assert!(!tl.is_playing());
    }
}
