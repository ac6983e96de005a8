use serde::{Deserialize, Serialize};

use crate::config::GestureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Up,
    Down,
    Left,
    Right,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Like,
    Dislike,
}

impl Outcome {
    /// `Up` likes, `Down` dislikes, horizontal swipes only navigate.
    pub fn decision(self) -> Option<Decision> {
        match self {
            Outcome::Up => Some(Decision::Like),
            Outcome::Down => Some(Decision::Dislike),
            Outcome::Left | Outcome::Right | Outcome::Cancel => None,
        }
    }

    pub fn advances(self) -> bool {
        self != Outcome::Cancel
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureSample {
    pub dx: f32,
    pub dy: f32,
}

impl GestureSample {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn is_horizontal(&self) -> bool {
        self.dx.abs() > self.dy.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&GestureConfig::default())
    }
}

impl From<&GestureConfig> for Thresholds {
    fn from(config: &GestureConfig) -> Self {
        Self {
            horizontal: config.swipe_threshold,
            vertical: config.vertical_swipe_threshold,
        }
    }
}

pub fn classify(sample: GestureSample, thresholds: Thresholds) -> Outcome {
    let GestureSample { dx, dy } = sample;
    let horizontal = sample.is_horizontal();
    if horizontal && dx.abs() > thresholds.horizontal {
        if dx > 0.0 {
            Outcome::Right
        } else {
            Outcome::Left
        }
    } else if !horizontal && dy.abs() > thresholds.vertical {
        if dy > 0.0 {
            Outcome::Down
        } else {
            Outcome::Up
        }
    } else {
        Outcome::Cancel
    }
}

/// Presentation state for one frame of an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureFrame {
    pub translate_x: f32,
    pub translate_y: f32,
    pub rotation_deg: f32,
    pub progress: f32,
}

/// Accumulates the drag of the front card between press and release.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    active: bool,
    captured: bool,
    sample: GestureSample,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            active: false,
            captured: false,
            sample: GestureSample::default(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Starts a drag. Only the top card may be dragged.
    pub fn begin(&mut self, is_top: bool) -> bool {
        self.sample = GestureSample::default();
        self.captured = false;
        self.active = is_top;
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the drag has moved far enough sideways to follow the pointer.
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn sample(&self) -> GestureSample {
        self.sample
    }

    /// Adds a per-frame delta and returns the frame to draw. The card stays
    /// put (`None`) until the drag is captured; the delta still counts
    /// towards the release.
    pub fn update(&mut self, delta_x: f32, delta_y: f32) -> Option<GestureFrame> {
        if !self.active {
            return None;
        }
        self.sample.dx += delta_x;
        self.sample.dy += delta_y;
        if !self.captured {
            self.captured = should_capture(self.sample, &self.config);
        }
        self.captured.then(|| frame_for(self.sample, &self.config))
    }

    /// Ends the drag and classifies the accumulated delta.
    pub fn release(&mut self) -> Outcome {
        if !self.active {
            return Outcome::Cancel;
        }
        self.active = false;
        let sample = std::mem::take(&mut self.sample);
        classify(sample, Thresholds::from(&self.config))
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.captured = false;
        self.sample = GestureSample::default();
    }
}

/// A move turns into a drag only when it is clearly horizontal.
pub fn should_capture(sample: GestureSample, config: &GestureConfig) -> bool {
    sample.is_horizontal() && sample.dx.abs() > config.capture_slop
}

pub fn swipe_progress(dx: f32, config: &GestureConfig) -> f32 {
    dx.abs() / config.swipe_threshold
}

pub fn rotation_deg(dx: f32, config: &GestureConfig) -> f32 {
    (dx / config.swipe_threshold).clamp(-1.0, 1.0) * config.max_rotation_deg
}

pub fn frame_for(sample: GestureSample, config: &GestureConfig) -> GestureFrame {
    if !sample.is_horizontal() {
        return GestureFrame {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation_deg: 0.0,
            progress: 0.0,
        };
    }
    GestureFrame {
        translate_x: sample.dx,
        translate_y: sample.dy * config.vertical_damping,
        rotation_deg: rotation_deg(sample.dx, config),
        progress: swipe_progress(sample.dx, config),
    }
}

/// Vertical offset of the card at `index` in the visible window.
///
/// Cards stack upward by `stack_offset` each; while the front card is being
/// dragged, the second and third cards slide one slot toward the front in
/// proportion to the swipe progress.
pub fn stacked_offset(index: usize, progress: f32, config: &GestureConfig) -> f32 {
    let rest = -config.stack_offset * index as f32;
    match index {
        1 | 2 => rest + progress.clamp(0.0, 1.0) * config.stack_offset,
        _ => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(dx: f32, dy: f32) -> Outcome {
        classify(GestureSample::new(dx, dy), Thresholds::default())
    }

    #[test]
    fn horizontal_swipes_past_threshold() {
        assert_eq!(outcome(150.0, 20.0), Outcome::Right);
        assert_eq!(outcome(-121.0, -40.0), Outcome::Left);
    }

    #[test]
    fn vertical_swipes_past_threshold() {
        assert_eq!(outcome(10.0, -81.0), Outcome::Up);
        assert_eq!(outcome(-30.0, 200.0), Outcome::Down);
    }

    #[test]
    fn short_or_ambiguous_drags_cancel() {
        assert_eq!(outcome(0.0, 0.0), Outcome::Cancel);
        assert_eq!(outcome(120.0, 0.0), Outcome::Cancel);
        assert_eq!(outcome(0.0, 80.0), Outcome::Cancel);
        // Horizontal dominance with a vertical delta past its threshold
        // still needs the horizontal threshold.
        assert_eq!(outcome(110.0, 90.0), Outcome::Cancel);
        // A perfect diagonal counts as vertical.
        assert_eq!(outcome(100.0, 100.0), Outcome::Down);
    }

    #[test]
    fn decisions_follow_vertical_outcomes() {
        assert_eq!(Outcome::Up.decision(), Some(Decision::Like));
        assert_eq!(Outcome::Down.decision(), Some(Decision::Dislike));
        assert_eq!(Outcome::Left.decision(), None);
        assert!(!Outcome::Cancel.advances());
        assert!(Outcome::Right.advances());
    }

    #[test]
    fn tracker_accumulates_deltas_until_release() {
        let mut tracker = GestureTracker::new(GestureConfig::default());
        assert!(tracker.begin(true));
        assert!(tracker.update(5.0, 0.0).is_none());
        assert!(!tracker.is_captured());
        for _ in 0..9 {
            tracker.update(15.0, 1.0);
        }
        assert!(tracker.is_captured());
        assert_eq!(tracker.sample(), GestureSample::new(140.0, 9.0));
        assert_eq!(tracker.release(), Outcome::Right);
        assert!(!tracker.is_active());
        assert_eq!(tracker.sample(), GestureSample::default());
    }

    #[test]
    fn vertical_drags_are_not_followed_but_still_classify() {
        let mut tracker = GestureTracker::new(GestureConfig::default());
        tracker.begin(true);
        for _ in 0..10 {
            assert!(tracker.update(0.5, -10.0).is_none());
        }
        assert!(!tracker.is_captured());
        assert_eq!(tracker.release(), Outcome::Up);
    }

    #[test]
    fn tracker_ignores_cards_behind_the_top() {
        let mut tracker = GestureTracker::new(GestureConfig::default());
        assert!(!tracker.begin(false));
        assert!(tracker.update(500.0, 0.0).is_none());
        assert_eq!(tracker.release(), Outcome::Cancel);
    }

    #[test]
    fn frames_tilt_with_horizontal_travel() {
        let config = GestureConfig::default();
        let frame = frame_for(GestureSample::new(60.0, 10.0), &config);
        assert_eq!(frame.translate_x, 60.0);
        assert!((frame.translate_y - 3.0).abs() < 1e-4);
        assert!((frame.rotation_deg - 7.5).abs() < 1e-4);
        assert!((frame.progress - 0.5).abs() < 1e-4);

        let far = frame_for(GestureSample::new(-600.0, 0.0), &config);
        assert_eq!(far.rotation_deg, -15.0);
    }

    #[test]
    fn capture_requires_horizontal_slop() {
        let config = GestureConfig::default();
        assert!(!should_capture(GestureSample::new(8.0, 1.0), &config));
        assert!(!should_capture(GestureSample::new(12.0, 30.0), &config));
        assert!(should_capture(GestureSample::new(12.0, 3.0), &config));
    }

    #[test]
    fn stacked_cards_slide_forward_with_progress() {
        let config = GestureConfig::default();
        assert_eq!(stacked_offset(0, 0.5, &config), 0.0);
        assert_eq!(stacked_offset(1, 0.0, &config), -12.0);
        assert_eq!(stacked_offset(1, 1.0, &config), 0.0);
        assert_eq!(stacked_offset(2, 0.5, &config), -18.0);
        assert_eq!(stacked_offset(2, 3.0, &config), -12.0);
        assert_eq!(stacked_offset(3, 1.0, &config), -36.0);
    }
}
