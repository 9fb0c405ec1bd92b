//! Per-card reveal scheduling.
//!
//! Pure functions: given the view state, the origin of the last transient
//! revert and the fade sub-state, compute where each card is heading and how
//! it gets there. Two profiles exist. A cold reveal (first paint, or after
//! `Loading`) slides cards up with a longer stagger. A from-skeleton reveal
//! is a short fade so the content swap does not read as a second load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::{TransitionOrigin, ViewState};
use crate::core::config::RevealConfig;

/// Opacity of skeleton placeholders.
pub const PLACEHOLDER_OPACITY: f32 = 1.0;

/// Interpolation curve applied to a transition's normalized progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOut,
    EaseOutCubic,
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Named timing configuration for one kind of reveal.
///
/// Profiles are replaced whole when configured; there is no per-field merge
/// with the built-in values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealProfile {
    pub base_delay_ms: u64,
    pub stagger_step_ms: u64,
    pub duration_ms: u64,
    /// Vertical distance cards travel into place; 0 means fade only.
    pub initial_offset_px: f32,
    pub easing: Easing,
}

impl RevealProfile {
    /// Slow, spatial entrance: 25/50/75/100 ms delays, 400 ms slide-up.
    #[must_use]
    pub fn cold() -> Self {
        Self {
            base_delay_ms: 25,
            stagger_step_ms: 25,
            duration_ms: 400,
            initial_offset_px: 20.0,
            easing: Easing::EaseOutCubic,
        }
    }

    /// Quick content swap: 0/25/50/75 ms delays, 150 ms fade.
    #[must_use]
    pub fn from_skeleton() -> Self {
        Self {
            base_delay_ms: 0,
            stagger_step_ms: 25,
            duration_ms: 150,
            initial_offset_px: 0.0,
            easing: Easing::EaseOut,
        }
    }

    /// Reveal delay of the card at `stagger_index`.
    #[must_use]
    pub fn delay_ms(&self, stagger_index: usize) -> u64 {
        let index = u64::try_from(stagger_index).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_add(index.saturating_mul(self.stagger_step_ms))
    }
}

/// How a card animates toward its target values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Transition {
    /// Jump straight to the target.
    pub const INSTANT: Self = Self {
        delay_ms: 0,
        duration_ms: 0,
        easing: Easing::Linear,
    };

    /// Time at which the transition has fully settled.
    #[must_use]
    pub fn settles_after(&self) -> Duration {
        Duration::from_millis(self.delay_ms.saturating_add(self.duration_ms))
    }
}

/// Target visual values of one card plus the transition that reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardRender {
    pub opacity: f32,
    pub offset_px: f32,
    pub from_opacity: f32,
    pub from_offset_px: f32,
    pub transition: Transition,
}

impl CardRender {
    /// Hidden immediately.
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            opacity: 0.0,
            offset_px: 0.0,
            from_opacity: 0.0,
            from_offset_px: 0.0,
            transition: Transition::INSTANT,
        }
    }

    /// Skeleton placeholder: fully visible at once, no stagger.
    #[must_use]
    pub const fn placeholder() -> Self {
        Self {
            opacity: PLACEHOLDER_OPACITY,
            offset_px: 0.0,
            from_opacity: PLACEHOLDER_OPACITY,
            from_offset_px: 0.0,
            transition: Transition::INSTANT,
        }
    }

    /// Instantaneous `(opacity, offset_px)` at `elapsed` since the reveal began.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&self, elapsed: Duration) -> (f32, f32) {
        let elapsed_ms = elapsed.as_millis();
        let delay = u128::from(self.transition.delay_ms);
        if elapsed_ms < delay {
            return (self.from_opacity, self.from_offset_px);
        }
        if self.transition.duration_ms == 0 {
            return (self.opacity, self.offset_px);
        }
        let t = (elapsed_ms - delay) as f32 / self.transition.duration_ms as f32;
        let k = self.transition.easing.apply(t);
        (
            lerp(self.from_opacity, self.opacity, k),
            lerp(self.from_offset_px, self.offset_px, k),
        )
    }
}

fn lerp(from: f32, to: f32, k: f32) -> f32 {
    (to - from).mul_add(k, from)
}

/// Pick the profile for the next `Normal` reveal.
#[must_use]
pub fn profile_for(
    last_origin: Option<TransitionOrigin>,
    profiles: &RevealConfig,
) -> &RevealProfile {
    match last_origin {
        Some(TransitionOrigin::FromSkeleton) => &profiles.from_skeleton,
        Some(TransitionOrigin::FromLoading) | None => &profiles.cold,
    }
}

/// Compute the render target of the card at `stagger_index`.
///
/// Total over its inputs.
#[must_use]
pub fn compute_card_render(
    stagger_index: usize,
    current: ViewState,
    last_origin: Option<TransitionOrigin>,
    fading_from_skeleton: bool,
    profiles: &RevealConfig,
) -> CardRender {
    match current {
        ViewState::Skeleton => CardRender::placeholder(),
        ViewState::Loading | ViewState::Error | ViewState::Empty => CardRender::hidden(),
        ViewState::Normal if fading_from_skeleton => CardRender::hidden(),
        ViewState::Normal => {
            let profile = profile_for(last_origin, profiles);
            CardRender {
                opacity: 1.0,
                offset_px: 0.0,
                from_opacity: 0.0,
                from_offset_px: profile.initial_offset_px,
                transition: Transition {
                    delay_ms: profile.delay_ms(stagger_index),
                    duration_ms: profile.duration_ms,
                    easing: profile.easing,
                },
            }
        }
    }
}
