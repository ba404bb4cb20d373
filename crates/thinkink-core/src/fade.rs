//! Fade scheduler for disappearing ink.
//!
//! Called once per frame. Strokes stay fully visible for `delay`, fade out
//! linearly over `duration`, then are removed without touching history.

use crate::element::{ElementId, ElementKind};
use crate::store::ElementStore;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_FADE_DELAY_MS: u64 = 3000;
pub const DEFAULT_FADE_DURATION_MS: u64 = 1000;

/// Opacity changes smaller than this are not written back.
const OPACITY_EPSILON: f64 = 0.01;

/// Current wall-clock time in milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What one tick changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeReport {
    pub faded: usize,
    pub removed: usize,
}

impl FadeReport {
    pub fn changed(&self) -> bool {
        self.faded > 0 || self.removed > 0
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeScheduler {
    delay: u64,
    duration: u64,
}

impl Default for FadeScheduler {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_FADE_DELAY_MS),
            Duration::from_millis(DEFAULT_FADE_DURATION_MS),
        )
    }
}

impl FadeScheduler {
    pub fn new(delay: Duration, duration: Duration) -> Self {
        Self {
            delay: millis(delay),
            duration: millis(duration).max(1),
        }
    }

    /// Opacity for a stroke of the given age, or None once it has expired.
    pub fn opacity_at(&self, age_ms: u64) -> Option<f64> {
        if age_ms < self.delay {
            Some(1.0)
        } else if age_ms < self.delay.saturating_add(self.duration) {
            let progress = (age_ms - self.delay) as f64 / self.duration as f64;
            Some((1.0 - progress).max(0.0))
        } else {
            None
        }
    }

    /// Decay and expire disappearing ink as of `now_ms`.
    ///
    /// Work is planned from a snapshot taken on entry, and every write goes
    /// through id lookups, so elements removed meanwhile are skipped.
    pub fn tick(&self, store: &mut ElementStore, now_ms: u64) -> FadeReport {
        let snapshot = store.snapshot();
        let mut expired: Vec<ElementId> = Vec::new();
        let mut fading: Vec<(ElementId, f64)> = Vec::new();

        for element in snapshot.iter() {
            let ElementKind::DisappearingPen {
                created_at: Some(created_at),
                ..
            } = element.kind
            else {
                continue;
            };
            let age = now_ms.saturating_sub(created_at);
            match self.opacity_at(age) {
                None => expired.push(element.id),
                Some(opacity) if age >= self.delay => {
                    if (element.style.opacity - opacity).abs() > OPACITY_EPSILON {
                        fading.push((element.id, opacity));
                    }
                }
                Some(_) => {}
            }
        }

        let mut report = FadeReport::default();
        for (id, opacity) in fading {
            if store.update(id, |e| e.style.opacity = opacity) {
                report.faded += 1;
            }
        }
        if !expired.is_empty() {
            report.removed = store.delete_many(&expired);
            log::debug!("disappearing ink expired: {}", report.removed);
        }
        report
    }
}
