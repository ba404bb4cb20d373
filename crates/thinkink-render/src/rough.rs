//! Hand-drawn path jitter.
//!
//! Each outline is stroked twice, every pass with its own deterministic
//! wobble: endpoints overshoot and straight segments bow slightly. The
//! randomness comes from the element's stored seed, so a shape looks the
//! same on every frame and after every move.

use kurbo::{BezPath, PathEl, Point, Vec2};

/// Seeded xorshift32 generator.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1].
    pub fn next_signed(&mut self) -> f64 {
        (self.next_u32() as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    pub fn offset(&mut self, amount: f64) -> f64 {
        self.next_signed() * amount
    }

    fn jitter(&mut self, point: Point, amount: f64) -> Point {
        point + Vec2::new(self.offset(amount), self.offset(amount))
    }
}

/// Number of strokes drawn per outline.
pub const ROUGH_PASSES: u32 = 2;

/// Spreads the seeds of successive passes apart.
const PASS_SEED_STRIDE: u32 = 99_991;

/// Wobble `path` for the given pass.
///
/// `zoom` is the current canvas scale; the effect shrinks as the view zooms
/// in so it keeps a similar on-screen size.
pub fn hand_drawn(path: &BezPath, roughness: f64, zoom: f64, seed: u32, pass: u32) -> BezPath {
    if roughness <= 0.0 {
        return path.clone();
    }

    let scale = 1.0 / zoom.max(f64::EPSILON).sqrt();
    let overshoot = roughness * 2.0 * scale;
    let mut rng = SeededRng::new(seed.wrapping_add(pass.wrapping_mul(PASS_SEED_STRIDE)));

    let mut out = BezPath::new();
    let mut last = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                out.move_to(rng.jitter(p, overshoot));
                last = p;
            }
            PathEl::LineTo(p) => {
                let d = p - last;
                let len = d.hypot();
                let bow = rng.offset(roughness * roughness * len / 200.0) * scale;
                let normal = if len > 1e-3 {
                    Vec2::new(-d.y / len, d.x / len)
                } else {
                    Vec2::ZERO
                };
                let control = last.midpoint(p) + normal * bow;
                out.quad_to(control, rng.jitter(p, overshoot));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                out.quad_to(rng.jitter(p1, overshoot * 0.7), rng.jitter(p2, overshoot));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(
                    rng.jitter(p1, overshoot * 0.5),
                    rng.jitter(p2, overshoot * 0.5),
                    rng.jitter(p3, overshoot),
                );
                last = p3;
            }
            PathEl::ClosePath => out.close_path(),
        }
    }

    out
}
