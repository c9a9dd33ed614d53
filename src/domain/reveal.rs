/// Reveal animator: elapsed time → pixelation level → score.
///
/// Two states, Paused and Running. While running, every update re-evaluates
/// the curves from the current `elapsed` and `duration`:
///
///   progress   = clamp(elapsed / duration, 0, 1)
///   pixel_size = lerp(100, 1, progress)            (linear sharpen)
///   score      = round(lerp(100, 1, progress²))    (ease-in decay)
///
/// The quadratic decay keeps the score high early and drops it sharply
/// near the full reveal.

pub const PIXEL_COARSE: f32 = 100.0;
pub const PIXEL_FINE: f32 = 1.0;
pub const SCORE_MAX: u32 = 100;
pub const SCORE_MIN: u32 = 1;

pub const DURATION_MIN: f32 = 1.0;
pub const DURATION_MAX: f32 = 20.0;
pub const DURATION_DEFAULT: f32 = 10.0;

/// `a * (1 - t) + b * t`. Exact at both ends, so `lerp(100, 1, 1) == 1.0`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Normalized reveal progress in [0, 1].
pub fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Pixel block size for the given time, clamped to [1, 100].
pub fn pixel_size(elapsed: f32, duration: f32) -> f32 {
    lerp(PIXEL_COARSE, PIXEL_FINE, progress(elapsed, duration)).clamp(PIXEL_FINE, PIXEL_COARSE)
}

/// Score for the given time, clamped to [1, 100].
pub fn score(elapsed: f32, duration: f32) -> u32 {
    let p = progress(elapsed, duration);
    let decay = p * p;
    let raw = lerp(SCORE_MAX as f32, SCORE_MIN as f32, decay).round();
    (raw as u32).clamp(SCORE_MIN, SCORE_MAX)
}

/// Clamp to [DURATION_MIN, DURATION_MAX]; `None` for NaN or infinity.
fn clamp_duration(secs: f32) -> Option<f32> {
    secs.is_finite().then(|| secs.clamp(DURATION_MIN, DURATION_MAX))
}

#[derive(Clone, Debug)]
pub struct RevealAnimator {
    elapsed: f32,
    duration: f32,
    paused: bool,
    pixel_size: f32,
    score: u32,
}

impl RevealAnimator {
    pub fn new(duration: f32) -> Self {
        RevealAnimator {
            elapsed: 0.0,
            duration: clamp_duration(duration).unwrap_or(DURATION_DEFAULT),
            paused: true,
            pixel_size: PIXEL_COARSE,
            score: SCORE_MAX,
        }
    }

    #[allow(dead_code)]
    pub fn elapsed(&self) -> f32 { self.elapsed }
    pub fn duration(&self) -> f32 { self.duration }
    pub fn is_paused(&self) -> bool { self.paused }
    pub fn pixel_size(&self) -> f32 { self.pixel_size }
    pub fn score(&self) -> u32 { self.score }

    /// Fully revealed means the block size reached exactly 1.
    pub fn is_revealed(&self) -> bool {
        self.pixel_size == PIXEL_FINE
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Back to the coarse start, paused.
    pub fn reset(&mut self) {
        self.rewind();
        self.paused = true;
    }

    /// Back to the coarse start, running.
    pub fn restart(&mut self) {
        self.rewind();
        self.paused = false;
    }

    /// Change the reveal length. Past elapsed time is kept; the curves pick
    /// up the new rate on the next running update.
    /// Non-finite values are ignored.
    pub fn set_duration(&mut self, secs: f32) {
        if let Some(secs) = clamp_duration(secs) {
            self.duration = secs;
        }
    }

    /// Advance by `dt` seconds. No-op while paused.
    /// Returns true on the tick the image becomes fully revealed.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.paused {
            return false;
        }
        let was_revealed = self.is_revealed();

        self.elapsed += dt.max(0.0);
        self.pixel_size = pixel_size(self.elapsed, self.duration);
        self.score = score(self.elapsed, self.duration);

        !was_revealed && self.is_revealed()
    }

    fn rewind(&mut self) {
        self.elapsed = 0.0;
        self.pixel_size = PIXEL_COARSE;
        self.score = SCORE_MAX;
    }
}

impl Default for RevealAnimator {
    fn default() -> Self {
        RevealAnimator::new(DURATION_DEFAULT)
    }
}
