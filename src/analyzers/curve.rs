//! Piecewise-linear scoring curves
//!
//! Every rate-based dimension maps a ratio onto 1..10 with three segments:
//! poor (below the good cutoff), good (between good and excellent) and
//! excellent (9 and up). Segments are continuous at the cutoffs.

/// `numerator / denominator`, or 0 for an empty denominator
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Position of `value` inside a segment of width `span`, 1.0 for a degenerate segment
fn progress(offset: f64, span: f64) -> f64 {
    if span <= 0.0 {
        1.0
    } else {
        offset / span
    }
}

/// Curve for rates where higher is better
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RisingCurve {
    pub good: f64,
    pub excellent: f64,
    /// Score at the good cutoff; the poor segment rises from 1 to here
    pub good_floor: f64,
}

impl RisingCurve {
    pub fn new(good: f64, excellent: f64, good_floor: f64) -> Self {
        Self { good, excellent, good_floor }
    }

    pub fn score(&self, rate: f64) -> f64 {
        let score = if rate >= self.excellent {
            9.0 + progress(rate - self.excellent, 1.0 - self.excellent)
        } else if rate >= self.good {
            self.good_floor
                + progress(rate - self.good, self.excellent - self.good) * (9.0 - self.good_floor)
        } else {
            1.0 + progress(rate, self.good) * (self.good_floor - 1.0)
        };
        score.clamp(0.0, 10.0)
    }
}

/// Curve for rates where lower is better
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingCurve {
    pub good: f64,
    pub excellent: f64,
    /// Rate above `good` that costs two points
    pub decay: f64,
}

impl FallingCurve {
    pub fn new(good: f64, excellent: f64, decay: f64) -> Self {
        Self { good, excellent, decay }
    }

    pub fn score(&self, rate: f64) -> f64 {
        let score = if rate < self.excellent {
            9.0 + progress(self.excellent - rate, self.excellent)
        } else if rate < self.good {
            7.0 + progress(self.good - rate, self.good - self.excellent) * 2.0
        } else {
            (7.0 - progress(rate - self.good, self.decay) * 2.0).max(1.0)
        };
        score.clamp(0.0, 10.0)
    }
}

/// Four-band curve for ratios against a team average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeCurve {
    pub fair: f64,
    pub good: f64,
    pub excellent: f64,
}

impl RelativeCurve {
    pub fn score(&self, ratio: f64) -> f64 {
        let score = if ratio >= self.excellent {
            9.0 + progress(ratio - self.excellent, self.excellent).min(1.0)
        } else if ratio >= self.good {
            7.0 + progress(ratio - self.good, self.excellent - self.good) * 2.0
        } else if ratio >= self.fair {
            5.0 + progress(ratio - self.fair, self.good - self.fair) * 2.0
        } else {
            1.0 + progress(ratio, self.fair) * 4.0
        };
        score.clamp(0.0, 10.0)
    }
}
