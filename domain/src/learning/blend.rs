//! Blend planning between the frozen baseline and the self-learning corpus
//!
//! The original (baseline) share of every retraining set stays within
//! `[0.6, 0.8]`, so a single batch of feedback can never make up more than
//! 40% of what a role is retrained on.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

pub const MIN_ORIGINAL_SHARE: f64 = 0.6;
pub const MAX_ORIGINAL_SHARE: f64 = 0.8;

/// Fraction of a retraining set drawn from the original corpus
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BlendRatio(f64);

impl BlendRatio {
    pub fn new(ratio: f64) -> Result<Self, DomainError> {
        if ratio.is_finite() && (MIN_ORIGINAL_SHARE..=MAX_ORIGINAL_SHARE).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(DomainError::InvalidBlendRatio(ratio))
        }
    }

    /// Clamp any requested target into the legal range (NaN becomes the midpoint)
    pub fn clamped(ratio: f64) -> Self {
        if ratio.is_nan() {
            return Self((MIN_ORIGINAL_SHARE + MAX_ORIGINAL_SHARE) / 2.0);
        }
        Self(ratio.clamp(MIN_ORIGINAL_SHARE, MAX_ORIGINAL_SHARE))
    }

    pub fn original_share(&self) -> f64 {
        self.0
    }

    pub fn self_learning_share(&self) -> f64 {
        1.0 - self.0
    }
}

impl Default for BlendRatio {
    fn default() -> Self {
        Self(0.7)
    }
}

impl TryFrom<f64> for BlendRatio {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlendRatio> for f64 {
    fn from(ratio: BlendRatio) -> Self {
        ratio.0
    }
}

impl std::fmt::Display for BlendRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}/{:.0}", self.0 * 100.0, (1.0 - self.0) * 100.0)
    }
}

/// How many examples to draw from each corpus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendPlan {
    pub original_count: usize,
    pub self_learning_count: usize,
    /// Realized original share, always within `[target, 0.8]`
    pub ratio: BlendRatio,
}

impl BlendPlan {
    pub fn total(&self) -> usize {
        self.original_count + self.self_learning_count
    }

    /// Extra non-original examples the set absorbs before the original
    /// share would drop below [`MIN_ORIGINAL_SHARE`]
    pub fn headroom(&self) -> usize {
        let odds = (1.0 - MIN_ORIGINAL_SHARE) / MIN_ORIGINAL_SHARE;
        let max_non_original = ((self.original_count as f64) * odds + 1e-9).floor() as usize;
        max_non_original.saturating_sub(self.self_learning_count)
    }
}

/// Plan a blend from `original_available` baseline examples and
/// `self_learning_available` eligible feedback examples.
///
/// ```text
/// n_self = min(S, floor(O * (1 - r) / r))
/// n_orig = min(O, ceil(n_self * r / (1 - r)))
/// ```
pub fn plan_blend(
    original_available: usize,
    self_learning_available: usize,
    target: BlendRatio,
) -> Result<BlendPlan, DomainError> {
    if original_available == 0 {
        return Err(DomainError::OutOfRange {
            field: "original corpus size".to_string(),
            value: 0.0,
        });
    }
    if self_learning_available == 0 {
        return Err(DomainError::OutOfRange {
            field: "self-learning examples available".to_string(),
            value: 0.0,
        });
    }

    let r = target.original_share();
    let odds = r / (1.0 - r);
    let max_self = ((original_available as f64) / odds + 1e-9).floor() as usize;
    let self_learning_count = self_learning_available.min(max_self);
    if self_learning_count == 0 {
        // Baseline too small to admit even one feedback example at this ratio
        return Err(DomainError::OutOfRange {
            field: "original corpus size".to_string(),
            value: original_available as f64,
        });
    }
    let original_count =
        original_available.min(((self_learning_count as f64) * odds - 1e-9).ceil() as usize);

    let realized = original_count as f64 / (original_count + self_learning_count) as f64;
    let ratio = BlendRatio::new(realized)?;

    Ok(BlendPlan {
        original_count,
        self_learning_count,
        ratio,
    })
}

/// Evenly strided indices `0..available`, `count` of them
pub fn strided_indices(available: usize, count: usize) -> Vec<usize> {
    if count == 0 || available == 0 {
        return Vec::new();
    }
    let count = count.min(available);
    (0..count).map(|i| i * available / count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_ratio_range() {
        assert!(BlendRatio::new(0.6).is_ok());
        assert!(BlendRatio::new(0.8).is_ok());
        assert!(BlendRatio::new(0.59).is_err());
        assert!(BlendRatio::new(0.81).is_err());
        assert!(BlendRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn test_clamped() {
        assert_eq!(BlendRatio::clamped(0.95).original_share(), 0.8);
        assert_eq!(BlendRatio::clamped(0.1).original_share(), 0.6);
        assert_eq!(BlendRatio::clamped(0.75).original_share(), 0.75);
    }

    #[test]
    fn test_plan_caps_self_learning_share() {
        // 100 originals at 70/30 admit at most 42 feedback examples
        let plan = plan_blend(100, 500, BlendRatio::default()).unwrap();
        assert_eq!(plan.self_learning_count, 42);
        assert_eq!(plan.original_count, 98);
        assert!(plan.ratio.self_learning_share() <= 0.4);
    }

    #[test]
    fn test_plan_with_few_feedback_examples() {
        let plan = plan_blend(1000, 30, BlendRatio::default()).unwrap();
        assert_eq!(plan.self_learning_count, 30);
        assert_eq!(plan.original_count, 70);
        assert!((plan.ratio.original_share() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_plan_ratio_invariant_over_grid() {
        for target in [0.6, 0.65, 0.7, 0.75, 0.8] {
            let target = BlendRatio::new(target).unwrap();
            for original in [1usize, 3, 7, 50, 333] {
                for feedback in [1usize, 2, 9, 120, 1000] {
                    if let Ok(plan) = plan_blend(original, feedback, target) {
                        let share = plan.ratio.original_share();
                        assert!((0.6..=0.8).contains(&share));
                        assert!(share + 1e-9 >= target.original_share());
                        assert!(plan.original_count <= original);
                        assert!(plan.self_learning_count <= feedback);
                    }
                }
            }
        }
    }

    #[test]
    fn test_plan_requires_both_corpora() {
        assert!(plan_blend(0, 10, BlendRatio::default()).is_err());
        assert!(plan_blend(10, 0, BlendRatio::default()).is_err());
        // One original cannot carry a feedback example at 70/30
        assert!(plan_blend(1, 5, BlendRatio::default()).is_err());
    }

    #[test]
    fn test_headroom_keeps_original_floor() {
        let plan = plan_blend(10, 3, BlendRatio::default()).unwrap();
        assert_eq!((plan.original_count, plan.self_learning_count), (7, 3));
        // 7 originals admit 4 non-original examples at a 0.6 floor
        assert_eq!(plan.headroom(), 1);

        let extra = plan.headroom();
        let share = plan.original_count as f64 / (plan.total() + extra) as f64;
        assert!(share >= MIN_ORIGINAL_SHARE);
    }

    #[test]
    fn test_strided_indices() {
        assert_eq!(strided_indices(10, 5), vec![0, 2, 4, 6, 8]);
        assert_eq!(strided_indices(3, 10), vec![0, 1, 2]);
        assert!(strided_indices(0, 3).is_empty());
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<BlendRatio>("0.9").is_err());
        let ok: BlendRatio = serde_json::from_str("0.65").unwrap();
        assert_eq!(ok.original_share(), 0.65);
    }
}
