// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logit post-processing.

/// Convert logits into a probability distribution.
///
/// The max logit is subtracted before exponentiating so large inputs cannot
/// overflow. Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return Vec::new();
    }

    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value. Ties resolve to the lowest index; NaN values
/// are never selected.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_distribution(probs: &[f32]) {
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON, "sum was {}", sum);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_softmax_basic() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert_distribution(&probs);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let probs = softmax(&[1000.0, 999.0, 10_000.0, -5.0]);
        assert_distribution(&probs);
        assert!((probs[2] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_softmax_very_negative_logits() {
        let probs = softmax(&[-1.0e30, -1.0e30 + 1.0e24, -5.0e29]);
        assert_distribution(&probs);
    }

    #[test]
    fn test_softmax_uniform() {
        let probs = softmax(&[7.5; 4]);
        assert_distribution(&probs);
        for p in probs {
            assert!((p - 0.25).abs() < EPSILON);
        }
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.05]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }
}
