//! Relevance score from a yes/no logit pair.

/// Softmax probability of "yes" against "no", computed in log space for
/// numerical stability: `exp(log_softmax([no, yes])[1])`.
pub fn relevance_from_logits(no_logit: f32, yes_logit: f32) -> f32 {
    let max = no_logit.max(yes_logit);
    let log_denominator = ((no_logit - max).exp() + (yes_logit - max).exp()).ln();
    ((yes_logit - max) - log_denominator).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_stay_in_unit_interval() {
        for (no, yes) in [(0.0, 0.0), (-30.0, 30.0), (30.0, -30.0), (1e4, 1e4), (-1e4, 1e4)] {
            let score = relevance_from_logits(no, yes);
            assert!((0.0..=1.0).contains(&score), "score {score} for ({no}, {yes})");
            assert!(score.is_finite());
        }
    }

    #[test]
    fn equal_logits_give_half() {
        assert!((relevance_from_logits(2.5, 2.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn monotone_in_margin() {
        let low = relevance_from_logits(1.0, 0.0);
        let mid = relevance_from_logits(0.0, 0.0);
        let high = relevance_from_logits(0.0, 1.0);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn complementary_pairs_sum_to_one() {
        let a = relevance_from_logits(-1.3, 4.2);
        let b = relevance_from_logits(4.2, -1.3);
        assert!((a + b - 1.0).abs() < 1e-6);
    }
}
