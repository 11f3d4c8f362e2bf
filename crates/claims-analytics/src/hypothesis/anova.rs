//! One-way analysis of variance.

use super::TestOutcome;
use crate::utils::{is_constant, mean};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// F-test for equal means across `groups`.
///
/// F = MS_between / MS_within with (k - 1, N - k) degrees of freedom.
/// Empty groups or fewer than two groups give an undefined outcome.
pub(crate) fn one_way_anova(groups: &[&[f64]]) -> TestOutcome {
    let k = groups.len();
    if k < 2 {
        return TestOutcome::undefined(format!(
            "ANOVA needs at least two groups, got {k}"
        ));
    }
    if groups.iter().any(|g| g.is_empty()) {
        return TestOutcome::undefined("ANOVA is undefined when a group has no observations");
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    if total_n <= k {
        return TestOutcome::undefined(format!(
            "ANOVA needs more observations ({total_n}) than groups ({k})"
        ));
    }

    let df_between = (k - 1) as f64;
    let df_within = (total_n - k) as f64;

    // Decided on the raw values: means of constant data are off by a few ULPs,
    // which would turn zero sums of squares into rounding noise.
    if groups.iter().all(|g| is_constant(g)) {
        let first = groups[0][0];
        if groups.iter().all(|g| g[0] == first) {
            return TestOutcome::undefined("Every observation is identical; F is 0/0")
                .with_df(df_between, df_within);
        }
        return TestOutcome {
            statistic: f64::INFINITY,
            p_value: 0.0,
            df_numerator: Some(df_between),
            df_denominator: Some(df_within),
            warnings: vec!["Within-group variance is zero; F is infinite".to_string()],
        };
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total_n as f64;
    let group_means: Vec<f64> = groups.iter().map(|g| mean(g)).collect();

    let ss_between: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.iter().map(|&x| (x - gm).powi(2)).sum::<f64>())
        .sum();

    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    let f_statistic = ms_between / ms_within;
    let p_value = FisherSnedecor::new(df_between, df_within)
        .map(|dist| dist.sf(f_statistic))
        .unwrap_or(f64::NAN);

    TestOutcome {
        statistic: f_statistic,
        p_value,
        df_numerator: Some(df_between),
        df_denominator: Some(df_within),
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_means_high_p_value() {
        let a = [10.1, 9.9, 10.0, 10.2, 9.8];
        let b = [10.0, 10.1, 9.9, 10.0, 10.0];
        let c = [9.9, 10.0, 10.1, 10.0, 10.0];
        let r = one_way_anova(&[&a, &b, &c]);
        assert!(r.p_value > 0.05, "p = {}", r.p_value);
        assert_eq!(r.df_numerator, Some(2.0));
        assert_eq!(r.df_denominator, Some(12.0));
    }

    #[test]
    fn test_different_means_low_p_value() {
        let a = [5.0, 6.0, 7.0, 5.5, 6.5];
        let b = [8.0, 9.0, 8.5, 9.5, 8.0];
        let c = [4.0, 3.0, 3.5, 4.5, 4.0];
        let r = one_way_anova(&[&a, &b, &c]);
        assert!(r.statistic > 10.0);
        assert!(r.p_value < 0.01);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_known_f_statistic() {
        // means 2, 5, 8; within SS = 2 + 2 + 2; between SS = 3 * (9 + 0 + 9)
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];
        let r = one_way_anova(&[&a, &b, &c]);
        assert!((r.statistic - 27.0).abs() < 1e-10);
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_single_group_is_undefined() {
        let a = [1.0, 2.0, 3.0];
        let r = one_way_anova(&[&a]);
        assert!(r.statistic.is_nan());
        assert!(r.p_value.is_nan());
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn test_empty_group_is_undefined() {
        let a = [1.0, 2.0, 3.0];
        let b: [f64; 0] = [];
        let r = one_way_anova(&[&a, &b]);
        assert!(r.p_value.is_nan());
    }

    #[test]
    fn test_zero_within_variance() {
        let a = [1.0, 1.0];
        let b = [2.0, 2.0];
        let r = one_way_anova(&[&a, &b]);
        assert!(r.statistic.is_infinite());
        assert_eq!(r.p_value, 0.0);

        let r = one_way_anova(&[&a, &a]);
        assert!(r.statistic.is_nan());
    }

    #[test]
    fn test_identical_constant_groups_of_unequal_size() {
        // 0.1 has no exact binary form, so group means drift by a few ULPs
        let a = [0.1; 3];
        let b = [0.1; 7];
        let c = [0.1; 5];
        let r = one_way_anova(&[&a, &b, &c]);
        assert!(r.statistic.is_nan(), "F = {}", r.statistic);
        assert!(r.p_value.is_nan());
        assert_eq!(r.df_numerator, Some(2.0));
        assert_eq!(r.df_denominator, Some(12.0));
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn test_distinct_constant_groups_are_infinite() {
        let a = [0.1; 3];
        let b = [0.2; 7];
        let r = one_way_anova(&[&a, &b]);
        assert!(r.statistic.is_infinite());
        assert_eq!(r.p_value, 0.0);
    }

    #[test]
    fn test_one_observation_per_group_is_undefined() {
        let a = [1.0];
        let b = [2.0];
        let r = one_way_anova(&[&a, &b]);
        assert!(r.p_value.is_nan());
    }
}
