//! Welch's unequal-variance two-sample t-test.

use super::TestOutcome;
use crate::utils::{is_constant, mean, sample_variance};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Two-sided test of `mean(a) == mean(b)` without assuming equal variances.
///
/// t = (x̄a - x̄b) / sqrt(sa²/na + sb²/nb), df from Welch-Satterthwaite.
pub(crate) fn welch_t_test(a: &[f64], b: &[f64]) -> TestOutcome {
    let (na, nb) = (a.len(), b.len());
    if na < 2 || nb < 2 {
        return TestOutcome::undefined(format!(
            "Welch's t-test needs at least two observations per group, got {na} and {nb}"
        ));
    }

    let (const_a, const_b) = (is_constant(a), is_constant(b));
    if const_a && const_b {
        return TestOutcome::undefined("Both groups have zero variance; t is undefined");
    }

    let va = if const_a { 0.0 } else { sample_variance(a) / na as f64 };
    let vb = if const_b { 0.0 } else { sample_variance(b) / nb as f64 };
    let se_sq = va + vb;

    let t = (mean(a) - mean(b)) / se_sq.sqrt();
    let df = se_sq.powi(2) / (va.powi(2) / (na as f64 - 1.0) + vb.powi(2) / (nb as f64 - 1.0));

    let p_value = StudentsT::new(0.0, 1.0, df)
        .map(|dist| (2.0 * dist.sf(t.abs())).min(1.0))
        .unwrap_or(f64::NAN);

    TestOutcome {
        statistic: t,
        p_value,
        df_numerator: Some(df),
        df_denominator: None,
        warnings: Vec::new(),
    }
}
