//! Hypothesis tests comparing a numeric metric across groups.
//!
//! Both tests return a [`HypothesisTestResult`] and leave presentation to
//! the caller. The significance level is fixed at [`SIGNIFICANCE_LEVEL`].
//!
//! Degenerate inputs (empty groups, a single group, no spread) do not fail:
//! the statistic and p-value come back as NaN, the decision is
//! [`Decision::Inconclusive`] and the reasons are listed in
//! [`HypothesisTestResult::warnings`] and logged with `tracing::warn!`.
//! Unknown or non-numeric columns are hard errors.

mod anova;
mod welch;

use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::utils::mean;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// Threshold below which the null hypothesis is rejected.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Which test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    OneWayAnova,
    WelchTTest,
}

impl TestKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TestKind::OneWayAnova => "One-way ANOVA",
            TestKind::WelchTTest => "Welch's t-test",
        }
    }

    pub fn statistic_label(&self) -> &'static str {
        match self {
            TestKind::OneWayAnova => "F-statistic",
            TestKind::WelchTTest => "t-statistic",
        }
    }
}

/// Outcome of comparing the p-value with [`SIGNIFICANCE_LEVEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    FailToReject,
    /// The statistic or p-value is not a number.
    Inconclusive,
}

impl Decision {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value.is_nan() {
            Decision::Inconclusive
        } else if p_value < SIGNIFICANCE_LEVEL {
            Decision::Reject
        } else {
            Decision::FailToReject
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Reject => "Reject the null hypothesis",
            Decision::FailToReject => "Fail to reject the null hypothesis",
            Decision::Inconclusive => "No decision",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Decision::Reject => {
                "The difference between the groups is statistically significant at the 5% level."
            }
            Decision::FailToReject => {
                "There is no statistically significant difference between the groups at the 5% level."
            }
            Decision::Inconclusive => {
                "The test statistic is undefined for these groups, so no conclusion can be drawn."
            }
        }
    }
}

/// Size and mean of one compared group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: String,
    /// Observed (non-missing) metric values.
    pub count: usize,
    /// NaN for an empty group.
    pub mean: f64,
}

/// Result of a hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisTestResult {
    pub test: TestKind,
    pub metric_column: String,
    pub group_column: String,
    pub groups: Vec<GroupSummary>,
    pub statistic: f64,
    pub p_value: f64,
    /// Between-groups df for ANOVA, Welch-Satterthwaite df for the t-test.
    pub df_numerator: Option<f64>,
    /// Within-groups df for ANOVA.
    pub df_denominator: Option<f64>,
    pub decision: Decision,
    pub warnings: Vec<String>,
}

impl HypothesisTestResult {
    pub fn reject_null(&self) -> bool {
        self.decision == Decision::Reject
    }

    /// Decision label followed by its fixed explanation.
    pub fn conclusion(&self) -> String {
        format!("{}. {}", self.decision.label(), self.decision.explanation())
    }
}

impl fmt::Display for HypothesisTestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} by {}",
            self.test.display_name(),
            self.metric_column,
            self.group_column
        )?;
        for group in &self.groups {
            writeln!(
                f,
                "  {:<24} n = {:<8} mean = {:.4}",
                group.label, group.count, group.mean
            )?;
        }
        writeln!(
            f,
            "{}: {:.4}, p-value: {:.4}",
            self.test.statistic_label(),
            self.statistic,
            self.p_value
        )?;
        for warning in &self.warnings {
            writeln!(f, "Warning: {warning}")?;
        }
        write!(f, "{}", self.conclusion())
    }
}

/// Statistic, p-value and degrees of freedom before a decision is attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub df_numerator: Option<f64>,
    pub df_denominator: Option<f64>,
    pub warnings: Vec<String>,
}

impl TestOutcome {
    pub(crate) fn undefined(reason: impl Into<String>) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            df_numerator: None,
            df_denominator: None,
            warnings: vec![reason.into()],
        }
    }

    pub(crate) fn with_df(mut self, numerator: f64, denominator: f64) -> Self {
        self.df_numerator = Some(numerator);
        self.df_denominator = Some(denominator);
        self
    }
}

/// One-way ANOVA of `metric_column` across every value of `group_column`.
///
/// Rows with a missing group key are dropped; missing metric values are
/// dropped per group. Groups keep the order of first appearance.
pub fn hypothesis_test_difference_between_columns(
    dataset: &Dataset,
    metric_column: &str,
    group_column: &str,
) -> Result<HypothesisTestResult> {
    let partitions = partition_by_group(dataset, metric_column, group_column)
        .context("Partitioning for ANOVA")?;

    let mut warnings = empty_group_warnings(&partitions, group_column);
    let samples: Vec<&[f64]> = partitions.iter().map(|(_, v)| v.as_slice()).collect();
    let outcome = anova::one_way_anova(&samples);
    warnings.extend(outcome.warnings.iter().cloned());

    Ok(finish(
        TestKind::OneWayAnova,
        metric_column,
        group_column,
        summarize(&partitions),
        outcome,
        warnings,
    ))
}

/// Welch's t-test of `metric_column` between rows where `feature_column`
/// equals `value_a` and rows where it equals `value_b`.
///
/// Feature values are compared by their text rendering, so `1` matches an
/// integer column and `Male` a text column.
pub fn ab_hypothesis_testing(
    dataset: &Dataset,
    feature_column: &str,
    value_a: &str,
    value_b: &str,
    metric_column: &str,
) -> Result<HypothesisTestResult> {
    let partitions = partition_by_group(dataset, metric_column, feature_column)
        .context("Partitioning for A/B test")?;

    let mut warnings = Vec::new();
    let pick = |value: &str, warnings: &mut Vec<String>| -> (String, Vec<f64>) {
        match partitions.iter().find(|(label, _)| label == value) {
            Some((label, values)) => (label.clone(), values.clone()),
            None => {
                warnings.push(format!("No rows where '{feature_column}' == '{value}'"));
                (value.to_string(), Vec::new())
            }
        }
    };
    let selected = vec![pick(value_a, &mut warnings), pick(value_b, &mut warnings)];

    warnings.extend(empty_group_warnings(&selected, feature_column));
    let outcome = welch::welch_t_test(&selected[0].1, &selected[1].1);
    warnings.extend(outcome.warnings.iter().cloned());

    Ok(finish(
        TestKind::WelchTTest,
        metric_column,
        feature_column,
        summarize(&selected),
        outcome,
        warnings,
    ))
}

/// Split the observed metric values by the text rendering of the group key.
fn partition_by_group(
    dataset: &Dataset,
    metric_column: &str,
    group_column: &str,
) -> Result<Vec<(String, Vec<f64>)>> {
    let metrics = dataset.numeric_values(metric_column)?;
    let keys = dataset.series(group_column)?.cast(&DataType::String)?;
    let keys = keys.str()?;

    let mut partitions: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, value) in keys.into_iter().zip(metrics) {
        let Some(key) = key else { continue };
        let slot = *index.entry(key.to_string()).or_insert_with(|| {
            partitions.push((key.to_string(), Vec::new()));
            partitions.len() - 1
        });
        if let Some(v) = value {
            partitions[slot].1.push(v);
        }
    }

    Ok(partitions)
}

fn empty_group_warnings(partitions: &[(String, Vec<f64>)], group_column: &str) -> Vec<String> {
    partitions
        .iter()
        .filter(|(_, values)| values.is_empty())
        .map(|(label, _)| format!("Group '{group_column}' == '{label}' has no observed values"))
        .collect()
}

fn summarize(partitions: &[(String, Vec<f64>)]) -> Vec<GroupSummary> {
    partitions
        .iter()
        .map(|(label, values)| GroupSummary {
            label: label.clone(),
            count: values.len(),
            mean: mean(values),
        })
        .collect()
}

fn finish(
    test: TestKind,
    metric_column: &str,
    group_column: &str,
    groups: Vec<GroupSummary>,
    outcome: TestOutcome,
    mut warnings: Vec<String>,
) -> HypothesisTestResult {
    warnings.dedup();
    let decision = Decision::from_p_value(outcome.p_value);

    if decision == Decision::Inconclusive {
        for warning in &warnings {
            warn!("{} of {} by {}: {}", test.display_name(), metric_column, group_column, warning);
        }
    } else {
        info!(
            "{} of {} by {}: {} = {:.4}, p = {:.4} ({})",
            test.display_name(),
            metric_column,
            group_column,
            test.statistic_label(),
            outcome.statistic,
            outcome.p_value,
            decision.label()
        );
    }

    HypothesisTestResult {
        test,
        metric_column: metric_column.to_string(),
        group_column: group_column.to_string(),
        groups,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        df_numerator: outcome.df_numerator,
        df_denominator: outcome.df_denominator,
        decision,
        warnings,
    }
}
