//! Binary classification metrics for PATENTMATCH evaluation.
//!
//! [`MetricsCalculator`] keeps a running confusion tally plus the probability
//! each outcome assigned to the correct label, and derives accuracy,
//! precision, recall, F1 and perplexity from them on demand. Completed runs
//! (epochs) can be snapshotted and summarised as mean and population standard
//! deviation per metric.
//!
//! The calculator has no interior locking. Parallel evaluation should give each
//! worker its own calculator and combine them with [`MetricsCalculator::merge`];
//! merging is plain addition of counts and concatenation of probabilities, so
//! the order of merges does not matter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use ace_core::EvaluationConfig;

use crate::error::MetricsError;
use crate::label::Label;

/// Names of the reported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
    Perplexity,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Accuracy,
        Metric::Precision,
        Metric::Recall,
        Metric::F1,
        Metric::Perplexity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
            Metric::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

/// Running confusion tally with `X` as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Count one outcome in exactly one of the four cells.
    pub fn record(&mut self, predicted: Label, actual: Label) {
        match (predicted.is_positive(), actual.is_positive()) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn correct(&self) -> usize {
        self.true_positives + self.true_negatives
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.true_negatives += other.true_negatives;
        self.false_negatives += other.false_negatives;
    }
}

impl Add for ConfusionCounts {
    type Output = ConfusionCounts;

    fn add(mut self, rhs: ConfusionCounts) -> ConfusionCounts {
        self.merge(&rhs);
        self
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: ConfusionCounts) {
        self.merge(&rhs);
    }
}

/// Zero denominators resolve to 0.0; they are normal in sparse batches.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Metrics computed from the outcomes recorded so far.
///
/// `accuracy`, `precision`, `recall` and `f1` lie in `[0, 1]`. `perplexity` is
/// at least 1.0, or infinite when nothing has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub perplexity: f64,
    /// Number of outcomes the snapshot was computed from.
    #[serde(default)]
    pub samples: usize,
}

impl MetricsSnapshot {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::F1 => self.f1,
            Metric::Perplexity => self.perplexity,
        }
    }

    /// The five metrics keyed by name.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Metric::ALL
            .into_iter()
            .map(|m| (m.as_str().to_string(), self.get(m)))
            .collect()
    }
}

/// Mean and spread of one metric across snapshotted runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    /// Population standard deviation (divides by the number of runs).
    pub std_dev: f64,
    /// Number of runs with a finite value for this metric.
    pub runs: usize,
}

impl MetricStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                runs: 0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() == 1 {
            0.0
        } else {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
        };
        Self {
            mean,
            std_dev,
            runs: values.len(),
        }
    }
}

/// Accumulates PATENTMATCH outcomes and computes classification metrics.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    counts: ConfusionCounts,
    /// Probability assigned to the correct label, one per outcome that carried a confidence.
    correct_label_probs: Vec<f64>,
    history: Vec<MetricsSnapshot>,
    probability_floor: f64,
    fallback_accuracy_floor: f64,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self::with_config(&EvaluationConfig::default())
    }

    /// Build from configuration. Floors outside their valid range fall back to
    /// the defaults so perplexity stays finite and at least 1.0.
    pub fn with_config(config: &EvaluationConfig) -> Self {
        let defaults = EvaluationConfig::default();
        let probability_floor = if config.probability_floor > 0.0 && config.probability_floor < 1.0
        {
            config.probability_floor
        } else {
            tracing::warn!(
                value = config.probability_floor,
                "probability_floor outside (0, 1), using default"
            );
            defaults.probability_floor
        };
        let fallback_accuracy_floor =
            if config.fallback_accuracy_floor > 0.0 && config.fallback_accuracy_floor <= 1.0 {
                config.fallback_accuracy_floor
            } else {
                tracing::warn!(
                    value = config.fallback_accuracy_floor,
                    "fallback_accuracy_floor outside (0, 1], using default"
                );
                defaults.fallback_accuracy_floor
            };

        Self {
            counts: ConfusionCounts::default(),
            correct_label_probs: Vec::new(),
            history: Vec::new(),
            probability_floor,
            fallback_accuracy_floor,
        }
    }

    /// Record one outcome.
    ///
    /// `confidence` is the probability the model gave its *predicted* label.
    /// It must lie in `[0, 1]`; an invalid value is rejected before any state
    /// changes.
    pub fn record(
        &mut self,
        predicted: Label,
        actual: Label,
        confidence: Option<f64>,
    ) -> Result<(), MetricsError> {
        if let Some(value) = confidence {
            if !(0.0..=1.0).contains(&value) {
                return Err(MetricsError::InvalidConfidence { value });
            }
        }

        self.counts.record(predicted, actual);
        let correct = predicted == actual;
        if let Some(p) = confidence {
            self.correct_label_probs
                .push(if correct { p } else { 1.0 - p });
        }

        tracing::debug!(
            predicted = %predicted,
            actual = %actual,
            correct,
            confidence = ?confidence,
            total = self.counts.total(),
            "Recorded outcome"
        );
        Ok(())
    }

    /// Record an outcome given as raw label tokens (`"X"`, `" a "`, ...).
    ///
    /// Tokens outside the two-class set are rejected and nothing is recorded.
    pub fn record_raw(
        &mut self,
        predicted: &str,
        actual: &str,
        confidence: Option<f64>,
    ) -> Result<(), MetricsError> {
        let predicted: Label = predicted.parse()?;
        let actual: Label = actual.parse()?;
        self.record(predicted, actual, confidence)
    }

    /// Compute metrics from the current tally without changing it.
    pub fn compute(&self) -> MetricsSnapshot {
        let counts = &self.counts;
        MetricsSnapshot {
            accuracy: counts.accuracy(),
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            perplexity: self.perplexity(),
            samples: counts.total(),
        }
    }

    /// Perplexity of the correct labels.
    ///
    /// With confidences: `exp(-mean(ln p_correct))` over the outcomes that
    /// carried one, each probability floored at `probability_floor`.
    ///
    /// Without confidences the value is a proxy, `1 / max(accuracy, floor)`:
    /// exactly 1.0 when every prediction is correct and growing as accuracy
    /// drops. It is not an information-theoretic quantity. With no outcomes at
    /// all, or none correct, the result is infinite.
    pub fn perplexity(&self) -> f64 {
        if !self.correct_label_probs.is_empty() {
            let n = self.correct_label_probs.len() as f64;
            let log_likelihood: f64 = self
                .correct_label_probs
                .iter()
                .map(|p| p.max(self.probability_floor).ln())
                .sum();
            return (-log_likelihood / n).exp();
        }
        let accuracy = self.counts.accuracy();
        if accuracy == 0.0 {
            return f64::INFINITY;
        }
        1.0 / accuracy.max(self.fallback_accuracy_floor)
    }

    /// Clear counts and confidences. Run history is kept.
    pub fn reset(&mut self) {
        self.counts = ConfusionCounts::default();
        self.correct_label_probs.clear();
    }

    /// Compute, append to the run history, then reset.
    pub fn snapshot_and_reset(&mut self) -> MetricsSnapshot {
        let snapshot = self.compute();
        self.history.push(snapshot);
        tracing::info!(
            run = self.history.len(),
            samples = snapshot.samples,
            accuracy = snapshot.accuracy,
            f1 = snapshot.f1,
            perplexity = snapshot.perplexity,
            "Run snapshot"
        );
        self.reset();
        snapshot
    }

    /// Mean and population standard deviation of each metric over all runs.
    ///
    /// Non-finite values (the infinite perplexity of an empty run) are left out
    /// of that metric's statistics.
    pub fn aggregate(&self) -> Result<BTreeMap<Metric, MetricStats>, MetricsError> {
        if self.history.is_empty() {
            return Err(MetricsError::EmptyHistory);
        }
        Ok(Metric::ALL
            .into_iter()
            .map(|metric| {
                let values: Vec<f64> = self
                    .history
                    .iter()
                    .map(|s| s.get(metric))
                    .filter(|v| v.is_finite())
                    .collect();
                (metric, MetricStats::from_values(&values))
            })
            .collect())
    }

    /// Fold another calculator's current outcomes into this one.
    ///
    /// Only counts and confidences are merged; run history and floors stay
    /// as they are on `self`.
    pub fn merge(&mut self, other: &MetricsCalculator) {
        self.counts.merge(&other.counts);
        self.correct_label_probs
            .extend_from_slice(&other.correct_label_probs);
    }

    pub fn counts(&self) -> ConfusionCounts {
        self.counts
    }

    pub fn history(&self) -> &[MetricsSnapshot] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Number of recorded outcomes that carried a confidence.
    pub fn confidence_count(&self) -> usize {
        self.correct_label_probs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label::{A, X};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mixed_scenario() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, Some(0.9)).unwrap();
        calc.record(A, A, Some(0.8)).unwrap();
        calc.record(X, A, Some(0.6)).unwrap();
        calc.record(A, X, Some(0.7)).unwrap();

        assert_eq!(
            calc.counts(),
            ConfusionCounts {
                true_positives: 1,
                false_positives: 1,
                true_negatives: 1,
                false_negatives: 1,
            }
        );
        let m = calc.compute();
        assert!(approx(m.accuracy, 0.5));
        assert!(approx(m.precision, 0.5));
        assert!(approx(m.recall, 0.5));
        assert!(approx(m.f1, 0.5));
        assert!(m.perplexity.is_finite());
        assert!(m.perplexity > 1.0);

        let expected = (-(0.9f64.ln() + 0.8f64.ln() + 0.4f64.ln() + 0.3f64.ln()) / 4.0).exp();
        assert!(approx(m.perplexity, expected));
        assert_eq!(m.samples, 4);
    }

    #[test]
    fn test_precision_recall_f1() {
        let mut calc = MetricsCalculator::new();
        // TP: 2, FP: 1, FN: 1, TN: 1
        for (p, a) in [(X, X), (X, X), (X, A), (A, X), (A, A)] {
            calc.record(p, a, None).unwrap();
        }
        let m = calc.compute();
        assert!(approx(m.precision, 2.0 / 3.0));
        assert!(approx(m.recall, 2.0 / 3.0));
        assert!(approx(m.f1, 2.0 / 3.0));
        assert!(approx(m.accuracy, 3.0 / 5.0));
    }

    #[test]
    fn test_perfect_classifier() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, None).unwrap();
        calc.record(A, A, None).unwrap();
        calc.record(X, X, None).unwrap();
        let m = calc.compute();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn test_inverted_classifier_is_zero_not_nan() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, A, None).unwrap();
        calc.record(A, X, None).unwrap();
        let m = calc.compute();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert!(!m.f1.is_nan());
    }

    #[test]
    fn test_only_negatives_predicted() {
        let mut calc = MetricsCalculator::new();
        calc.record(A, A, None).unwrap();
        calc.record(A, A, None).unwrap();
        let m = calc.compute();
        assert_eq!(m.accuracy, 1.0);
        // No positive predictions and no positive labels.
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_empty_state() {
        let calc = MetricsCalculator::new();
        let m = calc.compute();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.samples, 0);
        assert!(m.perplexity.is_infinite());
    }

    #[test]
    fn test_compute_is_pure() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, Some(0.7)).unwrap();
        let first = calc.compute();
        let second = calc.compute();
        assert_eq!(first, second);
        assert_eq!(calc.counts().total(), 1);
    }

    #[test]
    fn test_perplexity_decreases_with_confidence_in_correct_label() {
        let outcomes = [(X, X), (A, A), (X, A)];
        let mut low = MetricsCalculator::new();
        let mut high = MetricsCalculator::new();
        // Correct outcomes get more confidence in B; the wrong one gets less
        // confidence in its (wrong) prediction, i.e. more on the correct label.
        for ((p, a), (c_low, c_high)) in outcomes
            .iter()
            .zip([(0.6, 0.9), (0.55, 0.95), (0.8, 0.3)])
        {
            low.record(*p, *a, Some(c_low)).unwrap();
            high.record(*p, *a, Some(c_high)).unwrap();
        }
        let p_low = low.compute().perplexity;
        let p_high = high.compute().perplexity;
        assert!(p_high < p_low);
        assert!(p_high >= 1.0);
    }

    #[test]
    fn test_certain_and_correct_gives_perplexity_one() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, Some(1.0)).unwrap();
        calc.record(A, A, Some(1.0)).unwrap();
        assert!(approx(calc.compute().perplexity, 1.0));
    }

    #[test]
    fn test_zero_probability_is_floored() {
        let mut calc = MetricsCalculator::new();
        // Fully confident and wrong: correct-label probability is 0.
        calc.record(X, A, Some(1.0)).unwrap();
        let ppl = calc.compute().perplexity;
        assert!(ppl.is_finite());
        assert!(((ppl - 1e10) / 1e10).abs() < 1e-9);
    }

    #[test]
    fn test_perplexity_proxy_without_confidences() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, None).unwrap();
        calc.record(A, A, None).unwrap();
        assert_eq!(calc.compute().perplexity, 1.0);

        calc.record(X, A, None).unwrap();
        calc.record(A, X, None).unwrap();
        // accuracy 0.5 -> proxy 2.0
        assert!(approx(calc.compute().perplexity, 2.0));

        let mut wrong = MetricsCalculator::new();
        wrong.record(X, A, None).unwrap();
        assert_eq!(wrong.compute().perplexity, f64::INFINITY);
    }

    #[test]
    fn test_proxy_floor_is_configurable() {
        let config = EvaluationConfig {
            fallback_accuracy_floor: 0.5,
            ..Default::default()
        };
        let mut calc = MetricsCalculator::with_config(&config);
        calc.record(X, X, None).unwrap();
        calc.record(A, X, None).unwrap();
        calc.record(A, X, None).unwrap();
        calc.record(A, X, None).unwrap();
        // accuracy 0.25 is floored at 0.5
        assert!(approx(calc.compute().perplexity, 2.0));
    }

    #[test]
    fn test_out_of_range_floors_fall_back_to_defaults() {
        let zero = EvaluationConfig {
            probability_floor: 0.0,
            fallback_accuracy_floor: 0.0,
            ..Default::default()
        };
        let mut calc = MetricsCalculator::with_config(&zero);
        calc.record(X, A, Some(1.0)).unwrap();
        let ppl = calc.compute().perplexity;
        assert!(ppl.is_finite());
        assert!(((ppl - 1e10) / 1e10).abs() < 1e-9);

        let above_one = EvaluationConfig {
            probability_floor: 2.0,
            fallback_accuracy_floor: 2.0,
            ..Default::default()
        };
        let mut calc = MetricsCalculator::with_config(&above_one);
        calc.record(X, X, Some(0.9)).unwrap();
        assert!(approx(calc.compute().perplexity, 1.0 / 0.9));

        let mut proxy = MetricsCalculator::with_config(&above_one);
        proxy.record(X, X, None).unwrap();
        proxy.record(A, X, None).unwrap();
        assert!(approx(proxy.compute().perplexity, 2.0));

        let nan = EvaluationConfig {
            probability_floor: f64::NAN,
            ..Default::default()
        };
        let mut calc = MetricsCalculator::with_config(&nan);
        calc.record(X, X, Some(0.5)).unwrap();
        assert!(approx(calc.compute().perplexity, 2.0));
    }

    #[test]
    fn test_partial_confidences_use_reported_outcomes_only() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, Some(0.5)).unwrap();
        calc.record(A, X, None).unwrap();
        assert_eq!(calc.confidence_count(), 1);
        assert!(approx(calc.compute().perplexity, 2.0));
    }

    #[test]
    fn test_invalid_confidence_rejected_without_side_effects() {
        let mut calc = MetricsCalculator::new();
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let err = calc.record(X, X, Some(bad)).unwrap_err();
            assert!(matches!(err, MetricsError::InvalidConfidence { .. }));
        }
        assert_eq!(calc.counts().total(), 0);
        assert_eq!(calc.confidence_count(), 0);
    }

    #[test]
    fn test_record_raw_rejects_unknown_labels() {
        let mut calc = MetricsCalculator::new();
        calc.record_raw(" x", "X", None).unwrap();
        let err = calc.record_raw("Y", "X", None).unwrap_err();
        assert_eq!(
            err,
            MetricsError::InvalidLabel {
                label: "Y".to_string()
            }
        );
        assert!(calc.record_raw("X", "B", None).is_err());
        assert_eq!(calc.counts().total(), 1);
    }

    #[test]
    fn test_reset_clears_counts_but_keeps_history() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, Some(0.9)).unwrap();
        calc.snapshot_and_reset();
        calc.record(A, A, Some(0.9)).unwrap();
        calc.reset();
        assert_eq!(calc.counts(), ConfusionCounts::default());
        assert_eq!(calc.confidence_count(), 0);
        assert_eq!(calc.history().len(), 1);

        calc.clear_history();
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_aggregate_over_runs() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, None).unwrap();
        calc.record(A, A, None).unwrap();
        let first = calc.snapshot_and_reset();
        assert_eq!(first.accuracy, 1.0);

        calc.record(X, X, None).unwrap();
        calc.record(X, A, None).unwrap();
        let second = calc.snapshot_and_reset();
        assert_eq!(second.accuracy, 0.5);
        assert_eq!(calc.counts().total(), 0);

        let agg = calc.aggregate().unwrap();
        let accuracy = agg[&Metric::Accuracy];
        assert!(approx(accuracy.mean, 0.75));
        assert!(approx(accuracy.std_dev, 0.25));
        assert_eq!(accuracy.runs, 2);
        assert_eq!(agg.len(), Metric::ALL.len());
    }

    #[test]
    fn test_aggregate_single_run_has_zero_spread() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, None).unwrap();
        calc.record(X, A, None).unwrap();
        calc.snapshot_and_reset();
        let agg = calc.aggregate().unwrap();
        assert_eq!(agg[&Metric::Precision].std_dev, 0.0);
        assert_eq!(agg[&Metric::Perplexity].mean, 2.0);
        assert_eq!(agg[&Metric::Perplexity].std_dev, 0.0);
    }

    #[test]
    fn test_all_wrong_run_is_left_out_of_perplexity_aggregate() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, A, None).unwrap();
        assert_eq!(calc.snapshot_and_reset().perplexity, f64::INFINITY);
        calc.record(X, X, None).unwrap();
        calc.snapshot_and_reset();

        let agg = calc.aggregate().unwrap();
        let ppl = agg[&Metric::Perplexity];
        assert_eq!(ppl.mean, 1.0);
        assert_eq!(ppl.std_dev, 0.0);
        assert_eq!(ppl.runs, 1);
        assert_eq!(agg[&Metric::Accuracy].runs, 2);
    }

    #[test]
    fn test_aggregate_skips_infinite_perplexity() {
        let mut calc = MetricsCalculator::new();
        calc.snapshot_and_reset();
        let agg = calc.aggregate().unwrap();
        let ppl = agg[&Metric::Perplexity];
        assert_eq!(ppl.runs, 0);
        assert_eq!(ppl.mean, 0.0);
        assert_eq!(agg[&Metric::Accuracy].runs, 1);
    }

    #[test]
    fn test_aggregate_without_runs_fails() {
        let calc = MetricsCalculator::new();
        assert_eq!(calc.aggregate(), Err(MetricsError::EmptyHistory));
    }

    #[test]
    fn test_merge_matches_single_calculator() {
        let mut left = MetricsCalculator::new();
        let mut right = MetricsCalculator::new();
        let mut single = MetricsCalculator::new();

        left.record(X, X, Some(0.9)).unwrap();
        left.record(A, X, Some(0.6)).unwrap();
        right.record(A, A, Some(0.7)).unwrap();
        right.record(X, A, Some(0.8)).unwrap();
        for (p, a, c) in [(A, A, 0.7), (X, X, 0.9), (X, A, 0.8), (A, X, 0.6)] {
            single.record(p, a, Some(c)).unwrap();
        }

        let mut lr = left.clone();
        lr.merge(&right);
        let mut rl = right.clone();
        rl.merge(&left);

        assert_eq!(lr.counts(), single.counts());
        assert_eq!(rl.counts(), single.counts());
        let (a, b, c) = (lr.compute(), rl.compute(), single.compute());
        assert!(approx(a.perplexity, c.perplexity));
        assert!(approx(b.perplexity, c.perplexity));
        assert_eq!(a.f1, c.f1);
    }

    #[test]
    fn test_counts_add() {
        let a = ConfusionCounts {
            true_positives: 1,
            false_positives: 2,
            true_negatives: 3,
            false_negatives: 4,
        };
        let mut b = ConfusionCounts {
            true_positives: 10,
            ..Default::default()
        };
        assert_eq!((a + b).true_positives, 11);
        b += a;
        assert_eq!(b.total(), 20);
        assert_eq!(b.correct(), 14);
    }

    #[test]
    fn test_snapshot_map_and_names() {
        let mut calc = MetricsCalculator::new();
        calc.record(X, X, None).unwrap();
        let map = calc.compute().to_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["accuracy", "f1", "perplexity", "precision", "recall"]);
        assert_eq!("f1".parse::<Metric>(), Ok(Metric::F1));
        assert!("auc".parse::<Metric>().is_err());
    }

    #[test]
    fn test_snapshot_serializes_with_metric_keys() {
        let snapshot = MetricsSnapshot {
            accuracy: 0.5,
            precision: 0.5,
            recall: 0.5,
            f1: 0.5,
            perplexity: 2.0,
            samples: 4,
        };
        let value = serde_json::to_value(snapshot).unwrap();
        for key in ["accuracy", "precision", "recall", "f1", "perplexity"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
